#[cfg(test)]
#[path = "generation_test.rs"]
mod tests;

use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::domain::models::front_prompt;
use crate::domain::models::CardRecord;
use crate::domain::models::GenerationEvent;
use crate::domain::models::ImageData;
use crate::domain::models::ImageServiceBox;
use crate::domain::models::ImageServiceError;

/// Errors that stop a whole batch.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("image service setup failed: {0}")]
    Setup(#[source] ImageServiceError),

    #[error("failed to generate the card back: {0}")]
    BackImage(#[source] ImageServiceError),

    #[error("generation observer went away before the batch finished")]
    ObserverClosed,
}

/// A single label failed. The batch carries on with the next one.
#[derive(Debug, Error)]
#[error("generating the '{label}' card failed, continuing with the next one: {source}")]
pub struct LabelError {
    pub label: String,
    #[source]
    pub source: ImageServiceError,
}

#[derive(Clone, Debug)]
pub struct GenerationSettings {
    pub back_prompt: String,
    pub front_prompt: String,
    pub request_delay: Duration,
}

#[derive(Debug)]
pub struct GenerationOutcome {
    pub back_image: ImageData,
    pub records: Vec<CardRecord>,
    pub errors: Vec<LabelError>,
    pub cancelled: bool,
}

enum Step {
    Continue,
    Stop,
}

pub struct BatchGenerator {
    service: ImageServiceBox,
    settings: GenerationSettings,
}

impl BatchGenerator {
    pub fn new(service: ImageServiceBox, settings: GenerationSettings) -> BatchGenerator {
        return BatchGenerator { service, settings };
    }

    /// Runs one batch: the shared back image first, then one front image per
    /// label, strictly one request at a time.
    ///
    /// Cancellation is polled before and after the inter-request delay. A
    /// request already in flight is never interrupted, but its result is
    /// dropped if cancellation was requested while it was running, so no card
    /// shows up after the user asked to stop.
    pub async fn run(
        &self,
        labels: &[String],
        cancel: &CancellationToken,
        tx: &mpsc::UnboundedSender<GenerationEvent>,
    ) -> Result<GenerationOutcome, GenerationError> {
        self.service
            .health_check()
            .await
            .map_err(GenerationError::Setup)?;

        tracing::info!(labels = labels.len(), "starting card generation");

        let back_image = self
            .service
            .generate(&self.settings.back_prompt)
            .await
            .map_err(|err| {
                tracing::error!(error = %err, "card back generation failed");
                return GenerationError::BackImage(err);
            })?;

        send(tx, GenerationEvent::BackImageReady(back_image.clone()))?;

        let mut outcome = GenerationOutcome {
            back_image,
            records: vec![],
            errors: vec![],
            cancelled: false,
        };

        for label in labels {
            if let Step::Stop = self.wait_turn(cancel).await {
                outcome.cancelled = true;
                break;
            }

            let prompt = front_prompt(&self.settings.front_prompt, label);
            let res = self.service.generate(&prompt).await;

            if cancel.is_cancelled() {
                tracing::info!(label = %label, "discarding result received after cancellation");
                outcome.cancelled = true;
                break;
            }

            match res {
                Ok(image) => {
                    let record = CardRecord::new(label, image);
                    tracing::info!(label = %label, id = record.id(), "card generated");
                    send(tx, GenerationEvent::CardGenerated(record.clone()))?;
                    outcome.records.push(record);
                }
                Err(err) => {
                    let label_err = LabelError {
                        label: label.to_string(),
                        source: err,
                    };
                    tracing::warn!(label = %label, error = %label_err.source, "card generation failed");
                    send(
                        tx,
                        GenerationEvent::LabelFailed {
                            label: label.to_string(),
                            message: label_err.to_string(),
                        },
                    )?;
                    outcome.errors.push(label_err);
                }
            }
        }

        tracing::info!(
            generated = outcome.records.len(),
            failed = outcome.errors.len(),
            cancelled = outcome.cancelled,
            "card generation finished"
        );

        send(
            tx,
            GenerationEvent::Finished {
                cancelled: outcome.cancelled,
            },
        )?;

        return Ok(outcome);
    }

    /// Checkpoint, rate limit delay, checkpoint. The delay ends early when
    /// cancellation arrives.
    async fn wait_turn(&self, cancel: &CancellationToken) -> Step {
        if cancel.is_cancelled() {
            return Step::Stop;
        }

        tokio::select! {
            _ = time::sleep(self.settings.request_delay) => {}
            _ = cancel.cancelled() => {}
        }

        if cancel.is_cancelled() {
            return Step::Stop;
        }

        return Step::Continue;
    }
}

fn send(
    tx: &mpsc::UnboundedSender<GenerationEvent>,
    event: GenerationEvent,
) -> Result<(), GenerationError> {
    return tx
        .send(event)
        .map_err(|_| return GenerationError::ObserverClosed);
}
