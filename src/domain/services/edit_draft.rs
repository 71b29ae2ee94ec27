#[cfg(test)]
#[path = "edit_draft_test.rs"]
mod tests;

use anyhow::Result;
use thiserror::Error;

use super::Deck;
use crate::domain::models::CardRecord;
use crate::domain::models::ImageData;
use crate::domain::models::ImageService;
use crate::domain::models::ImageServiceError;

#[derive(Debug, Error)]
pub enum EditError {
    #[error("please describe how the image should change")]
    EmptyInstruction,

    #[error("editing the '{label}' card failed: {source}")]
    Service {
        label: String,
        #[source]
        source: ImageServiceError,
    },
}

/// Uncommitted edits for one card. Successive edits build on the latest
/// preview, and nothing reaches the deck until `save` is called.
pub struct EditDraft {
    card_id: String,
    label: String,
    base_image: ImageData,
    preview: Option<ImageData>,
}

impl EditDraft {
    pub fn new(card: &CardRecord) -> EditDraft {
        return EditDraft {
            card_id: card.id().to_string(),
            label: card.label().to_string(),
            base_image: card.current_image().clone(),
            preview: None,
        };
    }

    pub fn preview(&self) -> Option<&ImageData> {
        return self.preview.as_ref();
    }

    /// The image the next edit will start from.
    pub fn source_image(&self) -> &ImageData {
        return self.preview.as_ref().unwrap_or(&self.base_image);
    }

    /// Sends one edit request. On failure the previous preview is kept so
    /// the user can retry.
    pub async fn apply(
        &mut self,
        service: &(dyn ImageService + Send + Sync),
        instruction: &str,
    ) -> Result<&ImageData, EditError> {
        let instruction = instruction.trim();
        if instruction.is_empty() {
            return Err(EditError::EmptyInstruction);
        }

        tracing::debug!(card = %self.card_id, "requesting image edit");
        let edited = service
            .edit(self.source_image(), instruction)
            .await
            .map_err(|err| {
                tracing::warn!(card = %self.card_id, error = %err, "image edit failed");
                return EditError::Service {
                    label: self.label.to_string(),
                    source: err,
                };
            })?;

        return Ok(self.preview.insert(edited));
    }

    /// Commits the preview to the deck. Returns false when there was nothing
    /// to save.
    pub fn save(self, deck: &mut Deck) -> Result<bool> {
        let Some(preview) = self.preview else {
            return Ok(false);
        };

        deck.accept_edit(&self.card_id, preview)?;
        return Ok(true);
    }
}
