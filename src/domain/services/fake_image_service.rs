use std::sync::Mutex;

use async_trait::async_trait;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::domain::models::BackendName;
use crate::domain::models::ImageData;
use crate::domain::models::ImageService;
use crate::domain::models::ImageServiceError;

pub const BACK_PROMPT: &str = "back";
pub const FRONT_PROMPT: &str = "front {label}";

/// Scripted image service. Generated images carry their prompt as bytes so
/// tests can tell them apart.
#[derive(Default)]
pub struct FakeImageService {
    pub calls: Mutex<Vec<(String, Instant)>>,
    pub unconfigured: bool,
    pub fail_back: bool,
    pub failing_labels: Vec<String>,
    pub cancel_during_call: Option<(usize, CancellationToken)>,
    pub fail_edits: bool,
}

impl FakeImageService {
    pub fn prompts(&self) -> Vec<String> {
        return self
            .calls
            .lock()
            .unwrap()
            .iter()
            .map(|(prompt, _)| return prompt.to_string())
            .collect();
    }

    pub fn call_times(&self) -> Vec<Instant> {
        return self
            .calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, at)| return *at)
            .collect();
    }
}

pub fn image_for(prompt: &str) -> ImageData {
    return ImageData::new("image/png", prompt.as_bytes().to_vec());
}

#[async_trait]
impl ImageService for FakeImageService {
    fn name(&self) -> BackendName {
        return BackendName::Gemini;
    }

    async fn health_check(&self) -> Result<(), ImageServiceError> {
        if self.unconfigured {
            return Err(ImageServiceError::Configuration(
                "token is not defined".to_string(),
            ));
        }

        return Ok(());
    }

    async fn generate(&self, prompt: &str) -> Result<ImageData, ImageServiceError> {
        let call_number = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((prompt.to_string(), Instant::now()));
            calls.len()
        };

        if let Some((cancel_at, token)) = &self.cancel_during_call {
            if *cancel_at == call_number {
                token.cancel();
            }
        }

        if prompt == BACK_PROMPT && self.fail_back {
            return Err(ImageServiceError::Blocked {
                reason: "SAFETY".to_string(),
            });
        }

        if self
            .failing_labels
            .iter()
            .any(|label| return prompt == format!("front {label}"))
        {
            return Err(ImageServiceError::NoImage {
                finish_reason: Some("NO_IMAGE".to_string()),
            });
        }

        return Ok(image_for(prompt));
    }

    async fn edit(
        &self,
        image: &ImageData,
        instruction: &str,
    ) -> Result<ImageData, ImageServiceError> {
        if self.fail_edits {
            return Err(ImageServiceError::Transport("connection reset".to_string()));
        }

        let mut bytes = image.bytes.clone();
        bytes.extend_from_slice(b" + ");
        bytes.extend_from_slice(instruction.as_bytes());

        return Ok(ImageData::new(&image.mime_type, bytes));
    }
}
