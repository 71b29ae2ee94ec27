use std::sync::Arc;

use async_trait::async_trait;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;
use thiserror::Error;

use super::ImageData;

#[derive(Clone, Debug, PartialEq, Eq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum BackendName {
    Gemini,
}

impl BackendName {
    pub fn parse(text: String) -> Option<BackendName> {
        return BackendName::iter().find(|e| return e.to_string() == text);
    }
}

/// Failure categories of the image service. Callers decide between fatal and
/// recoverable handling based on these, so they must stay distinguishable.
#[derive(Debug, Error)]
pub enum ImageServiceError {
    #[error("the request was blocked by safety filters (reason: {reason}), try a more neutral prompt")]
    Blocked { reason: String },

    #[error("the model returned no image (finish reason: {})", finish_reason.as_deref().unwrap_or("none"))]
    NoImage { finish_reason: Option<String> },

    #[error("image service request failed: {0}")]
    Transport(String),

    #[error("image service is not configured: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for ImageServiceError {
    fn from(err: reqwest::Error) -> ImageServiceError {
        if err.is_timeout() {
            return ImageServiceError::Transport(format!("request timed out: {err}"));
        }

        return ImageServiceError::Transport(err.to_string());
    }
}

#[async_trait]
pub trait ImageService {
    fn name(&self) -> BackendName;

    /// Verifies all configuration needed to reach the service is present.
    async fn health_check(&self) -> Result<(), ImageServiceError>;

    /// Produces one image from a text prompt.
    async fn generate(&self, prompt: &str) -> Result<ImageData, ImageServiceError>;

    /// Produces a modified copy of `image` following `instruction`. The MIME
    /// type sent along is the one carried by `image`.
    async fn edit(
        &self,
        image: &ImageData,
        instruction: &str,
    ) -> Result<ImageData, ImageServiceError>;
}

pub type ImageServiceBox = Arc<dyn ImageService + Send + Sync>;
