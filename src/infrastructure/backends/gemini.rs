#[cfg(test)]
#[path = "gemini_test.rs"]
mod tests;

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::BackendName;
use crate::domain::models::ImageData;
use crate::domain::models::ImageService;
use crate::domain::models::ImageServiceError;

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

impl Part {
    fn text(text: &str) -> Part {
        return Part {
            text: Some(text.to_string()),
            inline_data: None,
        };
    }

    fn image(image: &ImageData) -> Part {
        return Part {
            text: None,
            inline_data: Some(InlineData {
                mime_type: image.mime_type.to_string(),
                data: image.to_base64(),
            }),
        };
    }
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

impl GenerateContentRequest {
    fn new(parts: Vec<Part>) -> GenerateContentRequest {
        return GenerateContentRequest {
            contents: vec![Content { parts }],
            generation_config: GenerationConfig {
                response_modalities: vec!["IMAGE".to_string()],
            },
        };
    }
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

impl GenerateContentResponse {
    /// The first inline image of the first candidate wins. Without one, a
    /// prompt block takes precedence over the candidate's finish reason.
    fn into_image(self) -> Result<ImageData, ImageServiceError> {
        let candidate = self.candidates.into_iter().next();
        let finish_reason = candidate
            .as_ref()
            .and_then(|candidate| return candidate.finish_reason.clone());

        let inline_data = candidate
            .and_then(|candidate| return candidate.content)
            .and_then(|content| {
                return content
                    .parts
                    .into_iter()
                    .find_map(|part| return part.inline_data);
            });

        if let Some(inline_data) = inline_data {
            return ImageData::from_base64(&inline_data.mime_type, &inline_data.data).map_err(
                |err| {
                    return ImageServiceError::Transport(format!(
                        "Gemini returned undecodable image data: {err}"
                    ));
                },
            );
        }

        if let Some(reason) = self
            .prompt_feedback
            .and_then(|feedback| return feedback.block_reason)
        {
            return Err(ImageServiceError::Blocked { reason });
        }

        return Err(ImageServiceError::NoImage { finish_reason });
    }
}

pub struct Gemini {
    url: String,
    token: String,
    model: String,
    timeout: String,
}

impl Default for Gemini {
    fn default() -> Gemini {
        return Gemini {
            url: Config::get(ConfigKey::GeminiURL),
            token: Config::get(ConfigKey::GeminiToken),
            model: Config::get(ConfigKey::Model),
            timeout: Config::get(ConfigKey::RequestTimeout),
        };
    }
}

impl Gemini {
    fn client(&self) -> Result<reqwest::Client, ImageServiceError> {
        let mut builder = reqwest::Client::builder();

        let timeout = if self.timeout.is_empty() {
            0
        } else {
            self.timeout.parse::<u64>().map_err(|_| {
                return ImageServiceError::Configuration(format!(
                    "request timeout must be a number of milliseconds, got: {}",
                    self.timeout
                ));
            })?
        };
        if timeout > 0 {
            builder = builder.timeout(Duration::from_millis(timeout));
        }

        return Ok(builder.build()?);
    }

    async fn generate_content(
        &self,
        req: GenerateContentRequest,
    ) -> Result<ImageData, ImageServiceError> {
        self.health_check().await?;

        let res = self
            .client()?
            .post(format!(
                "{url}/v1beta/models/{model}:generateContent",
                url = self.url.trim_end_matches('/'),
                model = self.model,
            ))
            .header("x-goog-api-key", &self.token)
            .json(&req)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            tracing::error!(
                status = status.as_u16(),
                body = %body,
                "Failed to make generateContent request to Gemini"
            );
            return Err(ImageServiceError::Transport(format!(
                "Gemini responded with status {}",
                status.as_u16()
            )));
        }

        let body = res.text().await?;
        let parsed = serde_json::from_str::<GenerateContentResponse>(&body).map_err(|err| {
            return ImageServiceError::Transport(format!(
                "Gemini returned an unexpected response: {err}"
            ));
        })?;

        let result = parsed.into_image();
        if let Err(err) = &result {
            tracing::warn!(error = %err, "Gemini returned no image");
        }

        return result;
    }
}

#[async_trait]
impl ImageService for Gemini {
    fn name(&self) -> BackendName {
        return BackendName::Gemini;
    }

    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<(), ImageServiceError> {
        if self.url.is_empty() {
            return Err(ImageServiceError::Configuration(
                "Gemini URL is not defined".to_string(),
            ));
        }
        if self.token.is_empty() {
            return Err(ImageServiceError::Configuration(
                "Gemini token is not defined, set gemini-token or GEMINI_API_KEY".to_string(),
            ));
        }
        if self.model.is_empty() {
            return Err(ImageServiceError::Configuration(
                "Gemini model is not defined".to_string(),
            ));
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn generate(&self, prompt: &str) -> Result<ImageData, ImageServiceError> {
        tracing::debug!(model = %self.model, "generating image");
        let req = GenerateContentRequest::new(vec![Part::text(prompt)]);
        return self.generate_content(req).await;
    }

    #[allow(clippy::implicit_return)]
    async fn edit(
        &self,
        image: &ImageData,
        instruction: &str,
    ) -> Result<ImageData, ImageServiceError> {
        tracing::debug!(model = %self.model, mime_type = %image.mime_type, "editing image");
        let req = GenerateContentRequest::new(vec![Part::image(image), Part::text(instruction)]);
        return self.generate_content(req).await;
    }
}
