#[cfg(test)]
#[path = "share_test.rs"]
mod tests;

use std::path;

use anyhow::Result;
use tokio::fs;

use crate::domain::models::CardRecord;
use crate::domain::models::Labels;

pub struct SharePackage {
    pub file_name: String,
    pub mime_type: String,
    pub title: String,
    pub text: String,
    pub bytes: Vec<u8>,
}

impl SharePackage {
    /// Packages the card's current image, so accepted edits are what gets shared.
    pub fn from_card(card: &CardRecord) -> SharePackage {
        let image = card.current_image();
        let label = card.label();

        return SharePackage {
            file_name: format!("{}.{}", Labels::file_stem(label), image.extension()),
            mime_type: image.mime_type.to_string(),
            title: format!("Emotion card: {label}"),
            text: format!("This is a '{label}' emotion card."),
            bytes: image.bytes.clone(),
        };
    }

    /// Writes the image plus a small text note next to it. Returns the image path.
    pub async fn write_to(&self, dir: &path::Path) -> Result<path::PathBuf> {
        fs::create_dir_all(dir).await?;

        let image_path = dir.join(&self.file_name);
        fs::write(&image_path, &self.bytes).await?;

        let note_path = image_path.with_extension("txt");
        fs::write(&note_path, format!("{}\n\n{}\n", self.title, self.text)).await?;

        tracing::info!(file = %image_path.display(), "wrote share package");

        return Ok(image_path);
    }
}
