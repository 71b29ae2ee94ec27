#[cfg(test)]
#[path = "card_test.rs"]
mod tests;

use uuid::Uuid;

use super::ImageData;

/// A generated card. Only ever built from a successful front image, and the
/// original image is fixed for the lifetime of the record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CardRecord {
    id: String,
    label: String,
    current_image: ImageData,
    original_image: ImageData,
}

impl CardRecord {
    pub fn new(label: &str, image: ImageData) -> CardRecord {
        return CardRecord {
            id: Uuid::new_v4().to_string(),
            label: label.to_string(),
            current_image: image.clone(),
            original_image: image,
        };
    }

    pub fn id(&self) -> &str {
        return &self.id;
    }

    pub fn label(&self) -> &str {
        return &self.label;
    }

    pub fn current_image(&self) -> &ImageData {
        return &self.current_image;
    }

    pub fn original_image(&self) -> &ImageData {
        return &self.original_image;
    }

    pub fn is_edited(&self) -> bool {
        return self.current_image != self.original_image;
    }

    pub fn accept_image(&mut self, image: ImageData) {
        self.current_image = image;
    }

    pub fn revert(&mut self) {
        self.current_image = self.original_image.clone();
    }
}
