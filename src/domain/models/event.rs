use super::CardRecord;
use super::ImageData;

pub enum GenerationEvent {
    BackImageReady(ImageData),
    CardGenerated(CardRecord),
    LabelFailed { label: String, message: String },
    Finished { cancelled: bool },
}
