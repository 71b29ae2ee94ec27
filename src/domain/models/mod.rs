mod card;
mod event;
mod image;
mod image_service;
mod labels;
mod prompts;
mod sheet;

pub use card::*;
pub use event::*;
pub use image::*;
pub use image_service::*;
pub use labels::*;
pub use prompts::*;
pub use sheet::*;
