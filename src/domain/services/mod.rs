mod deck;
mod edit_draft;
pub mod export;
#[cfg(test)]
pub mod fake_image_service;
mod generation;
mod pagination;
pub mod print;
mod share;

pub use deck::*;
pub use edit_draft::*;
pub use generation::*;
pub use pagination::*;
pub use share::*;
