#[cfg(test)]
#[path = "deck_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;

use super::Pagination;
use crate::domain::models::CardRecord;
use crate::domain::models::GenerationEvent;
use crate::domain::models::ImageData;
use crate::domain::models::SheetPair;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenerationStatus {
    Idle,
    Generating,
}

/// In-memory state of the current generation session, built up from
/// generation events as they arrive.
pub struct Deck {
    requested_labels: Vec<String>,
    back_image: Option<ImageData>,
    cards: Vec<CardRecord>,
    status: GenerationStatus,
    last_error: Option<String>,
}

impl Default for Deck {
    fn default() -> Deck {
        return Deck {
            requested_labels: vec![],
            back_image: None,
            cards: vec![],
            status: GenerationStatus::Idle,
            last_error: None,
        };
    }
}

impl Deck {
    /// Begins a new session, dropping everything from the previous one.
    pub fn start(&mut self, labels: &[String]) {
        *self = Deck {
            requested_labels: labels.to_vec(),
            status: GenerationStatus::Generating,
            ..Deck::default()
        };
    }

    pub fn handle_event(&mut self, event: GenerationEvent) {
        match event {
            GenerationEvent::BackImageReady(image) => {
                self.back_image = Some(image);
            }
            GenerationEvent::CardGenerated(card) => {
                self.cards.push(card);
            }
            GenerationEvent::LabelFailed { message, .. } => {
                self.last_error = Some(message);
            }
            GenerationEvent::Finished { .. } => {
                self.status = GenerationStatus::Idle;
            }
        }
    }

    /// Records a batch-stopping failure and returns to idle.
    pub fn fail(&mut self, message: &str) {
        self.last_error = Some(message.to_string());
        self.status = GenerationStatus::Idle;
    }

    pub fn requested_labels(&self) -> &[String] {
        return &self.requested_labels;
    }

    pub fn back_image(&self) -> Option<&ImageData> {
        return self.back_image.as_ref();
    }

    pub fn cards(&self) -> &[CardRecord] {
        return &self.cards;
    }

    pub fn status(&self) -> GenerationStatus {
        return self.status;
    }

    pub fn last_error(&self) -> Option<&str> {
        return self.last_error.as_deref();
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    pub fn card(&self, id: &str) -> Option<&CardRecord> {
        return self.cards.iter().find(|card| return card.id() == id);
    }

    fn card_mut(&mut self, id: &str) -> Result<&mut CardRecord> {
        let Some(card) = self.cards.iter_mut().find(|card| return card.id() == id) else {
            bail!(format!("No card found for id {id}"));
        };

        return Ok(card);
    }

    /// Replaces the current image of a card. The original stays as generated.
    pub fn accept_edit(&mut self, id: &str, image: ImageData) -> Result<()> {
        self.card_mut(id)?.accept_image(image);
        return Ok(());
    }

    pub fn revert(&mut self, id: &str) -> Result<()> {
        self.card_mut(id)?.revert();
        return Ok(());
    }

    pub fn sheets(&self) -> Vec<SheetPair<'_>> {
        return Pagination::paginate(&self.cards, self.back_image.as_ref());
    }
}
