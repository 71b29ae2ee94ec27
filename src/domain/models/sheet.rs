use super::CardRecord;
use super::ImageData;

pub const SHEET_COLUMNS: usize = 2;
pub const SHEET_ROWS: usize = 2;
pub const SLOTS_PER_SHEET: usize = SHEET_COLUMNS * SHEET_ROWS;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SheetSide {
    Front,
    Back,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot<'a> {
    Card(&'a CardRecord),
    Back(&'a ImageData),
    Placeholder,
}

/// One printable page. Slots are stored row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sheet<'a> {
    pub side: SheetSide,
    pub slots: [Slot<'a>; SLOTS_PER_SHEET],
}

impl<'a> Sheet<'a> {
    /// Grid coordinates `(row, column)` of a slot index.
    pub fn position(index: usize) -> (usize, usize) {
        return (index / SHEET_COLUMNS, index % SHEET_COLUMNS);
    }

    pub fn card_count(&self) -> usize {
        return self
            .slots
            .iter()
            .filter(|slot| return matches!(slot, Slot::Card(_)))
            .count();
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SheetPair<'a> {
    pub front: Sheet<'a>,
    pub back: Sheet<'a>,
}
