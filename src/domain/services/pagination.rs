#[cfg(test)]
#[path = "pagination_test.rs"]
mod tests;

use crate::domain::models::CardRecord;
use crate::domain::models::ImageData;
use crate::domain::models::Sheet;
use crate::domain::models::SheetPair;
use crate::domain::models::SheetSide;
use crate::domain::models::Slot;
use crate::domain::models::SLOTS_PER_SHEET;

pub struct Pagination {}

impl Pagination {
    /// Lays cards out for duplex printing. Every group of up to four cards
    /// becomes a front sheet, padded with placeholders, immediately followed
    /// by a full back sheet. Nothing is produced without cards or a back
    /// image.
    pub fn paginate<'a>(
        cards: &'a [CardRecord],
        back_image: Option<&'a ImageData>,
    ) -> Vec<SheetPair<'a>> {
        let Some(back_image) = back_image else {
            return vec![];
        };

        return cards
            .chunks(SLOTS_PER_SHEET)
            .map(|group| {
                let mut front_slots = [Slot::Placeholder; SLOTS_PER_SHEET];
                for (idx, card) in group.iter().enumerate() {
                    front_slots[idx] = Slot::Card(card);
                }

                return SheetPair {
                    front: Sheet {
                        side: SheetSide::Front,
                        slots: front_slots,
                    },
                    back: Sheet {
                        side: SheetSide::Back,
                        slots: [Slot::Back(back_image); SLOTS_PER_SHEET],
                    },
                };
            })
            .collect();
    }

    /// Sheets in print order: front, back, front, back...
    pub fn print_order<'a>(pairs: &'a [SheetPair<'a>]) -> Vec<&'a Sheet<'a>> {
        return pairs
            .iter()
            .flat_map(|pair| return [&pair.front, &pair.back])
            .collect();
    }
}
