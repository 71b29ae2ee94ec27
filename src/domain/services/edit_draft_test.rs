use anyhow::bail;
use anyhow::Result;

use super::EditDraft;
use super::EditError;
use crate::domain::models::CardRecord;
use crate::domain::models::GenerationEvent;
use crate::domain::models::ImageData;
use crate::domain::services::fake_image_service::FakeImageService;
use crate::domain::services::Deck;

fn deck_with_card() -> (Deck, String) {
    let mut deck = Deck::default();
    deck.start(&["Joy".to_string()]);
    deck.handle_event(GenerationEvent::CardGenerated(CardRecord::new(
        "Joy",
        ImageData::new("image/png", b"joy".to_vec()),
    )));
    let id = deck.cards()[0].id().to_string();

    return (deck, id);
}

#[tokio::test]
async fn it_chains_edits_on_the_preview() -> Result<()> {
    let (mut deck, id) = deck_with_card();
    let service = FakeImageService::default();
    let mut draft = EditDraft::new(deck.card(&id).unwrap());

    draft.apply(&service, "add a frame").await?;
    let preview = draft.apply(&service, " darker ").await?;
    assert_eq!(preview.bytes, b"joy + add a frame + darker".to_vec());

    assert!(draft.save(&mut deck)?);
    let card = deck.card(&id).unwrap();
    assert_eq!(card.current_image().bytes, b"joy + add a frame + darker".to_vec());
    assert_eq!(card.original_image().bytes, b"joy".to_vec());

    return Ok(());
}

#[tokio::test]
async fn it_rejects_empty_instructions() -> Result<()> {
    let (deck, id) = deck_with_card();
    let service = FakeImageService::default();
    let mut draft = EditDraft::new(deck.card(&id).unwrap());

    let res = draft.apply(&service, "   ").await;
    assert!(matches!(res, Err(EditError::EmptyInstruction)));
    assert!(draft.preview().is_none());

    return Ok(());
}

#[tokio::test]
async fn it_keeps_the_card_untouched_on_failure() -> Result<()> {
    let (mut deck, id) = deck_with_card();
    let service = FakeImageService {
        fail_edits: true,
        ..Default::default()
    };
    let mut draft = EditDraft::new(deck.card(&id).unwrap());

    match draft.apply(&service, "add a frame").await {
        Err(EditError::Service { label, .. }) => assert_eq!(label, "Joy"),
        _ => bail!("Expected an edit failure"),
    }
    assert!(draft.preview().is_none());

    assert!(!draft.save(&mut deck)?);
    let card = deck.card(&id).unwrap();
    assert_eq!(card.current_image().bytes, b"joy".to_vec());
    assert!(!card.is_edited());

    return Ok(());
}

#[tokio::test]
async fn it_keeps_the_previous_preview_on_failure() -> Result<()> {
    let (deck, id) = deck_with_card();
    let working = FakeImageService::default();
    let failing = FakeImageService {
        fail_edits: true,
        ..Default::default()
    };
    let mut draft = EditDraft::new(deck.card(&id).unwrap());

    draft.apply(&working, "add a frame").await?;
    assert!(draft.apply(&failing, "darker").await.is_err());
    assert_eq!(
        draft.source_image().bytes,
        b"joy + add a frame".to_vec()
    );

    return Ok(());
}
