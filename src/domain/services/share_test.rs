use anyhow::Result;

use super::SharePackage;
use crate::domain::models::CardRecord;
use crate::domain::models::ImageData;

#[test]
fn it_builds_a_package_from_the_current_image() {
    let mut card = CardRecord::new("Joy", ImageData::new("image/png", vec![1]));
    card.accept_image(ImageData::new("image/jpeg", vec![2, 3]));

    let package = SharePackage::from_card(&card);

    assert_eq!(package.file_name, "Joy.jpg");
    assert_eq!(package.mime_type, "image/jpeg");
    assert_eq!(package.title, "Emotion card: Joy");
    assert_eq!(package.text, "This is a 'Joy' emotion card.");
    assert_eq!(package.bytes, vec![2, 3]);
}

#[test]
fn it_keeps_file_names_inside_the_output_dir() {
    let card = CardRecord::new("Anger/Rage", ImageData::new("image/png", vec![1]));
    let package = SharePackage::from_card(&card);

    assert_eq!(package.file_name, "Anger_Rage.png");
    assert_eq!(package.title, "Emotion card: Anger/Rage");

    let card = CardRecord::new("../x", ImageData::new("image/png", vec![1]));
    assert_eq!(SharePackage::from_card(&card).file_name, "_x.png");
}

#[tokio::test]
async fn it_writes_the_package_to_disk() -> Result<()> {
    let dir = std::env::temp_dir().join(format!("deckforge-share-{}", uuid::Uuid::new_v4()));
    let card = CardRecord::new("Fear", ImageData::new("image/png", vec![4, 5, 6]));

    let image_path = SharePackage::from_card(&card).write_to(&dir).await?;

    assert_eq!(image_path, dir.join("Fear.png"));
    assert_eq!(tokio::fs::read(&image_path).await?, vec![4, 5, 6]);
    let note = tokio::fs::read_to_string(dir.join("Fear.txt")).await?;
    assert_eq!(note, "Emotion card: Fear\n\nThis is a 'Fear' emotion card.\n");

    tokio::fs::remove_dir_all(&dir).await?;
    return Ok(());
}
