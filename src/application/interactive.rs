#[cfg(test)]
#[path = "interactive_test.rs"]
mod tests;

use std::path;

use anyhow::bail;
use anyhow::Result;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Input;
use dialoguer::Select;
use owo_colors::OwoColorize;
use tokio::fs;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::interrupts::Interrupts;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::BackendName;
use crate::domain::models::GenerationEvent;
use crate::domain::models::ImageServiceBox;
use crate::domain::models::Labels;
use crate::domain::services::export::Exporter;
use crate::domain::services::print::render_print_document;
use crate::domain::services::print::PRINT_FILE_NAME;
use crate::domain::services::BatchGenerator;
use crate::domain::services::Deck;
use crate::domain::services::EditDraft;
use crate::domain::services::GenerationSettings;
use crate::domain::services::SharePackage;
use crate::infrastructure::backends::BackendManager;

const PRINT_TITLE: &str = "Emotion cards";

const MENU_ITEMS: [&str; 8] = [
    "List cards",
    "Edit a card",
    "Revert a card to its original image",
    "Export a card",
    "Share a card",
    "Print all cards",
    "Generate a new deck",
    "Quit",
];

pub async fn write_artifact(
    dir: &path::Path,
    file_name: &str,
    bytes: &[u8],
) -> Result<path::PathBuf> {
    fs::create_dir_all(dir).await?;
    let file_path = dir.join(file_name);
    fs::write(&file_path, bytes).await?;

    tracing::info!(file = %file_path.display(), "wrote artifact");
    return Ok(file_path);
}

/// Runs one generation batch into `deck`, printing progress as events arrive.
/// The batch stops early once `cancel` fires.
pub async fn generate_deck(
    deck: &mut Deck,
    service: ImageServiceBox,
    settings: GenerationSettings,
    labels: &[String],
    cancel: CancellationToken,
) -> Result<()> {
    deck.start(labels);

    let total = labels.len();
    let (tx, mut rx) = mpsc::unbounded_channel::<GenerationEvent>();
    let generator = BatchGenerator::new(service, settings);
    let task_labels = labels.to_vec();
    let task_cancel = cancel.clone();
    let handle = tokio::spawn(async move {
        return generator.run(&task_labels, &task_cancel, &tx).await;
    });

    println!(
        "Generating {total} cards. Press {} to stop after the current card.",
        "Ctrl-C".bold()
    );

    while let Some(event) = rx.recv().await {
        match &event {
            GenerationEvent::BackImageReady(_) => {
                println!("{} Card back ready", "✓".green());
            }
            GenerationEvent::CardGenerated(card) => {
                println!(
                    "{} [{}/{total}] {}",
                    "✓".green(),
                    deck.cards().len() + 1,
                    card.label()
                );
            }
            GenerationEvent::LabelFailed { message, .. } => {
                println!("{} {message}", "✗".red());
            }
            GenerationEvent::Finished { cancelled } => {
                if *cancelled {
                    println!("{}", "Generation stopped.".yellow());
                }
            }
        }
        deck.handle_event(event);
    }

    match handle.await? {
        Ok(outcome) => {
            println!(
                "Generated {} of {total} cards.",
                outcome.records.len().to_string().bold()
            );
        }
        Err(err) => {
            deck.fail(&err.to_string());
            println!("{}", err.to_string().red());
        }
    }

    return Ok(());
}

fn select_card(deck: &Deck, prompt: &str) -> Result<Option<String>> {
    if deck.cards().is_empty() {
        println!("{}", "There are no cards yet.".yellow());
        return Ok(None);
    }

    let items = deck
        .cards()
        .iter()
        .map(|card| {
            if card.is_edited() {
                return format!("{} (edited)", card.label());
            }
            return card.label().to_string();
        })
        .collect::<Vec<String>>();

    let idx = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(0)
        .items(&items)
        .interact_opt()?;

    return Ok(idx.map(|idx| return deck.cards()[idx].id().to_string()));
}

pub struct Interactive {
    deck: Deck,
    service: ImageServiceBox,
    settings: GenerationSettings,
    output_dir: path::PathBuf,
    font_file: String,
    interrupts: Interrupts,
}

impl Interactive {
    pub fn from_config() -> Result<Interactive> {
        let Some(backend) = BackendName::parse(Config::get(ConfigKey::Backend)) else {
            bail!(format!(
                "Unknown backend '{}'",
                Config::get(ConfigKey::Backend)
            ));
        };

        let settings = GenerationSettings {
            back_prompt: Config::get(ConfigKey::BackPrompt),
            front_prompt: Config::get(ConfigKey::FrontPrompt),
            request_delay: Config::get_duration(ConfigKey::RequestDelay)?,
        };

        return Ok(Interactive {
            deck: Deck::default(),
            service: BackendManager::get(backend)?,
            settings,
            output_dir: path::PathBuf::from(Config::get(ConfigKey::OutputDir)),
            font_file: Config::get(ConfigKey::FontFile),
            interrupts: Interrupts::default(),
        });
    }

    pub async fn start(&mut self) -> Result<()> {
        let labels = Labels::parse(&Config::get(ConfigKey::Labels))?;
        self.interrupts.listen();
        self.generate(&labels).await?;

        loop {
            self.print_status();

            let choice = Select::with_theme(&ColorfulTheme::default())
                .with_prompt("What would you like to do?")
                .default(0)
                .items(&MENU_ITEMS)
                .interact_opt()?;

            let res = match choice {
                Some(0) => {
                    self.list_cards();
                    Ok(())
                }
                Some(1) => self.edit_card().await,
                Some(2) => self.revert_card(),
                Some(3) => self.export_card().await,
                Some(4) => self.share_card().await,
                Some(5) => self.print_cards().await,
                Some(6) => self.new_deck().await,
                _ => break,
            };

            if let Err(err) = res {
                tracing::error!(error = %err, "menu action failed");
                println!("{}", err.to_string().red());
            }
        }

        return Ok(());
    }

    async fn generate(&mut self, labels: &[String]) -> Result<()> {
        let cancel = self.interrupts.begin_batch();
        let res = generate_deck(
            &mut self.deck,
            self.service.clone(),
            self.settings.clone(),
            labels,
            cancel,
        )
        .await;
        self.interrupts.end_batch();

        return res;
    }

    fn print_status(&mut self) {
        println!();
        if let Some(err) = self.deck.last_error() {
            println!("{} {err}", "Last error:".red().bold());
        }
        self.deck.clear_error();

        println!(
            "{} cards in deck, {} requested.",
            self.deck.cards().len(),
            self.deck.requested_labels().len()
        );
    }

    fn list_cards(&self) {
        for (idx, card) in self.deck.cards().iter().enumerate() {
            let mut line = format!("{}. {}", idx + 1, card.label());
            if card.is_edited() {
                line = format!("{line} {}", "(edited)".cyan());
            }
            println!("{line}");
        }
    }

    async fn edit_card(&mut self) -> Result<()> {
        let Some(id) = select_card(&self.deck, "Which card would you like to edit?")? else {
            return Ok(());
        };
        let Some(card) = self.deck.card(&id) else {
            bail!("Card not found");
        };

        let label = card.label().to_string();
        let mut draft = EditDraft::new(card);

        loop {
            let instruction: String = Input::with_theme(&ColorfulTheme::default())
                .with_prompt(format!("Describe the change for '{label}'"))
                .allow_empty(true)
                .interact_text()?;

            println!("Editing '{label}'...");
            match draft.apply(self.service.as_ref(), &instruction).await {
                Ok(preview) => {
                    let file_name = format!(
                        "{}_preview.{}",
                        Labels::file_stem(&label),
                        preview.extension()
                    );
                    let preview_path =
                        write_artifact(&self.output_dir, &file_name, &preview.bytes).await?;
                    println!("Preview written to {}", preview_path.display().bold());
                }
                Err(err) => {
                    println!("{}", err.to_string().red());
                }
            }

            let choice = Select::with_theme(&ColorfulTheme::default())
                .with_prompt("Keep this edit?")
                .default(0)
                .items(&["Save", "Edit further", "Discard"])
                .interact_opt()?;

            match choice {
                Some(0) => {
                    if draft.save(&mut self.deck)? {
                        println!("{} Saved edit to '{label}'", "✓".green());
                    } else {
                        println!("Nothing to save.");
                    }
                    return Ok(());
                }
                Some(1) => continue,
                _ => {
                    println!("Discarded edits to '{label}'.");
                    return Ok(());
                }
            }
        }
    }

    fn revert_card(&mut self) -> Result<()> {
        let Some(id) = select_card(&self.deck, "Which card should be reverted?")? else {
            return Ok(());
        };

        self.deck.revert(&id)?;
        println!("{} Reverted to the original image", "✓".green());
        return Ok(());
    }

    async fn export_card(&self) -> Result<()> {
        let Some(id) = select_card(&self.deck, "Which card would you like to export?")? else {
            return Ok(());
        };
        let Some(card) = self.deck.card(&id) else {
            bail!("Card not found");
        };

        let exporter = Exporter::load(&self.font_file).await?;
        let export = exporter.render(&card.current_image().bytes, card.label())?;
        let file_path =
            write_artifact(&self.output_dir, &export.file_name, &export.png).await?;

        println!("{} Exported to {}", "✓".green(), file_path.display());
        return Ok(());
    }

    async fn share_card(&self) -> Result<()> {
        let Some(id) = select_card(&self.deck, "Which card would you like to share?")? else {
            return Ok(());
        };
        let Some(card) = self.deck.card(&id) else {
            bail!("Card not found");
        };

        let package = SharePackage::from_card(card);
        let file_path = package.write_to(&self.output_dir).await?;

        println!("{}", package.title.bold());
        println!("{}", package.text);
        println!("{} Ready to share at {}", "✓".green(), file_path.display());
        return Ok(());
    }

    async fn print_cards(&self) -> Result<()> {
        let sheets = self.deck.sheets();
        let html = render_print_document(&sheets, PRINT_TITLE)?;
        let file_path =
            write_artifact(&self.output_dir, PRINT_FILE_NAME, html.as_bytes()).await?;

        let cards = sheets
            .iter()
            .map(|pair| return pair.front.card_count())
            .sum::<usize>();
        println!(
            "{} {cards} cards on {} pages written to {}. Open it in a browser and print double-sided.",
            "✓".green(),
            sheets.len() * 2,
            file_path.display()
        );
        return Ok(());
    }

    async fn new_deck(&mut self) -> Result<()> {
        let current = self.deck.requested_labels().join(", ");
        let input: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt("Labels, separated by commas")
            .with_initial_text(current)
            .interact_text()?;

        let labels = Labels::parse(&input)?;
        return self.generate(&labels).await;
    }
}
