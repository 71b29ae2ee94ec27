use std::io;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use strum::VariantNames;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::BackendName;

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
    std::process::exit(0);
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(&config_file_path).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    println!(
        "Created default config file at {}",
        config_file_path.display()
    );
    return Ok(());
}

pub fn log_path() -> path::PathBuf {
    return Config::cache_dir().join("debug.log");
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn subcommand_debug() -> Command {
    let mut cmd = Command::new("debug");
    cmd = cmd.about("Debug helpers for Deckforge")
        .hide(true)
        .subcommand(
            Command::new("log-path").about("Output path to debug log file generated when running Deckforge with environment variable RUST_LOG=deckforge")
        )
        .subcommand(
            Command::new("enum-config").about("List all config keys as strings.")
        );

    return cmd;
}

fn arg_backend() -> Arg {
    return Arg::new(ConfigKey::Backend.to_string())
        .short('b')
        .long(ConfigKey::Backend.to_string())
        .env("DECKFORGE_BACKEND")
        .num_args(1)
        .help(format!(
            "The image generation backend to use. [default: {}]",
            Config::default(ConfigKey::Backend)
        ))
        .value_parser(PossibleValuesParser::new(BackendName::VARIANTS));
}

fn arg_model() -> Arg {
    return Arg::new(ConfigKey::Model.to_string())
        .short('m')
        .long(ConfigKey::Model.to_string())
        .env("DECKFORGE_MODEL")
        .num_args(1)
        .help(format!(
            "The image model on the backend to use. [default: {}]",
            Config::default(ConfigKey::Model)
        ));
}

fn arg_labels() -> Arg {
    return Arg::new(ConfigKey::Labels.to_string())
        .short('l')
        .long(ConfigKey::Labels.to_string())
        .env("DECKFORGE_LABELS")
        .num_args(1)
        .help(format!(
            "Comma separated labels, one card is generated per label. [default: {}]",
            Config::default(ConfigKey::Labels)
        ));
}

fn arg_request_delay() -> Arg {
    return Arg::new(ConfigKey::RequestDelay.to_string())
        .long(ConfigKey::RequestDelay.to_string())
        .env("DECKFORGE_REQUEST_DELAY")
        .num_args(1)
        .help(format!(
            "Time to wait in milliseconds before each card request, to stay within API rate limits. [default: {}]",
            Config::default(ConfigKey::RequestDelay)
        ));
}

fn subcommand_generate() -> Command {
    return Command::new("generate")
        .about("Generate a new deck, then review, edit, export and print it.")
        .arg(arg_backend())
        .arg(arg_model())
        .arg(arg_labels())
        .arg(arg_request_delay());
}

pub fn build() -> Command {
    let about = format!(
        "{}\n\nVersion: {}\nCommit: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_GIT_DESCRIBE")
    );

    return Command::new("deckforge")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .arg_required_else_help(false)
        .subcommand(subcommand_generate())
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .subcommand(subcommand_debug())
        .arg(arg_backend())
        .arg(arg_model())
        .arg(arg_labels())
        .arg(arg_request_delay())
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env("DECKFORGE_CONFIG_FILE")
                .num_args(1)
                .help(format!("Path to configuration file [default: {}]", Config::default(ConfigKey::ConfigFile)))
                .global(true)
        )
        .arg(
            Arg::new(ConfigKey::RequestTimeout.to_string())
                .long(ConfigKey::RequestTimeout.to_string())
                .env("DECKFORGE_REQUEST_TIMEOUT")
                .num_args(1)
                .help(format!("Time to wait in milliseconds before giving up on a single image request, 0 waits forever. [default: {}]", Config::default(ConfigKey::RequestTimeout)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::GeminiURL.to_string())
                .long(ConfigKey::GeminiURL.to_string())
                .env("DECKFORGE_GEMINI_URL")
                .num_args(1)
                .help(format!("Google Gemini API URL when using the Gemini backend. [default: {}]", Config::default(ConfigKey::GeminiURL)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::GeminiToken.to_string())
                .long(ConfigKey::GeminiToken.to_string())
                .env("DECKFORGE_GEMINI_TOKEN")
                .num_args(1)
                .help("Google Gemini API token when using the Gemini backend. Falls back to GEMINI_API_KEY.")
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::BackPrompt.to_string())
                .long(ConfigKey::BackPrompt.to_string())
                .env("DECKFORGE_BACK_PROMPT")
                .num_args(1)
                .help("Prompt used to generate the shared card back image.")
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::FrontPrompt.to_string())
                .long(ConfigKey::FrontPrompt.to_string())
                .env("DECKFORGE_FRONT_PROMPT")
                .num_args(1)
                .help("Prompt template used for each card front. '{label}' is replaced with the card's label.")
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::OutputDir.to_string())
                .short('o')
                .long(ConfigKey::OutputDir.to_string())
                .env("DECKFORGE_OUTPUT_DIR")
                .num_args(1)
                .help(format!("Directory exported cards, share packages and print sheets are written to. [default: {}]", Config::default(ConfigKey::OutputDir)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::FontFile.to_string())
                .long(ConfigKey::FontFile.to_string())
                .env("DECKFORGE_FONT_FILE")
                .num_args(1)
                .help("Path to a TrueType font used for card labels on export. Defaults to the first bold font found on the system.")
                .global(true),
        );
}

pub async fn parse() -> Result<bool> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("debug", debug_matches)) => {
            match debug_matches.subcommand() {
                Some(("log-path", _)) => {
                    println!("{}", log_path().display());
                }
                Some(("enum-config", _)) => {
                    let res = ConfigKey::VARIANTS.join("\n");
                    println!("{}", res);
                }
                _ => {
                    subcommand_debug().print_long_help()?;
                }
            }

            return Ok(false);
        }
        Some(("generate", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
                return Ok(false);
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
                return Ok(false);
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
                return Ok(false);
            }
            _ => {
                subcommand_config().print_long_help()?;
                return Ok(false);
            }
        },
        _ => {
            Config::load(build(), vec![&matches]).await?;
        }
    }

    return Ok(true);
}
