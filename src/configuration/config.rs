#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::env;
use std::path;
use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use clap::ArgMatches;
use clap::Command;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;
use tokio::fs;

use crate::domain::models::BackendName;
use crate::domain::models::DEFAULT_BACK_PROMPT;
use crate::domain::models::DEFAULT_FRONT_PROMPT;
use crate::domain::models::DEFAULT_LABELS;

static CONFIG: Lazy<DashMap<String, String>> = Lazy::new(DashMap::new);

#[derive(Clone, Copy, Debug, Eq, PartialEq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ConfigKey {
    Backend,
    BackPrompt,
    ConfigFile,
    FontFile,
    FrontPrompt,
    GeminiToken,
    #[strum(serialize = "gemini-url")]
    GeminiURL,
    Labels,
    Model,
    OutputDir,
    RequestDelay,
    RequestTimeout,
}

fn parse_millis(key: ConfigKey, val: &str) -> Result<Duration> {
    if val.is_empty() {
        return Ok(Duration::ZERO);
    }

    let Ok(millis) = val.parse::<u64>() else {
        bail!(format!(
            "Config key '{key}' must be a number of milliseconds, got: {val}"
        ));
    };

    return Ok(Duration::from_millis(millis));
}

pub struct Config {}

impl Config {
    pub fn get(key: ConfigKey) -> String {
        if let Some(val) = CONFIG.get(&key.to_string()) {
            return val.to_string();
        }

        return "".to_string();
    }

    pub fn set(key: ConfigKey, value: &str) {
        CONFIG.insert(key.to_string(), value.to_string());
    }

    /// Reads a millisecond value from config. Empty values resolve to zero.
    pub fn get_duration(key: ConfigKey) -> Result<Duration> {
        return parse_millis(key, &Config::get(key));
    }

    pub fn cache_dir() -> path::PathBuf {
        #[cfg(not(target_os = "macos"))]
        let dir = dirs::cache_dir()
            .unwrap_or_else(env::temp_dir)
            .join("deckforge");
        #[cfg(target_os = "macos")]
        let dir = dirs::home_dir()
            .unwrap_or_else(env::temp_dir)
            .join(".config/deckforge");

        return dir;
    }

    pub fn default(key: ConfigKey) -> String {
        let default_backend = BackendName::Gemini.to_string();
        let config_path = Config::cache_dir().join("config.toml");
        let config_path_str = config_path.to_string_lossy().to_string();

        let res = match key {
            ConfigKey::Backend => &default_backend,
            ConfigKey::BackPrompt => DEFAULT_BACK_PROMPT,
            ConfigKey::FontFile => "",
            ConfigKey::FrontPrompt => DEFAULT_FRONT_PROMPT,
            ConfigKey::GeminiToken => "",
            ConfigKey::GeminiURL => "https://generativelanguage.googleapis.com",
            ConfigKey::Labels => DEFAULT_LABELS,
            ConfigKey::Model => "gemini-2.5-flash-image",
            ConfigKey::OutputDir => "./deckforge-output",
            ConfigKey::RequestDelay => "5000",
            ConfigKey::RequestTimeout => "0",

            // Special
            ConfigKey::ConfigFile => &config_path_str,
        };

        return res.to_string();
    }

    pub async fn load(cmd: Command, clap_arg_matches: Vec<&ArgMatches>) -> Result<()> {
        for key in ConfigKey::iter() {
            Config::set(key, &Config::default(key))
        }

        let mut config_file = Config::default(ConfigKey::ConfigFile);
        for matches in clap_arg_matches.as_slice() {
            if let Ok(Some(arg_config_file)) =
                matches.try_get_one::<String>(&ConfigKey::ConfigFile.to_string())
            {
                config_file = arg_config_file.to_string();
            }
        }

        let config_path = path::PathBuf::from(config_file);
        if config_path.exists() {
            let toml_str = fs::read_to_string(config_path).await?;
            Config::apply_toml(&cmd, &toml_str)?;
        }

        for key in ConfigKey::iter() {
            for matches in clap_arg_matches.as_slice() {
                if let Ok(Some(val)) = matches.try_get_one::<String>(&key.to_string()) {
                    if val.is_empty() {
                        continue;
                    }
                    Config::set(key, val)
                }
            }
        }

        if Config::get(ConfigKey::GeminiToken).is_empty() {
            if let Ok(token) = env::var("GEMINI_API_KEY") {
                Config::set(ConfigKey::GeminiToken, &token);
            }
        }

        tracing::debug!(
            backend = %Config::get(ConfigKey::Backend),
            model = %Config::get(ConfigKey::Model),
            gemini_url = %Config::get(ConfigKey::GeminiURL),
            request_delay = %Config::get(ConfigKey::RequestDelay),
            request_timeout = %Config::get(ConfigKey::RequestTimeout),
            output_dir = %Config::get(ConfigKey::OutputDir),
            "config"
        );

        return Ok(());
    }

    fn apply_toml(cmd: &Command, toml_str: &str) -> Result<()> {
        let doc = toml_str.parse::<toml_edit::Document>()?;

        for key in ConfigKey::iter() {
            let Some(val) = doc.get(&key.to_string()) else {
                continue;
            };

            // Use clap value parsers to do validation.
            let mut possible_values = vec![];
            if let Some(arg) = cmd
                .get_arguments()
                .find(|e| return e.get_long() == Some(key.to_string().as_str()))
            {
                if !arg.get_possible_values().is_empty() {
                    possible_values = arg
                        .get_possible_values()
                        .iter()
                        .map(|e| return e.get_name().to_string())
                        .collect::<Vec<String>>();
                }
            }

            if let Some(val_int) = val.as_integer() {
                Config::set(key, &val_int.to_string());
            } else if let Some(val_str) = val.as_str() {
                if val_str.is_empty() {
                    continue;
                }
                if !possible_values.is_empty() && !possible_values.contains(&val_str.to_string())
                {
                    bail!(format!("config.toml has an invalid value for key '{key}': {val_str}\nPossible values are: {}", possible_values.join(", ")));
                }
                Config::set(key, val_str);
            } else {
                bail!(format!(
                    "config.toml has an unsupported value type for key '{key}'"
                ));
            }
        }

        return Ok(());
    }

    pub fn serialize_default(cmd: Command) -> String {
        let toml_str = ConfigKey::iter()
            .filter_map(|key| {
                if key == ConfigKey::ConfigFile {
                    return None;
                }

                let arg = cmd
                    .get_arguments()
                    .find(|e| return e.get_long() == Some(key.to_string().as_str()))?;

                let mut description = arg
                    .get_help()
                    .map(|help| return help.to_string())
                    .unwrap_or_default();

                description = description
                    .split("[default:")
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_string();

                if !arg.get_possible_values().is_empty() {
                    let possible_values = arg
                        .get_possible_values()
                        .iter()
                        .map(|e| return e.get_name())
                        .collect::<Vec<_>>()
                        .join(", ");
                    description = format!("{description} [possible values: {}]", possible_values);
                }

                let mut val = Config::default(key);
                if val.is_empty() {
                    val = format!("# {key} = \"\"");
                } else if val.parse::<i64>().is_ok() {
                    val = format!("{key} = {val}");
                } else {
                    let escaped = toml_edit::Value::from(val.as_str()).to_string();
                    val = format!("{key} = {}", escaped.trim());
                }

                return Some(format!("# {description}\n{val}"));
            })
            .collect::<Vec<String>>()
            .join("\n\n");

        return toml_str;
    }
}
