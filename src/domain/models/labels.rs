#[cfg(test)]
#[path = "labels_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;

pub const DEFAULT_LABELS: &str = "Anger, Joy, Sorrow, Fear, Surprise, Disgust";

pub struct Labels {}

impl Labels {
    /// Splits comma separated input into trimmed, non-empty labels. Order and
    /// duplicates are preserved.
    pub fn parse(input: &str) -> Result<Vec<String>> {
        let labels = input
            .split(',')
            .map(|label| return label.trim())
            .filter(|label| return !label.is_empty())
            .map(|label| return label.to_string())
            .collect::<Vec<String>>();

        if labels.is_empty() {
            bail!("Please provide at least one label, separated by commas.");
        }

        return Ok(labels);
    }

    /// File name stem for artifacts named after a label. Whitespace runs become
    /// `_` and path separators are replaced so the file always lands directly
    /// inside the output directory.
    pub fn file_stem(label: &str) -> String {
        let joined = label.split_whitespace().collect::<Vec<&str>>().join("_");
        let stem = joined
            .chars()
            .map(|ch| {
                if matches!(ch, '/' | '\\' | ':') || ch.is_control() {
                    return '_';
                }
                return ch;
            })
            .collect::<String>()
            .trim_start_matches('.')
            .to_string();

        if stem.is_empty() {
            return "card".to_string();
        }

        return stem;
    }
}
