#[cfg(test)]
#[path = "prompts_test.rs"]
mod tests;

pub const DEFAULT_BACK_PROMPT: &str = "An artistic golden Mars symbol on a deep blue textured background. Elegant, clean design, perfect for the back of a card. Print quality, 1890x2832 pixels, 600 DPI.";

pub const DEFAULT_FRONT_PROMPT: &str = "A highly detailed illustration in the style of a symbolist painting. The subject is a masculine allegorical figure inspired by European mythology who embodies the emotion '{label}'. The image captures the inner, spiritual experience of the emotion. Dark colour palette: deep blue, gold, black. Print quality, 1890x2832 pixels, 600 DPI. IMPORTANT: the image must not contain any text, letters or captions.";

const LABEL_PLACEHOLDER: &str = "{label}";

/// Fills the `{label}` placeholder of a front prompt template. Templates
/// without the placeholder get the label appended so every card still gets
/// its own theme.
pub fn front_prompt(template: &str, label: &str) -> String {
    if !template.contains(LABEL_PLACEHOLDER) {
        return format!("{template} Theme: '{label}'.");
    }

    return template.replace(LABEL_PLACEHOLDER, label);
}
