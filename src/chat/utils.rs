#[cfg(test)]
#[path = "utils_test.rs"]
mod tests;

use crate::config::constants::{DEFAULT_TITLE, MAX_TITLE_LENGTH};

/// Builds a conversation title out of its first prompt: whitespace runs
/// collapse to one space and long prompts are cut with a trailing `...`.
pub fn generate_title(prompt: &str) -> String {
    let cleaned = prompt.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.is_empty() {
        return DEFAULT_TITLE.to_string();
    }

    if cleaned.chars().count() <= MAX_TITLE_LENGTH {
        return cleaned;
    }

    let truncated = cleaned.chars().take(MAX_TITLE_LENGTH).collect::<String>();
    format!("{}...", truncated.trim_end())
}
