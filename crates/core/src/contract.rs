//! Text parsing helpers shared by the persistence adapters

use crate::error::{ConfigError, Result};

/// Parse a boolean literal
///
/// Accepts `true` and `false` in any letter case; everything else,
/// including surrounding whitespace, is rejected.
///
/// # Errors
///
/// Returns [`ConfigError::Malformed`] for any other text.
pub fn parse_boolean(text: &str) -> Result<bool> {
    if text.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if text.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(ConfigError::malformed(format!(
            "\"{}\" is not a boolean",
            text
        )))
    }
}

/// Canonical text of a boolean
pub fn format_boolean(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}
