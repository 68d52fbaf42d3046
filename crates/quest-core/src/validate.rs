//! Input normalisation shared by every operation.

use crate::error::{QuestError, Result};

pub const MAX_TITLE_CHARS: usize = 50;
pub const MAX_DESCRIPTION_CHARS: usize = 1000;
pub const MAX_CONTENT_CHARS: usize = 500;

/// Trims and lower-cases an email. Rejects anything without a local part and
/// a domain.
pub fn email(raw: &str) -> Result<String> {
    let email = raw.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(QuestError::Validation(format!("invalid email: {raw:?}")));
    }
    Ok(email)
}

/// Trims `raw` and checks it is non-empty and at most `max` characters.
pub fn required_text(field: &str, raw: &str, max: usize) -> Result<String> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(QuestError::Validation(format!("{field} must not be empty")));
    }
    bounded_text(field, text, max)
}

pub fn bounded_text(field: &str, raw: &str, max: usize) -> Result<String> {
    let text = raw.trim();
    if text.chars().count() > max {
        return Err(QuestError::Validation(format!(
            "{field} is too long (at most {max} characters)"
        )));
    }
    Ok(text.to_string())
}

/// Empty strings mean "not given".
pub fn optional_text(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}
