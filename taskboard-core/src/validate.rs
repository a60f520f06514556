/// Field checks applied before anything reaches the store.
use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::error::ValidationError;
use crate::types::{is_backlog, CardDraft, CardEdit};

pub const TAG_NAME_MAX_CHARS: usize = 50;

static HEX_COLOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").unwrap());

/// Empty or missing colors are allowed; anything else must be `#rgb` or `#rrggbb`.
pub fn color(value: Option<&str>) -> Result<(), ValidationError> {
    match value {
        None => Ok(()),
        Some(c) if c.is_empty() || HEX_COLOR_RE.is_match(c) => Ok(()),
        Some(c) => Err(ValidationError::InvalidColor(c.to_string())),
    }
}

/// Normalise an optional color: empty strings are stored as no color.
pub fn normalize_color(value: Option<String>) -> Option<String> {
    value.filter(|c| !c.is_empty())
}

/// Trim a card title, rejecting blank ones.
pub fn title(value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    Ok(trimmed.to_string())
}

/// Trim and NFC-normalise a tag name; 1..=50 characters.
pub fn tag_name(value: &str) -> Result<String, ValidationError> {
    let name: String = value.trim().nfc().collect();
    if name.is_empty() {
        return Err(ValidationError::EmptyTagName);
    }
    let len = name.chars().count();
    if len > TAG_NAME_MAX_CHARS {
        return Err(ValidationError::TagNameTooLong {
            len,
            max: TAG_NAME_MAX_CHARS,
        });
    }
    Ok(name)
}

/// Names for user-created columns. "Backlog" is managed separately.
pub fn column_name(value: &str) -> Result<String, ValidationError> {
    let name = value.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyColumnName);
    }
    if is_backlog(name) {
        return Err(ValidationError::ReservedColumnName(name.to_string()));
    }
    Ok(name.to_string())
}

pub fn draft(draft: &CardDraft) -> Result<String, ValidationError> {
    let title = title(&draft.title)?;
    color(draft.color.as_deref())?;
    Ok(title)
}

pub fn edit(edit: &CardEdit) -> Result<String, ValidationError> {
    let title = title(&edit.title)?;
    color(edit.color.as_deref())?;
    Ok(title)
}
