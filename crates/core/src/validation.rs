//! Chain name and tag validation.
//!
//! Applied by the runtime before a chain is registered so the unique-name
//! table never holds malformed keys.

use crate::error::CoreError;

/// Maximum length of a unique chain name.
const MAX_NAME_LEN: usize = 128;

/// Maximum length of a single observation tag.
const MAX_TAG_LEN: usize = 64;

/// Validate a unique chain name.
///
/// Rules:
/// - Must not be empty.
/// - Must not exceed `MAX_NAME_LEN` characters.
/// - Must contain only alphanumeric, hyphen, underscore, or dot characters.
pub fn validate_chain_name(name: &str) -> Result<(), CoreError> {
    if name.is_empty() {
        return Err(CoreError::Validation(
            "Chain name must not be empty".to_string(),
        ));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "Chain name must not exceed {MAX_NAME_LEN} characters"
        )));
    }
    if !name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return Err(CoreError::Validation(
            "Chain name may only contain alphanumeric, hyphen, underscore, or dot characters"
                .to_string(),
        ));
    }
    Ok(())
}

/// Validate an observation tag.
///
/// Rules:
/// - Must not be empty.
/// - Must not exceed `MAX_TAG_LEN` characters.
pub fn validate_tag(tag: &str) -> Result<(), CoreError> {
    if tag.is_empty() {
        return Err(CoreError::Validation("Tag must not be empty".to_string()));
    }
    if tag.len() > MAX_TAG_LEN {
        return Err(CoreError::Validation(format!(
            "Tag must not exceed {MAX_TAG_LEN} characters"
        )));
    }
    Ok(())
}
