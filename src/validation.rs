//! User id validation for store keys and log lines

use std::collections::HashSet;

use crate::gacha::errors::GachaError;

pub const USER_ID_MIN_LEN: usize = 3;
pub const USER_ID_MAX_LEN: usize = 20;

/// User id validation errors with helpful messages
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserIdError {
    #[error("user id is too short (minimum {min} characters)")]
    TooShort { min: usize },

    #[error("user id is too long (maximum {max} characters)")]
    TooLong { max: usize },

    #[error("user id contains invalid characters: {chars}")]
    InvalidCharacters { chars: String },

    #[error("user id is a reserved name")]
    Reserved,
}

impl From<UserIdError> for GachaError {
    fn from(err: UserIdError) -> Self {
        GachaError::InvalidUserId(err.to_string())
    }
}

/// Names that would be confusing on a leaderboard or collide with CLI words
fn reserved_names() -> HashSet<&'static str> {
    [
        "admin", "administrator", "root", "system", "sysop", "operator",
        "guest", "anonymous", "null", "none",
        "con", "prn", "aux", "nul",
        "roll", "status", "claim", "equip", "leaderboard", "init",
    ]
    .iter()
    .copied()
    .collect()
}

/// Validate a user id; returns the trimmed id with its original case.
///
/// Store keys are case-insensitive, so `Ash` and `ash` are the same account.
pub fn check_user_id(user_id: &str) -> Result<String, UserIdError> {
    let trimmed = user_id.trim();
    let len = trimmed.chars().count();
    if len < USER_ID_MIN_LEN {
        return Err(UserIdError::TooShort {
            min: USER_ID_MIN_LEN,
        });
    }
    if len > USER_ID_MAX_LEN {
        return Err(UserIdError::TooLong {
            max: USER_ID_MAX_LEN,
        });
    }

    let invalid: String = trimmed
        .chars()
        .filter(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
        .collect::<HashSet<char>>()
        .into_iter()
        .collect();
    if !invalid.is_empty() {
        return Err(UserIdError::InvalidCharacters { chars: invalid });
    }

    if reserved_names().contains(trimmed.to_ascii_lowercase().as_str()) {
        return Err(UserIdError::Reserved);
    }

    Ok(trimmed.to_string())
}

/// [`check_user_id`] mapped into the engine error type.
pub fn validate_user_id(user_id: &str) -> Result<String, GachaError> {
    Ok(check_user_id(user_id)?)
}
