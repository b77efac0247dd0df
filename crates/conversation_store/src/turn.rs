use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stand-in text persisted and displayed when a side of an exchange is empty.
pub const EMPTY_PLACEHOLDER: &str = "...";

/// Fixed synthetic assistant acknowledgement paired with an unlock phrase.
pub const UNLOCK_ACK: &str = "Okay! How can I help?";

/// One (user, assistant) exchange in the conversation history.
///
/// Turns are immutable once written; the store only ever appends them or
/// deletes the whole history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub id: String,
    pub user_text: String,
    pub assistant_text: String,
    pub is_unlock_turn: bool,
}

impl Turn {
    /// A genuine exchange. Empty sides are normalized to the placeholder so a
    /// persisted record never carries an empty field.
    #[must_use]
    pub fn exchange(user_text: impl Into<String>, assistant_text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_text: normalize(user_text.into()),
            assistant_text: normalize(assistant_text.into()),
            is_unlock_turn: false,
        }
    }

    /// The synthetic unlock exchange: the configured phrase paired with the
    /// fixed acknowledgement.
    #[must_use]
    pub fn unlock(unlock_phrase: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_text: normalize(unlock_phrase.into()),
            assistant_text: UNLOCK_ACK.to_string(),
            is_unlock_turn: true,
        }
    }
}

fn normalize(text: String) -> String {
    if text.is_empty() {
        EMPTY_PLACEHOLDER.to_string()
    } else {
        text
    }
}

/// Wire form of one persisted turn: one JSON object per line, four ordered
/// fields, `unlock` encoded as 0 (real) or 1 (unlock).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct TurnRecord {
    pub id: String,
    pub user_text: String,
    pub assistant_text: String,
    pub unlock: u8,
}

impl TurnRecord {
    /// Converts a parsed record back into a domain turn.
    ///
    /// Returns `None` for flag values outside {0, 1}; an out-of-range flag
    /// marks a corrupt record and the caller skips the line.
    pub fn into_turn(self) -> Option<Turn> {
        let is_unlock_turn = match self.unlock {
            0 => false,
            1 => true,
            _ => return None,
        };

        Some(Turn {
            id: self.id,
            user_text: self.user_text,
            assistant_text: self.assistant_text,
            is_unlock_turn,
        })
    }
}

impl From<&Turn> for TurnRecord {
    fn from(turn: &Turn) -> Self {
        Self {
            id: turn.id.clone(),
            user_text: turn.user_text.clone(),
            assistant_text: turn.assistant_text.clone(),
            unlock: u8::from(turn.is_unlock_turn),
        }
    }
}
