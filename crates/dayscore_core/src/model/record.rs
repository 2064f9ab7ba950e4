//! Daily record domain model.
//!
//! # Responsibility
//! - Define the persisted daily record and its write-side draft.
//! - Validate draft invariants before persistence.
//!
//! # Invariants
//! - A user owns at most one record per calendar `date`.
//! - `memo` holds the codec output and is capped at 500 characters.
//! - `created_at`/`updated_at` are Unix epoch milliseconds set by storage.

use crate::model::memo::{self, MemoPayload};
use crate::model::satisfaction::SatisfactionLevel;
use crate::model::user::UserId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Maximum memo length in characters.
pub const MEMO_MAX_CHARS: usize = 500;

/// Storage-assigned record identifier.
pub type RecordId = i64;

/// Validation failures for record drafts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordValidationError {
    MemoTooLong { chars: usize, max: usize },
}

impl Display for RecordValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MemoTooLong { chars, max } => {
                write!(f, "memo has {chars} characters; at most {max} allowed")
            }
        }
    }
}

impl Error for RecordValidationError {}

/// Persisted daily satisfaction record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub user_id: UserId,
    pub date: NaiveDate,
    pub satisfaction_level: SatisfactionLevel,
    /// Encoded memo; see [`crate::model::memo`].
    pub memo: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Record {
    /// Decoded notes carried by `memo`.
    pub fn memo_payload(&self) -> MemoPayload {
        memo::decode(&self.memo)
    }

    /// One-line list title derived from `memo`.
    pub fn title(&self) -> String {
        memo::memo_title(&self.memo)
    }
}

/// Write-side shape for create and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordDraft {
    pub date: NaiveDate,
    pub satisfaction_level: SatisfactionLevel,
    pub memo: String,
}

impl RecordDraft {
    /// Builds a draft whose memo is encoded from the two notes.
    pub fn from_notes(
        date: NaiveDate,
        satisfaction_level: SatisfactionLevel,
        notes: &MemoPayload,
    ) -> Self {
        Self {
            date,
            satisfaction_level,
            memo: notes.encode(),
        }
    }

    pub fn validate(&self) -> Result<(), RecordValidationError> {
        let chars = self.memo.chars().count();
        if chars > MEMO_MAX_CHARS {
            return Err(RecordValidationError::MemoTooLong {
                chars,
                max: MEMO_MAX_CHARS,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 1).expect("valid date")
    }

    #[test]
    fn from_notes_encodes_memo() {
        let level = SatisfactionLevel::new(4).unwrap();
        let draft = RecordDraft::from_notes(day(), level, &MemoPayload::new("A", "B"));
        assert_eq!(draft.memo, "できたこと: A\n\nできなかったこと: B");
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn validate_counts_characters_not_bytes() {
        let level = SatisfactionLevel::new(2).unwrap();
        let mut draft = RecordDraft {
            date: day(),
            satisfaction_level: level,
            memo: "満".repeat(MEMO_MAX_CHARS),
        };
        assert!(draft.validate().is_ok());

        draft.memo.push('足');
        assert_eq!(
            draft.validate(),
            Err(RecordValidationError::MemoTooLong {
                chars: MEMO_MAX_CHARS + 1,
                max: MEMO_MAX_CHARS,
            })
        );
    }
}
