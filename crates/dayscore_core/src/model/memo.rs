//! Memo codec for the two free-text record notes.
//!
//! # Responsibility
//! - Pack "things done" / "things not done" into the single stored `memo`.
//! - Unpack stored memos written with the current or the legacy convention.
//!
//! # Invariants
//! - `encode` only ever produces the current convention.
//! - `decode(encode(done, not_done))` returns the inputs unchanged when
//!   neither contains a separator sequence.
//! - `decode` is total: unrecognized shapes fall back to a single field.
//! - Separator tokens are not escaped. A note containing a separator is
//!   split positionally by the first matching rule.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const DONE_PREFIX: &str = "できたこと: ";
pub const NOT_DONE_SEPARATOR: &str = "\n\nできなかったこと: ";
pub const LEGACY_DONE_PREFIX: &str = "やったこと: ";
pub const LEGACY_NOT_DONE_SEPARATOR: &str = "\n\nやらなかったこと: ";

/// Title shown for records without any memo text.
pub const EMPTY_MEMO_TITLE: &str = "記録詳細";

const TITLE_MAX_CHARS: usize = 30;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// User-facing pair of notes carried by one stored memo.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoPayload {
    pub things_done: String,
    pub things_not_done: String,
}

impl MemoPayload {
    pub fn new(things_done: impl Into<String>, things_not_done: impl Into<String>) -> Self {
        Self {
            things_done: things_done.into(),
            things_not_done: things_not_done.into(),
        }
    }

    /// Serializes this payload with the current convention.
    pub fn encode(&self) -> String {
        encode(&self.things_done, &self.things_not_done)
    }

    pub fn is_empty(&self) -> bool {
        self.things_done.is_empty() && self.things_not_done.is_empty()
    }
}

/// Packs both notes into one stored memo string.
pub fn encode(things_done: &str, things_not_done: &str) -> String {
    let mut memo = String::with_capacity(
        DONE_PREFIX.len() + things_done.len() + NOT_DONE_SEPARATOR.len() + things_not_done.len(),
    );
    memo.push_str(DONE_PREFIX);
    memo.push_str(things_done);
    memo.push_str(NOT_DONE_SEPARATOR);
    memo.push_str(things_not_done);
    memo
}

/// Unpacks a stored memo.
///
/// Rules, first match wins:
/// 1. exactly one current separator: strip the current done prefix;
/// 2. exactly one legacy separator: strip the legacy done prefix;
/// 3. otherwise the whole memo is `things_done`.
pub fn decode(memo: &str) -> MemoPayload {
    if memo.is_empty() {
        return MemoPayload::default();
    }

    if let Some(payload) = split_with(memo, NOT_DONE_SEPARATOR, DONE_PREFIX) {
        return payload;
    }
    if let Some(payload) = split_with(memo, LEGACY_NOT_DONE_SEPARATOR, LEGACY_DONE_PREFIX) {
        return payload;
    }

    MemoPayload::new(memo, "")
}

/// Same as [`decode`], treating an absent memo as empty.
pub fn decode_optional(memo: Option<&str>) -> MemoPayload {
    memo.map(decode).unwrap_or_default()
}

/// One-line title for list views.
///
/// Uses the decoded "things done" note, collapses whitespace and truncates
/// to 30 characters with a `...` suffix.
pub fn memo_title(memo: &str) -> String {
    if memo.is_empty() {
        return EMPTY_MEMO_TITLE.to_string();
    }

    let payload = decode(memo);
    let collapsed = WHITESPACE_RE.replace_all(&payload.things_done, " ");
    let mut title = collapsed.trim().chars().take(TITLE_MAX_CHARS).collect::<String>();
    if collapsed.trim().chars().count() > TITLE_MAX_CHARS {
        title.push_str("...");
    }
    title
}

fn split_with(memo: &str, separator: &str, done_prefix: &str) -> Option<MemoPayload> {
    let mut parts = memo.split(separator);
    let (Some(first), Some(second), None) = (parts.next(), parts.next(), parts.next()) else {
        return None;
    };

    let things_done = first.strip_prefix(done_prefix).unwrap_or(first);
    Some(MemoPayload::new(things_done, second))
}
