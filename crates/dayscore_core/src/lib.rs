//! Core domain logic for Dayscore, a daily satisfaction journal.
//! This crate is the single source of truth for memo encoding and the
//! satisfaction scale.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use logging::{init_logging, logging_status, LogLevel, LogTarget, LoggingError};
pub use model::listing::{Listing, Page};
pub use model::memo::{decode, decode_optional, encode, memo_title, MemoPayload};
pub use model::record::{Record, RecordDraft, RecordId, RecordValidationError};
pub use model::satisfaction::{
    average_of, emoji_for, format_average, image_bucket_for, image_path_for, label_for,
    LevelOutOfRange, SatisfactionLevel, UNKNOWN_EMOJI, UNKNOWN_LABEL,
};
pub use model::session::Session;
pub use model::user::{NewUser, User, UserId, UserValidationError};
pub use repo::record_repo::{RecordListQuery, RecordRepository, SaveOutcome, SqliteRecordRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{RepoError, RepoResult};
pub use service::record_service::{
    ImportSummary, ImportedRecord, RecordEntry, RecordPageRequest, RecordService,
    RecordServiceError,
};
pub use service::stats_service::{HomeStats, RankingEntry, StatsService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
