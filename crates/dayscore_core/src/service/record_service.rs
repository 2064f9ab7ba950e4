//! Record use-case service.
//!
//! # Responsibility
//! - Accept the two user-facing notes and persist them through the memo codec.
//! - Return read models with decoded notes and satisfaction metadata.
//! - Page record lists and import collaborator listings.
//!
//! # Invariants
//! - Every call is scoped to the `Session` user.
//! - Writes always store the current memo convention; reads always decode.
//! - Log events carry ids and outcomes only, never memo text.

use crate::model::listing::{Listing, Page};
use crate::model::memo::MemoPayload;
use crate::model::record::{Record, RecordDraft, RecordId};
use crate::model::satisfaction::SatisfactionLevel;
use crate::model::session::Session;
use crate::repo::record_repo::{RecordListQuery, RecordRepository, SaveOutcome};
use crate::repo::RepoError;
use chrono::NaiveDate;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const RECORDS_DEFAULT_PAGE_SIZE: u32 = 20;
pub const RECORDS_MAX_PAGE_SIZE: u32 = 100;

/// Service error for record use-cases.
#[derive(Debug)]
pub enum RecordServiceError {
    /// Record does not exist or belongs to another user.
    RecordNotFound(RecordId),
    /// Page numbers start at 1.
    InvalidPage(u32),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for RecordServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RecordNotFound(id) => write!(f, "record not found: {id}"),
            Self::InvalidPage(page) => write!(f, "invalid page number: {page}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent record state: {details}"),
        }
    }
}

impl Error for RecordServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for RecordServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::RecordNotFound(id) => Self::RecordNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Read model for record detail and list views.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordEntry {
    pub id: RecordId,
    pub date: NaiveDate,
    pub satisfaction_level: SatisfactionLevel,
    pub satisfaction_label: &'static str,
    pub satisfaction_emoji: &'static str,
    /// One-line list title derived from the memo.
    pub title: String,
    pub notes: MemoPayload,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<Record> for RecordEntry {
    fn from(record: Record) -> Self {
        Self {
            id: record.id,
            date: record.date,
            satisfaction_level: record.satisfaction_level,
            satisfaction_label: record.satisfaction_level.label(),
            satisfaction_emoji: record.satisfaction_level.emoji(),
            title: record.title(),
            notes: record.memo_payload(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Paging and date-range options for record lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordPageRequest {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// 1-based page number. Defaults to 1.
    pub page: Option<u32>,
    /// Defaults to 20 and clamps to `1..=100`.
    pub page_size: Option<u32>,
}

/// One record as carried by a collaborator listing.
///
/// Unknown fields (`satisfaction_display`, `user_email`, ...) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImportedRecord {
    pub date: NaiveDate,
    pub satisfaction_level: SatisfactionLevel,
    #[serde(default)]
    pub memo: Option<String>,
}

/// Counts produced by [`RecordService::import_listing`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub created: u32,
    pub updated: u32,
}

/// Use-case service wrapper for record CRUD operations.
pub struct RecordService<R: RecordRepository> {
    repo: R,
}

impl<R: RecordRepository> RecordService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Saves the session user's entry for `date`.
    ///
    /// # Contract
    /// - Notes are encoded with the current memo convention.
    /// - An existing entry for the same date is updated in place.
    pub fn save_entry(
        &self,
        session: &Session,
        date: NaiveDate,
        level: SatisfactionLevel,
        notes: &MemoPayload,
    ) -> Result<(RecordEntry, SaveOutcome), RecordServiceError> {
        let draft = RecordDraft::from_notes(date, level, notes);
        let (id, outcome) = self.repo.save_for_date(session.user_id(), &draft)?;
        info!(
            "event=record_save module=service status=ok outcome={} record_id={} user_id={}",
            outcome_name(outcome),
            id,
            session.user_id()
        );

        let entry = self.read_back(session, id, "saved record not found in read-back")?;
        Ok((entry, outcome))
    }

    /// Replaces date, level and notes of an existing entry.
    pub fn update_entry(
        &self,
        session: &Session,
        id: RecordId,
        date: NaiveDate,
        level: SatisfactionLevel,
        notes: &MemoPayload,
    ) -> Result<RecordEntry, RecordServiceError> {
        let draft = RecordDraft::from_notes(date, level, notes);
        self.repo.update_record(session.user_id(), id, &draft)?;
        info!(
            "event=record_update module=service status=ok record_id={} user_id={}",
            id,
            session.user_id()
        );

        self.read_back(session, id, "updated record not found in read-back")
    }

    /// Gets one entry owned by the session user.
    pub fn get_entry(
        &self,
        session: &Session,
        id: RecordId,
    ) -> Result<RecordEntry, RecordServiceError> {
        self.repo
            .get_record(session.user_id(), id)?
            .map(RecordEntry::from)
            .ok_or(RecordServiceError::RecordNotFound(id))
    }

    /// Lists one page of entries, newest date first.
    pub fn list_entries(
        &self,
        session: &Session,
        request: &RecordPageRequest,
    ) -> Result<Page<RecordEntry>, RecordServiceError> {
        let page = request.page.unwrap_or(1);
        if page == 0 {
            return Err(RecordServiceError::InvalidPage(page));
        }
        let page_size = normalize_page_size(request.page_size);
        let offset = (page - 1).saturating_mul(page_size);

        let query = RecordListQuery {
            start_date: request.start_date,
            end_date: request.end_date,
            limit: Some(page_size),
            offset,
        };
        let count = self.repo.count_records(session.user_id(), &query)?;
        let results: Vec<RecordEntry> = self
            .repo
            .list_records(session.user_id(), &query)?
            .into_iter()
            .map(RecordEntry::from)
            .collect();

        let seen = u64::from(offset) + results.len() as u64;
        let next = (seen < count).then(|| page_link(page + 1, page_size));
        let previous = (page > 1).then(|| page_link(page - 1, page_size));

        Ok(Page {
            count,
            next,
            previous,
            results,
        })
    }

    /// Deletes one entry owned by the session user.
    pub fn delete_entry(&self, session: &Session, id: RecordId) -> Result<(), RecordServiceError> {
        self.repo.delete_record(session.user_id(), id)?;
        info!(
            "event=record_delete module=service status=ok record_id={} user_id={}",
            id,
            session.user_id()
        );
        Ok(())
    }

    /// Stores every record of a collaborator listing for the session user.
    ///
    /// Memos are stored as received; an absent memo is stored empty. The
    /// import is all or nothing: any invalid item or write failure leaves
    /// the store untouched.
    pub fn import_listing(
        &self,
        session: &Session,
        listing: Listing<ImportedRecord>,
    ) -> Result<ImportSummary, RecordServiceError> {
        let drafts: Vec<RecordDraft> = listing
            .into_items()
            .into_iter()
            .map(|item| RecordDraft {
                date: item.date,
                satisfaction_level: item.satisfaction_level,
                memo: item.memo.unwrap_or_default(),
            })
            .collect();

        let outcomes = match self.repo.import_drafts(session.user_id(), &drafts) {
            Ok(outcomes) => outcomes,
            Err(err) => {
                warn!(
                    "event=record_import module=service status=error items={} user_id={} error={}",
                    drafts.len(),
                    session.user_id(),
                    err
                );
                return Err(err.into());
            }
        };

        let mut summary = ImportSummary::default();
        for outcome in outcomes {
            match outcome {
                SaveOutcome::Created => summary.created += 1,
                SaveOutcome::Updated => summary.updated += 1,
            }
        }

        info!(
            "event=record_import module=service status=ok created={} updated={} user_id={}",
            summary.created,
            summary.updated,
            session.user_id()
        );
        Ok(summary)
    }

    fn read_back(
        &self,
        session: &Session,
        id: RecordId,
        details: &'static str,
    ) -> Result<RecordEntry, RecordServiceError> {
        self.repo
            .get_record(session.user_id(), id)?
            .map(RecordEntry::from)
            .ok_or(RecordServiceError::InconsistentState(details))
    }
}

/// Applies the default and the `1..=100` clamp to a requested page size.
pub fn normalize_page_size(page_size: Option<u32>) -> u32 {
    page_size
        .unwrap_or(RECORDS_DEFAULT_PAGE_SIZE)
        .clamp(1, RECORDS_MAX_PAGE_SIZE)
}

fn page_link(page: u32, page_size: u32) -> String {
    format!("?page={page}&page_size={page_size}")
}

fn outcome_name(outcome: SaveOutcome) -> &'static str {
    match outcome {
        SaveOutcome::Created => "created",
        SaveOutcome::Updated => "updated",
    }
}
