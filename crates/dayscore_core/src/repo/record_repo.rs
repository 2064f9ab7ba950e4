//! Record repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide user-scoped CRUD over the `records` table.
//! - Provide the aggregate reads behind home stats and ranking.
//!
//! # Invariants
//! - Every query filters by the owning `user_id`; a record owned by someone
//!   else reads as missing.
//! - `save_for_date` keeps one record per `(user_id, date)` by updating the
//!   existing row instead of inserting a second one.
//! - Writes that look up a date before writing run under an immediate
//!   transaction, so concurrent savers of one date serialize.
//! - Read paths reject corrupt persisted levels/dates instead of masking them.
//! - Lists are ordered by `date DESC, created_at DESC, id DESC`.

use crate::model::record::{Record, RecordDraft, RecordId};
use crate::model::satisfaction::SatisfactionLevel;
use crate::model::user::UserId;
use crate::repo::{constraint_code, date_to_db, parse_db_date, RepoError, RepoResult};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{
    ffi, params, params_from_iter, Connection, OptionalExtension, Row, Transaction,
    TransactionBehavior,
};

const RECORD_SELECT_SQL: &str = "SELECT
    id,
    user_id,
    date,
    satisfaction_level,
    memo,
    created_at,
    updated_at
FROM records";

/// Whether `save_for_date` inserted a row or updated an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Created,
    Updated,
}

/// Query options for listing one user's records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordListQuery {
    /// Inclusive lower date bound.
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper date bound.
    pub end_date: Option<NaiveDate>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Date and level of one stored record, for stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordDay {
    pub date: NaiveDate,
    pub satisfaction_level: SatisfactionLevel,
}

/// Per-user aggregate over all records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserTotals {
    pub user_id: UserId,
    pub username: String,
    pub email: String,
    pub total_points: u64,
    pub record_count: u64,
}

/// Repository interface for record CRUD and aggregate reads.
pub trait RecordRepository {
    /// Creates the user's record for `draft.date`, or updates it when one
    /// already exists.
    fn save_for_date(
        &self,
        user_id: UserId,
        draft: &RecordDraft,
    ) -> RepoResult<(RecordId, SaveOutcome)>;
    /// Saves every draft like `save_for_date`, all or nothing: drafts are
    /// validated before the first write and one failure rolls back the batch.
    fn import_drafts(
        &self,
        user_id: UserId,
        drafts: &[RecordDraft],
    ) -> RepoResult<Vec<SaveOutcome>>;
    /// Fully replaces date, level and memo of an owned record.
    fn update_record(&self, user_id: UserId, id: RecordId, draft: &RecordDraft) -> RepoResult<()>;
    fn get_record(&self, user_id: UserId, id: RecordId) -> RepoResult<Option<Record>>;
    fn list_records(&self, user_id: UserId, query: &RecordListQuery) -> RepoResult<Vec<Record>>;
    /// Counts rows matching the query's date bounds, ignoring pagination.
    fn count_records(&self, user_id: UserId, query: &RecordListQuery) -> RepoResult<u64>;
    fn delete_record(&self, user_id: UserId, id: RecordId) -> RepoResult<()>;
    /// All record days of one user, newest first.
    fn record_days(&self, user_id: UserId) -> RepoResult<Vec<RecordDay>>;
    /// Totals for every user with at least one record.
    fn user_totals(&self) -> RepoResult<Vec<UserTotals>>;
}

/// SQLite-backed record repository.
pub struct SqliteRecordRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRecordRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Begins a transaction that holds the database write lock from the start.
    fn write_transaction(&self) -> RepoResult<Transaction<'conn>> {
        Ok(Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?)
    }

    /// Inserts or updates the `(user_id, draft.date)` row. Callers validate
    /// the draft and hold a write transaction.
    fn upsert_for_date(
        &self,
        user_id: UserId,
        draft: &RecordDraft,
    ) -> RepoResult<(RecordId, SaveOutcome)> {
        if let Some(id) = self.find_id_for_date(user_id, draft.date)? {
            self.conn.execute(
                "UPDATE records
                 SET
                    satisfaction_level = ?1,
                    memo = ?2,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?3;",
                params![
                    i64::from(draft.satisfaction_level),
                    draft.memo.as_str(),
                    id
                ],
            )?;
            return Ok((id, SaveOutcome::Updated));
        }

        let inserted = self.conn.execute(
            "INSERT INTO records (user_id, date, satisfaction_level, memo)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                user_id,
                date_to_db(draft.date),
                i64::from(draft.satisfaction_level),
                draft.memo.as_str(),
            ],
        );
        match inserted {
            Ok(_) => Ok((self.conn.last_insert_rowid(), SaveOutcome::Created)),
            Err(err) if constraint_code(&err) == Some(ffi::SQLITE_CONSTRAINT_FOREIGNKEY) => {
                Err(RepoError::UserNotFound(user_id))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn find_id_for_date(&self, user_id: UserId, date: NaiveDate) -> RepoResult<Option<RecordId>> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM records WHERE user_id = ?1 AND date = ?2;",
                params![user_id, date_to_db(date)],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }
}

impl RecordRepository for SqliteRecordRepository<'_> {
    fn save_for_date(
        &self,
        user_id: UserId,
        draft: &RecordDraft,
    ) -> RepoResult<(RecordId, SaveOutcome)> {
        draft.validate()?;

        let tx = self.write_transaction()?;
        let saved = self.upsert_for_date(user_id, draft)?;
        tx.commit()?;

        Ok(saved)
    }

    fn import_drafts(
        &self,
        user_id: UserId,
        drafts: &[RecordDraft],
    ) -> RepoResult<Vec<SaveOutcome>> {
        for draft in drafts {
            draft.validate()?;
        }

        let tx = self.write_transaction()?;
        let mut outcomes = Vec::with_capacity(drafts.len());
        for draft in drafts {
            outcomes.push(self.upsert_for_date(user_id, draft)?.1);
        }
        tx.commit()?;

        Ok(outcomes)
    }

    fn update_record(&self, user_id: UserId, id: RecordId, draft: &RecordDraft) -> RepoResult<()> {
        draft.validate()?;

        let updated = self.conn.execute(
            "UPDATE records
             SET
                date = ?1,
                satisfaction_level = ?2,
                memo = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?4 AND user_id = ?5;",
            params![
                date_to_db(draft.date),
                i64::from(draft.satisfaction_level),
                draft.memo.as_str(),
                id,
                user_id,
            ],
        );

        let changed = match updated {
            Ok(changed) => changed,
            Err(err) if constraint_code(&err) == Some(ffi::SQLITE_CONSTRAINT_UNIQUE) => {
                return Err(RepoError::DateTaken(draft.date));
            }
            Err(err) => return Err(err.into()),
        };

        if changed == 0 {
            return Err(RepoError::RecordNotFound(id));
        }
        Ok(())
    }

    fn get_record(&self, user_id: UserId, id: RecordId) -> RepoResult<Option<Record>> {
        let mut stmt = self.conn.prepare(&format!(
            "{RECORD_SELECT_SQL}
             WHERE id = ?1 AND user_id = ?2;"
        ))?;

        let mut rows = stmt.query(params![id, user_id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_record_row(row)?));
        }

        Ok(None)
    }

    fn list_records(&self, user_id: UserId, query: &RecordListQuery) -> RepoResult<Vec<Record>> {
        let (mut sql, mut bind_values) = filtered_sql(RECORD_SELECT_SQL, user_id, query);
        sql.push_str(" ORDER BY date DESC, created_at DESC, id DESC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut records = Vec::new();

        while let Some(row) = rows.next()? {
            records.push(parse_record_row(row)?);
        }

        Ok(records)
    }

    fn count_records(&self, user_id: UserId, query: &RecordListQuery) -> RepoResult<u64> {
        let (sql, bind_values) = filtered_sql("SELECT COUNT(*) FROM records", user_id, query);
        let count: i64 = self
            .conn
            .query_row(&sql, params_from_iter(bind_values), |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative record count `{count}`")))
    }

    fn delete_record(&self, user_id: UserId, id: RecordId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM records WHERE id = ?1 AND user_id = ?2;",
            params![id, user_id],
        )?;

        if changed == 0 {
            return Err(RepoError::RecordNotFound(id));
        }

        Ok(())
    }

    fn record_days(&self, user_id: UserId) -> RepoResult<Vec<RecordDay>> {
        let mut stmt = self.conn.prepare(
            "SELECT date, satisfaction_level
             FROM records
             WHERE user_id = ?1
             ORDER BY date DESC;",
        )?;
        let mut rows = stmt.query([user_id])?;
        let mut days = Vec::new();

        while let Some(row) = rows.next()? {
            let date_text: String = row.get("date")?;
            days.push(RecordDay {
                date: parse_db_date(&date_text, "records.date")?,
                satisfaction_level: parse_level(row.get("satisfaction_level")?)?,
            });
        }

        Ok(days)
    }

    fn user_totals(&self) -> RepoResult<Vec<UserTotals>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                u.id AS user_id,
                u.username AS username,
                u.email AS email,
                SUM(r.satisfaction_level) AS total_points,
                COUNT(r.id) AS record_count
             FROM users u
             JOIN records r ON r.user_id = u.id
             GROUP BY u.id
             ORDER BY u.id ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut totals = Vec::new();

        while let Some(row) = rows.next()? {
            let total_points: i64 = row.get("total_points")?;
            let record_count: i64 = row.get("record_count")?;
            totals.push(UserTotals {
                user_id: row.get("user_id")?,
                username: row.get("username")?,
                email: row.get("email")?,
                total_points: non_negative(total_points, "total_points")?,
                record_count: non_negative(record_count, "record_count")?,
            });
        }

        Ok(totals)
    }
}

fn filtered_sql(select: &str, user_id: UserId, query: &RecordListQuery) -> (String, Vec<Value>) {
    let mut sql = format!("{select} WHERE user_id = ?");
    let mut bind_values = vec![Value::Integer(user_id)];

    if let Some(start) = query.start_date {
        sql.push_str(" AND date >= ?");
        bind_values.push(Value::Text(date_to_db(start)));
    }
    if let Some(end) = query.end_date {
        sql.push_str(" AND date <= ?");
        bind_values.push(Value::Text(date_to_db(end)));
    }

    (sql, bind_values)
}

fn parse_record_row(row: &Row<'_>) -> RepoResult<Record> {
    let date_text: String = row.get("date")?;

    Ok(Record {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        date: parse_db_date(&date_text, "records.date")?,
        satisfaction_level: parse_level(row.get("satisfaction_level")?)?,
        memo: row.get("memo")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_level(value: i64) -> RepoResult<SatisfactionLevel> {
    SatisfactionLevel::try_from(value).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid satisfaction level `{value}` in records.satisfaction_level"
        ))
    })
}

fn non_negative(value: i64, column: &str) -> RepoResult<u64> {
    u64::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("negative aggregate `{value}` in {column}")))
}
