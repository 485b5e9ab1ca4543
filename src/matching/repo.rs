use axum::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Pending,
    Accepted,
    Rejected,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Pending => "pending",
            MatchStatus::Accepted => "accepted",
            MatchStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(MatchStatus::Pending),
            "accepted" => Some(MatchStatus::Accepted),
            "rejected" => Some(MatchStatus::Rejected),
            _ => None,
        }
    }
}

/// A mentee-initiated match proposal. Resolved records (accepted/rejected)
/// are kept as history; pending ones are unique per mentee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: Uuid,
    pub mentee_email: String,
    pub mentor_email: String,
    pub status: MatchStatus,
    pub message: String,
    pub created_at: OffsetDateTime,
}

/// Store for match records. Implementations must make `create_pending` and
/// `resolve` atomic: of two concurrent `create_pending` calls for the same
/// mentee exactly one succeeds, and of two concurrent `resolve` calls on
/// the same record exactly one performs the transition.
#[async_trait]
pub trait MatchStore: Send + Sync {
    /// Fails `DuplicatePending` if the mentee already has a pending record.
    async fn create_pending(
        &self,
        mentee_email: &str,
        mentor_email: &str,
        message: &str,
    ) -> Result<MatchRecord, ApiError>;

    async fn has_pending(&self, mentee_email: &str) -> Result<bool, ApiError>;

    /// Transitions the pending record for `(mentee, mentor)` to the given
    /// terminal status. Fails `NotFound` if no record exists for the pair,
    /// `InvalidState` if one exists but is already resolved.
    async fn resolve(
        &self,
        mentee_email: &str,
        mentor_email: &str,
        status: MatchStatus,
    ) -> Result<MatchRecord, ApiError>;

    /// Deletes the mentee's pending record. Fails `NotFound` if there is
    /// none; resolved records are never deleted.
    async fn delete_pending(&self, mentee_email: &str) -> Result<(), ApiError>;

    async fn list_for_mentor(&self, mentor_email: &str) -> Result<Vec<MatchRecord>, ApiError>;
    async fn list_for_mentee(&self, mentee_email: &str) -> Result<Vec<MatchRecord>, ApiError>;
}

// ---- Postgres ----

#[derive(Debug, FromRow)]
struct MatchRow {
    id: Uuid,
    mentee_email: String,
    mentor_email: String,
    status: String,
    message: String,
    created_at: OffsetDateTime,
}

impl MatchRow {
    fn into_record(self) -> Result<MatchRecord, ApiError> {
        let status = MatchStatus::parse(&self.status)
            .ok_or_else(|| anyhow::anyhow!("unknown match status in store: {}", self.status))?;
        Ok(MatchRecord {
            id: self.id,
            mentee_email: self.mentee_email,
            mentor_email: self.mentor_email,
            status,
            message: self.message,
            created_at: self.created_at,
        })
    }
}

pub struct PgMatchStore {
    pool: PgPool,
}

impl PgMatchStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MatchStore for PgMatchStore {
    async fn create_pending(
        &self,
        mentee_email: &str,
        mentor_email: &str,
        message: &str,
    ) -> Result<MatchRecord, ApiError> {
        // The partial unique index on (mentee_email) WHERE status = 'pending'
        // makes the check-then-insert atomic; a losing concurrent caller
        // gets the unique violation mapped below.
        let res = sqlx::query_as::<_, MatchRow>(
            r#"
            INSERT INTO matches (id, mentee_email, mentor_email, status, message)
            VALUES ($1, $2, $3, 'pending', $4)
            RETURNING id, mentee_email, mentor_email, status, message, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(mentee_email)
        .bind(mentor_email)
        .bind(message)
        .fetch_one(&self.pool)
        .await;

        match res {
            Ok(row) => row.into_record(),
            Err(sqlx::Error::Database(e)) if e.code().as_deref() == Some("23505") => {
                Err(ApiError::DuplicatePending)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn has_pending(&self, mentee_email: &str) -> Result<bool, ApiError> {
        let row: Option<(Uuid,)> = sqlx::query_as(
            r#"SELECT id FROM matches WHERE mentee_email = $1 AND status = 'pending'"#,
        )
        .bind(mentee_email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }

    async fn resolve(
        &self,
        mentee_email: &str,
        mentor_email: &str,
        status: MatchStatus,
    ) -> Result<MatchRecord, ApiError> {
        // Conditional update: only one of two concurrent callers can see the
        // pending row, the other falls through to the status check below.
        let updated = sqlx::query_as::<_, MatchRow>(
            r#"
            UPDATE matches
            SET status = $3
            WHERE mentee_email = $1 AND mentor_email = $2 AND status = 'pending'
            RETURNING id, mentee_email, mentor_email, status, message, created_at
            "#,
        )
        .bind(mentee_email)
        .bind(mentor_email)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = updated {
            return row.into_record();
        }

        let existing: Option<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT id FROM matches
            WHERE mentee_email = $1 AND mentor_email = $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(mentee_email)
        .bind(mentor_email)
        .fetch_optional(&self.pool)
        .await?;

        match existing {
            Some(_) => Err(ApiError::InvalidState),
            None => Err(ApiError::NotFound(format!(
                "no match request from {mentee_email}"
            ))),
        }
    }

    async fn delete_pending(&self, mentee_email: &str) -> Result<(), ApiError> {
        let res =
            sqlx::query(r#"DELETE FROM matches WHERE mentee_email = $1 AND status = 'pending'"#)
                .bind(mentee_email)
                .execute(&self.pool)
                .await?;
        if res.rows_affected() == 0 {
            return Err(ApiError::NotFound("no pending match request".into()));
        }
        Ok(())
    }

    async fn list_for_mentor(&self, mentor_email: &str) -> Result<Vec<MatchRecord>, ApiError> {
        let rows = sqlx::query_as::<_, MatchRow>(
            r#"
            SELECT id, mentee_email, mentor_email, status, message, created_at
            FROM matches
            WHERE mentor_email = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(mentor_email)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(MatchRow::into_record).collect()
    }

    async fn list_for_mentee(&self, mentee_email: &str) -> Result<Vec<MatchRecord>, ApiError> {
        let rows = sqlx::query_as::<_, MatchRow>(
            r#"
            SELECT id, mentee_email, mentor_email, status, message, created_at
            FROM matches
            WHERE mentee_email = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(mentee_email)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(MatchRow::into_record).collect()
    }
}

// ---- In-memory (tests and local runs) ----

/// All operations take the write lock, which serializes check-then-mutate
/// sequences and gives the same atomicity as the Postgres constraints.
#[derive(Default)]
pub struct MemoryMatchStore {
    records: RwLock<Vec<MatchRecord>>,
}

#[async_trait]
impl MatchStore for MemoryMatchStore {
    async fn create_pending(
        &self,
        mentee_email: &str,
        mentor_email: &str,
        message: &str,
    ) -> Result<MatchRecord, ApiError> {
        let mut records = self.records.write();
        if records
            .iter()
            .any(|r| r.mentee_email == mentee_email && r.status == MatchStatus::Pending)
        {
            return Err(ApiError::DuplicatePending);
        }
        let record = MatchRecord {
            id: Uuid::new_v4(),
            mentee_email: mentee_email.to_string(),
            mentor_email: mentor_email.to_string(),
            status: MatchStatus::Pending,
            message: message.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        records.push(record.clone());
        Ok(record)
    }

    async fn has_pending(&self, mentee_email: &str) -> Result<bool, ApiError> {
        Ok(self
            .records
            .read()
            .iter()
            .any(|r| r.mentee_email == mentee_email && r.status == MatchStatus::Pending))
    }

    async fn resolve(
        &self,
        mentee_email: &str,
        mentor_email: &str,
        status: MatchStatus,
    ) -> Result<MatchRecord, ApiError> {
        let mut records = self.records.write();
        if let Some(record) = records.iter_mut().find(|r| {
            r.mentee_email == mentee_email
                && r.mentor_email == mentor_email
                && r.status == MatchStatus::Pending
        }) {
            record.status = status;
            return Ok(record.clone());
        }
        if records
            .iter()
            .any(|r| r.mentee_email == mentee_email && r.mentor_email == mentor_email)
        {
            Err(ApiError::InvalidState)
        } else {
            Err(ApiError::NotFound(format!(
                "no match request from {mentee_email}"
            )))
        }
    }

    async fn delete_pending(&self, mentee_email: &str) -> Result<(), ApiError> {
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|r| !(r.mentee_email == mentee_email && r.status == MatchStatus::Pending));
        if records.len() == before {
            return Err(ApiError::NotFound("no pending match request".into()));
        }
        Ok(())
    }

    async fn list_for_mentor(&self, mentor_email: &str) -> Result<Vec<MatchRecord>, ApiError> {
        Ok(self
            .records
            .read()
            .iter()
            .filter(|r| r.mentor_email == mentor_email)
            .cloned()
            .collect())
    }

    async fn list_for_mentee(&self, mentee_email: &str) -> Result<Vec<MatchRecord>, ApiError> {
        Ok(self
            .records
            .read()
            .iter()
            .filter(|r| r.mentee_email == mentee_email)
            .cloned()
            .collect())
    }
}
