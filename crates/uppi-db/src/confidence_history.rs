//! Database operations for the append-only `profile_confidence_history` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use uppi_core::{ConfidenceHistoryEntry, NewConfidenceHistoryEntry};

use crate::DbError;

/// A row from the `profile_confidence_history` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ConfidenceHistoryRow {
    pub id: Uuid,
    pub master_profile_id: Uuid,
    pub field_name: String,
    pub confidence_score: f64,
    pub event_type: String,
    pub contributing_sources: Vec<Uuid>,
    pub recorded_at: DateTime<Utc>,
}

impl From<ConfidenceHistoryRow> for ConfidenceHistoryEntry {
    fn from(row: ConfidenceHistoryRow) -> Self {
        Self {
            id: row.id,
            master_profile_id: row.master_profile_id,
            field_name: row.field_name,
            confidence_score: row.confidence_score,
            event_type: row.event_type,
            contributing_sources: row.contributing_sources,
            recorded_at: row.recorded_at,
        }
    }
}

/// Append a batch of confidence snapshots in one transaction.
///
/// # Errors
///
/// Returns [`DbError`] on database query failure.
pub async fn insert_confidence_history(
    pool: &PgPool,
    entries: &[NewConfidenceHistoryEntry],
) -> Result<(), DbError> {
    let mut tx = pool.begin().await?;

    for entry in entries {
        sqlx::query(
            "INSERT INTO profile_confidence_history \
               (master_profile_id, field_name, confidence_score, event_type, contributing_sources) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(entry.master_profile_id)
        .bind(&entry.field_name)
        .bind(entry.confidence_score)
        .bind(&entry.event_type)
        .bind(&entry.contributing_sources)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Confidence history for a profile, oldest first.
///
/// # Errors
///
/// Returns [`DbError`] on database query failure.
pub async fn list_confidence_history(
    pool: &PgPool,
    profile_id: Uuid,
) -> Result<Vec<ConfidenceHistoryEntry>, DbError> {
    let rows = sqlx::query_as::<_, ConfidenceHistoryRow>(
        "SELECT id, master_profile_id, field_name, confidence_score, event_type, \
                contributing_sources, recorded_at \
         FROM profile_confidence_history \
         WHERE master_profile_id = $1 \
         ORDER BY recorded_at, id",
    )
    .bind(profile_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(ConfidenceHistoryEntry::from).collect())
}
