//! Database operations for the append-only `profile_merge_logs` table.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use uppi_core::{MergeLogEntry, NewMergeLog};

use crate::DbError;

/// A row from the `profile_merge_logs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MergeLogRow {
    pub id: Uuid,
    pub master_profile_id: Uuid,
    pub source_analysis_id: Uuid,
    pub merge_type: String,
    pub fields_updated: Vec<String>,
    pub triggered_by: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<MergeLogRow> for MergeLogEntry {
    type Error = DbError;

    fn try_from(row: MergeLogRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            master_profile_id: row.master_profile_id,
            source_analysis_id: row.source_analysis_id,
            merge_type: row.merge_type.parse()?,
            fields_updated: row.fields_updated,
            triggered_by: row.triggered_by,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}

/// Append one merge log entry on an open connection or transaction.
pub(crate) async fn insert_merge_log(
    conn: &mut PgConnection,
    log: &NewMergeLog,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO profile_merge_logs \
           (master_profile_id, source_analysis_id, merge_type, fields_updated, triggered_by, notes) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(log.master_profile_id)
    .bind(log.source_analysis_id)
    .bind(log.merge_type.as_str())
    .bind(&log.fields_updated)
    .bind(&log.triggered_by)
    .bind(log.notes.as_deref())
    .execute(conn)
    .await?;
    Ok(())
}

/// All merge log entries for a profile, oldest first.
///
/// # Errors
///
/// Returns [`DbError`] on database query failure or an undecodable row.
pub async fn list_merge_logs(
    pool: &PgPool,
    profile_id: Uuid,
) -> Result<Vec<MergeLogEntry>, DbError> {
    let rows = sqlx::query_as::<_, MergeLogRow>(
        "SELECT id, master_profile_id, source_analysis_id, merge_type, fields_updated, \
                triggered_by, notes, created_at \
         FROM profile_merge_logs \
         WHERE master_profile_id = $1 \
         ORDER BY created_at, id",
    )
    .bind(profile_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(MergeLogEntry::try_from).collect()
}
