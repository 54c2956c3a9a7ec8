//! Database operations for the append-only `profile_validation_records` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use uppi_core::{NewValidationRecord, ValidationRecord};

use crate::DbError;

/// A row from the `profile_validation_records` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ValidationRecordRow {
    pub id: Uuid,
    pub master_profile_id: Uuid,
    pub field_name: String,
    pub original_value: Option<String>,
    pub validated_value: Option<String>,
    pub validation_method: String,
    pub is_valid: bool,
    pub confidence_score: f64,
    pub discrepancy_reason: Option<String>,
    pub validated_at: DateTime<Utc>,
}

impl TryFrom<ValidationRecordRow> for ValidationRecord {
    type Error = DbError;

    fn try_from(row: ValidationRecordRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            master_profile_id: row.master_profile_id,
            field_name: row.field_name,
            original_value: row.original_value,
            validated_value: row.validated_value,
            validation_method: row.validation_method.parse()?,
            is_valid: row.is_valid,
            confidence_score: row.confidence_score,
            discrepancy_reason: row.discrepancy_reason,
            validated_at: row.validated_at,
        })
    }
}

/// Append a batch of validation records in one transaction.
///
/// # Errors
///
/// Returns [`DbError`] on database query failure; no record of the batch is
/// kept in that case.
pub async fn insert_validation_records(
    pool: &PgPool,
    records: &[NewValidationRecord],
) -> Result<(), DbError> {
    let mut tx = pool.begin().await?;

    for record in records {
        sqlx::query(
            "INSERT INTO profile_validation_records \
               (master_profile_id, field_name, original_value, validated_value, \
                validation_method, is_valid, confidence_score, discrepancy_reason) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(record.master_profile_id)
        .bind(&record.field_name)
        .bind(record.original_value.as_deref())
        .bind(record.validated_value.as_deref())
        .bind(record.validation_method.as_str())
        .bind(record.is_valid)
        .bind(record.confidence_score)
        .bind(record.discrepancy_reason.as_deref())
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// All validation records for a profile, oldest first.
///
/// # Errors
///
/// Returns [`DbError`] on database query failure or an undecodable row.
pub async fn list_validation_records(
    pool: &PgPool,
    profile_id: Uuid,
) -> Result<Vec<ValidationRecord>, DbError> {
    let rows = sqlx::query_as::<_, ValidationRecordRow>(
        "SELECT id, master_profile_id, field_name, original_value, validated_value, \
                validation_method, is_valid, confidence_score, discrepancy_reason, validated_at \
         FROM profile_validation_records \
         WHERE master_profile_id = $1 \
         ORDER BY validated_at, id",
    )
    .bind(profile_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(ValidationRecord::try_from).collect()
}
