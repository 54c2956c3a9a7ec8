//! Database operations for the `master_company_profiles` table.
//!
//! Profile writes are conditional: creation loses to an existing normalized
//! name, updates lose to a newer `version`. Either way the caller gets
//! [`WriteOutcome::Conflict`] and nothing is written. Each successful write
//! appends its merge log in the same transaction.

use chrono::{DateTime, Utc};
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use uppi_core::{
    profile::Document, DocumentField, MasterCompanyProfile, NewMasterProfile, NewMergeLog,
    ProfileDelta, ProfileDocuments, ScoreUpdate, ValidationStatus, WriteOutcome,
};

use crate::{merge_logs::insert_merge_log, DbError};

const PROFILE_COLUMNS: &str = "id, company_name, normalized_name, website_url, primary_domain, \
     industry, headquarters, founded_year, employee_count, revenue_estimate, description, \
     overall_confidence_score, data_completeness_score, validation_status, data_sources, \
     official_data, financial_data, technology_stack, market_position, personnel, \
     last_validation_date, version, created_at, updated_at";

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `master_company_profiles` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MasterProfileRow {
    pub id: Uuid,
    pub company_name: String,
    pub normalized_name: String,
    pub website_url: Option<String>,
    pub primary_domain: Option<String>,
    pub industry: Option<String>,
    pub headquarters: Option<String>,
    pub founded_year: Option<i16>,
    pub employee_count: Option<i64>,
    pub revenue_estimate: Option<i64>,
    pub description: Option<String>,
    pub overall_confidence_score: f64,
    pub data_completeness_score: f64,
    pub validation_status: String,
    pub data_sources: Vec<Uuid>,
    pub official_data: Json<Document>,
    pub financial_data: Json<Document>,
    pub technology_stack: Json<Document>,
    pub market_position: Json<Document>,
    pub personnel: Json<Document>,
    pub last_validation_date: Option<DateTime<Utc>>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<MasterProfileRow> for MasterCompanyProfile {
    type Error = DbError;

    fn try_from(row: MasterProfileRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            company_name: row.company_name,
            normalized_name: row.normalized_name,
            website_url: row.website_url,
            primary_domain: row.primary_domain,
            industry: row.industry,
            headquarters: row.headquarters,
            founded_year: row.founded_year,
            employee_count: row.employee_count,
            revenue_estimate: row.revenue_estimate,
            description: row.description,
            overall_confidence_score: row.overall_confidence_score,
            data_completeness_score: row.data_completeness_score,
            validation_status: row.validation_status.parse()?,
            data_sources: row.data_sources,
            documents: ProfileDocuments {
                official_data: row.official_data.0,
                financial_data: row.financial_data.0,
                technology_stack: row.technology_stack.0,
                market_position: row.market_position.0,
                personnel: row.personnel.0,
            },
            last_validation_date: row.last_validation_date,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_profiles(rows: Vec<MasterProfileRow>) -> Result<Vec<MasterCompanyProfile>, DbError> {
    rows.into_iter().map(MasterCompanyProfile::try_from).collect()
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Get a profile by id.
///
/// # Errors
///
/// Returns [`DbError`] on database query failure or an undecodable row.
pub async fn get_master_profile(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<MasterCompanyProfile>, DbError> {
    let row = sqlx::query_as::<_, MasterProfileRow>(&format!(
        "SELECT {PROFILE_COLUMNS} FROM master_company_profiles WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(MasterCompanyProfile::try_from).transpose()
}

/// Profiles matching a normalized name exactly, oldest first.
///
/// # Errors
///
/// Returns [`DbError`] on database query failure or an undecodable row.
pub async fn find_master_profiles_by_normalized_name(
    pool: &PgPool,
    normalized_name: &str,
) -> Result<Vec<MasterCompanyProfile>, DbError> {
    let rows = sqlx::query_as::<_, MasterProfileRow>(&format!(
        "SELECT {PROFILE_COLUMNS} FROM master_company_profiles \
         WHERE normalized_name = $1 \
         ORDER BY created_at, id"
    ))
    .bind(normalized_name)
    .fetch_all(pool)
    .await?;

    into_profiles(rows)
}

/// Most recently updated profiles, newest first.
///
/// # Errors
///
/// Returns [`DbError`] on database query failure or an undecodable row.
pub async fn list_master_profiles(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<MasterCompanyProfile>, DbError> {
    let rows = sqlx::query_as::<_, MasterProfileRow>(&format!(
        "SELECT {PROFILE_COLUMNS} FROM master_company_profiles \
         ORDER BY updated_at DESC, id \
         LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    into_profiles(rows)
}

/// Insert a new profile and its merge log in one transaction.
///
/// Returns [`WriteOutcome::Conflict`] without writing anything when the
/// normalized name is already taken.
///
/// # Errors
///
/// Returns [`DbError`] on database query failure.
pub async fn insert_master_profile(
    pool: &PgPool,
    profile: &NewMasterProfile,
    log: &NewMergeLog,
) -> Result<WriteOutcome, DbError> {
    let mut tx = pool.begin().await?;

    let docs = &profile.documents;
    let row = sqlx::query_as::<_, MasterProfileRow>(&format!(
        "INSERT INTO master_company_profiles \
           (id, company_name, normalized_name, website_url, primary_domain, industry, \
            headquarters, founded_year, employee_count, revenue_estimate, description, \
            overall_confidence_score, data_completeness_score, validation_status, data_sources, \
            official_data, financial_data, technology_stack, market_position, personnel) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, \
                 $16, $17, $18, $19, $20) \
         ON CONFLICT (normalized_name) DO NOTHING \
         RETURNING {PROFILE_COLUMNS}"
    ))
    .bind(profile.id)
    .bind(&profile.company_name)
    .bind(&profile.normalized_name)
    .bind(profile.website_url.as_deref())
    .bind(profile.primary_domain.as_deref())
    .bind(profile.industry.as_deref())
    .bind(profile.headquarters.as_deref())
    .bind(profile.founded_year)
    .bind(profile.employee_count)
    .bind(profile.revenue_estimate)
    .bind(profile.description.as_deref())
    .bind(profile.overall_confidence_score)
    .bind(profile.data_completeness_score)
    .bind(profile.validation_status.as_str())
    .bind(&profile.data_sources)
    .bind(Json(&docs.official_data))
    .bind(Json(&docs.financial_data))
    .bind(Json(&docs.technology_stack))
    .bind(Json(&docs.market_position))
    .bind(Json(&docs.personnel))
    .fetch_optional(&mut *tx)
    .await?;

    let Some(row) = row else {
        tx.rollback().await?;
        return Ok(WriteOutcome::Conflict);
    };

    insert_merge_log(&mut tx, log).await?;
    tx.commit().await?;

    Ok(WriteOutcome::Written(row.try_into()?))
}

/// Apply a delta and append its merge log in one transaction, provided the
/// stored version still equals `expected_version`.
///
/// Absent delta fields keep their stored value (`COALESCE`). The version is
/// bumped on every successful call, including empty deltas.
///
/// # Errors
///
/// Returns [`DbError`] on database query failure.
pub async fn update_master_profile(
    pool: &PgPool,
    profile_id: Uuid,
    expected_version: i32,
    delta: &ProfileDelta,
    log: &NewMergeLog,
) -> Result<WriteOutcome, DbError> {
    let doc = |field: DocumentField| delta.documents.get(&field).map(Json);

    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, MasterProfileRow>(&format!(
        "UPDATE master_company_profiles SET \
           website_url      = COALESCE($3, website_url), \
           primary_domain   = COALESCE($4, primary_domain), \
           industry         = COALESCE($5, industry), \
           headquarters     = COALESCE($6, headquarters), \
           founded_year     = COALESCE($7, founded_year), \
           employee_count   = COALESCE($8, employee_count), \
           revenue_estimate = COALESCE($9, revenue_estimate), \
           description      = COALESCE($10, description), \
           official_data    = COALESCE($11, official_data), \
           financial_data   = COALESCE($12, financial_data), \
           technology_stack = COALESCE($13, technology_stack), \
           market_position  = COALESCE($14, market_position), \
           personnel        = COALESCE($15, personnel), \
           data_sources     = COALESCE($16, data_sources), \
           version          = version + 1, \
           updated_at       = NOW() \
         WHERE id = $1 AND version = $2 \
         RETURNING {PROFILE_COLUMNS}"
    ))
    .bind(profile_id)
    .bind(expected_version)
    .bind(delta.website_url.as_deref())
    .bind(delta.primary_domain.as_deref())
    .bind(delta.industry.as_deref())
    .bind(delta.headquarters.as_deref())
    .bind(delta.founded_year)
    .bind(delta.employee_count)
    .bind(delta.revenue_estimate)
    .bind(delta.description.as_deref())
    .bind(doc(DocumentField::OfficialData))
    .bind(doc(DocumentField::FinancialData))
    .bind(doc(DocumentField::TechnologyStack))
    .bind(doc(DocumentField::MarketPosition))
    .bind(doc(DocumentField::Personnel))
    .bind(delta.data_sources.as_deref())
    .fetch_optional(&mut *tx)
    .await?;

    let Some(row) = row else {
        tx.rollback().await?;
        return Ok(WriteOutcome::Conflict);
    };

    insert_merge_log(&mut tx, log).await?;
    tx.commit().await?;

    Ok(WriteOutcome::Written(row.try_into()?))
}

/// Set the validation status of a profile.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the profile does not exist, or
/// [`DbError::Sqlx`] on query failure.
pub async fn update_master_profile_validation_status(
    pool: &PgPool,
    profile_id: Uuid,
    status: ValidationStatus,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE master_company_profiles \
         SET validation_status = $2, updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(profile_id)
    .bind(status.as_str())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Write both aggregate scores and the validation date in one statement.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the profile does not exist, or
/// [`DbError::Sqlx`] on query failure (including out-of-range scores).
pub async fn update_master_profile_scores(
    pool: &PgPool,
    profile_id: Uuid,
    scores: ScoreUpdate,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE master_company_profiles SET \
           overall_confidence_score = $2, \
           data_completeness_score  = $3, \
           last_validation_date     = $4, \
           updated_at               = NOW() \
         WHERE id = $1",
    )
    .bind(profile_id)
    .bind(scores.overall_confidence_score)
    .bind(scores.data_completeness_score)
    .bind(scores.last_validation_date)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
