//! Database operations for the `source_analyses` table.
//!
//! The table is owned by the analysis-generation workflow; consolidation only
//! reads it. [`insert_source_analysis`] exists for imports and test fixtures.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use uppi_core::SourceAnalysis;

use crate::DbError;

/// A row from the `source_analyses` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SourceAnalysisRow {
    pub id: Uuid,
    pub company_name: String,
    pub website_url: Option<String>,
    pub industry: Option<String>,
    pub employee_count: Option<i64>,
    pub revenue_estimate: Option<i64>,
    pub headquarters: Option<String>,
    pub founded_year: Option<i16>,
    pub description: Option<String>,
    pub analysis_payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl From<SourceAnalysisRow> for SourceAnalysis {
    fn from(row: SourceAnalysisRow) -> Self {
        Self {
            id: row.id,
            company_name: row.company_name,
            website_url: row.website_url,
            industry: row.industry,
            employee_count: row.employee_count,
            revenue_estimate: row.revenue_estimate,
            headquarters: row.headquarters,
            founded_year: row.founded_year,
            description: row.description,
            analysis_payload: row.analysis_payload,
            created_at: row.created_at,
        }
    }
}

/// Get a source analysis by id.
///
/// # Errors
///
/// Returns [`DbError`] on database query failure.
pub async fn get_source_analysis(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<SourceAnalysis>, DbError> {
    let row = sqlx::query_as::<_, SourceAnalysisRow>(
        "SELECT id, company_name, website_url, industry, employee_count, revenue_estimate, \
                headquarters, founded_year, description, analysis_payload, created_at \
         FROM source_analyses WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(SourceAnalysis::from))
}

/// Insert a source analysis, keeping the caller-supplied id and timestamp.
///
/// # Errors
///
/// Returns [`DbError`] on database query failure, including a duplicate id.
pub async fn insert_source_analysis(
    pool: &PgPool,
    analysis: &SourceAnalysis,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO source_analyses \
           (id, company_name, website_url, industry, employee_count, revenue_estimate, \
            headquarters, founded_year, description, analysis_payload, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
    )
    .bind(analysis.id)
    .bind(&analysis.company_name)
    .bind(analysis.website_url.as_deref())
    .bind(analysis.industry.as_deref())
    .bind(analysis.employee_count)
    .bind(analysis.revenue_estimate)
    .bind(analysis.headquarters.as_deref())
    .bind(analysis.founded_year)
    .bind(analysis.description.as_deref())
    .bind(&analysis.analysis_payload)
    .bind(analysis.created_at)
    .execute(pool)
    .await?;
    Ok(())
}
