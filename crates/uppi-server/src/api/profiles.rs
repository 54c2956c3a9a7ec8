use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uppi_consolidator::ConsolidationError;
use uppi_core::{
    ConfidenceHistoryEntry, MasterCompanyProfile, MergeLogEntry, NewValidationRecord,
    ValidationRecord, ValidationStatus,
};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct ProfilesQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct RevalidationData {
    profile: MasterCompanyProfile,
    validation_status: ValidationStatus,
    overall_confidence_score: f64,
    data_completeness_score: f64,
    records: Vec<NewValidationRecord>,
}

fn parse_profile_id(request_id: &str, raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| {
        ApiError::new(
            request_id,
            "bad_request",
            format!("'{raw}' is not a valid profile id"),
        )
    })
}

fn profile_not_found(request_id: &str, id: Uuid) -> ApiError {
    ApiError::new(request_id, "not_found", format!("profile {id} not found"))
}

/// Resolve the path segment to an existing profile.
async fn existing_profile(
    state: &AppState,
    request_id: &str,
    raw_id: &str,
) -> Result<MasterCompanyProfile, ApiError> {
    let id = parse_profile_id(request_id, raw_id)?;
    uppi_db::get_master_profile(&state.pool, id)
        .await
        .map_err(|e| map_db_error(request_id.to_string(), &e))?
        .ok_or_else(|| profile_not_found(request_id, id))
}

pub(super) async fn list_profiles(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ProfilesQuery>,
) -> Result<Json<ApiResponse<Vec<MasterCompanyProfile>>>, ApiError> {
    let profiles = uppi_db::list_master_profiles(&state.pool, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(profiles, req_id.0)))
}

pub(super) async fn get_profile(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MasterCompanyProfile>>, ApiError> {
    let profile = existing_profile(&state, &req_id.0, &id).await?;
    Ok(Json(ApiResponse::new(profile, req_id.0)))
}

pub(super) async fn list_merge_logs(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<MergeLogEntry>>>, ApiError> {
    let profile = existing_profile(&state, &req_id.0, &id).await?;
    let logs = uppi_db::list_merge_logs(&state.pool, profile.id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(logs, req_id.0)))
}

pub(super) async fn list_validation_records(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<ValidationRecord>>>, ApiError> {
    let profile = existing_profile(&state, &req_id.0, &id).await?;
    let records = uppi_db::list_validation_records(&state.pool, profile.id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(records, req_id.0)))
}

pub(super) async fn list_confidence_history(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<ConfidenceHistoryEntry>>>, ApiError> {
    let profile = existing_profile(&state, &req_id.0, &id).await?;
    let entries = uppi_db::list_confidence_history(&state.pool, profile.id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(entries, req_id.0)))
}

pub(super) async fn revalidate_profile(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<RevalidationData>>, ApiError> {
    let id = parse_profile_id(&req_id.0, &id)?;

    let outcome = state
        .consolidator
        .revalidate(id)
        .await
        .map_err(|err| match err {
            ConsolidationError::ProfileNotFound(id) => profile_not_found(&req_id.0, id),
            other => {
                tracing::error!(profile_id = %id, error = %other, "revalidation failed");
                ApiError::new(req_id.0.clone(), "internal_error", "revalidation failed")
            }
        })?;

    Ok(Json(ApiResponse::new(
        RevalidationData {
            validation_status: outcome.validation_status,
            overall_confidence_score: outcome.confidence.overall_confidence_score,
            data_completeness_score: outcome.confidence.data_completeness_score,
            profile: outcome.profile,
            records: outcome.records,
        },
        req_id.0,
    )))
}
