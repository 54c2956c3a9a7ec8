//! The consolidation trigger.
//!
//! Unlike the read endpoints this one answers in the trigger's own camelCase
//! shape: `{ success, masterProfileId, isNewProfile, consolidatedData }` or
//! `{ success: false, error }`.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uppi_consolidator::{ConsolidationError, ConsolidationRequest};
use uppi_core::MasterCompanyProfile;
use uuid::Uuid;

use crate::middleware::RequestId;

use super::AppState;

const DEFAULT_ACTOR: &str = "system";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ConsolidateBody {
    analysis_id: String,
    #[serde(default)]
    company_name: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ConsolidateSuccess {
    success: bool,
    master_profile_id: Uuid,
    is_new_profile: bool,
    consolidated_data: MasterCompanyProfile,
}

#[derive(Debug, Serialize)]
pub(super) struct ConsolidateFailure {
    success: bool,
    error: String,
}

fn failure(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ConsolidateFailure {
            success: false,
            error: error.into(),
        }),
    )
        .into_response()
}

impl ConsolidateBody {
    fn into_request(self) -> Result<ConsolidationRequest, String> {
        let analysis_id = Uuid::parse_str(self.analysis_id.trim())
            .map_err(|e| format!("analysisId is not a valid UUID: {e}"))?;
        let triggered_by = self
            .user_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| DEFAULT_ACTOR.to_string());

        Ok(ConsolidationRequest {
            analysis_id,
            company_name: self.company_name,
            triggered_by,
        })
    }
}

pub(super) async fn consolidate(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<ConsolidateBody>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(body)) => match body.into_request() {
            Ok(request) => request,
            Err(message) => return failure(StatusCode::BAD_REQUEST, message),
        },
        Err(rejection) => return failure(StatusCode::BAD_REQUEST, rejection.body_text()),
    };

    match state.consolidator.consolidate(&request).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(ConsolidateSuccess {
                success: true,
                master_profile_id: outcome.master_profile_id,
                is_new_profile: outcome.is_new_profile,
                consolidated_data: outcome.profile,
            }),
        )
            .into_response(),
        Err(err) => {
            tracing::error!(
                request_id = %req_id.0,
                analysis_id = %request.analysis_id,
                error = %err,
                "consolidation failed"
            );
            let message = match &err {
                ConsolidationError::Store(_) => "storage error during consolidation".to_string(),
                other => other.to_string(),
            };
            failure(StatusCode::INTERNAL_SERVER_ERROR, message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(json: serde_json::Value) -> ConsolidateBody {
        serde_json::from_value(json).expect("deserialize body")
    }

    #[test]
    fn body_maps_to_request() {
        let id = Uuid::new_v4();
        let request = body(serde_json::json!({
            "analysisId": id.to_string(),
            "companyName": "Acme Corp.",
            "userId": "user-42",
        }))
        .into_request()
        .expect("valid body");

        assert_eq!(request.analysis_id, id);
        assert_eq!(request.company_name.as_deref(), Some("Acme Corp."));
        assert_eq!(request.triggered_by, "user-42");
    }

    #[test]
    fn missing_user_defaults_to_system_actor() {
        let request = body(serde_json::json!({
            "analysisId": Uuid::new_v4().to_string(),
            "userId": " ",
        }))
        .into_request()
        .expect("valid body");
        assert_eq!(request.triggered_by, DEFAULT_ACTOR);
        assert!(request.company_name.is_none());
    }

    #[test]
    fn malformed_analysis_id_is_rejected() {
        let err = body(serde_json::json!({ "analysisId": "not-a-uuid" }))
            .into_request()
            .expect_err("must reject");
        assert!(err.contains("analysisId"));
    }

    #[test]
    fn failure_body_carries_success_flag() {
        let json = serde_json::to_value(ConsolidateFailure {
            success: false,
            error: "boom".to_string(),
        })
        .expect("serialize");
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "boom");
    }
}
