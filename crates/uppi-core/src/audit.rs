//! Append-only provenance records: merge log, validation history and
//! confidence history.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeType {
    NewProfile,
    DataUpdate,
}

impl MergeType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MergeType::NewProfile => "new_profile",
            MergeType::DataUpdate => "data_update",
        }
    }
}

impl FromStr for MergeType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new_profile" => Ok(MergeType::NewProfile),
            "data_update" => Ok(MergeType::DataUpdate),
            other => Err(CoreError::InvalidMergeType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMethod {
    HttpHeadRequest,
    BasicValidation,
}

impl ValidationMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ValidationMethod::HttpHeadRequest => "http_head_request",
            ValidationMethod::BasicValidation => "basic_validation",
        }
    }
}

impl FromStr for ValidationMethod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http_head_request" => Ok(ValidationMethod::HttpHeadRequest),
            "basic_validation" => Ok(ValidationMethod::BasicValidation),
            other => Err(CoreError::InvalidValidationMethod(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMergeLog {
    pub master_profile_id: Uuid,
    pub source_analysis_id: Uuid,
    pub merge_type: MergeType,
    pub fields_updated: Vec<String>,
    pub triggered_by: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeLogEntry {
    pub id: Uuid,
    pub master_profile_id: Uuid,
    pub source_analysis_id: Uuid,
    pub merge_type: MergeType,
    pub fields_updated: Vec<String>,
    pub triggered_by: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewValidationRecord {
    pub master_profile_id: Uuid,
    pub field_name: String,
    pub original_value: Option<String>,
    pub validated_value: Option<String>,
    pub validation_method: ValidationMethod,
    pub is_valid: bool,
    /// 0.0-1.0.
    pub confidence_score: f64,
    pub discrepancy_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRecord {
    pub id: Uuid,
    pub master_profile_id: Uuid,
    pub field_name: String,
    pub original_value: Option<String>,
    pub validated_value: Option<String>,
    pub validation_method: ValidationMethod,
    pub is_valid: bool,
    pub confidence_score: f64,
    pub discrepancy_reason: Option<String>,
    pub validated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewConfidenceHistoryEntry {
    pub master_profile_id: Uuid,
    pub field_name: String,
    /// The field's weighted contribution to the overall score.
    pub confidence_score: f64,
    pub event_type: String,
    pub contributing_sources: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceHistoryEntry {
    pub id: Uuid,
    pub master_profile_id: Uuid,
    pub field_name: String,
    pub confidence_score: f64,
    pub event_type: String,
    pub contributing_sources: Vec<Uuid>,
    pub recorded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_type_round_trips_through_str() {
        for merge_type in [MergeType::NewProfile, MergeType::DataUpdate] {
            assert_eq!(merge_type.as_str().parse::<MergeType>().unwrap(), merge_type);
        }
        assert!(matches!(
            "merge".parse::<MergeType>(),
            Err(CoreError::InvalidMergeType(ref s)) if s == "merge"
        ));
    }

    #[test]
    fn validation_method_serializes_snake_case() {
        let json = serde_json::to_string(&ValidationMethod::HttpHeadRequest).unwrap();
        assert_eq!(json, "\"http_head_request\"");
        assert_eq!(
            "basic_validation".parse::<ValidationMethod>().unwrap(),
            ValidationMethod::BasicValidation
        );
    }
}
