pub mod analysis;
pub mod app_config;
pub mod audit;
pub mod config;
pub mod normalize;
pub mod profile;
pub mod store;
pub mod weights;

pub use analysis::SourceAnalysis;
pub use app_config::{AppConfig, Environment};
pub use audit::{
    ConfidenceHistoryEntry, MergeLogEntry, MergeType, NewConfidenceHistoryEntry, NewMergeLog,
    NewValidationRecord, ValidationMethod, ValidationRecord,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use normalize::{normalize_company_name, parse_website_url, primary_domain};
pub use profile::{
    DocumentField, MasterCompanyProfile, NewMasterProfile, ProfileDelta, ProfileDocuments,
    ScoreUpdate, ValidationStatus,
};
pub use store::{ConsolidationStore, WriteOutcome};
pub use weights::{load_field_weights, FieldWeights, TrackedField};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read field weights file {path}: {source}")]
    WeightsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse field weights file: {0}")]
    WeightsFileParse(#[source] serde_yaml::Error),

    #[error("configuration validation failed: {0}")]
    Validation(String),
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid validation status: {0}")]
    InvalidValidationStatus(String),

    #[error("invalid merge type: {0}")]
    InvalidMergeType(String),

    #[error("invalid validation method: {0}")]
    InvalidValidationMethod(String),
}
