pub mod confidence;
pub mod error;
pub mod matcher;
pub mod merge_log;
pub mod pipeline;
pub mod policy;
mod retry;
pub mod validator;

pub use confidence::{
    compute_confidence, ConfidenceReport, FieldContribution, CONSOLIDATION_EVENT,
    REVALIDATION_EVENT,
};
pub use error::ConsolidationError;
pub use matcher::{find_master_profile, CompanyName};
pub use merge_log::MergeLogger;
pub use pipeline::{
    ConsolidationOutcome, ConsolidationRequest, Consolidator, ConsolidatorConfig,
    RevalidationOutcome,
};
pub use policy::{FieldStrategy, MergeField, MergePlan, MergePolicy};
pub use validator::{
    validation_status, HttpProbe, ProbeError, ReachabilityProbe, Validator,
    DEFAULT_PROBE_TIMEOUT_SECS,
};
