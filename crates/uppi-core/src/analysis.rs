use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::profile::DocumentField;

/// One independently produced observation about a company, e.g. a single
/// AI-generated competitor analysis run. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceAnalysis {
    pub id: Uuid,
    pub company_name: String,
    pub website_url: Option<String>,
    pub industry: Option<String>,
    pub employee_count: Option<i64>,
    /// Whole US dollars.
    pub revenue_estimate: Option<i64>,
    pub headquarters: Option<String>,
    pub founded_year: Option<i16>,
    pub description: Option<String>,
    /// Free-form analysis output. Top-level keys named after a
    /// [`DocumentField`] feed the matching profile document.
    pub analysis_payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl SourceAnalysis {
    /// Returns the object stored under `field` in the payload, if it is one.
    #[must_use]
    pub fn document(&self, field: DocumentField) -> Option<&serde_json::Map<String, serde_json::Value>> {
        self.analysis_payload
            .get(field.as_str())
            .and_then(serde_json::Value::as_object)
    }
}
