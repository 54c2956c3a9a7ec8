//! The deduplicated master profile and the write shapes used to create or
//! update it.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::CoreError;

pub type Document = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    Pending,
    Validated,
    Disputed,
}

impl ValidationStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ValidationStatus::Pending => "pending",
            ValidationStatus::Validated => "validated",
            ValidationStatus::Disputed => "disputed",
        }
    }
}

impl std::fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValidationStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ValidationStatus::Pending),
            "validated" => Ok(ValidationStatus::Validated),
            "disputed" => Ok(ValidationStatus::Disputed),
            other => Err(CoreError::InvalidValidationStatus(other.to_string())),
        }
    }
}

/// Semi-structured profile sections, merged additively key by key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentField {
    OfficialData,
    FinancialData,
    TechnologyStack,
    MarketPosition,
    Personnel,
}

impl DocumentField {
    pub const ALL: [DocumentField; 5] = [
        DocumentField::OfficialData,
        DocumentField::FinancialData,
        DocumentField::TechnologyStack,
        DocumentField::MarketPosition,
        DocumentField::Personnel,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentField::OfficialData => "official_data",
            DocumentField::FinancialData => "financial_data",
            DocumentField::TechnologyStack => "technology_stack",
            DocumentField::MarketPosition => "market_position",
            DocumentField::Personnel => "personnel",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileDocuments {
    #[serde(default)]
    pub official_data: Document,
    #[serde(default)]
    pub financial_data: Document,
    #[serde(default)]
    pub technology_stack: Document,
    #[serde(default)]
    pub market_position: Document,
    #[serde(default)]
    pub personnel: Document,
}

impl ProfileDocuments {
    #[must_use]
    pub fn get(&self, field: DocumentField) -> &Document {
        match field {
            DocumentField::OfficialData => &self.official_data,
            DocumentField::FinancialData => &self.financial_data,
            DocumentField::TechnologyStack => &self.technology_stack,
            DocumentField::MarketPosition => &self.market_position,
            DocumentField::Personnel => &self.personnel,
        }
    }

    pub fn get_mut(&mut self, field: DocumentField) -> &mut Document {
        match field {
            DocumentField::OfficialData => &mut self.official_data,
            DocumentField::FinancialData => &mut self.financial_data,
            DocumentField::TechnologyStack => &mut self.technology_stack,
            DocumentField::MarketPosition => &mut self.market_position,
            DocumentField::Personnel => &mut self.personnel,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasterCompanyProfile {
    pub id: Uuid,
    pub company_name: String,
    /// Dedup key; unique across profiles.
    pub normalized_name: String,
    pub website_url: Option<String>,
    pub primary_domain: Option<String>,
    pub industry: Option<String>,
    pub headquarters: Option<String>,
    pub founded_year: Option<i16>,
    pub employee_count: Option<i64>,
    pub revenue_estimate: Option<i64>,
    pub description: Option<String>,
    /// 0-100.
    pub overall_confidence_score: f64,
    /// 0-100.
    pub data_completeness_score: f64,
    pub validation_status: ValidationStatus,
    /// Contributing source analysis ids, in first-seen order.
    pub data_sources: Vec<Uuid>,
    #[serde(flatten)]
    pub documents: ProfileDocuments,
    pub last_validation_date: Option<DateTime<Utc>>,
    /// Bumped on every write; used as the compare-and-swap token.
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A profile that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMasterProfile {
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
    pub validation_status: ValidationStatus,
    pub data_sources: Vec<Uuid>,
    pub documents: ProfileDocuments,
}

impl NewMasterProfile {
    /// Names of every field the new profile populates.
    #[must_use]
    pub fn populated_fields(&self) -> Vec<&'static str> {
        let mut fields = vec!["company_name", "normalized_name"];
        let optional: [(&'static str, bool); 9] = [
            ("website_url", self.website_url.is_some()),
            ("primary_domain", self.primary_domain.is_some()),
            ("industry", self.industry.is_some()),
            ("headquarters", self.headquarters.is_some()),
            ("founded_year", self.founded_year.is_some()),
            ("employee_count", self.employee_count.is_some()),
            ("revenue_estimate", self.revenue_estimate.is_some()),
            ("description", self.description.is_some()),
            ("data_sources", !self.data_sources.is_empty()),
        ];
        fields.extend(optional.iter().filter(|(_, set)| *set).map(|(name, _)| *name));
        fields.extend(
            DocumentField::ALL
                .iter()
                .filter(|f| !self.documents.get(**f).is_empty())
                .map(|f| f.as_str()),
        );
        fields
    }

    /// Materialise the stored form of this profile at version 1.
    #[must_use]
    pub fn into_profile(self, now: DateTime<Utc>) -> MasterCompanyProfile {
        MasterCompanyProfile {
            id: self.id,
            company_name: self.company_name,
            normalized_name: self.normalized_name,
            website_url: self.website_url,
            primary_domain: self.primary_domain,
            industry: self.industry,
            headquarters: self.headquarters,
            founded_year: self.founded_year,
            employee_count: self.employee_count,
            revenue_estimate: self.revenue_estimate,
            description: self.description,
            overall_confidence_score: self.overall_confidence_score,
            data_completeness_score: self.data_completeness_score,
            validation_status: self.validation_status,
            data_sources: self.data_sources,
            documents: self.documents,
            last_validation_date: None,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update: `Some` means "write this value", `None` means "leave alone".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileDelta {
    pub website_url: Option<String>,
    pub primary_domain: Option<String>,
    pub industry: Option<String>,
    pub headquarters: Option<String>,
    pub founded_year: Option<i16>,
    pub employee_count: Option<i64>,
    pub revenue_estimate: Option<i64>,
    pub description: Option<String>,
    /// Full replacement value for each document that gained keys.
    pub documents: BTreeMap<DocumentField, Document>,
    /// Full replacement source list when a new analysis id was appended.
    /// Provenance bookkeeping, not reported as a changed field.
    pub data_sources: Option<Vec<Uuid>>,
}

impl ProfileDelta {
    /// Names of the data fields this delta writes.
    #[must_use]
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let scalar: [(&'static str, bool); 8] = [
            ("website_url", self.website_url.is_some()),
            ("primary_domain", self.primary_domain.is_some()),
            ("industry", self.industry.is_some()),
            ("headquarters", self.headquarters.is_some()),
            ("founded_year", self.founded_year.is_some()),
            ("employee_count", self.employee_count.is_some()),
            ("revenue_estimate", self.revenue_estimate.is_some()),
            ("description", self.description.is_some()),
        ];
        scalar
            .iter()
            .filter(|(_, set)| *set)
            .map(|(name, _)| *name)
            .chain(self.documents.keys().map(|f| f.as_str()))
            .collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changed_fields().is_empty() && self.data_sources.is_none()
    }

    /// Apply the delta in place. Does not touch `version` or timestamps.
    pub fn apply_to(&self, profile: &mut MasterCompanyProfile) {
        fn set<T: Clone>(target: &mut Option<T>, value: Option<&T>) {
            if let Some(v) = value {
                *target = Some(v.clone());
            }
        }

        set(&mut profile.website_url, self.website_url.as_ref());
        set(&mut profile.primary_domain, self.primary_domain.as_ref());
        set(&mut profile.industry, self.industry.as_ref());
        set(&mut profile.headquarters, self.headquarters.as_ref());
        set(&mut profile.founded_year, self.founded_year.as_ref());
        set(&mut profile.employee_count, self.employee_count.as_ref());
        set(&mut profile.revenue_estimate, self.revenue_estimate.as_ref());
        set(&mut profile.description, self.description.as_ref());
        for (field, doc) in &self.documents {
            *profile.documents.get_mut(*field) = doc.clone();
        }
        if let Some(sources) = &self.data_sources {
            profile.data_sources.clone_from(sources);
        }
    }
}

/// Scores written by the confidence aggregator in a single update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreUpdate {
    pub overall_confidence_score: f64,
    pub data_completeness_score: f64,
    pub last_validation_date: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_profile() -> NewMasterProfile {
        NewMasterProfile {
            id: Uuid::new_v4(),
            company_name: "Acme Corp.".to_string(),
            normalized_name: "acme".to_string(),
            website_url: None,
            primary_domain: None,
            industry: None,
            headquarters: None,
            founded_year: None,
            employee_count: Some(50),
            revenue_estimate: None,
            description: None,
            overall_confidence_score: 0.0,
            data_completeness_score: 0.0,
            validation_status: ValidationStatus::Pending,
            data_sources: vec![Uuid::new_v4()],
            documents: ProfileDocuments::default(),
        }
    }

    #[test]
    fn validation_status_round_trips_through_str() {
        for status in [
            ValidationStatus::Pending,
            ValidationStatus::Validated,
            ValidationStatus::Disputed,
        ] {
            assert_eq!(status.as_str().parse::<ValidationStatus>().unwrap(), status);
        }
        assert!("unknown".parse::<ValidationStatus>().is_err());
    }

    #[test]
    fn populated_fields_lists_only_set_values() {
        let fields = new_profile().populated_fields();
        assert_eq!(
            fields,
            vec!["company_name", "normalized_name", "employee_count", "data_sources"]
        );
    }

    #[test]
    fn into_profile_starts_at_version_one() {
        let now = Utc::now();
        let profile = new_profile().into_profile(now);
        assert_eq!(profile.version, 1);
        assert_eq!(profile.created_at, now);
        assert!(profile.last_validation_date.is_none());
    }

    #[test]
    fn empty_delta_changes_nothing() {
        let delta = ProfileDelta::default();
        assert!(delta.is_empty());
        assert!(delta.changed_fields().is_empty());

        let mut profile = new_profile().into_profile(Utc::now());
        let before = profile.clone();
        delta.apply_to(&mut profile);
        assert_eq!(profile, before);
    }

    #[test]
    fn delta_applies_only_set_fields() {
        let mut profile = new_profile().into_profile(Utc::now());
        profile.headquarters = Some("Berlin".to_string());

        let mut documents = BTreeMap::new();
        let mut tech = Document::new();
        tech.insert("backend".to_string(), serde_json::json!("rust"));
        documents.insert(DocumentField::TechnologyStack, tech);

        let delta = ProfileDelta {
            employee_count: Some(120),
            documents,
            ..ProfileDelta::default()
        };
        delta.apply_to(&mut profile);

        assert_eq!(profile.employee_count, Some(120));
        assert_eq!(profile.headquarters.as_deref(), Some("Berlin"));
        assert_eq!(profile.documents.technology_stack["backend"], "rust");
        assert_eq!(
            delta.changed_fields(),
            vec!["employee_count", "technology_stack"]
        );
    }

    #[test]
    fn profile_serializes_documents_inline() {
        let profile = new_profile().into_profile(Utc::now());
        let json = serde_json::to_value(&profile).expect("serialize");
        assert!(json.get("technology_stack").is_some());
        assert_eq!(json["validation_status"], "pending");
    }
}
