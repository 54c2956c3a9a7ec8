//! Weighted confidence and completeness scoring.

use chrono::{DateTime, Utc};

use uppi_core::{
    FieldWeights, MasterCompanyProfile, NewConfidenceHistoryEntry, ScoreUpdate, TrackedField,
};

/// History event type written after a merge.
pub const CONSOLIDATION_EVENT: &str = "data_consolidation";
/// History event type written by an explicit re-validation.
pub const REVALIDATION_EVENT: &str = "revalidation";

/// Per-field contribution is `weight × CONTRIBUTION_SCALE`.
const CONTRIBUTION_SCALE: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldContribution {
    pub field: TrackedField,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfidenceReport {
    /// Mean contribution of the populated tracked fields, clamped to 0-100.
    pub overall_confidence_score: f64,
    /// Share of tracked fields that are populated, 0-100.
    pub data_completeness_score: f64,
    /// One entry per populated tracked field, in [`TrackedField::ALL`] order.
    pub contributions: Vec<FieldContribution>,
}

impl ConfidenceReport {
    #[must_use]
    pub fn history_entries(
        &self,
        profile: &MasterCompanyProfile,
        event_type: &str,
    ) -> Vec<NewConfidenceHistoryEntry> {
        self.contributions
            .iter()
            .map(|c| NewConfidenceHistoryEntry {
                master_profile_id: profile.id,
                field_name: c.field.as_str().to_string(),
                confidence_score: c.score,
                event_type: event_type.to_string(),
                contributing_sources: profile.data_sources.clone(),
            })
            .collect()
    }

    #[must_use]
    pub fn score_update(&self, validated_at: DateTime<Utc>) -> ScoreUpdate {
        ScoreUpdate {
            overall_confidence_score: self.overall_confidence_score,
            data_completeness_score: self.data_completeness_score,
            last_validation_date: validated_at,
        }
    }
}

fn is_populated(profile: &MasterCompanyProfile, field: TrackedField) -> bool {
    let text = |value: Option<&String>| value.is_some_and(|v| !v.trim().is_empty());
    match field {
        TrackedField::CompanyName => !profile.company_name.trim().is_empty(),
        TrackedField::WebsiteUrl => text(profile.website_url.as_ref()),
        TrackedField::Industry => text(profile.industry.as_ref()),
        TrackedField::EmployeeCount => profile.employee_count.is_some(),
        TrackedField::RevenueEstimate => profile.revenue_estimate.is_some(),
        TrackedField::Headquarters => text(profile.headquarters.as_ref()),
    }
}

#[must_use]
pub fn compute_confidence(profile: &MasterCompanyProfile, weights: &FieldWeights) -> ConfidenceReport {
    let contributions: Vec<FieldContribution> = TrackedField::ALL
        .into_iter()
        .filter(|field| is_populated(profile, *field))
        .map(|field| FieldContribution {
            field,
            score: weights.weight(field) * CONTRIBUTION_SCALE,
        })
        .collect();

    #[allow(clippy::cast_precision_loss)]
    let populated = contributions.len() as f64;
    #[allow(clippy::cast_precision_loss)]
    let tracked = TrackedField::ALL.len() as f64;

    let overall_confidence_score = if contributions.is_empty() {
        0.0
    } else {
        let total: f64 = contributions.iter().map(|c| c.score).sum();
        (total / populated).clamp(0.0, 100.0)
    };

    ConfidenceReport {
        overall_confidence_score,
        data_completeness_score: populated / tracked * 100.0,
        contributions,
    }
}
