//! Field-level merge rules.
//!
//! A [`MergePolicy`] maps each mergeable field to a [`FieldStrategy`] and turns
//! an incoming [`SourceAnalysis`] into a [`MergePlan`]: a brand-new profile, or
//! a [`ProfileDelta`] holding only the fields that change.

use std::collections::BTreeMap;

use uuid::Uuid;

use uppi_core::{
    primary_domain, profile::Document, DocumentField, MasterCompanyProfile, MergeType,
    NewMasterProfile, ProfileDelta, ProfileDocuments, SourceAnalysis, ValidationStatus,
};

use crate::matcher::CompanyName;

/// How an incoming value competes with the stored one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldStrategy {
    /// Replace when the incoming value is strictly greater. Text compares by
    /// character count.
    PreferLarger,
    /// First writer wins: write only into an empty field.
    FillIfEmpty,
    /// Replace when the incoming text is non-empty and strictly longer.
    /// Numbers compare by value.
    PreferLonger,
    /// Documents gain keys they lack; existing keys are never overwritten.
    /// Scalars behave as [`FieldStrategy::FillIfEmpty`].
    ShallowMerge,
}

/// Every profile field an analysis can contribute to after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MergeField {
    WebsiteUrl,
    Industry,
    Headquarters,
    FoundedYear,
    EmployeeCount,
    RevenueEstimate,
    Description,
    Document(DocumentField),
}

/// Outcome of planning one analysis against the current state.
#[derive(Debug, Clone, PartialEq)]
pub enum MergePlan {
    Create(NewMasterProfile),
    Update {
        profile_id: Uuid,
        expected_version: i32,
        delta: ProfileDelta,
    },
}

impl MergePlan {
    #[must_use]
    pub fn profile_id(&self) -> Uuid {
        match self {
            MergePlan::Create(profile) => profile.id,
            MergePlan::Update { profile_id, .. } => *profile_id,
        }
    }

    #[must_use]
    pub fn merge_type(&self) -> MergeType {
        match self {
            MergePlan::Create(_) => MergeType::NewProfile,
            MergePlan::Update { .. } => MergeType::DataUpdate,
        }
    }

    /// Every populated field for a creation; the delta's fields for an update.
    #[must_use]
    pub fn changed_fields(&self) -> Vec<&'static str> {
        match self {
            MergePlan::Create(profile) => profile.populated_fields(),
            MergePlan::Update { delta, .. } => delta.changed_fields(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergePolicy {
    strategies: BTreeMap<MergeField, FieldStrategy>,
}

impl Default for MergePolicy {
    fn default() -> Self {
        let mut strategies = BTreeMap::from([
            (MergeField::EmployeeCount, FieldStrategy::PreferLarger),
            (MergeField::RevenueEstimate, FieldStrategy::PreferLarger),
            (MergeField::Headquarters, FieldStrategy::FillIfEmpty),
            (MergeField::Industry, FieldStrategy::FillIfEmpty),
            (MergeField::FoundedYear, FieldStrategy::FillIfEmpty),
            (MergeField::WebsiteUrl, FieldStrategy::FillIfEmpty),
            (MergeField::Description, FieldStrategy::PreferLonger),
        ]);
        for doc in DocumentField::ALL {
            strategies.insert(MergeField::Document(doc), FieldStrategy::ShallowMerge);
        }
        Self { strategies }
    }
}

impl MergePolicy {
    /// Replace the strategy used for `field`.
    #[must_use]
    pub fn with_strategy(mut self, field: MergeField, strategy: FieldStrategy) -> Self {
        self.strategies.insert(field, strategy);
        self
    }

    #[must_use]
    pub fn strategy(&self, field: MergeField) -> FieldStrategy {
        self.strategies
            .get(&field)
            .copied()
            .unwrap_or(FieldStrategy::FillIfEmpty)
    }

    /// Plan how `analysis` lands: as a new profile when `existing` is `None`,
    /// otherwise as a delta against it.
    #[must_use]
    pub fn plan(
        &self,
        existing: Option<&MasterCompanyProfile>,
        analysis: &SourceAnalysis,
        name: &CompanyName,
    ) -> MergePlan {
        match existing {
            None => MergePlan::Create(seed_profile(analysis, name)),
            Some(profile) => MergePlan::Update {
                profile_id: profile.id,
                expected_version: profile.version,
                delta: self.delta(profile, analysis),
            },
        }
    }

    fn delta(&self, profile: &MasterCompanyProfile, analysis: &SourceAnalysis) -> ProfileDelta {
        let website_url = merge_value(
            self.strategy(MergeField::WebsiteUrl),
            profile.website_url.as_ref(),
            analysis.website_url.as_ref(),
        );
        let primary_domain = website_url
            .as_deref()
            .and_then(primary_domain)
            .filter(|domain| profile.primary_domain.as_deref() != Some(domain.as_str()));

        let documents = DocumentField::ALL
            .into_iter()
            .filter_map(|field| {
                merge_document(
                    self.strategy(MergeField::Document(field)),
                    profile.documents.get(field),
                    analysis.document(field),
                )
                .map(|doc| (field, doc))
            })
            .collect();

        let data_sources = (!profile.data_sources.contains(&analysis.id)).then(|| {
            let mut sources = profile.data_sources.clone();
            sources.push(analysis.id);
            sources
        });

        ProfileDelta {
            website_url,
            primary_domain,
            industry: merge_value(
                self.strategy(MergeField::Industry),
                profile.industry.as_ref(),
                analysis.industry.as_ref(),
            ),
            headquarters: merge_value(
                self.strategy(MergeField::Headquarters),
                profile.headquarters.as_ref(),
                analysis.headquarters.as_ref(),
            ),
            founded_year: merge_value(
                self.strategy(MergeField::FoundedYear),
                profile.founded_year.as_ref(),
                analysis.founded_year.as_ref(),
            ),
            employee_count: merge_value(
                self.strategy(MergeField::EmployeeCount),
                profile.employee_count.as_ref(),
                analysis.employee_count.as_ref(),
            ),
            revenue_estimate: merge_value(
                self.strategy(MergeField::RevenueEstimate),
                profile.revenue_estimate.as_ref(),
                analysis.revenue_estimate.as_ref(),
            ),
            description: merge_value(
                self.strategy(MergeField::Description),
                profile.description.as_ref(),
                analysis.description.as_ref(),
            ),
            documents,
            data_sources,
        }
    }
}

fn seed_profile(analysis: &SourceAnalysis, name: &CompanyName) -> NewMasterProfile {
    let website_url = non_blank(analysis.website_url.as_ref());
    let doc = |field| analysis.document(field).cloned().unwrap_or_default();

    NewMasterProfile {
        id: Uuid::new_v4(),
        company_name: name.display.clone(),
        normalized_name: name.normalized.clone(),
        primary_domain: website_url.as_deref().and_then(primary_domain),
        website_url,
        industry: non_blank(analysis.industry.as_ref()),
        headquarters: non_blank(analysis.headquarters.as_ref()),
        founded_year: analysis.founded_year,
        employee_count: analysis.employee_count,
        revenue_estimate: analysis.revenue_estimate,
        description: non_blank(analysis.description.as_ref()),
        overall_confidence_score: 0.0,
        data_completeness_score: 0.0,
        validation_status: ValidationStatus::Pending,
        data_sources: vec![analysis.id],
        documents: ProfileDocuments {
            official_data: doc(DocumentField::OfficialData),
            financial_data: doc(DocumentField::FinancialData),
            technology_stack: doc(DocumentField::TechnologyStack),
            market_position: doc(DocumentField::MarketPosition),
            personnel: doc(DocumentField::Personnel),
        },
    }
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.is_blank()).cloned()
}

/// Values a strategy can compare.
trait Ranked {
    fn is_blank(&self) -> bool {
        false
    }

    fn outranks(&self, other: &Self) -> bool;
}

impl Ranked for String {
    fn is_blank(&self) -> bool {
        self.trim().is_empty()
    }

    fn outranks(&self, other: &Self) -> bool {
        self.chars().count() > other.chars().count()
    }
}

impl Ranked for i64 {
    fn outranks(&self, other: &Self) -> bool {
        self > other
    }
}

impl Ranked for i16 {
    fn outranks(&self, other: &Self) -> bool {
        self > other
    }
}

/// The value to write, or `None` to leave the field alone.
fn merge_value<T: Ranked + Clone>(
    strategy: FieldStrategy,
    current: Option<&T>,
    incoming: Option<&T>,
) -> Option<T> {
    let incoming = incoming.filter(|v| !v.is_blank())?;
    let Some(current) = current.filter(|v| !v.is_blank()) else {
        return Some(incoming.clone());
    };
    match strategy {
        FieldStrategy::PreferLarger | FieldStrategy::PreferLonger => {
            incoming.outranks(current).then(|| incoming.clone())
        }
        FieldStrategy::FillIfEmpty | FieldStrategy::ShallowMerge => None,
    }
}

/// The full replacement document, or `None` when nothing changes.
fn merge_document(
    strategy: FieldStrategy,
    current: &Document,
    incoming: Option<&Document>,
) -> Option<Document> {
    let incoming = incoming.filter(|doc| !doc.is_empty())?;
    match strategy {
        FieldStrategy::ShallowMerge => {
            let mut merged = current.clone();
            let mut added = false;
            for (key, value) in incoming {
                if !merged.contains_key(key) {
                    merged.insert(key.clone(), value.clone());
                    added = true;
                }
            }
            added.then_some(merged)
        }
        FieldStrategy::FillIfEmpty => current.is_empty().then(|| incoming.clone()),
        FieldStrategy::PreferLarger | FieldStrategy::PreferLonger => {
            (incoming.len() > current.len()).then(|| incoming.clone())
        }
    }
}

#[cfg(test)]
#[path = "policy_test.rs"]
mod tests;
