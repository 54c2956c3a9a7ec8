//! The consolidation pipeline.
//!
//! `consolidate` runs match → plan → persist as an optimistic transaction,
//! re-running from the match step when a concurrent writer wins the race.
//! Validation and confidence aggregation then run against the committed
//! profile. Their failures are logged and never fail the consolidation.

use chrono::Utc;
use uuid::Uuid;

use uppi_core::{
    AppConfig, ConsolidationStore, FieldWeights, MasterCompanyProfile, NewValidationRecord,
    SourceAnalysis, ValidationStatus, WriteOutcome,
};

use crate::confidence::{
    compute_confidence, ConfidenceReport, CONSOLIDATION_EVENT, REVALIDATION_EVENT,
};
use crate::error::ConsolidationError;
use crate::matcher::{find_master_profile, CompanyName};
use crate::merge_log::MergeLogger;
use crate::policy::{MergePlan, MergePolicy};
use crate::retry::{retry_on_conflict, Attempt};
use crate::validator::{validation_status, ReachabilityProbe, Validator};

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_BACKOFF_MS: u64 = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct ConsolidatorConfig {
    /// Extra attempts after a conflicting write.
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    pub weights: FieldWeights,
}

impl Default for ConsolidatorConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
            weights: FieldWeights::default(),
        }
    }
}

impl ConsolidatorConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig, weights: FieldWeights) -> Self {
        Self {
            max_retries: config.merge_max_retries,
            retry_backoff_ms: config.merge_retry_backoff_ms,
            weights,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsolidationRequest {
    pub analysis_id: Uuid,
    /// Overrides the analysis's company name when non-blank.
    pub company_name: Option<String>,
    /// Recorded as the merge-log actor.
    pub triggered_by: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConsolidationOutcome {
    pub master_profile_id: Uuid,
    pub is_new_profile: bool,
    /// The profile as committed by the merge step.
    pub profile: MasterCompanyProfile,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RevalidationOutcome {
    /// The profile after status and scores were written.
    pub profile: MasterCompanyProfile,
    pub records: Vec<NewValidationRecord>,
    pub validation_status: ValidationStatus,
    pub confidence: ConfidenceReport,
}

pub struct Consolidator<S, P> {
    store: S,
    validator: Validator<P>,
    policy: MergePolicy,
    config: ConsolidatorConfig,
}

impl<S, P> Consolidator<S, P>
where
    S: ConsolidationStore,
    P: ReachabilityProbe,
{
    #[must_use]
    pub fn new(store: S, validator: Validator<P>, config: ConsolidatorConfig) -> Self {
        Self {
            store,
            validator,
            policy: MergePolicy::default(),
            config,
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: MergePolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Merge one source analysis into its master profile.
    ///
    /// # Errors
    ///
    /// - [`ConsolidationError::SourceAnalysisNotFound`] if the analysis does not exist.
    /// - [`ConsolidationError::UnusableCompanyName`] if the name normalizes to nothing.
    /// - [`ConsolidationError::ConflictRetriesExhausted`] if every attempt lost a race.
    /// - [`ConsolidationError::Store`] if reading the analysis or writing the
    ///   profile and its merge log fails.
    pub async fn consolidate(
        &self,
        request: &ConsolidationRequest,
    ) -> Result<ConsolidationOutcome, ConsolidationError> {
        let analysis = self
            .store
            .get_source_analysis(request.analysis_id)
            .await
            .map_err(ConsolidationError::store)?
            .ok_or(ConsolidationError::SourceAnalysisNotFound(request.analysis_id))?;

        let name = CompanyName::resolve(request.company_name.as_deref(), &analysis);
        if name.normalized.is_empty() {
            return Err(ConsolidationError::UnusableCompanyName(name.display));
        }
        let logger = MergeLogger::new(request.triggered_by.clone());

        let (analysis_ref, name_ref, logger_ref) = (&analysis, &name, &logger);
        let merged = retry_on_conflict(
            self.config.max_retries,
            self.config.retry_backoff_ms,
            move || self.merge_once(analysis_ref, name_ref, logger_ref),
        )
        .await?;

        let Some(outcome) = merged else {
            tracing::error!(
                analysis_id = %analysis.id,
                normalized_name = %name.normalized,
                "consolidation abandoned after repeated write conflicts"
            );
            return Err(ConsolidationError::ConflictRetriesExhausted {
                normalized_name: name.normalized,
                attempts: self.config.max_retries.saturating_add(1),
            });
        };

        tracing::info!(
            analysis_id = %analysis.id,
            profile_id = %outcome.master_profile_id,
            is_new_profile = outcome.is_new_profile,
            version = outcome.profile.version,
            "master profile consolidated"
        );

        self.run_tail_steps(&outcome.profile).await;
        Ok(outcome)
    }

    /// Re-run validation and confidence scoring for an existing profile.
    /// Unlike the tail of [`Self::consolidate`], failures are returned.
    ///
    /// # Errors
    ///
    /// Returns [`ConsolidationError::ProfileNotFound`] for an unknown id, or
    /// [`ConsolidationError::Store`] if any read or write fails.
    pub async fn revalidate(
        &self,
        profile_id: Uuid,
    ) -> Result<RevalidationOutcome, ConsolidationError> {
        let profile = self.load_profile(profile_id).await?;

        let (records, status) = self
            .validate_and_record(&profile)
            .await
            .map_err(ConsolidationError::store)?;
        let confidence = self
            .aggregate_and_record(&profile, REVALIDATION_EVENT)
            .await
            .map_err(ConsolidationError::store)?;

        let profile = self.load_profile(profile_id).await?;
        tracing::info!(
            profile_id = %profile.id,
            validation_status = %status,
            overall_confidence_score = confidence.overall_confidence_score,
            "master profile revalidated"
        );

        Ok(RevalidationOutcome {
            profile,
            records,
            validation_status: status,
            confidence,
        })
    }

    async fn load_profile(&self, profile_id: Uuid) -> Result<MasterCompanyProfile, ConsolidationError> {
        self.store
            .get_profile(profile_id)
            .await
            .map_err(ConsolidationError::store)?
            .ok_or(ConsolidationError::ProfileNotFound(profile_id))
    }

    async fn merge_once(
        &self,
        analysis: &SourceAnalysis,
        name: &CompanyName,
        logger: &MergeLogger,
    ) -> Result<Attempt<ConsolidationOutcome>, ConsolidationError> {
        let existing = find_master_profile(&self.store, &name.normalized)
            .await
            .map_err(ConsolidationError::store)?;

        let plan = self.policy.plan(existing.as_ref(), analysis, name);
        let log = logger.entry(&plan, analysis.id);

        let written = match &plan {
            MergePlan::Create(profile) => self.store.create_profile(profile, &log).await,
            MergePlan::Update {
                profile_id,
                expected_version,
                delta,
            } => {
                self.store
                    .update_profile(*profile_id, *expected_version, delta, &log)
                    .await
            }
        }
        .map_err(ConsolidationError::store)?;

        Ok(match written {
            WriteOutcome::Written(profile) => Attempt::Done(ConsolidationOutcome {
                master_profile_id: profile.id,
                is_new_profile: matches!(plan, MergePlan::Create(_)),
                profile,
            }),
            WriteOutcome::Conflict => {
                tracing::debug!(
                    normalized_name = %name.normalized,
                    merge_type = plan.merge_type().as_str(),
                    "profile write lost a race"
                );
                Attempt::Conflict
            }
        })
    }

    async fn run_tail_steps(&self, profile: &MasterCompanyProfile) {
        if let Err(err) = self.validate_and_record(profile).await {
            tracing::warn!(
                profile_id = %profile.id,
                error = %err,
                "profile validation failed; consolidation result kept"
            );
        }
        if let Err(err) = self.aggregate_and_record(profile, CONSOLIDATION_EVENT).await {
            tracing::error!(
                profile_id = %profile.id,
                error = %err,
                "confidence aggregation failed; consolidation result kept"
            );
        }
    }

    async fn validate_and_record(
        &self,
        profile: &MasterCompanyProfile,
    ) -> Result<(Vec<NewValidationRecord>, ValidationStatus), S::Error> {
        let records = self.validator.validate(profile).await;
        self.store.append_validation_records(&records).await?;

        let status = validation_status(&records);
        self.store.set_validation_status(profile.id, status).await?;
        Ok((records, status))
    }

    async fn aggregate_and_record(
        &self,
        profile: &MasterCompanyProfile,
        event_type: &str,
    ) -> Result<ConfidenceReport, S::Error> {
        let report = compute_confidence(profile, &self.config.weights);
        self.store
            .append_confidence_history(&report.history_entries(profile, event_type))
            .await?;
        self.store
            .update_scores(profile.id, report.score_update(Utc::now()))
            .await?;
        Ok(report)
    }
}
