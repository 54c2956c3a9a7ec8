//! The `ConsolidationStore` trait.
//!
//! Implemented by storage backends (`uppi-db` for Postgres). The consolidation
//! pipeline and the HTTP layer depend on this abstraction only.

use std::future::Future;

use uuid::Uuid;

use crate::{
    analysis::SourceAnalysis,
    audit::{
        ConfidenceHistoryEntry, MergeLogEntry, NewConfidenceHistoryEntry, NewMergeLog,
        NewValidationRecord, ValidationRecord,
    },
    profile::{MasterCompanyProfile, NewMasterProfile, ProfileDelta, ScoreUpdate, ValidationStatus},
};

/// Result of a conditional profile write.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome {
    /// The write landed; carries the profile as stored.
    Written(MasterCompanyProfile),
    /// Another writer got there first: the normalized name is already taken
    /// (create) or the expected version is stale (update). Nothing was
    /// written, including the merge log.
    Conflict,
}

/// Storage backend for master profiles and their audit trails.
///
/// Audit tables are append-only: there are no update or delete operations
/// for merge logs, validation records or confidence history.
pub trait ConsolidationStore: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    // ── Source analyses (read-only) ─────────────────────────────────────

    fn get_source_analysis(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<SourceAnalysis>, Self::Error>> + Send + '_;

    // ── Profiles ────────────────────────────────────────────────────────

    /// Profiles whose normalized name equals `normalized_name`, oldest first.
    /// At most one is expected.
    fn find_profiles_by_normalized_name<'a>(
        &'a self,
        normalized_name: &'a str,
    ) -> impl Future<Output = Result<Vec<MasterCompanyProfile>, Self::Error>> + Send + 'a;

    fn get_profile(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<MasterCompanyProfile>, Self::Error>> + Send + '_;

    /// Most recently updated profiles first.
    fn list_profiles(
        &self,
        limit: i64,
    ) -> impl Future<Output = Result<Vec<MasterCompanyProfile>, Self::Error>> + Send + '_;

    /// Insert a new profile and its merge log atomically, unless the
    /// normalized name is already taken.
    fn create_profile<'a>(
        &'a self,
        profile: &'a NewMasterProfile,
        log: &'a NewMergeLog,
    ) -> impl Future<Output = Result<WriteOutcome, Self::Error>> + Send + 'a;

    /// Apply `delta` and append `log` atomically, only if the stored version
    /// still equals `expected_version`. Bumps the version.
    fn update_profile<'a>(
        &'a self,
        profile_id: Uuid,
        expected_version: i32,
        delta: &'a ProfileDelta,
        log: &'a NewMergeLog,
    ) -> impl Future<Output = Result<WriteOutcome, Self::Error>> + Send + 'a;

    fn set_validation_status(
        &self,
        profile_id: Uuid,
        status: ValidationStatus,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

    fn update_scores(
        &self,
        profile_id: Uuid,
        scores: ScoreUpdate,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

    // ── Audit trails ────────────────────────────────────────────────────

    fn append_validation_records<'a>(
        &'a self,
        records: &'a [NewValidationRecord],
    ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

    fn append_confidence_history<'a>(
        &'a self,
        entries: &'a [NewConfidenceHistoryEntry],
    ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

    /// Oldest first.
    fn list_merge_logs(
        &self,
        profile_id: Uuid,
    ) -> impl Future<Output = Result<Vec<MergeLogEntry>, Self::Error>> + Send + '_;

    /// Oldest first.
    fn list_validation_records(
        &self,
        profile_id: Uuid,
    ) -> impl Future<Output = Result<Vec<ValidationRecord>, Self::Error>> + Send + '_;

    /// Oldest first.
    fn list_confidence_history(
        &self,
        profile_id: Uuid,
    ) -> impl Future<Output = Result<Vec<ConfidenceHistoryEntry>, Self::Error>> + Send + '_;
}
