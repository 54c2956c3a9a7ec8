//! Postgres-backed [`ConsolidationStore`].

use sqlx::PgPool;
use uuid::Uuid;

use uppi_core::{
    ConfidenceHistoryEntry, ConsolidationStore, MasterCompanyProfile, MergeLogEntry,
    NewConfidenceHistoryEntry, NewMasterProfile, NewMergeLog, NewValidationRecord, ProfileDelta,
    ScoreUpdate, SourceAnalysis, ValidationRecord, ValidationStatus, WriteOutcome,
};

use crate::{
    confidence_history, master_profiles, merge_logs, source_analyses, validation_records, DbError,
};

/// A [`ConsolidationStore`] over a shared Postgres pool. Cheap to clone.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl ConsolidationStore for PgStore {
    type Error = DbError;

    async fn get_source_analysis(&self, id: Uuid) -> Result<Option<SourceAnalysis>, DbError> {
        source_analyses::get_source_analysis(&self.pool, id).await
    }

    async fn find_profiles_by_normalized_name(
        &self,
        normalized_name: &str,
    ) -> Result<Vec<MasterCompanyProfile>, DbError> {
        master_profiles::find_master_profiles_by_normalized_name(&self.pool, normalized_name).await
    }

    async fn get_profile(&self, id: Uuid) -> Result<Option<MasterCompanyProfile>, DbError> {
        master_profiles::get_master_profile(&self.pool, id).await
    }

    async fn list_profiles(&self, limit: i64) -> Result<Vec<MasterCompanyProfile>, DbError> {
        master_profiles::list_master_profiles(&self.pool, limit).await
    }

    async fn create_profile(
        &self,
        profile: &NewMasterProfile,
        log: &NewMergeLog,
    ) -> Result<WriteOutcome, DbError> {
        master_profiles::insert_master_profile(&self.pool, profile, log).await
    }

    async fn update_profile(
        &self,
        profile_id: Uuid,
        expected_version: i32,
        delta: &ProfileDelta,
        log: &NewMergeLog,
    ) -> Result<WriteOutcome, DbError> {
        master_profiles::update_master_profile(&self.pool, profile_id, expected_version, delta, log)
            .await
    }

    async fn set_validation_status(
        &self,
        profile_id: Uuid,
        status: ValidationStatus,
    ) -> Result<(), DbError> {
        master_profiles::update_master_profile_validation_status(&self.pool, profile_id, status)
            .await
    }

    async fn update_scores(&self, profile_id: Uuid, scores: ScoreUpdate) -> Result<(), DbError> {
        master_profiles::update_master_profile_scores(&self.pool, profile_id, scores).await
    }

    async fn append_validation_records(
        &self,
        records: &[NewValidationRecord],
    ) -> Result<(), DbError> {
        if records.is_empty() {
            return Ok(());
        }
        validation_records::insert_validation_records(&self.pool, records).await
    }

    async fn append_confidence_history(
        &self,
        entries: &[NewConfidenceHistoryEntry],
    ) -> Result<(), DbError> {
        if entries.is_empty() {
            return Ok(());
        }
        confidence_history::insert_confidence_history(&self.pool, entries).await
    }

    async fn list_merge_logs(&self, profile_id: Uuid) -> Result<Vec<MergeLogEntry>, DbError> {
        merge_logs::list_merge_logs(&self.pool, profile_id).await
    }

    async fn list_validation_records(
        &self,
        profile_id: Uuid,
    ) -> Result<Vec<ValidationRecord>, DbError> {
        validation_records::list_validation_records(&self.pool, profile_id).await
    }

    async fn list_confidence_history(
        &self,
        profile_id: Uuid,
    ) -> Result<Vec<ConfidenceHistoryEntry>, DbError> {
        confidence_history::list_confidence_history(&self.pool, profile_id).await
    }
}
