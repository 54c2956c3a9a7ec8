//! In-memory `ConsolidationStore` with hooks for simulating concurrent
//! writers and storage failures.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use uppi_core::{
    ConfidenceHistoryEntry, ConsolidationStore, MasterCompanyProfile, MergeLogEntry,
    NewConfidenceHistoryEntry, NewMasterProfile, NewMergeLog, NewValidationRecord, ProfileDelta,
    ProfileDocuments, ScoreUpdate, SourceAnalysis, ValidationRecord, ValidationStatus,
    WriteOutcome,
};

#[derive(Debug, Error)]
#[error("memory store: {0}")]
pub struct MemoryStoreError(pub String);

type ConcurrentUpdate = Box<dyn FnOnce(&mut MasterCompanyProfile) + Send>;

#[derive(Default)]
struct State {
    analyses: HashMap<Uuid, SourceAnalysis>,
    profiles: Vec<MasterCompanyProfile>,
    merge_logs: Vec<MergeLogEntry>,
    validations: Vec<ValidationRecord>,
    history: Vec<ConfidenceHistoryEntry>,
}

#[derive(Default)]
struct Hooks {
    concurrent_creates: VecDeque<NewMasterProfile>,
    concurrent_updates: VecDeque<ConcurrentUpdate>,
    always_conflict: bool,
    profile_write_attempts: u32,
    fail_validation_writes: bool,
    fail_confidence_writes: bool,
    fail_profile_writes: bool,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    hooks: Mutex<Hooks>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_analysis(&self, analysis: SourceAnalysis) {
        self.state
            .lock()
            .unwrap()
            .analyses
            .insert(analysis.id, analysis);
    }

    /// Insert a profile directly, bypassing the merge log.
    pub fn seed_profile(&self, profile: MasterCompanyProfile) {
        self.state.lock().unwrap().profiles.push(profile);
    }

    /// Another writer creates `profile` just before the next create lands.
    pub fn interleave_create(&self, profile: NewMasterProfile) {
        self.hooks
            .lock()
            .unwrap()
            .concurrent_creates
            .push_back(profile);
    }

    /// Another writer modifies the target just before the next update lands.
    pub fn interleave_update(&self, update: impl FnOnce(&mut MasterCompanyProfile) + Send + 'static) {
        self.hooks
            .lock()
            .unwrap()
            .concurrent_updates
            .push_back(Box::new(update));
    }

    pub fn always_conflict(&self) {
        self.hooks.lock().unwrap().always_conflict = true;
    }

    pub fn fail_validation_writes(&self) {
        self.hooks.lock().unwrap().fail_validation_writes = true;
    }

    pub fn fail_confidence_writes(&self) {
        self.hooks.lock().unwrap().fail_confidence_writes = true;
    }

    pub fn fail_profile_writes(&self) {
        self.hooks.lock().unwrap().fail_profile_writes = true;
    }

    pub fn profile_write_attempts(&self) -> u32 {
        self.hooks.lock().unwrap().profile_write_attempts
    }

    pub fn profiles(&self) -> Vec<MasterCompanyProfile> {
        self.state.lock().unwrap().profiles.clone()
    }

    pub fn merge_logs(&self) -> Vec<MergeLogEntry> {
        self.state.lock().unwrap().merge_logs.clone()
    }

    pub fn validations(&self) -> Vec<ValidationRecord> {
        self.state.lock().unwrap().validations.clone()
    }

    pub fn history(&self) -> Vec<ConfidenceHistoryEntry> {
        self.state.lock().unwrap().history.clone()
    }

    fn begin_profile_write(&self) -> Result<bool, MemoryStoreError> {
        let mut hooks = self.hooks.lock().unwrap();
        hooks.profile_write_attempts += 1;
        if hooks.fail_profile_writes {
            return Err(MemoryStoreError("profile write failed".to_string()));
        }
        Ok(hooks.always_conflict)
    }
}

fn append_log(state: &mut State, log: &NewMergeLog) {
    state.merge_logs.push(MergeLogEntry {
        id: Uuid::new_v4(),
        master_profile_id: log.master_profile_id,
        source_analysis_id: log.source_analysis_id,
        merge_type: log.merge_type,
        fields_updated: log.fields_updated.clone(),
        triggered_by: log.triggered_by.clone(),
        notes: log.notes.clone(),
        created_at: Utc::now(),
    });
}

impl ConsolidationStore for MemoryStore {
    type Error = MemoryStoreError;

    async fn get_source_analysis(&self, id: Uuid) -> Result<Option<SourceAnalysis>, Self::Error> {
        Ok(self.state.lock().unwrap().analyses.get(&id).cloned())
    }

    async fn find_profiles_by_normalized_name(
        &self,
        normalized_name: &str,
    ) -> Result<Vec<MasterCompanyProfile>, Self::Error> {
        let mut matches: Vec<_> = self
            .state
            .lock()
            .unwrap()
            .profiles
            .iter()
            .filter(|p| p.normalized_name == normalized_name)
            .cloned()
            .collect();
        matches.sort_by_key(|p| p.created_at);
        Ok(matches)
    }

    async fn get_profile(&self, id: Uuid) -> Result<Option<MasterCompanyProfile>, Self::Error> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .profiles
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn list_profiles(&self, limit: i64) -> Result<Vec<MasterCompanyProfile>, Self::Error> {
        let mut profiles = self.state.lock().unwrap().profiles.clone();
        profiles.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        profiles.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(profiles)
    }

    async fn create_profile(
        &self,
        profile: &NewMasterProfile,
        log: &NewMergeLog,
    ) -> Result<WriteOutcome, Self::Error> {
        if self.begin_profile_write()? {
            return Ok(WriteOutcome::Conflict);
        }
        let interloper = self.hooks.lock().unwrap().concurrent_creates.pop_front();

        let mut state = self.state.lock().unwrap();
        if let Some(other) = interloper {
            let other = other.into_profile(Utc::now());
            state.profiles.push(other);
        }
        if state
            .profiles
            .iter()
            .any(|p| p.normalized_name == profile.normalized_name)
        {
            return Ok(WriteOutcome::Conflict);
        }

        let stored = profile.clone().into_profile(Utc::now());
        state.profiles.push(stored.clone());
        append_log(&mut state, log);
        Ok(WriteOutcome::Written(stored))
    }

    async fn update_profile(
        &self,
        profile_id: Uuid,
        expected_version: i32,
        delta: &ProfileDelta,
        log: &NewMergeLog,
    ) -> Result<WriteOutcome, Self::Error> {
        if self.begin_profile_write()? {
            return Ok(WriteOutcome::Conflict);
        }
        let interloper = self.hooks.lock().unwrap().concurrent_updates.pop_front();

        let mut state = self.state.lock().unwrap();
        let Some(index) = state.profiles.iter().position(|p| p.id == profile_id) else {
            return Ok(WriteOutcome::Conflict);
        };
        if let Some(update) = interloper {
            let target = &mut state.profiles[index];
            update(target);
            target.version += 1;
        }

        let target = &mut state.profiles[index];
        if target.version != expected_version {
            return Ok(WriteOutcome::Conflict);
        }
        delta.apply_to(target);
        target.version += 1;
        target.updated_at = Utc::now();
        let stored = target.clone();
        append_log(&mut state, log);
        Ok(WriteOutcome::Written(stored))
    }

    async fn set_validation_status(
        &self,
        profile_id: Uuid,
        status: ValidationStatus,
    ) -> Result<(), Self::Error> {
        let mut state = self.state.lock().unwrap();
        let profile = state
            .profiles
            .iter_mut()
            .find(|p| p.id == profile_id)
            .ok_or_else(|| MemoryStoreError("profile not found".to_string()))?;
        profile.validation_status = status;
        Ok(())
    }

    async fn update_scores(&self, profile_id: Uuid, scores: ScoreUpdate) -> Result<(), Self::Error> {
        if self.hooks.lock().unwrap().fail_confidence_writes {
            return Err(MemoryStoreError("score update failed".to_string()));
        }
        let mut state = self.state.lock().unwrap();
        let profile = state
            .profiles
            .iter_mut()
            .find(|p| p.id == profile_id)
            .ok_or_else(|| MemoryStoreError("profile not found".to_string()))?;
        profile.overall_confidence_score = scores.overall_confidence_score;
        profile.data_completeness_score = scores.data_completeness_score;
        profile.last_validation_date = Some(scores.last_validation_date);
        Ok(())
    }

    async fn append_validation_records(
        &self,
        records: &[NewValidationRecord],
    ) -> Result<(), Self::Error> {
        if self.hooks.lock().unwrap().fail_validation_writes {
            return Err(MemoryStoreError("validation write failed".to_string()));
        }
        let mut state = self.state.lock().unwrap();
        state.validations.extend(records.iter().map(|r| ValidationRecord {
            id: Uuid::new_v4(),
            master_profile_id: r.master_profile_id,
            field_name: r.field_name.clone(),
            original_value: r.original_value.clone(),
            validated_value: r.validated_value.clone(),
            validation_method: r.validation_method,
            is_valid: r.is_valid,
            confidence_score: r.confidence_score,
            discrepancy_reason: r.discrepancy_reason.clone(),
            validated_at: Utc::now(),
        }));
        Ok(())
    }

    async fn append_confidence_history(
        &self,
        entries: &[NewConfidenceHistoryEntry],
    ) -> Result<(), Self::Error> {
        if self.hooks.lock().unwrap().fail_confidence_writes {
            return Err(MemoryStoreError("confidence history write failed".to_string()));
        }
        let mut state = self.state.lock().unwrap();
        state.history.extend(entries.iter().map(|e| ConfidenceHistoryEntry {
            id: Uuid::new_v4(),
            master_profile_id: e.master_profile_id,
            field_name: e.field_name.clone(),
            confidence_score: e.confidence_score,
            event_type: e.event_type.clone(),
            contributing_sources: e.contributing_sources.clone(),
            recorded_at: Utc::now(),
        }));
        Ok(())
    }

    async fn list_merge_logs(&self, profile_id: Uuid) -> Result<Vec<MergeLogEntry>, Self::Error> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .merge_logs
            .iter()
            .filter(|l| l.master_profile_id == profile_id)
            .cloned()
            .collect())
    }

    async fn list_validation_records(
        &self,
        profile_id: Uuid,
    ) -> Result<Vec<ValidationRecord>, Self::Error> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .validations
            .iter()
            .filter(|r| r.master_profile_id == profile_id)
            .cloned()
            .collect())
    }

    async fn list_confidence_history(
        &self,
        profile_id: Uuid,
    ) -> Result<Vec<ConfidenceHistoryEntry>, Self::Error> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .history
            .iter()
            .filter(|e| e.master_profile_id == profile_id)
            .cloned()
            .collect())
    }
}

pub fn analysis(company_name: &str) -> SourceAnalysis {
    SourceAnalysis {
        id: Uuid::new_v4(),
        company_name: company_name.to_string(),
        website_url: None,
        industry: None,
        employee_count: None,
        revenue_estimate: None,
        headquarters: None,
        founded_year: None,
        description: None,
        analysis_payload: serde_json::json!({}),
        created_at: Utc::now(),
    }
}

pub fn new_profile(company_name: &str, normalized_name: &str) -> NewMasterProfile {
    NewMasterProfile {
        id: Uuid::new_v4(),
        company_name: company_name.to_string(),
        normalized_name: normalized_name.to_string(),
        website_url: None,
        primary_domain: None,
        industry: None,
        headquarters: None,
        founded_year: None,
        employee_count: None,
        revenue_estimate: None,
        description: None,
        overall_confidence_score: 0.0,
        data_completeness_score: 0.0,
        validation_status: ValidationStatus::Pending,
        data_sources: vec![],
        documents: ProfileDocuments::default(),
    }
}

/// Probe that answers without touching the network.
pub struct StubProbe {
    pub reachable: bool,
}

impl uppi_consolidator::ReachabilityProbe for StubProbe {
    async fn probe<'a>(
        &'a self,
        url: &'a reqwest::Url,
    ) -> Result<(), uppi_consolidator::ProbeError> {
        if self.reachable {
            Ok(())
        } else {
            Err(uppi_consolidator::ProbeError::Status {
                url: url.to_string(),
                status: 404,
            })
        }
    }
}
