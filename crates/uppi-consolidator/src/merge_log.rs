use uuid::Uuid;

use uppi_core::NewMergeLog;

use crate::policy::MergePlan;

/// Builds the one merge-log entry each consolidation persists.
#[derive(Debug, Clone)]
pub struct MergeLogger {
    triggered_by: String,
}

impl MergeLogger {
    #[must_use]
    pub fn new(triggered_by: impl Into<String>) -> Self {
        Self {
            triggered_by: triggered_by.into(),
        }
    }

    #[must_use]
    pub fn entry(&self, plan: &MergePlan, source_analysis_id: Uuid) -> NewMergeLog {
        let fields_updated: Vec<String> = plan
            .changed_fields()
            .into_iter()
            .map(str::to_string)
            .collect();

        let notes = match plan {
            MergePlan::Create(_) => {
                format!("created master profile from source analysis {source_analysis_id}")
            }
            MergePlan::Update { .. } if fields_updated.is_empty() => {
                format!("no field changes from source analysis {source_analysis_id}")
            }
            MergePlan::Update { .. } => format!(
                "updated {} field(s) from source analysis {source_analysis_id}",
                fields_updated.len()
            ),
        };

        NewMergeLog {
            master_profile_id: plan.profile_id(),
            source_analysis_id,
            merge_type: plan.merge_type(),
            fields_updated,
            triggered_by: self.triggered_by.clone(),
            notes: Some(notes),
        }
    }
}
