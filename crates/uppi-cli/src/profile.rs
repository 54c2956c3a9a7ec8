//! `profile` sub-commands: read-only views over master profiles and their
//! audit trails.

use anyhow::Context;
use clap::Subcommand;
use uppi_consolidator::{find_master_profile, CompanyName};
use uppi_core::{ConsolidationStore, MasterCompanyProfile};
use uppi_db::PgStore;
use uuid::Uuid;

use crate::print_json;

const DEFAULT_LIST_LIMIT: i64 = 20;

#[derive(Debug, Subcommand)]
pub enum ProfileCommands {
    /// Show one profile, by id or by company name
    Show { profile: String },
    /// List the most recently updated profiles
    List {
        #[arg(long, default_value_t = DEFAULT_LIST_LIMIT)]
        limit: i64,
    },
    /// Show the merge log of a profile
    Logs { profile: String },
    /// Show validation records and confidence history of a profile
    Audit { profile: String },
}

/// How a `profile` argument addresses a profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ProfileRef {
    Id(Uuid),
    Name(CompanyName),
}

impl ProfileRef {
    pub(crate) fn parse(raw: &str) -> Self {
        match Uuid::parse_str(raw.trim()) {
            Ok(id) => Self::Id(id),
            Err(_) => Self::Name(CompanyName::new(raw)),
        }
    }
}

async fn resolve(store: &PgStore, raw: &str) -> anyhow::Result<MasterCompanyProfile> {
    let found = match ProfileRef::parse(raw) {
        ProfileRef::Id(id) => store.get_profile(id).await?,
        ProfileRef::Name(name) => find_master_profile(store, &name.normalized).await?,
    };
    found.with_context(|| format!("no master profile matches '{raw}'"))
}

pub(crate) async fn run(store: &PgStore, command: ProfileCommands) -> anyhow::Result<()> {
    match command {
        ProfileCommands::Show { profile } => {
            let profile = resolve(store, &profile).await?;
            print_json(&serde_json::to_value(profile)?)
        }
        ProfileCommands::List { limit } => {
            let profiles = store.list_profiles(limit.clamp(1, 200)).await?;
            print_json(&serde_json::to_value(profiles)?)
        }
        ProfileCommands::Logs { profile } => {
            let profile = resolve(store, &profile).await?;
            let logs = store.list_merge_logs(profile.id).await?;
            print_json(&serde_json::to_value(logs)?)
        }
        ProfileCommands::Audit { profile } => {
            let profile = resolve(store, &profile).await?;
            let validations = store.list_validation_records(profile.id).await?;
            let history = store.list_confidence_history(profile.id).await?;
            print_json(&serde_json::json!({
                "master_profile_id": profile.id,
                "validation_status": profile.validation_status,
                "validations": validations,
                "confidence_history": history,
            }))
        }
    }
}
