mod profile;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uppi_consolidator::{
    ConsolidationRequest, Consolidator, ConsolidatorConfig, HttpProbe, Validator,
};
use uppi_core::AppConfig;
use uppi_db::PgStore;
use uuid::Uuid;

use crate::profile::ProfileCommands;

pub(crate) type CliConsolidator = Consolidator<PgStore, HttpProbe>;

const CLI_ACTOR: &str = "cli";

#[derive(Debug, Parser)]
#[command(name = "uppi-cli")]
#[command(about = "Uppi company profile consolidation command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Check database connectivity
    Ping,
    /// Apply pending database migrations
    Migrate,
    /// Merge one source analysis into its master profile
    Consolidate {
        #[arg(long)]
        analysis_id: Uuid,

        /// Override the company name recorded on the analysis
        #[arg(long)]
        company_name: Option<String>,

        /// Actor recorded on the merge log
        #[arg(long, default_value = CLI_ACTOR)]
        user_id: String,
    },
    /// Re-run validation and confidence scoring for a profile
    Validate {
        #[arg(long)]
        profile_id: Uuid,
    },
    /// Inspect master profiles
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("uppi-cli ready; run with --help for commands");
        return Ok(());
    };

    let config = uppi_core::load_app_config().context("failed to load configuration")?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let pool = uppi_db::connect_pool(
        &config.database_url,
        uppi_db::PoolConfig::from_app_config(&config),
    )
    .await
    .context("failed to connect to database")?;

    match command {
        Commands::Ping => {
            uppi_db::health_check(&pool).await?;
            println!("database ok");
        }
        Commands::Migrate => {
            let applied = uppi_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
        }
        Commands::Consolidate {
            analysis_id,
            company_name,
            user_id,
        } => {
            let consolidator = build_consolidator(&config, pool)?;
            let outcome = consolidator
                .consolidate(&ConsolidationRequest {
                    analysis_id,
                    company_name,
                    triggered_by: user_id,
                })
                .await?;
            print_json(&serde_json::json!({
                "success": true,
                "masterProfileId": outcome.master_profile_id,
                "isNewProfile": outcome.is_new_profile,
                "consolidatedData": outcome.profile,
            }))?;
        }
        Commands::Validate { profile_id } => {
            let consolidator = build_consolidator(&config, pool)?;
            let outcome = consolidator.revalidate(profile_id).await?;
            print_json(&serde_json::json!({
                "profile": outcome.profile,
                "validation_status": outcome.validation_status,
                "overall_confidence_score": outcome.confidence.overall_confidence_score,
                "data_completeness_score": outcome.confidence.data_completeness_score,
                "records": outcome.records,
            }))?;
        }
        Commands::Profile { command } => profile::run(&PgStore::new(pool), command).await?,
    }

    Ok(())
}

fn build_consolidator(config: &AppConfig, pool: sqlx::PgPool) -> anyhow::Result<CliConsolidator> {
    let weights = match &config.field_weights_path {
        Some(path) => uppi_core::load_field_weights(path)?,
        None => uppi_core::FieldWeights::default(),
    };
    Ok(Consolidator::new(
        PgStore::new(pool),
        Validator::new(HttpProbe::from_app_config(config)?),
        ConsolidatorConfig::from_app_config(config, weights),
    ))
}

pub(crate) fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
