//! Stowage CLI: move locally stored uploads to Google Cloud Storage.
//!
//! Configuration comes from the environment (or a `.env` file); see `Config::from_env`.

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::sync::Arc;
use stowage_cli::{init_tracing, parse_cli_date};
use stowage_core::{AssetKind, Config};
use stowage_services::{log_app_error, run_migration, MigrationContext, ResumePoints};
use stowage_storage::HttpSource;

#[derive(Parser)]
#[command(name = "stowage", about = "Migrate local uploads to object storage")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload every local file and image, rewrite its record and remove the local copy
    MigrateFilesToGcs {
        /// Date used in object keys (DD/MM/YYYY); defaults to today (UTC)
        #[arg(long, value_parser = parse_cli_date)]
        date: Option<NaiveDate>,
        /// Only files with an id greater than this
        #[arg(long, default_value = "0")]
        files_after: i64,
        /// Only images with an id greater than this
        #[arg(long, default_value = "0")]
        images_after: i64,
    },
    /// Render and upload the configured styles of one migrated image
    GenerateStyles {
        /// Image record id
        id: i64,
    },
    /// Delete the remote objects of one record
    Destroy {
        #[arg(long, value_enum)]
        kind: KindArg,
        /// Record id
        id: i64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    File,
    Image,
}

impl From<KindArg> for AssetKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::File => AssetKind::File,
            KindArg::Image => AssetKind::Image,
        }
    }
}

#[derive(Serialize)]
struct StylesOutput {
    id: i64,
    succeeded: Vec<String>,
    failed: Vec<FailedStyle>,
}

#[derive(Serialize)]
struct FailedStyle {
    style: String,
    error_code: &'static str,
    message: String,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize report")?;
    println!("{}", out);
    Ok(())
}

async fn connect(config: Config) -> anyhow::Result<MigrationContext> {
    MigrationContext::connect(config)
        .await
        .context("Failed to connect to the database or object store")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::from_env().context("Invalid configuration")?;
    let source_timeout = config.gcs.upload_timeout;

    match cli.command {
        Commands::MigrateFilesToGcs {
            date,
            files_after,
            images_after,
        } => {
            let resume = ResumePoints {
                files: files_after,
                images: images_after,
            };
            let report = run_migration(config, date, resume)
                .await
                .inspect_err(|e| log_app_error(e, "Migration failed"))?;
            print_json(&report)?;
        }
        Commands::GenerateStyles { id } => {
            let context = connect(config).await?;
            let mut record = context
                .store
                .find(AssetKind::Image, id)
                .await?
                .with_context(|| format!("image {} not found", id))?;

            let source = Arc::new(HttpSource::new(source_timeout)?);
            let backend = context.backend(AssetKind::Image, source);
            let capability = backend
                .derivatives()
                .context("image backend cannot derive styles")?;
            let report = capability.generate_image_styles(&mut record).await?;

            print_json(&StylesOutput {
                id,
                succeeded: report.succeeded.clone(),
                failed: report
                    .failed
                    .iter()
                    .map(|failure| FailedStyle {
                        style: failure.style.clone(),
                        error_code: failure.error.error_code(),
                        message: failure.error.to_string(),
                    })
                    .collect(),
            })?;

            if let Some(error) = report.first_error() {
                anyhow::bail!("{} style(s) failed, first: {}", report.failed.len(), error);
            }
        }
        Commands::Destroy { kind, id } => {
            let kind = AssetKind::from(kind);
            let context = connect(config).await?;
            let record = context
                .store
                .find(kind, id)
                .await?
                .with_context(|| format!("{} {} not found", kind, id))?;

            let source = Arc::new(HttpSource::new(source_timeout)?);
            context.backend(kind, source).destroy(&record).await?;
            tracing::info!(kind = %kind, id, "Remote objects deleted");
        }
    }

    Ok(())
}
