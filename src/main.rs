//! Command-line interface for tidemark
//!
//! # Usage Examples
//!
//! ## Load
//! ```bash
//! # Append new episodes from one export
//! tidemark load shows.csv \
//!   --postgres-host localhost --postgres-db media
//!
//! # Load every CSV in a directory, typing an extra column and recording outcomes
//! tidemark load exports/ \
//!   --watermark-column AIRDATE \
//!   --column-type PREMIERED=timestamp \
//!   --emit-report loads.jsonl
//!
//! # See what would be inserted without writing anything
//! tidemark load shows.csv --dry-run
//! ```
//!
//! ## Plan
//! ```bash
//! # Print the derived CREATE TABLE and watermark query
//! tidemark plan shows.csv --types-file column_types.yaml
//! ```

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use load_core::ColumnType;
use std::path::PathBuf;
use tidemark::csv::FileSource;
use tidemark::incremental::{LoadConfig, DEFAULT_WATERMARK_COLUMN};
use tidemark::postgresql::{PostgresConnection, PostgresOpts};
use tidemark::{
    build_column_types, delimiter_byte, load_sources, parse_column_type, plan_source,
    resolve_sources, ReportWriter,
};
use tracing::info;

#[derive(Parser)]
#[command(name = "tidemark")]
#[command(about = "Incrementally load CSV exports into PostgreSQL tables")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load CSV files, appending rows newer than each table's watermark
    Load {
        /// CSV files, or directories ending with '/'
        #[arg(required = true, value_name = "SOURCE")]
        sources: Vec<String>,

        /// How source columns map onto the destination table
        #[command(flatten)]
        table: TableArgs,

        /// PostgreSQL connection options
        #[command(flatten)]
        postgres: PostgresOpts,

        /// Read watermarks and filter, but create no tables and insert nothing
        #[arg(long)]
        dry_run: bool,

        /// Append one JSON line per load outcome to this file
        #[arg(long, value_name = "PATH")]
        emit_report: Option<PathBuf>,
    },

    /// Print the statements a load would issue, without connecting
    Plan {
        /// CSV files, or directories ending with '/'
        #[arg(required = true, value_name = "SOURCE")]
        sources: Vec<String>,

        /// How source columns map onto the destination table
        #[command(flatten)]
        table: TableArgs,
    },
}

#[derive(Args, Clone, Debug)]
struct TableArgs {
    /// Column whose maximum stored value is the watermark (always TIMESTAMP)
    #[arg(long, default_value = DEFAULT_WATERMARK_COLUMN)]
    watermark_column: String,

    /// Column type override (format: NAME=timestamp|text), may be repeated
    #[arg(long = "column-type", value_name = "NAME=TYPE", value_parser = parse_column_type)]
    column_types: Vec<(String, ColumnType)>,

    /// YAML file mapping column names to types (format: `columns: { NAME: timestamp }`)
    #[arg(long, value_name = "PATH")]
    types_file: Option<PathBuf>,

    /// CSV field delimiter
    #[arg(long, default_value = ",")]
    delimiter: char,
}

impl TableArgs {
    fn load_config(&self) -> anyhow::Result<LoadConfig> {
        let types = build_column_types(self.types_file.as_deref(), &self.column_types)?;
        Ok(LoadConfig::new(self.watermark_column.clone()).with_column_types(types))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Load {
            sources,
            table,
            postgres,
            dry_run,
            emit_report,
        } => run_load(sources, table, postgres, dry_run, emit_report).await,
        Commands::Plan { sources, table } => run_plan(sources, table).await,
    }
}

async fn run_load(
    sources: Vec<String>,
    table: TableArgs,
    postgres: PostgresOpts,
    dry_run: bool,
    emit_report: Option<PathBuf>,
) -> anyhow::Result<()> {
    let config = table.load_config()?.with_dry_run(dry_run);
    let delimiter = delimiter_byte(table.delimiter)?;

    let sources: Vec<FileSource> = sources.iter().map(|s| FileSource::parse(s)).collect();
    let paths = resolve_sources(&sources).await?;
    if paths.is_empty() {
        anyhow::bail!("No CSV files to load");
    }
    info!("Loading {} file(s)", paths.len());

    let mut writer = match &emit_report {
        Some(path) => Some(ReportWriter::open(path).await?),
        None => None,
    };

    let mut conn = PostgresConnection::connect(&postgres)
        .await
        .context("Failed to open PostgreSQL connection")?;

    let outcome = load_sources(&mut conn, &config, &paths, delimiter, writer.as_mut()).await;
    conn.close().await;

    let summary = outcome?;
    info!(
        "Finished: {} row(s) {} across {} file(s)",
        summary.total_inserted(),
        if dry_run { "would be inserted" } else { "inserted" },
        summary.reports.len()
    );
    Ok(())
}

async fn run_plan(sources: Vec<String>, table: TableArgs) -> anyhow::Result<()> {
    let config = table.load_config()?;
    let delimiter = delimiter_byte(table.delimiter)?;

    let sources: Vec<FileSource> = sources.iter().map(|s| FileSource::parse(s)).collect();
    for path in resolve_sources(&sources).await? {
        let plan = plan_source(&path, &config, delimiter).await?;
        println!("-- {} ({} rows)", plan.source, plan.rows);
        println!("{}", plan.create_table);
        println!("{};", plan.watermark_query);
        println!();
    }
    Ok(())
}
