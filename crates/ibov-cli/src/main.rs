use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use ibov_client::{BrowserRenderer, HtmlTableExtractor};
use ibov_core::config::{DEFAULT_TARGET_URL, RenderOptions, validate_target_url};
use ibov_core::models::ConstituentDataset;
use ibov_core::pipeline::{PipelineOutcome, PipelineService, exit_code};
use ibov_core::traits::PageRenderer;
use ibov_store::{DatasetWriter, S3Uploader, StorageConfig, read_parquet};

#[derive(Parser)]
#[command(name = "ibov", version, about = "Daily IBOVESPA composition ingest")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the B3 page, parse the composition table, and persist it
    Run {
        #[command(flatten)]
        render: RenderArgs,

        /// Destination bucket
        #[arg(short, long, env = "IBOV_BUCKET")]
        bucket: String,

        /// Root of the local partitioned tree
        #[arg(long, env = "IBOV_DATA_DIR", default_value = "data")]
        data_dir: PathBuf,

        /// Custom S3 endpoint (MinIO, LocalStack)
        #[arg(long, env = "IBOV_S3_ENDPOINT")]
        s3_endpoint: Option<String>,

        /// Capture date (YYYY-MM-DD); defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Render the page and save its HTML, for offline debugging
    Render {
        #[command(flatten)]
        render: RenderArgs,

        /// Where to write the rendered HTML
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Parse a saved page and print its records
    Extract {
        /// HTML file produced by `ibov render`
        #[arg(long)]
        html: PathBuf,

        /// Capture date to stamp on the records; defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,
    },

    /// Print the records stored in a Parquet file
    Inspect {
        /// Parquet file written by `ibov run`
        #[arg(short, long)]
        file: PathBuf,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,
    },
}

#[derive(Args)]
struct RenderArgs {
    /// Page to render
    #[arg(short, long, env = "IBOV_TARGET_URL", default_value = DEFAULT_TARGET_URL)]
    url: String,

    /// Navigation timeout in seconds
    #[arg(long, env = "IBOV_NAV_TIMEOUT_SECS", default_value_t = 60)]
    nav_timeout: u64,

    /// Table wait timeout in seconds
    #[arg(long, env = "IBOV_TABLE_TIMEOUT_SECS", default_value_t = 30)]
    table_timeout: u64,

    /// Show the browser window
    #[arg(long, default_value_t = false)]
    headed: bool,
}

impl RenderArgs {
    fn options(&self) -> RenderOptions {
        RenderOptions {
            navigation_timeout: Duration::from_secs(self.nav_timeout),
            table_timeout: Duration::from_secs(self.table_timeout),
            headless: !self.headed,
            ..RenderOptions::default()
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Setup tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("ibov=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            render,
            bucket,
            data_dir,
            s3_endpoint,
            date,
        } => {
            let mut storage = StorageConfig::new(bucket)?.with_data_dir(data_dir);
            if let Some(endpoint) = s3_endpoint {
                storage = storage.with_endpoint(endpoint);
            }
            let date = date.unwrap_or_else(today);
            cmd_run(&render, &storage, date).await
        }
        Commands::Render { render, output } => {
            cmd_render(&render, &output).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Extract { html, date, format } => {
            cmd_extract(&html, date.unwrap_or_else(today), format)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Inspect { file, format } => {
            cmd_inspect(&file, format)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

async fn cmd_run(render: &RenderArgs, storage: &StorageConfig, date: NaiveDate) -> Result<ExitCode> {
    let url = validate_target_url(&render.url)?;

    let uploader = S3Uploader::from_config(storage).await;
    let service = PipelineService::new(
        BrowserRenderer::new(),
        HtmlTableExtractor::new(),
        DatasetWriter::from_config(uploader, storage),
        url.to_string(),
    )
    .with_options(render.options());

    let result = service.run(date).await;

    match &result {
        Ok(PipelineOutcome::Persisted(receipt)) => {
            println!(
                "ok: saved {} and uploaded s3://{}/{}",
                receipt.local_path.display(),
                receipt.bucket,
                receipt.object_key
            );
        }
        Ok(PipelineOutcome::Empty) => {
            println!("ok: no constituent rows for {date}, nothing written");
        }
        Err(e) => {
            println!("failed: {e}");
        }
    }

    Ok(ExitCode::from(exit_code(&result)))
}

async fn cmd_render(render: &RenderArgs, output: &Path) -> Result<()> {
    let url = validate_target_url(&render.url)?;

    let page = BrowserRenderer::new()
        .render(url.as_str(), &render.options())
        .await?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(output, &page.html)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    tracing::info!("Wrote {} bytes of HTML to {}", page.html.len(), output.display());
    Ok(())
}

fn cmd_extract(html_path: &Path, date: NaiveDate, format: OutputFormat) -> Result<()> {
    let html = std::fs::read_to_string(html_path)
        .with_context(|| format!("Failed to read HTML file: {}", html_path.display()))?;

    let dataset = HtmlTableExtractor::new().extract_html(&html, date)?;
    tracing::info!("Extracted {} records", dataset.len());

    print_dataset(&dataset, format)
}

fn cmd_inspect(path: &Path, format: OutputFormat) -> Result<()> {
    let dataset = read_parquet(path)?;
    tracing::info!(
        "{} records captured on {}",
        dataset.len(),
        dataset.capture_date
    );

    print_dataset(&dataset, format)
}

fn print_dataset(dataset: &ConstituentDataset, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(io::stdout().lock());
            for record in &dataset.records {
                writer.serialize(record)?;
            }
            writer.flush()?;
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(dataset)?);
        }
    }
    Ok(())
}
