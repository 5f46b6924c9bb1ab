use anyhow::{Context, Result};
use clap::Parser;
use ibovscraper::{
    config::{ScrapeConfig, SettleDelays, SinkTarget, DEFAULT_SOURCE_URL},
    dom::HtmlSnapshot,
    extract::extract_dataset,
    schema::Dataset,
    scrape,
    store::open_sink,
};
use std::{path::PathBuf, process::ExitCode};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

/// Extract today's IBOV composition and write it as Parquet.
#[derive(Parser, Debug)]
struct Args {
    /// Page to load
    #[arg(long, default_value = DEFAULT_SOURCE_URL)]
    url: String,

    /// Directory for the output file when no bucket is given
    #[arg(long, env = "OUTPUT_DIR", default_value = "data")]
    output_dir: PathBuf,

    /// Upload to this GCS bucket instead of writing locally
    #[arg(long, env = "GCS_BUCKET")]
    bucket: Option<String>,

    /// Object name prefix inside the bucket
    #[arg(long, env = "GCS_PREFIX")]
    prefix: Option<String>,

    /// Extract from a saved page instead of launching a browser
    #[arg(long)]
    html: Option<PathBuf>,

    /// Show the browser window
    #[arg(long)]
    headful: bool,

    /// Chromium binary to launch
    #[arg(long, env = "CHROME_PATH")]
    chrome: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_target(false)
        .init();

    let args = Args::parse();
    match run(args).await {
        Ok(rows) => {
            println!("{} rows extracted", rows);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{:#}", e);
            eprintln!("extraction failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<usize> {
    let target = SinkTarget::select(args.bucket, args.prefix, Some(args.output_dir));
    info!(?target, "output target");

    let dataset = match &args.html {
        Some(path) => {
            info!(path = %path.display(), "replaying saved page");
            let snapshot = HtmlSnapshot::from_file(path)?;
            extract_dataset(&snapshot, &SettleDelays::none()).await
        }
        None => {
            let mut config = ScrapeConfig::from_env()?.with_url(&args.url)?;
            config.browser.headless = !args.headful;
            if args.chrome.is_some() {
                config.browser.chrome_executable = args.chrome;
            }
            scrape::scrape(&config).await?
        }
    };

    let sink = open_sink(&target).await.context("opening output target")?;
    let location = scrape::persist(&dataset, sink.as_ref()).await?;
    log_preview(&dataset, &location);
    Ok(dataset.len())
}

fn log_preview(dataset: &Dataset, location: &str) {
    info!(
        location,
        rows = dataset.len(),
        columns = dataset.columns().len() + 1,
        date = %dataset.date(),
        "dataset saved"
    );
    for row in dataset.rows().iter().take(3) {
        info!("  {}", row.cells().join(" | "));
    }
}
