// src/scrape.rs

use serde::Serialize;
use tokio::time::Instant;
use tracing::{error, info, instrument};

use crate::{
    config::ScrapeConfig,
    dom::BrowserSession,
    error::RunError,
    extract::extract_dataset,
    schema::{Dataset, ExtractedDate},
    store::DatasetSink,
};

/// Result of a run that reached persistence.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub rows: usize,
    pub date: ExtractedDate,
    pub location: String,
    pub elapsed_seconds: f64,
}

/// Launch a browser, load the portal and extract the composition.
///
/// Only a failed launch is an error. Navigation or extraction problems
/// yield an empty dataset dated today, and the browser is closed on every
/// path out of here.
#[instrument(level = "info", skip_all, fields(url = %config.url))]
pub async fn scrape(config: &ScrapeConfig) -> Result<Dataset, RunError> {
    let session = BrowserSession::launch(&config.browser)
        .await
        .map_err(RunError::Launch)?;

    let dataset = match session.open(&config.url, config.delays.after_navigation).await {
        Ok(()) => extract_dataset(session.page(), &config.delays).await,
        Err(e) => {
            error!("page did not load, returning empty dataset: {:#}", e);
            Dataset::empty(ExtractedDate::today())
        }
    };

    session.close().await;
    Ok(dataset)
}

/// Hand `dataset` to `sink`, mapping failure to [`RunError::Persist`].
pub async fn persist(dataset: &Dataset, sink: &dyn DatasetSink) -> Result<String, RunError> {
    sink.persist(dataset).await.map_err(RunError::Persist)
}

/// Scrape, then persist: one full run.
pub async fn run(
    config: &ScrapeConfig,
    sink: &dyn DatasetSink,
) -> Result<(Dataset, RunSummary), RunError> {
    let start = Instant::now();
    let dataset = scrape(config).await?;
    let location = persist(&dataset, sink).await?;

    let summary = RunSummary {
        rows: dataset.len(),
        date: dataset.date().clone(),
        location,
        elapsed_seconds: start.elapsed().as_secs_f64(),
    };
    info!(
        rows = summary.rows,
        date = %summary.date,
        location = %summary.location,
        "run finished in {:.3}s",
        summary.elapsed_seconds
    );
    Ok((dataset, summary))
}
