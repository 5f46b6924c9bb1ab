// src/extract/mod.rs

use tracing::{info, instrument, warn};

use crate::{
    config::SettleDelays,
    dom::{ContentContext, ContentSource},
    schema::Dataset,
};

pub mod context;
pub mod date;
pub mod filters;
pub mod resolver;
pub mod table;

pub use context::locate_content_context;
pub use date::{extract_date, parse_heading};
pub use filters::{apply_filters, FilterReport};
pub use resolver::{first_present, first_visible, resolve, Resolution};
pub use table::{clean_row, harvest_table};

/// What one pass over a loaded page produced.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub context: ContentContext,
    pub filters: FilterReport,
    pub dataset: Dataset,
}

/// Run every extraction step against an already loaded page.
///
/// Never fails: the context probe, the date and each filter fall back on
/// their own, and a harvest that errors leaves an empty dataset that still
/// carries the date found earlier.
#[instrument(level = "info", skip_all)]
pub async fn extract(source: &dyn ContentSource, delays: &SettleDelays) -> Extraction {
    let context = locate_content_context(source).await;
    let date = extract_date(source, context).await;
    let filters = apply_filters(source, context, delays).await;

    if !delays.before_harvest.is_zero() {
        info!(wait = ?delays.before_harvest, "waiting for final table render");
        tokio::time::sleep(delays.before_harvest).await;
    }

    let rows = match harvest_table(source, context).await {
        Ok(rows) => rows,
        Err(e) => {
            warn!("harvest failed, returning empty dataset: {:#}", e);
            Vec::new()
        }
    };
    info!(rows = rows.len(), date = %date, "extraction finished");

    Extraction {
        context,
        filters,
        dataset: Dataset::new(date, rows),
    }
}

/// [`extract`], keeping only the dataset.
pub async fn extract_dataset(source: &dyn ContentSource, delays: &SettleDelays) -> Dataset {
    extract(source, delays).await.dataset
}
