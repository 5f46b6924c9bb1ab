// src/extract/filters.rs

use anyhow::Result;
use std::time::Duration;
use tracing::{info, warn};

use super::resolver::{first_visible, Resolution};
use crate::{
    config::SettleDelays,
    dom::{ContentContext, ContentSource},
};

/// One dropdown the page exposes and the option we want from it.
#[derive(Debug, Clone, Copy)]
pub struct DropdownFilter {
    pub name: &'static str,
    pub selectors: &'static [&'static str],
    pub option_index: usize,
}

/// "Consulta por": second option groups the table by sector.
pub const SEGMENT_FILTER: DropdownFilter = DropdownFilter {
    name: "segment",
    selectors: &[
        "select#segment",
        "select[id*='segment' i]",
        "select[name*='segment' i]",
    ],
    option_index: 1,
};

/// Rows per page: fourth option shows every row.
pub const PAGE_SIZE_FILTER: DropdownFilter = DropdownFilter {
    name: "page size",
    selectors: &[
        "select#selectPage",
        "select[id*='selectPage' i]",
        "select[name*='selectPage' i]",
        "select[id*='pagesize' i]",
        "select[name*='pagesize' i]",
    ],
    option_index: 3,
};

/// What happened to each filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterReport {
    /// Selected option label, `None` when the filter was skipped.
    pub segment: Option<String>,
    pub page_size: Option<String>,
}

/// Apply the sector grouping, then the page size, waiting after each for the
/// table to re-render. Either may fail on its own; neither stops the run.
pub async fn apply_filters(
    source: &dyn ContentSource,
    ctx: ContentContext,
    delays: &SettleDelays,
) -> FilterReport {
    FilterReport {
        segment: apply_filter(source, ctx, &SEGMENT_FILTER, delays.after_segment).await,
        page_size: apply_filter(source, ctx, &PAGE_SIZE_FILTER, delays.after_page_size).await,
    }
}

async fn apply_filter(
    source: &dyn ContentSource,
    ctx: ContentContext,
    filter: &DropdownFilter,
    settle: Duration,
) -> Option<String> {
    match try_filter(source, ctx, filter, settle).await {
        Ok(Some(label)) => {
            info!(filter = filter.name, option = %label, "filter applied");
            Some(label)
        }
        Ok(None) => {
            warn!(filter = filter.name, "dropdown not found, skipping filter");
            None
        }
        Err(e) => {
            warn!(filter = filter.name, "selecting option failed, skipping filter: {:#}", e);
            None
        }
    }
}

async fn try_filter(
    source: &dyn ContentSource,
    ctx: ContentContext,
    filter: &DropdownFilter,
    settle: Duration,
) -> Result<Option<String>> {
    let selector = match first_visible(source, ctx, filter.selectors).await {
        Resolution::Found { strategy, .. } => *strategy,
        Resolution::NotFound => return Ok(None),
    };

    let label = source
        .select_option(ctx, selector, filter.option_index)
        .await?;
    if !settle.is_zero() {
        tokio::time::sleep(settle).await;
    }
    Ok(Some(label))
}
