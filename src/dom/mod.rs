// src/dom/mod.rs

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;

pub mod browser;
pub mod snapshot;

pub use browser::{BrowserSession, LivePage};
pub use snapshot::HtmlSnapshot;

/// The DOM root every query after context discovery is issued against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentContext {
    #[default]
    MainDocument,
    /// Content document of the n-th `<iframe>` of the main document.
    Iframe(usize),
}

impl fmt::Display for ContentContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentContext::MainDocument => f.write_str("main document"),
            ContentContext::Iframe(n) => write!(f, "iframe {}", n),
        }
    }
}

/// What a query reports about one matched element.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ElementInfo {
    pub visible: bool,
    /// Raw text content, untrimmed.
    pub text: String,
}

/// Read and interaction primitives the extraction steps need from a page.
///
/// Implemented by the live browser ([`LivePage`]) and by static HTML
/// ([`HtmlSnapshot`]). Every call is a single round trip and may fail;
/// callers decide whether a failure is fatal.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Number of elements matching `selector` under `ctx`.
    async fn count(&self, ctx: ContentContext, selector: &str) -> Result<usize>;

    /// Every element matching `selector` under `ctx`, in document order.
    async fn elements(&self, ctx: ContentContext, selector: &str) -> Result<Vec<ElementInfo>>;

    /// Select the option at `index` of the first `<select>` matching
    /// `selector` and fire its change events. Returns the option label.
    async fn select_option(&self, ctx: ContentContext, selector: &str, index: usize)
        -> Result<String>;

    /// For the `table_index`-th `<table>` under `ctx`, the raw `<td>` text of
    /// every row matching `row_selector` (relative to that table).
    async fn table_rows(
        &self,
        ctx: ContentContext,
        table_index: usize,
        row_selector: &str,
    ) -> Result<Vec<Vec<String>>>;
}
