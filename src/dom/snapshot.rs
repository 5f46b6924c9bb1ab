// src/dom/snapshot.rs

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use scraper::{node::Element, ElementRef, Html, Selector};
use std::{path::Path, sync::Mutex};

use super::{ContentContext, ContentSource, ElementInfo};

/// A dropdown selection applied to a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub context: ContentContext,
    pub selector: String,
    pub index: usize,
    pub label: String,
}

/// Static HTML standing in for a live page.
///
/// Iframe content comes from each `<iframe srcdoc=...>`; an iframe without
/// `srcdoc` has an empty document. Nothing re-renders after a selection,
/// selections are only recorded.
pub struct HtmlSnapshot {
    main: String,
    frames: Vec<String>,
    selections: Mutex<Vec<Selection>>,
}

impl HtmlSnapshot {
    pub fn parse(html: impl Into<String>) -> Self {
        let main = html.into();
        let frames = {
            let doc = Html::parse_document(&main);
            let iframe = Selector::parse("iframe").expect("iframe selector should parse");
            doc.select(&iframe)
                .map(|f| f.value().attr("srcdoc").unwrap_or_default().to_string())
                .collect()
        };
        Self {
            main,
            frames,
            selections: Mutex::new(Vec::new()),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let html = std::fs::read_to_string(path)
            .with_context(|| format!("reading HTML snapshot {}", path.display()))?;
        Ok(Self::parse(html))
    }

    /// Selections applied so far, oldest first.
    pub fn selections(&self) -> Vec<Selection> {
        self.selections
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    fn document(&self, ctx: ContentContext) -> Result<Html> {
        let source = match ctx {
            ContentContext::MainDocument => &self.main,
            ContentContext::Iframe(n) => self
                .frames
                .get(n)
                .ok_or_else(|| anyhow!("no iframe at index {}", n))?,
        };
        Ok(Html::parse_document(source))
    }

    fn count_sync(&self, ctx: ContentContext, selector: &str) -> Result<usize> {
        let sel = css(selector)?;
        Ok(self.document(ctx)?.select(&sel).count())
    }

    fn elements_sync(&self, ctx: ContentContext, selector: &str) -> Result<Vec<ElementInfo>> {
        let sel = css(selector)?;
        let doc = self.document(ctx)?;
        let found = doc
            .select(&sel)
            .map(|el| ElementInfo {
                visible: is_visible(el),
                text: el.text().collect(),
            })
            .collect();
        Ok(found)
    }

    fn select_sync(&self, ctx: ContentContext, selector: &str, index: usize) -> Result<String> {
        let sel = css(selector)?;
        let option = css("option")?;
        let doc = self.document(ctx)?;
        let el = doc
            .select(&sel)
            .next()
            .ok_or_else(|| anyhow!("no element matches {}", selector))?;
        if el.value().name() != "select" {
            bail!("{} matched <{}>, not <select>", selector, el.value().name());
        }
        let label = el
            .select(&option)
            .nth(index)
            .map(|o| o.text().collect::<String>().trim().to_string())
            .ok_or_else(|| anyhow!("{} has no option at index {}", selector, index))?;

        self.selections
            .lock()
            .map_err(|_| anyhow!("selection log poisoned"))?
            .push(Selection {
                context: ctx,
                selector: selector.to_string(),
                index,
                label: label.clone(),
            });
        Ok(label)
    }

    fn rows_sync(
        &self,
        ctx: ContentContext,
        table_index: usize,
        row_selector: &str,
    ) -> Result<Vec<Vec<String>>> {
        let table = css("table")?;
        let row = css(row_selector)?;
        let cell = css("td")?;
        let doc = self.document(ctx)?;
        let table = doc
            .select(&table)
            .nth(table_index)
            .ok_or_else(|| anyhow!("no table at index {}", table_index))?;
        Ok(table
            .select(&row)
            .map(|r| r.select(&cell).map(|c| c.text().collect()).collect())
            .collect())
    }
}

#[async_trait]
impl ContentSource for HtmlSnapshot {
    async fn count(&self, ctx: ContentContext, selector: &str) -> Result<usize> {
        self.count_sync(ctx, selector)
    }

    async fn elements(&self, ctx: ContentContext, selector: &str) -> Result<Vec<ElementInfo>> {
        self.elements_sync(ctx, selector)
    }

    async fn select_option(
        &self,
        ctx: ContentContext,
        selector: &str,
        index: usize,
    ) -> Result<String> {
        self.select_sync(ctx, selector, index)
    }

    async fn table_rows(
        &self,
        ctx: ContentContext,
        table_index: usize,
        row_selector: &str,
    ) -> Result<Vec<Vec<String>>> {
        self.rows_sync(ctx, table_index, row_selector)
    }
}

fn css(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| anyhow!("invalid selector {:?}: {:?}", selector, e))
}

/// Hidden if the element or any ancestor carries `hidden` or an inline
/// `display:none` / `visibility:hidden`.
fn is_visible(el: ElementRef<'_>) -> bool {
    std::iter::once(*el)
        .chain(el.ancestors())
        .filter_map(|node| node.value().as_element())
        .all(|e| !hides(e))
}

fn hides(e: &Element) -> bool {
    if e.attr("hidden").is_some() {
        return true;
    }
    e.attr("style")
        .map(|style| {
            let style: String = style
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
                .to_ascii_lowercase();
            style.contains("display:none") || style.contains("visibility:hidden")
        })
        .unwrap_or(false)
}
