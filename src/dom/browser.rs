// src/dom/browser.rs

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chromiumoxide::{
    browser::{Browser, BrowserConfig},
    cdp::js_protocol::runtime::EvaluateParams,
    page::Page,
};
use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{ContentContext, ContentSource, ElementInfo};
use crate::config::BrowserOptions;

/// Flags of the container deployment: no sandbox or GPU, small /dev/shm,
/// and cross-origin iframe documents readable from the top frame.
const LAUNCH_ARGS: &[&str] = &[
    "--disable-dev-shm-usage",
    "--disable-gpu",
    "--disable-web-security",
    "--disable-features=VizDisplayCompositor",
];

/// A headless Chromium with one open page and a private profile directory.
///
/// The profile directory belongs to this session alone. [`close`] shuts the
/// browser down and removes it; if the session is dropped without `close`
/// (panic, task abort) the browser process is killed and the directory is
/// still removed.
///
/// [`close`]: BrowserSession::close
pub struct BrowserSession {
    browser: Browser,
    page: LivePage,
    handler: JoinHandle<()>,
    profile: Option<TempDir>,
}

impl BrowserSession {
    /// Start Chromium. The only failure in a run that is fatal before persistence.
    pub async fn launch(opts: &BrowserOptions) -> Result<Self> {
        let profile = tempfile::Builder::new()
            .prefix("ibovscraper-profile-")
            .tempdir()
            .context("creating temporary browser profile")?;
        info!(profile = %profile.path().display(), headless = opts.headless, "launching browser");

        let mut builder = BrowserConfig::builder()
            .user_data_dir(profile.path())
            .no_sandbox()
            .launch_timeout(opts.launch_timeout);
        for arg in LAUNCH_ARGS {
            builder = builder.arg(*arg);
        }
        if !opts.headless {
            builder = builder.with_head();
        }
        if let Some(exe) = &opts.chrome_executable {
            builder = builder.chrome_executable(exe);
        }
        let config = builder
            .build()
            .map_err(|e| anyhow!("building browser config: {}", e))?;

        let (mut browser, mut events) = Browser::launch(config)
            .await
            .context("launching chromium")?;

        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if let Err(e) = event {
                    debug!("browser handler event error: {}", e);
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                shutdown(&mut browser).await;
                handler.abort();
                return Err(e).context("opening browser page");
            }
        };

        Ok(Self {
            browser,
            page: LivePage { page },
            handler,
            profile: Some(profile),
        })
    }

    /// Navigate to `url`, then wait `settle` for client-side rendering.
    pub async fn open(&self, url: &str, settle: Duration) -> Result<()> {
        info!(url, "navigating");
        self.page
            .page
            .goto(url)
            .await
            .with_context(|| format!("navigating to {}", url))?;
        if !settle.is_zero() {
            tokio::time::sleep(settle).await;
        }
        info!("page loaded");
        Ok(())
    }

    /// The open page, as a query root for the extraction steps.
    pub fn page(&self) -> &LivePage {
        &self.page
    }

    /// Shut the browser down and remove the profile directory. Never fails;
    /// problems are logged.
    pub async fn close(mut self) {
        shutdown(&mut self.browser).await;
        self.handler.abort();
        if let Some(profile) = self.profile.take() {
            let path = profile.path().to_path_buf();
            match profile.close() {
                Ok(()) => debug!(profile = %path.display(), "removed browser profile"),
                Err(e) => warn!(profile = %path.display(), "removing browser profile: {}", e),
            }
        }
        info!("browser closed");
    }
}

/// Ask Chromium to exit and reap the process. A browser that refuses the
/// close command is killed before waiting on it.
async fn shutdown(browser: &mut Browser) {
    if let Err(e) = browser.close().await {
        warn!("closing browser, killing process instead: {}", e);
        match browser.kill().await {
            Some(Err(e)) => warn!("killing browser: {}", e),
            Some(Ok(())) => debug!("browser process killed"),
            None => debug!("no browser child process to kill"),
        }
    }
    if let Err(e) = browser.wait().await {
        warn!("waiting for browser exit: {}", e);
    }
}

/// Serializes tests that launch browsers and inspect profile directories.
#[cfg(test)]
pub(crate) static LAUNCH_TEST_LOCK: tokio::sync::Mutex<()> = tokio::sync::Mutex::const_new(());

impl Drop for BrowserSession {
    fn drop(&mut self) {
        // `Browser` kills its child process on drop; the profile `TempDir`
        // is removed when its field drops after this.
        self.handler.abort();
    }
}

/// A live page answering [`ContentSource`] queries through script evaluation.
pub struct LivePage {
    page: Page,
}

impl LivePage {
    async fn eval<T: DeserializeOwned>(&self, script: String) -> Result<T> {
        self.page
            .evaluate_expression(EvaluateParams::new(script))
            .await
            .context("evaluating page script")?
            .into_value::<T>()
            .context("decoding page script result")
    }
}

#[async_trait]
impl ContentSource for LivePage {
    async fn count(&self, ctx: ContentContext, selector: &str) -> Result<usize> {
        let script = format!(
            "(() => {{ const root = {}; return root.querySelectorAll({}).length; }})()",
            scope_expr(ctx),
            js_str(selector)?
        );
        self.eval(script).await
    }

    async fn elements(&self, ctx: ContentContext, selector: &str) -> Result<Vec<ElementInfo>> {
        let script = format!(
            r#"(() => {{
                const root = {};
                return Array.from(root.querySelectorAll({})).map(el => {{
                    const view = el.ownerDocument.defaultView;
                    const style = view ? view.getComputedStyle(el) : null;
                    const visible = !!style
                        && style.display !== 'none'
                        && style.visibility !== 'hidden'
                        && el.getClientRects().length > 0;
                    return {{ visible, text: el.textContent || '' }};
                }});
            }})()"#,
            scope_expr(ctx),
            js_str(selector)?
        );
        self.eval(script).await
    }

    async fn select_option(
        &self,
        ctx: ContentContext,
        selector: &str,
        index: usize,
    ) -> Result<String> {
        let script = format!(
            r#"(() => {{
                const root = {scope};
                const el = root.querySelector({sel});
                if (!el) throw new Error('no element matches ' + {sel});
                if (!el.options || {index} >= el.options.length)
                    throw new Error('no option at index {index}');
                el.selectedIndex = {index};
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return (el.options[{index}].textContent || '').trim();
            }})()"#,
            scope = scope_expr(ctx),
            sel = js_str(selector)?,
            index = index
        );
        self.eval(script).await
    }

    async fn table_rows(
        &self,
        ctx: ContentContext,
        table_index: usize,
        row_selector: &str,
    ) -> Result<Vec<Vec<String>>> {
        let script = format!(
            r#"(() => {{
                const root = {scope};
                const table = root.querySelectorAll('table')[{table_index}];
                if (!table) throw new Error('no table at index {table_index}');
                return Array.from(table.querySelectorAll({sel})).map(row =>
                    Array.from(row.querySelectorAll('td')).map(td => td.textContent || ''));
            }})()"#,
            scope = scope_expr(ctx),
            sel = js_str(row_selector)?,
            table_index = table_index
        );
        self.eval(script).await
    }
}

/// Script expression yielding the document for `ctx`. Throws if the iframe
/// is missing or its document is not reachable.
fn scope_expr(ctx: ContentContext) -> String {
    match ctx {
        ContentContext::MainDocument => "document".to_string(),
        ContentContext::Iframe(n) => format!(
            "(() => {{ const f = document.querySelectorAll('iframe')[{n}]; \
             if (!f || !f.contentDocument) throw new Error('iframe {n} not accessible'); \
             return f.contentDocument; }})()",
            n = n
        ),
    }
}

fn js_str(value: &str) -> Result<String> {
    serde_json::to_string(value).context("quoting selector for script")
}
