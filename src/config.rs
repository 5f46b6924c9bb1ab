// src/config.rs

use anyhow::{bail, Context, Result};
use std::{env, path::PathBuf, time::Duration};
use url::Url;

/// Daily IBOV composition page.
pub const DEFAULT_SOURCE_URL: &str =
    "https://sistemaswebb3-listados.b3.com.br/indexPage/day/IBOV?language=pt-br";

/// Local output directory used when no bucket is configured.
pub const DEFAULT_OUTPUT_DIR: &str = "data";

/// Fixed waits standing in for "the page finished re-rendering".
///
/// The portal fills its table from background requests after navigation and
/// after every dropdown change, and nothing observable from outside the
/// renderer signals completion. These windows were sized by hand against the
/// live page. Too short and the harvest sees a stale or partial table, so
/// runs on a slow network can come back short. Test sources with
/// deterministic content use [`SettleDelays::none`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettleDelays {
    /// After navigation, before the content context is probed.
    pub after_navigation: Duration,
    /// After choosing the sector grouping.
    pub after_segment: Duration,
    /// After choosing the "all rows" page size; the full table is the slowest render.
    pub after_page_size: Duration,
    /// Final wait before the table is read.
    pub before_harvest: Duration,
}

impl Default for SettleDelays {
    fn default() -> Self {
        Self {
            after_navigation: Duration::from_millis(3000),
            after_segment: Duration::from_millis(2000),
            after_page_size: Duration::from_millis(3000),
            before_harvest: Duration::from_millis(3000),
        }
    }
}

impl SettleDelays {
    pub fn none() -> Self {
        Self {
            after_navigation: Duration::ZERO,
            after_segment: Duration::ZERO,
            after_page_size: Duration::ZERO,
            before_harvest: Duration::ZERO,
        }
    }

    /// Defaults, overridden per field by `B3_SETTLE_*_MS` variables.
    pub fn from_env() -> Result<Self> {
        let d = Self::default();
        Ok(Self {
            after_navigation: env_millis("B3_SETTLE_NAVIGATION_MS", d.after_navigation)?,
            after_segment: env_millis("B3_SETTLE_SEGMENT_MS", d.after_segment)?,
            after_page_size: env_millis("B3_SETTLE_PAGE_SIZE_MS", d.after_page_size)?,
            before_harvest: env_millis("B3_SETTLE_HARVEST_MS", d.before_harvest)?,
        })
    }
}

fn env_millis(key: &str, default: Duration) -> Result<Duration> {
    match env::var(key) {
        Ok(v) => {
            let ms: u64 = v
                .trim()
                .parse()
                .with_context(|| format!("parsing {}={:?} as milliseconds", key, v))?;
            Ok(Duration::from_millis(ms))
        }
        Err(_) => Ok(default),
    }
}

/// How Chromium is started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserOptions {
    pub headless: bool,
    /// Explicit browser binary; otherwise chromiumoxide searches the usual locations.
    pub chrome_executable: Option<PathBuf>,
    pub launch_timeout: Duration,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_executable: env::var_os("CHROME_PATH").map(PathBuf::from),
            launch_timeout: Duration::from_secs(30),
        }
    }
}

/// Everything one extraction run needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeConfig {
    pub url: String,
    pub delays: SettleDelays,
    pub browser: BrowserOptions,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SOURCE_URL.to_string(),
            delays: SettleDelays::default(),
            browser: BrowserOptions::default(),
        }
    }
}

impl ScrapeConfig {
    /// Defaults with settle delays taken from the environment.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            delays: SettleDelays::from_env()?,
            ..Self::default()
        })
    }

    /// Point the run at another page. Only absolute http(s) URLs are accepted.
    pub fn with_url(mut self, raw: &str) -> Result<Self> {
        let parsed = Url::parse(raw).with_context(|| format!("invalid source url {:?}", raw))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!("source url must be http or https, got {}", parsed.scheme());
        }
        self.url = parsed.into();
        Ok(self)
    }
}

/// Where the dataset is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkTarget {
    Local { dir: PathBuf },
    Gcs { bucket: String, prefix: Option<String> },
}

impl SinkTarget {
    /// A bucket wins over a local directory; a blank bucket counts as unset.
    pub fn select(bucket: Option<String>, prefix: Option<String>, dir: Option<PathBuf>) -> Self {
        match bucket.filter(|b| !b.trim().is_empty()) {
            Some(bucket) => SinkTarget::Gcs { bucket, prefix },
            None => SinkTarget::Local {
                dir: dir.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            },
        }
    }

    /// `GCS_BUCKET` / `GCS_PREFIX` / `OUTPUT_DIR`.
    pub fn from_env() -> Self {
        Self::select(
            env::var("GCS_BUCKET").ok(),
            env::var("GCS_PREFIX").ok(),
            env::var_os("OUTPUT_DIR").map(PathBuf::from),
        )
    }
}
