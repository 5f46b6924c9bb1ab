// src/error.rs

use thiserror::Error;

/// Failures that end a run. Everything else inside extraction degrades to an
/// empty or default contribution and is only logged.
#[derive(Debug, Error)]
pub enum RunError {
    /// The browser could not be started.
    #[error("browser launch failed: {0:#}")]
    Launch(#[source] anyhow::Error),

    /// The dataset could not be written to its target.
    #[error("persisting dataset failed: {0:#}")]
    Persist(#[source] anyhow::Error),
}
