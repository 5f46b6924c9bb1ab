// src/store/mod.rs

use anyhow::Result;
use async_trait::async_trait;

use crate::{config::SinkTarget, schema::Dataset};

pub mod encode;
pub mod gcs;
pub mod local;

pub use encode::{dataset_to_parquet, write_dataset};
pub use gcs::GcsParquetSink;
pub use local::LocalParquetSink;

/// Durable storage for a finished dataset.
#[async_trait]
pub trait DatasetSink: Send + Sync {
    /// Write `dataset` and return where it went. An empty dataset is written
    /// like any other.
    async fn persist(&self, dataset: &Dataset) -> Result<String>;
}

/// Build the sink for `target`. Authenticating to the object store happens here.
pub async fn open_sink(target: &SinkTarget) -> Result<Box<dyn DatasetSink>> {
    Ok(match target {
        SinkTarget::Local { dir } => Box::new(LocalParquetSink::new(dir)),
        SinkTarget::Gcs { bucket, prefix } => {
            Box::new(GcsParquetSink::new(bucket.as_str(), prefix.as_deref()).await?)
        }
    })
}
