// src/store/gcs.rs

use anyhow::{Context, Result};
use async_trait::async_trait;
use google_cloud_storage::{
    client::{Client, ClientConfig},
    http::objects::upload::{Media, UploadObjectRequest, UploadType},
};
use tracing::info;

use super::{encode::dataset_to_parquet, DatasetSink};
use crate::schema::Dataset;

/// Uploads `b3_data_{date}.parquet` to a Google Cloud Storage bucket.
pub struct GcsParquetSink {
    client: Client,
    bucket: String,
    prefix: String,
}

impl GcsParquetSink {
    /// Authenticate with application default credentials.
    pub async fn new(bucket: impl Into<String>, prefix: Option<&str>) -> Result<Self> {
        let config = ClientConfig::default()
            .with_auth()
            .await
            .context("authenticating to GCS")?;
        Ok(Self {
            client: Client::new(config),
            bucket: bucket.into(),
            prefix: normalize_prefix(prefix),
        })
    }

    fn object_name(&self, dataset: &Dataset) -> String {
        format!("{}{}", self.prefix, dataset.file_name())
    }
}

#[async_trait]
impl DatasetSink for GcsParquetSink {
    async fn persist(&self, dataset: &Dataset) -> Result<String> {
        let data = dataset_to_parquet(dataset)?;
        let object_name = self.object_name(dataset);
        let size = data.len();

        let upload_type = UploadType::Simple(Media::new(object_name.clone()));
        let request = UploadObjectRequest {
            bucket: self.bucket.clone(),
            ..Default::default()
        };

        self.client
            .upload_object(&request, data, &upload_type)
            .await
            .with_context(|| {
                format!(
                    "uploading {} to GCS bucket {}",
                    object_name, self.bucket
                )
            })?;

        let location = format!("gs://{}/{}", self.bucket, object_name);
        info!(location = %location, bytes = size, "dataset uploaded");
        Ok(location)
    }
}

/// `""` stays empty; anything else ends with exactly one `/`.
fn normalize_prefix(prefix: Option<&str>) -> String {
    let prefix = prefix.unwrap_or("").trim().trim_start_matches('/');
    if prefix.is_empty() || prefix.ends_with('/') {
        prefix.to_string()
    } else {
        format!("{}/", prefix)
    }
}
