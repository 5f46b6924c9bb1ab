// src/store/local.rs

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{info, warn};

use super::{encode::write_dataset, DatasetSink};
use crate::schema::Dataset;

/// Writes `b3_data_{date}.parquet` into a local directory.
#[derive(Debug, Clone)]
pub struct LocalParquetSink {
    dir: PathBuf,
}

impl LocalParquetSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write to a hidden temp file, then rename over the target, so a failed
    /// run never leaves a truncated file under the real name.
    fn write(&self, dataset: &Dataset) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating output directory {}", self.dir.display()))?;

        let file_name = dataset.file_name();
        let path = self.dir.join(&file_name);
        let tmp_path = self.dir.join(format!(".{}.tmp", file_name));

        let tmp = fs::File::create(&tmp_path)
            .with_context(|| format!("creating {}", tmp_path.display()))?;
        if let Err(e) = write_dataset(dataset, tmp) {
            if let Err(cleanup) = fs::remove_file(&tmp_path) {
                warn!(path = %tmp_path.display(), "removing temp file: {}", cleanup);
            }
            return Err(e);
        }

        if let Err(e) = fs::rename(&tmp_path, &path) {
            if let Err(cleanup) = fs::remove_file(&tmp_path) {
                warn!(path = %tmp_path.display(), "removing temp file: {}", cleanup);
            }
            return Err(e).with_context(|| {
                format!("renaming {} -> {}", tmp_path.display(), path.display())
            });
        }
        Ok(path)
    }
}

#[async_trait]
impl DatasetSink for LocalParquetSink {
    async fn persist(&self, dataset: &Dataset) -> Result<String> {
        let sink = self.clone();
        let dataset = dataset.clone();
        let path = tokio::task::spawn_blocking(move || sink.write(&dataset))
            .await
            .context("parquet writer task panicked")??;
        info!(path = %path.display(), "dataset written");
        Ok(path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ExtractedDate, NormalizedRow};
    use tempfile::tempdir;

    fn dataset(rows: usize) -> Dataset {
        let row = NormalizedRow::from_raw(vec!["Financeiro".into(), "ITUB4".into()]);
        Dataset::new(ExtractedDate::new("17-07-25").unwrap(), vec![row; rows])
    }

    #[tokio::test]
    async fn test_writes_named_file() {
        let tmp = tempdir().unwrap();
        let out = tmp.path().join("data");
        let sink = LocalParquetSink::new(&out);

        let location = sink.persist(&dataset(3)).await.unwrap();
        let expected = out.join("b3_data_17-07-25.parquet");
        assert_eq!(location, expected.display().to_string());
        assert!(expected.exists());

        // no temp file left behind
        let names: Vec<_> = fs::read_dir(&out)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["b3_data_17-07-25.parquet".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_dataset_still_persists() {
        let tmp = tempdir().unwrap();
        let sink = LocalParquetSink::new(tmp.path());
        let location = sink.persist(&dataset(0)).await.unwrap();
        assert!(Path::new(&location).exists());
    }

    #[tokio::test]
    async fn test_unwritable_target_fails() {
        let tmp = tempdir().unwrap();
        let blocker = tmp.path().join("not-a-dir");
        fs::write(&blocker, b"file").unwrap();
        let sink = LocalParquetSink::new(&blocker);
        assert!(sink.persist(&dataset(1)).await.is_err());
    }

    #[tokio::test]
    async fn test_failed_rename_removes_temp_file() {
        let tmp = tempdir().unwrap();
        // a non-empty directory under the target name makes the rename fail
        let taken = tmp.path().join("b3_data_17-07-25.parquet");
        fs::create_dir(&taken).unwrap();
        fs::write(taken.join("keep"), b"x").unwrap();

        let sink = LocalParquetSink::new(tmp.path());
        let err = sink.persist(&dataset(2)).await.unwrap_err();
        assert!(format!("{:#}", err).contains("renaming"));

        let names: Vec<_> = fs::read_dir(tmp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["b3_data_17-07-25.parquet".to_string()]);
        assert!(taken.join("keep").exists());
    }
}
