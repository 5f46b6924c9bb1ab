// src/store/encode.rs

use anyhow::{Context, Result};
use parquet::{arrow::ArrowWriter, basic::Compression, file::properties::WriterProperties};
use std::io::Write;

use crate::schema::{build_arrow_schema, dataset_to_batch, Dataset};

/// Serialize `dataset` as SNAPPY-compressed Parquet into `sink`.
///
/// A dataset without rows still produces a valid file carrying the schema.
pub fn write_dataset<W: Write + Send>(dataset: &Dataset, sink: W) -> Result<()> {
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();

    let mut writer = ArrowWriter::try_new(sink, build_arrow_schema(), Some(props))
        .context("creating parquet writer")?;
    if !dataset.is_empty() {
        let batch = dataset_to_batch(dataset)?;
        writer.write(&batch).context("writing batch to parquet")?;
    }
    writer.close().context("closing parquet writer")?;
    Ok(())
}

/// [`write_dataset`] into memory, for uploads.
pub fn dataset_to_parquet(dataset: &Dataset) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    write_dataset(dataset, &mut buffer)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ExtractedDate, NormalizedRow};
    use arrow::{array::StringArray, record_batch::RecordBatch};
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use std::fs::File;
    use tempfile::tempdir;

    fn write_and_reopen(ds: &Dataset) -> ParquetRecordBatchReaderBuilder<File> {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join(ds.file_name());
        std::fs::write(&path, dataset_to_parquet(ds).unwrap()).unwrap();
        ParquetRecordBatchReaderBuilder::try_new(File::open(&path).unwrap()).unwrap()
    }

    #[test]
    fn test_round_trips_rows_and_day() {
        let row = NormalizedRow::from_raw(vec!["Financeiro".into(), "ITUB4".into()]);
        let ds = Dataset::new(ExtractedDate::new("17-07-25").unwrap(), vec![row]);
        let batches: Vec<RecordBatch> = write_and_reopen(&ds)
            .build()
            .unwrap()
            .collect::<std::result::Result<_, _>>()
            .unwrap();
        let total: usize = batches.iter().map(|b| b.num_rows()).sum();
        assert_eq!(total, 1);

        let batch = &batches[0];
        let day_idx = batch.schema().index_of("Dia").unwrap();
        let day = batch
            .column(day_idx)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(day.value(0), "17-07-25");
    }

    #[test]
    fn test_empty_dataset_is_valid_parquet() {
        let ds = Dataset::empty(ExtractedDate::new("17-07-25").unwrap());
        let builder = write_and_reopen(&ds);
        assert_eq!(builder.schema().fields().len(), 8);
        assert_eq!(builder.metadata().file_metadata().num_rows(), 0);
    }
}
