// src/schema/arrow.rs

use anyhow::{Context, Result};
use arrow::{
    array::{ArrayRef, StringArray},
    datatypes::{DataType, Field as ArrowField, Schema as ArrowSchema},
    record_batch::RecordBatch,
};
use std::sync::Arc;

use super::{
    dataset::Dataset,
    types::{Column, DAY_COLUMN},
};

/// Arrow schema of the output file: the seven page columns followed by `Dia`.
///
/// All columns are kept as text; the page formats numbers with Brazilian
/// separators (`1.234,56`) and downstream consumers parse them.
pub fn build_arrow_schema() -> Arc<ArrowSchema> {
    let fields: Vec<ArrowField> = Column::ALL
        .iter()
        .map(|col| col.header())
        .chain(std::iter::once(DAY_COLUMN))
        .map(|name| ArrowField::new(name, DataType::Utf8, false))
        .collect();

    Arc::new(ArrowSchema::new(fields))
}

/// Build a single record batch holding every row of `dataset`.
pub fn dataset_to_batch(dataset: &Dataset) -> Result<RecordBatch> {
    let schema = build_arrow_schema();

    let mut columns: Vec<ArrayRef> = Column::ALL
        .iter()
        .map(|&col| {
            let values: StringArray = dataset.rows().iter().map(|r| Some(r.get(col))).collect();
            Arc::new(values) as ArrayRef
        })
        .collect();

    let day = StringArray::from(vec![dataset.date().as_str(); dataset.len()]);
    columns.push(Arc::new(day) as ArrayRef);

    RecordBatch::try_new(schema, columns).context("building dataset record batch")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ExtractedDate, NormalizedRow};

    #[test]
    fn test_schema_appends_day_column() {
        let schema = build_arrow_schema();
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        assert_eq!(names.len(), 8);
        assert_eq!(names[0], "Setor");
        assert_eq!(names[7], "Dia");
    }

    #[test]
    fn test_batch_carries_rows_and_date() {
        let row = NormalizedRow::from_raw(vec!["Financeiro".into(), "ITUB4".into()]);
        let ds = Dataset::new(ExtractedDate::new("17-07-25").unwrap(), vec![row.clone(), row]);
        let batch = dataset_to_batch(&ds).unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), 8);

        let code = batch
            .column(1)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(code.value(0), "ITUB4");
        let day = batch
            .column(7)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(day.value(1), "17-07-25");
    }

    #[test]
    fn test_empty_dataset_builds_empty_batch() {
        let ds = Dataset::empty(ExtractedDate::new("17-07-25").unwrap());
        let batch = dataset_to_batch(&ds).unwrap();
        assert_eq!(batch.num_rows(), 0);
        assert_eq!(batch.num_columns(), 8);
    }
}
