pub mod arrow;
pub mod dataset;
pub mod types;

pub use self::arrow::{build_arrow_schema, dataset_to_batch};
pub use dataset::{Dataset, ExtractedDate};
pub use types::{column_headers, Column, NormalizedRow, COLUMN_COUNT, DAY_COLUMN};
