// src/schema/dataset.rs

use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::fmt;

use super::types::{column_headers, NormalizedRow, COLUMN_COUNT};

/// Date of the composition in `DD-MM-YY` form. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedDate(String);

impl ExtractedDate {
    /// Wrap an already normalized date string; `None` if it is blank.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            None
        } else {
            Some(ExtractedDate(value))
        }
    }

    /// Current local date, the fallback when no heading could be parsed.
    pub fn today() -> Self {
        Self::from_date(Local::now().date_naive())
    }

    pub fn from_date(date: NaiveDate) -> Self {
        ExtractedDate(date.format("%d-%m-%y").to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExtractedDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The harvested composition handed to the persistence sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dataset {
    date: ExtractedDate,
    rows: Vec<NormalizedRow>,
}

impl Dataset {
    pub fn new(date: ExtractedDate, rows: Vec<NormalizedRow>) -> Self {
        Self { date, rows }
    }

    /// A run that produced no rows; still carries a date.
    pub fn empty(date: ExtractedDate) -> Self {
        Self::new(date, Vec::new())
    }

    pub fn date(&self) -> &ExtractedDate {
        &self.date
    }

    pub fn rows(&self) -> &[NormalizedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> [&'static str; COLUMN_COUNT] {
        column_headers()
    }

    /// Output file name, `b3_data_{date}.parquet`.
    pub fn file_name(&self) -> String {
        format!("b3_data_{}.parquet", self.date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_formats_as_day_month_short_year() {
        let date = NaiveDate::from_ymd_opt(2025, 7, 17).unwrap();
        assert_eq!(ExtractedDate::from_date(date).as_str(), "17-07-25");
    }

    #[test]
    fn test_blank_date_is_rejected() {
        assert!(ExtractedDate::new("  ").is_none());
        assert_eq!(ExtractedDate::new("17-07-25").unwrap().as_str(), "17-07-25");
    }

    #[test]
    fn test_file_name_uses_date() {
        let ds = Dataset::empty(ExtractedDate::new("17-07-25").unwrap());
        assert_eq!(ds.file_name(), "b3_data_17-07-25.parquet");
        assert!(ds.is_empty());
    }
}
