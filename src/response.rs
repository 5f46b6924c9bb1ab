// src/response.rs

use serde::Serialize;
use serde_json::{Map, Value};

use crate::{
    error::RunError,
    schema::{Column, Dataset, DAY_COLUMN},
    scrape::RunSummary,
};

/// Rows echoed back in a success response.
pub const DEFAULT_SAMPLE_ROWS: usize = 5;

/// Request/response shape returned to whatever invoked the run.
#[derive(Debug, Clone, Serialize)]
pub struct InvocationResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: ResponseBody,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Success {
        message: String,
        count: usize,
        date: String,
        location: String,
        data: Vec<Map<String, Value>>,
    },
    Failure {
        error: String,
    },
}

impl InvocationResponse {
    /// 200 with the row count and the first `sample` rows; a run with zero
    /// rows is still a success.
    pub fn success(dataset: &Dataset, summary: &RunSummary, sample: usize) -> Self {
        let message = if dataset.is_empty() {
            "Run finished: no rows available".to_string()
        } else {
            format!("Extracted {} rows", dataset.len())
        };
        Self {
            status_code: 200,
            body: ResponseBody::Success {
                message,
                count: dataset.len(),
                date: dataset.date().to_string(),
                location: summary.location.clone(),
                data: sample_records(dataset, sample),
            },
        }
    }

    /// 500 carrying the error message.
    pub fn failure(err: &RunError) -> Self {
        Self {
            status_code: 500,
            body: ResponseBody::Failure {
                error: err.to_string(),
            },
        }
    }

    pub fn from_outcome(outcome: &Result<(Dataset, RunSummary), RunError>, sample: usize) -> Self {
        match outcome {
            Ok((dataset, summary)) => Self::success(dataset, summary, sample),
            Err(e) => Self::failure(e),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}

/// First `limit` rows as header-keyed records, each with its `Dia`.
pub fn sample_records(dataset: &Dataset, limit: usize) -> Vec<Map<String, Value>> {
    dataset
        .rows()
        .iter()
        .take(limit)
        .map(|row| {
            let mut record: Map<String, Value> = Column::ALL
                .iter()
                .map(|&c| (c.header().to_string(), Value::from(row.get(c))))
                .collect();
            record.insert(DAY_COLUMN.to_string(), Value::from(dataset.date().as_str()));
            record
        })
        .collect()
}
