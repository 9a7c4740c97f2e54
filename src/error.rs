use thiserror::Error;

#[derive(Debug, Error)]
pub enum InsightError {
    #[error("Invalid CSV format. Missing required columns.")]
    MissingColumns { missing: Vec<String> },

    #[error("Uploaded file contains no data rows.")]
    EmptyDataset,

    #[error("Multipart form is missing the `{0}` file field.")]
    MissingUploadField(String),

    #[error("num_customers must be an integer >= 1, got `{0}`")]
    InvalidCount(String),

    #[error("No data uploaded. Please upload a CSV first.")]
    NoData,

    #[error("malformed row at line {line}: {source}")]
    Malformed {
        line: u64,
        #[source]
        source: csv::Error,
    },

    #[error("non-finite value in column `{column}` at line {line}")]
    NonFinite { line: u64, column: &'static str },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("high-performer baseline for {metric} is zero")]
    DegenerateMetric { metric: &'static str },

    #[error("invalid thresholds: {0}")]
    InvalidThresholds(String),
}

impl InsightError {
    /// Whether the caller can fix the request (HTTP 4xx) as opposed to a server fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            InsightError::MissingColumns { .. }
                | InsightError::EmptyDataset
                | InsightError::MissingUploadField(_)
                | InsightError::InvalidCount(_)
                | InsightError::NoData
        )
    }
}

pub type InsightResult<T> = Result<T, InsightError>;
