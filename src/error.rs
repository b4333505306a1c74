use thiserror::Error;

#[derive(Error, Debug)]
pub enum BenchError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Client error: {0}")]
    Client(#[from] docbench_client::ClientError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// The report destination stayed unwritable; `row` is the line that was not written.
    #[error("Report destination '{destination}' is in use after {attempts} attempts")]
    ReportContended {
        destination: String,
        attempts: u32,
        row: String,
    },
}

pub type BenchResult<T> = Result<T, BenchError>;
