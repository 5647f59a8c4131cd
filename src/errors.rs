use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("IO error reading data file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("CSV error in {input} input: {source}")]
    Csv {
        input: &'static str,
        #[source]
        source: csv::Error,
    },
    #[error("Required column '{column}' not found in {input} input headers")]
    MissingColumn {
        input: &'static str,
        column: String,
    },
    #[error("Timestamp parsing error in {input} input at row {row} for value '{value}': {reason}")]
    Timestamp {
        input: &'static str,
        row: usize,
        value: String,
        reason: String,
    },
    #[error("Value parsing error in {input} input at row {row} for column '{column}', value '{value}'")]
    Value {
        input: &'static str,
        row: usize,
        column: String,
        value: String,
    },
    #[error("DataFrame operation failed: {0}")]
    Frame(#[from] polars::error::PolarsError),
    #[error("{stage} left zero rows")]
    EmptyResult { stage: &'static str },
}
