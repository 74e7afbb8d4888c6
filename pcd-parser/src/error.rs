use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no input files")]
    NoInput,
    #[error("file extension is not found: {0:?}")]
    MissingExtension(PathBuf),
    #[error("unsupported extension: {0}")]
    UnsupportedExtension(String),
    #[error("multiple extensions are not supported: {0:?}")]
    MixedExtensions(Vec<String>),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Las(#[from] las::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("required attribute '{0}' is missing in CSV headers or mapping")]
    MissingColumn(String),
    #[error("failed to parse '{field}' at row {row}: {value:?}")]
    InvalidValue {
        row: usize,
        field: String,
        value: String,
    },
    #[error("tree id field '{0}' not found")]
    UnknownTreeIdField(String),
    #[error("malformed extra bytes descriptor: {0}")]
    ExtraBytes(String),
}
