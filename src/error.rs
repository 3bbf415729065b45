use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Source file, or on decode the header or data file, could not be opened.
    #[error("cannot open {}: {source}", path.display())]
    InputNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed header: {0}")]
    MalformedHeader(String),

    #[error("corrupt payload: {0}")]
    CorruptPayload(String),

    /// Input does not fit the header's signed 32-bit fields.
    #[error("input too large: {0}")]
    TooLarge(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
