//! Custom error types for the I/O module.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IoError {
    #[error("Dump file of {found} bytes exceeds the maximum allowed size of {limit} bytes.")]
    FileTooLarge { limit: u64, found: u64 },

    #[error("Dump file is empty.")]
    Empty,

    #[error("An underlying I/O error occurred: {0}")]
    StdIo(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, IoError>;
