//! Error types for pext-seed

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SeedError {
    #[error("Malformed seed dataset: {message}")]
    Malformed { message: String },

    #[error("IO error")]
    Io(#[from] io::Error),
}

/// Result type with SeedError
pub type SeedResult<T> = Result<T, SeedError>;
