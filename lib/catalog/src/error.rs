use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures while building the reference catalog.
///
/// Every variant is fatal for engine start-up: a catalog that cannot be
/// loaded completely is never handed to a search.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Reference table not found: {table} ({path})")]
    MissingTable { table: &'static str, path: PathBuf },

    #[error("Reference table is empty: {0}")]
    EmptyTable(&'static str),

    #[error("Reference table {0} has no Material_Code column")]
    MissingJoinKey(&'static str),

    #[error("Reference table {table} has no {column} column")]
    MissingColumn { table: &'static str, column: &'static str },

    #[error("Duplicate material code in {table}: {code}")]
    DuplicateKey { table: &'static str, code: String },

    #[error("Malformed row {row} in {table}: {message}")]
    MalformedRow { table: &'static str, row: usize, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
