//! Command line front end for the FarmTech field monitor: imports the
//! controller's serial output into the local reading database, lets an
//! operator inspect and correct readings, and produces the CSV / JSON /
//! text exports consumed by the dashboards

pub mod cli;
pub mod config;

use farmdb::DatabaseError;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FarmMinderError {
    #[error("I/O Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Database Error: {0}")]
    DatabaseError(#[from] DatabaseError),
    #[error("Configuration Error: {0}")]
    Config(String),
    #[error("Usage Error: {0}")]
    Usage(String),
    #[error("Invalid update {0}")]
    InvalidPatch(String),
    #[error("Logging setup Error: {0}")]
    Logging(String),
}

pub type FarmMinderResult<T> = std::result::Result<T, FarmMinderError>;
