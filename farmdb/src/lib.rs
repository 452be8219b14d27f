//! The `farmdb` crate defines the local database for the FarmTech field
//! monitor. A single SQLite file holds one table of soil readings,
//! maintained through [`ReadingStore`], which does the following:
//!    1. Record readings, either inserted directly by a caller (e.g. one
//!       that also carries an irrigation model prediction) or imported in
//!       bulk from the serial lines printed by the field controller. Lines
//!       that fail to parse are skipped and reported, never fatal
//!    2. Serve readings back by id or as a full history, most recent first
//!    3. Patch or delete individual readings
//!    4. Export the table as CSV, JSON or a plain text report
//!
//! # Examples
//! ```no_run
//! use farmdb::{NewReading, ReadingStore, DEFAULT_CSV_PATH, DEFAULT_DATABASE_PATH};
//!
//! fn main() -> Result<(), farmdb::DatabaseError> {
//!     let mut store = ReadingStore::open(DEFAULT_DATABASE_PATH)?;
//!     store.import_lines(["40.0,6.5,SIM,NAO,0", "35.5,7.1,NAO,SIM,1,manual note"])?;
//!     store.insert(&NewReading::new(38.5, 6.8, true, false, true).with_prediction(true, 0.88))?;
//!
//!     if let Some(path) = store.export_csv(DEFAULT_CSV_PATH)? {
//!         log::info!("Exported to {}", path.display());
//!     }
//!     Ok(())
//! }
//! ```

mod db;
mod export;
mod import;
mod models;
mod schema;

pub use db::{DatabaseError, ReadingStore, DEFAULT_DATABASE_PATH};
pub use export::{CSV_HEADER, DEFAULT_CSV_PATH, DEFAULT_JSON_PATH, DEFAULT_REPORT_PATH};
pub use import::{ImportReport, SkippedLine};
pub use models::{NewReading, ReadingPatch, SensorReading};

pub use farmp_sensor::{NutrientFormat, SensorSample, SerialParseError};
