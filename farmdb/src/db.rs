use std::path::{Path, PathBuf};

use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use farmp_sensor::{NutrientFormat, SensorSample};
use thiserror::Error;

use crate::{
    import::{ImportReport, SkippedLine},
    models::{NewReading, NewReadingRow, ReadingPatch, SensorReading},
    schema::sensor_readings::dsl,
};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Backing file used when the caller does not pick one
pub const DEFAULT_DATABASE_PATH: &str = "dados_agricolas.db";

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("I/O Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Sqlite connection Error: {0}")]
    Connection(#[from] diesel::ConnectionError),
    #[error("Query Error: {0}")]
    Query(#[from] diesel::result::Error),
    #[error("Migration Error: {0}")]
    Migration(String),
    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Single connection handle over the `sensor_readings` table. The
/// connection is acquired in [`ReadingStore::open`] and released when the
/// store is dropped or [`ReadingStore::close`]d
pub struct ReadingStore {
    location: String,
    conn: SqliteConnection,
}

impl ReadingStore {
    /// Open (creating if needed) the database file at `path` and make sure
    /// the reading table exists. Existing rows are left untouched
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DatabaseError> {
        let location = path.as_ref().to_string_lossy().into_owned();
        Self::establish(location)
    }

    /// Store that lives only as long as the handle, mostly for tests
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Self::establish(":memory:".to_string())
    }

    fn establish(location: String) -> Result<Self, DatabaseError> {
        let mut conn = SqliteConnection::establish(&location).map_err(|e| {
            log::error!("Unable to open database at {location}: {e:}");
            e
        })?;

        let applied = conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            log::error!("Unable to set up reading table in {location}: {e:}");
            DatabaseError::Migration(e.to_string())
        })?;
        if !applied.is_empty() {
            log::info!("Applied {} migration(s) to {location}", applied.len());
        }

        log::debug!("Reading store opened at {location}");
        Ok(Self { location, conn })
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Insert a reading stamped with the current local time, returning
    /// the id assigned by the database
    pub fn insert(&mut self, reading: &NewReading) -> Result<i32, DatabaseError> {
        let row = NewReadingRow::new(reading, chrono::Local::now().naive_local());
        let id = diesel::insert_into(dsl::sensor_readings)
            .values(&row)
            .returning(dsl::id)
            .get_result::<i32>(&mut self.conn)
            .map_err(|e| {
                log::error!("Unable to insert reading {reading:?}: {e:}");
                e
            })?;

        log::trace!("Inserted reading {id}");
        Ok(id)
    }

    /// All readings, most recent first
    pub fn get_all(&mut self) -> Result<Vec<SensorReading>, DatabaseError> {
        Ok(dsl::sensor_readings
            .order_by((dsl::timestamp.desc(), dsl::id.desc()))
            .select(SensorReading::as_select())
            .load(&mut self.conn)
            .map_err(|e| {
                log::error!("Unable to load readings: {e:}");
                e
            })?)
    }

    pub fn get_by_id(&mut self, id: i32) -> Result<Option<SensorReading>, DatabaseError> {
        Ok(dsl::sensor_readings
            .find(id)
            .select(SensorReading::as_select())
            .first(&mut self.conn)
            .optional()
            .map_err(|e| {
                log::error!("Unable to load reading {id}: {e:}");
                e
            })?)
    }

    /// Apply `patch` to reading `id`. Returns `false` without touching the
    /// database when the patch is empty, and `false` when no such reading
    /// exists
    pub fn update(&mut self, id: i32, patch: &ReadingPatch) -> Result<bool, DatabaseError> {
        if patch.is_empty() {
            log::warn!("Empty patch for reading {id}, nothing to update");
            return Ok(false);
        }

        let updated = diesel::update(dsl::sensor_readings.find(id))
            .set(patch)
            .execute(&mut self.conn)
            .map_err(|e| {
                log::error!("Unable to update reading {id}: {e:}");
                e
            })?;

        Ok(updated > 0)
    }

    pub fn delete(&mut self, id: i32) -> Result<bool, DatabaseError> {
        let deleted = diesel::delete(dsl::sensor_readings.find(id))
            .execute(&mut self.conn)
            .map_err(|e| {
                log::error!("Unable to delete reading {id}: {e:}");
                e
            })?;

        Ok(deleted > 0)
    }

    /// Import serial lines in the presence format, returning the ids of
    /// the inserted readings in input order. Malformed lines are skipped
    pub fn import_lines<I, S>(&mut self, lines: I) -> Result<Vec<i32>, DatabaseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(self.import_lines_report(lines, NutrientFormat::Presence)?.inserted)
    }

    pub fn import_lines_with<I, S>(
        &mut self,
        lines: I,
        format: NutrientFormat,
    ) -> Result<Vec<i32>, DatabaseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(self.import_lines_report(lines, format)?.inserted)
    }

    /// Best effort import: a line that fails to parse (including a
    /// non-finite humidity or pH) is logged and recorded in the report,
    /// and the batch carries on. Only a failing insert aborts the import
    pub fn import_lines_report<I, S>(
        &mut self,
        lines: I,
        format: NutrientFormat,
    ) -> Result<ImportReport, DatabaseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut report = ImportReport::default();

        for (idx, line) in lines.into_iter().enumerate() {
            let line = line.as_ref();
            let line_no = idx + 1;
            match SensorSample::parse_line(line, format) {
                Ok(sample) => {
                    let id = self.insert(&NewReading::from(sample))?;
                    report.inserted.push(id);
                }
                Err(reason) => {
                    log::warn!("Skipping serial line {line_no} {line:?}: {reason}");
                    report.skipped.push(SkippedLine {
                        line_no,
                        line: line.to_string(),
                        reason,
                    });
                }
            }
        }

        log::info!(
            "Serial import finished: {} inserted, {} skipped",
            report.inserted.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    /// Release the connection explicitly
    pub fn close(self) {}
}

impl Drop for ReadingStore {
    fn drop(&mut self) {
        log::debug!("Closing reading store at {}", self.location);
    }
}

/// Absolute form of `path`, relative paths resolve against the working
/// directory
pub(crate) fn absolute_path(path: &Path) -> Result<PathBuf, DatabaseError> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
