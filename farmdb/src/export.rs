//! File exports of the full reading table. Every export returns the
//! absolute path it wrote, or `None` without creating a file when the
//! store holds no readings.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::{db::absolute_path, DatabaseError, ReadingStore, SensorReading};

pub const DEFAULT_CSV_PATH: &str = "dados_sensores.csv";
pub const DEFAULT_JSON_PATH: &str = "dados_sensores.json";
pub const DEFAULT_REPORT_PATH: &str = "relatorio_sensores.txt";

/// Column names in table declaration order
pub const CSV_HEADER: [&str; 10] = [
    "id",
    "timestamp",
    "humidity",
    "ph",
    "phosphorus_present",
    "potassium_present",
    "pump_status",
    "predicted_irrigation",
    "prediction_confidence",
    "notes",
];

const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

fn flag(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_record(reading: &SensorReading) -> String {
    [
        reading.id().to_string(),
        reading.timestamp().format(ISO_FORMAT).to_string(),
        reading.humidity().to_string(),
        reading.ph().to_string(),
        flag(reading.phosphorus_present()).to_string(),
        flag(reading.potassium_present()).to_string(),
        flag(reading.pump_status()).to_string(),
        reading
            .predicted_irrigation()
            .map(|p| flag(p).to_string())
            .unwrap_or_default(),
        reading
            .prediction_confidence()
            .map(|c| c.to_string())
            .unwrap_or_default(),
        csv_field(reading.notes()),
    ]
    .join(",")
}

fn report_row(reading: &SensorReading) -> String {
    let yes_no = |v: bool| if v { "yes" } else { "no" };
    let prediction = match (
        reading.predicted_irrigation(),
        reading.prediction_confidence(),
    ) {
        (Some(p), Some(c)) => format!("{} ({:.0}%)", yes_no(p), c * 100.0),
        (Some(p), None) => yes_no(p).to_string(),
        _ => "-".to_string(),
    };

    format!(
        "{:<6} {:<20} {:>8.1} {:>5.1} {:<3} {:<3} {:<5} {:<12} {}",
        reading.id(),
        reading.timestamp().format("%d/%m/%Y %H:%M:%S"),
        reading.humidity(),
        reading.ph(),
        if reading.phosphorus_present() { "P" } else { "-" },
        if reading.potassium_present() { "K" } else { "-" },
        if reading.pump_status() { "on" } else { "off" },
        prediction,
        reading.notes()
    )
}

impl ReadingStore {
    fn readings_for_export(
        &mut self,
        kind: &str,
    ) -> Result<Option<Vec<SensorReading>>, DatabaseError> {
        let readings = self.get_all()?;
        if readings.is_empty() {
            log::info!("No readings to export as {kind}");
            Ok(None)
        } else {
            Ok(Some(readings))
        }
    }

    fn finish_export(path: &Path, kind: &str, count: usize) -> Result<PathBuf, DatabaseError> {
        let path = absolute_path(path)?;
        log::info!("Exported {count} readings as {kind} to {}", path.display());
        Ok(path)
    }

    /// Header plus one row per reading, most recent first. Flags are
    /// written as 0/1 and missing predictions as empty fields
    pub fn export_csv<P: AsRef<Path>>(
        &mut self,
        path: P,
    ) -> Result<Option<PathBuf>, DatabaseError> {
        let Some(readings) = self.readings_for_export("csv")? else {
            return Ok(None);
        };

        let path = path.as_ref();
        let mut out = BufWriter::new(File::create(path).map_err(|e| {
            log::error!("Unable to create csv export {}: {e:}", path.display());
            e
        })?);
        writeln!(out, "{}", CSV_HEADER.join(","))?;
        for reading in &readings {
            writeln!(out, "{}", csv_record(reading))?;
        }
        out.flush()?;

        Self::finish_export(path, "csv", readings.len()).map(Some)
    }

    /// Pretty printed JSON array of every reading
    pub fn export_json<P: AsRef<Path>>(
        &mut self,
        path: P,
    ) -> Result<Option<PathBuf>, DatabaseError> {
        let Some(readings) = self.readings_for_export("json")? else {
            return Ok(None);
        };

        let path = path.as_ref();
        let mut out = BufWriter::new(File::create(path).map_err(|e| {
            log::error!("Unable to create json export {}: {e:}", path.display());
            e
        })?);
        serde_json::to_writer_pretty(&mut out, &readings)?;
        writeln!(out)?;
        out.flush()?;

        Self::finish_export(path, "json", readings.len()).map(Some)
    }

    /// Fixed width plain text report for printing
    pub fn export_report<P: AsRef<Path>>(
        &mut self,
        path: P,
    ) -> Result<Option<PathBuf>, DatabaseError> {
        let Some(readings) = self.readings_for_export("txt")? else {
            return Ok(None);
        };

        let path = path.as_ref();
        let mut out = BufWriter::new(File::create(path).map_err(|e| {
            log::error!("Unable to create report {}: {e:}", path.display());
            e
        })?);
        writeln!(out, "SOIL SENSOR READINGS REPORT")?;
        writeln!(
            out,
            "Generated at: {}\n",
            chrono::Local::now().format("%d/%m/%Y %H:%M:%S")
        )?;
        writeln!(
            out,
            "{:<6} {:<20} {:>8} {:>5} {:<3} {:<3} {:<5} {:<12} {}",
            "ID", "Timestamp", "Humidity", "pH", "P", "K", "Pump", "Prediction", "Notes"
        )?;
        writeln!(out, "{}", "-".repeat(80))?;
        for reading in &readings {
            writeln!(out, "{}", report_row(reading))?;
        }
        out.flush()?;

        Self::finish_export(path, "txt", readings.len()).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NewReading;

    struct ExportDir(PathBuf);

    impl ExportDir {
        fn new(name: &str) -> Self {
            let dir = std::env::temp_dir().join(format!("farmdb-{name}-{}", std::process::id()));
            std::fs::create_dir_all(&dir).unwrap();
            Self(dir)
        }
    }

    impl Drop for ExportDir {
        fn drop(&mut self) {
            std::fs::remove_dir_all(&self.0).ok();
        }
    }

    fn seeded_store() -> ReadingStore {
        let mut store = ReadingStore::open_in_memory().unwrap();
        store
            .insert(&NewReading::new(38.5, 6.8, true, false, true).with_prediction(true, 0.88))
            .unwrap();
        store
            .insert(
                &NewReading::new(55.0, 7.0, false, true, false)
                    .with_notes("after rain, \"light\""),
            )
            .unwrap();
        store
    }

    #[test]
    fn csv_of_empty_store_writes_nothing() {
        let dir = ExportDir::new("csv-empty");
        let path = dir.0.join(DEFAULT_CSV_PATH);
        let mut store = ReadingStore::open_in_memory().unwrap();

        assert_eq!(store.export_csv(&path).unwrap(), None);
        assert!(!path.exists());
    }

    #[test]
    fn csv_has_header_and_rows() {
        let dir = ExportDir::new("csv");
        let path = dir.0.join(DEFAULT_CSV_PATH);
        let mut store = seeded_store();

        let written = store.export_csv(&path).unwrap().expect("export path");
        assert!(written.is_absolute());

        let contents = std::fs::read_to_string(&written).unwrap();
        let lines = contents.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            concat!(
                "id,timestamp,humidity,ph,phosphorus_present,potassium_present,pump_status,",
                "predicted_irrigation,prediction_confidence,notes"
            )
        );

        let with_prediction = lines
            .iter()
            .find(|l| l.starts_with("1,"))
            .expect("row for first reading");
        assert!(with_prediction.ends_with(",38.5,6.8,1,0,1,1,0.88,"));

        let quoted = lines
            .iter()
            .find(|l| l.starts_with("2,"))
            .expect("row for second reading");
        assert!(quoted.ends_with(",55,7,0,1,0,,,\"after rain, \"\"light\"\"\""));
    }

    #[test]
    fn json_export() {
        let dir = ExportDir::new("json");
        let path = dir.0.join(DEFAULT_JSON_PATH);
        let mut store = seeded_store();

        let written = store.export_json(&path).unwrap().unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(written).unwrap()).unwrap();
        let rows = value.as_array().expect("json array");
        assert_eq!(rows.len(), 2);

        let first = rows.iter().find(|r| r["id"] == 1).unwrap();
        assert_eq!(first["prediction_confidence"], 0.88);
        assert_eq!(first["predicted_irrigation"], true);
        assert!(first["timestamp"].as_str().is_some());
    }

    #[test]
    fn report_export() {
        let dir = ExportDir::new("txt");
        let path = dir.0.join(DEFAULT_REPORT_PATH);
        let mut store = seeded_store();

        let written = store.export_report(&path).unwrap().unwrap();
        let contents = std::fs::read_to_string(written).unwrap();
        let lines = contents.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "SOIL SENSOR READINGS REPORT");
        assert!(lines[1].starts_with("Generated at: "));
        assert!(lines[3].starts_with("ID"));
        assert_eq!(lines.len(), 7);
        assert!(contents.contains("yes (88%)"));

        let mut empty = ReadingStore::open_in_memory().unwrap();
        assert_eq!(empty.export_report(dir.0.join("empty.txt")).unwrap(), None);
    }
}
