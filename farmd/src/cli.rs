use std::{
    fs::File,
    io::{BufRead, BufReader, Write},
    path::PathBuf,
};

use farmdb::{ImportReport, ReadingPatch, ReadingStore, SensorReading};
use farmp_sensor::simulate_lines;

use crate::{config::Config, FarmMinderError, FarmMinderResult};

pub const USAGE: &str = "\
usage: farm-minder <command>

commands:
  import <file|->                      import serial lines from a file or stdin
  simulate [count]                     import simulated serial lines (default 10)
  list                                 print every reading, most recent first
  get <id>                             print one reading
  update <id> <field>=<value>...       patch a reading
  delete <id>                          delete a reading
  export <csv|json|txt> [path]         export every reading

patchable fields: humidity, ph, phosphorus_present, potassium_present,
pump_status, predicted_irrigation, prediction_confidence, notes
(`null` clears predicted_irrigation / prediction_confidence)";

const DEFAULT_SIMULATED_LINES: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub enum ImportSource {
    Stdin,
    File(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExportKind {
    Csv,
    Json,
    Txt,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Import(ImportSource),
    Simulate(usize),
    List,
    Get(i32),
    Update(i32, ReadingPatch),
    Delete(i32),
    Export(ExportKind, Option<PathBuf>),
    Help,
}

fn usage(msg: impl Into<String>) -> FarmMinderError {
    FarmMinderError::Usage(msg.into())
}

fn parse_id(arg: Option<String>) -> FarmMinderResult<i32> {
    let arg = arg.ok_or_else(|| usage("missing reading id"))?;
    arg.parse()
        .map_err(|_| usage(format!("{arg:?} is not a reading id")))
}

fn parse_flag(field: &str, value: &str) -> FarmMinderResult<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "sim" => Ok(true),
        "0" | "false" | "nao" => Ok(false),
        _ => Err(FarmMinderError::InvalidPatch(format!(
            "{field}: {value:?} is not a flag"
        ))),
    }
}

fn parse_number(field: &str, value: &str) -> FarmMinderResult<f64> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| {
            FarmMinderError::InvalidPatch(format!("{field}: {value:?} is not a number"))
        })
}

fn nullable<T>(
    value: &str,
    parse: impl FnOnce(&str) -> FarmMinderResult<T>,
) -> FarmMinderResult<Option<T>> {
    if value.eq_ignore_ascii_case("null") {
        Ok(None)
    } else {
        parse(value).map(Some)
    }
}

/// Apply one `field=value` assignment to `patch`. Unknown fields,
/// including `id` and `timestamp`, are rejected
pub fn apply_assignment(patch: &mut ReadingPatch, assignment: &str) -> FarmMinderResult<()> {
    let (field, value) = assignment.split_once('=').ok_or_else(|| {
        FarmMinderError::InvalidPatch(format!("{assignment:?} is not of the form field=value"))
    })?;
    let (field, value) = (field.trim(), value.trim());

    match field {
        "humidity" => patch.humidity = Some(parse_number(field, value)?),
        "ph" => patch.ph = Some(parse_number(field, value)?),
        "phosphorus_present" => patch.phosphorus_present = Some(parse_flag(field, value)?),
        "potassium_present" => patch.potassium_present = Some(parse_flag(field, value)?),
        "pump_status" => patch.pump_status = Some(parse_flag(field, value)?),
        "predicted_irrigation" => {
            patch.predicted_irrigation = Some(nullable(value, |v| parse_flag(field, v))?)
        }
        "prediction_confidence" => {
            patch.prediction_confidence = Some(nullable(value, |v| parse_number(field, v))?)
        }
        "notes" => patch.notes = Some(value.to_string()),
        "id" | "timestamp" => {
            return Err(FarmMinderError::InvalidPatch(format!(
                "{field} is assigned by the store and cannot be changed"
            )))
        }
        _ => {
            return Err(FarmMinderError::InvalidPatch(format!(
                "unknown field {field:?}"
            )))
        }
    }
    Ok(())
}

impl Command {
    /// Parse the arguments following the program name
    pub fn parse<I: IntoIterator<Item = String>>(args: I) -> FarmMinderResult<Self> {
        let mut args = args.into_iter();
        let Some(cmd) = args.next() else {
            return Ok(Command::Help);
        };

        let command = match cmd.as_str() {
            "import" => match args.next().as_deref() {
                Some("-") => Command::Import(ImportSource::Stdin),
                Some(path) => Command::Import(ImportSource::File(path.into())),
                None => return Err(usage("import needs a file, or - for stdin")),
            },
            "simulate" => {
                let count = match args.next() {
                    Some(n) => n
                        .parse()
                        .map_err(|_| usage(format!("{n:?} is not a line count")))?,
                    None => DEFAULT_SIMULATED_LINES,
                };
                Command::Simulate(count)
            }
            "list" => Command::List,
            "get" => Command::Get(parse_id(args.next())?),
            "delete" => Command::Delete(parse_id(args.next())?),
            "update" => {
                let id = parse_id(args.next())?;
                let mut patch = ReadingPatch::default();
                for assignment in args.by_ref() {
                    apply_assignment(&mut patch, &assignment)?;
                }
                if patch.is_empty() {
                    return Err(usage("update needs at least one field=value"));
                }
                Command::Update(id, patch)
            }
            "export" => {
                let kind = match args.next().as_deref() {
                    Some("csv") => ExportKind::Csv,
                    Some("json") => ExportKind::Json,
                    Some("txt") => ExportKind::Txt,
                    other => {
                        return Err(usage(format!(
                            "export format must be csv, json or txt, got {other:?}"
                        )))
                    }
                };
                Command::Export(kind, args.next().map(PathBuf::from))
            }
            "help" | "-h" | "--help" => Command::Help,
            other => return Err(usage(format!("unknown command {other:?}"))),
        };

        if let Some(extra) = args.next() {
            return Err(usage(format!("unexpected argument {extra:?}")));
        }
        Ok(command)
    }

    /// Whether running the command touches the reading store at all
    pub fn needs_store(&self) -> bool {
        !matches!(self, Command::Help)
    }
}

fn describe(reading: &SensorReading) -> String {
    let prediction = match (
        reading.predicted_irrigation(),
        reading.prediction_confidence(),
    ) {
        (Some(p), Some(c)) => format!(" predicted={} ({c})", u8::from(p)),
        (Some(p), None) => format!(" predicted={}", u8::from(p)),
        (None, Some(c)) => format!(" confidence={c}"),
        (None, None) => String::new(),
    };
    let notes = if reading.notes().is_empty() {
        String::new()
    } else {
        format!(" notes={:?}", reading.notes())
    };

    format!(
        "#{} {} humidity={} ph={} P={} K={} pump={}{}{}",
        reading.id(),
        reading.timestamp().format("%Y-%m-%dT%H:%M:%S"),
        reading.humidity(),
        reading.ph(),
        u8::from(reading.phosphorus_present()),
        u8::from(reading.potassium_present()),
        u8::from(reading.pump_status()),
        prediction,
        notes
    )
}

fn print_import_report<W: Write>(report: &ImportReport, out: &mut W) -> FarmMinderResult<()> {
    writeln!(
        out,
        "inserted {} reading(s): {:?}",
        report.inserted.len(),
        report.inserted
    )?;
    for skipped in &report.skipped {
        writeln!(
            out,
            "skipped line {} {:?}: {}",
            skipped.line_no, skipped.line, skipped.reason
        )?;
    }
    Ok(())
}

/// Split a serial capture into lines. Bytes that are not UTF-8 (line
/// noise on the UART) are replaced, so the parser skips that line only
fn read_lines<R: BufRead>(reader: R) -> FarmMinderResult<Vec<String>> {
    reader
        .split(b'\n')
        .map(|line| -> FarmMinderResult<String> {
            let line = line?;
            let line = line.strip_suffix(b"\r").unwrap_or(&line[..]);
            Ok(String::from_utf8_lossy(line).into_owned())
        })
        .collect()
}

/// Execute `command` against an open store, writing human readable
/// output to `out`
pub fn run<W: Write>(
    command: Command,
    store: &mut ReadingStore,
    config: &Config,
    out: &mut W,
) -> FarmMinderResult<()> {
    match command {
        Command::Help => writeln!(out, "{USAGE}")?,
        Command::Import(source) => {
            let lines = match source {
                ImportSource::Stdin => read_lines(std::io::stdin().lock())?,
                ImportSource::File(path) => {
                    let file = File::open(&path).map_err(|e| {
                        log::error!("Unable to open serial capture {}: {e:}", path.display());
                        e
                    })?;
                    read_lines(BufReader::new(file))?
                }
            };
            let report = store.import_lines_report(lines, config.nutrient_format)?;
            print_import_report(&report, out)?;
        }
        Command::Simulate(count) => {
            let lines = simulate_lines(count, &mut rand::thread_rng());
            let report = store.import_lines_report(lines, farmdb::NutrientFormat::Presence)?;
            print_import_report(&report, out)?;
        }
        Command::List => {
            let readings = store.get_all()?;
            if readings.is_empty() {
                writeln!(out, "no readings stored")?;
            }
            for reading in &readings {
                writeln!(out, "{}", describe(reading))?;
            }
        }
        Command::Get(id) => match store.get_by_id(id)? {
            Some(reading) => writeln!(out, "{}", describe(&reading))?,
            None => writeln!(out, "reading {id} not found")?,
        },
        Command::Update(id, patch) => {
            if store.update(id, &patch)? {
                writeln!(out, "reading {id} updated")?;
            } else {
                writeln!(out, "reading {id} not found")?;
            }
        }
        Command::Delete(id) => {
            if store.delete(id)? {
                writeln!(out, "reading {id} deleted")?;
            } else {
                writeln!(out, "reading {id} not found")?;
            }
        }
        Command::Export(kind, path) => {
            let written = match kind {
                ExportKind::Csv => {
                    store.export_csv(path.unwrap_or_else(|| config.csv_path.clone()))?
                }
                ExportKind::Json => {
                    store.export_json(path.unwrap_or_else(|| config.json_path.clone()))?
                }
                ExportKind::Txt => {
                    store.export_report(path.unwrap_or_else(|| config.report_path.clone()))?
                }
            };
            match written {
                Some(path) => writeln!(out, "exported to {}", path.display())?,
                None => writeln!(out, "no data to export")?,
            }
        }
    }
    Ok(())
}
