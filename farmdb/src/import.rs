use farmp_sensor::SerialParseError;

/// A serial line that could not be turned into a reading
#[derive(Debug, PartialEq)]
pub struct SkippedLine {
    /// 1-based position of the line in the imported batch
    pub line_no: usize,
    pub line: String,
    pub reason: SerialParseError,
}

/// Outcome of a best effort serial import
#[derive(Debug, Default, PartialEq)]
pub struct ImportReport {
    /// Ids of the inserted readings, in input order
    pub inserted: Vec<i32>,
    pub skipped: Vec<SkippedLine>,
}

impl ImportReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}
