//! Trace capture loading
//!
//! Reads a comma-separated capture log into the ordered `TraceRecord`
//! sequence the engine streams over. Column positions follow the capture
//! tool's layout: column 1 holds the arbitration identifier as hex text,
//! column 2 the DLC in bytes, column 11 the transmission start time in
//! seconds.

use crate::error::{AnalysisError, Result};
use crate::types::TraceRecord;
use std::fs;
use std::path::Path;

const ID_COLUMN: usize = 1;
const DLC_COLUMN: usize = 2;
const TIME_COLUMN: usize = 11;

/// Load an ordered trace from a capture file.
///
/// Leading rows that fail to parse are treated as the capture tool's
/// header and skipped. Once the first data row has been seen, a row that
/// fails to parse aborts the load with its row number: silently dropping
/// rows would corrupt the chronological-order invariant the engine
/// depends on.
pub fn load_trace<P: AsRef<Path>>(path: P) -> Result<Vec<TraceRecord>> {
    let text = fs::read_to_string(path.as_ref()).map_err(|source| AnalysisError::TraceIo {
        path: path.as_ref().display().to_string(),
        source,
    })?;
    parse_trace(&text)
}

/// Parse capture text into trace records. See [`load_trace`].
pub fn parse_trace(text: &str) -> Result<Vec<TraceRecord>> {
    let mut records: Vec<TraceRecord> = Vec::new();
    let mut in_data = false;

    for (row, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            if in_data {
                return Err(AnalysisError::MalformedRow {
                    row,
                    reason: "empty row inside data section".into(),
                });
            }
            continue;
        }

        match parse_row(line) {
            Ok(record) => {
                if let Some(previous) = records.last() {
                    if record.tx_time < previous.tx_time {
                        return Err(AnalysisError::MalformedRow {
                            row,
                            reason: format!(
                                "time {} regresses before {}",
                                record.tx_time, previous.tx_time
                            ),
                        });
                    }
                }
                records.push(record);
                in_data = true;
            }
            // Header rows before the data section are skipped
            Err(_) if !in_data => {}
            Err(reason) => {
                return Err(AnalysisError::MalformedRow { row, reason });
            }
        }
    }

    Ok(records)
}

fn parse_row(line: &str) -> std::result::Result<TraceRecord, String> {
    let columns: Vec<&str> = line.split(',').collect();
    if columns.len() <= TIME_COLUMN {
        return Err(format!(
            "expected at least {} columns, found {}",
            TIME_COLUMN + 1,
            columns.len()
        ));
    }

    let id = u32::from_str_radix(columns[ID_COLUMN].trim(), 16)
        .map_err(|e| format!("bad identifier '{}': {}", columns[ID_COLUMN].trim(), e))?;
    let dlc: u8 = columns[DLC_COLUMN]
        .trim()
        .parse()
        .map_err(|e| format!("bad DLC '{}': {}", columns[DLC_COLUMN].trim(), e))?;
    let tx_time: f64 = columns[TIME_COLUMN]
        .trim()
        .parse()
        .map_err(|e| format!("bad tx time '{}': {}", columns[TIME_COLUMN].trim(), e))?;

    Ok(TraceRecord::new(id, dlc, tx_time))
}
