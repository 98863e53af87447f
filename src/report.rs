//! Final report writing
//!
//! Persists the per-candidate, per-instance state of the registry as a CSV
//! file: one row per (candidate, instance) with the attackable flag, the
//! window length and the window membership. The in-memory registry stays
//! valid whether or not the write succeeds.

use crate::error::{AnalysisError, Result};
use crate::registry::CandidateRegistry;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write the final registry state to `path` as CSV.
///
/// Window membership is rendered as two quoted, semicolon-joined lists in
/// positional alignment: preceding identifiers and their source instance
/// numbers. A preceding message from an unmonitored task carries `-1` as
/// its instance number; empty windows render as empty quoted fields.
pub fn write_report<P: AsRef<Path>>(path: P, registry: &CandidateRegistry) -> Result<()> {
    let file = File::create(path.as_ref()).map_err(|source| AnalysisError::ReportIo {
        path: path.as_ref().display().to_string(),
        source,
    })?;
    let mut writer = BufWriter::new(file);

    write_rows(&mut writer, registry).map_err(|source| AnalysisError::ReportIo {
        path: path.as_ref().display().to_string(),
        source,
    })
}

fn write_rows<W: Write>(writer: &mut W, registry: &CandidateRegistry) -> std::io::Result<()> {
    writeln!(
        writer,
        "CandidateID,Periodicity,InstanceIndex,Attackable,AtkWinLen,AtkWinCount,AtkWinMessages,InsWinMessages"
    )?;

    for candidate in &registry.candidates {
        for instance in &candidate.instances {
            let ids: Vec<String> = instance.window.iter().map(|e| e.id.to_string()).collect();
            let sources: Vec<String> = instance
                .window
                .iter()
                .map(|e| match e.source_instance {
                    Some(slot) => slot.to_string(),
                    None => "-1".to_string(),
                })
                .collect();

            writeln!(
                writer,
                "{},{:.3},{},{},{},{},\"{}\",\"{}\"",
                candidate.id,
                candidate.period,
                instance.index,
                instance.attackable as u8,
                instance.window_len,
                instance.window.len(),
                ids.join(";"),
                sources.join(";")
            )?;
        }
    }
    writer.flush()
}
