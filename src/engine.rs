//! Attack-window engine
//!
//! Streams the chronological trace once per analysis pass and updates every
//! candidate's per-instance attack window. An attack window is the run of
//! strictly higher-priority messages immediately preceding one occurrence
//! of a candidate, with no bus idle gap in between; from the second pass
//! onward each stored window is reduced to the subset that recurs every
//! pass, which is the portion an attacker can rely on.

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::registry::{Candidate, CandidateRegistry};
use crate::types::{TraceRecord, WindowEntry};

/// One streaming pass over the trace against a mutable registry.
pub struct AttackWindowEngine {
    idle_threshold: f64,
    bus_speed_kbps: f64,
}

impl AttackWindowEngine {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            idle_threshold: config.idle_threshold(),
            bus_speed_kbps: config.bus_speed_kbps,
        }
    }

    /// Run one pass, updating every candidate's instances and read cursor.
    ///
    /// Each record is judged together with the start time of the record
    /// after it (the idle-gap check needs both); the final record has no
    /// successor and is left unconsumed.
    pub fn run_pass(&self, trace: &[TraceRecord], registry: &mut CandidateRegistry) -> Result<()> {
        for pair in trace.windows(2) {
            let record = pair[0];
            let tx_end = record.tx_time + record.tx_duration(self.bus_speed_kbps);
            let idle_gap = pair[1].tx_time - tx_end;
            self.observe(record, idle_gap, registry)?;
        }
        Ok(())
    }

    /// Feed one record to every candidate.
    fn observe(
        &self,
        record: TraceRecord,
        idle_gap: f64,
        registry: &mut CandidateRegistry,
    ) -> Result<()> {
        // Resolve the emitter's instance slot before any cursor in this
        // record's processing moves; the tag identifies the co-occurring
        // instance, not the one after it.
        let source = registry.source_instance(record.id);

        for i in 0..registry.len() {
            let candidate_id = registry.candidates[i].id;

            if record.id > candidate_id
                || (idle_gap > self.idle_threshold && record.id != candidate_id)
            {
                // Lower bus priority than the candidate, or the bus went
                // idle afterwards: the "immediately preceding" chain is
                // broken, so the in-progress window is void.
                registry.candidates[i].pending.clear();
            } else if record.id < candidate_id {
                // Strictly higher priority: part of the attack window
                let candidate = &mut registry.candidates[i];
                candidate
                    .pending
                    .push(WindowEntry::new(record.id, source), record.frame_bits());
            } else {
                // The candidate's own occurrence: commit the window.
                Self::commit(&mut registry.candidates[i])?;
            }
        }
        Ok(())
    }

    /// Commit a candidate's pending window to the matching instance slot.
    ///
    /// Suppressed slots never transmit, so the observed message belongs to
    /// the first active slot at or after the read cursor; the cursor then
    /// advances past the committed slot and any skipped ones. The cursor is
    /// never reset, so `read_cursor < instance_count` identifies the very
    /// first write to each slot.
    fn commit(candidate: &mut Candidate) -> Result<()> {
        let Some((slot, skipped)) = candidate.next_commit() else {
            return Err(AnalysisError::Invariant(format!(
                "candidate {:#x}: every instance slot is suppressed",
                candidate.id
            )));
        };
        let first_write = candidate.read_cursor < candidate.instance_count;
        let instance = &mut candidate.instances[slot];

        if first_write {
            instance.window_len = candidate.pending.len_bits;
            instance.window = candidate.pending.entries.clone();
        } else {
            let reduced = instance.window_len.min(candidate.pending.len_bits);
            instance.window_len = reduced;
            if reduced == 0 {
                instance.window.clear();
            } else {
                instance.window = common_messages(&instance.window, &candidate.pending.entries);
            }
        }

        candidate.pending.clear();
        candidate.read_cursor += skipped + 1;
        Ok(())
    }
}

/// Positional intersection of two attack windows by message identifier.
///
/// Sort-then-merge rather than a quadratic scan: the smaller side's
/// identifiers are sorted once, each element of the larger side is binary
/// searched against them, and matches keep the entry (and instance tag)
/// from the searched side. Duplicate identifiers are distinct list
/// positions, not set elements, so a task with several instances inside
/// one window survives the reduction once per matching position.
pub fn common_messages(stored: &[WindowEntry], fresh: &[WindowEntry]) -> Vec<WindowEntry> {
    let (smaller, larger) = if stored.len() <= fresh.len() {
        (stored, fresh)
    } else {
        (fresh, stored)
    };

    let mut sorted_ids: Vec<u32> = smaller.iter().map(|e| e.id).collect();
    sorted_ids.sort_unstable();

    larger
        .iter()
        .filter(|e| sorted_ids.binary_search(&e.id).is_ok())
        .copied()
        .collect()
}
