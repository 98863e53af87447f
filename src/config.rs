//! Analysis configuration
//!
//! All tunables of a run live in one explicit value that is validated up
//! front and passed by reference into the registry constructor and the
//! driver. No global mutable state.

use crate::error::{AnalysisError, Result};
use crate::types::FRAME_OVERHEAD_BITS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

fn default_passes() -> usize {
    10
}

/// Configuration for one analysis run.
///
/// The three candidate lists are parallel: entry `i` of each describes the
/// same monitored control task. Candidates are listed in ascending order
/// of period, which is also the registry's initial priority order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Bus identifiers of the monitored periodic tasks
    pub candidate_ids: Vec<u32>,

    /// Transmission period of each task in seconds
    pub periods: Vec<f64>,

    /// Maximum consecutive suppressed instances allowed per task
    pub stability_limits: Vec<usize>,

    /// Hyperperiod of the task set in seconds (LCM of all periods)
    pub hyperperiod: f64,

    /// Smallest data field length the bus carries, in bytes; basis of the
    /// idle-gap threshold
    pub min_dlc: u8,

    /// Bus bit rate in kbps
    pub bus_speed_kbps: f64,

    /// Minimum attack-window length in bits for an instance to count as
    /// attackable
    pub min_attack_window_bits: u32,

    /// Number of analysis passes over the trace
    #[serde(default = "default_passes")]
    pub passes: usize,
}

impl AnalysisConfig {
    /// Load and validate a configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref()).map_err(|source| AnalysisError::ConfigIo {
            path: path.as_ref().display().to_string(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject an inconsistent configuration before any analysis runs.
    pub fn validate(&self) -> Result<()> {
        if self.candidate_ids.is_empty() {
            return Err(AnalysisError::Config("candidate list is empty".into()));
        }
        if self.periods.len() != self.candidate_ids.len()
            || self.stability_limits.len() != self.candidate_ids.len()
        {
            return Err(AnalysisError::Config(format!(
                "mismatched list lengths: {} ids, {} periods, {} stability limits",
                self.candidate_ids.len(),
                self.periods.len(),
                self.stability_limits.len()
            )));
        }
        for (i, &id) in self.candidate_ids.iter().enumerate() {
            if self.candidate_ids[..i].contains(&id) {
                return Err(AnalysisError::Config(format!(
                    "duplicate candidate id {:#x}",
                    id
                )));
            }
        }
        for (&id, &period) in self.candidate_ids.iter().zip(&self.periods) {
            if period <= 0.0 {
                return Err(AnalysisError::Config(format!(
                    "non-positive period {} for candidate {:#x}",
                    period, id
                )));
            }
        }
        if self.hyperperiod <= 0.0 {
            return Err(AnalysisError::Config(format!(
                "non-positive hyperperiod {}",
                self.hyperperiod
            )));
        }
        for ((&id, &period), &limit) in self
            .candidate_ids
            .iter()
            .zip(&self.periods)
            .zip(&self.stability_limits)
        {
            // A limit at or above the instance count would let the scheduler
            // suppress every slot, after which the task never transmits.
            let instances = self.instance_count(period);
            if limit >= instances {
                return Err(AnalysisError::Config(format!(
                    "stability limit {} for candidate {:#x} must be below its {} instances",
                    limit, id, instances
                )));
            }
        }
        if self.bus_speed_kbps <= 0.0 {
            return Err(AnalysisError::Config(format!(
                "non-positive bus speed {} kbps",
                self.bus_speed_kbps
            )));
        }
        if self.passes == 0 {
            return Err(AnalysisError::Config("pass count must be at least 1".into()));
        }
        Ok(())
    }

    /// Instances per hyperperiod for a task with the given period.
    pub fn instance_count(&self, period: f64) -> usize {
        (self.hyperperiod / period).ceil() as usize
    }

    /// Longest bus idle time still considered "no gap": the wire time of
    /// the smallest frame the bus carries.
    pub fn idle_threshold(&self) -> f64 {
        (self.min_dlc as u32 * 8 + FRAME_OVERHEAD_BITS) as f64 / (self.bus_speed_kbps * 1000.0)
    }
}
