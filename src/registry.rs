//! Candidate registry
//!
//! The fixed set of monitored periodic tasks, built once from configuration
//! and mutated in place by every analysis pass. Registry order is priority
//! order for the obfuscation scheduler; it starts as the configured
//! ascending-period order and may change through priority swaps.

use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::types::{Instance, SlotState, WindowEntry};
use serde::{Deserialize, Serialize};

/// Transient accumulator of preceding messages between two consecutive
/// occurrences of a candidate's own message. Cleared, never reallocated,
/// on commit or on a priority-break/idle-gap event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PendingWindow {
    pub entries: Vec<WindowEntry>,
    pub len_bits: u32,
}

impl PendingWindow {
    pub fn push(&mut self, entry: WindowEntry, frame_bits: u32) {
        self.entries.push(entry);
        self.len_bits += frame_bits;
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.len_bits = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.len_bits == 0
    }
}

/// One monitored periodic control task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    /// Bus identifier, unique within the registry
    pub id: u32,

    /// Seconds between successive instances
    pub period: f64,

    /// Instances per hyperperiod
    pub instance_count: usize,

    /// Maximum consecutive suppressed instances allowed
    pub stability_limit: usize,

    /// Circular active/suppressed schedule, one flag per instance slot
    pub pattern: Vec<SlotState>,

    /// Per-slot analysis state, same length as `pattern`
    pub instances: Vec<Instance>,

    /// Own messages consumed from the trace so far; drives instance-slot
    /// addressing across repeated passes and is never reset
    pub read_cursor: usize,

    /// In-progress preceding-message window
    pub pending: PendingWindow,
}

impl Candidate {
    pub fn new(id: u32, period: f64, instance_count: usize, stability_limit: usize) -> Self {
        Self {
            id,
            period,
            instance_count,
            stability_limit,
            pattern: vec![SlotState::Active; instance_count],
            instances: (0..instance_count).map(Instance::new).collect(),
            read_cursor: 0,
            pending: PendingWindow::default(),
        }
    }

    /// Instance slot the next own message commits to, plus the number of
    /// suppressed slots skipped over to reach it. Suppressed slots never
    /// transmit, so the observed message belongs to the first active slot
    /// at or after the read cursor. `None` when every slot is suppressed.
    pub fn next_commit(&self) -> Option<(usize, usize)> {
        let n = self.instance_count;
        (0..n).find_map(|skipped| {
            let slot = (self.read_cursor + skipped) % n;
            (self.pattern[slot] == SlotState::Active).then_some((slot, skipped))
        })
    }

    /// Mean attack-window length across all instances, in bits.
    pub fn mean_window_len(&self) -> u32 {
        if self.instances.is_empty() {
            return 0;
        }
        let sum: u64 = self.instances.iter().map(|i| i.window_len as u64).sum();
        (sum / self.instances.len() as u64) as u32
    }

    /// Number of slots currently suppressed in the pattern.
    pub fn suppressed_count(&self) -> usize {
        self.pattern
            .iter()
            .filter(|&&s| s == SlotState::Suppressed)
            .count()
    }
}

/// The full set of monitored candidates, in scheduler priority order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateRegistry {
    pub candidates: Vec<Candidate>,
}

impl CandidateRegistry {
    /// Build the registry from a validated configuration.
    pub fn new(config: &AnalysisConfig) -> Result<Self> {
        config.validate()?;
        let candidates = config
            .candidate_ids
            .iter()
            .zip(&config.periods)
            .zip(&config.stability_limits)
            .map(|((&id, &period), &limit)| {
                Candidate::new(id, period, config.instance_count(period), limit)
            })
            .collect();
        Ok(Self { candidates })
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Instance slot the candidate emitting `id` commits to next, if `id`
    /// is monitored. Queried at observation time while accumulating
    /// windows; resolves through the same skip-scan the commit path uses,
    /// so the tag always names a slot that actually transmits.
    pub fn source_instance(&self, id: u32) -> Option<u32> {
        self.candidates
            .iter()
            .find(|c| c.id == id)
            .and_then(|c| c.next_commit())
            .map(|(slot, _)| slot as u32)
    }

    /// Recompute every instance's `attackable` flag against the threshold.
    pub fn update_attackable(&mut self, min_attack_window_bits: u32) {
        for candidate in &mut self.candidates {
            for instance in &mut candidate.instances {
                instance.attackable = instance.window_len >= min_attack_window_bits;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> AnalysisConfig {
        AnalysisConfig {
            candidate_ids: vec![0x1A1, 0x1C3, 0x2C3, 0x3D1],
            periods: vec![0.025, 0.025, 0.05, 0.1],
            stability_limits: vec![3, 2, 2, 1],
            hyperperiod: 5.0,
            min_dlc: 1,
            bus_speed_kbps: 500.0,
            min_attack_window_bits: 111,
            passes: 10,
        }
    }

    #[test]
    fn test_registry_construction() {
        let registry = CandidateRegistry::new(&sample_config()).unwrap();
        assert_eq!(registry.len(), 4);

        let first = &registry.candidates[0];
        assert_eq!(first.id, 0x1A1);
        assert_eq!(first.instance_count, 200);
        assert_eq!(first.pattern.len(), first.instances.len());
        assert!(first.pattern.iter().all(|&s| s == SlotState::Active));
        assert_eq!(first.read_cursor, 0);
    }

    #[test]
    fn test_registry_rejects_invalid_config() {
        let mut config = sample_config();
        config.stability_limits.pop();
        assert!(CandidateRegistry::new(&config).is_err());
    }

    #[test]
    fn test_source_instance_tracks_cursor() {
        let mut registry = CandidateRegistry::new(&sample_config()).unwrap();
        assert_eq!(registry.source_instance(0x1A1), Some(0));
        assert_eq!(registry.source_instance(0x7FF), None);

        registry.candidates[0].read_cursor = 203;
        // 203 mod 200 instances
        assert_eq!(registry.source_instance(0x1A1), Some(3));
    }

    #[test]
    fn test_source_instance_skips_suppressed_slots() {
        let mut registry = CandidateRegistry::new(&sample_config()).unwrap();
        registry.candidates[0].read_cursor = 203;
        registry.candidates[0].pattern[3] = SlotState::Suppressed;
        registry.candidates[0].pattern[4] = SlotState::Suppressed;

        // Slots 3 and 4 never transmit; the next commit lands on slot 5
        assert_eq!(registry.source_instance(0x1A1), Some(5));
        assert_eq!(registry.candidates[0].next_commit(), Some((5, 2)));
    }

    #[test]
    fn test_next_commit_none_when_fully_suppressed() {
        let mut candidate = Candidate::new(0x100, 1.0, 4, 2);
        for slot in candidate.pattern.iter_mut() {
            *slot = SlotState::Suppressed;
        }
        assert_eq!(candidate.next_commit(), None);
    }

    #[test]
    fn test_update_attackable_threshold() {
        let mut registry = CandidateRegistry::new(&sample_config()).unwrap();
        registry.candidates[0].instances[0].window_len = 111;
        registry.candidates[0].instances[1].window_len = 110;

        registry.update_attackable(111);
        assert!(registry.candidates[0].instances[0].attackable);
        assert!(!registry.candidates[0].instances[1].attackable);
    }

    #[test]
    fn test_mean_window_len() {
        let mut candidate = Candidate::new(0x100, 1.0, 4, 2);
        for (i, len) in [100, 200, 300, 400].iter().enumerate() {
            candidate.instances[i].window_len = *len;
        }
        assert_eq!(candidate.mean_window_len(), 250);
    }

    #[test]
    fn test_pending_window_clear_keeps_capacity() {
        let mut pending = PendingWindow::default();
        pending.push(WindowEntry::new(0x100, Some(0)), 55);
        pending.push(WindowEntry::new(0x101, None), 111);
        assert_eq!(pending.len_bits, 166);

        let capacity = pending.entries.capacity();
        pending.clear();
        assert!(pending.is_empty());
        assert_eq!(pending.entries.capacity(), capacity);
    }
}
