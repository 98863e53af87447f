//! Obfuscation scheduler
//!
//! One pass over the registry in priority order. For each candidate the
//! most exploitable still-active instance is targeted and three policies
//! are tried in strict order, first applicable wins:
//!
//! 1. suppress the target instance itself (cheapest, most local fix)
//! 2. suppress the co-occurring instance of a higher-priority task that is
//!    actually inside the target's attack window
//! 3. swap registry priority with the nearest same-period predecessor that
//!    appears in the window, decorrelating observable order without
//!    spending any skip budget
//!
//! No backtracking across candidates within a pass.

use crate::ranking::rank_by_window_len;
use crate::registry::CandidateRegistry;
use crate::stability::try_suppress;
use crate::types::SlotState;
use serde::{Deserialize, Serialize};

/// What the scheduler did to one candidate during a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObfuscationOutcome {
    /// The target instance of the candidate itself was suppressed
    SuppressedSelf { slot: usize },
    /// The skip was shifted to a higher-priority task inside the window
    SuppressedUpstream { id: u32, slot: usize },
    /// Registry priority was swapped with a same-period predecessor
    PrioritySwapped { with_id: u32 },
    /// No policy applied; the candidate is unchanged this pass
    Unchanged,
}

pub struct ObfuscationScheduler;

impl ObfuscationScheduler {
    /// Apply the obfuscation policies to every candidate once.
    ///
    /// Returns the outcome per candidate, keyed by the candidate's
    /// identifier at the time it was processed.
    pub fn run_pass(registry: &mut CandidateRegistry) -> Vec<(u32, ObfuscationOutcome)> {
        let mut outcomes = Vec::with_capacity(registry.len());

        for i in 0..registry.len() {
            let candidate_id = registry.candidates[i].id;
            let outcome = Self::obfuscate(registry, i);
            outcomes.push((candidate_id, outcome));
        }
        outcomes
    }

    fn obfuscate(registry: &mut CandidateRegistry, i: usize) -> ObfuscationOutcome {
        // Most exploitable instance that is attackable and still active
        let target_slot = {
            let candidate = &registry.candidates[i];
            rank_by_window_len(&candidate.instances)
                .into_iter()
                .map(|j| candidate.instances[j].index)
                .find(|&slot| {
                    candidate.instances[slot].attackable
                        && candidate.pattern[slot] == SlotState::Active
                })
        };
        let Some(target_slot) = target_slot else {
            return ObfuscationOutcome::Unchanged;
        };

        // Policy 1: suppress the target instance itself
        {
            let candidate = &mut registry.candidates[i];
            let limit = candidate.stability_limit;
            if try_suppress(&mut candidate.pattern, limit, target_slot) {
                return ObfuscationOutcome::SuppressedSelf { slot: target_slot };
            }
        }

        let window = registry.candidates[i].instances[target_slot].window.clone();

        // Policy 2: push the skip to whichever higher-priority task is
        // actually contributing to the leak
        for h in 0..i {
            let upstream_id = registry.candidates[h].id;
            let Some(entry) = window.iter().find(|e| e.id == upstream_id) else {
                continue;
            };
            let Some(source) = entry.source_instance else {
                continue;
            };

            let upstream = &mut registry.candidates[h];
            let slot = source as usize % upstream.instance_count;
            if upstream.pattern[slot] == SlotState::Suppressed {
                // Already skipped; suppressing it again obfuscates nothing
                continue;
            }
            let limit = upstream.stability_limit;
            if try_suppress(&mut upstream.pattern, limit, slot) {
                return ObfuscationOutcome::SuppressedUpstream {
                    id: upstream_id,
                    slot,
                };
            }
        }

        // Policy 3: swap priority with the nearest same-period predecessor
        // observed inside the window
        let period = registry.candidates[i].period;
        if let Some(k) = (0..i).rev().find(|&k| registry.candidates[k].period == period) {
            let predecessor_id = registry.candidates[k].id;
            if window.iter().any(|e| e.id == predecessor_id) {
                registry.candidates.swap(i, k);
                return ObfuscationOutcome::PrioritySwapped {
                    with_id: predecessor_id,
                };
            }
        }

        ObfuscationOutcome::Unchanged
    }
}
