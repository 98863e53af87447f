//! Skip-pattern stability check
//!
//! The liveness bound of the obfuscation policy: a task may never fall
//! silent for more than `stability_limit` consecutive scheduled
//! occurrences. The pattern is periodic, so runs are counted with
//! wrap-around.

use crate::types::SlotState;

/// Tentatively suppress `slot` in the circular `pattern`.
///
/// Scans the full pattern once, counting adjacent suppressed pairs; a run
/// of more than `stability_limit` consecutive suppressed slots (wrap-around
/// inclusive) violates the bound, in which case the tentative mark is
/// reverted and `false` is returned. Otherwise the mark is kept.
pub fn try_suppress(pattern: &mut [SlotState], stability_limit: usize, slot: usize) -> bool {
    let n = pattern.len();
    let previous = pattern[slot];
    pattern[slot] = SlotState::Suppressed;

    let mut run = 0;
    for i in 0..n {
        if pattern[i] == SlotState::Suppressed && pattern[(i + 1) % n] == SlotState::Suppressed {
            run += 1;
        } else {
            run = 0;
        }
        if run >= stability_limit {
            pattern[slot] = previous;
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SlotState::{Active, Suppressed};

    #[test]
    fn test_single_skip_allowed() {
        let mut pattern = vec![Active; 8];
        assert!(try_suppress(&mut pattern, 2, 3));
        assert_eq!(pattern[3], Suppressed);
    }

    #[test]
    fn test_run_at_limit_allowed_run_beyond_rejected() {
        // Limit 2: two consecutive skips fine, a third in a row is not
        let mut pattern = vec![Active; 8];
        assert!(try_suppress(&mut pattern, 2, 0));
        assert!(try_suppress(&mut pattern, 2, 1));
        assert!(!try_suppress(&mut pattern, 2, 2));
        // Rejected mark must be reverted
        assert_eq!(pattern[2], Active);
        assert_eq!(&pattern[..2], &[Suppressed, Suppressed]);
    }

    #[test]
    fn test_wraparound_run_rejected() {
        // Pattern is circular: last and first slots are adjacent
        let mut pattern = vec![Active; 6];
        assert!(try_suppress(&mut pattern, 2, 5));
        assert!(try_suppress(&mut pattern, 2, 0));
        assert!(!try_suppress(&mut pattern, 2, 1));
        assert_eq!(pattern[1], Active);
    }

    #[test]
    fn test_separated_skips_allowed() {
        let mut pattern = vec![Active; 6];
        assert!(try_suppress(&mut pattern, 1, 0));
        assert!(try_suppress(&mut pattern, 1, 2));
        assert!(try_suppress(&mut pattern, 1, 4));
        // Any neighbor of an existing skip would form a run of 2
        assert!(!try_suppress(&mut pattern, 1, 1));
        assert!(!try_suppress(&mut pattern, 1, 5));
    }

    #[test]
    fn test_zero_limit_rejects_everything() {
        let mut pattern = vec![Active; 4];
        assert!(!try_suppress(&mut pattern, 0, 0));
        assert!(pattern.iter().all(|&s| s == Active));
    }

    #[test]
    fn test_only_slot_cannot_be_suppressed() {
        // A one-slot pattern wraps onto itself; suppressing it would
        // silence the task permanently
        let mut pattern = vec![Active; 1];
        assert!(!try_suppress(&mut pattern, 1, 0));
        assert_eq!(pattern[0], Active);
    }
}
