//! Window ranking
//!
//! Orders a candidate's instances by descending attack-window length so the
//! scheduler targets the most exploitable instance first. The sort is
//! stable: equal window lengths keep their slot order.

use crate::types::Instance;

/// Instance indices of `instances`, most exploitable first.
///
/// The instance list itself is left in slot order; only the returned order
/// is ranked. Idempotent for an unchanged list.
pub fn rank_by_window_len(instances: &[Instance]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..instances.len()).collect();
    // Stable merge sort; ties preserve relative slot order
    order.sort_by(|&a, &b| instances[b].window_len.cmp(&instances[a].window_len));
    order
}
