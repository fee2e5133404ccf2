//! Priority ordering of confirmed breaks.

use crate::oracle::{BreakRecord, PriorityTier};

/// Sort breaks High → Medium → Low.
///
/// The sort is stable, so breaks sharing a tier keep their event order and
/// a rerun over the same extracts produces the same report. A break that
/// somehow has no assessment counts as Medium.
pub fn rank_breaks(mut breaks: Vec<BreakRecord>) -> Vec<BreakRecord> {
    breaks.sort_by_key(|record| {
        record
            .priority
            .as_ref()
            .map(|assessment| assessment.priority)
            .unwrap_or_default()
            .rank()
    });
    breaks
}
