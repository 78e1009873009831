use std::collections::BTreeSet;

use super::day_key::DayKey;

/// Counts consecutive completed days ending at `today`. The scan walks backwards one day at a
/// time, so it's linear in the streak length rather than the full history.
pub fn streak_for(completed: &BTreeSet<DayKey>, today: DayKey) -> u32 {
    if !completed.contains(&today) {
        return 0;
    }

    let mut run = 1;
    let mut day = today.previous();
    while completed.contains(&day) {
        run += 1;
        day = day.previous();
    }
    run
}
