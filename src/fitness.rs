//! Family fitness lookups

use std::collections::HashMap;

/// Daily step counts keyed by member role, then by canonical date string
pub type MemberFitnessData = HashMap<String, HashMap<String, u32>>;

/// Steps a member logged on a day; zero when nothing was recorded
pub fn member_steps_on_day(data: &MemberFitnessData, role: &str, date: &str) -> u32 {
    data.get(role)
        .and_then(|days| days.get(date))
        .copied()
        .unwrap_or(0)
}
