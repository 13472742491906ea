use crate::common::constants::SECONDS_PER_DAY;
use crate::domain::{NurespResult, Year};
use crate::modules::records::{FileRecordLoader, UptimeInterval};
use crate::numerics::stable_sum;
use std::collections::BTreeMap;
use tracing::debug;

pub fn total_livetime_seconds(intervals: &[UptimeInterval]) -> f64 {
    let days = intervals
        .iter()
        .map(UptimeInterval::duration_days)
        .collect::<Vec<_>>();
    stable_sum(&days) * SECONDS_PER_DAY
}

pub fn yearly_livetime(loader: &FileRecordLoader, years: &[Year]) -> NurespResult<BTreeMap<Year, f64>> {
    years
        .iter()
        .map(|&year| {
            let intervals = loader.load_uptime(year)?;
            let seconds = total_livetime_seconds(&intervals);
            debug!(year, intervals = intervals.len(), seconds, "livetime");
            Ok((year, seconds))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::total_livetime_seconds;
    use crate::modules::records::UptimeInterval;

    #[test]
    fn livetime_sums_interval_durations_in_seconds() {
        let intervals = [
            UptimeInterval::from_row([0.0, 1.0]),
            UptimeInterval::from_row([2.0, 2.5]),
        ];
        assert_eq!(total_livetime_seconds(&intervals), 1.5 * 86_400.0);
    }

    #[test]
    fn empty_uptime_is_zero() {
        assert_eq!(total_livetime_seconds(&[]), 0.0);
    }
}
