//! Query results exposed by the tracker.

use serde::{Deserialize, Serialize};

use super::driver::Driver;

/// One row of a running or final classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassificationEntry<'a> {
    /// 1-based position.
    pub position: usize,
    pub driver: &'a Driver,
    /// Whether this is the participant the telemetry was recorded from.
    pub viewed: bool,
}

/// Grid position captured at race start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct StartingGridEntry {
    pub position: usize,
    pub name: String,
}

/// Session-wide fastest lap or sector and who set it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FastestTime<'a> {
    pub driver: &'a Driver,
    pub time: f64,
}

/// Fastest of the per-driver times produced by `time_of`.
pub(crate) fn fastest<'a, I, F>(drivers: I, time_of: F) -> Option<FastestTime<'a>>
where
    I: IntoIterator<Item = &'a Driver>,
    F: Fn(&Driver) -> Option<f64>,
{
    drivers
        .into_iter()
        .filter_map(|driver| time_of(driver).map(|time| FastestTime { driver, time }))
        .min_by(|a, b| a.time.total_cmp(&b.time))
}

/// Re-rank by laps complete (descending) then race time (ascending) and
/// renumber from 1.
pub(crate) fn rank_by_distance(entries: &mut [ClassificationEntry<'_>]) {
    entries.sort_by(|a, b| {
        b.driver
            .laps_complete()
            .cmp(&a.driver.laps_complete())
            .then_with(|| a.driver.race_time().total_cmp(&b.driver.race_time()))
    });
    for (index, entry) in entries.iter_mut().enumerate() {
        entry.position = index + 1;
    }
}
