//! A named competitor and everything accumulated for them during the session.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::timeline::{LapTimeline, SectorTime, SectorUpdate};
use super::track::TrackGeometry;
use crate::types::LogicalSector;

/// A driver tracked by name; the slot index follows roster reshuffles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct Driver {
    name: String,
    slot: usize,
    timeline: LapTimeline,
    stops: u32,
    in_pit: bool,
}

impl Driver {
    pub fn new(name: impl Into<String>, slot: usize) -> Self {
        Self { name: name.into(), slot, timeline: LapTimeline::new(), stops: 0, in_pit: false }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    pub(crate) fn set_slot(&mut self, slot: usize) {
        self.slot = slot;
    }

    pub fn timeline(&self) -> &LapTimeline {
        &self.timeline
    }

    pub fn add_sector_time(&mut self, observed: SectorTime) -> SectorUpdate {
        self.timeline.add_sector_time(observed)
    }

    pub fn sector_times(&self) -> Vec<f64> {
        self.timeline.sector_times().iter().map(|e| e.time).collect()
    }

    pub fn lap_times(&self) -> Vec<f64> {
        self.timeline.lap_times()
    }

    pub fn laps_complete(&self) -> usize {
        self.timeline.laps_complete()
    }

    pub fn race_time(&self) -> f64 {
        self.timeline.race_time()
    }

    pub fn best_lap(&self) -> Option<f64> {
        self.timeline.best_lap()
    }

    pub fn best_sector(&self, sector: LogicalSector) -> Option<f64> {
        self.timeline.best_sector(sector)
    }

    /// Completed pit stops.
    pub fn stops(&self) -> u32 {
        self.stops
    }

    pub fn in_pit(&self) -> bool {
        self.in_pit
    }

    /// Update pit state from a position sampled while racing.
    ///
    /// Entering the pit-entry radius opens a stop; reaching the pit-exit radius
    /// afterwards completes it.
    pub fn track_pit(&mut self, track: &TrackGeometry, position: [f32; 3]) {
        if !self.in_pit && track.at_pit_entry(position) {
            self.in_pit = true;
            debug!(driver = %self.name, "Entered pit lane");
        } else if self.in_pit && track.at_pit_exit(position) {
            self.in_pit = false;
            self.stops += 1;
            info!(driver = %self.name, stops = self.stops, "Completed pit stop");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track() -> TrackGeometry {
        TrackGeometry {
            name: "Test Circuit".to_string(),
            length: 4000.0,
            pit_entry: [100.0, 0.0, 100.0],
            pit_exit: [300.0, 0.0, 100.0],
            radius: 10.0,
        }
    }

    #[test]
    fn stop_counts_once_per_entry_exit_pair() {
        let track = track();
        let mut driver = Driver::new("Jim Clark", 0);

        driver.track_pit(&track, [0.0, 0.0, 0.0]);
        driver.track_pit(&track, [300.0, 0.0, 100.0]);
        assert_eq!(driver.stops(), 0, "exit without entry is not a stop");

        driver.track_pit(&track, [101.0, 0.0, 99.0]);
        assert!(driver.in_pit());
        driver.track_pit(&track, [102.0, 0.0, 99.0]);
        driver.track_pit(&track, [299.0, 0.0, 101.0]);
        assert_eq!(driver.stops(), 1);

        driver.track_pit(&track, [300.0, 0.0, 100.0]);
        driver.track_pit(&track, [500.0, 0.0, 100.0]);
        assert_eq!(driver.stops(), 1);
        assert!(!driver.in_pit());

        driver.track_pit(&track, [100.0, 0.0, 100.0]);
        driver.track_pit(&track, [300.0, 0.0, 100.0]);
        assert_eq!(driver.stops(), 2);
    }

    #[test]
    fn queries_delegate_to_timeline() {
        let mut driver = Driver::new("Graham Hill", 3);
        for (time, sector) in
            [(30.0, LogicalSector::S1), (31.0, LogicalSector::S2), (32.0, LogicalSector::S3)]
        {
            driver.add_sector_time(SectorTime::new(time, sector, false));
        }

        assert_eq!(driver.sector_times(), vec![30.0, 31.0, 32.0]);
        assert_eq!(driver.laps_complete(), 1);
        assert_eq!(driver.race_time(), 93.0);
        assert_eq!(driver.best_lap(), Some(93.0));
        assert_eq!(driver.best_sector(LogicalSector::S2), Some(31.0));
        assert_eq!(driver.slot(), 3);
    }
}
