//! Per-driver sector history with invalidation propagation.
//!
//! Each telemetry tick reports, for every participant, the time of the last
//! sector they completed plus a lap-invalid flag. The same observation repeats
//! for many ticks, corrections arrive late, and an invalid flag raised in one
//! sector really describes the whole lap around it. [`LapTimeline::add_sector_time`]
//! folds that noisy signal into an append-only sequence S1, S2, S3, S1, ... where
//! every three entries starting at an S1 form one lap.
//!
//! ## Rules
//!
//! For each observation, in order:
//!
//! 1. A time of exactly -123.0 means "not yet available" and is dropped.
//! 2. The first observation for a driver is stored as-is.
//! 3. An exact repeat of the last stored entry is dropped.
//! 4. Same time and sector as the last entry but a different invalid flag is a
//!    correction: newly invalid replaces the stored entry, newly valid is dropped.
//! 5. Anything else is a new crossing. While a forward-invalidate counter is
//!    pending the entry is stored invalid and the counter decrements.
//! 6. When an observed-invalid entry is stored (rules 4 and 5), the lap around it
//!    is tainted:
//!
//! | sector | entries forced invalid ahead | stored entries marked behind |
//! |--------|------------------------------|------------------------------|
//! | S3     | 3                            | 0                            |
//! | S1     | 2                            | 1                            |
//! | S2     | 1                            | 2                            |

use serde::{Deserialize, Serialize};

use crate::types::LogicalSector;

/// Sector time the game reports before a timing line has been crossed.
pub const SECTOR_TIME_SENTINEL: f64 = -123.0;

/// One stored sector crossing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct SectorTime {
    /// Sector time in seconds.
    pub time: f64,
    pub sector: LogicalSector,
    pub invalid: bool,
}

impl SectorTime {
    pub fn new(time: impl Into<f64>, sector: LogicalSector, invalid: bool) -> Self {
        Self { time: time.into(), sector, invalid }
    }

    pub fn is_sentinel(&self) -> bool {
        self.time == SECTOR_TIME_SENTINEL
    }
}

/// Outcome of feeding one observation to a [`LapTimeline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectorUpdate {
    Appended,
    Corrected,
    Ignored,
}

/// Sector history of one driver, grouped into laps on demand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct LapTimeline {
    entries: Vec<SectorTime>,
    invalidate_next: u8,
}

impl LapTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sector_time(&mut self, observed: SectorTime) -> SectorUpdate {
        if observed.is_sentinel() {
            return SectorUpdate::Ignored;
        }

        let Some(last) = self.entries.last_mut() else {
            self.entries.push(observed);
            return SectorUpdate::Appended;
        };

        if *last == observed {
            return SectorUpdate::Ignored;
        }

        if last.time == observed.time && last.sector == observed.sector {
            if !observed.invalid {
                return SectorUpdate::Ignored;
            }
            *last = observed;
            self.propagate(observed.sector);
            return SectorUpdate::Corrected;
        }

        let mut stored = observed;
        if self.invalidate_next > 0 {
            stored.invalid = true;
            self.invalidate_next -= 1;
        }
        self.entries.push(stored);

        // Forced entries do not re-arm the counter, otherwise one flag would
        // taint every following lap.
        if observed.invalid {
            self.propagate(observed.sector);
        }
        SectorUpdate::Appended
    }

    fn propagate(&mut self, sector: LogicalSector) {
        let (ahead, behind) = match sector {
            LogicalSector::S3 => (3, 0),
            LogicalSector::S1 => (2, 1),
            LogicalSector::S2 => (1, 2),
        };

        self.invalidate_next = ahead;
        let newest = self.entries.len().saturating_sub(1);
        for entry in self.entries[..newest].iter_mut().rev().take(behind) {
            entry.invalid = true;
        }
    }

    pub fn sector_times(&self) -> &[SectorTime] {
        &self.entries
    }

    /// Entries grouped into complete laps, skipping any partial lap before the
    /// first S1.
    pub fn laps(&self) -> impl Iterator<Item = &[SectorTime]> {
        let start = self
            .entries
            .iter()
            .position(|e| e.sector == LogicalSector::S1)
            .unwrap_or(self.entries.len());
        self.entries[start..].chunks_exact(3)
    }

    pub fn lap_times(&self) -> Vec<f64> {
        self.laps().map(|lap| lap.iter().map(|e| e.time).sum()).collect()
    }

    pub fn laps_complete(&self) -> usize {
        self.laps().count()
    }

    /// Sum of all complete lap times.
    pub fn race_time(&self) -> f64 {
        self.lap_times().iter().sum()
    }

    /// Fastest lap with no invalid sector.
    pub fn best_lap(&self) -> Option<f64> {
        self.laps()
            .filter(|lap| lap.iter().all(|e| !e.invalid))
            .map(|lap| lap.iter().map(|e| e.time).sum::<f64>())
            .min_by(f64::total_cmp)
    }

    /// Fastest valid time recorded for `sector`.
    pub fn best_sector(&self, sector: LogicalSector) -> Option<f64> {
        self.entries
            .iter()
            .filter(|e| e.sector == sector && !e.invalid)
            .map(|e| e.time)
            .min_by(f64::total_cmp)
    }

    /// Number of entries still to be forced invalid.
    pub fn pending_invalidations(&self) -> u8 {
        self.invalidate_next
    }
}
