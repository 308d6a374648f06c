//! Session reconstruction state machine.
//!
//! A [`SessionTracker`] is positioned on the race-start checkpoint when it is
//! created (the priming step builds the roster and the starting grid from it)
//! and then consumes telemetry one record at a time through
//! [`SessionTracker::advance`] until the race-end checkpoint or the end of the
//! capture.
//!
//! ```rust,no_run
//! use racedata::{Advance, SessionConfig, SessionTracker};
//!
//! let mut tracker = SessionTracker::open("/captures/brands-hatch", &SessionConfig::default())?;
//! while tracker.advance()? == Advance::Advanced {
//!     println!("{:.3}s elapsed", tracker.elapsed_time());
//! }
//! for entry in tracker.all_driver_classification() {
//!     let driver = entry.driver;
//!     println!("{:>2} {} ({} laps)", entry.position, driver.name(), driver.laps_complete());
//! }
//! # Ok::<(), racedata::RaceDataError>(())
//! ```

use std::path::Path;
use tracing::{debug, info, trace, warn};

use super::boundary::SessionBoundaryDetector;
use super::classification::{
    ClassificationEntry, FastestTime, StartingGridEntry, fastest, rank_by_distance,
};
use super::config::SessionConfig;
use super::descriptor::{DescriptorCache, SessionDescriptor};
use super::driver::Driver;
use super::registry::DriverRegistry;
use super::timeline::SectorTime;
use super::track::{TrackCatalog, TrackGeometry};
use crate::packet::{Packet, TelemetryPacket};
use crate::stream::{PacketCursor, PacketStream, StreamOrder};
use crate::types::{LogicalSector, RaceState};
use crate::{RaceDataError, Result};

/// `current_time` value broadcast between sessions.
const CURRENT_TIME_UNSET: f32 = -1.0;

/// Result of one [`SessionTracker::advance`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// A telemetry record was consumed.
    Advanced,
    /// Nothing left to consume; the tracker keeps its last observed state.
    Exhausted,
}

/// Lifecycle of a [`SessionTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    /// Positioned on the race-start record; nothing timed yet.
    Priming,
    Running,
    Exhausted,
    /// A record carried an invalid sector number. Driver histories hold
    /// everything up to the record before it; the tracker accepts no more input.
    Faulted,
}

/// Replays a capture from race start to race end, keeping the roster, per-driver
/// timelines and elapsed time current after each record.
pub struct SessionTracker<S = PacketStream> {
    cursor: PacketCursor<S>,
    descriptor: SessionDescriptor,
    track: Option<TrackGeometry>,
    state: TrackerState,
    registry: DriverRegistry,
    starting_grid: Vec<StartingGridEntry>,
    packet: Box<TelemetryPacket>,
    last_packet: Option<Box<TelemetryPacket>>,
    roster_size: i8,
    elapsed_time: f64,
}

impl SessionTracker<PacketStream> {
    /// Open a capture directory, detecting (or loading cached) race boundaries.
    ///
    /// A cached descriptor is checked against the capture first: if any of its
    /// three checkpoints is missing the cache is discarded, boundaries are
    /// detected again and the cache is rewritten.
    pub fn open<P: AsRef<Path>>(directory: P, config: &SessionConfig) -> Result<Self> {
        let directory = directory.as_ref();
        let cache = DescriptorCache::new(directory, &config.descriptor_filename);
        let detector = SessionBoundaryDetector::new(directory, &config.capture_prefix);

        let cached = if config.use_descriptor_cache { cache.load() } else { None };
        let descriptor = match cached {
            Some(descriptor) => match detector.missing_checkpoint(&descriptor)? {
                None => descriptor,
                Some((checkpoint, hash)) => {
                    warn!(
                        "Cached {} checkpoint {} not in {}; detecting boundaries again",
                        checkpoint,
                        hash,
                        directory.display()
                    );
                    let descriptor = detector.detect()?;
                    cache.store(&descriptor);
                    descriptor
                }
            },
            None => {
                let descriptor = detector.detect()?;
                if config.use_descriptor_cache {
                    cache.store(&descriptor);
                }
                descriptor
            }
        };

        let stream = PacketStream::open(directory, &config.capture_prefix, StreamOrder::Forward)?;
        Self::from_stream(stream, descriptor, &config.tracks)
    }
}

impl<S> SessionTracker<S>
where
    S: Iterator<Item = Result<Packet>>,
{
    /// Prime a tracker from any ordered packet source.
    pub fn from_stream(
        source: S,
        descriptor: SessionDescriptor,
        tracks: &TrackCatalog,
    ) -> Result<Self> {
        let mut cursor = PacketCursor::new(source);
        let packet = cursor
            .seek_to(descriptor.race_start, "race start")?
            .into_telemetry()
            .ok_or_else(|| RaceDataError::CheckpointNotFound {
                checkpoint: "race start",
                hash: descriptor.race_start,
            })?;

        let roster_size = packet.num_participants;
        let mut registry = DriverRegistry::new();
        let expected = usize::try_from(roster_size).unwrap_or(0);
        let change = registry.populate(cursor.lookahead(), expected)?;
        debug!(drivers = change.added.len(), "Populated starting roster");

        let mut starting_grid: Vec<StartingGridEntry> = packet
            .roster()
            .iter()
            .enumerate()
            .filter_map(|(slot, info)| {
                registry.driver_in_slot(slot).map(|driver| StartingGridEntry {
                    position: usize::from(info.race_position()),
                    name: driver.name().to_string(),
                })
            })
            .collect();
        starting_grid.sort_by_key(|entry| entry.position);

        let track = tracks.nearest_by_length(packet.track_length).cloned();
        match &track {
            Some(track) => info!(track = %track.name, "Pit detection enabled"),
            None => debug!(length = packet.track_length, "No track geometry, pit detection off"),
        }

        let state = if descriptor.race_start == descriptor.race_end {
            TrackerState::Exhausted
        } else {
            TrackerState::Priming
        };

        let mut tracker = Self {
            cursor,
            descriptor,
            track,
            state,
            registry,
            starting_grid,
            packet,
            last_packet: None,
            roster_size,
            elapsed_time: 0.0,
        };
        tracker.update_elapsed_time(None);
        Ok(tracker)
    }

    /// Consume the next telemetry record.
    ///
    /// Participant packets and garbage ticks are skipped. Reaching the race-end
    /// record processes it and moves to [`TrackerState::Exhausted`]; the call
    /// after that returns [`Advance::Exhausted`].
    ///
    /// A record with an invalid sector number is rejected whole: no driver sees
    /// any part of it, the error is returned and the tracker moves to
    /// [`TrackerState::Faulted`], after which every call returns
    /// [`Advance::Exhausted`].
    pub fn advance(&mut self) -> Result<Advance> {
        if matches!(self.state, TrackerState::Exhausted | TrackerState::Faulted) {
            return Ok(Advance::Exhausted);
        }

        let packet = loop {
            let Some(packet) = self.cursor.next() else {
                debug!("Capture ended before the race end checkpoint");
                self.state = TrackerState::Exhausted;
                return Ok(Advance::Exhausted);
            };
            match packet?.into_telemetry() {
                Some(telemetry) if telemetry.is_garbage() => {
                    trace!(hash = %telemetry.header.hash, "Skipping garbage tick");
                }
                Some(telemetry) => break telemetry,
                None => {}
            }
        };

        let size = packet.num_participants;
        if size != self.roster_size && size != -1 {
            info!(from = self.roster_size, to = size, "Roster size changed");
            let expected = usize::try_from(size).unwrap_or(0);
            let change = self.registry.populate(self.cursor.lookahead(), expected)?;
            if !change.is_empty() {
                debug!(
                    added = change.added.len(),
                    dropped = change.dropped.len(),
                    restored = change.restored.len(),
                    "Reconciled roster"
                );
            }
            self.roster_size = size;
        }

        let observations = match self.observe_sectors(&packet) {
            Ok(observations) => observations,
            Err(err) => {
                warn!(hash = %packet.header.hash, "Rejecting record: {}", err);
                self.state = TrackerState::Faulted;
                return Err(err);
            }
        };
        self.record_timing(&packet, observations);

        let previous = std::mem::replace(&mut self.packet, packet);
        self.update_elapsed_time(Some(previous));

        self.state = if self.packet.header.hash == self.descriptor.race_end {
            info!(hash = %self.descriptor.race_end, "Reached race end");
            TrackerState::Exhausted
        } else {
            TrackerState::Running
        };
        Ok(Advance::Advanced)
    }

    /// Sector observation for every active, registered slot. Fails before any
    /// driver is touched if one slot reports a sector outside the lap.
    fn observe_sectors(&self, packet: &TelemetryPacket) -> Result<Vec<(usize, SectorTime)>> {
        packet
            .roster()
            .iter()
            .enumerate()
            .filter(|(slot, info)| {
                info.is_active() && self.registry.driver_in_slot(*slot).is_some()
            })
            .map(|(slot, info)| -> Result<(usize, SectorTime)> {
                let sector = LogicalSector::from_wire(info.sector())?;
                let observed =
                    SectorTime::new(info.last_sector_time, sector, info.lap_invalidated());
                Ok((slot, observed))
            })
            .collect()
    }

    fn record_timing(
        &mut self,
        packet: &TelemetryPacket,
        observations: Vec<(usize, SectorTime)>,
    ) {
        let racing = packet.race_state() == RaceState::Racing;
        let roster = packet.roster();

        for (slot, observed) in observations {
            let Some(driver) = self.registry.driver_in_slot_mut(slot) else {
                continue;
            };
            driver.add_sector_time(observed);

            if racing && let Some(track) = &self.track {
                driver.track_pit(track, roster[slot].world_position());
            }
        }
    }

    fn update_elapsed_time(&mut self, previous: Option<Box<TelemetryPacket>>) {
        let current_time = self.packet.timings.current_time;
        if current_time == CURRENT_TIME_UNSET {
            self.elapsed_time = 0.0;
            self.last_packet = None;
            return;
        }

        let completed = self.viewed_driver().map_or(0.0, Driver::race_time);
        self.elapsed_time = completed + f64::from(current_time);
        if previous.is_some() {
            self.last_packet = previous;
        }
    }

    /// Advance until exhausted. Returns the number of records consumed.
    pub fn run_to_end(&mut self) -> Result<usize> {
        let mut advanced = 0;
        while self.advance()? == Advance::Advanced {
            advanced += 1;
        }
        Ok(advanced)
    }
}

impl<S> SessionTracker<S> {
    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn descriptor(&self) -> &SessionDescriptor {
        &self.descriptor
    }

    pub fn registry(&self) -> &DriverRegistry {
        &self.registry
    }

    /// The most recent telemetry record.
    pub fn packet(&self) -> &TelemetryPacket {
        &self.packet
    }

    /// The record before [`Self::packet`], cleared whenever the game reports
    /// no session time.
    pub fn last_packet(&self) -> Option<&TelemetryPacket> {
        self.last_packet.as_deref()
    }

    /// Completed laps of the viewed driver plus the current lap time, in seconds.
    pub fn elapsed_time(&self) -> f64 {
        self.elapsed_time
    }

    pub fn roster_size(&self) -> i8 {
        self.roster_size
    }

    pub fn track(&self) -> Option<&TrackGeometry> {
        self.track.as_ref()
    }

    pub fn viewed_driver(&self) -> Option<&Driver> {
        let slot = usize::try_from(self.packet.viewed_participant_index).ok()?;
        self.registry.driver_in_slot(slot)
    }

    /// Active drivers ordered by their current race position.
    pub fn classification(&self) -> Vec<ClassificationEntry<'_>> {
        let viewed = usize::try_from(self.packet.viewed_participant_index).ok();

        let mut entries: Vec<ClassificationEntry<'_>> = self
            .packet
            .roster()
            .iter()
            .enumerate()
            .filter(|(_, info)| info.is_active())
            .filter_map(|(slot, info)| {
                self.registry.driver_in_slot(slot).map(|driver| ClassificationEntry {
                    position: usize::from(info.race_position()),
                    driver,
                    viewed: viewed == Some(slot),
                })
            })
            .collect();
        entries.sort_by_key(|entry| entry.position);
        entries
    }

    /// [`Self::classification`] plus every dropped driver, ranked by distance
    /// covered.
    pub fn all_driver_classification(&self) -> Vec<ClassificationEntry<'_>> {
        let mut entries = self.classification();
        entries.extend(
            self.registry
                .dropped_drivers()
                .map(|driver| ClassificationEntry { position: 0, driver, viewed: false }),
        );
        rank_by_distance(&mut entries);
        entries
    }

    pub fn starting_grid(&self) -> &[StartingGridEntry] {
        &self.starting_grid
    }

    /// Fastest valid lap among the current drivers.
    pub fn best_lap(&self) -> Option<FastestTime<'_>> {
        fastest(self.registry.drivers(), Driver::best_lap)
    }

    pub fn best_sector(&self, sector: LogicalSector) -> Option<FastestTime<'_>> {
        fastest(self.registry.drivers(), |driver| driver.best_sector(sector))
    }
}
