//! Race session reconstruction.
//!
//! [`SessionBoundaryDetector`] locates the race inside a capture,
//! [`DriverRegistry`] keeps driver identity stable across slot reuse,
//! [`LapTimeline`] folds per-tick sector observations into laps, and
//! [`SessionTracker`] drives all three over the packet stream.

mod boundary;
mod classification;
mod config;
mod descriptor;
mod driver;
mod registry;
mod timeline;
mod track;
mod tracker;

pub use boundary::{
    SessionBoundaryDetector, confirm_populated, find_race_end, find_race_start, missing_checkpoint,
};
pub use classification::{ClassificationEntry, FastestTime, StartingGridEntry};
pub use config::SessionConfig;
pub use descriptor::{DescriptorCache, SessionDescriptor};
pub use driver::Driver;
pub use registry::{DriverRegistry, RosterChange};
pub use timeline::{LapTimeline, SECTOR_TIME_SENTINEL, SectorTime, SectorUpdate};
pub use track::{TrackCatalog, TrackGeometry};
pub use tracker::{Advance, SessionTracker, TrackerState};
