//! Race session reconstruction from captured Project CARS UDP telemetry.
//!
//! A capture is a directory of raw UDP packets, one per file. This crate
//! decodes the three packet layouts the game broadcasts, locates the race inside
//! the capture and replays it to rebuild per-driver sector and lap timing, pit
//! stops and classification.
//!
//! # Features
//!
//! - **Packet codec**: strict decoding of telemetry, participant and additional
//!   participant packets with typed accessors for every bit-packed field
//! - **Boundary detection**: race start, finish and end located heuristically and
//!   cached next to the capture
//! - **Stable identity**: drivers tracked by name while the game reuses slots
//! - **Lap timing**: sector history with the game's lap-invalidation quirks applied
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use racedata::{SessionConfig, SessionTracker};
//!
//! fn main() -> racedata::Result<()> {
//!     let config = SessionConfig::from_path("racedata.yaml")?;
//!     let mut tracker = SessionTracker::open("/captures/brands-hatch", &config)?;
//!     tracker.run_to_end()?;
//!
//!     for entry in tracker.all_driver_classification() {
//!         let best = entry.driver.best_lap().map_or("-".to_string(), |t| format!("{t:.3}"));
//!         println!("{:>2} {:<24} {}", entry.position, entry.driver.name(), best);
//!     }
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod error;
#[cfg_attr(any(test, feature = "benchmark"), path = "test_utils.rs")]
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Capture decoding
pub mod packet;
pub mod stream;

// Session reconstruction
pub mod session;

// Core exports
pub use error::*;
pub use types::*;

pub use packet::{Packet, PacketHash, PacketHeader, PacketType, TelemetryPacket};
pub use session::{
    Advance, ClassificationEntry, Driver, DriverRegistry, LapTimeline, SectorTime,
    SessionBoundaryDetector, SessionConfig, SessionDescriptor, SessionTracker, StartingGridEntry,
    TrackCatalog, TrackGeometry, TrackerState,
};
pub use stream::{PacketStream, StreamOrder};
