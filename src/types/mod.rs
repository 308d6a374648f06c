//! Core value types decoded from the telemetry protocol.
//!
//! - [`BitField`] splits the packed flag bytes into their sub-fields
//! - the state enumerations ([`GameState`], [`SessionState`], [`RaceState`], ...) keep
//!   undocumented raw values as `Unknown(u8)`
//! - [`WireSector`] and [`LogicalSector`] separate the broadcast sector tag from the
//!   timing sector used to build laps

mod bitfield;
mod sector;
mod states;

pub use bitfield::BitField;
pub use sector::{LogicalSector, WireSector};
pub use states::{
    CrashState, FlagColour, FlagReason, GameState, PitMode, PitSchedule, RaceState,
    SessionState,
};
