//! State enumerations packed into the telemetry flag bytes
//!
//! Each enumeration decodes its raw sub-field and keeps values the protocol
//! does not document as `Unknown(u8)` rather than failing the packet.

use serde::{Deserialize, Serialize};

/// Overall application mode (low nibble of the game/session byte).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum GameState {
    Exited,
    FrontEnd,
    InGamePlaying,
    InGamePaused,
    Unknown(u8),
}

impl GameState {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => GameState::Exited,
            1 => GameState::FrontEnd,
            2 => GameState::InGamePlaying,
            3 => GameState::InGamePaused,
            other => GameState::Unknown(other),
        }
    }
}

/// Session type (high nibble of the game/session byte).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum SessionState {
    Invalid,
    Practice,
    Test,
    Qualify,
    FormationLap,
    Race,
    TimeAttack,
    Unknown(u8),
}

impl SessionState {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => SessionState::Invalid,
            1 => SessionState::Practice,
            2 => SessionState::Test,
            3 => SessionState::Qualify,
            4 => SessionState::FormationLap,
            5 => SessionState::Race,
            6 => SessionState::TimeAttack,
            other => SessionState::Unknown(other),
        }
    }
}

/// Race progress of the viewed participant (bits 0-2 of the race state byte).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum RaceState {
    Invalid,
    NotStarted,
    Racing,
    Finished,
    Disqualified,
    Retired,
    DidNotFinish,
    Unknown(u8),
}

impl RaceState {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => RaceState::Invalid,
            1 => RaceState::NotStarted,
            2 => RaceState::Racing,
            3 => RaceState::Finished,
            4 => RaceState::Disqualified,
            5 => RaceState::Retired,
            6 => RaceState::DidNotFinish,
            other => RaceState::Unknown(other),
        }
    }
}

/// Colour of the highest-priority flag shown to the viewed car.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum FlagColour {
    None,
    Green,
    Blue,
    White,
    Yellow,
    DoubleYellow,
    Black,
    Chequered,
    Unknown(u8),
}

impl FlagColour {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => FlagColour::None,
            1 => FlagColour::Green,
            2 => FlagColour::Blue,
            3 => FlagColour::White,
            4 => FlagColour::Yellow,
            5 => FlagColour::DoubleYellow,
            6 => FlagColour::Black,
            7 => FlagColour::Chequered,
            other => FlagColour::Unknown(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum FlagReason {
    None,
    SoloCrash,
    VehicleCrash,
    VehicleObstruction,
    Unknown(u8),
}

impl FlagReason {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => FlagReason::None,
            1 => FlagReason::SoloCrash,
            2 => FlagReason::VehicleCrash,
            3 => FlagReason::VehicleObstruction,
            other => FlagReason::Unknown(other),
        }
    }
}

/// Where the viewed car is relative to the pit lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum PitMode {
    None,
    DrivingIntoPits,
    InPit,
    DrivingOutOfPits,
    InGarage,
    Unknown(u8),
}

impl PitMode {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => PitMode::None,
            1 => PitMode::DrivingIntoPits,
            2 => PitMode::InPit,
            3 => PitMode::DrivingOutOfPits,
            4 => PitMode::InGarage,
            other => PitMode::Unknown(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum PitSchedule {
    None,
    Standard,
    DriveThrough,
    StopGo,
    Unknown(u8),
}

impl PitSchedule {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => PitSchedule::None,
            1 => PitSchedule::Standard,
            2 => PitSchedule::DriveThrough,
            3 => PitSchedule::StopGo,
            other => PitSchedule::Unknown(other),
        }
    }
}

/// Crash classification reported for the viewed car.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum CrashState {
    None,
    OffTrack,
    LargeProp,
    Spinning,
    Rolling,
    Unknown(u8),
}

impl CrashState {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => CrashState::None,
            1 => CrashState::OffTrack,
            2 => CrashState::LargeProp,
            3 => CrashState::Spinning,
            4 => CrashState::Rolling,
            other => CrashState::Unknown(other),
        }
    }
}
