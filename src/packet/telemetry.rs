//! Telemetry packet (1367 bytes, packet type 0).
//!
//! Carries the viewed car's full state plus a 16-byte summary for each of the
//! 56 participant slots. The session reconstruction only reasons about the
//! state flags, timing and participant slots; car, tyre and environment blocks
//! are decoded and passed through.

use serde::{Deserialize, Serialize};

use super::PacketHeader;
use super::format::{
    MAX_PARTICIPANTS, PARTICIPANT_INFO_OFFSET, PacketReader, TELEMETRY_PACKET_SIZE,
    TRACK_LENGTH_OFFSET,
};
use crate::Result;
use crate::types::{
    BitField, CrashState, FlagColour, FlagReason, GameState, PitMode, PitSchedule, RaceState,
    SessionState, WireSector,
};

/// Last sector time reported before a participant has crossed any timing line.
pub const SECTOR_TIME_UNAVAILABLE: f32 = -123.0;

/// Raw controller input before assists are applied.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct UnfilteredInput {
    pub throttle: u8,
    pub brake: u8,
    pub steering: i8,
    pub clutch: u8,
}

/// Lap and sector timing of the viewed participant, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct Timings {
    pub best_lap_time: f32,
    pub last_lap_time: f32,
    /// Time into the current lap; -1.0 between sessions.
    pub current_time: f32,
    pub split_time_ahead: f32,
    pub split_time_behind: f32,
    pub split_time: f32,
    pub event_time_remaining: f32,
    pub personal_fastest_lap_time: f32,
    pub world_fastest_lap_time: f32,
    pub current_sector_times: [f32; 3],
    pub fastest_sector_times: [f32; 3],
    pub personal_fastest_sector_times: [f32; 3],
    pub world_fastest_sector_times: [f32; 3],
}

/// Engine, fuel and drivetrain readings of the viewed car.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct CarState {
    pub oil_temp: i16,
    pub oil_pressure: u16,
    pub water_temp: i16,
    pub water_pressure: u16,
    pub fuel_pressure: u16,
    flags: BitField,
    pub fuel_capacity: u8,
    pub brake: u8,
    pub throttle: u8,
    pub clutch: u8,
    pub steering: i8,
    pub fuel_level: f32,
    pub speed: f32,
    pub rpm: u16,
    pub max_rpm: u16,
    gear_num_gears: BitField,
    pub boost_amount: u8,
    pub enforced_pit_stop_lap: i8,
    crash_state: BitField,
}

impl CarState {
    pub fn headlight(&self) -> bool {
        self.flags.is_set(0)
    }

    pub fn engine_active(&self) -> bool {
        self.flags.is_set(1)
    }

    pub fn engine_warning(&self) -> bool {
        self.flags.is_set(2)
    }

    pub fn speed_limiter(&self) -> bool {
        self.flags.is_set(3)
    }

    pub fn abs(&self) -> bool {
        self.flags.is_set(4)
    }

    pub fn handbrake(&self) -> bool {
        self.flags.is_set(5)
    }

    pub fn stability(&self) -> bool {
        self.flags.is_set(6)
    }

    pub fn traction_control(&self) -> bool {
        self.flags.is_set(7)
    }

    pub fn gear(&self) -> u8 {
        self.gear_num_gears.low_nibble()
    }

    pub fn num_gears(&self) -> u8 {
        self.gear_num_gears.high_nibble()
    }

    pub fn crash_state(&self) -> CrashState {
        CrashState::from_raw(self.crash_state.low_nibble())
    }

    /// Extra joypad buttons packed into the crash state high nibble.
    pub fn crash_state_buttons(&self) -> u8 {
        self.crash_state.high_nibble()
    }
}

/// Orientation, velocity and acceleration of the viewed car.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct Motion {
    pub odometer: f32,
    pub orientation: [f32; 3],
    pub local_velocity: [f32; 3],
    pub world_velocity: [f32; 3],
    pub angular_velocity: [f32; 3],
    pub local_acceleration: [f32; 3],
    pub world_acceleration: [f32; 3],
    pub extents_centre: [f32; 3],
}

/// Per-wheel values, ordered front-left, front-right, rear-left, rear-right.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct Tyres {
    pub flags: [u8; 4],
    pub terrain: [u8; 4],
    pub y: [f32; 4],
    pub rps: [f32; 4],
    pub slip_speed: [f32; 4],
    pub temp: [u8; 4],
    pub grip: [u8; 4],
    pub height_above_ground: [f32; 4],
    pub lateral_stiffness: [f32; 4],
    pub wear: [u8; 4],
    pub brake_damage: [u8; 4],
    pub suspension_damage: [u8; 4],
    pub brake_temp: [i16; 4],
    pub tread_temp: [u16; 4],
    pub layer_temp: [u16; 4],
    pub carcass_temp: [u16; 4],
    pub rim_temp: [u16; 4],
    pub internal_air_temp: [u16; 4],
    pub wheel_local_position_y: [f32; 4],
    pub ride_height: [f32; 4],
    pub suspension_travel: [f32; 4],
    pub suspension_velocity: [f32; 4],
    pub air_pressure: [u16; 4],
}

impl Tyres {
    pub fn attached(&self) -> [bool; 4] {
        self.flags.map(|f| BitField::new(f).is_set(0))
    }

    pub fn inflated(&self) -> [bool; 4] {
        self.flags.map(|f| BitField::new(f).is_set(1))
    }

    pub fn on_ground(&self) -> [bool; 4] {
        self.flags.map(|f| BitField::new(f).is_set(2))
    }
}

/// Weather and track-surface conditions.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct Environment {
    pub ambient_temperature: i8,
    pub track_temperature: i8,
    pub rain_density: u8,
    pub wind_speed: i8,
    pub wind_direction_x: i8,
    pub wind_direction_y: i8,
}

/// One participant slot of a telemetry packet.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct ParticipantInfo {
    world_position: [i16; 3],
    pub current_lap_distance: u16,
    race_position: BitField,
    laps_completed: BitField,
    pub current_lap: u8,
    sector: BitField,
    pub last_sector_time: f32,
}

impl ParticipantInfo {
    fn read(reader: &mut PacketReader<'_>) -> Result<Self> {
        Ok(Self {
            world_position: reader.array(|r| r.i16())?,
            current_lap_distance: reader.u16()?,
            race_position: BitField::new(reader.u8()?),
            laps_completed: BitField::new(reader.u8()?),
            current_lap: reader.u8()?,
            sector: BitField::new(reader.u8()?),
            last_sector_time: reader.f32()?,
        })
    }

    /// World position in metres, with the 2-bit precision extension applied
    /// to the x and z axes.
    pub fn world_position(&self) -> [f32; 3] {
        let [x, y, z] = self.world_position;
        [
            f32::from(x) + f32::from(self.sector.bits(3, 2)) / 4.0,
            f32::from(y),
            f32::from(z) + f32::from(self.sector.bits(5, 2)) / 4.0,
        ]
    }

    pub fn race_position(&self) -> u8 {
        self.race_position.bits(0, 7)
    }

    pub fn is_active(&self) -> bool {
        self.race_position.is_set(7)
    }

    pub fn laps_completed(&self) -> u8 {
        self.laps_completed.bits(0, 7)
    }

    /// Whether the participant's current lap is flagged invalid.
    ///
    /// The grid start (wire sector 3, no sector time yet) is always flagged
    /// invalid by the game and is reported valid here.
    pub fn lap_invalidated(&self) -> bool {
        let flagged = self.laps_completed.is_set(7);
        if flagged
            && self.sector() == WireSector::Sector2
            && self.last_sector_time == SECTOR_TIME_UNAVAILABLE
        {
            return false;
        }
        flagged
    }

    pub fn sector(&self) -> WireSector {
        WireSector::from_raw(self.sector.bits(0, 3))
    }

    pub fn same_class(&self) -> bool {
        self.sector.is_set(7)
    }
}

/// Decoded telemetry packet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct TelemetryPacket {
    pub header: PacketHeader,
    game_session_state: BitField,
    pub viewed_participant_index: i8,
    /// Active roster size; -1 while the game has no session loaded.
    pub num_participants: i8,
    pub unfiltered: UnfilteredInput,
    race_state_flags: BitField,
    pub laps_in_event: u8,
    pub timings: Timings,
    pub joypad: u16,
    highest_flag: BitField,
    pit_mode_schedule: BitField,
    pub car: CarState,
    pub motion: Motion,
    pub tyres: Tyres,
    pub engine_speed: f32,
    pub engine_torque: f32,
    pub aero_damage: u8,
    pub engine_damage: u8,
    pub environment: Environment,
    pub participants: Vec<ParticipantInfo>,
    pub track_length: f32,
    pub wings: [u8; 2],
    d_pad: BitField,
}

impl TelemetryPacket {
    pub(crate) fn decode(header: PacketHeader, reader: &mut PacketReader<'_>) -> Result<Self> {
        let game_session_state = BitField::new(reader.u8()?);
        let viewed_participant_index = reader.i8()?;
        let num_participants = reader.i8()?;
        let unfiltered = UnfilteredInput {
            throttle: reader.u8()?,
            brake: reader.u8()?,
            steering: reader.i8()?,
            clutch: reader.u8()?,
        };
        let race_state_flags = BitField::new(reader.u8()?);
        let laps_in_event = reader.u8()?;

        let timings = Timings {
            best_lap_time: reader.f32()?,
            last_lap_time: reader.f32()?,
            current_time: reader.f32()?,
            split_time_ahead: reader.f32()?,
            split_time_behind: reader.f32()?,
            split_time: reader.f32()?,
            event_time_remaining: reader.f32()?,
            personal_fastest_lap_time: reader.f32()?,
            world_fastest_lap_time: reader.f32()?,
            current_sector_times: reader.array(|r| r.f32())?,
            fastest_sector_times: reader.array(|r| r.f32())?,
            personal_fastest_sector_times: reader.array(|r| r.f32())?,
            world_fastest_sector_times: reader.array(|r| r.f32())?,
        };

        let joypad = reader.u16()?;
        let highest_flag = BitField::new(reader.u8()?);
        let pit_mode_schedule = BitField::new(reader.u8()?);

        let car = CarState {
            oil_temp: reader.i16()?,
            oil_pressure: reader.u16()?,
            water_temp: reader.i16()?,
            water_pressure: reader.u16()?,
            fuel_pressure: reader.u16()?,
            flags: BitField::new(reader.u8()?),
            fuel_capacity: reader.u8()?,
            brake: reader.u8()?,
            throttle: reader.u8()?,
            clutch: reader.u8()?,
            steering: reader.i8()?,
            fuel_level: reader.f32()?,
            speed: reader.f32()?,
            rpm: reader.u16()?,
            max_rpm: reader.u16()?,
            gear_num_gears: BitField::new(reader.u8()?),
            boost_amount: reader.u8()?,
            enforced_pit_stop_lap: reader.i8()?,
            crash_state: BitField::new(reader.u8()?),
        };

        let motion = Motion {
            odometer: reader.f32()?,
            orientation: reader.array(|r| r.f32())?,
            local_velocity: reader.array(|r| r.f32())?,
            world_velocity: reader.array(|r| r.f32())?,
            angular_velocity: reader.array(|r| r.f32())?,
            local_acceleration: reader.array(|r| r.f32())?,
            world_acceleration: reader.array(|r| r.f32())?,
            extents_centre: reader.array(|r| r.f32())?,
        };

        let tyres = Tyres {
            flags: reader.array(|r| r.u8())?,
            terrain: reader.array(|r| r.u8())?,
            y: reader.array(|r| r.f32())?,
            rps: reader.array(|r| r.f32())?,
            slip_speed: reader.array(|r| r.f32())?,
            temp: reader.array(|r| r.u8())?,
            grip: reader.array(|r| r.u8())?,
            height_above_ground: reader.array(|r| r.f32())?,
            lateral_stiffness: reader.array(|r| r.f32())?,
            wear: reader.array(|r| r.u8())?,
            brake_damage: reader.array(|r| r.u8())?,
            suspension_damage: reader.array(|r| r.u8())?,
            brake_temp: reader.array(|r| r.i16())?,
            tread_temp: reader.array(|r| r.u16())?,
            layer_temp: reader.array(|r| r.u16())?,
            carcass_temp: reader.array(|r| r.u16())?,
            rim_temp: reader.array(|r| r.u16())?,
            internal_air_temp: reader.array(|r| r.u16())?,
            wheel_local_position_y: reader.array(|r| r.f32())?,
            ride_height: reader.array(|r| r.f32())?,
            suspension_travel: reader.array(|r| r.f32())?,
            suspension_velocity: reader.array(|r| r.f32())?,
            air_pressure: reader.array(|r| r.u16())?,
        };

        let engine_speed = reader.f32()?;
        let engine_torque = reader.f32()?;
        let aero_damage = reader.u8()?;
        let engine_damage = reader.u8()?;

        let environment = Environment {
            ambient_temperature: reader.i8()?,
            track_temperature: reader.i8()?,
            rain_density: reader.u8()?,
            wind_speed: reader.i8()?,
            wind_direction_x: reader.i8()?,
            wind_direction_y: reader.i8()?,
        };

        debug_assert_eq!(reader.position(), PARTICIPANT_INFO_OFFSET);
        let participants = (0..MAX_PARTICIPANTS)
            .map(|_| ParticipantInfo::read(reader))
            .collect::<Result<Vec<_>>>()?;

        debug_assert_eq!(reader.position(), TRACK_LENGTH_OFFSET);
        let track_length = reader.f32()?;
        let wings = reader.array(|r| r.u8())?;
        let d_pad = BitField::new(reader.u8()?);
        debug_assert_eq!(reader.position(), TELEMETRY_PACKET_SIZE);

        Ok(Self {
            header,
            game_session_state,
            viewed_participant_index,
            num_participants,
            unfiltered,
            race_state_flags,
            laps_in_event,
            timings,
            joypad,
            highest_flag,
            pit_mode_schedule,
            car,
            motion,
            tyres,
            engine_speed,
            engine_torque,
            aero_damage,
            engine_damage,
            environment,
            participants,
            track_length,
            wings,
            d_pad,
        })
    }

    pub fn game_state(&self) -> GameState {
        GameState::from_raw(self.game_session_state.low_nibble())
    }

    pub fn session_state(&self) -> SessionState {
        SessionState::from_raw(self.game_session_state.high_nibble())
    }

    pub fn race_state(&self) -> RaceState {
        RaceState::from_raw(self.race_state_flags.bits(0, 3))
    }

    /// Lap-invalid flag of the viewed participant.
    pub fn lap_invalidated(&self) -> bool {
        self.race_state_flags.is_set(3)
    }

    pub fn anti_lock_active(&self) -> bool {
        self.race_state_flags.is_set(4)
    }

    pub fn boost_active(&self) -> bool {
        self.race_state_flags.is_set(5)
    }

    pub fn highest_flag_colour(&self) -> FlagColour {
        FlagColour::from_raw(self.highest_flag.low_nibble())
    }

    pub fn highest_flag_reason(&self) -> FlagReason {
        FlagReason::from_raw(self.highest_flag.high_nibble())
    }

    pub fn pit_mode(&self) -> PitMode {
        PitMode::from_raw(self.pit_mode_schedule.low_nibble())
    }

    pub fn pit_schedule(&self) -> PitSchedule {
        PitSchedule::from_raw(self.pit_mode_schedule.high_nibble())
    }

    /// D-pad buttons (up, down, left, right) from the high nibble.
    pub fn d_pad_buttons(&self) -> u8 {
        self.d_pad.high_nibble()
    }

    /// Spurious tick emitted while playing with no race state.
    pub fn is_garbage(&self) -> bool {
        self.game_state() == GameState::InGamePlaying && self.race_state() == RaceState::Invalid
    }

    /// Slots covered by the declared roster size.
    pub fn roster(&self) -> &[ParticipantInfo] {
        let count = usize::try_from(self.num_participants).unwrap_or(0);
        &self.participants[..count.min(self.participants.len())]
    }

    /// Whether every rostered slot reports a race position and a sector.
    ///
    /// Right after the green flag the network often delivers packets whose
    /// slots are still zeroed.
    pub fn is_fully_populated(&self) -> bool {
        self.roster()
            .iter()
            .all(|p| p.race_position() != 0 && p.sector() != WireSector::Invalid)
    }

    pub fn viewed_participant(&self) -> Option<&ParticipantInfo> {
        usize::try_from(self.viewed_participant_index).ok().and_then(|i| self.participants.get(i))
    }
}
