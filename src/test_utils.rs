//! Synthetic packet encoders and capture fixtures for tests and benchmarks.
//!
//! Captures are never checked into the repository; tests build the exact packets
//! they need with [`TelemetryPacketBuilder`], [`participant_packet`] and
//! [`additional_participant_packet`], then lay them out on disk with
//! [`write_capture`].

#![cfg(any(test, feature = "benchmark"))]

use std::path::{Path, PathBuf};

use crate::packet::format::{
    ADDITIONAL_NAMES_OFFSET, ADDITIONAL_PARTICIPANT_PACKET_SIZE, CAR_NAME_OFFSET,
    CURRENT_TIME_OFFSET, FASTEST_LAP_TIMES_OFFSET, GAME_SESSION_STATE_OFFSET, MAX_PARTICIPANTS,
    NAME_FIELD_SIZE, NAMES_PER_PACKET, NUM_PARTICIPANTS_OFFSET, OFFSET_FIELD_OFFSET,
    PARTICIPANT_INFO_OFFSET, PARTICIPANT_INFO_SIZE, PARTICIPANT_NAMES_OFFSET,
    PARTICIPANT_PACKET_SIZE, RACE_STATE_FLAGS_OFFSET, TELEMETRY_PACKET_SIZE, TRACK_LENGTH_OFFSET,
    VIEWED_PARTICIPANT_OFFSET,
};
use crate::types::{GameState, RaceState, SessionState};

/// Build version written into every synthetic header.
pub const TEST_BUILD_VERSION: u16 = 1122;

/// Raw contents of one telemetry participant slot.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ParticipantSlot {
    pub world_position: [i16; 3],
    pub x_precision: u8,
    pub z_precision: u8,
    pub lap_distance: u16,
    pub race_position: u8,
    pub active: bool,
    pub laps_completed: u8,
    pub lap_invalid: bool,
    pub current_lap: u8,
    pub wire_sector: u8,
    pub same_class: bool,
    pub last_sector_time: f32,
}

impl ParticipantSlot {
    /// An active participant at `race_position` that last crossed `wire_sector`.
    pub fn racing(race_position: u8, wire_sector: u8, last_sector_time: f32) -> Self {
        Self { race_position, active: true, wire_sector, last_sector_time, ..Self::default() }
    }

    pub fn at(mut self, x: i16, y: i16, z: i16) -> Self {
        self.world_position = [x, y, z];
        self
    }

    pub fn invalid(mut self) -> Self {
        self.lap_invalid = true;
        self
    }

    fn encode(&self, out: &mut [u8]) {
        for (axis, value) in self.world_position.iter().enumerate() {
            out[axis * 2..axis * 2 + 2].copy_from_slice(&value.to_le_bytes());
        }
        out[6..8].copy_from_slice(&self.lap_distance.to_le_bytes());
        out[8] = (self.race_position & 0x7F) | (u8::from(self.active) << 7);
        out[9] = (self.laps_completed & 0x7F) | (u8::from(self.lap_invalid) << 7);
        out[10] = self.current_lap;
        out[11] = (self.wire_sector & 0b111)
            | ((self.x_precision & 0b11) << 3)
            | ((self.z_precision & 0b11) << 5)
            | (u8::from(self.same_class) << 7);
        out[12..16].copy_from_slice(&self.last_sector_time.to_le_bytes());
    }
}

/// Builder for 1367-byte telemetry packets.
///
/// Defaults to a race session in progress (`InGamePlaying`, `Race`, `Racing`)
/// with an empty roster.
#[derive(Debug, Clone)]
pub struct TelemetryPacketBuilder {
    sequence: u8,
    game_state: GameState,
    session_state: SessionState,
    race_state: RaceState,
    viewed: i8,
    num_participants: i8,
    current_time: f32,
    track_length: f32,
    slots: Vec<ParticipantSlot>,
}

impl Default for TelemetryPacketBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryPacketBuilder {
    pub fn new() -> Self {
        Self {
            sequence: 0,
            game_state: GameState::InGamePlaying,
            session_state: SessionState::Race,
            race_state: RaceState::Racing,
            viewed: 0,
            num_participants: 0,
            current_time: 0.0,
            track_length: 0.0,
            slots: vec![ParticipantSlot::default(); MAX_PARTICIPANTS],
        }
    }

    pub fn sequence(mut self, sequence: u8) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn game_state(mut self, state: GameState) -> Self {
        self.game_state = state;
        self
    }

    pub fn session_state(mut self, state: SessionState) -> Self {
        self.session_state = state;
        self
    }

    pub fn race_state(mut self, state: RaceState) -> Self {
        self.race_state = state;
        self
    }

    pub fn viewed(mut self, index: i8) -> Self {
        self.viewed = index;
        self
    }

    pub fn num_participants(mut self, count: i8) -> Self {
        self.num_participants = count;
        self
    }

    pub fn current_time(mut self, seconds: f32) -> Self {
        self.current_time = seconds;
        self
    }

    pub fn track_length(mut self, metres: f32) -> Self {
        self.track_length = metres;
        self
    }

    pub fn slot(mut self, index: usize, slot: ParticipantSlot) -> Self {
        self.slots[index] = slot;
        self
    }

    /// Fill the first slots in order and set the roster size to match.
    pub fn roster(mut self, slots: &[ParticipantSlot]) -> Self {
        self.slots[..slots.len()].copy_from_slice(slots);
        self.num_participants = slots.len() as i8;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut buffer = vec![0u8; TELEMETRY_PACKET_SIZE];
        write_header(&mut buffer, 0, self.sequence);

        buffer[GAME_SESSION_STATE_OFFSET] =
            game_state_raw(self.game_state) | (session_state_raw(self.session_state) << 4);
        buffer[VIEWED_PARTICIPANT_OFFSET] = self.viewed as u8;
        buffer[NUM_PARTICIPANTS_OFFSET] = self.num_participants as u8;
        buffer[RACE_STATE_FLAGS_OFFSET] = race_state_raw(self.race_state);
        buffer[CURRENT_TIME_OFFSET..CURRENT_TIME_OFFSET + 4]
            .copy_from_slice(&self.current_time.to_le_bytes());

        for (index, slot) in self.slots.iter().enumerate() {
            let start = PARTICIPANT_INFO_OFFSET + index * PARTICIPANT_INFO_SIZE;
            slot.encode(&mut buffer[start..start + PARTICIPANT_INFO_SIZE]);
        }

        buffer[TRACK_LENGTH_OFFSET..TRACK_LENGTH_OFFSET + 4]
            .copy_from_slice(&self.track_length.to_le_bytes());
        buffer
    }
}

/// Encode a 1347-byte participant packet. Missing names are left empty.
pub fn participant_packet<S: AsRef<str>>(names: &[S]) -> Vec<u8> {
    let mut buffer = vec![0u8; PARTICIPANT_PACKET_SIZE];
    write_header(&mut buffer, 1, 0);

    let metadata = ["Formula Test", "Test Class", "Test Circuit", "Grand Prix"];
    for (i, text) in metadata.iter().enumerate() {
        write_string(&mut buffer, CAR_NAME_OFFSET + i * NAME_FIELD_SIZE, text);
    }
    for (i, name) in names.iter().take(NAMES_PER_PACKET).enumerate() {
        write_string(&mut buffer, PARTICIPANT_NAMES_OFFSET + i * NAME_FIELD_SIZE, name.as_ref());
    }
    for i in 0..NAMES_PER_PACKET {
        let start = FASTEST_LAP_TIMES_OFFSET + i * 4;
        buffer[start..start + 4].copy_from_slice(&(-1.0f32).to_le_bytes());
    }
    buffer
}

/// Encode a 1028-byte additional participant packet starting at slot `offset`.
pub fn additional_participant_packet<S: AsRef<str>>(offset: u8, names: &[S]) -> Vec<u8> {
    let mut buffer = vec![0u8; ADDITIONAL_PARTICIPANT_PACKET_SIZE];
    write_header(&mut buffer, 2, 0);
    buffer[OFFSET_FIELD_OFFSET] = offset;

    for (i, name) in names.iter().take(NAMES_PER_PACKET).enumerate() {
        write_string(&mut buffer, ADDITIONAL_NAMES_OFFSET + i * NAME_FIELD_SIZE, name.as_ref());
    }
    buffer
}

/// Write each packet to its own `pdata<N>` file, numbered from 1.
pub fn write_capture(dir: &Path, packets: &[Vec<u8>]) -> std::io::Result<Vec<PathBuf>> {
    packets
        .iter()
        .enumerate()
        .map(|(i, packet)| {
            let path = dir.join(format!("pdata{}", i + 1));
            std::fs::write(&path, packet)?;
            Ok(path)
        })
        .collect()
}

fn write_header(buffer: &mut [u8], tag: u8, sequence: u8) {
    buffer[0..2].copy_from_slice(&TEST_BUILD_VERSION.to_le_bytes());
    buffer[2] = (tag & 0b11) | (sequence << 2);
}

fn write_string(buffer: &mut [u8], offset: usize, text: &str) {
    let bytes = text.as_bytes();
    let len = bytes.len().min(NAME_FIELD_SIZE - 1);
    buffer[offset..offset + len].copy_from_slice(&bytes[..len]);
}

fn game_state_raw(state: GameState) -> u8 {
    match state {
        GameState::Exited => 0,
        GameState::FrontEnd => 1,
        GameState::InGamePlaying => 2,
        GameState::InGamePaused => 3,
        GameState::Unknown(raw) => raw,
    }
}

fn session_state_raw(state: SessionState) -> u8 {
    match state {
        SessionState::Invalid => 0,
        SessionState::Practice => 1,
        SessionState::Test => 2,
        SessionState::Qualify => 3,
        SessionState::FormationLap => 4,
        SessionState::Race => 5,
        SessionState::TimeAttack => 6,
        SessionState::Unknown(raw) => raw,
    }
}

fn race_state_raw(state: RaceState) -> u8 {
    match state {
        RaceState::Invalid => 0,
        RaceState::NotStarted => 1,
        RaceState::Racing => 2,
        RaceState::Finished => 3,
        RaceState::Disqualified => 4,
        RaceState::Retired => 5,
        RaceState::DidNotFinish => 6,
        RaceState::Unknown(raw) => raw,
    }
}
