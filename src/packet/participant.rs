//! Participant info string packets.
//!
//! The first 16 driver names arrive in a [`ParticipantPacket`] together with car and
//! track metadata. Larger grids follow up with [`AdditionalParticipantPacket`]s, each
//! carrying 16 more names and the slot index of its first name.

use serde::{Deserialize, Serialize};

use super::PacketHeader;
use super::format::{NAMES_PER_PACKET, PacketReader};
use crate::Result;

/// Participant packet (1347 bytes, packet type 1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct ParticipantPacket {
    pub header: PacketHeader,
    pub car_name: String,
    pub car_class_name: String,
    pub track_location: String,
    pub track_variation: String,
    /// Driver names by slot; unused grid positions are empty strings.
    pub names: Vec<String>,
    pub fastest_lap_times: Vec<f32>,
}

impl ParticipantPacket {
    pub(crate) fn decode(header: PacketHeader, reader: &mut PacketReader<'_>) -> Result<Self> {
        let car_name = reader.fixed_string()?;
        let car_class_name = reader.fixed_string()?;
        let track_location = reader.fixed_string()?;
        let track_variation = reader.fixed_string()?;
        let names = read_names(reader)?;
        let fastest_lap_times =
            (0..NAMES_PER_PACKET).map(|_| reader.f32()).collect::<Result<Vec<_>>>()?;

        Ok(Self {
            header,
            car_name,
            car_class_name,
            track_location,
            track_variation,
            names,
            fastest_lap_times,
        })
    }

    /// Non-empty names paired with their slot index.
    pub fn slotted_names(&self) -> impl Iterator<Item = (usize, &str)> {
        slotted(&self.names, 0)
    }
}

/// Additional participant packet (1028 bytes, packet type 2).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct AdditionalParticipantPacket {
    pub header: PacketHeader,
    /// Slot index of the first name in this packet.
    pub offset: u8,
    pub names: Vec<String>,
}

impl AdditionalParticipantPacket {
    pub(crate) fn decode(header: PacketHeader, reader: &mut PacketReader<'_>) -> Result<Self> {
        let offset = reader.u8()?;
        let names = read_names(reader)?;
        Ok(Self { header, offset, names })
    }

    /// Non-empty names paired with their slot index (`offset` + position).
    pub fn slotted_names(&self) -> impl Iterator<Item = (usize, &str)> {
        slotted(&self.names, usize::from(self.offset))
    }
}

fn read_names(reader: &mut PacketReader<'_>) -> Result<Vec<String>> {
    (0..NAMES_PER_PACKET).map(|_| reader.fixed_string()).collect()
}

fn slotted(names: &[String], base: usize) -> impl Iterator<Item = (usize, &str)> {
    names
        .iter()
        .enumerate()
        .filter(|(_, name)| !name.is_empty())
        .map(move |(i, name)| (base + i, name.as_str()))
}
