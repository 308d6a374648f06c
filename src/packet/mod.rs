//! Packet codec for the telemetry UDP broadcast.
//!
//! Three fixed-size layouts exist and the buffer length alone selects which one
//! applies:
//!
//! | length | variant                                   | type tag |
//! |--------|-------------------------------------------|----------|
//! | 1367   | [`TelemetryPacket`]                       | 0        |
//! | 1347   | [`ParticipantPacket`]                     | 1        |
//! | 1028   | [`AdditionalParticipantPacket`]           | 2        |
//!
//! ## Usage Example
//!
//! ```rust
//! use racedata::packet::Packet;
//!
//! let buffer = vec![0u8; 1028];
//! # let mut buffer = buffer;
//! # buffer[2] = 2;
//! let packet = Packet::decode(&buffer)?;
//! assert!(packet.as_telemetry().is_none());
//! # Ok::<(), racedata::RaceDataError>(())
//! ```

pub mod format;
mod participant;
mod telemetry;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use tracing::trace;

use crate::types::BitField;
use crate::{RaceDataError, Result};
use format::{
    ADDITIONAL_PARTICIPANT_PACKET_SIZE, PARTICIPANT_PACKET_SIZE, PacketReader,
    TELEMETRY_PACKET_SIZE,
};

pub use participant::{AdditionalParticipantPacket, ParticipantPacket};
pub use telemetry::{
    CarState, Environment, Motion, ParticipantInfo, SECTOR_TIME_UNAVAILABLE, TelemetryPacket,
    Timings, Tyres, UnfilteredInput,
};

/// 2-bit packet type tag from the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum PacketType {
    Telemetry,
    Participant,
    AdditionalParticipant,
    Reserved,
}

impl PacketType {
    fn from_raw(raw: u8) -> Self {
        match raw & 0b11 {
            0 => PacketType::Telemetry,
            1 => PacketType::Participant,
            2 => PacketType::AdditionalParticipant,
            _ => PacketType::Reserved,
        }
    }

    fn for_length(length: usize) -> Option<Self> {
        match length {
            TELEMETRY_PACKET_SIZE => Some(PacketType::Telemetry),
            PARTICIPANT_PACKET_SIZE => Some(PacketType::Participant),
            ADDITIONAL_PARTICIPANT_PACKET_SIZE => Some(PacketType::AdditionalParticipant),
            _ => None,
        }
    }
}

/// Content hash identifying a packet within one capture.
///
/// The first 8 bytes of the SHA-256 digest of the raw buffer. Serialized as a
/// 16-digit hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct PacketHash(pub u64);

impl PacketHash {
    pub fn of(data: &[u8]) -> Self {
        let digest = Sha256::digest(data);
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        PacketHash(u64::from_be_bytes(prefix))
    }
}

impl fmt::Display for PacketHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl FromStr for PacketHash {
    type Err = RaceDataError;

    fn from_str(value: &str) -> Result<Self> {
        u64::from_str_radix(value, 16)
            .map(PacketHash)
            .map_err(|e| RaceDataError::parse_error("packet hash", format!("{value:?}: {e}")))
    }
}

impl Serialize for PacketHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PacketHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

/// Header common to all packet variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct PacketHeader {
    pub build_version: u16,
    pub packet_type: PacketType,
    /// 6-bit rolling sequence counter.
    pub sequence: u8,
    /// Hash of the raw buffer this packet was decoded from.
    pub hash: PacketHash,
}

/// A decoded packet.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    Telemetry(Box<TelemetryPacket>),
    Participant(ParticipantPacket),
    AdditionalParticipant(AdditionalParticipantPacket),
}

impl Packet {
    /// Decode one raw packet buffer.
    ///
    /// Fails with [`RaceDataError::MalformedPacket`] when the length matches no
    /// layout, when the header tag disagrees with the length, or when a string
    /// field is not UTF-8.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let expected = PacketType::for_length(data.len()).ok_or_else(|| {
            RaceDataError::malformed(data.len(), "length matches no packet layout")
        })?;

        let mut reader = PacketReader::new(data);
        let build_version = reader.u16()?;
        let type_and_count = BitField::new(reader.u8()?);
        let packet_type = PacketType::from_raw(type_and_count.bits(0, 2));
        if packet_type != expected {
            return Err(RaceDataError::malformed(
                data.len(),
                format!("header declares {:?} but length selects {:?}", packet_type, expected),
            ));
        }

        let header = PacketHeader {
            build_version,
            packet_type,
            sequence: type_and_count.bits(2, 6),
            hash: PacketHash::of(data),
        };

        let packet = match expected {
            PacketType::Telemetry => {
                Packet::Telemetry(Box::new(TelemetryPacket::decode(header, &mut reader)?))
            }
            PacketType::Participant => {
                Packet::Participant(ParticipantPacket::decode(header, &mut reader)?)
            }
            PacketType::AdditionalParticipant => Packet::AdditionalParticipant(
                AdditionalParticipantPacket::decode(header, &mut reader)?,
            ),
            PacketType::Reserved => {
                return Err(RaceDataError::malformed(data.len(), "reserved packet type"));
            }
        };
        reader.finish()?;

        trace!("Decoded {:?} packet {} (sequence {})", packet_type, header.hash, header.sequence);
        Ok(packet)
    }

    pub fn header(&self) -> &PacketHeader {
        match self {
            Packet::Telemetry(p) => &p.header,
            Packet::Participant(p) => &p.header,
            Packet::AdditionalParticipant(p) => &p.header,
        }
    }

    pub fn hash(&self) -> PacketHash {
        self.header().hash
    }

    pub fn packet_type(&self) -> PacketType {
        self.header().packet_type
    }

    pub fn as_telemetry(&self) -> Option<&TelemetryPacket> {
        match self {
            Packet::Telemetry(p) => Some(p),
            _ => None,
        }
    }

    pub fn into_telemetry(self) -> Option<Box<TelemetryPacket>> {
        match self {
            Packet::Telemetry(p) => Some(p),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{TelemetryPacketBuilder, participant_packet};
    use crate::types::RaceState;
    use proptest::prelude::*;

    #[test]
    fn dispatch_by_length() -> anyhow::Result<()> {
        let telemetry = Packet::decode(&TelemetryPacketBuilder::new().build())?;
        assert_eq!(telemetry.packet_type(), PacketType::Telemetry);
        assert!(telemetry.as_telemetry().is_some());

        let participant = Packet::decode(&participant_packet(&["A"]))?;
        assert_eq!(participant.packet_type(), PacketType::Participant);
        assert!(participant.into_telemetry().is_none());
        Ok(())
    }

    #[test]
    fn header_tag_must_match_length() {
        let mut buffer = TelemetryPacketBuilder::new().build();
        buffer[2] = 0b0000_0101; // sequence 1, participant tag
        assert!(matches!(Packet::decode(&buffer), Err(RaceDataError::MalformedPacket { .. })));

        buffer[2] = 0b0000_0011;
        assert!(matches!(Packet::decode(&buffer), Err(RaceDataError::MalformedPacket { .. })));
    }

    #[test]
    fn sequence_counter_uses_upper_bits() -> anyhow::Result<()> {
        let mut buffer = TelemetryPacketBuilder::new().build();
        buffer[0] = 0x10;
        buffer[1] = 0x04;
        buffer[2] = 0b1111_1100;

        let packet = Packet::decode(&buffer)?;
        assert_eq!(packet.header().build_version, 0x0410);
        assert_eq!(packet.header().sequence, 63);
        Ok(())
    }

    #[test]
    fn hash_depends_on_content() -> anyhow::Result<()> {
        let racing = TelemetryPacketBuilder::new().race_state(RaceState::Racing).build();
        let finished = TelemetryPacketBuilder::new().race_state(RaceState::Finished).build();

        assert_eq!(Packet::decode(&racing)?.hash(), PacketHash::of(&racing));
        assert_ne!(PacketHash::of(&racing), PacketHash::of(&finished));
        Ok(())
    }

    #[test]
    fn hash_serializes_as_hex() -> anyhow::Result<()> {
        let hash = PacketHash(0x00ab_cdef_0123_4567);
        let yaml = serde_yaml_ng::to_string(&hash)?;
        assert!(yaml.contains("00abcdef01234567"));

        let back: PacketHash = serde_yaml_ng::from_str(&yaml)?;
        assert_eq!(back, hash);

        assert!(serde_yaml_ng::from_str::<PacketHash>("not-hex").is_err());
        Ok(())
    }

    proptest! {
        #[test]
        fn unknown_lengths_are_malformed(length in 0usize..2048) {
            prop_assume!(PacketType::for_length(length).is_none());
            let buffer = vec![0u8; length];
            match Packet::decode(&buffer) {
                Err(RaceDataError::MalformedPacket { length: reported, .. }) => {
                    prop_assert_eq!(reported, length)
                }
                other => prop_assert!(false, "expected MalformedPacket, got {:?}", other.map(|p| p.packet_type())),
            }
        }
    }
}
