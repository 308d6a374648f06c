//! Binary layout constants and a bounds-checked little-endian reader.
//!
//! ## Packet Structure
//!
//! Every packet starts with a 3-byte header:
//!
//! | offset | type  | field                                           |
//! |--------|-------|-------------------------------------------------|
//! | 0      | `u16` | protocol build version                          |
//! | 2      | `u8`  | packet type (bits 0-1) and sequence (bits 2-7)  |
//!
//! The packet variant is selected by total length alone; the header tag must agree.

use crate::{RaceDataError, Result};

pub const HEADER_SIZE: usize = 3;
pub const TELEMETRY_PACKET_SIZE: usize = 1367;
pub const PARTICIPANT_PACKET_SIZE: usize = 1347;
pub const ADDITIONAL_PARTICIPANT_PACKET_SIZE: usize = 1028;

/// Width of every fixed string field.
pub const NAME_FIELD_SIZE: usize = 64;
/// Driver names carried by one participant or additional participant packet.
pub const NAMES_PER_PACKET: usize = 16;
/// Participant slots carried by every telemetry packet.
pub const MAX_PARTICIPANTS: usize = 56;
pub const PARTICIPANT_INFO_SIZE: usize = 16;

// Telemetry field offsets
pub const GAME_SESSION_STATE_OFFSET: usize = 3;
pub const VIEWED_PARTICIPANT_OFFSET: usize = 4;
pub const NUM_PARTICIPANTS_OFFSET: usize = 5;
pub const RACE_STATE_FLAGS_OFFSET: usize = 10;
pub const CURRENT_TIME_OFFSET: usize = 20;
pub const PARTICIPANT_INFO_OFFSET: usize = 464;
pub const TRACK_LENGTH_OFFSET: usize = 1360;

// Participant field offsets
pub const CAR_NAME_OFFSET: usize = 3;
pub const PARTICIPANT_NAMES_OFFSET: usize = 259;
pub const FASTEST_LAP_TIMES_OFFSET: usize = 1283;

// Additional participant field offsets
pub const OFFSET_FIELD_OFFSET: usize = 3;
pub const ADDITIONAL_NAMES_OFFSET: usize = 4;

/// Sequential reader over one packet buffer.
///
/// Every read is bounds checked and reported as [`RaceDataError::MalformedPacket`]
/// against the full buffer length.
pub(crate) struct PacketReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> PacketReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        let end = self.position + N;
        let bytes = self.data.get(self.position..end).ok_or_else(|| {
            RaceDataError::malformed(
                self.data.len(),
                format!("need {} bytes at offset {}", N, self.position),
            )
        })?;

        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        self.position = end;
        Ok(out)
    }

    pub fn u8(&mut self) -> Result<u8> {
        Ok(self.take::<1>()?[0])
    }

    pub fn i8(&mut self) -> Result<i8> {
        Ok(i8::from_le_bytes(self.take::<1>()?))
    }

    pub fn u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.take::<2>()?))
    }

    pub fn i16(&mut self) -> Result<i16> {
        Ok(i16::from_le_bytes(self.take::<2>()?))
    }

    pub fn f32(&mut self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.take::<4>()?))
    }

    /// Read `N` consecutive values with the same element reader.
    pub fn array<T, const N: usize>(
        &mut self,
        mut read: impl FnMut(&mut Self) -> Result<T>,
    ) -> Result<[T; N]>
    where
        T: Copy + Default,
    {
        let mut out = [T::default(); N];
        for value in out.iter_mut() {
            *value = read(self)?;
        }
        Ok(out)
    }

    /// Read a 64-byte string field: bytes after the first NUL are ignored and
    /// the remainder must be valid UTF-8.
    pub fn fixed_string(&mut self) -> Result<String> {
        let start = self.position;
        let raw = self.take::<NAME_FIELD_SIZE>()?;
        let end = raw.iter().position(|&b| b == 0).unwrap_or(NAME_FIELD_SIZE);

        std::str::from_utf8(&raw[..end]).map(str::to_owned).map_err(|e| {
            RaceDataError::malformed(
                self.data.len(),
                format!("string field at offset {} is not UTF-8: {}", start, e),
            )
        })
    }

    /// Verify the whole buffer was consumed.
    pub fn finish(self) -> Result<()> {
        if self.position != self.data.len() {
            return Err(RaceDataError::malformed(
                self.data.len(),
                format!("layout consumed {} of {} bytes", self.position, self.data.len()),
            ));
        }
        Ok(())
    }
}
