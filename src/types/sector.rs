//! Sector numbering: the wire enumeration and the logical timing sectors.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{RaceDataError, Result};

/// Sector tag as broadcast in bits 0-2 of a participant's sector byte.
///
/// The protocol's "sector 1" marks the start/finish straight, so wire tags do not
/// line up with the timing sectors a lap is built from. See [`LogicalSector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum WireSector {
    Invalid,
    Start,
    Sector1,
    Sector2,
    Finish,
    Stop,
    Unknown(u8),
}

impl WireSector {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => WireSector::Invalid,
            1 => WireSector::Start,
            2 => WireSector::Sector1,
            3 => WireSector::Sector2,
            4 => WireSector::Finish,
            5 => WireSector::Stop,
            other => WireSector::Unknown(other),
        }
    }

    pub fn raw(self) -> u8 {
        match self {
            WireSector::Invalid => 0,
            WireSector::Start => 1,
            WireSector::Sector1 => 2,
            WireSector::Sector2 => 3,
            WireSector::Finish => 4,
            WireSector::Stop => 5,
            WireSector::Unknown(other) => other,
        }
    }
}

/// Timing sector used for lap assembly: S1 → S2 → S3 completes a lap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum LogicalSector {
    S1,
    S2,
    S3,
}

impl LogicalSector {
    /// Remap a wire sector tag: wire 1 → S3, wire 2 → S1, wire 3 → S2.
    ///
    /// Any other tag fails with [`RaceDataError::InvalidSectorNumber`].
    pub fn from_wire(wire: WireSector) -> Result<Self> {
        match wire {
            WireSector::Start => Ok(LogicalSector::S3),
            WireSector::Sector1 => Ok(LogicalSector::S1),
            WireSector::Sector2 => Ok(LogicalSector::S2),
            other => Err(RaceDataError::InvalidSectorNumber { sector: other.raw() }),
        }
    }

    /// 1-based sector number.
    pub fn number(self) -> u8 {
        match self {
            LogicalSector::S1 => 1,
            LogicalSector::S2 => 2,
            LogicalSector::S3 => 3,
        }
    }
}

impl TryFrom<u8> for LogicalSector {
    type Error = RaceDataError;

    fn try_from(number: u8) -> Result<Self> {
        match number {
            1 => Ok(LogicalSector::S1),
            2 => Ok(LogicalSector::S2),
            3 => Ok(LogicalSector::S3),
            sector => Err(RaceDataError::InvalidSectorNumber { sector }),
        }
    }
}

impl fmt::Display for LogicalSector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.number())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn wire_tags_are_renumbered() -> anyhow::Result<()> {
        assert_eq!(LogicalSector::from_wire(WireSector::from_raw(1))?, LogicalSector::S3);
        assert_eq!(LogicalSector::from_wire(WireSector::from_raw(2))?, LogicalSector::S1);
        assert_eq!(LogicalSector::from_wire(WireSector::from_raw(3))?, LogicalSector::S2);
        Ok(())
    }

    #[test]
    fn non_timing_tags_are_rejected() {
        for raw in [0u8, 4, 5, 6, 7] {
            match LogicalSector::from_wire(WireSector::from_raw(raw)) {
                Err(RaceDataError::InvalidSectorNumber { sector }) => assert_eq!(sector, raw),
                other => panic!("expected InvalidSectorNumber for {raw}, got {other:?}"),
            }
        }
    }

    #[test]
    fn numbers_round_trip_through_try_from() -> anyhow::Result<()> {
        for sector in [LogicalSector::S1, LogicalSector::S2, LogicalSector::S3] {
            assert_eq!(LogicalSector::try_from(sector.number())?, sector);
        }
        assert!(LogicalSector::try_from(0).is_err());
        assert_eq!(LogicalSector::S2.to_string(), "S2");
        Ok(())
    }

    proptest! {
        #[test]
        fn raw_tag_is_preserved(raw in 0u8..8) {
            prop_assert_eq!(WireSector::from_raw(raw).raw(), raw);
        }
    }
}
