//! BitField type for the packed flag bytes of the telemetry protocol

use serde::{Deserialize, Serialize};

/// A single packed flag byte, decoded low-bit-first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct BitField(pub u8);

impl BitField {
    /// Create a new BitField from a raw byte.
    pub fn new(value: u8) -> Self {
        Self(value)
    }

    /// Check if a specific bit is set.
    pub fn is_set(&self, bit: u8) -> bool {
        (self.0 & (1 << bit)) != 0
    }

    /// Extract `width` bits starting at bit `shift`.
    pub fn bits(&self, shift: u8, width: u8) -> u8 {
        let mask = ((1u16 << width) - 1) as u8;
        (self.0 >> shift) & mask
    }

    /// Low nibble (bits 0-3).
    pub fn low_nibble(&self) -> u8 {
        self.bits(0, 4)
    }

    /// High nibble (bits 4-7).
    pub fn high_nibble(&self) -> u8 {
        self.bits(4, 4)
    }

    /// Get the raw byte.
    pub fn value(&self) -> u8 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn nibbles_split_the_byte() {
        let field = BitField::new(0b0101_0010);
        assert_eq!(field.low_nibble(), 2);
        assert_eq!(field.high_nibble(), 5);
    }

    #[test]
    fn sector_byte_layout() {
        // sector 3, x precision 2, z precision 1, same class
        let field = BitField::new(0b1011_0011);
        assert_eq!(field.bits(0, 3), 3);
        assert_eq!(field.bits(3, 2), 2);
        assert_eq!(field.bits(5, 2), 1);
        assert!(field.is_set(7));
    }

    proptest! {
        #[test]
        fn full_width_extraction_is_identity(value in any::<u8>()) {
            let field = BitField::new(value);
            prop_assert_eq!(field.bits(0, 8), value);
            prop_assert_eq!((field.high_nibble() << 4) | field.low_nibble(), value);
        }
    }
}
