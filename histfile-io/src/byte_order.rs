//! Byte order of foreign histogram files.
//!
//! ORNL files carry no byte-order marker. The order is guessed from the
//! histogram count at the start of the directory file: decoded in the
//! native (big-endian) order it must fall in `0..=MAX_PLAUSIBLE_COUNT`,
//! otherwise the file is taken to be byte swapped.
//!
//! A native file declaring more than [`MAX_PLAUSIBLE_COUNT`] histograms is
//! therefore misdetected. The threshold matches the files produced by the
//! acquisition systems in use and must not change.

use log::debug;

/// Largest histogram count accepted as unswapped.
pub const MAX_PLAUSIBLE_COUNT: i32 = 8000;

/// Byte order used to decode integer and float fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ByteOrder {
    /// Most significant byte first. Native order of every file we write.
    #[default]
    BigEndian,
    /// Least significant byte first.
    LittleEndian,
}

impl ByteOrder {
    /// Order assumed before any detection.
    pub const NATIVE: ByteOrder = ByteOrder::BigEndian;

    /// The opposite order.
    #[must_use]
    pub fn swapped(self) -> Self {
        match self {
            ByteOrder::BigEndian => ByteOrder::LittleEndian,
            ByteOrder::LittleEndian => ByteOrder::BigEndian,
        }
    }

    /// Picks the order in which `field`, a histogram count, is plausible.
    ///
    /// There is no verification beyond the range check.
    #[must_use]
    pub fn detect(field: [u8; 4]) -> Self {
        let native = Self::NATIVE.i32_from(field);
        let order = if (0..=MAX_PLAUSIBLE_COUNT).contains(&native) {
            Self::NATIVE
        } else {
            Self::NATIVE.swapped()
        };
        debug!("count field {field:02x?} decoded as {native}, using {order:?}");
        order
    }

    #[must_use]
    pub fn i32_from(self, bytes: [u8; 4]) -> i32 {
        match self {
            ByteOrder::BigEndian => i32::from_be_bytes(bytes),
            ByteOrder::LittleEndian => i32::from_le_bytes(bytes),
        }
    }

    #[must_use]
    pub fn i16_from(self, bytes: [u8; 2]) -> i16 {
        match self {
            ByteOrder::BigEndian => i16::from_be_bytes(bytes),
            ByteOrder::LittleEndian => i16::from_le_bytes(bytes),
        }
    }

    #[must_use]
    pub fn f32_from(self, bytes: [u8; 4]) -> f32 {
        match self {
            ByteOrder::BigEndian => f32::from_be_bytes(bytes),
            ByteOrder::LittleEndian => f32::from_le_bytes(bytes),
        }
    }

    #[must_use]
    pub fn f64_from(self, bytes: [u8; 8]) -> f64 {
        match self {
            ByteOrder::BigEndian => f64::from_be_bytes(bytes),
            ByteOrder::LittleEndian => f64::from_le_bytes(bytes),
        }
    }

    #[must_use]
    pub fn i32_bytes(self, value: i32) -> [u8; 4] {
        match self {
            ByteOrder::BigEndian => value.to_be_bytes(),
            ByteOrder::LittleEndian => value.to_le_bytes(),
        }
    }

    #[must_use]
    pub fn i16_bytes(self, value: i16) -> [u8; 2] {
        match self {
            ByteOrder::BigEndian => value.to_be_bytes(),
            ByteOrder::LittleEndian => value.to_le_bytes(),
        }
    }

    #[must_use]
    pub fn f32_bytes(self, value: f32) -> [u8; 4] {
        match self {
            ByteOrder::BigEndian => value.to_be_bytes(),
            ByteOrder::LittleEndian => value.to_le_bytes(),
        }
    }

    #[must_use]
    pub fn f64_bytes(self, value: f64) -> [u8; 8] {
        match self {
            ByteOrder::BigEndian => value.to_be_bytes(),
            ByteOrder::LittleEndian => value.to_le_bytes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_recovers_plausible_counts_in_either_order() {
        for count in 0..=MAX_PLAUSIBLE_COUNT {
            for order in [ByteOrder::BigEndian, ByteOrder::LittleEndian] {
                let field = order.i32_bytes(count);
                let detected = ByteOrder::detect(field);
                assert_eq!(detected.i32_from(field), count, "count {count} in {order:?}");
            }
        }
    }

    #[test]
    fn test_detect_flips_out_of_range() {
        // 9000 is valid big-endian but above the threshold.
        let field = 9000i32.to_be_bytes();
        assert_eq!(ByteOrder::detect(field), ByteOrder::LittleEndian);
        assert_eq!(ByteOrder::detect((-1i32).to_be_bytes()), ByteOrder::LittleEndian);
    }

    #[test]
    fn test_bytes_are_unsigned_octets() {
        let bytes = [0x00, 0x00, 0x00, 0xFF];
        assert_eq!(ByteOrder::BigEndian.i32_from(bytes), 255);
        assert_eq!(ByteOrder::LittleEndian.i32_from(bytes), -16_777_216);
        assert_eq!(ByteOrder::BigEndian.i16_from([0xFF, 0xFE]), -2);
        assert_eq!(ByteOrder::LittleEndian.i16_from([0xFF, 0x00]), 255);
    }
}
