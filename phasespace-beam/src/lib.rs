//! phasespace-beam: BEAM phase-space file format.
//!
//! This crate holds the byte-layout logic of BEAM-style phase-space files:
//! the fixed header, the two record layouts, and the LATCH bit conventions
//! that encode particle charge. It performs no I/O; readers in
//! `phasespace-io` feed it byte slices.
//!
//! # File layout (little-endian throughout)
//!
//! | Offset | Field | Type |
//! |---|---|---|
//! | 0 | format tag | `MODE0` or `MODE2` |
//! | 5 | total records | i32 |
//! | 9 | photon records | i32 |
//! | 13 | max kinetic energy (MeV) | f32 |
//! | 17 | min electron kinetic energy (MeV) | f32 |
//! | 21 | incident particle count | f32 or i32 |
//! | 25 | padding | 3 or 7 bytes |
//!
//! The header and its padding fill exactly one record slot, so records
//! start at offset 28 (`MODE0`) or 32 (`MODE2`).
//!
//! # Key Components
//!
//! - [`Mode`] - Format tag and the sizes it implies
//! - [`PhsfHeader`] - Parsed header fields
//! - [`ParticleRecord`] / [`decode_record`] - Record codec
//! - [`classify`] - LATCH charge-bit classification

mod error;
mod header;
mod record;

pub use error::{Error, Result};
pub use header::{HeaderOptions, IncidentCount, IncidentCountEncoding, PhsfHeader, HEADER_LEN};
pub use record::{classify, decode_record, ParticleRecord, LATCH_ELECTRON, LATCH_POSITRON};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// Record layout selected by the file's format tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Mode {
    /// `MODE0`: 28-byte records without `z_last`.
    Short,
    /// `MODE2`: 32-byte records carrying `z_last`.
    Long,
}

impl Mode {
    /// Length of the format tag in bytes.
    pub const TAG_LEN: usize = 5;

    /// Tag of short-record files.
    pub const SHORT_TAG: &'static [u8; 5] = b"MODE0";

    /// Tag of long-record files.
    pub const LONG_TAG: &'static [u8; 5] = b"MODE2";

    /// Parses the 5-byte format tag.
    ///
    /// # Errors
    /// Returns `UnknownFormat` for anything but `MODE0` or `MODE2`.
    pub fn from_tag(tag: &[u8; 5]) -> Result<Self> {
        match tag {
            b"MODE0" => Ok(Mode::Short),
            b"MODE2" => Ok(Mode::Long),
            _ => Err(Error::UnknownFormat(*tag)),
        }
    }

    /// Returns the format tag.
    #[must_use]
    pub fn tag(self) -> &'static [u8; 5] {
        match self {
            Mode::Short => Self::SHORT_TAG,
            Mode::Long => Self::LONG_TAG,
        }
    }

    /// Size of one particle record in bytes.
    #[must_use]
    #[inline]
    pub fn record_size(self) -> usize {
        match self {
            Mode::Short => 28,
            Mode::Long => 32,
        }
    }

    /// Filler bytes between the header fields and the first record.
    #[must_use]
    #[inline]
    pub fn padding(self) -> usize {
        self.record_size() - HEADER_LEN
    }

    /// Whether records carry the last interaction depth.
    #[must_use]
    pub fn has_z_last(self) -> bool {
        self == Mode::Long
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Short => f.write_str("MODE0"),
            Mode::Long => f.write_str("MODE2"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_tag() {
        assert_eq!(Mode::from_tag(b"MODE0").unwrap(), Mode::Short);
        assert_eq!(Mode::from_tag(b"MODE2").unwrap(), Mode::Long);
        assert!(matches!(
            Mode::from_tag(b"MODE1"),
            Err(Error::UnknownFormat(tag)) if &tag == b"MODE1"
        ));
        assert!(Mode::from_tag(b"mode0").is_err());
    }

    #[test]
    fn test_mode_sizes() {
        assert_eq!(Mode::Short.record_size(), 28);
        assert_eq!(Mode::Short.padding(), 3);
        assert_eq!(Mode::Long.record_size(), 32);
        assert_eq!(Mode::Long.padding(), 7);
        assert!(Mode::Long.has_z_last());
        assert!(!Mode::Short.has_z_last());
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(Mode::Short.to_string(), "MODE0");
        assert_eq!(Mode::Long.tag(), b"MODE2");
    }

    #[test]
    fn test_unknown_format_message() {
        let err = Mode::from_tag(b"XYZ\0\x01").unwrap_err();
        assert!(err.to_string().contains("XYZ"));
    }
}
