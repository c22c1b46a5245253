//! Phase-space file header.

use crate::record::{read_f32, read_i32};
use crate::{Error, Mode, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Length of the header fields including the format tag, excluding padding.
pub const HEADER_LEN: usize = 25;

/// How the four `incident_particle_count` bytes are interpreted.
///
/// Producers disagree on this field: some write a 32-bit float, some a
/// 32-bit integer. The raw bytes are kept either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum IncidentCountEncoding {
    /// IEEE-754 single precision.
    #[default]
    Float32,
    /// Signed 32-bit integer.
    Int32,
}

/// Options controlling header interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HeaderOptions {
    /// Encoding of the incident particle count.
    pub incident_count: IncidentCountEncoding,
}

/// Number of original incident particles, with both readings of its bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IncidentCount {
    raw: [u8; 4],
    encoding: IncidentCountEncoding,
}

impl IncidentCount {
    /// Wraps raw little-endian bytes with the encoding used to read them.
    #[must_use]
    pub fn new(raw: [u8; 4], encoding: IncidentCountEncoding) -> Self {
        Self { raw, encoding }
    }

    /// The encoding this count is read with.
    #[must_use]
    pub fn encoding(&self) -> IncidentCountEncoding {
        self.encoding
    }

    /// The bytes read as a float.
    #[must_use]
    pub fn as_f32(&self) -> f32 {
        f32::from_le_bytes(self.raw)
    }

    /// The bytes read as an integer.
    #[must_use]
    pub fn as_i32(&self) -> i32 {
        i32::from_le_bytes(self.raw)
    }

    /// The count under the configured encoding.
    #[must_use]
    pub fn value(&self) -> f64 {
        self.value_as(self.encoding)
    }

    fn value_as(&self, encoding: IncidentCountEncoding) -> f64 {
        match encoding {
            IncidentCountEncoding::Float32 => f64::from(self.as_f32()),
            IncidentCountEncoding::Int32 => f64::from(self.as_i32()),
        }
    }

    fn plausible_as(&self, encoding: IncidentCountEncoding) -> bool {
        match encoding {
            IncidentCountEncoding::Float32 => {
                let v = self.as_f32();
                v == 0.0 || (v.is_normal() && v > 0.0)
            }
            IncidentCountEncoding::Int32 => self.as_i32() >= 0,
        }
    }

    /// Returns the other encoding when the configured one yields an
    /// implausible count (negative, subnormal, non-finite) and the other
    /// one does not.
    #[must_use]
    pub fn suspect_encoding(&self) -> Option<IncidentCountEncoding> {
        let other = match self.encoding {
            IncidentCountEncoding::Float32 => IncidentCountEncoding::Int32,
            IncidentCountEncoding::Int32 => IncidentCountEncoding::Float32,
        };
        (!self.plausible_as(self.encoding) && self.plausible_as(other)).then_some(other)
    }
}

/// Parsed phase-space header. Immutable once read.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PhsfHeader {
    /// Record layout.
    pub mode: Mode,
    /// Number of particle records in the file.
    pub total_records: i32,
    /// Number of photon records in the file.
    pub total_photon_records: i32,
    /// Maximum kinetic energy (MeV).
    pub max_kinetic_energy: f32,
    /// Minimum electron kinetic energy (MeV).
    pub min_electron_kinetic_energy: f32,
    /// Number of original incident particles.
    pub incident_particle_count: IncidentCount,
}

impl PhsfHeader {
    /// Parses the header from the first [`HEADER_LEN`] bytes of a file.
    ///
    /// Trailing bytes (padding, records) are ignored.
    ///
    /// # Errors
    /// Returns `HeaderLength` if fewer than [`HEADER_LEN`] bytes are given,
    /// or `UnknownFormat` if the tag is not recognized.
    pub fn parse(bytes: &[u8], options: &HeaderOptions) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(Error::HeaderLength {
                expected: HEADER_LEN,
                actual: bytes.len(),
            });
        }

        let mut tag = [0u8; Mode::TAG_LEN];
        tag.copy_from_slice(&bytes[..Mode::TAG_LEN]);
        let mode = Mode::from_tag(&tag)?;

        let mut raw_count = [0u8; 4];
        raw_count.copy_from_slice(&bytes[21..25]);

        Ok(Self {
            mode,
            total_records: read_i32(bytes, 5),
            total_photon_records: read_i32(bytes, 9),
            max_kinetic_energy: read_f32(bytes, 13),
            min_electron_kinetic_energy: read_f32(bytes, 17),
            incident_particle_count: IncidentCount::new(raw_count, options.incident_count),
        })
    }

    /// Number of records available, treating a negative count as zero.
    #[must_use]
    pub fn record_count(&self) -> usize {
        usize::try_from(self.total_records).unwrap_or(0)
    }

    /// Number of records to iterate: `min(requested, total_records)`,
    /// or all records when nothing is requested.
    #[must_use]
    pub fn record_budget(&self, requested: Option<usize>) -> usize {
        let total = self.record_count();
        requested.map_or(total, |n| n.min(total))
    }

    /// Offset of the first record from the start of the file.
    #[must_use]
    pub fn data_offset(&self) -> usize {
        self.mode.record_size()
    }
}
