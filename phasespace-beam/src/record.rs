//! Particle record codec and LATCH classification.

use crate::{Error, Mode, Result};
use phasespace_core::{Event, ParticleKind};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// LATCH bit 29: particle is a positron.
pub const LATCH_POSITRON: i32 = 0x2000_0000;

/// LATCH bit 30: particle is an electron.
pub const LATCH_ELECTRON: i32 = 0x4000_0000;

/// One decoded phase-space record.
///
/// After decoding `weight >= 0` always holds and `w` carries the sign of the
/// direction along the transport axis. `kinetic_energy` is exactly as stored.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParticleRecord {
    /// History flags, including the charge bits.
    pub latch: i32,
    /// Kinetic energy in MeV, sign as stored.
    pub kinetic_energy: f32,
    /// X position in cm.
    pub x: f32,
    /// Y position in cm.
    pub y: f32,
    /// Direction cosine along X.
    pub u: f32,
    /// Direction cosine along Y.
    pub v: f32,
    /// Direction cosine along the transport axis, derived from `u` and `v`.
    pub w: f32,
    /// Statistical weight.
    pub weight: f32,
    /// Last interaction depth in cm (`MODE2` only).
    pub z_last: Option<f32>,
}

impl ParticleRecord {
    /// Classifies the record from its LATCH bits.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ParticleKind {
        classify(self.latch)
    }

    /// Converts to an event tuple, using zero for a missing `z_last`.
    #[must_use]
    pub fn to_event(&self) -> Event {
        Event {
            weight: self.weight,
            energy: self.kinetic_energy,
            x: self.x,
            y: self.y,
            z_last: self.z_last.unwrap_or(0.0),
            u: self.u,
            v: self.v,
            w: self.w,
        }
    }
}

/// Classifies a particle from its LATCH word.
///
/// The electron bit is checked first, so a word with both charge bits set is
/// an electron. No charge bit means photon.
#[inline]
#[must_use]
pub fn classify(latch: i32) -> ParticleKind {
    if latch & LATCH_ELECTRON != 0 {
        ParticleKind::Electron
    } else if latch & LATCH_POSITRON != 0 {
        ParticleKind::Positron
    } else {
        ParticleKind::Photon
    }
}

/// Decodes one record of the given mode.
///
/// Layout: `latch` (i32), `E`, `X`, `Y`, `U`, `V`, `WT` (f32), then `ZLAST`
/// (f32) for `MODE2`. The transport-axis cosine is not stored; it is derived
/// as `sqrt(max(0, 1 - u² - v²))`. A negative stored weight marks a negative
/// `w`: both signs are flipped so the weight comes out non-negative.
///
/// # Errors
/// Returns `RecordLength` if `bytes` is not exactly one record long.
pub fn decode_record(bytes: &[u8], mode: Mode) -> Result<ParticleRecord> {
    if bytes.len() != mode.record_size() {
        return Err(Error::RecordLength {
            mode,
            expected: mode.record_size(),
            actual: bytes.len(),
        });
    }

    let latch = read_i32(bytes, 0);
    let kinetic_energy = read_f32(bytes, 4);
    let x = read_f32(bytes, 8);
    let y = read_f32(bytes, 12);
    let u = read_f32(bytes, 16);
    let v = read_f32(bytes, 20);
    let mut weight = read_f32(bytes, 24);
    let z_last = mode.has_z_last().then(|| read_f32(bytes, 28));

    let mut w = (1.0 - (u * u + v * v)).max(0.0).sqrt();
    if weight < 0.0 {
        weight = -weight;
        w = -w;
    }

    Ok(ParticleRecord {
        latch,
        kinetic_energy,
        x,
        y,
        u,
        v,
        w,
        weight,
        z_last,
    })
}

#[inline]
pub(crate) fn read_i32(bytes: &[u8], offset: usize) -> i32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[offset..offset + 4]);
    i32::from_le_bytes(word)
}

#[inline]
pub(crate) fn read_f32(bytes: &[u8], offset: usize) -> f32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[offset..offset + 4]);
    f32::from_le_bytes(word)
}
