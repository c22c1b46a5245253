//! Particle species and per-species bookkeeping.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Particle species carried by a phase-space record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ParticleKind {
    /// Neutral particle (no charge bit set).
    Photon,
    /// Negatively charged particle.
    Electron,
    /// Positively charged particle.
    Positron,
}

impl ParticleKind {
    /// Returns the particle charge in units of the elementary charge.
    #[inline]
    #[must_use]
    pub fn charge(self) -> i8 {
        match self {
            ParticleKind::Photon => 0,
            ParticleKind::Electron => -1,
            ParticleKind::Positron => 1,
        }
    }

    /// Returns true for electrons and positrons.
    #[inline]
    #[must_use]
    pub fn is_charged(self) -> bool {
        self.charge() != 0
    }
}

/// Selects which particle species an event stream yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ParticleFilter {
    /// Photons only (the default analysis workflow).
    #[default]
    Photons,
    /// Electrons only.
    Electrons,
    /// Positrons only.
    Positrons,
    /// Electrons and positrons.
    Charged,
    /// Every record.
    All,
}

impl ParticleFilter {
    /// Returns true if records of `kind` pass this filter.
    #[inline]
    #[must_use]
    pub fn accepts(self, kind: ParticleKind) -> bool {
        match self {
            ParticleFilter::Photons => kind == ParticleKind::Photon,
            ParticleFilter::Electrons => kind == ParticleKind::Electron,
            ParticleFilter::Positrons => kind == ParticleKind::Positron,
            ParticleFilter::Charged => kind.is_charged(),
            ParticleFilter::All => true,
        }
    }
}

/// Running per-species record counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParticleCounts {
    /// Number of photon records seen.
    pub photons: u64,
    /// Number of electron records seen.
    pub electrons: u64,
    /// Number of positron records seen.
    pub positrons: u64,
}

impl ParticleCounts {
    /// Records one particle of the given kind.
    #[inline]
    pub fn record(&mut self, kind: ParticleKind) {
        match kind {
            ParticleKind::Photon => self.photons += 1,
            ParticleKind::Electron => self.electrons += 1,
            ParticleKind::Positron => self.positrons += 1,
        }
    }

    /// Returns the count for one species.
    #[must_use]
    pub fn get(&self, kind: ParticleKind) -> u64 {
        match kind {
            ParticleKind::Photon => self.photons,
            ParticleKind::Electron => self.electrons,
            ParticleKind::Positron => self.positrons,
        }
    }

    /// Total number of records across all species.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.photons + self.electrons + self.positrons
    }

    /// Adds another set of counts into this one.
    pub fn merge(&mut self, other: &Self) {
        self.photons += other.photons;
        self.electrons += other.electrons;
        self.positrons += other.positrons;
    }
}
