//! phasespace-core: Core types for phase-space analysis.
//!
//! This crate provides the format-independent building blocks: particle
//! classification, decoded event tuples, and the 1-D histogram engines that
//! accumulate event observables.
//!

pub mod error;
pub mod event;
pub mod histogram;
pub mod particle;

pub use error::{Error, Result};
pub use event::{Event, Observable};
pub use histogram::{
    split_scale, BinContent, BinIndex, BinningConfig, Histogram, Histogram1D,
    NonuniformHistogram, UniformHistogram, MAX_SPLIT_EDGES,
};
pub use particle::{ParticleCounts, ParticleFilter, ParticleKind};
