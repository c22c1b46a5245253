//! One-dimensional weighted histograms with underflow/overflow tracking.
//!
//! Two binnings are provided: [`UniformHistogram`] with equal-width bins and
//! [`NonuniformHistogram`] with arbitrary ascending edges. Both route values
//! with the half-open convention `[edge_i, edge_{i+1})`; values below the
//! first edge land in underflow, values at or above the last edge (and NaN)
//! land in overflow.
//!
//! Every fill counts toward [`Histogram1D::integral`] and
//! [`Histogram1D::nof_events`], whichever bin receives it.

mod config;
mod nonuniform;
mod scale;
mod uniform;

pub use config::BinningConfig;
pub use nonuniform::NonuniformHistogram;
pub use scale::{split_scale, MAX_SPLIT_EDGES};
pub use uniform::UniformHistogram;

use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Addresses one logical bin of a histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BinIndex {
    /// Values below the addressable domain.
    Underflow,
    /// In-range bin `i`, `0 <= i < size`.
    Bin(usize),
    /// Values at or above the upper edge.
    Overflow,
}

impl BinIndex {
    /// Converts a raw index in `[-1, size]` into a bin address.
    ///
    /// `-1` maps to underflow and `size` to overflow.
    ///
    /// # Errors
    /// Returns `IndexOutOfRange` for any other value.
    pub fn from_offset(index: i64, size: usize) -> Result<Self> {
        if index == -1 {
            return Ok(BinIndex::Underflow);
        }
        match usize::try_from(index) {
            Ok(i) if i < size => Ok(BinIndex::Bin(i)),
            Ok(i) if i == size => Ok(BinIndex::Overflow),
            _ => Err(Error::IndexOutOfRange { index, size }),
        }
    }

    /// Converts back to a raw index in `[-1, size]`.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn to_offset(self, size: usize) -> i64 {
        match self {
            BinIndex::Underflow => -1,
            BinIndex::Bin(i) => i as i64,
            BinIndex::Overflow => size as i64,
        }
    }

    /// Iterates underflow, every in-range bin, then overflow.
    pub fn all(size: usize) -> impl Iterator<Item = BinIndex> {
        std::iter::once(BinIndex::Underflow)
            .chain((0..size).map(BinIndex::Bin))
            .chain(std::iter::once(BinIndex::Overflow))
    }
}

/// Accumulated contents of one bin.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BinContent {
    /// Sum of fill weights.
    pub weight: f64,
    /// Number of fills.
    pub events: u64,
}

impl BinContent {
    #[inline]
    fn add(&mut self, weight: f64) {
        self.weight += weight;
        self.events += 1;
    }

    #[inline]
    fn merge(&mut self, other: &Self) {
        self.weight += other.weight;
        self.events += other.events;
    }
}

/// Bin storage shared by both binnings.
///
/// Layout: `[underflow, bin_0, ..., bin_{n-1}, overflow]`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub(crate) struct BinStorage {
    bins: Vec<BinContent>,
    integral: f64,
    events: u64,
}

impl BinStorage {
    /// Allocates `size` in-range bins plus underflow and overflow.
    ///
    /// # Errors
    /// Returns `InvalidHistogramConfig` if the slot count overflows or
    /// cannot be allocated.
    pub(crate) fn new(size: usize) -> Result<Self> {
        let slots = size.checked_add(2).ok_or_else(|| {
            Error::InvalidHistogramConfig(format!("bin count {size} is too large"))
        })?;
        let mut bins = Vec::new();
        bins.try_reserve_exact(slots).map_err(|e| {
            Error::InvalidHistogramConfig(format!("cannot allocate {size} bins: {e}"))
        })?;
        bins.resize(slots, BinContent::default());
        Ok(Self {
            bins,
            integral: 0.0,
            events: 0,
        })
    }

    /// Empty storage with the same number of bins.
    pub(crate) fn cleared(&self) -> Self {
        Self {
            bins: vec![BinContent::default(); self.bins.len()],
            integral: 0.0,
            events: 0,
        }
    }

    /// Number of slots, underflow and overflow included.
    pub(crate) fn slot_count(&self) -> usize {
        self.bins.len()
    }

    #[inline]
    fn size(&self) -> usize {
        self.slot_count() - 2
    }

    #[inline]
    fn slot(&self, index: BinIndex) -> Option<usize> {
        match index {
            BinIndex::Underflow => Some(0),
            BinIndex::Bin(i) if i < self.size() => Some(i + 1),
            BinIndex::Bin(_) => None,
            BinIndex::Overflow => Some(self.bins.len() - 1),
        }
    }

    #[inline]
    pub(crate) fn fill(&mut self, index: BinIndex, weight: f64) {
        if let Some(slot) = self.slot(index) {
            self.bins[slot].add(weight);
        }
        self.integral += weight;
        self.events += 1;
    }

    pub(crate) fn get(&self, index: BinIndex) -> Result<BinContent> {
        self.slot(index)
            .map(|slot| self.bins[slot])
            .ok_or_else(|| Error::IndexOutOfRange {
                index: index.to_offset(self.size()),
                size: self.size(),
            })
    }

    pub(crate) fn in_range(&self) -> &[BinContent] {
        &self.bins[1..self.bins.len() - 1]
    }

    pub(crate) fn merge(&mut self, other: &Self) {
        for (a, b) in self.bins.iter_mut().zip(&other.bins) {
            a.merge(b);
        }
        self.integral += other.integral;
        self.events += other.events;
    }
}

/// Common query and fill surface of the 1-D histograms.
pub trait Histogram1D {
    /// Number of in-range bins.
    fn size(&self) -> usize;

    /// Lower edge of the addressable domain.
    fn lo(&self) -> f64;

    /// Upper edge of the addressable domain (exclusive).
    fn hi(&self) -> f64;

    /// Finds the bin a value would be routed to.
    fn locate(&self, value: f64) -> BinIndex;

    /// Adds `weight` to the bin containing `value`.
    ///
    /// Returns the bin that received the fill.
    fn fill(&mut self, value: f64, weight: f64) -> BinIndex;

    /// Total weight of all fills, including underflow and overflow.
    fn integral(&self) -> f64;

    /// Total number of fill calls.
    fn nof_events(&self) -> u64;

    /// Returns the contents of one bin.
    ///
    /// # Errors
    /// Returns `IndexOutOfRange` for `BinIndex::Bin(i)` with `i >= size()`.
    fn bin_at(&self, index: BinIndex) -> Result<BinContent>;

    /// Lower and upper edge of in-range bin `i`.
    fn bin_edges(&self, i: usize) -> Option<(f64, f64)>;

    /// Contents of the in-range bins, in order.
    fn contents(&self) -> &[BinContent];

    /// Returns the contents of the bin at raw index `index` in `[-1, size]`.
    ///
    /// # Errors
    /// Returns `IndexOutOfRange` outside that range.
    fn bin_at_offset(&self, index: i64) -> Result<BinContent> {
        self.bin_at(BinIndex::from_offset(index, self.size())?)
    }

    /// Contents of the underflow bin.
    fn underflow(&self) -> BinContent {
        self.bin_at(BinIndex::Underflow).unwrap_or_default()
    }

    /// Contents of the overflow bin.
    fn overflow(&self) -> BinContent {
        self.bin_at(BinIndex::Overflow).unwrap_or_default()
    }

    /// Width of in-range bin `i`.
    fn bin_width(&self, i: usize) -> Option<f64> {
        self.bin_edges(i).map(|(lo, hi)| hi - lo)
    }
}

/// A histogram of either binning, as produced from a [`BinningConfig`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Histogram {
    /// Equal-width bins.
    Uniform(UniformHistogram),
    /// Arbitrary ascending edges.
    Nonuniform(NonuniformHistogram),
}

impl Histogram {
    /// Returns the full edge sequence (`size() + 1` values).
    #[must_use]
    pub fn edges(&self) -> Vec<f64> {
        match self {
            Histogram::Uniform(h) => h.edges(),
            Histogram::Nonuniform(h) => h.x().to_vec(),
        }
    }

    /// Adds another histogram's contents into this one.
    ///
    /// # Errors
    /// Returns `HistogramMismatch` if the binnings differ.
    pub fn merge(&mut self, other: &Histogram) -> Result<()> {
        match (self, other) {
            (Histogram::Uniform(a), Histogram::Uniform(b)) => a.merge(b),
            (Histogram::Nonuniform(a), Histogram::Nonuniform(b)) => a.merge(b),
            _ => Err(Error::HistogramMismatch),
        }
    }

    /// Returns an empty histogram with the same binning.
    #[must_use]
    pub fn empty_like(&self) -> Histogram {
        match self {
            Histogram::Uniform(h) => Histogram::Uniform(h.empty_like()),
            Histogram::Nonuniform(h) => Histogram::Nonuniform(h.empty_like()),
        }
    }
}

macro_rules! delegate {
    ($self:ident, $h:ident => $e:expr) => {
        match $self {
            Histogram::Uniform($h) => $e,
            Histogram::Nonuniform($h) => $e,
        }
    };
}

impl Histogram1D for Histogram {
    fn size(&self) -> usize {
        delegate!(self, h => h.size())
    }

    fn lo(&self) -> f64 {
        delegate!(self, h => h.lo())
    }

    fn hi(&self) -> f64 {
        delegate!(self, h => h.hi())
    }

    fn locate(&self, value: f64) -> BinIndex {
        delegate!(self, h => h.locate(value))
    }

    fn fill(&mut self, value: f64, weight: f64) -> BinIndex {
        delegate!(self, h => h.fill(value, weight))
    }

    fn integral(&self) -> f64 {
        delegate!(self, h => h.integral())
    }

    fn nof_events(&self) -> u64 {
        delegate!(self, h => h.nof_events())
    }

    fn bin_at(&self, index: BinIndex) -> Result<BinContent> {
        delegate!(self, h => h.bin_at(index))
    }

    fn bin_edges(&self, i: usize) -> Option<(f64, f64)> {
        delegate!(self, h => h.bin_edges(i))
    }

    fn contents(&self) -> &[BinContent] {
        delegate!(self, h => h.contents())
    }
}

impl From<UniformHistogram> for Histogram {
    fn from(h: UniformHistogram) -> Self {
        Histogram::Uniform(h)
    }
}

impl From<NonuniformHistogram> for Histogram {
    fn from(h: NonuniformHistogram) -> Self {
        Histogram::Nonuniform(h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bin_index_offsets() {
        assert_eq!(BinIndex::from_offset(-1, 3).unwrap(), BinIndex::Underflow);
        assert_eq!(BinIndex::from_offset(0, 3).unwrap(), BinIndex::Bin(0));
        assert_eq!(BinIndex::from_offset(2, 3).unwrap(), BinIndex::Bin(2));
        assert_eq!(BinIndex::from_offset(3, 3).unwrap(), BinIndex::Overflow);
        assert!(matches!(
            BinIndex::from_offset(4, 3),
            Err(Error::IndexOutOfRange { index: 4, size: 3 })
        ));
        assert!(BinIndex::from_offset(-2, 3).is_err());

        for offset in -1..=3 {
            let index = BinIndex::from_offset(offset, 3).unwrap();
            assert_eq!(index.to_offset(3), offset);
        }
    }

    #[test]
    fn test_bin_index_all() {
        let all: Vec<_> = BinIndex::all(2).collect();
        assert_eq!(
            all,
            vec![
                BinIndex::Underflow,
                BinIndex::Bin(0),
                BinIndex::Bin(1),
                BinIndex::Overflow
            ]
        );
    }

    #[test]
    fn test_storage_out_of_range_bin() {
        let storage = BinStorage::new(2).unwrap();
        assert!(matches!(
            storage.get(BinIndex::Bin(2)),
            Err(Error::IndexOutOfRange { index: 2, size: 2 })
        ));
    }

    #[test]
    fn test_storage_rejects_oversized_counts() {
        assert!(matches!(
            BinStorage::new(usize::MAX),
            Err(Error::InvalidHistogramConfig(_))
        ));
        assert!(matches!(
            BinStorage::new(usize::MAX - 2),
            Err(Error::InvalidHistogramConfig(_))
        ));
        assert_eq!(BinStorage::new(3).unwrap().slot_count(), 5);
    }

    #[test]
    fn test_merge_mismatched_kinds() {
        let mut a: Histogram = UniformHistogram::new(2, 0.0, 2.0).unwrap().into();
        let b: Histogram = NonuniformHistogram::new(vec![0.0, 1.0, 2.0])
            .unwrap()
            .into();
        assert!(matches!(a.merge(&b), Err(Error::HistogramMismatch)));
    }

    #[test]
    fn test_enum_delegates() {
        let mut h: Histogram = NonuniformHistogram::new(vec![0.0, 1.0, 2.0])
            .unwrap()
            .into();
        assert_eq!(h.fill(1.0, 2.0), BinIndex::Bin(1));
        assert_eq!(h.bin_at_offset(1).unwrap().events, 1);
        assert_eq!(h.edges(), vec![0.0, 1.0, 2.0]);
        let empty = h.empty_like();
        assert_eq!(empty.nof_events(), 0);
        assert_eq!(empty.size(), 2);
    }
}
