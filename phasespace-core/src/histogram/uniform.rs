//! Equal-width binning.

use super::{BinContent, BinIndex, BinStorage, Histogram1D};
use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A histogram of `size` equal-width bins over `[lo, hi)`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "RawUniform")
)]
pub struct UniformHistogram {
    lo: f64,
    hi: f64,
    step: f64,
    storage: BinStorage,
}

impl UniformHistogram {
    /// Creates an empty histogram with `bin_count` bins over `[lo, hi)`.
    ///
    /// # Errors
    /// Returns `InvalidHistogramConfig` if `bin_count` is zero or too large
    /// to allocate, either bound is not finite, `lo >= hi`, or the bin width
    /// is not a finite positive number.
    pub fn new(bin_count: usize, lo: f64, hi: f64) -> Result<Self> {
        let step = checked_step(bin_count, lo, hi)?;
        Ok(Self {
            lo,
            hi,
            step,
            storage: BinStorage::new(bin_count)?,
        })
    }

    /// Width of every bin.
    #[must_use]
    #[inline]
    pub fn step(&self) -> f64 {
        self.step
    }

    /// The `size() + 1` bin edges; the last one is exactly `hi`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn edges(&self) -> Vec<f64> {
        let n = self.size();
        (0..=n)
            .map(|i| {
                if i == n {
                    self.hi
                } else {
                    self.lo + i as f64 * self.step
                }
            })
            .collect()
    }

    /// Adds another histogram's contents into this one.
    ///
    /// # Errors
    /// Returns `HistogramMismatch` if the bin count or bounds differ.
    #[allow(clippy::float_cmp)]
    pub fn merge(&mut self, other: &Self) -> Result<()> {
        if self.size() != other.size() || self.lo != other.lo || self.hi != other.hi {
            return Err(Error::HistogramMismatch);
        }
        self.storage.merge(&other.storage);
        Ok(())
    }

    /// Returns an empty histogram with the same binning.
    #[must_use]
    pub fn empty_like(&self) -> Self {
        Self {
            lo: self.lo,
            hi: self.hi,
            step: self.step,
            storage: self.storage.cleared(),
        }
    }
}

impl Histogram1D for UniformHistogram {
    #[inline]
    fn size(&self) -> usize {
        self.storage.size()
    }

    #[inline]
    fn lo(&self) -> f64 {
        self.lo
    }

    #[inline]
    fn hi(&self) -> f64 {
        self.hi
    }

    #[inline]
    fn locate(&self, value: f64) -> BinIndex {
        if value < self.lo {
            return BinIndex::Underflow;
        }
        if value.is_nan() || value >= self.hi {
            return BinIndex::Overflow;
        }
        // Rounding in the division may land one past the last bin for values
        // just below `hi`.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let index = ((value - self.lo) / self.step).floor() as usize;
        BinIndex::Bin(index.min(self.size() - 1))
    }

    #[inline]
    fn fill(&mut self, value: f64, weight: f64) -> BinIndex {
        let index = self.locate(value);
        self.storage.fill(index, weight);
        index
    }

    #[inline]
    fn integral(&self) -> f64 {
        self.storage.integral
    }

    #[inline]
    fn nof_events(&self) -> u64 {
        self.storage.events
    }

    fn bin_at(&self, index: BinIndex) -> Result<BinContent> {
        self.storage.get(index)
    }

    #[allow(clippy::cast_precision_loss)]
    fn bin_edges(&self, i: usize) -> Option<(f64, f64)> {
        if i >= self.size() {
            return None;
        }
        let lo = self.lo + i as f64 * self.step;
        let hi = if i + 1 == self.size() {
            self.hi
        } else {
            self.lo + (i + 1) as f64 * self.step
        };
        Some((lo, hi))
    }

    fn contents(&self) -> &[BinContent] {
        self.storage.in_range()
    }
}

/// Validates the binning parameters and returns the bin width.
#[allow(clippy::cast_precision_loss)]
fn checked_step(bin_count: usize, lo: f64, hi: f64) -> Result<f64> {
    if bin_count == 0 {
        return Err(Error::InvalidHistogramConfig(
            "bin count must be positive".to_string(),
        ));
    }
    if !lo.is_finite() || !hi.is_finite() {
        return Err(Error::InvalidHistogramConfig(format!(
            "bounds must be finite, got [{lo}, {hi})"
        )));
    }
    if lo >= hi {
        return Err(Error::InvalidHistogramConfig(format!(
            "lower bound {lo} must be below upper bound {hi}"
        )));
    }
    let step = (hi - lo) / bin_count as f64;
    if !step.is_finite() || step <= 0.0 {
        return Err(Error::InvalidHistogramConfig(format!(
            "bin width {step} over [{lo}, {hi}) with {bin_count} bins is not representable"
        )));
    }
    Ok(step)
}

/// Serialized form; the bin width is recomputed on load.
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawUniform {
    lo: f64,
    hi: f64,
    storage: BinStorage,
}

#[cfg(feature = "serde")]
impl TryFrom<RawUniform> for UniformHistogram {
    type Error = Error;

    fn try_from(raw: RawUniform) -> Result<Self> {
        let size = raw.storage.slot_count().checked_sub(2).ok_or_else(|| {
            Error::InvalidHistogramConfig("bin storage lacks underflow/overflow slots".to_string())
        })?;
        let step = checked_step(size, raw.lo, raw.hi)?;
        Ok(Self {
            lo: raw.lo,
            hi: raw.hi,
            step,
            storage: raw.storage,
        })
    }
}
