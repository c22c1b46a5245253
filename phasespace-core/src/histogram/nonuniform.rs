//! Variable-width binning over explicit edges.

use super::{BinContent, BinIndex, BinStorage, Histogram1D};
use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A histogram over `n + 1` strictly increasing edges defining `n` bins.
///
/// Bin widths vary, so density normalization (`weight / width / integral`)
/// is left to the caller, who can recover each width from [`x`](Self::x).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "RawNonuniform")
)]
pub struct NonuniformHistogram {
    edges: Vec<f64>,
    storage: BinStorage,
}

impl NonuniformHistogram {
    /// Creates an empty histogram from ascending bin edges.
    ///
    /// # Errors
    /// Returns `InvalidHistogramConfig` if fewer than two edges are given,
    /// any edge is not finite, or the edges are not strictly increasing.
    pub fn new(edges: Vec<f64>) -> Result<Self> {
        check_edges(&edges)?;
        let size = edges.len() - 1;
        Ok(Self {
            edges,
            storage: BinStorage::new(size)?,
        })
    }

    /// The full edge sequence.
    #[must_use]
    #[inline]
    pub fn x(&self) -> &[f64] {
        &self.edges
    }

    /// Adds another histogram's contents into this one.
    ///
    /// # Errors
    /// Returns `HistogramMismatch` if the edges differ.
    pub fn merge(&mut self, other: &Self) -> Result<()> {
        if self.edges != other.edges {
            return Err(Error::HistogramMismatch);
        }
        self.storage.merge(&other.storage);
        Ok(())
    }

    /// Returns an empty histogram with the same edges.
    #[must_use]
    pub fn empty_like(&self) -> Self {
        Self {
            edges: self.edges.clone(),
            storage: self.storage.cleared(),
        }
    }
}

impl Histogram1D for NonuniformHistogram {
    #[inline]
    fn size(&self) -> usize {
        self.edges.len() - 1
    }

    #[inline]
    fn lo(&self) -> f64 {
        self.edges[0]
    }

    #[inline]
    fn hi(&self) -> f64 {
        self.edges[self.edges.len() - 1]
    }

    fn locate(&self, value: f64) -> BinIndex {
        if value.is_nan() {
            return BinIndex::Overflow;
        }
        // Number of edges <= value; bin i satisfies edges[i] <= value < edges[i + 1].
        let below = self.edges.partition_point(|&e| e <= value);
        if below == 0 {
            BinIndex::Underflow
        } else if below == self.edges.len() {
            BinIndex::Overflow
        } else {
            BinIndex::Bin(below - 1)
        }
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

    fn bin_edges(&self, i: usize) -> Option<(f64, f64)> {
        if i >= self.size() {
            return None;
        }
        Some((self.edges[i], self.edges[i + 1]))
    }

    fn contents(&self) -> &[BinContent] {
        self.storage.in_range()
    }
}

/// Requires at least two finite, strictly increasing edges.
fn check_edges(edges: &[f64]) -> Result<()> {
    if edges.len() < 2 {
        return Err(Error::InvalidHistogramConfig(format!(
            "need at least 2 edges, got {}",
            edges.len()
        )));
    }
    if let Some(bad) = edges.iter().find(|e| !e.is_finite()) {
        return Err(Error::InvalidHistogramConfig(format!(
            "edges must be finite, got {bad}"
        )));
    }
    if let Some(i) = edges.windows(2).position(|w| w[0] >= w[1]) {
        return Err(Error::InvalidHistogramConfig(format!(
            "edges must be strictly increasing: edge {} ({}) >= edge {} ({})",
            i,
            edges[i],
            i + 1,
            edges[i + 1]
        )));
    }
    Ok(())
}

/// Serialized form, revalidated on load.
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawNonuniform {
    edges: Vec<f64>,
    storage: BinStorage,
}

#[cfg(feature = "serde")]
impl TryFrom<RawNonuniform> for NonuniformHistogram {
    type Error = Error;

    fn try_from(raw: RawNonuniform) -> Result<Self> {
        check_edges(&raw.edges)?;
        if raw.storage.slot_count() != raw.edges.len() + 1 {
            return Err(Error::InvalidHistogramConfig(format!(
                "{} edges need {} bin slots, got {}",
                raw.edges.len(),
                raw.edges.len() + 1,
                raw.storage.slot_count()
            )));
        }
        Ok(Self {
            edges: raw.edges,
            storage: raw.storage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_edge_goes_to_upper_bin() {
        let mut h = NonuniformHistogram::new(vec![0.0, 1.0, 2.0]).unwrap();
        assert_eq!(h.fill(1.0, 1.0), BinIndex::Bin(1));
        assert_eq!(h.fill(0.0, 1.0), BinIndex::Bin(0));
        assert_eq!(h.fill(2.0, 1.0), BinIndex::Overflow);
        assert_eq!(h.fill(-1e-9, 1.0), BinIndex::Underflow);
        assert_eq!(h.bin_at(BinIndex::Bin(0)).unwrap().events, 1);
        assert_eq!(h.bin_at(BinIndex::Bin(1)).unwrap().events, 1);
    }

    #[test]
    fn test_single_fill_lookup() {
        let mut h = NonuniformHistogram::new(vec![0.01, 0.5, 1.0, 1.33]).unwrap();
        h.fill(0.75, 1.0);

        let bin = h.bin_at_offset(1).unwrap();
        assert_relative_eq!(bin.weight, 1.0);
        assert_eq!(bin.events, 1);
        assert_eq!(h.size(), 3);
        assert_relative_eq!(h.lo(), 0.01);
        assert_relative_eq!(h.hi(), 1.33);
    }

    #[test]
    fn test_integral_counts_every_fill() {
        let mut h = NonuniformHistogram::new(vec![0.0, 1.0, 2.0]).unwrap();
        h.fill(0.5, 1.0);
        h.fill(-3.0, 2.0);
        h.fill(7.0, -1.0);
        h.fill(f64::NAN, 0.0);

        assert_relative_eq!(h.integral(), 2.0);
        assert_eq!(h.nof_events(), 4);
        assert_relative_eq!(h.underflow().weight, 2.0);
        assert_eq!(h.overflow().events, 2);
    }

    #[test]
    fn test_invalid_edges() {
        assert!(matches!(
            NonuniformHistogram::new(vec![1.0, 0.5, 2.0]),
            Err(Error::InvalidHistogramConfig(_))
        ));
        assert!(NonuniformHistogram::new(vec![0.0, 1.0, 1.0]).is_err());
        assert!(NonuniformHistogram::new(vec![1.0]).is_err());
        assert!(NonuniformHistogram::new(vec![]).is_err());
        assert!(NonuniformHistogram::new(vec![0.0, f64::INFINITY]).is_err());
    }

    #[test]
    fn test_bin_widths() {
        let h = NonuniformHistogram::new(vec![0.0, 0.5, 2.0]).unwrap();
        assert_relative_eq!(h.bin_width(0).unwrap(), 0.5);
        assert_relative_eq!(h.bin_width(1).unwrap(), 1.5);
        assert!(h.bin_width(2).is_none());
        assert_eq!(h.x(), &[0.0, 0.5, 2.0]);
    }

    #[test]
    fn test_out_of_range_query() {
        let h = NonuniformHistogram::new(vec![0.0, 1.0]).unwrap();
        assert!(matches!(
            h.bin_at_offset(2),
            Err(Error::IndexOutOfRange { index: 2, size: 1 })
        ));
        assert!(h.bin_at(BinIndex::Bin(1)).is_err());
    }

    #[test]
    fn test_merge_requires_same_edges() {
        let mut a = NonuniformHistogram::new(vec![0.0, 1.0, 3.0]).unwrap();
        let mut b = a.empty_like();
        a.fill(2.0, 1.5);
        b.fill(2.5, 0.5);
        a.merge(&b).unwrap();
        assert_relative_eq!(a.contents()[1].weight, 2.0);
        assert_eq!(a.nof_events(), 2);

        let c = NonuniformHistogram::new(vec![0.0, 1.0, 4.0]).unwrap();
        assert!(a.merge(&c).is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_validates() {
        let mut h = NonuniformHistogram::new(vec![0.0, 1.0, 2.0]).unwrap();
        h.fill(0.5, 1.0);
        let json = serde_json::to_string(&h).unwrap();
        let back: NonuniformHistogram = serde_json::from_str(&json).unwrap();
        assert_eq!(back, h);

        let empty_edges = r#"{"edges":[],"storage":{"bins":[],"integral":0.0,"events":0}}"#;
        assert!(serde_json::from_str::<NonuniformHistogram>(empty_edges).is_err());

        let unsorted = json.replace("[0.0,1.0,2.0]", "[0.0,2.0,1.0]");
        assert!(serde_json::from_str::<NonuniformHistogram>(&unsorted).is_err());

        let short_bins = r#"{"edges":[0.0,1.0,2.0],"storage":{"bins":[],"integral":0.0,"events":0}}"#;
        assert!(serde_json::from_str::<NonuniformHistogram>(short_bins).is_err());
    }
}
