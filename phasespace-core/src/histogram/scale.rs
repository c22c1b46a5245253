//! Edge builders for non-uniform binnings.

use crate::{Error, Result};

/// Largest number of edges [`split_scale`] will produce.
pub const MAX_SPLIT_EDGES: usize = 1 << 20;

/// Builds edges with `fine_bins` equal bins over `[me, hi)` and the same bin
/// width extended downward from `me` to `lo`.
///
/// The downward walk stops at the last edge not below `lo`; `lo` itself is
/// appended when the walk does not land on it exactly, so the lowest bin may
/// be narrower than the rest. Typical use is an energy spectrum with a line
/// region (`me..hi`) resolved at the same width as the continuum below it.
///
/// # Errors
/// Returns `InvalidHistogramConfig` unless `lo < me < hi` (all finite) and
/// `fine_bins > 0`, or if the scale would need more than
/// [`MAX_SPLIT_EDGES`] edges.
#[allow(clippy::cast_precision_loss, clippy::float_cmp)]
pub fn split_scale(lo: f64, me: f64, hi: f64, fine_bins: usize) -> Result<Vec<f64>> {
    if fine_bins == 0 {
        return Err(Error::InvalidHistogramConfig(
            "fine bin count must be positive".to_string(),
        ));
    }
    if !(lo.is_finite() && me.is_finite() && hi.is_finite()) || lo >= me || me >= hi {
        return Err(Error::InvalidHistogramConfig(format!(
            "split scale requires lo < me < hi, got {lo}, {me}, {hi}"
        )));
    }

    let step = (hi - me) / fine_bins as f64;
    let coarse = ((me - lo) / step).ceil();
    if !coarse.is_finite() || coarse + fine_bins as f64 + 2.0 > MAX_SPLIT_EDGES as f64 {
        return Err(Error::InvalidHistogramConfig(format!(
            "split scale over [{lo}, {hi}) with step {step} exceeds {MAX_SPLIT_EDGES} edges"
        )));
    }

    let mut edges = Vec::new();
    let mut prev = me;
    loop {
        edges.push(prev);
        let next = prev - step;
        if next >= prev {
            return Err(Error::InvalidHistogramConfig(format!(
                "step {step} too small to walk down from {me}"
            )));
        }
        if next < lo {
            break;
        }
        prev = next;
    }
    if prev != lo {
        edges.push(lo);
    }
    edges.reverse();

    edges.extend((1..fine_bins).map(|k| me + k as f64 * step));
    edges.push(hi);

    // Rounding can produce a repeated or inverted edge next to `me` or `hi`.
    edges.dedup_by(|next, kept| *next <= *kept);
    Ok(edges)
}
