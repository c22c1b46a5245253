//! Per-bin density table of a filled histogram.

use phasespace_core::{BinIndex, Histogram1D};
use serde::Serialize;

/// One row of the density table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DensityRow {
    pub bin: BinIndex,
    pub lo: f64,
    pub hi: f64,
    pub width: f64,
    pub weight: f64,
    pub events: u64,
    /// `weight / width / integral`; zero when the width or integral is not positive.
    pub density: f64,
}

/// Builds the table for every bin, underflow and overflow included.
///
/// Underflow spans `[0, lo)`. Overflow is given the width of the last
/// in-range bin.
pub fn density_table<H: Histogram1D>(histogram: &H) -> Vec<DensityRow> {
    let size = histogram.size();
    let integral = histogram.integral();
    let last_width = size
        .checked_sub(1)
        .and_then(|i| histogram.bin_width(i))
        .unwrap_or(0.0);

    BinIndex::all(size)
        .filter_map(|bin| {
            let (lo, hi) = match bin {
                BinIndex::Underflow => (0.0, histogram.lo()),
                BinIndex::Bin(i) => histogram.bin_edges(i)?,
                BinIndex::Overflow => (histogram.hi(), histogram.hi() + last_width),
            };
            let content = histogram.bin_at(bin).ok()?;
            let width = hi - lo;
            let density = if width > 0.0 && integral > 0.0 {
                content.weight / width / integral
            } else {
                0.0
            };
            Some(DensityRow {
                bin,
                lo,
                hi,
                width,
                weight: content.weight,
                events: content.events,
                density,
            })
        })
        .collect()
}

/// Sum of `density * width` over the table; one for a fully covered histogram.
pub fn normalization(rows: &[DensityRow]) -> f64 {
    rows.iter().map(|r| r.density * r.width).sum()
}
