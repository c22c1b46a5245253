//! Declarative histogram binning.

use super::{split_scale, Histogram, NonuniformHistogram, UniformHistogram};
use crate::Result;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Describes how to bin an observable.
///
/// With the `serde` feature this maps to JSON such as
/// `{"uniform": {"bins": 100, "lo": 0.0, "hi": 1.5}}`,
/// `{"edges": [0.01, 0.5, 1.0, 1.33]}` or
/// `{"split_scale": {"lo": 0.01, "me": 1.17, "hi": 1.33, "fine_bins": 5}}`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BinningConfig {
    /// Equal-width bins over `[lo, hi)`.
    Uniform { bins: usize, lo: f64, hi: f64 },
    /// Explicit ascending edges.
    Edges(Vec<f64>),
    /// Edges produced by [`split_scale`].
    SplitScale {
        lo: f64,
        me: f64,
        hi: f64,
        fine_bins: usize,
    },
}

impl BinningConfig {
    /// Validates the configuration and builds an empty histogram.
    ///
    /// # Errors
    /// Returns `InvalidHistogramConfig` if the binning is rejected.
    pub fn build(&self) -> Result<Histogram> {
        match self {
            BinningConfig::Uniform { bins, lo, hi } => {
                Ok(UniformHistogram::new(*bins, *lo, *hi)?.into())
            }
            BinningConfig::Edges(edges) => Ok(NonuniformHistogram::new(edges.clone())?.into()),
            BinningConfig::SplitScale {
                lo,
                me,
                hi,
                fine_bins,
            } => Ok(NonuniformHistogram::new(split_scale(*lo, *me, *hi, *fine_bins)?)?.into()),
        }
    }
}

#[cfg(feature = "serde")]
impl BinningConfig {
    /// Parses a binning from a JSON string.
    ///
    /// # Errors
    /// Returns `ConfigError` if the JSON does not describe a binning.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| crate::Error::ConfigError(e.to_string()))
    }

    /// Loads a binning from a JSON file.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| crate::Error::ConfigError(format!("{}: {e}", path.display())))?;
        Self::from_json(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::histogram::Histogram1D;
    use crate::Error;

    #[test]
    fn test_build_uniform() {
        let h = BinningConfig::Uniform {
            bins: 4,
            lo: 0.0,
            hi: 2.0,
        }
        .build()
        .unwrap();
        assert!(matches!(h, Histogram::Uniform(_)));
        assert_eq!(h.size(), 4);
    }

    #[test]
    fn test_build_split_scale() {
        let h = BinningConfig::SplitScale {
            lo: 0.0,
            me: 1.0,
            hi: 2.0,
            fine_bins: 2,
        }
        .build()
        .unwrap();
        assert!(matches!(h, Histogram::Nonuniform(_)));
        assert_eq!(h.size(), 4);
    }

    #[test]
    fn test_build_rejects_bad_edges() {
        let err = BinningConfig::Edges(vec![1.0, 0.5, 2.0]).build().unwrap_err();
        assert!(matches!(err, Error::InvalidHistogramConfig(_)));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_from_json() {
        let cfg = BinningConfig::from_json(r#"{"edges": [0.01, 0.5, 1.0, 1.33]}"#).unwrap();
        assert_eq!(cfg, BinningConfig::Edges(vec![0.01, 0.5, 1.0, 1.33]));

        let cfg =
            BinningConfig::from_json(r#"{"uniform": {"bins": 10, "lo": 0.0, "hi": 1.0}}"#).unwrap();
        assert_eq!(
            cfg,
            BinningConfig::Uniform {
                bins: 10,
                lo: 0.0,
                hi: 1.0
            }
        );

        assert!(matches!(
            BinningConfig::from_json(r#"{"bogus": 1}"#),
            Err(Error::ConfigError(_))
        ));
    }
}
