//! Histogramming of phase-space files.
//!
//! Each file is decoded sequentially into its own histogram; several files
//! are processed on the rayon pool, one reader and one histogram per file,
//! and the partial histograms are merged by per-bin addition.

use crate::{Error, PhsfReader, Result};
use phasespace_beam::HeaderOptions;
use phasespace_core::{Histogram, Histogram1D, Observable, ParticleCounts, ParticleFilter};
use rayon::prelude::*;
use std::io::Read;
use std::path::{Path, PathBuf};

#[cfg(feature = "serde")]
use serde::{Serialize, Serializer};

/// What to histogram and how to read the input.
#[derive(Debug, Clone, Copy)]
pub struct FillOptions {
    /// Event field used as the fill value.
    pub observable: Observable,
    /// Species to include.
    pub filter: ParticleFilter,
    /// Fill with the event weight; unit weight otherwise.
    pub weighted: bool,
    /// Upper bound on records read per file.
    pub max_records: Option<usize>,
    /// Header interpretation.
    pub header: HeaderOptions,
    /// Read through a memory mapping instead of buffered I/O.
    pub mapped: bool,
}

impl Default for FillOptions {
    fn default() -> Self {
        Self {
            observable: Observable::Energy,
            filter: ParticleFilter::Photons,
            weighted: true,
            max_records: None,
            header: HeaderOptions::default(),
            mapped: false,
        }
    }
}

/// Fills `histogram` from every accepted event of `reader`.
///
/// Returns the number of events filled. On error the histogram keeps the
/// fills made before the failure.
///
/// # Errors
/// Returns the first read or decode error.
pub fn fill_histogram<R: Read>(
    reader: &mut PhsfReader<R>,
    histogram: &mut Histogram,
    options: &FillOptions,
) -> Result<u64> {
    let mut filled = 0u64;
    for event in reader.events(options.filter) {
        let event = event?;
        let weight = if options.weighted {
            f64::from(event.weight)
        } else {
            1.0
        };
        histogram.fill(options.observable.value(&event), weight);
        filled += 1;
    }
    Ok(filled)
}

/// Result of histogramming one file.
#[derive(Debug)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct FileOutcome {
    /// Input path.
    pub path: PathBuf,
    /// Histogram of the events read, absent if the header could not be read.
    pub histogram: Option<Histogram>,
    /// Counts of all records read.
    pub counts: ParticleCounts,
    /// Error that stopped the file, if any.
    #[cfg_attr(feature = "serde", serde(serialize_with = "error_message"))]
    pub error: Option<Error>,
}

/// Result of histogramming several files.
#[derive(Debug)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct BatchSummary {
    /// Sum of every per-file histogram, partial ones included.
    pub merged: Histogram,
    /// Summed counts over all files.
    pub counts: ParticleCounts,
    /// One entry per input, in input order.
    pub files: Vec<FileOutcome>,
}

/// Serializes an error as its display message.
#[cfg(feature = "serde")]
#[allow(clippy::ref_option)]
fn error_message<S: Serializer>(
    error: &Option<Error>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match error {
        Some(e) => serializer.serialize_some(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

impl BatchSummary {
    /// Inputs that stopped with an error.
    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.files.iter().filter(|f| f.error.is_some())
    }
}

/// Histograms one file into an empty copy of `prototype`.
#[must_use]
pub fn histogram_file(path: &Path, prototype: &Histogram, options: &FillOptions) -> FileOutcome {
    let mut histogram = prototype.empty_like();
    let result = if options.mapped {
        drive(
            PhsfReader::open_mapped(path, &options.header),
            &mut histogram,
            options,
        )
    } else {
        drive(
            PhsfReader::open_with_options(path, &options.header),
            &mut histogram,
            options,
        )
    };

    let outcome = match result {
        Ok((counts, error)) => FileOutcome {
            path: path.to_path_buf(),
            histogram: Some(histogram),
            counts,
            error,
        },
        Err(e) => FileOutcome {
            path: path.to_path_buf(),
            histogram: None,
            counts: ParticleCounts::default(),
            error: Some(e),
        },
    };
    if let Some(e) = &outcome.error {
        log::warn!("{}: {e}", path.display());
    }
    outcome
}

/// Runs an opened reader to completion. An open failure is returned as
/// `Err`; a failure while reading records comes back with the counts so far.
fn drive<R: Read>(
    opened: Result<PhsfReader<R>>,
    histogram: &mut Histogram,
    options: &FillOptions,
) -> Result<(ParticleCounts, Option<Error>)> {
    let mut reader = opened?;
    if let Some(n) = options.max_records {
        reader = reader.with_max_records(n);
    }
    let error = fill_histogram(&mut reader, histogram, options).err();
    Ok((reader.counts(), error))
}

/// Histograms several files in parallel and merges the results.
///
/// A failing file does not affect the others; its partial histogram (if
/// the header was readable) is still merged.
///
/// # Errors
/// Returns an error only if per-file histograms cannot be merged, which
/// cannot happen when they all derive from `prototype`.
pub fn histogram_files<P: AsRef<Path> + Sync>(
    paths: &[P],
    prototype: &Histogram,
    options: &FillOptions,
) -> Result<BatchSummary> {
    let files: Vec<FileOutcome> = paths
        .par_iter()
        .map(|p| histogram_file(p.as_ref(), prototype, options))
        .collect();

    let mut merged = prototype.empty_like();
    let mut counts = ParticleCounts::default();
    for outcome in &files {
        counts.merge(&outcome.counts);
        if let Some(h) = &outcome.histogram {
            merged.merge(h)?;
        }
    }

    Ok(BatchSummary {
        merged,
        counts,
        files,
    })
}
