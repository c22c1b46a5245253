//! phasespace-io: Phase-space file readers and writers.
//!
//! This crate drives the `phasespace-beam` codec over byte streams:
//! buffered or memory-mapped file input, sequential record iteration with
//! per-species counts, histogram filling, and flat event-list output.
//!

mod batch;
mod error;
mod mapped;
mod reader;
mod writer;

pub use batch::{
    fill_histogram, histogram_file, histogram_files, BatchSummary, FileOutcome, FillOptions,
};
pub use error::{Error, PartialLoad, Result};
pub use mapped::{MappedFileReader, SharedMmap};
pub use reader::{
    load_events, load_photons, ClassifiedRecord, EventLoad, Events, PhsfReader, Records,
};
pub use writer::{EventWriter, EVENT_COLUMNS};
