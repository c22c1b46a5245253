//! Sequential phase-space file reader.
//!

use crate::mapped::{MappedFileReader, SharedMmap};
use crate::{Error, PartialLoad, Result};
use phasespace_beam::{decode_record, HeaderOptions, Mode, ParticleRecord, PhsfHeader};
use phasespace_core::{Event, ParticleCounts, ParticleFilter, ParticleKind};
use std::fs::File;
use std::io::{BufReader, Cursor, ErrorKind, Read};
use std::path::Path;

#[cfg(feature = "serde")]
use serde::Serialize;

/// A decoded record together with its species.
///
/// Photon energies are normalized to their absolute value; other species
/// keep the stored sign.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ClassifiedRecord {
    /// Species from the LATCH charge bits.
    pub kind: ParticleKind,
    /// The decoded record.
    pub record: ParticleRecord,
}

impl ClassifiedRecord {
    /// Converts to an event tuple.
    #[must_use]
    pub fn to_event(&self) -> Event {
        self.record.to_event()
    }
}

/// Events read from a file with the per-species counts of every record seen.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct EventLoad {
    /// Header of the file.
    pub header: PhsfHeader,
    /// Events that passed the filter, in file order.
    pub events: Vec<Event>,
    /// Counts of all records read, whether or not they passed the filter.
    pub counts: ParticleCounts,
}

/// A forward-only reader over a phase-space stream.
///
/// The header is parsed on construction. Records are then decoded one at a
/// time, up to `min(max_records, total_records)`; the reader is single-pass.
/// Running per-species counts cover every record read regardless of which
/// subset is being streamed.
pub struct PhsfReader<R> {
    source: R,
    header: PhsfHeader,
    budget: usize,
    consumed: usize,
    counts: ParticleCounts,
    buf: Vec<u8>,
    done: bool,
}

impl PhsfReader<BufReader<File>> {
    /// Opens a phase-space file with default header options.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened, the format tag is not
    /// recognized, or the header is truncated.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, &HeaderOptions::default())
    }

    /// Opens a phase-space file with explicit header options.
    ///
    /// # Errors
    /// See [`open`](Self::open).
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: &HeaderOptions) -> Result<Self> {
        let file = File::open(path)?;
        Self::with_options(BufReader::new(file), options)
    }
}

impl PhsfReader<Cursor<SharedMmap>> {
    /// Opens a phase-space file through a read-only memory mapping.
    ///
    /// # Errors
    /// See [`PhsfReader::open`].
    pub fn open_mapped<P: AsRef<Path>>(path: P, options: &HeaderOptions) -> Result<Self> {
        let mapped = MappedFileReader::open(path)?;
        Self::with_options(mapped.cursor(), options)
    }
}

impl<R: Read> PhsfReader<R> {
    /// Creates a reader over any byte stream with default header options.
    ///
    /// # Errors
    /// Returns an error if the header cannot be read or is not recognized.
    pub fn new(source: R) -> Result<Self> {
        Self::with_options(source, &HeaderOptions::default())
    }

    /// Creates a reader over any byte stream.
    ///
    /// Reads the format tag, the header fields and the padding that aligns
    /// the first record.
    ///
    /// # Errors
    /// Returns `Format` for an unrecognized tag and `TruncatedHeader` if the
    /// stream ends before the first record slot is complete.
    pub fn with_options(mut source: R, options: &HeaderOptions) -> Result<Self> {
        let mut tag = [0u8; Mode::TAG_LEN];
        let got = read_full(&mut source, &mut tag)?;
        if got < tag.len() {
            return Err(Error::TruncatedHeader {
                expected: Mode::TAG_LEN,
                actual: got,
            });
        }
        let mode = Mode::from_tag(&tag)?;

        // Header fields plus padding fill one record slot.
        let mut slot = vec![0u8; mode.record_size()];
        slot[..Mode::TAG_LEN].copy_from_slice(&tag);
        let got = read_full(&mut source, &mut slot[Mode::TAG_LEN..])?;
        if got < slot.len() - Mode::TAG_LEN {
            return Err(Error::TruncatedHeader {
                expected: slot.len(),
                actual: Mode::TAG_LEN + got,
            });
        }
        let header = PhsfHeader::parse(&slot, options)?;

        log::debug!(
            "{} header: {} records ({} photons), Emax {} MeV, Emin {} MeV, incident {}",
            header.mode,
            header.total_records,
            header.total_photon_records,
            header.max_kinetic_energy,
            header.min_electron_kinetic_energy,
            header.incident_particle_count.value()
        );
        if header.total_records < 0 {
            log::warn!(
                "negative record count {} in header; no records will be read",
                header.total_records
            );
        }
        if let Some(other) = header.incident_particle_count.suspect_encoding() {
            log::warn!(
                "incident particle count reads as {} with {:?}; the file may use {:?}",
                header.incident_particle_count.value(),
                header.incident_particle_count.encoding(),
                other
            );
        }

        Ok(Self {
            source,
            budget: header.record_budget(None),
            header,
            consumed: 0,
            counts: ParticleCounts::default(),
            buf: slot,
            done: false,
        })
    }

    /// Limits iteration to at most `max_records` records.
    ///
    /// The limit never exceeds the header's record count.
    #[must_use]
    pub fn with_max_records(mut self, max_records: usize) -> Self {
        self.budget = self.header.record_budget(Some(max_records));
        self
    }

    /// The parsed header.
    #[must_use]
    pub fn header(&self) -> &PhsfHeader {
        &self.header
    }

    /// Per-species counts of the records read so far.
    #[must_use]
    pub fn counts(&self) -> ParticleCounts {
        self.counts
    }

    /// Number of records read so far.
    #[must_use]
    pub fn records_read(&self) -> usize {
        self.consumed
    }

    /// Number of records this reader will iterate in total.
    #[must_use]
    pub fn record_budget(&self) -> usize {
        self.budget
    }

    /// Reads, decodes and classifies the next record.
    ///
    /// Returns `None` once the record budget is exhausted or after an error
    /// has been returned.
    pub fn next_record(&mut self) -> Option<Result<ClassifiedRecord>> {
        if self.done || self.consumed >= self.budget {
            if !self.done {
                self.finish();
            }
            return None;
        }

        let index = self.consumed;
        let got = match read_full(&mut self.source, &mut self.buf) {
            Ok(n) => n,
            Err(e) => {
                self.done = true;
                return Some(Err(e.into()));
            }
        };
        if got < self.buf.len() {
            self.done = true;
            return Some(Err(Error::TruncatedRecord {
                index,
                expected: self.buf.len(),
                actual: got,
            }));
        }

        let mut record = match decode_record(&self.buf, self.header.mode) {
            Ok(r) => r,
            Err(e) => {
                self.done = true;
                return Some(Err(e.into()));
            }
        };
        self.consumed += 1;

        let kind = record.kind();
        self.counts.record(kind);
        if kind == ParticleKind::Photon {
            record.kinetic_energy = record.kinetic_energy.abs();
        }

        Some(Ok(ClassifiedRecord { kind, record }))
    }

    /// Iterates over all remaining records.
    pub fn records(&mut self) -> Records<'_, R> {
        Records { reader: self }
    }

    /// Iterates over the events of the species accepted by `filter`.
    ///
    /// Rejected records are still read and counted.
    pub fn events(&mut self, filter: ParticleFilter) -> Events<'_, R> {
        Events {
            reader: self,
            filter,
        }
    }

    /// Iterates over photon events.
    pub fn photons(&mut self) -> Events<'_, R> {
        self.events(ParticleFilter::Photons)
    }

    /// Reads all remaining records, collecting the events accepted by `filter`.
    ///
    /// # Errors
    /// On a read or decode failure, returns a [`PartialLoad`] holding the
    /// events and counts accumulated up to that point.
    pub fn load(mut self, filter: ParticleFilter) -> std::result::Result<EventLoad, PartialLoad> {
        let mut events = Vec::with_capacity(self.budget.min(1 << 20));
        let mut failure = None;
        for item in self.events(filter) {
            match item {
                Ok(event) => events.push(event),
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        let load = EventLoad {
            header: self.header,
            events,
            counts: self.counts,
        };
        match failure {
            None => Ok(load),
            Some(source) => Err(PartialLoad { load, source }),
        }
    }

    /// Releases the underlying stream.
    pub fn into_inner(self) -> R {
        self.source
    }

    fn finish(&mut self) {
        self.done = true;
        let total = self.header.record_count();
        if self.consumed < total {
            return;
        }
        let photons = usize::try_from(self.header.total_photon_records).unwrap_or(0);
        if usize::try_from(self.counts.photons).ok() != Some(photons) {
            log::warn!(
                "header declares {} photon records but {} were read",
                self.header.total_photon_records,
                self.counts.photons
            );
        }
    }
}

/// Iterator over classified records. See [`PhsfReader::records`].
pub struct Records<'a, R> {
    reader: &'a mut PhsfReader<R>,
}

impl<R: Read> Iterator for Records<'_, R> {
    type Item = Result<ClassifiedRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.next_record()
    }
}

/// Iterator over filtered events. See [`PhsfReader::events`].
pub struct Events<'a, R> {
    reader: &'a mut PhsfReader<R>,
    filter: ParticleFilter,
}

impl<R> Events<'_, R> {
    /// Counts of all records read so far through the underlying reader.
    #[must_use]
    pub fn counts(&self) -> ParticleCounts {
        self.reader.counts
    }
}

impl<R: Read> Iterator for Events<'_, R> {
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.reader.next_record()? {
                Ok(rec) if self.filter.accepts(rec.kind) => return Some(Ok(rec.to_event())),
                Ok(_) => {}
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Loads the events of one species from a file.
///
/// `max_records` bounds the number of records read (not events returned).
///
/// # Errors
/// Returns an error if the file cannot be opened or its header is invalid,
/// and [`Error::Partial`] if reading stops early.
pub fn load_events<P: AsRef<Path>>(
    path: P,
    max_records: Option<usize>,
    filter: ParticleFilter,
) -> Result<EventLoad> {
    let mut reader = PhsfReader::open(path)?;
    if let Some(n) = max_records {
        reader = reader.with_max_records(n);
    }
    reader.load(filter).map_err(|e| Error::Partial(Box::new(e)))
}

/// Loads photon events from a file.
///
/// # Errors
/// See [`load_events`].
pub fn load_photons<P: AsRef<Path>>(path: P, max_records: Option<usize>) -> Result<EventLoad> {
    load_events(path, max_records, ParticleFilter::Photons)
}

/// Reads until `buf` is full or the stream ends; returns the bytes read.
fn read_full<R: Read>(source: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use phasespace_beam::{LATCH_ELECTRON, LATCH_POSITRON};

    fn header(tag: &[u8; 5], total: i32, photons: i32) -> Vec<u8> {
        let mut bytes = tag.to_vec();
        bytes.extend_from_slice(&total.to_le_bytes());
        bytes.extend_from_slice(&photons.to_le_bytes());
        bytes.extend_from_slice(&1.33f32.to_le_bytes());
        bytes.extend_from_slice(&0.189f32.to_le_bytes());
        bytes.extend_from_slice(&1.0e6f32.to_le_bytes());
        let padding = if tag == b"MODE2" { 7 } else { 3 };
        bytes.extend(std::iter::repeat(0xAA).take(padding));
        bytes
    }

    fn short_record(latch: i32, e: f32, weight: f32) -> Vec<u8> {
        let mut bytes = latch.to_le_bytes().to_vec();
        for f in [e, 1.0, 2.0, 0.0, 0.6, weight] {
            bytes.extend_from_slice(&f.to_le_bytes());
        }
        bytes
    }

    fn short_file(records: &[(i32, f32, f32)]) -> Vec<u8> {
        let photons = records.iter().filter(|r| r.0 == 0).count();
        let mut bytes = header(
            b"MODE0",
            i32::try_from(records.len()).unwrap(),
            i32::try_from(photons).unwrap(),
        );
        for &(latch, e, wt) in records {
            bytes.extend(short_record(latch, e, wt));
        }
        bytes
    }

    #[test]
    fn test_reads_header() {
        let data = short_file(&[(0, 1.0, 1.0)]);
        let reader = PhsfReader::new(Cursor::new(data)).unwrap();
        assert_eq!(reader.header().mode, Mode::Short);
        assert_eq!(reader.header().total_records, 1);
        assert_eq!(reader.record_budget(), 1);
    }

    #[test]
    fn test_photons_only_with_counts() {
        let data = short_file(&[
            (0, -1.17, 1.0),
            (LATCH_ELECTRON, -2.5, 1.0),
            (LATCH_POSITRON, 0.3, 1.0),
            (0, 1.33, -0.5),
        ]);
        let mut reader = PhsfReader::new(Cursor::new(data)).unwrap();
        let events: Vec<Event> = reader.photons().collect::<Result<_>>().unwrap();

        assert_eq!(events.len(), 2);
        assert_relative_eq!(events[0].energy, 1.17);
        assert_relative_eq!(events[1].weight, 0.5);
        assert_relative_eq!(events[1].w, -0.8, epsilon = 1e-6);

        let counts = reader.counts();
        assert_eq!(counts.photons, 2);
        assert_eq!(counts.electrons, 1);
        assert_eq!(counts.positrons, 1);
        assert_eq!(counts.total(), 4);
    }

    #[test]
    fn test_non_photon_energy_keeps_sign() {
        let data = short_file(&[(LATCH_ELECTRON, -2.5, 1.0)]);
        let mut reader = PhsfReader::new(Cursor::new(data)).unwrap();
        let rec = reader.next_record().unwrap().unwrap();
        assert_eq!(rec.kind, ParticleKind::Electron);
        assert_relative_eq!(rec.record.kinetic_energy, -2.5);

        let data = short_file(&[(LATCH_ELECTRON, -2.5, 1.0)]);
        let mut reader = PhsfReader::new(Cursor::new(data)).unwrap();
        let events: Vec<Event> = reader
            .events(ParticleFilter::Electrons)
            .collect::<Result<_>>()
            .unwrap();
        assert_relative_eq!(events[0].energy, -2.5);
    }

    #[test]
    fn test_max_records() {
        let data = short_file(&[(0, 1.0, 1.0), (0, 2.0, 1.0), (0, 3.0, 1.0)]);
        let mut reader = PhsfReader::new(Cursor::new(data))
            .unwrap()
            .with_max_records(2);
        assert_eq!(reader.records().count(), 2);
        assert_eq!(reader.records_read(), 2);
        assert!(reader.next_record().is_none());
    }

    #[test]
    fn test_unknown_tag() {
        let mut data = short_file(&[(0, 1.0, 1.0)]);
        data[4] = b'9';
        assert!(matches!(
            PhsfReader::new(Cursor::new(data)),
            Err(Error::Format(phasespace_beam::Error::UnknownFormat(_)))
        ));
    }

    #[test]
    fn test_truncated_header() {
        let data = short_file(&[]);
        assert!(matches!(
            PhsfReader::new(Cursor::new(data[..20].to_vec())),
            Err(Error::TruncatedHeader {
                expected: 28,
                actual: 20
            })
        ));
        assert!(matches!(
            PhsfReader::new(Cursor::new(b"MOD".to_vec())),
            Err(Error::TruncatedHeader { actual: 3, .. })
        ));
    }

    #[test]
    fn test_truncated_record_keeps_partial_load() {
        let mut data = short_file(&[(0, 1.0, 1.0), (LATCH_POSITRON, 1.0, 1.0), (0, 2.0, 1.0)]);
        data.truncate(data.len() - 10);

        let reader = PhsfReader::new(Cursor::new(data)).unwrap();
        let partial = reader.load(ParticleFilter::Photons).unwrap_err();
        assert!(matches!(
            partial.source,
            Error::TruncatedRecord {
                index: 2,
                expected: 28,
                actual: 18
            }
        ));
        assert_eq!(partial.load.events.len(), 1);
        assert_eq!(partial.load.counts.total(), 2);
    }

    #[test]
    fn test_iteration_stops_after_error() {
        let mut data = short_file(&[(0, 1.0, 1.0), (0, 2.0, 1.0)]);
        data.truncate(data.len() - 1);
        let mut reader = PhsfReader::new(Cursor::new(data)).unwrap();
        assert!(reader.next_record().unwrap().is_ok());
        assert!(reader.next_record().unwrap().is_err());
        assert!(reader.next_record().is_none());
    }

    #[test]
    fn test_long_mode_z_last() {
        let mut data = header(b"MODE2", 1, 1);
        data.extend_from_slice(&0i32.to_le_bytes());
        for f in [0.662f32, 0.0, 0.0, 0.0, 0.0, 1.0, 55.5] {
            data.extend_from_slice(&f.to_le_bytes());
        }
        let mut reader = PhsfReader::new(Cursor::new(data)).unwrap();
        let events: Vec<Event> = reader.photons().collect::<Result<_>>().unwrap();
        assert_relative_eq!(events[0].z_last, 55.5);
        assert_relative_eq!(events[0].w, 1.0);
    }
}
