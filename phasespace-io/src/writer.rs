//! Flat event-list writers.

use crate::Result;
use phasespace_core::Event;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Column names in event order.
pub const EVENT_COLUMNS: [&str; 8] = ["weight", "energy", "x", "y", "z_last", "u", "v", "w"];

/// Writer for flattened event lists.
///
/// One event per line, columns `weight energy x y z_last u v w`.
pub struct EventWriter<W: Write = BufWriter<File>> {
    writer: W,
    wrote_header: bool,
}

impl EventWriter<BufWriter<File>> {
    /// Creates a new file writer.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> EventWriter<W> {
    /// Wraps an existing writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            wrote_header: false,
        }
    }

    /// Writes events as fixed-width text.
    ///
    /// Each value is in scientific notation with four fractional digits and
    /// a signed two-digit exponent, right-aligned in 15 columns.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub fn write_text(&mut self, events: &[Event]) -> Result<()> {
        for event in events {
            let line = event
                .to_array()
                .iter()
                .map(|&v| format_scientific(f64::from(v), 15, 4))
                .collect::<Vec<_>>()
                .join(" ");
            writeln!(self.writer, "{line}")?;
        }
        Ok(())
    }

    /// Writes events as CSV. The header row is written once, before the
    /// first batch.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub fn write_csv(&mut self, events: &[Event]) -> Result<()> {
        if !self.wrote_header {
            writeln!(self.writer, "{}", EVENT_COLUMNS.join(","))?;
            self.wrote_header = true;
        }
        for e in events {
            writeln!(
                self.writer,
                "{},{},{},{},{},{},{},{}",
                e.weight, e.energy, e.x, e.y, e.z_last, e.u, e.v, e.w
            )?;
        }
        Ok(())
    }

    /// Flushes the writer.
    ///
    /// # Errors
    /// Returns an error if flushing fails.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Flushes and returns the inner writer.
    ///
    /// # Errors
    /// Returns an error if flushing fails.
    pub fn into_inner(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// Formats `value` as `d.dddde+XX`, right-aligned to `width`.
fn format_scientific(value: f64, width: usize, precision: usize) -> String {
    if !value.is_finite() {
        let text = if value.is_nan() {
            "nan"
        } else if value > 0.0 {
            "inf"
        } else {
            "-inf"
        };
        return format!("{text:>width$}");
    }

    let raw = format!("{value:.precision$e}");
    let text = match raw.split_once('e') {
        Some((mantissa, exp)) => {
            let exp: i32 = exp.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exp.unsigned_abs())
        }
        None => raw,
    };
    format!("{text:>width$}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn event(weight: f32, energy: f32) -> Event {
        Event {
            weight,
            energy,
            x: -1.5,
            y: 0.0,
            z_last: 0.0,
            u: 0.0,
            v: 0.0,
            w: 1.0,
        }
    }

    #[test]
    fn test_format_scientific() {
        assert_eq!(format_scientific(1.23456, 15, 4), "     1.2346e+00");
        assert_eq!(format_scientific(-0.00025, 15, 4), "    -2.5000e-04");
        assert_eq!(format_scientific(0.0, 15, 4), "     0.0000e+00");
        assert_eq!(format_scientific(1.5e120, 15, 4), "    1.5000e+120");
        assert_eq!(format_scientific(f64::NAN, 5, 4), "  nan");
    }

    #[test]
    fn test_write_text() {
        let mut writer = EventWriter::new(Vec::new());
        writer.write_text(&[event(1.0, 0.5)]).unwrap();
        let out = String::from_utf8(writer.into_inner().unwrap()).unwrap();

        let line = out.lines().next().unwrap();
        assert_eq!(line.len(), 8 * 15 + 7);
        assert!(line.starts_with("     1.0000e+00      5.0000e-01     -1.5000e+00"));
    }

    #[test]
    fn test_write_csv_file() {
        let file = NamedTempFile::new().unwrap();
        let mut writer = EventWriter::create(file.path()).unwrap();
        writer.write_csv(&[event(1.0, 0.5)]).unwrap();
        writer.write_csv(&[event(2.0, 1.25)]).unwrap();
        writer.flush().unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "weight,energy,x,y,z_last,u,v,w");
        assert_eq!(lines[1], "1,0.5,-1.5,0,0,0,0,1");
        assert_eq!(lines[2], "2,1.25,-1.5,0,0,0,0,1");
    }
}
