//! Read-only memory mappings of phase-space files.

use crate::Result;
use memmap2::Mmap;
use std::fs::File;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A phase-space file mapped into memory.
///
/// The mapping is reference counted, so cursors handed out by
/// [`cursor`](Self::cursor) stay valid after the reader is dropped.
pub struct MappedFileReader {
    map: Arc<Mmap>,
    path: PathBuf,
}

impl MappedFileReader {
    /// Maps `path` read-only.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or mapped.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        // SAFETY: the mapping is read-only; the file must not be truncated
        // or rewritten while mapped.
        #[allow(unsafe_code)]
        let map = unsafe { Mmap::map(&file)? };
        log::debug!("mapped {} ({} bytes)", path.display(), map.len());
        Ok(Self {
            map: Arc::new(map),
            path,
        })
    }

    /// The mapped bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.map
    }

    /// Mapped length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// True for a zero-length file.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Path the mapping was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A sequential [`Read`](std::io::Read) over the whole mapping.
    #[must_use]
    pub fn cursor(&self) -> Cursor<SharedMmap> {
        Cursor::new(SharedMmap(Arc::clone(&self.map)))
    }
}

/// Shared handle to a mapping, usable as the backing store of a `Cursor`.
#[derive(Clone)]
pub struct SharedMmap(Arc<Mmap>);

impl AsRef<[u8]> for SharedMmap {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use tempfile::NamedTempFile;

    #[test]
    fn test_mapped_file_reader() {
        let mut file = NamedTempFile::new().unwrap();
        let data: Vec<u8> = (0..64).collect();
        file.write_all(&data).unwrap();
        file.flush().unwrap();

        let reader = MappedFileReader::open(file.path()).unwrap();
        assert_eq!(reader.len(), 64);
        assert!(!reader.is_empty());
        assert_eq!(reader.as_bytes(), &data[..]);
        assert_eq!(reader.path(), file.path());
    }

    #[test]
    fn test_cursor_reads_sequentially() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"MODE0rest").unwrap();
        file.flush().unwrap();

        let reader = MappedFileReader::open(file.path()).unwrap();
        let mut cursor = reader.cursor();
        drop(reader);

        let mut tag = [0u8; 5];
        cursor.read_exact(&mut tag).unwrap();
        assert_eq!(&tag, b"MODE0");
        let mut rest = Vec::new();
        cursor.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, b"rest");
    }
}
