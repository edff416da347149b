//! Bounded reading of dump files.
//!
//! Dumps are memory-mapped and copied once into a [`Bytes`] buffer, which the
//! container reader then slices without further copies.

pub mod error;

use crate::config::IoLimits;
use crate::io::error::{IoError, Result};
use bytes::Bytes;
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;
use tracing::{debug, warn};

/// A size-limited, memory-mapped dump file.
pub struct SafeReader {
    mmap: Mmap,
}

impl SafeReader {
    /// Opens and maps a dump file.
    ///
    /// Fails with `IoError::FileTooLarge` above `limits.max_file_size` and with
    /// `IoError::Empty` for zero-length files (which cannot be mapped).
    pub fn open<P: AsRef<Path>>(path: P, limits: &IoLimits) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let file_size = file.metadata()?.len();

        debug!(
            path = %path.display(),
            size = file_size,
            limit = limits.max_file_size,
            "Opening dump file"
        );

        if file_size > limits.max_file_size {
            warn!(
                path = %path.display(),
                size = file_size,
                limit = limits.max_file_size,
                "Dump file is too large"
            );
            return Err(IoError::FileTooLarge {
                limit: limits.max_file_size,
                found: file_size,
            });
        }
        if file_size == 0 {
            return Err(IoError::Empty);
        }

        // Safety: read-only map of a regular file; the copy in read_all()
        // decouples callers from later modification of the file.
        let mmap = unsafe { Mmap::map(&file)? };

        Ok(Self { mmap })
    }

    /// Size of the mapped file in bytes.
    pub fn size(&self) -> u64 {
        self.mmap.len() as u64
    }

    /// Copy the whole dump into a reference-counted buffer.
    pub fn read_all(&self) -> Bytes {
        Bytes::copy_from_slice(&self.mmap[..])
    }
}

/// Read a dump file in one step.
pub fn read_dump<P: AsRef<Path>>(path: P, limits: &IoLimits) -> Result<Bytes> {
    Ok(SafeReader::open(path, limits)?.read_all())
}
