//! Capture directory reader.
//!
//! A capture is a directory holding one raw packet per file, named with a common
//! prefix and a sequence number (`pdata1`, `pdata2`, ...). Natural filename order
//! is temporal order.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use racedata::{PacketStream, StreamOrder};
//!
//! fn count_telemetry() -> racedata::Result<usize> {
//!     let stream = PacketStream::open("captures/monza", "pdata", StreamOrder::Forward)?;
//!     println!("Capture contains {} packets", stream.packet_count());
//!
//!     let mut telemetry = 0;
//!     for packet in stream {
//!         if packet?.as_telemetry().is_some() {
//!             telemetry += 1;
//!         }
//!     }
//!     Ok(telemetry)
//! }
//! ```
//!
//! The stream holds only the sorted file list; each packet is read and decoded
//! when the iterator reaches it. To start over, open a new stream.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use super::natural::natural_cmp;
use crate::packet::Packet;
use crate::{RaceDataError, Result};

/// Direction in which a capture is replayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOrder {
    Forward,
    Reverse,
}

/// Lazy sequence of decoded packets from a capture directory.
#[derive(Debug)]
pub struct PacketStream {
    directory: PathBuf,
    order: StreamOrder,
    packet_count: usize,
    files: std::vec::IntoIter<PathBuf>,
}

impl PacketStream {
    /// Enumerate the capture files under `directory` whose names start with `prefix`.
    ///
    /// A path that is missing, not a directory or cannot be listed is reported as
    /// [`RaceDataError::DirectoryNotFound`].
    pub fn open<P: AsRef<Path>>(directory: P, prefix: &str, order: StreamOrder) -> Result<Self> {
        Self::open_with(directory.as_ref(), prefix, order, |dir| fs::read_dir(dir))
    }

    fn open_with<F>(directory: &Path, prefix: &str, order: StreamOrder, list: F) -> Result<Self>
    where
        F: FnOnce(&Path) -> io::Result<fs::ReadDir>,
    {
        let directory = directory.to_path_buf();
        if !directory.is_dir() {
            return Err(RaceDataError::DirectoryNotFound { path: directory });
        }

        let entries = match list(&directory) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("Cannot list {}: {}", directory.display(), e);
                return Err(RaceDataError::DirectoryNotFound { path: directory });
            }
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| RaceDataError::file_error(directory.clone(), e))?;
            let matches_prefix = entry.file_name().to_str().is_some_and(|n| n.starts_with(prefix));
            if matches_prefix && entry.path().is_file() {
                files.push(entry.path());
            }
        }

        files.sort_by(|a, b| natural_cmp(&file_name(a), &file_name(b)));
        if order == StreamOrder::Reverse {
            files.reverse();
        }

        debug!(
            "Opened capture {} ({} packets, {:?})",
            directory.display(),
            files.len(),
            order
        );

        Ok(Self { directory, order, packet_count: files.len(), files: files.into_iter() })
    }

    /// Total number of capture files matched when the stream was opened.
    pub fn packet_count(&self) -> usize {
        self.packet_count
    }

    /// Files not yet consumed.
    pub fn remaining(&self) -> usize {
        self.files.len()
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn order(&self) -> StreamOrder {
        self.order
    }
}

impl Iterator for PacketStream {
    type Item = Result<Packet>;

    fn next(&mut self) -> Option<Self::Item> {
        let path = self.files.next()?;
        Some(read_packet(&path))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.files.size_hint()
    }
}

/// Read and decode a single capture file.
pub fn read_packet(path: &Path) -> Result<Packet> {
    let data = fs::read(path).map_err(|e| RaceDataError::file_error(path.to_path_buf(), e))?;
    trace!("Read {} bytes from {}", data.len(), path.display());

    Packet::decode(&data).map_err(|e| match e {
        RaceDataError::MalformedPacket { length, details } => RaceDataError::MalformedPacket {
            length,
            details: format!("{}: {}", path.display(), details),
        },
        other => other,
    })
}

fn file_name(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
}
