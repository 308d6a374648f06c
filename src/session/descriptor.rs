//! Session descriptor and its on-disk cache.
//!
//! Boundary detection takes three full passes over a capture, so the detected
//! checkpoints are written next to the packets and reused on the next load. The
//! cache is an optimisation only: a missing, unreadable or unparsable file means
//! detection runs again, and a failed write is logged and ignored.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::packet::PacketHash;
use crate::{RaceDataError, Result};

/// The three checkpoint packets bounding a race within a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct SessionDescriptor {
    /// Last packet of the race (the final tick of the chequered-flag run).
    pub race_end: PacketHash,
    /// Last packet still in the racing state.
    pub race_finish: PacketHash,
    /// First fully populated packet of the race session.
    pub race_start: PacketHash,
}

impl SessionDescriptor {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml_ng::from_str(yaml)
            .map_err(|e| RaceDataError::parse_error("session descriptor", e.to_string()))
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml_ng::to_string(self)
            .map_err(|e| RaceDataError::parse_error("session descriptor", e.to_string()))
    }
}

/// Descriptor file stored inside a capture directory.
#[derive(Debug, Clone)]
pub struct DescriptorCache {
    path: PathBuf,
}

impl DescriptorCache {
    pub fn new<P: AsRef<Path>>(directory: P, filename: &str) -> Self {
        Self { path: directory.as_ref().join(filename) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the cached descriptor, if a usable one exists.
    pub fn load(&self) -> Option<SessionDescriptor> {
        let yaml = match fs::read_to_string(&self.path) {
            Ok(yaml) => yaml,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "No cached session descriptor");
                return None;
            }
        };

        match SessionDescriptor::from_yaml_str(&yaml) {
            Ok(descriptor) => {
                debug!(path = %self.path.display(), "Using cached session descriptor");
                Some(descriptor)
            }
            Err(e) => {
                warn!("Ignoring unparsable session descriptor {}: {}", self.path.display(), e);
                None
            }
        }
    }

    /// Write the descriptor. Failures are logged, never returned.
    pub fn store(&self, descriptor: &SessionDescriptor) {
        let result = descriptor
            .to_yaml_string()
            .and_then(|yaml| {
                fs::write(&self.path, yaml)
                    .map_err(|e| RaceDataError::file_error(self.path.clone(), e))
            });

        match result {
            Ok(()) => debug!(path = %self.path.display(), "Stored session descriptor"),
            Err(e) => warn!("Could not store session descriptor {}: {}", self.path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn descriptor() -> SessionDescriptor {
        SessionDescriptor {
            race_end: PacketHash(0x1111_2222_3333_4444),
            race_finish: PacketHash(0x0000_0000_0000_00ff),
            race_start: PacketHash(0x9999_aaaa_bbbb_cccc),
        }
    }

    #[test]
    fn store_then_load() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let cache = DescriptorCache::new(dir.path(), "descriptor.yaml");

        assert!(cache.load().is_none());
        cache.store(&descriptor());
        assert_eq!(cache.load(), Some(descriptor()));
        Ok(())
    }

    #[test]
    fn unparsable_cache_is_ignored() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let cache = DescriptorCache::new(dir.path(), "descriptor.yaml");
        fs::write(cache.path(), "race_end: [not, a, hash]\n")?;

        assert!(cache.load().is_none());
        Ok(())
    }

    #[test]
    fn failed_store_is_not_fatal() {
        let cache = DescriptorCache::new("/definitely/not/a/capture", "descriptor.yaml");
        cache.store(&descriptor());
        assert!(cache.load().is_none());
    }

    #[test]
    fn yaml_uses_hex_hashes() -> anyhow::Result<()> {
        let yaml = descriptor().to_yaml_string()?;
        assert!(yaml.contains("1111222233334444"));
        assert!(yaml.contains("00000000000000ff"));
        assert_eq!(SessionDescriptor::from_yaml_str(&yaml)?, descriptor());
        Ok(())
    }
}
