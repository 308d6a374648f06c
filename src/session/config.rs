//! Session loading configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::track::TrackCatalog;
use crate::{RaceDataError, Result};

/// Options for [`crate::SessionTracker::open`].
///
/// Every field has a default, so a YAML file only needs the keys it overrides:
///
/// ```rust
/// use racedata::SessionConfig;
///
/// let config = SessionConfig::from_yaml_str("use_descriptor_cache: false\n").unwrap();
/// assert_eq!(config.capture_prefix, "pdata");
/// assert!(!config.use_descriptor_cache);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// File name prefix shared by every packet file in a capture.
    pub capture_prefix: String,
    pub descriptor_filename: String,
    pub use_descriptor_cache: bool,
    pub tracks: TrackCatalog,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            capture_prefix: "pdata".to_string(),
            descriptor_filename: "descriptor.yaml".to_string(),
            use_descriptor_cache: true,
            tracks: TrackCatalog::default(),
        }
    }
}

impl SessionConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml_ng::from_str(yaml)
            .map_err(|e| RaceDataError::parse_error("session config", e.to_string()))
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| RaceDataError::file_error(path.to_path_buf(), e))?;
        Self::from_yaml_str(&yaml)
    }

    pub fn with_tracks(mut self, tracks: TrackCatalog) -> Self {
        self.tracks = tracks;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn empty_document_yields_defaults() -> anyhow::Result<()> {
        let config = SessionConfig::from_yaml_str("{}")?;
        assert_eq!(config, SessionConfig::default());
        Ok(())
    }

    #[test]
    fn tracks_load_from_file() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("racedata.yaml");
        std::fs::write(
            &path,
            r#"
capture_prefix: packet
tracks:
  - name: Donington GP
    length: 4020.0
    pit_entry: [1.0, 0.0, 2.0]
    pit_exit: [50.0, 0.0, 2.0]
    radius: 8.0
"#,
        )?;

        let config = SessionConfig::from_path(&path)?;
        assert_eq!(config.capture_prefix, "packet");
        assert_eq!(config.descriptor_filename, "descriptor.yaml");
        assert!(config.tracks.by_name("Donington GP").is_some());
        Ok(())
    }

    #[test]
    fn missing_file_reports_path() {
        let result = SessionConfig::from_path("/no/such/racedata.yaml");
        match result {
            Err(RaceDataError::File { path, .. }) => assert!(path.ends_with("racedata.yaml")),
            other => panic!("Expected File error, got {:?}", other),
        }
    }
}
