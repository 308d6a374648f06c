//! Track geometry reference used for pit-stop detection.
//!
//! Telemetry carries no track identifier, only the lap length, so a session is
//! matched to the catalog entry whose length is nearest. Geometry is supplied by
//! the caller (usually through [`crate::SessionConfig`]); with an empty catalog
//! pit detection is simply off.
//!
//! ```yaml
//! tracks:
//!   - name: Brands Hatch Indy
//!     length: 1929.0
//!     pit_entry: [-421.5, 4.0, 285.0]
//!     pit_exit: [-182.0, 4.0, 204.0]
//!     radius: 15.0
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{RaceDataError, Result};

/// Pit lane entry and exit points of one circuit layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct TrackGeometry {
    pub name: String,
    /// Lap length in metres, as reported by telemetry.
    pub length: f32,
    pub pit_entry: [f32; 3],
    pub pit_exit: [f32; 3],
    /// Capture radius around both pit points, in metres.
    pub radius: f32,
}

impl TrackGeometry {
    pub fn at_pit_entry(&self, position: [f32; 3]) -> bool {
        within(position, self.pit_entry, self.radius)
    }

    pub fn at_pit_exit(&self, position: [f32; 3]) -> bool {
        within(position, self.pit_exit, self.radius)
    }
}

fn within(a: [f32; 3], b: [f32; 3], radius: f32) -> bool {
    let distance_sq: f32 = a.iter().zip(b.iter()).map(|(p, q)| (p - q) * (p - q)).sum();
    distance_sq <= radius * radius
}

/// Known circuits, looked up by name or by reported track length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(transparent)]
pub struct TrackCatalog {
    tracks: Vec<TrackGeometry>,
}

impl TrackCatalog {
    pub fn new(tracks: Vec<TrackGeometry>) -> Self {
        Self { tracks }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml_ng::from_str(yaml)
            .map_err(|e| RaceDataError::parse_error("track catalog", e.to_string()))
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| RaceDataError::file_error(path.to_path_buf(), e))?;
        Self::from_yaml_str(&yaml)
    }

    pub fn by_name(&self, name: &str) -> Option<&TrackGeometry> {
        self.tracks.iter().find(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// Entry with the smallest absolute length difference.
    pub fn nearest_by_length(&self, length: f32) -> Option<&TrackGeometry> {
        self.tracks.iter().min_by(|a, b| {
            (a.length - length).abs().total_cmp(&(b.length - length).abs())
        })
    }

    pub fn tracks(&self) -> &[TrackGeometry] {
        &self.tracks
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"
- name: Brands Hatch Indy
  length: 1929.0
  pit_entry: [-421.5, 4.0, 285.0]
  pit_exit: [-182.0, 4.0, 204.0]
  radius: 15.0
- name: Silverstone GP
  length: 5891.0
  pit_entry: [10.0, 0.0, 10.0]
  pit_exit: [90.0, 0.0, 10.0]
  radius: 12.0
"#;

    #[test]
    fn lookup_by_nearest_length() -> anyhow::Result<()> {
        let catalog = TrackCatalog::from_yaml_str(CATALOG)?;

        let track = catalog.nearest_by_length(5880.3).map(|t| t.name.as_str());
        assert_eq!(track, Some("Silverstone GP"));
        let track = catalog.nearest_by_length(2100.0).map(|t| t.name.as_str());
        assert_eq!(track, Some("Brands Hatch Indy"));
        Ok(())
    }

    #[test]
    fn lookup_by_name_ignores_case() -> anyhow::Result<()> {
        let catalog = TrackCatalog::from_yaml_str(CATALOG)?;
        assert!(catalog.by_name("silverstone gp").is_some());
        assert!(catalog.by_name("Monza").is_none());
        Ok(())
    }

    #[test]
    fn empty_catalog_matches_nothing() {
        assert!(TrackCatalog::default().nearest_by_length(1000.0).is_none());
    }

    #[test]
    fn capture_radius_is_three_dimensional() -> anyhow::Result<()> {
        let catalog = TrackCatalog::from_yaml_str(CATALOG)?;
        let track = catalog.by_name("Silverstone GP").ok_or_else(|| anyhow::anyhow!("missing"))?;

        assert!(track.at_pit_entry([18.0, 0.0, 10.0]));
        assert!(!track.at_pit_entry([18.0, 9.0, 10.0]));
        assert!(track.at_pit_exit([90.0, 0.0, 22.0]));
        Ok(())
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let result = TrackCatalog::from_yaml_str("- name: [unterminated");
        assert!(matches!(result, Err(RaceDataError::Parse { .. })));
    }
}
