//! Error types for capture decoding and session reconstruction.
//!
//! All errors implement the `std::error::Error` trait and carry structured context
//! describing which record, file or checkpoint caused the failure.
//!
//! ## Error Categories
//!
//! - **Packet Errors**: a capture file whose bytes match no known packet layout
//! - **Capture Errors**: missing directories, unreadable files, empty captures
//! - **Roster Errors**: the driver roster could not be populated from the stream
//! - **Timing Errors**: sector numbers outside the three logical sectors
//! - **Parse Errors**: malformed YAML configuration or cached descriptors
//!
//! Reaching the end of a capture is not an error. [`crate::SessionTracker::advance`]
//! reports it as [`crate::Advance::Exhausted`].
//!
//! ## Helper Constructors
//!
//! ```rust
//! use racedata::RaceDataError;
//! use std::path::PathBuf;
//!
//! let packet_error = RaceDataError::malformed(12, "length matches no packet layout");
//! assert!(packet_error.is_capture_fault());
//!
//! let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
//! let file_error = RaceDataError::file_error(PathBuf::from("/captures/race1/pdata12"), io_err);
//! assert!(file_error.to_string().contains("pdata12"));
//! ```

use std::path::PathBuf;
use thiserror::Error;

use crate::packet::PacketHash;

/// Result type alias for capture operations.
pub type Result<T, E = RaceDataError> = std::result::Result<T, E>;

/// Main error type for capture decoding and session reconstruction.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RaceDataError {
    #[error("Malformed packet of {length} bytes: {details}")]
    MalformedPacket { length: usize, details: String },

    #[error("Capture directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Capture file error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Capture contains no telemetry packets: {path}")]
    EmptyCapture { path: PathBuf },

    #[error("{checkpoint} packet {hash} not found in capture")]
    CheckpointNotFound { checkpoint: &'static str, hash: PacketHash },

    #[error("Roster underflow: expected {expected} drivers, collected {collected}{}", reported_suffix(.reported))]
    RosterUnderflow { expected: usize, collected: usize, reported: Option<i8> },

    #[error("Invalid sector number {sector}")]
    InvalidSectorNumber { sector: u8 },

    #[error("Parse error in {context}: {details}")]
    Parse { context: String, details: String },
}

impl RaceDataError {
    /// Returns whether this error indicates a corrupt or truncated capture.
    ///
    /// Capture faults abort the whole load; re-running against the same files
    /// will fail the same way.
    pub fn is_capture_fault(&self) -> bool {
        match self {
            RaceDataError::MalformedPacket { .. } => true,
            RaceDataError::EmptyCapture { .. } => true,
            RaceDataError::RosterUnderflow { .. } => true,
            RaceDataError::InvalidSectorNumber { .. } => true,
            RaceDataError::CheckpointNotFound { .. } => true,
            RaceDataError::DirectoryNotFound { .. } => false,
            RaceDataError::File { .. } => false,
            RaceDataError::Parse { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            RaceDataError::MalformedPacket { .. } => vec![
                "Check the capture was recorded with the matching protocol build",
                "Remove stray non-packet files matching the capture prefix",
            ],
            RaceDataError::DirectoryNotFound { .. } => vec![
                "Check the capture directory path",
                "Verify the directory is readable",
            ],
            RaceDataError::File { .. } => vec![
                "Check file exists and is readable",
                "Check file permissions",
            ],
            RaceDataError::EmptyCapture { .. } => vec![
                "Verify the capture prefix matches the packet file names",
                "Re-record the session with telemetry broadcasting enabled",
            ],
            RaceDataError::CheckpointNotFound { .. } => vec![
                "Delete the cached session descriptor and reload",
                "Verify no capture files were removed after detection",
            ],
            RaceDataError::RosterUnderflow { .. } => vec![
                "Verify the capture contains participant packets after race start",
                "Check the capture is not truncated",
            ],
            RaceDataError::InvalidSectorNumber { .. } => vec![
                "Verify source data integrity",
                "Check the race start checkpoint is fully populated",
            ],
            RaceDataError::Parse { .. } => vec![
                "Check the YAML syntax",
                "Compare against the documented configuration fields",
            ],
        }
    }

    /// Helper constructor for malformed packet errors.
    pub fn malformed(length: usize, details: impl Into<String>) -> Self {
        RaceDataError::MalformedPacket { length, details: details.into() }
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        RaceDataError::File { path, source }
    }

    /// Helper constructor for parse errors.
    pub fn parse_error(context: impl Into<String>, details: impl Into<String>) -> Self {
        RaceDataError::Parse { context: context.into(), details: details.into() }
    }
}

fn reported_suffix(reported: &Option<i8>) -> String {
    match reported {
        Some(size) => format!(" (telemetry now reports {})", size),
        None => String::new(),
    }
}

impl From<std::io::Error> for RaceDataError {
    fn from(err: std::io::Error) -> Self {
        RaceDataError::File { path: PathBuf::from("<unknown>"), source: err }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn error_messages_carry_their_context(
            length in 0usize..4096usize,
            details in ".*",
            sector in any::<u8>(),
            expected in 1usize..64usize,
            collected in 0usize..64usize,
        ) {
            let malformed = RaceDataError::malformed(length, details.clone());
            let message = malformed.to_string();
            prop_assert!(message.contains(&length.to_string()));
            prop_assert!(message.contains(&details));

            let sector_error = RaceDataError::InvalidSectorNumber { sector };
            prop_assert!(sector_error.to_string().contains(&sector.to_string()));

            let roster = RaceDataError::RosterUnderflow { expected, collected, reported: None };
            let roster_message = roster.to_string();
            prop_assert!(roster_message.contains(&expected.to_string()));
            prop_assert!(!roster_message.contains("telemetry now reports"));
        }
    }

    #[test]
    fn roster_underflow_mentions_reported_size() {
        let error = RaceDataError::RosterUnderflow { expected: 20, collected: 3, reported: Some(1) };
        assert!(error.to_string().contains("telemetry now reports 1"));
    }

    #[test]
    fn error_traits_validation() {
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<RaceDataError>();

        let error = RaceDataError::malformed(3, "test");
        let _: &dyn std::error::Error = &error;
    }

    #[test]
    fn capture_faults_are_classified() {
        assert!(RaceDataError::InvalidSectorNumber { sector: 0 }.is_capture_fault());
        assert!(
            !RaceDataError::DirectoryNotFound { path: PathBuf::from("/missing") }.is_capture_fault()
        );

        for suggestion in RaceDataError::malformed(1, "x").recovery_suggestions() {
            assert!(suggestion.len() > 5);
        }
    }

    #[test]
    fn from_io_error_keeps_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test file");
        let error: RaceDataError = io_err.into();

        match error {
            RaceDataError::File { source, .. } => assert_eq!(source.to_string(), "test file"),
            _ => panic!("Expected File error variant"),
        }
    }
}
