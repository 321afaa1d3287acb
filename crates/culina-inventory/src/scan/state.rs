//! Scan pipeline states and their allowed transitions.
//!
//! - Idle -> Capturing (user starts a scan)
//! - Capturing -> Recognizing (photo captured)
//! - Capturing -> Idle (permission denied or capture cancelled)
//! - Recognizing -> Reviewing (new ingredients found)
//! - Recognizing -> Idle (recognition failed or nothing new)
//! - Reviewing -> Merging (confirm)
//! - Reviewing -> Idle (cancel)
//! - Merging -> Idle (merge complete)

use std::fmt;

/// Where a scan currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanState {
    /// No scan in progress.
    Idle,
    /// Waiting for permission and a photo.
    Capturing,
    /// Photo sent to the recognizer.
    Recognizing,
    /// Candidates are awaiting user confirmation.
    Reviewing,
    /// Confirmed candidates are being turned into inventory items.
    Merging,
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanState::Idle => write!(f, "Idle"),
            ScanState::Capturing => write!(f, "Capturing"),
            ScanState::Recognizing => write!(f, "Recognizing"),
            ScanState::Reviewing => write!(f, "Reviewing"),
            ScanState::Merging => write!(f, "Merging"),
        }
    }
}

impl ScanState {
    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &ScanState) -> bool {
        matches!(
            (self, target),
            (ScanState::Idle, ScanState::Capturing)
                | (ScanState::Capturing, ScanState::Recognizing)
                | (ScanState::Recognizing, ScanState::Reviewing)
                | (ScanState::Reviewing, ScanState::Merging)
                | (ScanState::Merging, ScanState::Idle)
                // Early exits
                | (ScanState::Capturing, ScanState::Idle)
                | (ScanState::Recognizing, ScanState::Idle)
                | (ScanState::Reviewing, ScanState::Idle)
        )
    }

    /// Whether a scan run is in progress.
    pub fn is_busy(&self) -> bool {
        !matches!(self, ScanState::Idle)
    }
}
