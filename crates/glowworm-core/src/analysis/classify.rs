//! Complexity classification from MIME type and byte size.

use crate::types::{Complexity, MediaKind};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Classify a file into a complexity tier.
///
/// Thresholds are in megabytes (1024^2 bytes) with exclusive upper bounds,
/// so a file exactly on a threshold lands in the higher tier. Video is
/// never `Simple`; audio and other files are never `Enterprise`.
pub fn classify(mime_type: &str, byte_size: u64) -> Complexity {
    let mb = byte_size as f64 / BYTES_PER_MB;

    match MediaKind::from_mime(mime_type) {
        MediaKind::Image => {
            if mb < 5.0 {
                Complexity::Simple
            } else if mb < 20.0 {
                Complexity::Medium
            } else if mb < 100.0 {
                Complexity::Complex
            } else {
                Complexity::Enterprise
            }
        }
        MediaKind::Video => {
            if mb < 50.0 {
                Complexity::Medium
            } else if mb < 500.0 {
                Complexity::Complex
            } else {
                Complexity::Enterprise
            }
        }
        MediaKind::Audio | MediaKind::Other => {
            if mb < 10.0 {
                Complexity::Simple
            } else if mb < 50.0 {
                Complexity::Medium
            } else {
                Complexity::Complex
            }
        }
    }
}
