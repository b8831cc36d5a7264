//! Human-readable progress, speed, and ETA for in-flight attachment transfers.
//!
//! Pure derivations over externally supplied byte counters — the transfer
//! mechanism itself lives elsewhere; this module only formats its numbers.

use std::fmt;

const KIB: f64 = 1024.0;
const MIB: f64 = 1024.0 * 1024.0;

/// Latest progress sample for one attachment transfer. Recomputed per tick;
/// no identity beyond the attachment it describes.
#[derive(Debug, Clone)]
pub struct UploadProgress {
    pub file_name: String,
    /// Percent complete, 0–100.
    pub percent: f64,
    /// Instantaneous transfer rate; `None` while unknown.
    pub bytes_per_second: Option<f64>,
    pub total_bytes: u64,
}

impl UploadProgress {
    pub fn size_label(&self) -> String {
        format_size(self.total_bytes)
    }

    pub fn speed_label(&self) -> String {
        format_speed(self.bytes_per_second)
    }

    pub fn time_remaining(&self) -> Option<TimeRemaining> {
        estimate_time_remaining(self.total_bytes, self.percent, self.bytes_per_second)
    }

    pub fn is_complete(&self) -> bool {
        self.percent >= 100.0
    }
}

/// Format a byte count: plain bytes under 1 KiB, then KB/MB with one decimal.
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if (bytes as f64) < MIB {
        format!("{:.1} KB", bytes as f64 / KIB)
    } else {
        format!("{:.1} MB", bytes as f64 / MIB)
    }
}

/// Format a transfer rate. Zero or unknown speed renders as "0 B/s".
pub fn format_speed(bytes_per_second: Option<f64>) -> String {
    let speed = bytes_per_second.unwrap_or(0.0);
    if speed <= 0.0 {
        "0 B/s".to_string()
    } else if speed < KIB {
        format!("{:.0} B/s", speed)
    } else if speed < MIB {
        format!("{:.1} KB/s", speed / KIB)
    } else {
        format!("{:.1} MB/s", speed / MIB)
    }
}

/// Remaining transfer time, coarsened for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRemaining {
    Seconds(u64),
    Minutes(u64),
}

impl fmt::Display for TimeRemaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seconds(s) => write!(f, "{} seconds", s),
            Self::Minutes(m) => write!(f, "{} minutes", m),
        }
    }
}

/// Estimate time remaining from the latest sample. `None` when the speed is
/// zero/unknown or the transfer is already complete.
pub fn estimate_time_remaining(
    total_bytes: u64,
    percent: f64,
    bytes_per_second: Option<f64>,
) -> Option<TimeRemaining> {
    let speed = bytes_per_second.filter(|s| *s > 0.0)?;
    if percent >= 100.0 {
        return None;
    }

    let remaining_bytes = total_bytes as f64 * ((100.0 - percent) / 100.0);
    let seconds = remaining_bytes / speed;

    if seconds < 60.0 {
        Some(TimeRemaining::Seconds(seconds.ceil() as u64))
    } else {
        Some(TimeRemaining::Minutes((seconds / 60.0).ceil() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size_tiers() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn test_format_speed_tiers() {
        assert_eq!(format_speed(None), "0 B/s");
        assert_eq!(format_speed(Some(0.0)), "0 B/s");
        assert_eq!(format_speed(Some(500.0)), "500 B/s");
        assert_eq!(format_speed(Some(2048.0)), "2.0 KB/s");
        assert_eq!(format_speed(Some(3.0 * 1024.0 * 1024.0)), "3.0 MB/s");
    }

    #[test]
    fn test_estimate_halfway() {
        // 500 KB left at 100 KB/s -> 5 seconds.
        let eta = estimate_time_remaining(1_000_000, 50.0, Some(100_000.0)).unwrap();
        assert_eq!(eta, TimeRemaining::Seconds(5));
    }

    #[test]
    fn test_estimate_rounds_up_to_minutes() {
        // 90 seconds of work left -> 2 minutes (ceiling).
        let eta = estimate_time_remaining(9_000_000, 0.0, Some(100_000.0)).unwrap();
        assert_eq!(eta, TimeRemaining::Minutes(2));
    }

    #[test]
    fn test_estimate_unavailable() {
        assert_eq!(estimate_time_remaining(1_000, 50.0, None), None);
        assert_eq!(estimate_time_remaining(1_000, 50.0, Some(0.0)), None);
        assert_eq!(estimate_time_remaining(1_000, 100.0, Some(100.0)), None);
    }

    #[test]
    fn test_progress_sample_labels() {
        let p = UploadProgress {
            file_name: "scan.png".into(),
            percent: 25.0,
            bytes_per_second: Some(2048.0),
            total_bytes: 4096,
        };
        assert_eq!(p.size_label(), "4.0 KB");
        assert_eq!(p.speed_label(), "2.0 KB/s");
        assert_eq!(p.time_remaining(), Some(TimeRemaining::Seconds(2)));
        assert!(!p.is_complete());
    }
}
