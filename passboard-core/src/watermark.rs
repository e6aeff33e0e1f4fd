//! Snapshot freshness watermark.
//!
//! The watermark is the modification time of the snapshot slot. It lets a
//! cycle tell, before parsing anything, whether extraction actually
//! materialized a newer snapshot.

use std::path::Path;
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};

/// Modification time of a file, `None` when the file does not exist or its
/// metadata cannot be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Watermark(Option<SystemTime>);

impl Watermark {
    /// Watermark of an absent snapshot.
    pub const ABSENT: Watermark = Watermark(None);

    /// Read the watermark of `path`. Unreadable metadata is treated as absent.
    pub fn of(path: &Path) -> Watermark {
        match std::fs::metadata(path) {
            Ok(meta) => Watermark(meta.modified().ok()),
            Err(_) => Watermark::ABSENT,
        }
    }

    pub fn from_system_time(time: SystemTime) -> Watermark {
        Watermark(Some(time))
    }

    pub fn is_present(&self) -> bool {
        self.0.is_some()
    }

    /// `true` only when `self` is strictly newer than `earlier`. Any present
    /// watermark is fresher than an absent one; two absent ones are equal.
    pub fn is_fresher_than(&self, earlier: &Watermark) -> bool {
        match (self.0, earlier.0) {
            (Some(now), Some(before)) => now > before,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    pub fn as_system_time(&self) -> Option<SystemTime> {
        self.0
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        self.0.map(DateTime::<Utc>::from)
    }

    /// Compact age (`42s`, `3m`, `5h`, `2d`), or `never` when absent.
    pub fn age(&self) -> String {
        match self.0 {
            Some(time) => format_system_time_age(time),
            None => "never".to_string(),
        }
    }
}

/// Format age from a filesystem timestamp.
pub fn format_system_time_age(timestamp: SystemTime) -> String {
    let age = SystemTime::now()
        .duration_since(timestamp)
        .unwrap_or_default();
    format_duration(age)
}

fn format_duration(duration: Duration) -> String {
    format_seconds(duration.as_secs())
}

fn format_seconds(seconds: u64) -> String {
    if seconds < 60 {
        return format!("{seconds}s");
    }
    if seconds < 60 * 60 {
        return format!("{}m", seconds / 60);
    }
    if seconds < 60 * 60 * 24 {
        return format!("{}h", seconds / (60 * 60));
    }
    format!("{}d", seconds / (60 * 60 * 24))
}
