use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::geo::Point;

/// Data older than this is shown as stale
pub const FRESHNESS_WINDOW_SECS: i64 = 15 * 60;

/// Who reported a radar location
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Source {
    Official,
    User,
}

impl From<String> for Source {
    fn from(value: String) -> Self {
        if value == "official" {
            Source::Official
        } else {
            Source::User
        }
    }
}

impl From<Source> for String {
    fn from(value: Source) -> Self {
        match value {
            Source::Official => "official".to_string(),
            Source::User => "user".to_string(),
        }
    }
}

impl Source {
    pub fn label(&self) -> &'static str {
        match self {
            Source::Official => "Official",
            Source::User => "User",
        }
    }
}

/// A single radar location as served by the API
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RadarMarker {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub source: Source,
}

impl RadarMarker {
    #[inline(always)]
    pub fn point(&self) -> Point {
        Point::new(self.lat, self.lng)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub count: usize,
    /// Unix seconds of the last upstream refresh
    pub cache_at: i64,
}

/// Full API payload. Replaced wholesale on every successful fetch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RadarData {
    pub markers: Vec<RadarMarker>,
    pub meta: Meta,
    pub center: Point,
    pub zoom: u8,
}

impl Meta {
    /// Seconds elapsed since `cache_at`, never negative
    pub fn age_secs(&self, now: i64) -> i64 {
        (now - self.cache_at).max(0)
    }

    pub fn is_fresh(&self, now: i64) -> bool {
        self.age_secs(now) < FRESHNESS_WINDOW_SECS
    }

    /// `cache_at` rendered in the local timezone
    pub fn cached_at_local(&self) -> Option<String> {
        DateTime::from_timestamp(self.cache_at, 0).map(|utc| {
            utc.with_timezone(&Local)
                .format("%d.%m.%Y %H:%M:%S")
                .to_string()
        })
    }
}

/// Human readable "time since" string, e.g. `2h 3m 4s ago`
pub fn format_age(elapsed_secs: i64) -> String {
    let total = elapsed_secs.max(0);
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s ago")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s ago")
    } else {
        format!("{seconds}s ago")
    }
}

/// Thousands-separated count, e.g. `12.345`
pub fn format_count(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_from_string() {
        assert_eq!(Source::from("official".to_string()), Source::Official);
        assert_eq!(Source::from("user".to_string()), Source::User);
        assert_eq!(Source::from("crowd".to_string()), Source::User);
    }

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(2 * 3600 + 3 * 60 + 4), "2h 3m 4s ago");
        assert_eq!(format_age(300), "5m 0s ago");
        assert_eq!(format_age(12), "12s ago");
        assert_eq!(format_age(-40), "0s ago");
    }

    #[test]
    fn test_freshness_window() {
        let meta = Meta {
            count: 0,
            cache_at: 1_000,
        };
        assert!(meta.is_fresh(1_000 + 60));
        assert!(!meta.is_fresh(1_000 + FRESHNESS_WINDOW_SECS));
        assert!(meta.is_fresh(500));
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1_000), "1.000");
        assert_eq!(format_count(1_234_567), "1.234.567");
    }
}
