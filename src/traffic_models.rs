// Data model for the Harare commute dashboard.
//
// A route is configured once as a RouteDescriptor (label + origin/destination
// pair) and displayed as a RouteStatus row whose time and status get filled in
// by the distance matrix fetcher.

use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Africa::Harare;
use serde::{Deserialize, Serialize};

/// Separator used by route labels of the form "CBD to Ruwa (Mutare Rd)".
pub const ROUTE_SEPARATOR: &str = "to ";

// ============================================================================
// Data Structures
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusLabel {
    Checking,
    #[serde(rename = "Real-time")]
    RealTime,
}

impl std::fmt::Display for StatusLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusLabel::Checking => write!(f, "Checking"),
            StatusLabel::RealTime => write!(f, "Real-time"),
        }
    }
}

/// One row of the commute list as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteStatus {
    pub id: u32,
    pub route: String,
    pub time: String,
    pub status: StatusLabel,
}

impl RouteStatus {
    pub fn initial(descriptor: &RouteDescriptor, placeholder: &str) -> Self {
        RouteStatus {
            id: descriptor.id,
            route: descriptor.label.clone(),
            time: placeholder.to_string(),
            status: StatusLabel::Checking,
        }
    }

    /// Same row with a traffic-adjusted duration filled in.
    pub fn with_real_time(&self, time: impl Into<String>) -> Self {
        RouteStatus {
            id: self.id,
            route: self.route.clone(),
            time: time.into(),
            status: StatusLabel::RealTime,
        }
    }
}

/// A fixed commute route resolved at configuration time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDescriptor {
    pub id: u32,
    pub label: String,
    pub origin: String,
    pub destination: String,
}

impl RouteDescriptor {
    pub fn new(
        id: u32,
        label: impl Into<String>,
        origin: impl Into<String>,
        destination: impl Into<String>,
    ) -> Self {
        RouteDescriptor {
            id,
            label: label.into(),
            origin: origin.into(),
            destination: destination.into(),
        }
    }

    /// Build a descriptor whose destination comes from the label itself.
    pub fn from_label(id: u32, label: impl Into<String>, origin: impl Into<String>) -> Self {
        let label = label.into();
        let destination = parse_destination(&label).to_string();
        RouteDescriptor {
            id,
            label,
            origin: origin.into(),
            destination,
        }
    }

    pub fn has_destination(&self) -> bool {
        !self.destination.trim().is_empty()
    }
}

/// Destination part of a "<origin> to <destination>" label.
///
/// Takes the text between the first and second separator. Returns "" when the
/// label has no separator.
pub fn parse_destination(label: &str) -> &str {
    label.split(ROUTE_SEPARATOR).nth(1).unwrap_or("").trim()
}

// ============================================================================
// Time helpers
// ============================================================================

pub fn get_current_timestamp() -> i64 {
    Utc::now().timestamp()
}

/// Local Harare wall clock for a unix timestamp.
pub fn format_timestamp_full(timestamp: i64) -> String {
    match Utc.timestamp_opt(timestamp, 0).single() {
        Some(dt) => format_local(dt),
        None => format!("Invalid timestamp: {}", timestamp),
    }
}

pub fn format_local(dt: DateTime<Utc>) -> String {
    dt.with_timezone(&Harare).format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_destination_from_label() {
        assert_eq!(
            parse_destination("CBD to Chitungwiza (Seke Rd)"),
            "Chitungwiza (Seke Rd)"
        );
        assert_eq!(parse_destination("CBD to Norton (Bulawayo Rd)"), "Norton (Bulawayo Rd)");
    }

    #[test]
    fn test_parse_destination_without_separator_is_empty() {
        assert_eq!(parse_destination("Chitungwiza via Seke Rd"), "");
        assert_eq!(parse_destination(""), "");
    }

    #[test]
    fn test_parse_destination_only_first_segment() {
        // Only the text up to the next separator is kept
        assert_eq!(parse_destination("CBD to Ruwa to Marondera"), "Ruwa");
    }

    #[test]
    fn test_parse_destination_trailing_separator() {
        assert_eq!(parse_destination("CBD to "), "");
    }

    #[test]
    fn test_descriptor_from_label() {
        let d = RouteDescriptor::from_label(3, "CBD to Ruwa (Mutare Rd)", "Harare CBD");
        assert_eq!(d.destination, "Ruwa (Mutare Rd)");
        assert_eq!(d.origin, "Harare CBD");
        assert!(d.has_destination());

        let bad = RouteDescriptor::from_label(4, "Borrowdale", "Harare CBD");
        assert!(!bad.has_destination());
    }

    #[test]
    fn test_initial_row() {
        let d = RouteDescriptor::from_label(1, "CBD to Chitungwiza (Seke Rd)", "Harare CBD");
        let row = RouteStatus::initial(&d, "Loading...");
        assert_eq!(row.id, 1);
        assert_eq!(row.route, "CBD to Chitungwiza (Seke Rd)");
        assert_eq!(row.time, "Loading...");
        assert_eq!(row.status, StatusLabel::Checking);
    }

    #[test]
    fn test_with_real_time_leaves_original() {
        let d = RouteDescriptor::from_label(2, "CBD to Norton (Bulawayo Rd)", "Harare CBD");
        let row = RouteStatus::initial(&d, "Loading...");
        let updated = row.with_real_time("41 mins");

        assert_eq!(updated.time, "41 mins");
        assert_eq!(updated.status, StatusLabel::RealTime);
        assert_eq!(updated.route, row.route);
        assert_eq!(row.status, StatusLabel::Checking);
    }

    #[test]
    fn test_status_label_serialization() {
        assert_eq!(serde_json::to_string(&StatusLabel::Checking).unwrap(), "\"Checking\"");
        assert_eq!(serde_json::to_string(&StatusLabel::RealTime).unwrap(), "\"Real-time\"");
        assert_eq!(StatusLabel::RealTime.to_string(), "Real-time");
    }

    #[test]
    fn test_format_timestamp_uses_harare_time() {
        // 2024-01-01T00:00:00Z is 02:00 in Harare (UTC+2)
        assert_eq!(format_timestamp_full(1_704_067_200), "2024-01-01 02:00:00");
    }
}
