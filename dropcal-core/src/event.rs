//! Canonical event types.
//!
//! The remote drops feed is normalized into these types, and the store and
//! calendar output work exclusively with them. Timestamps round-trip through
//! their ISO-8601 string form; values the feed hands us that don't look like
//! a date at all are kept verbatim so nothing is lost between runs.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A promotional event in canonical form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Stable identity across runs; the merge key.
    pub id: String,
    pub summary: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
    /// Start of the event. Required for an event to enter the store.
    pub begin: EventTime,
    /// End of the event; absent means instantaneous/open-ended.
    #[serde(default)]
    pub end: Option<EventTime>,
}

/// A date-or-datetime value as the feed supplies it.
///
/// Parsed eagerly into the most specific shape that matches; anything
/// unrecognizable stays in `Raw` untouched. `Raw` values survive store
/// round-trips but are rejected by the calendar renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum EventTime {
    /// An all-day date (no specific time).
    Date(NaiveDate),
    /// A datetime that carried a UTC offset, normalized to UTC.
    DateTimeUtc(DateTime<Utc>),
    /// An offset-less datetime, kept floating.
    DateTimeFloating(NaiveDateTime),
    /// A value that did not parse as a date or datetime, kept verbatim.
    Raw(String),
}

impl EventTime {
    /// Parse a timestamp string, falling back to `Raw` when nothing matches.
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return EventTime::DateTimeUtc(dt.with_timezone(&Utc));
        }
        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
                return EventTime::DateTimeFloating(dt);
            }
        }
        if let Ok(d) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            return EventTime::Date(d);
        }

        EventTime::Raw(s.to_string())
    }

    /// Whether this value resolved to an actual date or datetime.
    pub fn is_parsed(&self) -> bool {
        !matches!(self, EventTime::Raw(_))
    }
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventTime::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            EventTime::DateTimeUtc(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.fZ")),
            EventTime::DateTimeFloating(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.f")),
            EventTime::Raw(s) => f.write_str(s),
        }
    }
}

impl Serialize for EventTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EventTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(EventTime::parse(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_floating_datetime() {
        let time = EventTime::parse("2024-01-01T10:00:00");
        assert_eq!(
            time,
            EventTime::DateTimeFloating(
                NaiveDate::from_ymd_opt(2024, 1, 1)
                    .unwrap()
                    .and_hms_opt(10, 0, 0)
                    .unwrap()
            )
        );
    }

    #[test]
    fn test_parse_offset_datetime_normalizes_to_utc() {
        let time = EventTime::parse("2024-01-01T10:00:00+02:00");
        assert_eq!(
            time,
            EventTime::DateTimeUtc(Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_parse_date() {
        let time = EventTime::parse("2024-01-01");
        assert_eq!(
            time,
            EventTime::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
        );
    }

    #[test]
    fn test_parse_garbage_stays_raw() {
        let time = EventTime::parse("TBD");
        assert_eq!(time, EventTime::Raw("TBD".to_string()));
        assert!(!time.is_parsed());
    }

    #[test]
    fn test_display_round_trips() {
        for input in ["2024-01-01", "2024-01-01T10:00:00", "2024-01-01T10:00:00Z", "TBD"] {
            let time = EventTime::parse(input);
            assert_eq!(
                EventTime::parse(&time.to_string()),
                time,
                "round trip changed the value for {:?}",
                input
            );
        }
    }

    #[test]
    fn test_serde_uses_string_form() {
        let time = EventTime::parse("2024-01-01T10:00:00");
        let json = serde_json::to_string(&time).unwrap();
        assert_eq!(json, "\"2024-01-01T10:00:00\"");

        let back: EventTime = serde_json::from_str(&json).unwrap();
        assert_eq!(back, time);
    }

    #[test]
    fn test_event_tolerates_missing_optional_fields() {
        let event: Event =
            serde_json::from_str(r#"{"id": "x1", "summary": "Demo", "begin": "2024-01-01"}"#)
                .unwrap();
        assert_eq!(event.description, "");
        assert_eq!(event.url, "");
        assert_eq!(event.end, None);
    }

    #[test]
    fn test_event_requires_begin() {
        let result = serde_json::from_str::<Event>(r#"{"id": "x1", "summary": "Demo"}"#);
        assert!(result.is_err(), "an event without begin should not deserialize");
    }
}
