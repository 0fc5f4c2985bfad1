//! Raw feed payload to canonical event conversion.
//!
//! The feed response is a nested GraphQL document, so everything here is
//! defensive: a response without the expected shape normalizes to an empty
//! list, and a record without a usable start time is dropped.

use crate::event::{Event, EventTime};
use serde_json::Value;

/// Marker the feed prepends to titles of unreleased drops.
const COMING_SOON_MARKER: &str = "(Coming Soon) ";

/// Field keys that carry the event's time span.
const START_FIELD: &str = "start_date";
const END_FIELD: &str = "end_date";

/// Convert a raw feed response into canonical events.
pub fn normalize(raw: &Value) -> Vec<Event> {
    let Some(posts) = raw.pointer("/data/posts/nodes").and_then(Value::as_array) else {
        println!("No posts in the feed response. Nothing to normalize.");
        return Vec::new();
    };

    let events: Vec<Event> = posts.iter().filter_map(normalize_post).collect();

    let dropped = posts.len() - events.len();
    if dropped > 0 {
        println!("Dropped {} records without a usable start time.", dropped);
    }

    events
}

/// Convert one post record, or drop it when no start time resolves.
fn normalize_post(post: &Value) -> Option<Event> {
    let summary = match post.get("title").and_then(Value::as_str) {
        Some(title) => title.replace(COMING_SOON_MARKER, "").trim().to_string(),
        None => "No Title".to_string(),
    };

    let mut begin = None;
    let mut end = None;

    if let Some(fields) = post.get("fields").and_then(Value::as_array) {
        for field in fields {
            let value = match field.get("value") {
                Some(value) if !value.is_null() => decode_field_value(value),
                _ => continue,
            };

            match field.get("key").and_then(Value::as_str) {
                Some(START_FIELD) => begin = value_to_time(&value),
                Some(END_FIELD) => end = value_to_time(&value),
                _ => {}
            }
        }
    }

    // Records without a start time never make it into the store.
    let begin = begin?;

    Some(Event {
        id: string_field(post, "id"),
        summary,
        description: string_field(post, "description").trim().to_string(),
        url: string_field(post, "url").trim().to_string(),
        begin,
        end,
    })
}

fn string_field(post: &Value, key: &str) -> String {
    post.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Field values are strings that usually encode a JSON scalar; decode when
/// possible and otherwise use the string unchanged.
fn decode_field_value(value: &Value) -> Value {
    match value {
        Value::String(s) => serde_json::from_str(s).unwrap_or_else(|_| value.clone()),
        other => other.clone(),
    }
}

/// Interpret a decoded field value as a timestamp. Null and empty strings
/// mean "absent"; anything else is kept, parsed or not.
fn value_to_time(value: &Value) -> Option<EventTime> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(EventTime::parse(s)),
        other => Some(EventTime::Raw(other.to_string())),
    }
}
