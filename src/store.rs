//! The persisted event store.
//!
//! A single JSON file holding every event seen so far, keyed by id in
//! memory. Loading never fails — a missing or damaged store degrades to an
//! empty one — but failing to save is fatal, since the merged store is the
//! source of truth. Events are never deleted: a drop that disappears from
//! the feed stays in the store.

use crate::event::Event;
use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

pub type EventMap = HashMap<String, Event>;

/// Counters reported by `merge`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeStats {
    pub new: usize,
    pub updated: usize,
}

/// Load the store, degrading to empty on any problem.
pub fn load(path: &Path) -> EventMap {
    if !path.exists() {
        println!(
            "No store at {}. Starting with an empty one.",
            path.display()
        );
        return EventMap::new();
    }

    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            println!("Could not read {}: {}. Starting fresh.", path.display(), err);
            return EventMap::new();
        }
    };

    if contents.trim().is_empty() {
        return EventMap::new();
    }

    let records: Vec<Value> = match serde_json::from_str(&contents) {
        Ok(records) => records,
        Err(err) => {
            println!(
                "Could not parse {}: {}. Starting fresh.",
                path.display(),
                err
            );
            return EventMap::new();
        }
    };

    // One bad record loses that record, not the whole store.
    let mut events = Vec::with_capacity(records.len());
    for record in records {
        match serde_json::from_value::<Event>(record) {
            Ok(event) => events.push(event),
            Err(err) => println!("Skipping unreadable store record: {}", err),
        }
    }

    from_events(events)
}

/// Key events by id, discarding any without one.
pub fn from_events(events: Vec<Event>) -> EventMap {
    events
        .into_iter()
        .filter(|event| !event.id.is_empty())
        .map(|event| (event.id.clone(), event))
        .collect()
}

/// Upsert incoming events into the store, incoming winning on collision.
/// Events without an id cannot participate in the merge and are skipped.
pub fn merge(existing: &mut EventMap, incoming: Vec<Event>) -> MergeStats {
    let mut stats = MergeStats::default();

    for event in incoming {
        if event.id.is_empty() {
            continue;
        }
        if existing.contains_key(&event.id) {
            stats.updated += 1;
        } else {
            stats.new += 1;
        }
        existing.insert(event.id.clone(), event);
    }

    stats
}

/// Write the store as a JSON array, replacing the file atomically so a
/// crash mid-write never leaves a truncated store behind.
pub fn save(events: &EventMap, path: &Path) -> Result<()> {
    let mut records: Vec<&Event> = events.values().collect();
    records.sort_by(|a, b| a.id.cmp(&b.id));

    let contents =
        serde_json::to_string_pretty(&records).context("Failed to serialize event store")?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, contents).with_context(|| format!("Failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;

    Ok(())
}
