//! The sync pipeline.
//!
//! One run is a straight line: load the store, fetch the feed, normalize,
//! merge, save, render. The store is saved before the calendar is touched,
//! so an interrupted run can leave the calendar stale but never the store
//! half-merged.

use crate::ics;
use crate::normalize;
use crate::source::EventSource;
use crate::store;
use anyhow::Result;
use std::path::Path;

/// Counts from a completed run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    /// Events loaded from the prior store.
    pub loaded: usize,
    /// Whether the feed yielded a payload at all.
    pub fetched: bool,
    /// Events normalized out of the payload.
    pub normalized: usize,
    pub new: usize,
    pub updated: usize,
    /// Events in the store after the merge.
    pub total: usize,
    /// Events written to the calendar file.
    pub rendered: usize,
}

/// Run one full sync against `source`.
pub async fn run(
    source: &dyn EventSource,
    store_path: &Path,
    calendar_path: &Path,
) -> Result<SyncReport> {
    let mut report = SyncReport::default();

    let mut events = store::load(store_path);
    report.loaded = events.len();
    report.total = events.len();
    println!("Loaded {} existing events.", report.loaded);

    let Some(raw) = source.fetch().await? else {
        println!("No data from the feed. Exiting without changes.");
        return Ok(report);
    };
    report.fetched = true;

    let candidates = normalize::normalize(&raw);
    report.normalized = candidates.len();

    if candidates.is_empty() {
        // Save and render anyway so the calendar output stays fresh even
        // when the feed has nothing new.
        println!("No events came out of the feed response.");
    } else {
        println!("Normalized {} events from the feed.", report.normalized);
        let stats = store::merge(&mut events, candidates);
        report.new = stats.new;
        report.updated = stats.updated;
        println!("Merged events: {} new, {} updated.", stats.new, stats.updated);
    }
    report.total = events.len();

    // Persist before rendering: the store is the source of truth.
    store::save(&events, store_path)?;
    println!("Saved {} events to {}.", report.total, store_path.display());

    report.rendered = ics::write(events.values(), calendar_path)?;
    if report.rendered > 0 {
        println!(
            "Wrote {} events to {}.",
            report.rendered,
            calendar_path.display()
        );
    }

    Ok(report)
}
