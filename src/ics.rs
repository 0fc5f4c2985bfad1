//! iCalendar output.
//!
//! The whole store is rendered into one VCALENDAR each run. An event that
//! cannot be rendered is skipped on its own, and a calendar with nothing in
//! it is never written, so a bad run cannot blank out a previously good
//! file.

use crate::event::{Event, EventTime};
use anyhow::{Context, Result};
use icalendar::{Calendar, Component, EventLike, Property, ValueType};
use std::path::Path;

/// Render events into an iCalendar document, skipping any that fail.
/// Returns the document and how many VEVENTs made it in. Output is sorted
/// by event id so regenerated files are stable.
pub fn render<'a>(events: impl IntoIterator<Item = &'a Event>) -> (String, usize) {
    let mut sorted: Vec<&Event> = events.into_iter().collect();
    sorted.sort_by(|a, b| a.id.cmp(&b.id));

    let mut cal = Calendar::new();
    let mut rendered = 0;

    for event in sorted {
        match render_event(event) {
            Ok(ics_event) => {
                cal.push(ics_event);
                rendered += 1;
            }
            Err(err) => {
                println!("Could not render event '{}': {}", event.summary, err);
            }
        }
    }

    (cal.done().to_string(), rendered)
}

/// Render the calendar and write it, unless it came out empty.
/// Returns how many events were written.
pub fn write<'a>(events: impl IntoIterator<Item = &'a Event>, path: &Path) -> Result<usize> {
    let (content, rendered) = render(events);

    if rendered == 0 {
        println!("No renderable events. Leaving {} untouched.", path.display());
        return Ok(0);
    }

    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(rendered)
}

fn render_event(event: &Event) -> Result<icalendar::Event> {
    let mut ics_event = icalendar::Event::new();
    ics_event.uid(&event.id);
    ics_event.summary(&event.summary);

    add_time_property(&mut ics_event, "DTSTART", &event.begin)?;
    if let Some(ref end) = event.end {
        add_time_property(&mut ics_event, "DTEND", end)?;
    }

    ics_event.description(&event.description);

    if !event.url.is_empty() {
        ics_event.add_property("URL", &event.url);
    }

    Ok(ics_event.done())
}

/// Add a DTSTART/DTEND property formatted per variant.
fn add_time_property(
    ics_event: &mut icalendar::Event,
    name: &str,
    time: &EventTime,
) -> Result<()> {
    match time {
        EventTime::Date(d) => {
            let mut prop = Property::new(name, d.format("%Y%m%d").to_string());
            prop.append_parameter(ValueType::Date);
            ics_event.append_property(prop);
        }
        EventTime::DateTimeUtc(dt) => {
            ics_event.add_property(name, dt.format("%Y%m%dT%H%M%SZ").to_string());
        }
        EventTime::DateTimeFloating(dt) => {
            ics_event.add_property(name, dt.format("%Y%m%dT%H%M%S").to_string());
        }
        EventTime::Raw(raw) => anyhow::bail!("unrecognized timestamp {:?}", raw),
    }
    Ok(())
}
