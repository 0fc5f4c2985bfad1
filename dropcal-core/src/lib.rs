//! Core types for dropcal.
//!
//! This crate provides the canonical event types shared across the sync
//! pipeline: the feed normalizer produces them, the store persists them,
//! and the calendar renderer consumes them.

pub mod event;

// Re-export all event types at crate root for convenience
pub use event::*;
