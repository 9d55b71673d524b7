#![warn(missing_docs)]
//! # aviator-benchmarks
//!
//! Synthetic payloads for latency smoke tests.

use aviator_core::ProcessStatusMap;
use serde_json::json;

/// Encoded catalog of `count` icon-less entries `app-0..app-{count-1}`.
pub fn synthetic_catalog(count: usize) -> Vec<u8> {
    let entries: Vec<_> = (0..count)
        .map(|index| json!({ "id": format!("app-{index}"), "name": format!("App {index}") }))
        .collect();
    serde_json::to_vec(&entries).unwrap_or_default()
}

/// Status map where every third entry, shifted by `round`, is running.
pub fn rotating_statuses(count: usize, round: usize) -> ProcessStatusMap {
    (0..count)
        .map(|index| (format!("app-{index}"), (index + round) % 3 == 0))
        .collect()
}
