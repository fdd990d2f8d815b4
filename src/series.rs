//! Synthesized per-entity series.
//!
//! Some breakdowns only exist upstream at a coarse grain (outages per
//! district) but are charted per child entity once the user drills down. The
//! rows produced here are not measured per entity: record `i` repeats source
//! record `i mod m` under the name of entity `i`, and an empty source yields
//! zero rows for every entity. Nothing is cached; callers rebuild the series
//! whenever the entity list changes.

use crate::dashboard_data::{EntityPerformance, OutageRecord};

/// A row with an entity name and measured fields.
pub trait MeasuredRecord: Clone {
    /// A row for `name` with every measured field at zero.
    fn zeroed(name: &str) -> Self;

    /// A copy of `self` carrying `name`; measured fields unchanged.
    fn renamed(&self, name: &str) -> Self;
}

impl MeasuredRecord for OutageRecord {
    fn zeroed(name: &str) -> Self {
        OutageRecord {
            district: name.to_string(),
            electricity_failure: 0.0,
            pipeline_leak: 0.0,
            pump_failure: 0.0,
            valve_issue: 0.0,
            source_drying: 0.0,
        }
    }

    fn renamed(&self, name: &str) -> Self {
        OutageRecord {
            district: name.to_string(),
            ..self.clone()
        }
    }
}

/// Maps `source` cyclically onto `entities`, one output row per entity.
pub fn remap_series<R: MeasuredRecord>(entities: &[EntityPerformance], source: &[R]) -> Vec<R> {
    if source.is_empty() {
        return entities.iter().map(|entity| R::zeroed(&entity.name)).collect();
    }

    entities
        .iter()
        .enumerate()
        .map(|(i, entity)| source[i % source.len()].renamed(&entity.name))
        .collect()
}
