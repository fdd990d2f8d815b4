//! Drill-down resolution.
//!
//! [`resolve`] turns a [`FilterState`] and the lookup tables into everything
//! the rest of the dashboard branches on: the active [`Depth`], the entity
//! label, the option list for every selector and the performance table of the
//! level below the current selection. Unknown or stale ids resolve to empty
//! collections.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::dashboard_data::{EntityPerformance, SelectOption};
use crate::filter_state::{FilterState, GeoLevel, HierarchyLevel, LevelSelection};

/// How far the geographic selection reaches, counted from the root.
///
/// Serialized as its numeric value, 0 (nothing selected) to 5 (village).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "usize")]
pub enum Depth {
    None,
    State,
    District,
    Block,
    GramPanchayat,
    Village,
}

impl From<Depth> for usize {
    fn from(depth: Depth) -> Self {
        depth.value()
    }
}

impl Depth {
    pub fn from_count(count: usize) -> Self {
        match count {
            0 => Depth::None,
            1 => Depth::State,
            2 => Depth::District,
            3 => Depth::Block,
            4 => Depth::GramPanchayat,
            _ => Depth::Village,
        }
    }

    pub fn value(self) -> usize {
        self as usize
    }

    /// Plural label of the entities one level below, used in headings and axes.
    /// A selected village is shown among its sibling villages.
    pub fn entity_label(self) -> &'static str {
        match self {
            Depth::None => "States/UTs",
            Depth::State => "Districts",
            Depth::District => "Blocks",
            Depth::Block => "Gram Panchayats",
            Depth::GramPanchayat | Depth::Village => "Villages",
        }
    }

    /// The level whose selector is filled next, if any.
    pub fn next_level(self) -> Option<GeoLevel> {
        GeoLevel::ALL.get(self.value()).copied()
    }
}

type OptionTable = HashMap<String, Vec<SelectOption>>;
type PerformanceTable = HashMap<String, Vec<EntityPerformance>>;

/// Static parent-id → children mappings.
///
/// Each option table is keyed by the id selected one level up; each
/// performance table is keyed the same way and lists the children's rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LookupTables {
    pub states: Vec<SelectOption>,
    pub districts: OptionTable,
    pub blocks: OptionTable,
    pub gram_panchayats: OptionTable,
    pub villages: OptionTable,
    pub schemes: Vec<SelectOption>,

    pub district_performance: PerformanceTable,
    pub block_performance: PerformanceTable,
    pub gram_panchayat_performance: PerformanceTable,
    pub village_performance: PerformanceTable,

    pub department: DepartmentLookupTables,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DepartmentLookupTables {
    pub states: Vec<SelectOption>,
    pub zones: OptionTable,
    pub circles: OptionTable,
    pub divisions: OptionTable,
    pub subdivisions: OptionTable,
    pub villages: OptionTable,
}

/// Everything the resolver reads besides the filter state.
#[derive(Debug, Clone, Copy)]
pub struct SourceTables<'a> {
    pub lookups: &'a LookupTables,
    /// Top-level (per state) rows, shown when nothing is selected.
    pub map_data: &'a [EntityPerformance],
}

/// Option lists for each selector of the geographic filter bar.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeographicOptions {
    pub states: Vec<SelectOption>,
    pub districts: Vec<SelectOption>,
    pub blocks: Vec<SelectOption>,
    pub gram_panchayats: Vec<SelectOption>,
    pub villages: Vec<SelectOption>,
    pub schemes: Vec<SelectOption>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentOptions {
    pub states: Vec<SelectOption>,
    pub zones: Vec<SelectOption>,
    pub circles: Vec<SelectOption>,
    pub divisions: Vec<SelectOption>,
    pub subdivisions: Vec<SelectOption>,
    pub villages: Vec<SelectOption>,
}

/// Which selectors accept input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectorAvailability {
    /// Block, gram panchayat, village, scheme and duration need a state and a district.
    pub advanced: bool,
    /// Department levels below state need a department state.
    pub department_children: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedView {
    pub depth: Depth,
    pub village_selected: bool,
    pub entity_label: &'static str,
    /// Selector filled next; `None` once a village is selected.
    pub next_level: Option<GeoLevel>,
    /// Options for that selector.
    pub child_options: Vec<SelectOption>,
    /// Performance rows of the entities named by `entity_label`.
    pub active_table: Vec<EntityPerformance>,
    pub options: GeographicOptions,
    pub department_depth: usize,
    pub department_options: DepartmentOptions,
    pub availability: SelectorAvailability,
}

/// Id selected at `level`, provided every level above it is selected too.
fn prefix_id<S: LevelSelection>(selection: &S, level: usize) -> Option<&str> {
    if level < selection.depth() {
        selection.get(<S::Level as HierarchyLevel>::ALL[level])
    } else {
        None
    }
}

/// Children of `parent` in `table`, or nothing when the parent is not selected
/// or unknown.
fn children<T: Clone>(table: &HashMap<String, Vec<T>>, parent: Option<&str>) -> Vec<T> {
    parent
        .and_then(|id| table.get(id))
        .cloned()
        .unwrap_or_default()
}

pub fn resolve(filters: &FilterState, sources: SourceTables<'_>) -> ResolvedView {
    let geo = &filters.geographic;
    let lookups = sources.lookups;
    let count = geo.depth();
    let depth = Depth::from_count(count);

    // Only ids inside the contiguous selected prefix may key a lookup.
    let parent = |level: usize| prefix_id(geo, level);

    let options = GeographicOptions {
        states: lookups.states.clone(),
        districts: children(&lookups.districts, parent(0)),
        blocks: children(&lookups.blocks, parent(1)),
        gram_panchayats: children(&lookups.gram_panchayats, parent(2)),
        villages: children(&lookups.villages, parent(3)),
        schemes: lookups.schemes.clone(),
    };

    let child_options = match depth {
        Depth::None => options.states.clone(),
        Depth::State => options.districts.clone(),
        Depth::District => options.blocks.clone(),
        Depth::Block => options.gram_panchayats.clone(),
        Depth::GramPanchayat => options.villages.clone(),
        Depth::Village => Vec::new(),
    };

    let active_table = match depth {
        Depth::None => sources.map_data.to_vec(),
        Depth::State => children(&lookups.district_performance, parent(0)),
        Depth::District => children(&lookups.block_performance, parent(1)),
        Depth::Block => children(&lookups.gram_panchayat_performance, parent(2)),
        Depth::GramPanchayat | Depth::Village => {
            children(&lookups.village_performance, parent(3))
        }
    };

    let dept = &filters.department;
    let dept_count = dept.depth();
    let dept_parent = |level: usize| prefix_id(dept, level);
    let dept_tables = &lookups.department;
    let department_options = DepartmentOptions {
        states: dept_tables.states.clone(),
        zones: children(&dept_tables.zones, dept_parent(0)),
        circles: children(&dept_tables.circles, dept_parent(1)),
        divisions: children(&dept_tables.divisions, dept_parent(2)),
        subdivisions: children(&dept_tables.subdivisions, dept_parent(3)),
        villages: children(&dept_tables.villages, dept_parent(4)),
    };

    ResolvedView {
        depth,
        village_selected: depth == Depth::Village,
        entity_label: depth.entity_label(),
        next_level: depth.next_level(),
        child_options,
        active_table,
        options,
        department_depth: dept_count,
        department_options,
        availability: SelectorAvailability {
            advanced: count >= 2,
            department_children: dept_count >= 1,
        },
    }
}
