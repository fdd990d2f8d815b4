//! The central filter entity and its two parallel level hierarchies.
//!
//! A [`FilterState`] holds the geographic drill-down selection
//! (state → district → block → gram panchayat → village), the orthogonal
//! scheme and duration filters, the independent department hierarchy
//! (state → zone → circle → division → subdivision → village) and the active
//! filter tab. Mutation goes through [`crate::filter_store::FilterStateStore`];
//! this module only defines the shapes and the cascade rule they share.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::app_response::AppResponse;

/// A level in an ordered selection hierarchy, root first.
pub trait HierarchyLevel: Copy + Eq + 'static {
    /// Every level of the hierarchy, ordered from the root down.
    const ALL: &'static [Self];

    fn index(self) -> usize;

    fn key(self) -> &'static str;

    /// Levels strictly below `self`.
    fn descendants(self) -> &'static [Self] {
        &Self::ALL[self.index() + 1..]
    }
}

/// Geographic drill-down levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GeoLevel {
    State,
    District,
    Block,
    GramPanchayat,
    Village,
}

impl HierarchyLevel for GeoLevel {
    const ALL: &'static [Self] = &[
        GeoLevel::State,
        GeoLevel::District,
        GeoLevel::Block,
        GeoLevel::GramPanchayat,
        GeoLevel::Village,
    ];

    fn index(self) -> usize {
        self as usize
    }

    fn key(self) -> &'static str {
        match self {
            GeoLevel::State => "state",
            GeoLevel::District => "district",
            GeoLevel::Block => "block",
            GeoLevel::GramPanchayat => "gramPanchayat",
            GeoLevel::Village => "village",
        }
    }
}

/// Department (administrative) levels, independent of the geographic tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DepartmentLevel {
    State,
    Zone,
    Circle,
    Division,
    Subdivision,
    Village,
}

impl HierarchyLevel for DepartmentLevel {
    const ALL: &'static [Self] = &[
        DepartmentLevel::State,
        DepartmentLevel::Zone,
        DepartmentLevel::Circle,
        DepartmentLevel::Division,
        DepartmentLevel::Subdivision,
        DepartmentLevel::Village,
    ];

    fn index(self) -> usize {
        self as usize
    }

    fn key(self) -> &'static str {
        match self {
            DepartmentLevel::State => "state",
            DepartmentLevel::Zone => "zone",
            DepartmentLevel::Circle => "circle",
            DepartmentLevel::Division => "division",
            DepartmentLevel::Subdivision => "subdivision",
            DepartmentLevel::Village => "village",
        }
    }
}

fn parse_level<L: HierarchyLevel>(s: &str, hierarchy: &str) -> Result<L, AppResponse> {
    L::ALL
        .iter()
        .copied()
        .find(|level| level.key().eq_ignore_ascii_case(s.trim()))
        .ok_or_else(|| AppResponse::BadRequest(format!("Unknown {hierarchy} level: {s}")))
}

impl FromStr for GeoLevel {
    type Err = AppResponse;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_level(s, "geographic")
    }
}

impl FromStr for DepartmentLevel {
    type Err = AppResponse;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_level(s, "department")
    }
}

impl Display for GeoLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl Display for DepartmentLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// An empty id means "cleared".
pub(crate) fn normalize_id(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// One selection slot per level of a hierarchy.
pub trait LevelSelection {
    type Level: HierarchyLevel;

    fn slot(&self, level: Self::Level) -> &Option<String>;

    fn slot_mut(&mut self, level: Self::Level) -> &mut Option<String>;

    fn get(&self, level: Self::Level) -> Option<&str> {
        self.slot(level).as_deref()
    }

    /// Sets `level` and clears every level below it.
    fn set_cascading(&mut self, level: Self::Level, value: Option<String>) {
        *self.slot_mut(level) = normalize_id(value);
        for child in level.descendants() {
            *self.slot_mut(*child) = None;
        }
    }

    fn clear(&mut self) {
        for level in <Self::Level as HierarchyLevel>::ALL {
            *self.slot_mut(*level) = None;
        }
    }

    /// Number of selected levels counted from the root, stopping at the first gap.
    fn depth(&self) -> usize {
        <Self::Level as HierarchyLevel>::ALL
            .iter()
            .take_while(|level| self.get(**level).is_some())
            .count()
    }

    /// Clears every level after the first gap, so no child outlives its parent.
    fn truncate_to_prefix(&mut self) {
        let depth = self.depth();
        for level in &<Self::Level as HierarchyLevel>::ALL[depth..] {
            *self.slot_mut(*level) = None;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeographicSelection {
    pub state: Option<String>,
    pub district: Option<String>,
    pub block: Option<String>,
    pub gram_panchayat: Option<String>,
    pub village: Option<String>,
}

impl LevelSelection for GeographicSelection {
    type Level = GeoLevel;

    fn slot(&self, level: GeoLevel) -> &Option<String> {
        match level {
            GeoLevel::State => &self.state,
            GeoLevel::District => &self.district,
            GeoLevel::Block => &self.block,
            GeoLevel::GramPanchayat => &self.gram_panchayat,
            GeoLevel::Village => &self.village,
        }
    }

    fn slot_mut(&mut self, level: GeoLevel) -> &mut Option<String> {
        match level {
            GeoLevel::State => &mut self.state,
            GeoLevel::District => &mut self.district,
            GeoLevel::Block => &mut self.block,
            GeoLevel::GramPanchayat => &mut self.gram_panchayat,
            GeoLevel::Village => &mut self.village,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentSelection {
    pub state: Option<String>,
    pub zone: Option<String>,
    pub circle: Option<String>,
    pub division: Option<String>,
    pub subdivision: Option<String>,
    pub village: Option<String>,
}

impl LevelSelection for DepartmentSelection {
    type Level = DepartmentLevel;

    fn slot(&self, level: DepartmentLevel) -> &Option<String> {
        match level {
            DepartmentLevel::State => &self.state,
            DepartmentLevel::Zone => &self.zone,
            DepartmentLevel::Circle => &self.circle,
            DepartmentLevel::Division => &self.division,
            DepartmentLevel::Subdivision => &self.subdivision,
            DepartmentLevel::Village => &self.village,
        }
    }

    fn slot_mut(&mut self, level: DepartmentLevel) -> &mut Option<String> {
        match level {
            DepartmentLevel::State => &mut self.state,
            DepartmentLevel::Zone => &mut self.zone,
            DepartmentLevel::Circle => &mut self.circle,
            DepartmentLevel::Division => &mut self.division,
            DepartmentLevel::Subdivision => &mut self.subdivision,
            DepartmentLevel::Village => &mut self.village,
        }
    }
}

/// Inclusive reporting window. Dates are carried as the host formats them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start_date: String,
    pub end_date: String,
}

/// Which filter bar is showing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterTab {
    /// Geographic and scheme filters.
    #[default]
    Geographic,
    Department,
}

impl FilterTab {
    pub fn index(self) -> u8 {
        match self {
            FilterTab::Geographic => 0,
            FilterTab::Department => 1,
        }
    }
}

impl TryFrom<i64> for FilterTab {
    type Error = AppResponse;

    fn try_from(index: i64) -> Result<Self, Self::Error> {
        match index {
            0 => Ok(FilterTab::Geographic),
            1 => Ok(FilterTab::Department),
            other => Err(AppResponse::BadRequest(format!("Invalid filter tab index: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    pub geographic: GeographicSelection,
    pub scheme: Option<String>,
    pub duration: Option<DateRange>,
    pub department: DepartmentSelection,
    pub active_tab: FilterTab,
}

impl FilterState {
    /// True when nothing is selected in either hierarchy and no orthogonal filter is set.
    pub fn is_cleared(&self) -> bool {
        self.geographic == GeographicSelection::default()
            && self.department == DepartmentSelection::default()
            && self.scheme.is_none()
            && self.duration.is_none()
    }
}
