//! Persisted form of the filter state.
//!
//! [`StoredFilters`] is the JSON record written under the fixed storage key on
//! every filter mutation. Cleared selections are written as empty strings and
//! the duration as `null`, so a record written by an older dashboard build
//! reads back the same way.
//!
//! Reading is lenient per field and strict about shape: a payload that is not
//! a JSON object is rejected as a whole (and the caller discards it), while a
//! single ill-typed field only falls back to its default.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::app_response::AppResponse;
use crate::filter_state::{
    normalize_id, DateRange, DepartmentSelection, FilterState, FilterTab, GeographicSelection,
    LevelSelection,
};

/// Key the snapshot is stored under.
pub const FILTER_STORAGE_KEY: &str = "central-dashboard-filters";

/// Snapshot of a [`FilterState`] as it is written to storage.
///
/// ```rust
/// use jal_dashboard_core::filter_state::FilterState;
/// use jal_dashboard_core::local_db_model::StoredFilters;
///
/// let json = StoredFilters::from(&FilterState::default()).to_json()?;
/// assert!(json.contains("\"selectedState\":\"\""));
/// # Ok::<(), jal_dashboard_core::app_response::AppResponse>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFilters {
    pub selected_state: String,
    pub selected_district: String,
    pub selected_block: String,
    pub selected_gram_panchayat: String,
    pub selected_village: String,
    pub selected_duration: Option<DateRange>,
    pub selected_scheme: String,
    pub selected_department_state: String,
    pub selected_department_zone: String,
    pub selected_department_circle: String,
    pub selected_department_division: String,
    pub selected_department_subdivision: String,
    pub selected_department_village: String,
    pub filter_tab_index: u8,
}

fn owned(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

impl From<&FilterState> for StoredFilters {
    fn from(state: &FilterState) -> Self {
        let geo = &state.geographic;
        let dept = &state.department;
        StoredFilters {
            selected_state: owned(&geo.state),
            selected_district: owned(&geo.district),
            selected_block: owned(&geo.block),
            selected_gram_panchayat: owned(&geo.gram_panchayat),
            selected_village: owned(&geo.village),
            selected_duration: state.duration.clone(),
            selected_scheme: owned(&state.scheme),
            selected_department_state: owned(&dept.state),
            selected_department_zone: owned(&dept.zone),
            selected_department_circle: owned(&dept.circle),
            selected_department_division: owned(&dept.division),
            selected_department_subdivision: owned(&dept.subdivision),
            selected_department_village: owned(&dept.village),
            filter_tab_index: state.active_tab.index(),
        }
    }
}

impl StoredFilters {
    pub fn to_json(&self) -> Result<String, AppResponse> {
        Ok(serde_json::to_string(self)?)
    }
}

fn string_field(fields: &Map<String, JsonValue>, name: &str) -> Option<String> {
    match fields.get(name) {
        Some(JsonValue::String(s)) => normalize_id(Some(s.clone())),
        _ => None,
    }
}

/// A duration is kept only when it carries both bounds as strings.
fn duration_field(fields: &Map<String, JsonValue>) -> Option<DateRange> {
    let range = fields.get("selectedDuration")?.as_object()?;
    let start_date = range.get("startDate")?.as_str()?.to_string();
    let end_date = range.get("endDate")?.as_str()?.to_string();
    Some(DateRange {
        start_date,
        end_date,
    })
}

fn tab_field(fields: &Map<String, JsonValue>) -> FilterTab {
    fields
        .get("filterTabIndex")
        .and_then(JsonValue::as_i64)
        .and_then(|index| FilterTab::try_from(index).ok())
        .unwrap_or_default()
}

/// Rebuilds a [`FilterState`] from a stored payload.
///
/// Selections below a cleared level are dropped, as the cascade would have
/// done when they were made.
///
/// Returns `ValidationError` when the payload is not a JSON object; the caller
/// is expected to discard such an entry.
pub fn parse_snapshot(raw: &str) -> Result<FilterState, AppResponse> {
    let value: JsonValue = serde_json::from_str(raw)?;
    let fields = match value {
        JsonValue::Object(fields) => fields,
        other => {
            return Err(AppResponse::ValidationError(format!(
                "Stored filters must be a JSON object, found {}",
                json_kind(&other)
            )))
        }
    };

    let mut state = FilterState {
        geographic: GeographicSelection {
            state: string_field(&fields, "selectedState"),
            district: string_field(&fields, "selectedDistrict"),
            block: string_field(&fields, "selectedBlock"),
            gram_panchayat: string_field(&fields, "selectedGramPanchayat"),
            village: string_field(&fields, "selectedVillage"),
        },
        scheme: string_field(&fields, "selectedScheme"),
        duration: duration_field(&fields),
        department: DepartmentSelection {
            state: string_field(&fields, "selectedDepartmentState"),
            zone: string_field(&fields, "selectedDepartmentZone"),
            circle: string_field(&fields, "selectedDepartmentCircle"),
            division: string_field(&fields, "selectedDepartmentDivision"),
            subdivision: string_field(&fields, "selectedDepartmentSubdivision"),
            village: string_field(&fields, "selectedDepartmentVillage"),
        },
        active_tab: tab_field(&fields),
    };
    state.geographic.truncate_to_prefix();
    state.department.truncate_to_prefix();
    Ok(state)
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}
