//! Source data handed to the dashboard by the data provider.
//!
//! The provider returns one JSON snapshot per fetch. A snapshot is accepted
//! only when every required field is present; a partial snapshot is never
//! rendered.

use std::collections::BTreeMap;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::app_response::AppResponse;

/// Opaque chart/table row passed through to the renderer untouched.
pub type SeriesRow = Map<String, JsonValue>;

/// One row of a performance table at some hierarchy level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityPerformance {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub metrics: BTreeMap<String, JsonValue>,
}

impl EntityPerformance {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            metrics: BTreeMap::new(),
        }
    }
}

/// Option shown in a filter selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Kpis {
    pub total_schemes: f64,
    pub total_rural_households: f64,
    pub functional_tap_connections: f64,
}

/// Water supply outages by cause for one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutageRecord {
    /// Entity name. The field keeps its upstream name even below district level.
    pub district: String,
    pub electricity_failure: f64,
    pub pipeline_leak: f64,
    pub pump_failure: f64,
    pub valve_issue: f64,
    pub source_drying: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PumpOperatorSlice {
    pub value: f64,
    #[serde(flatten)]
    pub extra: SeriesRow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub kpis: Kpis,
    pub map_data: Vec<EntityPerformance>,
    pub demand_supply: Vec<SeriesRow>,
    pub image_submission_status: Vec<SeriesRow>,
    pub pump_operators: Vec<PumpOperatorSlice>,
    pub photo_evidence_compliance: Vec<SeriesRow>,
    pub water_supply_outages: Vec<OutageRecord>,
    pub top_performers: Vec<JsonValue>,
    pub worst_performers: Vec<JsonValue>,
    pub regularity_data: Vec<JsonValue>,
    pub continuity_data: Vec<JsonValue>,
    #[serde(default)]
    pub leading_pump_operators: Vec<SeriesRow>,
    #[serde(default)]
    pub bottom_pump_operators: Vec<SeriesRow>,
}

/// Fields a snapshot must carry, as named on the wire.
pub const REQUIRED_FIELDS: [&str; 11] = [
    "kpis",
    "mapData",
    "demandSupply",
    "imageSubmissionStatus",
    "pumpOperators",
    "photoEvidenceCompliance",
    "waterSupplyOutages",
    "topPerformers",
    "worstPerformers",
    "regularityData",
    "continuityData",
];

impl DashboardSnapshot {
    /// Validates and decodes a provider payload.
    ///
    /// Missing or `null` required fields yield `InvalidData` listing them;
    /// fields that are present but mistyped yield `SerializationError`.
    pub fn from_value(value: JsonValue) -> Result<Self, AppResponse> {
        let fields = value.as_object().ok_or_else(|| {
            AppResponse::InvalidData(REQUIRED_FIELDS.iter().map(|f| f.to_string()).collect())
        })?;

        let missing: Vec<String> = REQUIRED_FIELDS
            .iter()
            .filter(|name| fields.get(**name).map_or(true, JsonValue::is_null))
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(AppResponse::InvalidData(missing));
        }

        Ok(serde_json::from_value(value)?)
    }

    pub fn from_json(json: &str) -> Result<Self, AppResponse> {
        let value: JsonValue = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    pub fn pump_operators_total(&self) -> f64 {
        self.pump_operators.iter().map(|slice| slice.value).sum()
    }

    /// Leading operators followed by bottom operators.
    pub fn operator_ranking(&self) -> Vec<SeriesRow> {
        self.leading_pump_operators
            .iter()
            .chain(self.bottom_pump_operators.iter())
            .cloned()
            .collect()
    }
}

/// Scope of a dashboard fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DashboardLevel {
    Central,
    State,
    District,
    Block,
    GramPanchayat,
    Village,
}

impl DashboardLevel {
    fn path_segment(self) -> &'static str {
        match self {
            DashboardLevel::Central => "central",
            DashboardLevel::State => "state",
            DashboardLevel::District => "district",
            DashboardLevel::Block => "block",
            DashboardLevel::GramPanchayat => "gram-panchayat",
            DashboardLevel::Village => "village",
        }
    }

    /// API path for this level. Every level except `Central` needs an entity id.
    pub fn endpoint(self, entity_id: Option<&str>) -> Result<String, AppResponse> {
        match (self, entity_id.filter(|id| !id.is_empty())) {
            (DashboardLevel::Central, _) => Ok("/api/dashboard/central".to_string()),
            (level, Some(id)) => Ok(format!("/api/dashboard/{}/{}", level.path_segment(), id)),
            (level, None) => Err(AppResponse::BadRequest(format!(
                "entityId is required for dashboard level: {}",
                level.path_segment()
            ))),
        }
    }
}

/// Source of dashboard snapshots. Transport is the implementor's concern.
pub trait DataProvider {
    fn fetch_dashboard_data(
        &self,
        level: DashboardLevel,
        entity_id: Option<&str>,
    ) -> Result<JsonValue, AppResponse>;
}

/// Where the dashboard's source data stands.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LoadState {
    /// A fetch is outstanding (or none has completed yet).
    #[default]
    Pending,
    Failed(String),
    Invalid(Vec<String>),
    Ready(Box<DashboardSnapshot>),
}

impl LoadState {
    /// Classifies a completed fetch.
    pub fn from_fetch(result: Result<JsonValue, AppResponse>) -> Self {
        let value = match result {
            Ok(value) => value,
            Err(e) => {
                warn!("Dashboard fetch failed: {e}");
                return LoadState::Failed(fetch_message(e));
            }
        };

        match DashboardSnapshot::from_value(value) {
            Ok(snapshot) => {
                info!("Dashboard snapshot accepted");
                LoadState::Ready(Box::new(snapshot))
            }
            Err(AppResponse::InvalidData(missing)) => {
                warn!("Dashboard snapshot missing fields: {}", missing.join(", "));
                LoadState::Invalid(missing)
            }
            Err(e) => {
                warn!("Dashboard snapshot rejected: {e}");
                LoadState::Invalid(vec![e.to_string()])
            }
        }
    }

    pub fn snapshot(&self) -> Option<&DashboardSnapshot> {
        match self {
            LoadState::Ready(snapshot) => Some(snapshot),
            _ => None,
        }
    }
}

fn fetch_message(err: AppResponse) -> String {
    match err {
        AppResponse::FetchError(msg) => msg,
        other => other.to_string(),
    }
}
