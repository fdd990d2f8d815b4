//! The owned dashboard aggregate.
//!
//! [`Dashboard`] holds the filter store, the lookup tables, the load state of
//! the source data and the (non-persisted) top-level performance focus. It is
//! passed by reference to whoever renders; nothing else mutates filters.
//! [`Dashboard::compose`] recomputes every derived value from scratch.

use log::info;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::app_response::AppResponse;
use crate::dashboard_data::{
    DashboardLevel, DashboardSnapshot, DataProvider, EntityPerformance, Kpis, LoadState,
    OutageRecord, PumpOperatorSlice, SeriesRow,
};
use crate::filter_state::{DateRange, DepartmentLevel, FilterState, FilterTab, GeoLevel};
use crate::filter_store::FilterStateStore;
use crate::hierarchy::{
    resolve, DepartmentOptions, Depth, GeographicOptions, LookupTables, ResolvedView,
    SelectorAvailability, SourceTables,
};
use crate::local_db_model::FILTER_STORAGE_KEY;
use crate::local_db_state::{LmdbFilterStorage, PersistenceAdapter, DEFAULT_MAP_SIZE};
use crate::series::remap_series;
use crate::view::{compose, DataSource, PanelKind, PanelSpec};

/// Settings for [`Dashboard::open`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardConfig {
    /// LMDB directory is `<db_name>.lmdb`.
    pub db_name: String,
    pub storage_key: String,
    pub map_size: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            db_name: "central_dashboard".to_string(),
            storage_key: FILTER_STORAGE_KEY.to_string(),
            map_size: DEFAULT_MAP_SIZE,
        }
    }
}

impl DashboardConfig {
    pub fn with_db_name(name: impl Into<String>) -> Self {
        Self {
            db_name: name.into(),
            ..Self::default()
        }
    }
}

/// Selectors of the active filter tab.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "tab", rename_all = "camelCase")]
pub enum FilterBar {
    #[serde(rename_all = "camelCase")]
    Geographic {
        options: GeographicOptions,
        availability: SelectorAvailability,
    },
    #[serde(rename_all = "camelCase")]
    Department {
        options: DepartmentOptions,
        availability: SelectorAvailability,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum PanelData {
    FilterBar(FilterBar),
    Kpis(Kpis),
    Entities(Vec<EntityPerformance>),
    Rows(Vec<SeriesRow>),
    Outages(Vec<OutageRecord>),
    #[serde(rename_all = "camelCase")]
    PumpOperators {
        total: f64,
        slices: Vec<PumpOperatorSlice>,
    },
    #[serde(rename_all = "camelCase")]
    CoreMetrics {
        regularity: Vec<JsonValue>,
        continuity: Vec<JsonValue>,
    },
    Operator(Option<SeriesRow>),
    #[serde(rename_all = "camelCase")]
    PhotoEvidence {
        rows: Vec<SeriesRow>,
        show_village_column: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedPanel {
    pub kind: PanelKind,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_label: Option<&'static str>,
    pub data: PanelData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub depth: Depth,
    pub entity_label: &'static str,
    pub filters: FilterState,
    pub panels: Vec<RenderedPanel>,
}

/// What the host should show.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum DashboardStatus {
    Loading,
    Error { message: String },
    InvalidData { missing: Vec<String> },
    Ready { view: Box<DashboardView> },
}

pub struct Dashboard {
    store: FilterStateStore,
    lookups: LookupTables,
    load: LoadState,
    performance_focus: Option<String>,
}

impl Dashboard {
    pub fn new(storage: Box<dyn PersistenceAdapter>, lookups: LookupTables) -> Self {
        Self {
            store: FilterStateStore::load(storage),
            lookups,
            load: LoadState::Pending,
            performance_focus: None,
        }
    }

    /// Opens LMDB-backed filter storage and restores the last filters.
    pub fn open(config: &DashboardConfig) -> Result<Self, AppResponse> {
        let storage = LmdbFilterStorage::open(&config.db_name, &config.storage_key, config.map_size)?;
        info!("Dashboard '{}' opened", config.db_name);
        Ok(Self::new(Box::new(storage), LookupTables::default()))
    }

    pub fn filters(&self) -> &FilterState {
        self.store.state()
    }

    pub fn lookups(&self) -> &LookupTables {
        &self.lookups
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load
    }

    pub fn set_lookups(&mut self, lookups: LookupTables) {
        self.lookups = lookups;
    }

    pub fn set_level(&mut self, level: GeoLevel, value: Option<String>) {
        self.store.set_level(level, value);
    }

    pub fn set_department_level(&mut self, level: DepartmentLevel, value: Option<String>) {
        self.store.set_department_level(level, value);
    }

    pub fn set_scheme(&mut self, scheme: Option<String>) {
        self.store.set_scheme(scheme);
    }

    pub fn set_duration(&mut self, duration: Option<DateRange>) {
        self.store.set_duration(duration);
    }

    pub fn set_tab(&mut self, index: i64) -> Result<FilterTab, AppResponse> {
        self.store.set_tab(index)
    }

    pub fn clear_all(&mut self) {
        self.store.clear_all();
    }

    /// Narrows the top-level performance chart to one state by name.
    pub fn set_performance_focus(&mut self, state_name: Option<String>) {
        self.performance_focus = state_name.filter(|name| !name.is_empty());
    }

    /// Marks a fetch as outstanding; composition reports `Loading` until it completes.
    pub fn begin_fetch(&mut self) {
        self.load = LoadState::Pending;
    }

    pub fn complete_fetch(&mut self, result: Result<JsonValue, AppResponse>) {
        self.load = LoadState::from_fetch(result);
    }

    /// Fetches the central snapshot synchronously through `provider`.
    pub fn refresh(&mut self, provider: &dyn DataProvider) {
        self.begin_fetch();
        let result = provider.fetch_dashboard_data(DashboardLevel::Central, None);
        self.complete_fetch(result);
    }

    pub fn resolve(&self) -> ResolvedView {
        let map_data = self
            .load
            .snapshot()
            .map(|snapshot| snapshot.map_data.as_slice())
            .unwrap_or(&[]);
        resolve(
            self.filters(),
            SourceTables {
                lookups: &self.lookups,
                map_data,
            },
        )
    }

    pub fn compose(&self) -> DashboardStatus {
        let snapshot = match &self.load {
            LoadState::Pending => return DashboardStatus::Loading,
            LoadState::Failed(message) => {
                return DashboardStatus::Error {
                    message: message.clone(),
                }
            }
            LoadState::Invalid(missing) => {
                return DashboardStatus::InvalidData {
                    missing: missing.clone(),
                }
            }
            LoadState::Ready(snapshot) => snapshot,
        };

        let resolved = self.resolve();
        let filters = self.filters();
        let outages = outage_series(&resolved, snapshot);

        let panels = compose(resolved.depth, resolved.village_selected, filters.active_tab)
            .into_iter()
            .map(|spec| self.render(spec, &resolved, snapshot, &outages))
            .collect();

        DashboardStatus::Ready {
            view: Box::new(DashboardView {
                depth: resolved.depth,
                entity_label: resolved.entity_label,
                filters: filters.clone(),
                panels,
            }),
        }
    }

    fn render(
        &self,
        spec: PanelSpec,
        resolved: &ResolvedView,
        snapshot: &DashboardSnapshot,
        outages: &[OutageRecord],
    ) -> RenderedPanel {
        let data = match spec.source {
            DataSource::FilterOptions(FilterTab::Geographic) => {
                PanelData::FilterBar(FilterBar::Geographic {
                    options: resolved.options.clone(),
                    availability: resolved.availability,
                })
            }
            DataSource::FilterOptions(FilterTab::Department) => {
                PanelData::FilterBar(FilterBar::Department {
                    options: resolved.department_options.clone(),
                    availability: resolved.availability,
                })
            }
            DataSource::Kpis => PanelData::Kpis(snapshot.kpis.clone()),
            DataSource::MapData => PanelData::Entities(snapshot.map_data.clone()),
            DataSource::CoreMetrics => PanelData::CoreMetrics {
                regularity: snapshot.regularity_data.clone(),
                continuity: snapshot.continuity_data.clone(),
            },
            DataSource::ActiveTable => PanelData::Entities(resolved.active_table.clone()),
            DataSource::FocusedStates => {
                PanelData::Entities(focus_states(&snapshot.map_data, self.performance_focus.as_deref()))
            }
            DataSource::DemandSupply => PanelData::Rows(snapshot.demand_supply.clone()),
            DataSource::ImageSubmission => PanelData::Rows(snapshot.image_submission_status.clone()),
            DataSource::OutageSeries => PanelData::Outages(outages.to_vec()),
            DataSource::PhotoEvidence => PanelData::PhotoEvidence {
                rows: snapshot.photo_evidence_compliance.clone(),
                show_village_column: true,
            },
            DataSource::VillagePhotoEvidence => PanelData::PhotoEvidence {
                rows: village_photo_rows(snapshot),
                show_village_column: false,
            },
            DataSource::PumpOperators => PanelData::PumpOperators {
                total: snapshot.pump_operators_total(),
                slices: snapshot.pump_operators.clone(),
            },
            DataSource::OperatorRanking => PanelData::Rows(snapshot.operator_ranking()),
            DataSource::VillageOperator => {
                PanelData::Operator(snapshot.leading_pump_operators.first().cloned())
            }
        };

        RenderedPanel {
            kind: spec.kind,
            title: spec.title,
            entity_label: spec.entity_label,
            data,
        }
    }
}

/// Outage rows at the grain being displayed.
///
/// The source is per district, so it is used as-is at the top level and for a
/// selected state; below that it is remapped onto the active entities.
fn outage_series(resolved: &ResolvedView, snapshot: &DashboardSnapshot) -> Vec<OutageRecord> {
    if resolved.depth >= Depth::District {
        remap_series(&resolved.active_table, &snapshot.water_supply_outages)
    } else {
        snapshot.water_supply_outages.clone()
    }
}

/// First state named `focus`, or every state when no focus is set.
fn focus_states(map_data: &[EntityPerformance], focus: Option<&str>) -> Vec<EntityPerformance> {
    match focus {
        Some(name) => map_data
            .iter()
            .filter(|state| state.name == name)
            .take(1)
            .cloned()
            .collect(),
        None => map_data.to_vec(),
    }
}

/// Photo evidence rows attributed to the village's pump operator, when known.
fn village_photo_rows(snapshot: &DashboardSnapshot) -> Vec<SeriesRow> {
    let operator = snapshot
        .leading_pump_operators
        .first()
        .and_then(|row| row.get("name"))
        .cloned();

    snapshot
        .photo_evidence_compliance
        .iter()
        .map(|row| {
            let mut row = row.clone();
            if let Some(name) = &operator {
                row.insert("name".to_string(), name.clone());
            }
            row
        })
        .collect()
}
