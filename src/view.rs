//! Which panels the dashboard shows, in order, and what feeds each one.
//!
//! [`compose`] is a total function of the drill depth, the village flag and
//! the active tab. Precedence: the village view replaces everything below the
//! map; otherwise block, district, state and top-level views apply in that
//! order. Panels never filter data themselves; they name a [`DataSource`] the
//! dashboard has already resolved.

use serde::Serialize;

use crate::filter_state::FilterTab;
use crate::hierarchy::Depth;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PanelKind {
    FilterBar,
    KpiCards,
    MapView,
    CoreMetrics,
    /// Core metrics laid out for a single village.
    CoreMetricsDetail,
    PumpOperatorDetails,
    PhotoEvidence,
    DemandSupply,
    ImageSubmissionStatus,
    IssueTypeBreakdown,
    WaterSupplyOutages,
    PerformanceChart,
    SubmissionRate,
    EntityTable,
    PumpOperatorsChart,
    OperatorsPerformanceTable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DataSource {
    /// Selectors of the given tab with their resolved options.
    FilterOptions(FilterTab),
    Kpis,
    MapData,
    CoreMetrics,
    /// Performance rows of the level below the selection.
    ActiveTable,
    /// Top-level rows narrowed to the performance focus, if one is set.
    FocusedStates,
    DemandSupply,
    ImageSubmission,
    /// Outage breakdown at the displayed grain (synthesized below district).
    OutageSeries,
    PhotoEvidence,
    /// Photo evidence attributed to the village's pump operator.
    VillagePhotoEvidence,
    PumpOperators,
    /// Leading operators followed by bottom operators.
    OperatorRanking,
    VillageOperator,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelSpec {
    pub kind: PanelKind,
    pub source: DataSource,
    pub title: String,
    /// Entity label for axes and column headers, when the panel has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_label: Option<&'static str>,
}

impl PanelSpec {
    fn new(kind: PanelKind, source: DataSource, title: impl Into<String>) -> Self {
        Self {
            kind,
            source,
            title: title.into(),
            entity_label: None,
        }
    }

    fn labelled(mut self, label: &'static str) -> Self {
        self.entity_label = Some(label);
        self
    }
}

/// Ordered panel set for a view state. Never empty.
pub fn compose(depth: Depth, village_selected: bool, tab: FilterTab) -> Vec<PanelSpec> {
    use self::DataSource as S;
    use self::PanelKind as P;

    let label = depth.entity_label();
    let filter_title = match tab {
        FilterTab::Geographic => "Filters",
        FilterTab::Department => "Department Filters",
    };

    let mut panels = vec![
        PanelSpec::new(P::FilterBar, S::FilterOptions(tab), filter_title),
        PanelSpec::new(P::KpiCards, S::Kpis, "Key Indicators"),
        PanelSpec::new(P::MapView, S::MapData, "States/UTs Map"),
    ];

    if village_selected || depth == Depth::Village {
        panels.extend([
            PanelSpec::new(P::CoreMetricsDetail, S::CoreMetrics, "Core Metrics"),
            PanelSpec::new(P::PumpOperatorDetails, S::VillageOperator, "Pump Operator Details"),
            PanelSpec::new(P::PhotoEvidence, S::VillagePhotoEvidence, "Photo Evidence Compliance"),
            PanelSpec::new(P::DemandSupply, S::DemandSupply, "Demand vs Supply"),
            PanelSpec::new(P::ImageSubmissionStatus, S::ImageSubmission, "Image Submission Status"),
            PanelSpec::new(P::IssueTypeBreakdown, S::OutageSeries, "Issue Type Breakdown")
                .labelled(label),
        ]);
        return panels;
    }

    panels.push(PanelSpec::new(P::CoreMetrics, S::CoreMetrics, "Core Metrics"));

    if depth >= Depth::State {
        panels.extend([
            PanelSpec::new(P::ImageSubmissionStatus, S::ImageSubmission, "Image Submission Status"),
            PanelSpec::new(P::WaterSupplyOutages, S::OutageSeries, "Water Supply Outages")
                .labelled(label),
        ]);
    }

    let performance_source = if depth == Depth::None {
        S::FocusedStates
    } else {
        S::ActiveTable
    };
    panels.extend([
        PanelSpec::new(
            P::PerformanceChart,
            performance_source,
            format!("All {label} Performance"),
        )
        .labelled(label),
        PanelSpec::new(P::DemandSupply, S::DemandSupply, "Demand vs Supply"),
    ]);

    let submission_rate =
        PanelSpec::new(P::SubmissionRate, S::ActiveTable, "Reading Submission Rate").labelled(label);
    let pump_operators = PanelSpec::new(P::PumpOperatorsChart, S::PumpOperators, "Pump Operators");
    let ranking = PanelSpec::new(
        P::OperatorsPerformanceTable,
        S::OperatorRanking,
        "Operators Performance Table",
    );
    let entity_table =
        PanelSpec::new(P::EntityTable, S::ActiveTable, format!("All {label}")).labelled(label);

    match depth {
        Depth::Block | Depth::GramPanchayat => panels.extend([
            PanelSpec::new(P::PhotoEvidence, S::PhotoEvidence, "Photo Evidence Compliance"),
            submission_rate,
            entity_table,
            pump_operators,
            ranking,
        ]),
        Depth::District => panels.extend([pump_operators, submission_rate, ranking, entity_table]),
        // Village returned early.
        Depth::State | Depth::None | Depth::Village => {
            panels.extend([entity_table, submission_rate])
        }
    }

    panels
}
