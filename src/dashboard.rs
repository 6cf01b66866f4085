use crate::assembler::{Dataset, Row};
use crate::filter::{cascade, FilterColumn, FilterControl, FilterState};
use crate::format::CurrencyFormat;
use crate::llm::{InsightGenerator, NarrativePanel, INSIGHTS_TITLE, NEGATIVE_VALUES_TITLE};
use crate::summary::{empty_metrics, Metric, PeriodSeries, Summary};
use log::debug;
use serde::Serialize;
use std::sync::Arc;

/// Everything one interaction displays.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView<'a> {
    pub year: i32,
    pub controls: Vec<FilterControl>,
    pub state: FilterState,
    pub resets: Vec<FilterColumn>,
    pub summary: Option<Summary>,
    pub metrics: Vec<Metric>,
    /// Absent when no rows are selected.
    pub series: Option<PeriodSeries>,
    pub rows: Vec<Row<'a>>,
    pub insights: Vec<NarrativePanel>,
}

impl DashboardView<'_> {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Re-renders the dashboard for each filter change. The dataset is loaded
/// once and never mutated; nothing else is kept between renders.
pub struct Dashboard {
    dataset: Arc<Dataset>,
    format: CurrencyFormat,
    insights: InsightGenerator,
}

impl Dashboard {
    pub fn new(dataset: Arc<Dataset>, format: CurrencyFormat, insights: InsightGenerator) -> Self {
        Self {
            dataset,
            format,
            insights,
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn format(&self) -> &CurrencyFormat {
        &self.format
    }

    /// Filters, metrics, chart and table. Never fails and never calls out.
    pub fn render_data(&self, requested: &FilterState) -> DashboardView<'_> {
        let result = cascade(&self.dataset, requested);
        let summary = Summary::compute(&result.rows);

        let (metrics, series) = match &summary {
            Some(summary) => (
                summary.metrics(&self.format),
                Some(PeriodSeries::from_rows(&result.rows)),
            ),
            None => (empty_metrics(), None),
        };

        debug!(
            "Rendered {} of {} rows for {:?}",
            result.rows.len(),
            self.dataset.len(),
            result.state
        );

        DashboardView {
            year: self.dataset.year(),
            controls: result.controls,
            state: result.state,
            resets: result.resets,
            summary,
            metrics,
            series,
            rows: result.rows,
            insights: Vec::new(),
        }
    }

    /// Full render, including the narrative panels. Insight failures are
    /// reported inside the panels and leave the rest of the view untouched.
    pub async fn render(&self, requested: &FilterState) -> DashboardView<'_> {
        let mut view = self.render_data(requested);
        view.insights = if view.is_empty() {
            [INSIGHTS_TITLE, NEGATIVE_VALUES_TITLE]
                .into_iter()
                .map(|title| NarrativePanel::failed(title, "Nenhum registro selecionado"))
                .collect()
        } else {
            self.insights.generate(&view.rows).await
        };
        view
    }
}
