//! Automatic exploratory analysis of one dataset.
//!
//! Columns are classified once, then summarised, charted and condensed into a
//! short narrative. Nothing here keeps state between datasets.

pub mod charts;
pub mod classifier;
pub mod narrative;
pub mod statistics;

use std::time::Instant;

use crate::models::{ChartSpec, DataSummary, Dataset, EdaReport, PlotFailure, PlotRef};
use crate::services::plot_store::PlotSession;
use crate::services::render::ChartRenderer;

use classifier::classify_columns;
use narrative::{compose_narrative, Narrative};
use statistics::{compute_statistics, DatasetStatistics};

/// Everything decided about a dataset before any chart is drawn.
#[derive(Debug, Clone)]
pub struct EdaPlan {
    pub columns: Vec<String>,
    pub statistics: DatasetStatistics,
    pub charts: Vec<ChartSpec>,
    pub narrative: Narrative,
}

pub fn plan_analysis(dataset: &Dataset) -> EdaPlan {
    let start = Instant::now();
    let groups = classify_columns(dataset);
    tracing::info!(
        "Classified columns: {} categorical, {} numeric, {} excluded",
        groups.categorical.len(),
        groups.numeric.len(),
        groups.excluded.len()
    );

    let statistics = compute_statistics(dataset, &groups);
    let charts = charts::select_charts(&groups);
    let columns = dataset.column_names();
    let narrative = compose_narrative(
        statistics.shape,
        &columns,
        &statistics.modes,
        &statistics.null_counts,
    );

    tracing::info!("Planned {} charts in {:?}", charts.len(), start.elapsed());

    EdaPlan { columns, statistics, charts, narrative }
}

/// Renders every planned chart into the session directory.
///
/// A chart that fails to render is dropped from the plot list and reported in
/// `plot_errors`; the remaining charts are unaffected.
pub fn render_charts(
    charts: &[ChartSpec],
    session: &PlotSession,
    renderer: &dyn ChartRenderer,
) -> (Vec<PlotRef>, Vec<PlotFailure>) {
    let mut plots = Vec::with_capacity(charts.len());
    let mut failures = Vec::new();

    for chart in charts {
        let path = session.file_path(&chart.output_id);
        match renderer.render(chart, &path) {
            Ok(()) => plots.push(PlotRef {
                title: chart.title.clone(),
                url: session.url(&chart.output_id),
            }),
            Err(e) => {
                tracing::warn!("Failed to render {}: {}", chart.title, e);
                if path.exists() {
                    let _ = std::fs::remove_file(&path);
                }
                failures.push(PlotFailure { title: chart.title.clone(), error: e.to_string() });
            }
        }
    }

    (plots, failures)
}

pub fn run_eda(dataset: &Dataset, session: &PlotSession, renderer: &dyn ChartRenderer) -> EdaReport {
    let plan = plan_analysis(dataset);

    let render_start = Instant::now();
    let (plots, plot_errors) = render_charts(&plan.charts, session, renderer);
    tracing::info!(
        "Rendered {}/{} charts in {:?}",
        plots.len(),
        plan.charts.len(),
        render_start.elapsed()
    );

    EdaReport {
        data_summary: DataSummary {
            columns: plan.columns,
            shape: plan.statistics.shape,
            summary: plan.statistics.summary,
            value_counts: plan.statistics.value_counts,
        },
        summary_text: plan.narrative.to_string(),
        plots,
        plot_errors,
    }
}
