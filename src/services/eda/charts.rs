use super::classifier::ColumnGroups;
use super::statistics::{distinct_numeric, value_frequencies};
use crate::models::{ChartData, ChartKind, ChartSpec, Column, ColumnKind, HistogramBin};
use crate::services::utils::sanitize_file_stem;

/// Categorical columns with at most this many distinct values get a pie chart.
pub const PIE_MAX_CATEGORIES: usize = 5;
pub const HISTOGRAM_BINS: usize = 20;
/// Fewer distinct values than this makes a histogram meaningless.
pub const MIN_HISTOGRAM_DISTINCT: usize = 2;

/// Which chart, if any, a column of the given kind and cardinality gets.
pub fn choose_chart(kind: ColumnKind, distinct: usize, non_missing: usize) -> Option<ChartKind> {
    match kind {
        ColumnKind::Categorical if non_missing == 0 => None,
        ColumnKind::Categorical if distinct <= PIE_MAX_CATEGORIES => Some(ChartKind::Pie),
        ColumnKind::Categorical => Some(ChartKind::Bar),
        ColumnKind::Numeric if distinct < MIN_HISTOGRAM_DISTINCT => None,
        ColumnKind::Numeric => Some(ChartKind::Histogram),
        ColumnKind::Excluded(_) => None,
    }
}

/// Equal-width bins over `[min, max]`; the last bin is closed on the right.
pub fn histogram_bins(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    // A constant column still gets a visible unit-wide range
    let (min, max) = if min == max { (min - 0.5, max + 0.5) } else { (min, max) };
    let width = (max - min) / bins as f64;

    let mut counts = vec![0usize; bins];
    for value in values {
        let idx = (((value - min) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            start: min + width * i as f64,
            end: if i + 1 == bins { max } else { min + width * (i + 1) as f64 },
            count,
        })
        .collect()
}

fn chart_spec(kind: ChartKind, column: &Column, data: ChartData) -> ChartSpec {
    ChartSpec {
        title: format!("{}: {}", kind.title_prefix(), column.name),
        kind,
        column: column.name.clone(),
        output_id: format!("{}_{}.png", sanitize_file_stem(&column.name), kind.file_suffix()),
        data,
    }
}

fn categorical_chart(column: &Column) -> Option<ChartSpec> {
    // full distribution, not just the top five
    let frequencies = value_frequencies(column.string_values());
    let non_missing: usize = frequencies.iter().map(|(_, c)| c).sum();

    let kind = choose_chart(ColumnKind::Categorical, frequencies.len(), non_missing)?;
    Some(chart_spec(kind, column, ChartData::Categories(frequencies)))
}

fn numeric_chart(column: &Column) -> Option<ChartSpec> {
    // inf cannot be binned; leave only the finite part of the column
    let mut values = column.numeric_values();
    let total = values.len();
    values.retain(|v| v.is_finite());
    if values.len() < total {
        tracing::debug!("Ignoring {} non-finite values in {}", total - values.len(), column.name);
    }

    let kind = choose_chart(ColumnKind::Numeric, distinct_numeric(&values), values.len())?;
    Some(chart_spec(kind, column, ChartData::Bins(histogram_bins(&values, HISTOGRAM_BINS))))
}

/// Chart descriptors for a classified dataset: categorical charts in column
/// order, then histograms in column order.
pub fn select_charts(groups: &ColumnGroups<'_>) -> Vec<ChartSpec> {
    let categorical = groups.categorical.iter().filter_map(|column| {
        let chart = categorical_chart(column);
        if chart.is_none() {
            tracing::debug!("Skipping chart for {}: no values", column.name);
        }
        chart
    });

    let numeric = groups.numeric.iter().filter_map(|column| {
        let chart = numeric_chart(column);
        if chart.is_none() {
            tracing::debug!("Skipping histogram for {}: fewer than two distinct values", column.name);
        }
        chart
    });

    categorical.chain(numeric).collect()
}
