use rayon::prelude::*;
use std::collections::{HashMap, HashSet};

use super::classifier::ColumnGroups;
use crate::models::{Column, Dataset, MetricValue, OrderedMap, Shape};

/// Entries kept per column in the frequency table.
pub const TOP_VALUES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Count,
    Unique,
    Top,
    Freq,
    Mean,
    Std,
    Min,
    Q25,
    Q50,
    Q75,
    Max,
}

impl Metric {
    pub fn label(&self) -> &'static str {
        match self {
            Metric::Count => "count",
            Metric::Unique => "unique",
            Metric::Top => "top",
            Metric::Freq => "freq",
            Metric::Mean => "mean",
            Metric::Std => "std",
            Metric::Min => "min",
            Metric::Q25 => "25%",
            Metric::Q50 => "50%",
            Metric::Q75 => "75%",
            Metric::Max => "max",
        }
    }
}

const CATEGORICAL_METRICS: [Metric; 3] = [Metric::Unique, Metric::Top, Metric::Freq];
const NUMERIC_METRICS: [Metric; 7] = [
    Metric::Mean,
    Metric::Std,
    Metric::Min,
    Metric::Q25,
    Metric::Q50,
    Metric::Q75,
    Metric::Max,
];

#[derive(Debug, Clone, PartialEq)]
pub struct DatasetStatistics {
    pub shape: Shape,
    /// `describe()`-style metrics for every column, excluded ones included.
    pub summary: OrderedMap<String, OrderedMap<&'static str, MetricValue>>,
    /// Top five values of each categorical column.
    pub value_counts: OrderedMap<String, OrderedMap<String, usize>>,
    pub null_counts: Vec<(String, usize)>,
    /// Most frequent value of each categorical column that has any values.
    pub modes: Vec<(String, String)>,
}

#[derive(Debug)]
struct ColumnProfile {
    name: String,
    metrics: OrderedMap<&'static str, MetricValue>,
    null_count: usize,
    frequencies: Vec<(String, usize)>,
}

/// Counts non-missing values, most frequent first. Ties keep first-seen order.
pub fn value_frequencies<'a, I>(values: I) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(&str, usize)> = Vec::new();

    for value in values {
        match index.get(value) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(value, counts.len());
                counts.push((value, 1));
            }
        }
    }

    // sort_by is stable, which keeps first-seen order among equal counts
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.into_iter().map(|(v, c)| (v.to_string(), c)).collect()
}

pub fn top_values(frequencies: &[(String, usize)]) -> Vec<(String, usize)> {
    frequencies.iter().take(TOP_VALUES).cloned().collect()
}

/// Number of distinct values, treating `0.0` and `-0.0` as equal.
pub fn distinct_numeric(values: &[f64]) -> usize {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted.dedup_by(|a, b| a == b);
    sorted.len()
}

/// Linear interpolation between the closest ranks of an ascending slice.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Sample standard deviation; undefined below two values.
fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

fn number(value: Option<f64>) -> MetricValue {
    value.map_or(MetricValue::Empty, MetricValue::Number)
}

fn numeric_metric(metric: Metric, sorted: &[f64]) -> MetricValue {
    match metric {
        Metric::Mean => number(mean(sorted)),
        Metric::Std => number(sample_std(sorted)),
        Metric::Min => number(sorted.first().copied()),
        Metric::Q25 => number(quantile(sorted, 0.25)),
        Metric::Q50 => number(quantile(sorted, 0.5)),
        Metric::Q75 => number(quantile(sorted, 0.75)),
        Metric::Max => number(sorted.last().copied()),
        _ => MetricValue::Empty,
    }
}

fn categorical_metric(metric: Metric, frequencies: &[(String, usize)]) -> MetricValue {
    match metric {
        Metric::Unique => MetricValue::Number(frequencies.len() as f64),
        Metric::Top => frequencies
            .first()
            .map_or(MetricValue::Empty, |(v, _)| MetricValue::Text(v.clone())),
        Metric::Freq => frequencies
            .first()
            .map_or(MetricValue::Empty, |(_, c)| MetricValue::Number(*c as f64)),
        _ => MetricValue::Empty,
    }
}

/// Metric rows present in the summary. Mirrors `describe(include='all')`: the
/// categorical rows appear only when some column is non-numeric, the
/// distribution rows only when some column is numeric.
fn metric_rows(dataset: &Dataset) -> Vec<Metric> {
    let has_numeric = dataset.columns().iter().any(Column::is_numeric);
    let has_non_numeric = dataset.columns().iter().any(|c| !c.is_numeric());

    let mut rows = vec![Metric::Count];
    if has_non_numeric {
        rows.extend(CATEGORICAL_METRICS);
    }
    if has_numeric {
        rows.extend(NUMERIC_METRICS);
    }
    rows
}

fn profile_column(column: &Column, rows: &[Metric]) -> ColumnProfile {
    let null_count = column.values.null_count();

    let (metrics, frequencies) = if column.is_numeric() {
        let mut sorted = column.numeric_values();
        sorted.sort_by(f64::total_cmp);
        let metrics: Vec<(&'static str, MetricValue)> = rows
            .iter()
            .map(|m| {
                let value = match m {
                    Metric::Count => MetricValue::Number(sorted.len() as f64),
                    other => numeric_metric(*other, &sorted),
                };
                (m.label(), value)
            })
            .collect();
        (metrics, Vec::new())
    } else {
        let values = column.string_values();
        let count = values.len();
        let frequencies = value_frequencies(values);
        let metrics: Vec<(&'static str, MetricValue)> = rows
            .iter()
            .map(|m| {
                let value = match m {
                    Metric::Count => MetricValue::Number(count as f64),
                    other => categorical_metric(*other, &frequencies),
                };
                (m.label(), value)
            })
            .collect();
        (metrics, frequencies)
    };

    ColumnProfile {
        name: column.name.clone(),
        metrics: OrderedMap(metrics),
        null_count,
        frequencies,
    }
}

/// Shape, per-column summary, frequency tables and null counts of a dataset.
pub fn compute_statistics(dataset: &Dataset, groups: &ColumnGroups<'_>) -> DatasetStatistics {
    let (rows, cols) = dataset.shape();
    let metric_rows = metric_rows(dataset);

    let profiles: Vec<ColumnProfile> = dataset
        .columns()
        .par_iter()
        .map(|column| profile_column(column, &metric_rows))
        .collect();

    let categorical: HashSet<&str> = groups.categorical.iter().map(|c| c.name.as_str()).collect();

    let mut summary = Vec::with_capacity(profiles.len());
    let mut value_counts = Vec::new();
    let mut null_counts = Vec::with_capacity(profiles.len());
    let mut modes = Vec::new();

    for profile in profiles {
        if categorical.contains(profile.name.as_str()) {
            let top = top_values(&profile.frequencies);
            if let Some((value, _)) = top.first() {
                modes.push((profile.name.clone(), value.clone()));
            }
            value_counts.push((profile.name.clone(), OrderedMap(top)));
        }
        null_counts.push((profile.name.clone(), profile.null_count));
        summary.push((profile.name, profile.metrics));
    }

    tracing::debug!(
        "Computed statistics for {} columns ({} categorical)",
        cols,
        value_counts.len()
    );

    DatasetStatistics {
        shape: Shape(rows, cols),
        summary: OrderedMap(summary),
        value_counts: OrderedMap(value_counts),
        null_counts,
        modes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::eda::classifier::classify_columns;

    fn dataset() -> Dataset {
        Dataset::new(vec![
            Column::text("name", vec![Some("a"), Some("b"), Some("c"), Some("d"), None, Some("f")]),
            Column::text(
                "color",
                vec![Some("red"), Some("blue"), Some("blue"), None, Some("red"), Some("green")],
            ),
            Column::numeric(
                "score",
                vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0), None, None],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn frequencies_break_ties_by_first_appearance() {
        let freqs = value_frequencies(["b", "a", "c", "a", "b", "d"]);
        assert_eq!(
            freqs,
            vec![
                ("b".to_string(), 2),
                ("a".to_string(), 2),
                ("c".to_string(), 1),
                ("d".to_string(), 1)
            ]
        );
    }

    #[test]
    fn top_values_never_exceed_five() {
        let values = ["a", "b", "c", "d", "e", "f", "g", "a"];
        let top = top_values(&value_frequencies(values));
        assert_eq!(top.len(), TOP_VALUES);
        assert_eq!(top[0], ("a".to_string(), 2));
        assert!(top.windows(2).all(|w| w[0].1 >= w[1].1));
    }

    #[test]
    fn quantiles_interpolate_linearly() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&sorted, 0.25), Some(1.75));
        assert_eq!(quantile(&sorted, 0.5), Some(2.5));
        assert_eq!(quantile(&sorted, 0.75), Some(3.25));
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn distinct_numeric_counts_signed_zero_once() {
        assert_eq!(distinct_numeric(&[0.0, -0.0, 1.0, 1.0]), 2);
        assert_eq!(distinct_numeric(&[]), 0);
    }

    #[test]
    fn numeric_summary_matches_describe() {
        let data = dataset();
        let stats = compute_statistics(&data, &classify_columns(&data));
        let score = stats.summary.get("score").unwrap();

        assert_eq!(score.get("count"), Some(&MetricValue::Number(4.0)));
        assert_eq!(score.get("mean"), Some(&MetricValue::Number(2.5)));
        assert_eq!(score.get("min"), Some(&MetricValue::Number(1.0)));
        assert_eq!(score.get("50%"), Some(&MetricValue::Number(2.5)));
        assert_eq!(score.get("max"), Some(&MetricValue::Number(4.0)));
        assert_eq!(score.get("top"), Some(&MetricValue::Empty));
        match score.get("std") {
            Some(MetricValue::Number(std)) => assert!((std - 1.290_994_448_735_805_6).abs() < 1e-12),
            other => panic!("unexpected std: {:?}", other),
        }
    }

    #[test]
    fn every_column_has_every_metric_row() {
        let data = dataset();
        let stats = compute_statistics(&data, &classify_columns(&data));

        let expected: Vec<&str> = vec![
            "count", "unique", "top", "freq", "mean", "std", "min", "25%", "50%", "75%", "max",
        ];
        for (_, metrics) in &stats.summary.0 {
            assert_eq!(metrics.keys().copied().collect::<Vec<_>>(), expected);
        }

        let color = stats.summary.get("color").unwrap();
        assert_eq!(color.get("top"), Some(&MetricValue::Text("red".to_string())));
        assert_eq!(color.get("freq"), Some(&MetricValue::Number(2.0)));
        assert_eq!(color.get("unique"), Some(&MetricValue::Number(3.0)));
        assert_eq!(color.get("mean"), Some(&MetricValue::Empty));
    }

    #[test]
    fn numeric_only_datasets_skip_categorical_rows() {
        let data = Dataset::new(vec![Column::numeric("x", vec![Some(1.0), Some(2.0)])]).unwrap();
        let stats = compute_statistics(&data, &classify_columns(&data));
        let x = stats.summary.get("x").unwrap();
        assert!(x.get("top").is_none());
        assert_eq!(x.len(), 8);
    }

    #[test]
    fn value_counts_cover_only_categorical_columns() {
        let data = dataset();
        let stats = compute_statistics(&data, &classify_columns(&data));

        assert_eq!(stats.value_counts.keys().collect::<Vec<_>>(), vec!["color"]);
        let color = stats.value_counts.get("color").unwrap();
        assert_eq!(
            color.0,
            vec![("red".to_string(), 2), ("blue".to_string(), 2), ("green".to_string(), 1)]
        );
        assert_eq!(stats.modes, vec![("color".to_string(), "red".to_string())]);
    }

    #[test]
    fn null_counts_include_excluded_columns() {
        let data = dataset();
        let stats = compute_statistics(&data, &classify_columns(&data));
        assert_eq!(
            stats.null_counts,
            vec![("name".to_string(), 1), ("color".to_string(), 1), ("score".to_string(), 2)]
        );
        assert_eq!(stats.shape, Shape(6, 3));
    }
}
