use serde::ser::{SerializeTuple, Serializer};
use serde::Serialize;
use std::collections::HashSet;

use crate::error::AppError;

/// Raw values of one column, as typed by the ingestion step.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
    /// Booleans, dates and anything else that is neither numeric nor text.
    /// Rendered to strings so it can still be summarised.
    Other {
        dtype: String,
        values: Vec<Option<String>>,
    },
}

impl ColumnValues {
    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Numeric(v) => v.len(),
            ColumnValues::Text(v) => v.len(),
            ColumnValues::Other { values, .. } => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn null_count(&self) -> usize {
        match self {
            ColumnValues::Numeric(v) => v.iter().filter(|x| x.is_none()).count(),
            ColumnValues::Text(v) => v.iter().filter(|x| x.is_none()).count(),
            ColumnValues::Other { values, .. } => values.iter().filter(|x| x.is_none()).count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: ColumnValues,
}

impl Column {
    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self { name: name.into(), values: ColumnValues::Numeric(values) }
    }

    pub fn text<S: Into<String>>(name: impl Into<String>, values: Vec<Option<S>>) -> Self {
        Self {
            name: name.into(),
            values: ColumnValues::Text(values.into_iter().map(|v| v.map(Into::into)).collect()),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.values, ColumnValues::Numeric(_))
    }

    /// Non-missing numeric values, in row order.
    pub fn numeric_values(&self) -> Vec<f64> {
        match &self.values {
            ColumnValues::Numeric(v) => v.iter().flatten().copied().collect(),
            _ => Vec::new(),
        }
    }

    /// Non-missing values of a text-like column, in row order.
    pub fn string_values(&self) -> Vec<&str> {
        match &self.values {
            ColumnValues::Numeric(_) => Vec::new(),
            ColumnValues::Text(v) | ColumnValues::Other { values: v, .. } => {
                v.iter().flatten().map(String::as_str).collect()
            }
        }
    }
}

/// An ordered set of equally long, uniquely named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    row_count: usize,
}

impl Dataset {
    pub fn new(columns: Vec<Column>) -> Result<Self, AppError> {
        if columns.is_empty() {
            return Err(AppError::Ingestion("No columns to parse from file".to_string()));
        }

        let row_count = columns[0].values.len();
        let mut seen = HashSet::new();
        for column in &columns {
            if column.values.len() != row_count {
                return Err(AppError::Ingestion(format!(
                    "Column {} has {} rows, expected {}",
                    column.name,
                    column.values.len(),
                    row_count
                )));
            }
            if !seen.insert(column.name.as_str()) {
                return Err(AppError::Ingestion(format!("Duplicate column name: {}", column.name)));
            }
        }

        Ok(Self { columns, row_count })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.row_count, self.columns.len())
    }
}

/// Why a column takes no part in frequency or chart analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionReason {
    /// Text column whose name is or contains "name".
    IdentifierLike,
    /// Numeric column whose name starts with "unnamed".
    IndexArtifact,
    /// Neither numeric nor text.
    UnsupportedType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Categorical,
    Numeric,
    Excluded(ExclusionReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Pie,
    Bar,
    Histogram,
}

impl ChartKind {
    pub fn title_prefix(&self) -> &'static str {
        match self {
            ChartKind::Pie => "Pie",
            ChartKind::Bar => "Bar",
            ChartKind::Histogram => "Histogram",
        }
    }

    /// Suffix used in the chart's file name.
    pub fn file_suffix(&self) -> &'static str {
        match self {
            ChartKind::Pie => "pie",
            ChartKind::Bar => "bar",
            ChartKind::Histogram => "hist",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Data series a chart is drawn from.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartData {
    /// Full value distribution, most frequent first.
    Categories(Vec<(String, usize)>),
    Bins(Vec<HistogramBin>),
}

/// What to draw for one column. Produced by the chart selector, consumed once by a renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub title: String,
    pub kind: ChartKind,
    pub column: String,
    /// File name inside the plot directory, e.g. `region_bar.png`.
    pub output_id: String,
    pub data: ChartData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlotRef {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlotFailure {
    pub title: String,
    pub error: String,
}

/// A `describe()` cell. Inapplicable or undefined metrics serialize as `""`.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Number(f64),
    Text(String),
    Empty,
}

impl Serialize for MetricValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MetricValue::Number(n) if n.is_finite() => serializer.serialize_f64(*n),
            MetricValue::Number(_) | MetricValue::Empty => serializer.serialize_str(""),
            MetricValue::Text(s) => serializer.serialize_str(s),
        }
    }
}

/// Insertion-ordered key/value pairs serialized as a JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedMap<K, V>(pub Vec<(K, V)>);

impl<K, V> Default for OrderedMap<K, V> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<K, V> OrderedMap<K, V> {
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: std::borrow::Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        self.0.iter().find(|(k, _)| k.borrow() == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.0.iter().map(|(k, _)| k)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Serialize, V: Serialize> Serialize for OrderedMap<K, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(k, v)| (k, v)))
    }
}

/// (rows, columns), serialized as a two element array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape(pub usize, pub usize);

impl Serialize for Shape {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&self.0)?;
        tuple.serialize_element(&self.1)?;
        tuple.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSummary {
    pub columns: Vec<String>,
    pub shape: Shape,
    pub summary: OrderedMap<String, OrderedMap<&'static str, MetricValue>>,
    pub value_counts: OrderedMap<String, OrderedMap<String, usize>>,
}

/// Response payload of one upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdaReport {
    pub data_summary: DataSummary,
    pub summary_text: String,
    pub plots: Vec<PlotRef>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub plot_errors: Vec<PlotFailure>,
}
