use crate::models::{Column, ColumnKind, ColumnValues, Dataset, ExclusionReason};

/// Columns of one dataset partitioned by kind, each group in original column order.
#[derive(Debug, Default)]
pub struct ColumnGroups<'a> {
    pub categorical: Vec<&'a Column>,
    pub numeric: Vec<&'a Column>,
    pub excluded: Vec<(&'a Column, ExclusionReason)>,
}

/// Decides the analysis kind of a single (already normalized) column.
pub fn classify_column(column: &Column) -> ColumnKind {
    match &column.values {
        ColumnValues::Text(_) if column.name.contains("name") => {
            ColumnKind::Excluded(ExclusionReason::IdentifierLike)
        }
        ColumnValues::Text(_) => ColumnKind::Categorical,
        ColumnValues::Numeric(_) if column.name.starts_with("unnamed") => {
            ColumnKind::Excluded(ExclusionReason::IndexArtifact)
        }
        ColumnValues::Numeric(_) => ColumnKind::Numeric,
        ColumnValues::Other { .. } => ColumnKind::Excluded(ExclusionReason::UnsupportedType),
    }
}

pub fn classify_columns(dataset: &Dataset) -> ColumnGroups<'_> {
    let mut groups = ColumnGroups::default();

    for column in dataset.columns() {
        match classify_column(column) {
            ColumnKind::Categorical => groups.categorical.push(column),
            ColumnKind::Numeric => groups.numeric.push(column),
            ColumnKind::Excluded(reason) => {
                tracing::debug!("Excluding column {} from analysis: {:?}", column.name, reason);
                groups.excluded.push((column, reason));
            }
        }
    }

    groups
}
