use std::fmt;

use crate::models::Shape;

const LEADING_COLUMNS: usize = 5;
const TOP_NULL_COLUMNS: usize = 3;

/// Fixed-template digest of a dataset's shape, frequent values and missingness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Narrative {
    pub rows: usize,
    pub columns: usize,
    pub leading_columns: Vec<String>,
    /// More columns exist than `leading_columns` shows.
    pub truncated: bool,
    pub top_values: Vec<(String, String)>,
    pub top_nulls: Vec<(String, usize)>,
}

/// Builds the narrative from already computed statistics. Pure selection and ordering.
pub fn compose_narrative(
    shape: Shape,
    column_names: &[String],
    modes: &[(String, String)],
    null_counts: &[(String, usize)],
) -> Narrative {
    let mut top_nulls: Vec<(String, usize)> =
        null_counts.iter().filter(|(_, count)| *count > 0).cloned().collect();
    // stable: equal counts stay in column order
    top_nulls.sort_by(|a, b| b.1.cmp(&a.1));
    top_nulls.truncate(TOP_NULL_COLUMNS);

    Narrative {
        rows: shape.0,
        columns: shape.1,
        leading_columns: column_names.iter().take(LEADING_COLUMNS).cloned().collect(),
        truncated: column_names.len() > LEADING_COLUMNS,
        top_values: modes.to_vec(),
        top_nulls,
    }
}

fn join_or_none<I: Iterator<Item = String>>(items: I) -> String {
    let joined = items.collect::<Vec<_>>().join(", ");
    if joined.is_empty() {
        "None".to_string()
    } else {
        joined
    }
}

impl fmt::Display for Narrative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let frequent = join_or_none(self.top_values.iter().map(|(col, val)| format!("{}: {}", col, val)));
        let nulls =
            join_or_none(self.top_nulls.iter().map(|(col, n)| format!("{} ({} nulls)", col, n)));

        writeln!(f, "📊 Dataset contains {} rows and {} columns.", self.rows, self.columns)?;
        writeln!(
            f,
            "🧱 Columns: {}{}.",
            self.leading_columns.join(", "),
            if self.truncated { "..." } else { "" }
        )?;
        writeln!(f, "🔍 Top frequent values: {}.", frequent)?;
        write!(f, "❗ Columns with most missing values: {}.", nulls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn renders_the_four_line_template() {
        let narrative = compose_narrative(
            Shape(10, 3),
            &names(&["name", "category", "score"]),
            &[("category".to_string(), "A".to_string())],
            &[("name".to_string(), 0), ("category".to_string(), 2), ("score".to_string(), 1)],
        );

        assert_eq!(
            narrative.to_string(),
            "📊 Dataset contains 10 rows and 3 columns.\n\
             🧱 Columns: name, category, score.\n\
             🔍 Top frequent values: category: A.\n\
             ❗ Columns with most missing values: category (2 nulls), score (1 nulls)."
        );
    }

    #[test]
    fn more_than_five_columns_get_an_ellipsis() {
        let cols = names(&["a", "b", "c", "d", "e", "f"]);
        let narrative = compose_narrative(Shape(1, 6), &cols, &[], &[]);
        let text = narrative.to_string();
        assert!(text.contains("🧱 Columns: a, b, c, d, e....\n"));
        assert!(text.contains("🔍 Top frequent values: None.\n"));
    }

    #[test]
    fn no_missing_values_renders_none() {
        let narrative = compose_narrative(
            Shape(2, 2),
            &names(&["a", "b"]),
            &[],
            &[("a".to_string(), 0), ("b".to_string(), 0)],
        );
        assert!(narrative.top_nulls.is_empty());
        assert!(narrative.to_string().ends_with("❗ Columns with most missing values: None."));
    }

    #[test]
    fn top_nulls_are_capped_and_ties_keep_column_order() {
        let nulls = vec![
            ("a".to_string(), 1),
            ("b".to_string(), 4),
            ("c".to_string(), 1),
            ("d".to_string(), 4),
            ("e".to_string(), 2),
        ];
        let narrative = compose_narrative(Shape(5, 5), &names(&["a", "b", "c", "d", "e"]), &[], &nulls);
        assert_eq!(
            narrative.top_nulls,
            vec![("b".to_string(), 4), ("d".to_string(), 4), ("e".to_string(), 2)]
        );
    }
}
