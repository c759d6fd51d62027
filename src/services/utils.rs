use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static UNSAFE_FILE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\\/*?"<>|: ]+"#).expect("valid file name pattern"));

/// Trim, lower-case and replace spaces with underscores.
pub fn normalize_column_name(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

/// Normalizes a header row in place order.
///
/// Blank headers become `Unnamed: <index>` first. Names that collide after
/// normalization get a numeric suffix so every column stays addressable.
/// Running this on its own output returns the same names.
pub fn normalize_headers<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let mut existing_names = HashSet::new();

    raw.iter()
        .enumerate()
        .map(|(idx, name)| {
            let name = name.as_ref();
            let base_name = if name.trim().is_empty() {
                normalize_column_name(&format!("Unnamed: {}", idx))
            } else {
                normalize_column_name(name)
            };

            // If the name already exists, add a numeric suffix
            let mut cleaned = base_name.clone();
            let mut counter = 1;
            while !existing_names.insert(cleaned.clone()) {
                cleaned = format!("{}_{}", base_name, counter);
                counter += 1;
            }

            cleaned
        })
        .collect()
}

/// Replaces every run of path-unsafe characters and spaces with a single `_`.
pub fn sanitize_file_stem(name: &str) -> String {
    UNSAFE_FILE_CHARS.replace_all(name, "_").into_owned()
}
