use std::collections::{BTreeMap, BTreeSet};

use log::{info, warn};

use super::model::{Table, Value};

// ---------------------------------------------------------------------------
// Flag column filter (tile footprint membership)
// ---------------------------------------------------------------------------

/// Column marking tiles inside the survey footprint.
pub const DEFAULT_FLAG_COLUMN: &str = "IN_DESI";

/// Interpret a flag cell. Catalogs store these as booleans, 0/1 integers or
/// text depending on how they were exported.
pub fn flag_is_set(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Int(i) => *i != 0,
        Value::Float(f) => *f != 0.0 && !f.is_nan(),
        Value::Str(s) => {
            let s = s.trim();
            ["true", "t", "yes", "y"]
                .iter()
                .any(|word| s.eq_ignore_ascii_case(word))
                || s.parse::<i64>().is_ok_and(|i| i != 0)
        }
        Value::Null => false,
    }
}

/// Keep rows whose `column` flag is set. A table without the column is
/// returned unchanged.
pub fn filter_by_flag(table: &Table, column: &str) -> Table {
    if !table.has_column(column) {
        warn!("Column {column} not found; keeping all {} rows", table.len());
        return table.clone();
    }
    let indices: Vec<usize> = table
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| rec.get(column).is_some_and(flag_is_set))
        .map(|(i, _)| i)
        .collect();
    info!(
        "Kept {} of {} rows with {column} set",
        indices.len(),
        table.len()
    );
    table.select(&indices)
}

// ---------------------------------------------------------------------------
// Value selection: which unique values are selected per column
// ---------------------------------------------------------------------------

/// Per-column selection state: maps column_name → set of selected values.
/// A column absent from the map is unconstrained.
pub type FilterState = BTreeMap<String, BTreeSet<Value>>;

/// Selection restricting `PROGRAM` to the values of `table` that match one
/// of `programs`, ignoring case. No names means no constraint; names that
/// match nothing leave an empty selection.
pub fn program_filter(table: &Table, programs: &[String]) -> FilterState {
    let mut filters = FilterState::new();
    if !programs.is_empty() {
        let selected = table
            .unique_values("PROGRAM")
            .into_iter()
            .filter(|value| match value {
                Value::Str(s) => programs
                    .iter()
                    .any(|p| s.trim().eq_ignore_ascii_case(p.trim())),
                _ => false,
            })
            .collect();
        filters.insert("PROGRAM".to_string(), selected);
    }
    filters
}

/// Return indices of rows that pass all active filters.
///
/// A row passes a column filter when:
/// * The filter set for that column is empty → nothing selected → fails
/// * The set holds every unique value of the column → no constraint
/// * The row's value for that column is in the selected set → passes
///
/// A row lacking the column has value `Null`.
pub fn filtered_indices(table: &Table, filters: &FilterState) -> Vec<usize> {
    let active: Vec<(&String, &BTreeSet<Value>)> = filters
        .iter()
        .filter(|(col, selected)| {
            selected.is_empty() || table.unique_values(col).iter().any(|v| !selected.contains(v))
        })
        .collect();

    table
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| {
            active.iter().all(|(col, selected)| {
                match rec.get(col.as_str()) {
                    Some(value) => selected.contains(value),
                    None => selected.contains(&Value::Null),
                }
            })
        })
        .map(|(i, _)| i)
        .collect()
}
