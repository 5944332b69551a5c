use std::collections::{BTreeSet, HashSet};

use super::error::FilterError;
use super::model::{CellValue, Record, RecordTable};

pub const PROGRAM: &str = "program";
pub const STATUS: &str = "status";
pub const REASON: &str = "reason";
pub const WEEK: &str = "week";

/// Label of the status option that disables the status predicate.
pub const ALL_STATUSES: &str = "All";

// ---------------------------------------------------------------------------
// Filter selection: what the user picked per filterable column
// ---------------------------------------------------------------------------

/// Single-choice status predicate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum StatusFilter {
    #[default]
    All,
    Only(CellValue),
}

/// Per-column selections. An empty set means "no filter" (show all), which
/// is what a multiselect with every option ticked and then cleared reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FilterSelection {
    pub program: BTreeSet<CellValue>,
    pub status: StatusFilter,
    pub reason: BTreeSet<CellValue>,
    pub week: BTreeSet<CellValue>,
}

/// One active predicate over a named column.
#[derive(Debug, Clone, Copy)]
enum Predicate<'a> {
    In(&'a str, &'a BTreeSet<CellValue>),
    Equals(&'a str, &'a CellValue),
}

impl Predicate<'_> {
    fn column(&self) -> &str {
        match self {
            Predicate::In(col, _) | Predicate::Equals(col, _) => *col,
        }
    }

    fn values(&self) -> Vec<&CellValue> {
        match self {
            Predicate::In(_, set) => set.iter().collect(),
            Predicate::Equals(_, v) => vec![*v],
        }
    }

    fn matches(&self, value: &CellValue) -> bool {
        match self {
            Predicate::In(_, set) => set.contains(value),
            Predicate::Equals(_, v) => *v == value,
        }
    }
}

impl FilterSelection {
    /// Whether no predicate is active.
    pub fn is_unconstrained(&self) -> bool {
        self.predicates().is_empty()
    }

    fn predicates(&self) -> Vec<Predicate<'_>> {
        let mut active = Vec::new();
        if !self.program.is_empty() {
            active.push(Predicate::In(PROGRAM, &self.program));
        }
        if let StatusFilter::Only(status) = &self.status {
            active.push(Predicate::Equals(STATUS, status));
        }
        if !self.reason.is_empty() {
            active.push(Predicate::In(REASON, &self.reason));
        }
        if !self.week.is_empty() {
            active.push(Predicate::In(WEEK, &self.week));
        }
        active
    }
}

/// Initialise a [`FilterSelection`] with every option selected, the way the
/// dashboard opens.
pub fn init_selection(table: &RecordTable) -> FilterSelection {
    FilterSelection {
        program: table.unique_values(PROGRAM),
        status: StatusFilter::All,
        reason: table.unique_values(REASON),
        week: table.unique_values(WEEK),
    }
}

/// Return indices of records that pass all active predicates.
///
/// A record passes a predicate when:
/// * the column is absent from the table → passes (no constraint)
/// * the selection for that column is empty → passes (no constraint)
/// * the record's value is in the selected set / equals the selected status
pub fn filtered_indices(
    table: &RecordTable,
    selection: &FilterSelection,
) -> Result<Vec<usize>, FilterError> {
    let mut resolved = Vec::new();
    for predicate in selection.predicates() {
        let Some(idx) = table.column_index(predicate.column()) else {
            continue;
        };
        let kind = table.columns[idx].kind;
        if let Some(bad) = predicate.values().into_iter().find(|v| !v.fits(kind)) {
            return Err(FilterError::IncompatibleValue {
                column: predicate.column().to_string(),
                value: bad.clone(),
                kind,
            });
        }
        resolved.push((idx, predicate));
    }

    Ok(table
        .rows
        .iter()
        .enumerate()
        .filter(|(_, record)| resolved.iter().all(|(idx, p)| p.matches(record.get(*idx))))
        .map(|(i, _)| i)
        .collect())
}

/// Collapse exact duplicate records, keeping the first occurrence.
pub fn dedup_records<'a>(records: impl IntoIterator<Item = &'a Record>) -> Vec<Record> {
    let mut seen: HashSet<&Record> = HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert(*r))
        .cloned()
        .collect()
}

/// Apply the selection and deduplicate, producing a new table.
pub fn apply_filters(
    table: &RecordTable,
    selection: &FilterSelection,
) -> Result<RecordTable, FilterError> {
    if selection.is_unconstrained() {
        log::debug!("No active filters; removing duplicates only");
    }
    let indices = filtered_indices(table, selection).inspect_err(|e| log::error!("filter: {e}"))?;
    let rows = dedup_records(indices.iter().map(|&i| &table.rows[i]));

    log::info!(
        "Filters applied: {} of {} records match, {} after removing duplicates",
        indices.len(),
        table.len(),
        rows.len()
    );
    if rows.is_empty() {
        log::warn!("Filtered data is empty");
    }
    Ok(table.with_rows(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NormalizeConfig;
    use crate::data::loader::load_csv;
    use crate::data::model::{Column, ColumnKind};

    fn scenario() -> RecordTable {
        load_csv(
            b"Program,Status,Reason,Week,Balance\n\
              CS,Active,Fees,1,\"1,000\"\n\
              CS,Active,Fees,1,\"1,000\"\n\
              EE,Done,Other,2,abc\n",
            &NormalizeConfig::default(),
        )
        .unwrap()
    }

    fn set(values: &[&str]) -> BTreeSet<CellValue> {
        values.iter().map(|v| CellValue::text(*v)).collect()
    }

    #[test]
    fn program_filter_then_dedup() {
        let table = scenario();
        let selection = FilterSelection {
            program: set(&["CS"]),
            ..Default::default()
        };
        assert_eq!(filtered_indices(&table, &selection).unwrap(), vec![0, 1]);
        let filtered = apply_filters(&table, &selection).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.rows[0].get(0), &CellValue::text("CS"));
    }

    #[test]
    fn empty_selection_returns_distinct_rows() {
        let table = scenario();
        let filtered = apply_filters(&table, &FilterSelection::default()).unwrap();
        let distinct: HashSet<_> = table.rows.iter().collect();
        assert_eq!(filtered.len(), distinct.len());
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered.columns, table.columns);
    }

    #[test]
    fn cleared_multiselect_means_no_constraint() {
        let table = scenario();
        let mut selection = init_selection(&table);
        selection.program.clear();
        selection.reason.clear();
        selection.week.clear();
        assert!(selection.is_unconstrained());
        assert_eq!(apply_filters(&table, &selection).unwrap().len(), 2);
    }

    #[test]
    fn predicates_are_conjunctive() {
        let table = load_csv(
            b"Program,Status,Reason\n\
              CS,Active,Fees\n\
              CS,Done,Other\n\
              EE,Active,Other\n",
            &NormalizeConfig::default(),
        )
        .unwrap();
        let selection = FilterSelection {
            program: set(&["CS"]),
            reason: set(&["Other"]),
            ..Default::default()
        };
        let filtered = apply_filters(&table, &selection).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.rows[0].get(0), &CellValue::text("CS"));
        assert_eq!(filtered.rows[0].get(2), &CellValue::text("Other"));
    }

    #[test]
    fn status_all_excludes_nothing() {
        let table = scenario();
        let all = FilterSelection {
            status: StatusFilter::All,
            ..Default::default()
        };
        assert_eq!(filtered_indices(&table, &all).unwrap().len(), 3);

        let done = FilterSelection {
            status: StatusFilter::Only(CellValue::text("Done")),
            ..Default::default()
        };
        assert_eq!(filtered_indices(&table, &done).unwrap(), vec![2]);
    }

    #[test]
    fn week_filter_matches_numbers() {
        let table = scenario();
        let selection = FilterSelection {
            week: [CellValue::Number(2.0)].into_iter().collect(),
            ..Default::default()
        };
        assert_eq!(filtered_indices(&table, &selection).unwrap(), vec![2]);
    }

    #[test]
    fn absent_columns_are_skipped() {
        let table = RecordTable::new(
            vec![Column::new("balance", ColumnKind::Number)],
            vec![Record::new(vec![CellValue::Number(5.0)])],
        );
        let selection = FilterSelection {
            program: set(&["CS"]),
            status: StatusFilter::Only(CellValue::text("Active")),
            ..Default::default()
        };
        assert_eq!(apply_filters(&table, &selection).unwrap().len(), 1);
    }

    #[test]
    fn text_value_on_numeric_column_is_rejected() {
        let table = scenario();
        let selection = FilterSelection {
            week: set(&["first"]),
            ..Default::default()
        };
        let err = apply_filters(&table, &selection).unwrap_err();
        assert!(matches!(err, FilterError::IncompatibleValue { ref column, .. } if column == "week"));
    }

    #[test]
    fn filtering_is_idempotent() {
        let table = scenario();
        let selection = FilterSelection {
            program: set(&["CS", "EE"]),
            ..Default::default()
        };
        let once = apply_filters(&table, &selection).unwrap();
        let again = apply_filters(&table, &selection).unwrap();
        assert_eq!(once, again);
        assert_eq!(apply_filters(&once, &selection).unwrap(), once);
    }

    #[test]
    fn signed_zero_balances_are_duplicates() {
        let table = load_csv(b"Program,Balance\nCS,0\nCS,-0\n", &NormalizeConfig::default()).unwrap();
        assert_eq!(table.rows[0], table.rows[1]);
        let filtered = apply_filters(&table, &FilterSelection::default()).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.rows[0].get(1).to_string(), "0");
    }

    #[test]
    fn empty_result_is_not_an_error() {
        let table = scenario();
        let selection = FilterSelection {
            program: set(&["ME"]),
            ..Default::default()
        };
        assert!(apply_filters(&table, &selection).unwrap().is_empty());
    }
}
