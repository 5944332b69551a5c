use std::collections::BTreeSet;
use std::fmt;

use chrono::{NaiveDateTime, Timelike};

// ---------------------------------------------------------------------------
// CellValue – a single cell of the record table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value.
/// Used in `BTreeSet` filter selections, so `CellValue` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Date(NaiveDateTime),
    Text(String),
    Missing,
}

// -- Manual Eq/Ord/Hash so we can put CellValue in BTreeSet / HashSet --

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Missing => 0,
                Number(_) => 1,
                Date(_) => 2,
                Text(_) => 3,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Missing, Missing) => std::cmp::Ordering::Equal,
            (Number(a), Number(b)) if a == b => std::cmp::Ordering::Equal,
            (Number(a), Number(b)) => a.total_cmp(b),
            (Date(a), Date(b)) => a.cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::Number(v) => canonical_zero(*v).to_bits().hash(state),
            CellValue::Date(d) => d.hash(state),
            CellValue::Text(s) => s.hash(state),
            CellValue::Missing => {}
        }
    }
}

// `PartialEq` is derived, so `0.0 == -0.0`. `Ord` and `Hash` treat the two
// zeros as one value to agree with it. Parsed numbers are never NaN.

/// Map `-0.0` to `0.0`, leaving every other value untouched.
pub fn canonical_zero(v: f64) -> f64 {
    if v == 0.0 {
        0.0
    } else {
        v
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(v) => write!(f, "{}", format_number(*v)),
            CellValue::Date(d) => write!(f, "{}", format_date(d)),
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Missing => Ok(()),
        }
    }
}

impl CellValue {
    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }

    /// Whether this value could legitimately appear in a column of `kind`.
    /// `Missing` fits everywhere.
    pub fn fits(&self, kind: ColumnKind) -> bool {
        matches!(
            (self, kind),
            (CellValue::Missing, _)
                | (CellValue::Number(_), ColumnKind::Number)
                | (CellValue::Date(_), ColumnKind::Date)
                | (CellValue::Text(_), ColumnKind::Text)
        )
    }
}

/// Integral numbers print without decimals, everything else in shortest form.
pub fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

pub fn format_date(d: &NaiveDateTime) -> String {
    if d.hour() == 0 && d.minute() == 0 && d.second() == 0 && d.nanosecond() == 0 {
        d.format("%Y-%m-%d").to_string()
    } else {
        d.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

// ---------------------------------------------------------------------------
// Column schema
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Number,
    Date,
    Text,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnKind::Number => "number",
            ColumnKind::Date => "date",
            ColumnKind::Text => "text",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Column {
            name: name.into(),
            kind,
        }
    }
}

// ---------------------------------------------------------------------------
// Record – one row of the table
// ---------------------------------------------------------------------------

/// A single follow-up record; one value per table column, in column order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Record {
    pub values: Vec<CellValue>,
}

impl Record {
    pub fn new(values: Vec<CellValue>) -> Self {
        Record { values }
    }

    pub fn get(&self, idx: usize) -> &CellValue {
        self.values.get(idx).unwrap_or(&CellValue::Missing)
    }
}

// ---------------------------------------------------------------------------
// RecordTable – the complete loaded dataset
// ---------------------------------------------------------------------------

/// Schema-on-read table. Never mutated after construction; filtering
/// builds a new table that shares the column list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RecordTable {
    pub columns: Vec<Column>,
    pub rows: Vec<Record>,
}

impl RecordTable {
    pub fn new(columns: Vec<Column>, rows: Vec<Record>) -> Self {
        RecordTable { columns, rows }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no records.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Position of the first column called `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Every value of `name`, in row order, or `None` if the column is absent.
    pub fn column_values(&self, name: &str) -> Option<impl Iterator<Item = &CellValue> + '_> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |r| r.get(idx)))
    }

    /// Sorted distinct non-missing values of a column (the filter options).
    pub fn unique_values(&self, name: &str) -> BTreeSet<CellValue> {
        self.column_values(name)
            .map(|values| values.filter(|v| !v.is_missing()).cloned().collect())
            .unwrap_or_default()
    }

    /// A new table with the same columns and the given rows.
    pub fn with_rows(&self, rows: Vec<Record>) -> RecordTable {
        RecordTable {
            columns: self.columns.clone(),
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn ordering_groups_by_variant_then_value() {
        let mut set = BTreeSet::new();
        set.insert(CellValue::text("b"));
        set.insert(CellValue::Number(2.0));
        set.insert(CellValue::Missing);
        set.insert(CellValue::text("a"));
        set.insert(CellValue::Number(-1.0));
        let ordered: Vec<_> = set.into_iter().collect();
        assert_eq!(
            ordered,
            vec![
                CellValue::Missing,
                CellValue::Number(-1.0),
                CellValue::Number(2.0),
                CellValue::text("a"),
                CellValue::text("b"),
            ]
        );
    }

    #[test]
    fn display_drops_trailing_zero_fraction() {
        assert_eq!(CellValue::Number(1000.0).to_string(), "1000");
        assert_eq!(CellValue::Number(2.5).to_string(), "2.5");
        assert_eq!(CellValue::Missing.to_string(), "");

        let midnight = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(CellValue::Date(midnight).to_string(), "2024-03-01");
        let afternoon = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(14, 5, 9)
            .unwrap();
        assert_eq!(CellValue::Date(afternoon).to_string(), "2024-03-01 14:05:09");
    }

    #[test]
    fn unique_values_skip_missing_and_absent_columns() {
        let table = RecordTable::new(
            vec![Column::new("week", ColumnKind::Number)],
            vec![
                Record::new(vec![CellValue::Number(2.0)]),
                Record::new(vec![CellValue::Missing]),
                Record::new(vec![CellValue::Number(1.0)]),
                Record::new(vec![CellValue::Number(2.0)]),
            ],
        );
        let weeks: Vec<_> = table.unique_values("week").into_iter().collect();
        assert_eq!(weeks, vec![CellValue::Number(1.0), CellValue::Number(2.0)]);
        assert!(table.unique_values("program").is_empty());
        assert!(table.column_values("program").is_none());
    }

    #[test]
    fn signed_zeros_are_one_value() {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let hash = |v: &CellValue| {
            let mut h = DefaultHasher::new();
            v.hash(&mut h);
            h.finish()
        };
        let pos = CellValue::Number(0.0);
        let neg = CellValue::Number(-0.0);
        assert_eq!(pos, neg);
        assert_eq!(pos.cmp(&neg), std::cmp::Ordering::Equal);
        assert_eq!(hash(&pos), hash(&neg));
        assert_eq!([pos, neg].into_iter().collect::<BTreeSet<_>>().len(), 1);
    }

    #[test]
    fn fits_matches_column_kind() {
        assert!(CellValue::Number(1.0).fits(ColumnKind::Number));
        assert!(!CellValue::text("1").fits(ColumnKind::Number));
        assert!(CellValue::Missing.fits(ColumnKind::Date));
    }
}
