use std::collections::{BTreeMap, HashMap};

use super::error::SummaryError;
use super::filter::STATUS;
use super::model::{format_number, CellValue, ColumnKind, RecordTable};

pub const BALANCE: &str = "balance";
pub const NO_OF_FOLLOW_UP: &str = "no_of_follow_up";
pub const REMARKS: &str = "remarks";
pub const FOLLOW_UP_BY: &str = "follow_up_by";

const UNAVAILABLE: &str = "unavailable";

// ---------------------------------------------------------------------------
// Column access helpers
// ---------------------------------------------------------------------------

/// Whether `column` is present, failing when it exists with another kind.
fn require_kind(table: &RecordTable, column: &str, expected: ColumnKind) -> Result<bool, SummaryError> {
    match table.column(column) {
        None => Ok(false),
        Some(col) if col.kind == expected => Ok(true),
        Some(col) => Err(SummaryError::WrongKind {
            column: column.to_string(),
            expected,
            found: col.kind,
        }),
    }
}

/// Non-missing numbers of a numeric column. `Ok(None)` when the column is
/// absent, an error when it exists but is not numeric.
fn numeric_values(table: &RecordTable, column: &str) -> Result<Option<Vec<f64>>, SummaryError> {
    if !require_kind(table, column, ColumnKind::Number)? {
        return Ok(None);
    }
    Ok(table
        .column_values(column)
        .map(|values| values.filter_map(CellValue::as_f64).collect()))
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// `1234567.8` → `"1,234,568"`.
pub fn format_thousands(v: f64) -> String {
    let rounded = v.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if rounded < 0.0 {
        out.insert(0, '-');
    }
    out
}

// ---------------------------------------------------------------------------
// KPI summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct KpiSummary {
    pub total_records: usize,
    /// Mean of `balance`; `None` when the column is absent or has no numbers.
    pub avg_balance: Option<f64>,
    /// Sum of `no_of_follow_up`; `None` when the column is absent.
    pub total_follow_ups: Option<f64>,
}

impl KpiSummary {
    pub fn avg_balance_label(&self, currency: &str) -> String {
        match self.avg_balance {
            Some(v) if currency.is_empty() => format_thousands(v),
            Some(v) => format!("{} {currency}", format_thousands(v)),
            None => UNAVAILABLE.to_string(),
        }
    }

    pub fn total_follow_ups_label(&self) -> String {
        match self.total_follow_ups {
            Some(v) => format_number(v),
            None => UNAVAILABLE.to_string(),
        }
    }
}

/// `Ok(None)` for an empty table.
pub fn kpi_summary(table: &RecordTable) -> Result<Option<KpiSummary>, SummaryError> {
    if table.is_empty() {
        return Ok(None);
    }
    let avg_balance = numeric_values(table, BALANCE)?.and_then(|v| mean(&v));
    let total_follow_ups = numeric_values(table, NO_OF_FOLLOW_UP)?.map(|v| v.iter().sum());
    Ok(Some(KpiSummary {
        total_records: table.len(),
        avg_balance,
        total_follow_ups,
    }))
}

// ---------------------------------------------------------------------------
// Category frequencies
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryCount {
    pub value: CellValue,
    pub count: usize,
    /// Share of all non-missing values, rounded to one decimal place.
    pub percent: f64,
}

/// Count every distinct non-missing value of `column`, most frequent first.
/// Ties keep the order in which values were first seen.
pub fn category_frequencies(table: &RecordTable, column: &str) -> Vec<CategoryCount> {
    let Some(values) = table.column_values(column) else {
        return Vec::new();
    };

    let mut order: Vec<(CellValue, usize)> = Vec::new();
    let mut slot: HashMap<&CellValue, usize> = HashMap::new();
    for value in values.filter(|v| !v.is_missing()) {
        match slot.get(value) {
            Some(&i) => order[i].1 += 1,
            None => {
                slot.insert(value, order.len());
                order.push((value.clone(), 1));
            }
        }
    }
    order.sort_by(|a, b| b.1.cmp(&a.1));

    let total: usize = order.iter().map(|(_, n)| n).sum();
    order
        .into_iter()
        .map(|(value, count)| CategoryCount {
            value,
            count,
            percent: round1(count as f64 / total as f64 * 100.0),
        })
        .collect()
}

/// Rows per `follow_up_by`, busiest person first.
pub fn follow_ups_by_person(table: &RecordTable) -> Vec<CategoryCount> {
    category_frequencies(table, FOLLOW_UP_BY)
}

// ---------------------------------------------------------------------------
// Balance histogram
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

impl HistogramBin {
    pub fn center(&self) -> f64 {
        (self.start + self.end) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.end - self.start
    }
}

/// Split `values` into `bins` equal-width buckets over their observed range.
/// The last bucket is closed on the right. A zero-width range yields a
/// single bucket holding every value.
pub fn histogram(column: &str, values: &[f64], bins: usize) -> Result<Vec<HistogramBin>, SummaryError> {
    if bins == 0 {
        return Err(SummaryError::NoBins);
    }
    if values.is_empty() {
        return Ok(Vec::new());
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    if !range.is_finite() {
        return Err(SummaryError::UnbinnableRange {
            column: column.to_string(),
        });
    }
    if range == 0.0 {
        return Ok(vec![HistogramBin {
            start: min,
            end: max,
            count: values.len(),
        }]);
    }

    let width = range / bins as f64;
    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            start: min + width * i as f64,
            end: if i + 1 == bins { max } else { min + width * (i + 1) as f64 },
            count: 0,
        })
        .collect();
    for v in values {
        let idx = (((v - min) / width).floor() as usize).min(bins - 1);
        out[idx].count += 1;
    }
    Ok(out)
}

pub fn balance_histogram(table: &RecordTable, bins: usize) -> Result<Vec<HistogramBin>, SummaryError> {
    match numeric_values(table, BALANCE)? {
        Some(values) => histogram(BALANCE, &values, bins),
        None => Ok(Vec::new()),
    }
}

// ---------------------------------------------------------------------------
// Mean balance by status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct GroupMean {
    pub key: CellValue,
    pub mean: f64,
    pub count: usize,
}

/// Mean non-missing `balance` per `status`, in ascending status order.
pub fn mean_balance_by_status(table: &RecordTable) -> Result<Vec<GroupMean>, SummaryError> {
    require_kind(table, BALANCE, ColumnKind::Number)?;
    let (Some(status_idx), Some(balance_idx)) =
        (table.column_index(STATUS), table.column_index(BALANCE))
    else {
        return Ok(Vec::new());
    };

    let mut groups: BTreeMap<&CellValue, (f64, usize)> = BTreeMap::new();
    for record in &table.rows {
        let status = record.get(status_idx);
        if status.is_missing() {
            continue;
        }
        if let Some(balance) = record.get(balance_idx).as_f64() {
            let entry = groups.entry(status).or_insert((0.0, 0));
            entry.0 += balance;
            entry.1 += 1;
        }
    }

    Ok(groups
        .into_iter()
        .map(|(key, (sum, count))| GroupMean {
            key: key.clone(),
            mean: sum / count as f64,
            count,
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Remarks text for the word cloud
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemarksText {
    Text(String),
    NoData,
}

/// Space-join every non-missing remark.
pub fn remarks_text(table: &RecordTable) -> RemarksText {
    let Some(values) = table.column_values(REMARKS) else {
        return RemarksText::NoData;
    };
    let text = values
        .filter(|v| !v.is_missing())
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    if text.trim().is_empty() {
        RemarksText::NoData
    } else {
        RemarksText::Text(text)
    }
}

const STOP_WORDS: &[&str] = &[
    "a", "about", "after", "again", "all", "also", "am", "an", "and", "any", "are", "as", "at",
    "be", "been", "before", "but", "by", "can", "could", "did", "do", "does", "for", "from",
    "had", "has", "have", "he", "her", "him", "his", "how", "i", "if", "in", "into", "is", "it",
    "its", "me", "my", "no", "not", "of", "on", "or", "our", "she", "so", "than", "that", "the",
    "their", "them", "then", "there", "they", "this", "to", "too", "up", "us", "was", "we",
    "were", "what", "when", "which", "who", "will", "with", "would", "you", "your",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermCount {
    pub term: String,
    pub count: usize,
}

/// Word frequencies for the word cloud: lower-cased alphanumeric words of
/// two or more characters, stop words removed, most frequent first.
pub fn term_frequencies(text: &str, limit: usize) -> Vec<TermCount> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for word in text
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .map(|w| w.trim_matches('\'').to_lowercase())
        .filter(|w| w.chars().count() >= 2 && !STOP_WORDS.contains(&w.as_str()))
    {
        *counts.entry(word).or_insert(0) += 1;
    }

    let mut terms: Vec<TermCount> = counts
        .into_iter()
        .map(|(term, count)| TermCount { term, count })
        .collect();
    terms.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.term.cmp(&b.term)));
    terms.truncate(limit);
    terms
}
