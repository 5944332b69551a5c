use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::error::LoadError;
use super::model::{canonical_zero, CellValue, Column, ColumnKind, Record, RecordTable};
use crate::config::NormalizeConfig;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Parse raw CSV content into a normalized [`RecordTable`].
///
/// Steps, in order:
/// 1. parse the delimited text (header row required)
/// 2. normalize column names
/// 3. drop the configured deny-list
/// 4. coerce numeric columns (failures become [`CellValue::Missing`])
/// 5. coerce date columns (same policy)
/// 6. infer the remaining columns; missing text becomes the sentinel
pub fn load_csv(content: &[u8], config: &NormalizeConfig) -> Result<RecordTable, LoadError> {
    let (headers, grid) = parse_grid(content).inspect_err(|e| log::error!("load: {e}"))?;

    let mut columns = Vec::new();
    let mut kept = Vec::new();
    for (idx, raw) in headers.iter().enumerate() {
        let name = normalize_column_name(raw);
        if config.dropped_columns.contains(&name) {
            log::debug!("Dropping column '{name}'");
            continue;
        }
        let cells = grid.iter().map(|row| row[idx].as_str());
        let (kind, values) = coerce_column(&name, cells, config);
        columns.push(Column::new(name, kind));
        kept.push(values);
    }

    let rows = (0..grid.len())
        .map(|r| Record::new(kept.iter().map(|col| col[r].clone()).collect()))
        .collect();
    let table = RecordTable::new(columns, rows);

    log::info!(
        "Loaded {} records with columns {:?}",
        table.len(),
        table.column_names()
    );
    Ok(table)
}

/// Strip surrounding whitespace, lower-case, and turn spaces into underscores.
pub fn normalize_column_name(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

// ---------------------------------------------------------------------------
// CSV parsing
// ---------------------------------------------------------------------------

/// Header plus a rectangular grid of raw cells. Short rows are padded with
/// empty cells; rows wider than the header are rejected.
fn parse_grid(content: &[u8]) -> Result<(Vec<String>, Vec<Vec<String>>), LoadError> {
    let text = std::str::from_utf8(content)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = reader.records();
    let headers: Vec<String> = match records.next() {
        Some(header) => header?.iter().map(|h| h.to_string()).collect(),
        None => return Err(LoadError::MissingHeader),
    };

    let mut grid = Vec::new();
    for (row_no, result) in records.enumerate() {
        let record = result?;
        if record.len() > headers.len() {
            return Err(LoadError::RaggedRow {
                row: row_no + 2,
                expected: headers.len(),
                found: record.len(),
            });
        }
        let mut row: Vec<String> = record.iter().map(|v| v.to_string()).collect();
        row.resize(headers.len(), String::new());
        grid.push(row);
    }

    Ok((headers, grid))
}

// ---------------------------------------------------------------------------
// Type coercion
// ---------------------------------------------------------------------------

fn coerce_column<'a>(
    name: &str,
    cells: impl Iterator<Item = &'a str> + Clone,
    config: &NormalizeConfig,
) -> (ColumnKind, Vec<CellValue>) {
    if config.numeric_columns.iter().any(|c| c == name) {
        let values = coerce_all(name, cells, parse_number, CellValue::Number, "numbers");
        return (ColumnKind::Number, values);
    }
    if config.date_columns.iter().any(|c| c == name) {
        let values = coerce_all(name, cells, parse_date, CellValue::Date, "dates");
        return (ColumnKind::Date, values);
    }

    // Inference: a column is numeric when every present cell is a plain number.
    let numeric = cells
        .clone()
        .filter(|c| !is_na_token(c))
        .all(|c| parse_plain_number(c).is_some());
    if numeric {
        let values = cells
            .map(|c| parse_plain_number(c).map_or(CellValue::Missing, CellValue::Number))
            .collect();
        return (ColumnKind::Number, values);
    }

    let values = cells
        .map(|c| {
            if is_na_token(c) {
                CellValue::text(config.text_sentinel.as_str())
            } else {
                CellValue::text(c)
            }
        })
        .collect();
    (ColumnKind::Text, values)
}

fn coerce_all<'a, T>(
    name: &str,
    cells: impl Iterator<Item = &'a str>,
    parse: fn(&str) -> Option<T>,
    wrap: fn(T) -> CellValue,
    what: &str,
) -> Vec<CellValue> {
    let mut rejected = 0usize;
    let values: Vec<CellValue> = cells
        .map(|c| match parse(c) {
            Some(v) => wrap(v),
            None => {
                if !is_na_token(c.trim()) {
                    rejected += 1;
                }
                CellValue::Missing
            }
        })
        .collect();
    if rejected > 0 {
        log::warn!("{rejected} value(s) in '{name}' could not be parsed as {what}; treated as missing");
    }
    values
}

/// Tokens the CSV reader treats as "no value". Matched exactly, so a
/// whitespace-only cell in a text column is kept as written.
fn is_na_token(s: &str) -> bool {
    matches!(
        s,
        "" | "NA"
            | "N/A"
            | "n/a"
            | "NaN"
            | "nan"
            | "-NaN"
            | "null"
            | "NULL"
            | "None"
            | "#N/A"
            | "<NA>"
    )
}

fn parse_plain_number(s: &str) -> Option<f64> {
    s.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(canonical_zero)
}

/// Lenient number parsing for designated numeric columns: accepts
/// thousands separators such as `1,000`.
pub fn parse_number(s: &str) -> Option<f64> {
    let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    parse_plain_number(&cleaned)
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%d-%b-%Y", "%d %b %Y", "%B %d, %Y"];

pub fn parse_date(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_local())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(text: &str) -> RecordTable {
        load_csv(text.as_bytes(), &NormalizeConfig::default()).unwrap()
    }

    #[test]
    fn normalizes_scenario_file() {
        let table = load(
            "Program, Status ,Reason,Week,Balance\n\
             CS,Active,Fees,1,\"1,000\"\n\
             CS,Active,Fees,1,\"1,000\"\n\
             EE,Done,Other,2,abc\n",
        );
        assert_eq!(table.len(), 3);
        assert_eq!(
            table.column_names(),
            vec!["program", "status", "reason", "week", "balance"]
        );
        let balance: Vec<_> = table.column_values("balance").unwrap().cloned().collect();
        assert_eq!(
            balance,
            vec![
                CellValue::Number(1000.0),
                CellValue::Number(1000.0),
                CellValue::Missing
            ]
        );
        assert_eq!(table.column("week").unwrap().kind, ColumnKind::Number);
        assert_eq!(table.column("program").unwrap().kind, ColumnKind::Text);
    }

    #[test]
    fn column_name_normalization_is_idempotent() {
        for raw in ["  Follow Up By ", "No of Semester", "balance", "Sr Number\t", "ÄB C"] {
            let once = normalize_column_name(raw);
            assert_eq!(normalize_column_name(&once), once);
        }
        assert_eq!(normalize_column_name("  Follow Up By "), "follow_up_by");
    }

    #[test]
    fn numeric_columns_never_hold_text() {
        let table = load(
            "No of Follow Up,Sr Number,Week,Name\n\
             three,1,x,Ali\n\
             2,,4,Sara\n\
             NA, 7 ,5,\n",
        );
        for col in ["no_of_follow_up", "sr_number", "week"] {
            assert_eq!(table.column(col).unwrap().kind, ColumnKind::Number);
            for v in table.column_values(col).unwrap() {
                assert!(matches!(v, CellValue::Number(_) | CellValue::Missing), "{col}: {v:?}");
            }
        }
        let sr: Vec<_> = table.column_values("sr_number").unwrap().cloned().collect();
        assert_eq!(
            sr,
            vec![CellValue::Number(1.0), CellValue::Missing, CellValue::Number(7.0)]
        );
    }

    #[test]
    fn missing_text_becomes_sentinel() {
        let table = load("Program,Remarks\nCS,\n,called twice\n");
        let program: Vec<_> = table.column_values("program").unwrap().cloned().collect();
        assert_eq!(program, vec![CellValue::text("CS"), CellValue::text("N/A")]);
        let remarks: Vec<_> = table.column_values("remarks").unwrap().cloned().collect();
        assert_eq!(remarks, vec![CellValue::text("N/A"), CellValue::text("called twice")]);
    }

    #[test]
    fn whitespace_text_is_kept_verbatim() {
        let table = load("Program,Remarks,Week\nCS, ,\nEE,ok, \n");
        assert_eq!(table.column("remarks").unwrap().kind, ColumnKind::Text);
        let remarks: Vec<_> = table.column_values("remarks").unwrap().cloned().collect();
        assert_eq!(remarks, vec![CellValue::text(" "), CellValue::text("ok")]);
        // Designated numeric columns still read blanks as missing.
        assert!(table.column_values("week").unwrap().all(|v| v.is_missing()));
    }

    #[test]
    fn all_empty_undesignated_column_stays_missing() {
        let table = load("Program,Remarks\nCS,\nEE,\n");
        assert_eq!(table.column("remarks").unwrap().kind, ColumnKind::Number);
        assert!(table.column_values("remarks").unwrap().all(|v| v.is_missing()));
    }

    #[test]
    fn dates_are_coerced_or_missing() {
        let table = load(
            "Follow Up Date,Date\n\
             2024-02-03,03/15/2024\n\
             not a date,2024-03-15 09:30:00\n",
        );
        let follow: Vec<_> = table.column_values("follow_up_date").unwrap().cloned().collect();
        let expected = NaiveDate::from_ymd_opt(2024, 2, 3)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(follow, vec![CellValue::Date(expected), CellValue::Missing]);
        let dates: Vec<_> = table.column_values("date").unwrap().cloned().collect();
        assert!(dates.iter().all(|v| matches!(v, CellValue::Date(_))));
    }

    #[test]
    fn deny_listed_columns_are_dropped() {
        let table = load(
            "Program,Current Week Absent Percent,Accumulative Absent Percent 80 Percent\n\
             CS,10,90\n",
        );
        assert_eq!(table.column_names(), vec!["program"]);
    }

    #[test]
    fn short_rows_are_padded_and_long_rows_rejected() {
        let table = load("Program,Status\nCS\nEE,Active\n");
        assert_eq!(table.rows[0].get(1), &CellValue::text("N/A"));
        assert_eq!(table.rows[1].get(1), &CellValue::text("Active"));

        let err = load_csv(b"Program,Status\nCS,Active,extra\n", &NormalizeConfig::default())
            .unwrap_err();
        assert!(matches!(err, LoadError::RaggedRow { row: 2, expected: 2, found: 3 }));
    }

    #[test]
    fn rejects_empty_and_binary_content() {
        let cfg = NormalizeConfig::default();
        assert!(matches!(load_csv(b"", &cfg), Err(LoadError::MissingHeader)));
        assert!(matches!(
            load_csv(&[0xff, 0xfe, 0x00, 0x41], &cfg),
            Err(LoadError::Encoding(_))
        ));
    }

    #[test]
    fn lenient_number_parsing() {
        assert_eq!(parse_number(" 12,500 "), Some(12500.0));
        assert_eq!(parse_number("-3.5"), Some(-3.5));
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number(","), None);
        assert_eq!(parse_number("inf"), None);
    }
}
