mod app;
mod color;
mod config;
mod dashboard;
mod data;
mod report;
mod state;
mod ui;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use app::FollowupDashboardApp;
use clap::Parser;
use config::DashboardConfig;
use data::cache::SessionCache;
use data::filter::{FilterSelection, StatusFilter, ALL_STATUSES, PROGRAM, REASON, STATUS, WEEK};
use data::loader::parse_number;
use data::model::{CellValue, ColumnKind, RecordTable};
use eframe::egui;
use state::AppState;

#[derive(Parser)]
#[command(name = "followup-dashboard")]
#[command(about = "Explore student follow-up records: filters, KPIs and charts", long_about = None)]
struct Cli {
    /// Follow-up CSV to open
    file: Option<PathBuf>,
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Append log records to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
    /// Print a Markdown summary instead of opening the dashboard
    #[arg(long)]
    summary: bool,
    /// Write the filtered records to this CSV instead of opening the dashboard
    #[arg(long)]
    export: Option<PathBuf>,
    #[arg(long)]
    program: Vec<String>,
    /// Status to keep, or "All"
    #[arg(long, default_value = ALL_STATUSES)]
    status: String,
    #[arg(long)]
    reason: Vec<String>,
    #[arg(long)]
    week: Vec<String>,
}

impl Cli {
    fn headless(&self) -> bool {
        self.summary || self.export.is_some()
    }

    /// Selection from the command line, typed against the loaded columns.
    fn selection(&self, table: &RecordTable) -> FilterSelection {
        FilterSelection {
            program: typed_values(table, PROGRAM, &self.program),
            status: match self.status.as_str() {
                ALL_STATUSES => StatusFilter::All,
                label => StatusFilter::Only(typed_value(table, STATUS, label)),
            },
            reason: typed_values(table, REASON, &self.reason),
            week: typed_values(table, WEEK, &self.week),
        }
    }
}

/// A command-line value becomes a number when the column is numeric.
fn typed_value(table: &RecordTable, column: &str, raw: &str) -> CellValue {
    let numeric = table.column(column).map(|c| c.kind) == Some(ColumnKind::Number);
    match parse_number(raw) {
        Some(v) if numeric => CellValue::Number(v),
        _ => CellValue::text(raw),
    }
}

fn typed_values(table: &RecordTable, column: &str, raws: &[String]) -> BTreeSet<CellValue> {
    raws.iter().map(|raw| typed_value(table, column, raw)).collect()
}

fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    builder.format_timestamp_secs();
    if let Some(path) = log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn run_headless(cli: &Cli, config: &DashboardConfig) -> Result<()> {
    let path = cli
        .file
        .as_deref()
        .context("a CSV file is required with --summary or --export")?;
    let content = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;

    let mut cache = SessionCache::new();
    let (key, table) = cache
        .load(&content, &config.normalize)
        .with_context(|| format!("loading {}", path.display()))?;
    let filtered = cache
        .filter(key, &table, &cli.selection(&table))
        .context("applying filters")?;

    if let Some(out) = &cli.export {
        data::export::save_csv(&filtered, out)?;
        println!("Wrote {} records to {}.", filtered.len(), out.display());
    }
    if cli.summary {
        let widgets = dashboard::build_widgets(&filtered, config);
        let report = report::build_report(
            &path.display().to_string(),
            table.len(),
            &filtered,
            &widgets,
            config,
        );
        print!("{report}");
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = DashboardConfig::load_or_default(cli.config.as_deref())?;
    init_logging(cli.log_file.as_deref().or(config.log_file.as_deref()))?;

    if cli.headless() {
        return run_headless(&cli, &config);
    }

    let mut state = AppState::new(config);
    if let Some(path) = &cli.file {
        // A failed load is shown in the top bar.
        let _ = state.load_path(path);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([700.0, 450.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Student Follow-up Dashboard",
        options,
        Box::new(move |cc| Ok(Box::new(FollowupDashboardApp::new(cc, state)))),
    )
    .map_err(|e| anyhow::anyhow!("running dashboard: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NormalizeConfig;
    use crate::data::loader::load_csv;

    #[test]
    fn cli_selection_types_values_by_column() {
        let cli = Cli::parse_from([
            "followup-dashboard",
            "f.csv",
            "--summary",
            "--program",
            "CS",
            "--week",
            "2",
            "--status",
            "Active",
        ]);
        assert!(cli.headless());
        let table = load_csv(b"Program,Status,Week\nCS,Active,2\n", &NormalizeConfig::default())
            .unwrap();
        let selection = cli.selection(&table);
        assert!(selection.program.contains(&CellValue::text("CS")));
        assert!(selection.week.contains(&CellValue::Number(2.0)));
        assert_eq!(selection.status, StatusFilter::Only(CellValue::text("Active")));
        assert!(selection.reason.is_empty());
    }

    #[test]
    fn numeric_status_column_filters_by_number() {
        let cli = Cli::parse_from(["followup-dashboard", "f.csv", "--export", "out.csv", "--status", "2"]);
        let table = load_csv(b"Program,Status\nCS,1\nEE,2\n", &NormalizeConfig::default()).unwrap();
        let selection = cli.selection(&table);
        assert_eq!(selection.status, StatusFilter::Only(CellValue::Number(2.0)));
        let filtered = data::filter::apply_filters(&table, &selection).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.rows[0].get(0), &CellValue::text("EE"));
    }

    #[test]
    fn status_defaults_to_all() {
        let cli = Cli::parse_from(["followup-dashboard"]);
        assert!(!cli.headless());
        let table = load_csv(b"Status\nActive\n", &NormalizeConfig::default()).unwrap();
        assert_eq!(cli.selection(&table).status, StatusFilter::All);
    }
}
