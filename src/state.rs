use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use crate::config::DashboardConfig;
use crate::dashboard::{build_widgets, Widget};
use crate::data::cache::{Fingerprint, SessionCache};
use crate::data::error::LoadError;
use crate::data::export;
use crate::data::filter::{init_selection, FilterSelection, StatusFilter, PROGRAM, REASON, STATUS, WEEK};
use crate::data::model::{CellValue, RecordTable};

// ---------------------------------------------------------------------------
// Multiselect filters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterColumn {
    Program,
    Reason,
    Week,
}

impl FilterColumn {
    pub const ALL: [FilterColumn; 3] = [FilterColumn::Program, FilterColumn::Reason, FilterColumn::Week];

    pub fn column(self) -> &'static str {
        match self {
            FilterColumn::Program => PROGRAM,
            FilterColumn::Reason => REASON,
            FilterColumn::Week => WEEK,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FilterColumn::Program => "Select Program",
            FilterColumn::Reason => "Select Reason",
            FilterColumn::Week => "Select Week",
        }
    }

    fn selected_mut(self, selection: &mut FilterSelection) -> &mut BTreeSet<CellValue> {
        match self {
            FilterColumn::Program => &mut selection.program,
            FilterColumn::Reason => &mut selection.reason,
            FilterColumn::Week => &mut selection.week,
        }
    }

    pub fn selected(self, selection: &FilterSelection) -> &BTreeSet<CellValue> {
        match self {
            FilterColumn::Program => &selection.program,
            FilterColumn::Reason => &selection.reason,
            FilterColumn::Week => &selection.week,
        }
    }
}

/// Options offered by one multiselect plus its search box.
#[derive(Debug, Clone, Default)]
pub struct MultiSelect {
    pub options: Vec<CellValue>,
    pub search: String,
}

impl MultiSelect {
    /// Options whose label contains the search text, case-insensitively.
    pub fn visible(&self) -> Vec<&CellValue> {
        let needle = self.search.to_lowercase();
        self.options
            .iter()
            .filter(|v| v.to_string().to_lowercase().contains(&needle))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    /// Session memo of loaded/filtered tables.
    cache: SessionCache,

    /// Loaded dataset (None until user loads a file) and its fingerprint.
    pub dataset: Option<(Fingerprint, Arc<RecordTable>)>,

    /// Display name of the loaded file.
    pub source_name: Option<String>,

    pub multiselects: [MultiSelect; 3],

    /// Status radio options, in order of first appearance.
    pub statuses: Vec<CellValue>,

    pub selection: FilterSelection,

    /// Result of the current selection (cached).
    pub filtered: Option<Arc<RecordTable>>,

    /// Dashboard widgets built from `filtered`.
    pub widgets: Vec<Widget>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    pub dark_mode: bool,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            cache: SessionCache::new(),
            dataset: None,
            source_name: None,
            multiselects: Default::default(),
            statuses: Vec::new(),
            selection: FilterSelection::default(),
            filtered: None,
            widgets: Vec::new(),
            status_message: None,
            dark_mode: false,
        }
    }

    pub fn table(&self) -> Option<&Arc<RecordTable>> {
        self.dataset.as_ref().map(|(_, table)| table)
    }

    pub fn multiselect(&self, column: FilterColumn) -> &MultiSelect {
        &self.multiselects[column as usize]
    }

    /// Load uploaded content. A failure drops the current dataset: with no
    /// data there is nothing to show.
    pub fn load_bytes(&mut self, name: &str, content: &[u8]) -> Result<(), LoadError> {
        match self.cache.load(content, &self.config.normalize) {
            Ok((key, table)) => {
                log::info!("Data loaded successfully from {name}");
                self.source_name = Some(name.to_string());
                self.set_dataset(key, table);
                Ok(())
            }
            Err(e) => Err(self.fail_load(e)),
        }
    }

    pub fn load_path(&mut self, path: &Path) -> Result<(), LoadError> {
        let name = path.display().to_string();
        match std::fs::read(path) {
            Ok(content) => self.load_bytes(&name, &content),
            Err(source) => Err(self.fail_load(LoadError::Io { path: name, source })),
        }
    }

    /// Drop the whole session after a failed load and report `e`.
    fn fail_load(&mut self, e: LoadError) -> LoadError {
        log::error!("Data load error: {e}");
        self.status_message = Some(format!("Error loading data: {e}"));
        self.dataset = None;
        self.source_name = None;
        self.multiselects = Default::default();
        self.statuses.clear();
        self.selection = FilterSelection::default();
        self.filtered = None;
        self.widgets.clear();
        e
    }

    /// Ingest a newly loaded dataset and initialise filters with every
    /// option selected.
    fn set_dataset(&mut self, key: Fingerprint, table: Arc<RecordTable>) {
        for column in FilterColumn::ALL {
            self.multiselects[column as usize] = MultiSelect {
                options: table.unique_values(column.column()).into_iter().collect(),
                search: String::new(),
            };
        }
        self.statuses = Vec::new();
        if let Some(values) = table.column_values(STATUS) {
            for v in values.filter(|v| !v.is_missing()) {
                if !self.statuses.contains(v) {
                    self.statuses.push(v.clone());
                }
            }
        }
        self.selection = init_selection(&table);
        self.dataset = Some((key, table));
        self.status_message = None;
        self.refilter();
    }

    /// Recompute the filtered table and the widgets after a filter change.
    pub fn refilter(&mut self) {
        let Some((key, table)) = &self.dataset else {
            return;
        };
        match self.cache.filter(*key, table, &self.selection) {
            Ok(filtered) => {
                self.widgets = build_widgets(&filtered, &self.config);
                self.filtered = Some(filtered);
                self.status_message = None;
            }
            Err(e) => {
                self.status_message = Some(format!("Error applying filters: {e}"));
                self.filtered = None;
                self.widgets.clear();
            }
        }
    }

    /// Change the search text; the selection follows the visible options.
    pub fn set_search(&mut self, column: FilterColumn, search: String) {
        let ms = &mut self.multiselects[column as usize];
        if ms.search == search {
            return;
        }
        ms.search = search;
        let visible: BTreeSet<CellValue> = ms.visible().into_iter().cloned().collect();
        *column.selected_mut(&mut self.selection) = visible;
        self.refilter();
    }

    /// Toggle a single value in a multiselect.
    pub fn toggle_filter_value(&mut self, column: FilterColumn, value: &CellValue) {
        let selected = column.selected_mut(&mut self.selection);
        if selected.contains(value) {
            selected.remove(value);
        } else {
            selected.insert(value.clone());
        }
        self.refilter();
    }

    /// Select every option currently visible through the search box.
    pub fn select_all(&mut self, column: FilterColumn) {
        let visible: BTreeSet<CellValue> = self.multiselects[column as usize]
            .visible()
            .into_iter()
            .cloned()
            .collect();
        *column.selected_mut(&mut self.selection) = visible;
        self.refilter();
    }

    /// Deselect every value. An empty multiselect does not constrain rows.
    pub fn select_none(&mut self, column: FilterColumn) {
        column.selected_mut(&mut self.selection).clear();
        self.refilter();
    }

    pub fn set_status(&mut self, status: StatusFilter) {
        if self.selection.status != status {
            self.selection.status = status;
            self.refilter();
        }
    }

    pub fn export_filtered(&self, path: &Path) -> Result<()> {
        match &self.filtered {
            Some(table) => export::save_csv(table, path),
            None => anyhow::bail!("no filtered data to export"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &[u8] = b"Program,Status,Reason,Week,Balance\n\
                         CS,Active,Fees,1,1000\n\
                         CS,Active,Fees,1,1000\n\
                         EE,Done,Other,2,abc\n\
                         BBA,Active,Attendance,3,500\n";

    fn loaded() -> AppState {
        let mut state = AppState::new(DashboardConfig::default());
        state.load_bytes("followups.csv", CSV).unwrap();
        state
    }

    fn filtered_len(state: &AppState) -> usize {
        state.filtered.as_ref().map_or(0, |t| t.len())
    }

    #[test]
    fn loading_selects_every_option() {
        let state = loaded();
        assert_eq!(state.selection.program.len(), 3);
        assert_eq!(state.selection.week.len(), 3);
        assert_eq!(state.selection.status, StatusFilter::All);
        assert_eq!(state.statuses, vec![CellValue::text("Active"), CellValue::text("Done")]);
        assert_eq!(filtered_len(&state), 3);
        assert!(!state.widgets.is_empty());
    }

    #[test]
    fn clearing_a_multiselect_shows_everything() {
        let mut state = loaded();
        state.select_none(FilterColumn::Program);
        assert!(state.selection.program.is_empty());
        assert_eq!(filtered_len(&state), 3);
    }

    #[test]
    fn toggling_and_status_narrow_the_result() {
        let mut state = loaded();
        state.toggle_filter_value(FilterColumn::Program, &CellValue::text("CS"));
        assert_eq!(filtered_len(&state), 2);
        state.set_status(StatusFilter::Only(CellValue::text("Done")));
        assert_eq!(filtered_len(&state), 1);
        state.set_status(StatusFilter::All);
        assert_eq!(filtered_len(&state), 2);
    }

    #[test]
    fn search_narrows_options_and_selection() {
        let mut state = loaded();
        state.set_search(FilterColumn::Program, "c".into());
        let visible: Vec<_> = state
            .multiselect(FilterColumn::Program)
            .visible()
            .into_iter()
            .map(|v| v.to_string())
            .collect();
        assert_eq!(visible, vec!["CS"]);
        assert_eq!(filtered_len(&state), 1);

        state.set_search(FilterColumn::Program, String::new());
        assert_eq!(state.selection.program.len(), 3);
        state.select_none(FilterColumn::Program);
        state.select_all(FilterColumn::Program);
        assert_eq!(state.selection.program.len(), 3);
    }

    #[test]
    fn failed_load_clears_the_session() {
        let mut state = loaded();
        assert!(state.load_bytes("broken.csv", b"a,b\n1,2,3\n").is_err());
        assert!(state.dataset.is_none());
        assert!(state.filtered.is_none());
        assert!(state.status_message.as_deref().unwrap().starts_with("Error loading data"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let mut state = AppState::new(DashboardConfig::default());
        let err = state.load_path(Path::new("/nonexistent/followups.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
        assert!(state.status_message.is_some());
    }

    #[test]
    fn unreadable_file_drops_the_previous_dataset() {
        let mut state = loaded();
        assert!(state.load_path(Path::new("/nonexistent/new.csv")).is_err());
        assert!(state.dataset.is_none());
        assert!(state.source_name.is_none());
        assert!(state.filtered.is_none());
        assert!(state.widgets.is_empty());
        assert!(state.statuses.is_empty());
        assert!(state.multiselect(FilterColumn::Program).options.is_empty());
    }

    #[test]
    fn successful_refilter_clears_a_filter_error() {
        let mut state = loaded();
        state.selection.week.insert(CellValue::text("first"));
        state.refilter();
        assert!(state.filtered.is_none());
        assert!(state
            .status_message
            .as_deref()
            .unwrap()
            .starts_with("Error applying filters"));

        state.select_none(FilterColumn::Week);
        assert!(state.status_message.is_none());
        assert_eq!(filtered_len(&state), 3);
    }

    #[test]
    fn export_requires_filtered_data() {
        let state = AppState::new(DashboardConfig::default());
        assert!(state.export_filtered(Path::new("/tmp/never-written.csv")).is_err());
    }
}
