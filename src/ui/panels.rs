use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::filter::{StatusFilter, ALL_STATUSES};
use crate::state::{AppState, FilterColumn};

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    if state.dataset.is_none() {
        ui.label("Please upload the CSV file (File → Open CSV…).");
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            download_button(ui, state);
            ui.separator();

            multiselect(ui, state, FilterColumn::Program);
            status_radio(ui, state);
            multiselect(ui, state, FilterColumn::Reason);
            multiselect(ui, state, FilterColumn::Week);
        });
}

/// Searchable multiselect: the search box narrows the options and
/// re-selects whatever stays visible.
fn multiselect(ui: &mut Ui, state: &mut AppState, column: FilterColumn) {
    let ms = state.multiselect(column).clone();
    let visible = ms.visible();
    let n_selected = column.selected(&state.selection).len();
    let header_text = format!("{}  ({n_selected}/{})", column.label(), visible.len());

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt(column.column())
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            let mut search = ms.search.clone();
            let response = ui.add(
                egui::TextEdit::singleline(&mut search)
                    .hint_text(format!("Search {}", column.column())),
            );
            if response.changed() {
                state.set_search(column, search);
            }

            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    state.select_all(column);
                }
                if ui.small_button("None").clicked() {
                    state.select_none(column);
                }
            });

            for value in &visible {
                let mut checked = column.selected(&state.selection).contains(*value);
                if ui.checkbox(&mut checked, value.to_string()).changed() {
                    state.toggle_filter_value(column, value);
                }
            }
        });
}

fn status_radio(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Status");
    let mut current = state.selection.status.clone();
    ui.radio_value(&mut current, StatusFilter::All, ALL_STATUSES);
    for status in &state.statuses {
        ui.radio_value(&mut current, StatusFilter::Only(status.clone()), status.to_string());
    }
    state.set_status(current);
    ui.separator();
}

fn download_button(ui: &mut Ui, state: &mut AppState) {
    let has_rows = state.filtered.as_ref().is_some_and(|t| !t.is_empty());
    if has_rows && ui.button("Download Filtered Data").clicked() {
        save_file_dialog(state);
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open CSV…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        let theme_label = if state.dark_mode { "Dark" } else { "Light" };
        if ui
            .selectable_label(state.dark_mode, format!("Theme: {theme_label}"))
            .clicked()
        {
            state.dark_mode = !state.dark_mode;
            let visuals = if state.dark_mode {
                egui::Visuals::dark()
            } else {
                egui::Visuals::light()
            };
            ui.ctx().set_visuals(visuals);
        }

        ui.separator();

        if let (Some(table), Some(filtered)) = (state.table(), &state.filtered) {
            if let Some(name) = &state.source_name {
                ui.label(RichText::new(name).monospace());
            }
            ui.label(format!(
                "{} records loaded, {} after filters",
                table.len(),
                filtered.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Upload Follow-up Data")
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        // Errors are logged and surfaced through `status_message`.
        let _ = state.load_path(&path);
    }
}

pub fn save_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Download Filtered Data")
        .add_filter("CSV", &["csv"])
        .set_file_name("filtered_data.csv")
        .save_file();

    if let Some(path) = file {
        if let Err(e) = state.export_filtered(&path) {
            log::error!("Export error: {e:#}");
            state.status_message = Some(format!("Error exporting data: {e:#}"));
        }
    }
}
