use eframe::egui::{ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::model::{CellValue, RecordTable};
use crate::data::summary::{format_thousands, BALANCE};

const ROW_HEIGHT: f32 = 18.0;

/// Scrollable view of the filtered records.
pub fn record_table(ui: &mut Ui, table: &RecordTable) {
    let balance_idx = table.column_index(BALANCE);

    ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .max_scroll_height(400.0)
            .columns(Column::auto().at_least(60.0), table.columns.len())
            .header(20.0, |mut header| {
                for column in &table.columns {
                    header.col(|ui| {
                        ui.strong(&column.name);
                    });
                }
            })
            .body(|body| {
                body.rows(ROW_HEIGHT, table.len(), |mut row| {
                    let record = &table.rows[row.index()];
                    for (idx, value) in record.values.iter().enumerate() {
                        let text = match value {
                            CellValue::Number(v) if Some(idx) == balance_idx => format_thousands(*v),
                            other => other.to_string(),
                        };
                        row.col(|ui| {
                            ui.label(text);
                        });
                    }
                });
            });
    });
}
