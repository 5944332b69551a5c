use eframe::egui::{self, Color32, RichText, Ui};
use egui_plot::{Bar, BarChart, Legend, Plot};

use crate::color::{generate_palette, ColorMap};
use crate::config::DashboardConfig;
use crate::dashboard::{ChartStyle, Widget, WidgetContent, WidgetOutcome, WordCloud};
use crate::data::summary::{format_thousands, CategoryCount, GroupMean, HistogramBin, KpiSummary, TermCount};
use crate::state::AppState;

const CHART_HEIGHT: f32 = 260.0;

// ---------------------------------------------------------------------------
// Central panel: every dashboard widget in order
// ---------------------------------------------------------------------------

/// Render the dashboard in the central panel.
pub fn dashboard(ui: &mut Ui, state: &AppState) {
    let Some(filtered) = &state.filtered else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Please upload the CSV file  (File → Open CSV…)");
        });
        return;
    };

    if filtered.is_empty() {
        ui.colored_label(
            Color32::from_rgb(200, 140, 0),
            "No data matches filters. Adjust to see results.",
        );
        return;
    }

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            egui::CollapsingHeader::new("View Filtered Data")
                .default_open(false)
                .show(ui, |ui: &mut Ui| super::table::record_table(ui, filtered));

            let mut last_heading = "";
            let mut distributions_shown = false;
            for (idx, widget) in state.widgets.iter().enumerate() {
                if matches!(widget.outcome, WidgetOutcome::Hidden) {
                    continue;
                }
                if !widget.heading.is_empty() && !distributions_shown {
                    ui.add_space(8.0);
                    ui.heading("Distributions");
                    distributions_shown = true;
                }
                if widget.heading != last_heading && !widget.heading.is_empty() {
                    ui.add_space(6.0);
                    ui.label(RichText::new(widget.heading).strong().size(16.0));
                    last_heading = widget.heading;
                }
                render_widget(ui, idx, widget, &state.config);
            }
        });
}

fn render_widget(ui: &mut Ui, idx: usize, widget: &Widget, config: &DashboardConfig) {
    match &widget.outcome {
        WidgetOutcome::Hidden => {}
        WidgetOutcome::Failed(err) => {
            ui.colored_label(Color32::RED, err.to_string());
        }
        WidgetOutcome::Ready(content) => match content {
            WidgetContent::Kpis(kpis) => kpi_row(ui, kpis, &config.currency),
            WidgetContent::Distribution { style, counts, .. } => match style {
                ChartStyle::Pie => share_chart(ui, idx, widget.title, counts),
                ChartStyle::Bar => count_chart(ui, idx, widget.title, counts, true),
            },
            WidgetContent::BalanceHistogram(bins) => histogram_chart(ui, idx, widget.title, bins, config),
            WidgetContent::BalanceByStatus(groups) => group_mean_chart(ui, idx, widget.title, groups),
            WidgetContent::Remarks(WordCloud::NoData) => {
                ui.label("No remarks available for word cloud.");
            }
            WidgetContent::Remarks(WordCloud::Terms(terms)) => word_cloud(ui, terms),
            WidgetContent::FollowUpsByPerson(counts) => count_chart(ui, idx, widget.title, counts, false),
        },
    }
}

// ---------------------------------------------------------------------------
// KPI row
// ---------------------------------------------------------------------------

fn kpi_row(ui: &mut Ui, kpis: &KpiSummary, currency: &str) {
    let metrics = [
        ("Total Students", kpis.total_records.to_string()),
        ("Avg Balance", kpis.avg_balance_label(currency)),
        ("Total Follow-ups", kpis.total_follow_ups_label()),
    ];
    ui.columns(metrics.len(), |cols| {
        for (col, (label, value)) in cols.iter_mut().zip(metrics) {
            col.label(label);
            col.label(RichText::new(value).size(26.0).strong());
        }
    });
}

// ---------------------------------------------------------------------------
// Charts
// ---------------------------------------------------------------------------

fn base_plot(id: usize, title: &str) -> Plot {
    Plot::new(("widget", id, title.to_string()))
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
}

/// Share of each category as horizontal percentage bars, one legend entry
/// per category (the dashboard's pie charts).
fn share_chart(ui: &mut Ui, id: usize, title: &str, counts: &[CategoryCount]) {
    let colors = ColorMap::new(counts.iter().map(|c| &c.value));
    ui.label(title);
    base_plot(id, title)
        .x_axis_label("Percent")
        .show_y(false)
        .show(ui, |plot_ui| {
            for (i, c) in counts.iter().enumerate() {
                let color = colors.color_for(&c.value);
                let name = format!("{} ({:.1}%)", c.value, c.percent);
                let bar = Bar::new(-(i as f64), c.percent).name(&name).width(0.8);
                plot_ui.bar_chart(BarChart::new(vec![bar]).horizontal().color(color).name(name));
            }
        });
}

/// Counts per category as vertical bars, optionally annotated with percent.
fn count_chart(ui: &mut Ui, id: usize, title: &str, counts: &[CategoryCount], with_percent: bool) {
    let colors = ColorMap::new(counts.iter().map(|c| &c.value));
    ui.label(title);
    base_plot(id, title)
        .y_axis_label("Count")
        .show(ui, |plot_ui| {
            for (i, c) in counts.iter().enumerate() {
                let name = if with_percent {
                    format!("{}: {} ({:.1}%)", c.value, c.count, c.percent)
                } else {
                    format!("{}: {}", c.value, c.count)
                };
                let bar = Bar::new(i as f64, c.count as f64).name(&name).width(0.7);
                plot_ui.bar_chart(BarChart::new(vec![bar]).color(colors.color_for(&c.value)).name(name));
            }
        });
}

fn histogram_chart(ui: &mut Ui, id: usize, title: &str, bins: &[HistogramBin], config: &DashboardConfig) {
    let color = generate_palette(1).first().copied().unwrap_or(Color32::LIGHT_BLUE);
    let bars: Vec<Bar> = bins
        .iter()
        .map(|b| {
            Bar::new(b.center(), b.count as f64)
                .width(if b.width() > 0.0 { b.width() } else { 1.0 })
                .name(format!("{} – {}", format_thousands(b.start), format_thousands(b.end)))
        })
        .collect();
    ui.label(title);
    base_plot(id, title)
        .x_axis_label(format!("Balance ({})", config.currency))
        .y_axis_label("Count")
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).color(color).name("balance"));
        });
}

fn group_mean_chart(ui: &mut Ui, id: usize, title: &str, groups: &[GroupMean]) {
    let colors = ColorMap::new(groups.iter().map(|g| &g.key));
    ui.label(title);
    base_plot(id, title)
        .y_axis_label("Balance")
        .show(ui, |plot_ui| {
            for (i, g) in groups.iter().enumerate() {
                let name = format!("{}: {}", g.key, format_thousands(g.mean));
                let bar = Bar::new(i as f64, g.mean).name(&name).width(0.7);
                plot_ui.bar_chart(BarChart::new(vec![bar]).color(colors.color_for(&g.key)).name(name));
            }
        });
}

/// Terms laid out left to right, font size scaled by frequency.
fn word_cloud(ui: &mut Ui, terms: &[TermCount]) {
    let Some(max) = terms.iter().map(|t| t.count).max() else {
        ui.label("No remarks available for word cloud.");
        return;
    };
    let palette = generate_palette(8);
    ui.horizontal_wrapped(|ui: &mut Ui| {
        for (i, t) in terms.iter().enumerate() {
            let size = 12.0 + 28.0 * (t.count as f32 / max as f32);
            let color = palette[i % palette.len()];
            ui.label(RichText::new(&t.term).size(size).color(color))
                .on_hover_text(format!("{} mentions", t.count));
        }
    });
}
