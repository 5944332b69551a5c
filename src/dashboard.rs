use thiserror::Error;

use crate::config::DashboardConfig;
use crate::data::error::SummaryError;
use crate::data::filter::{PROGRAM, REASON, STATUS, WEEK};
use crate::data::model::RecordTable;
use crate::data::summary::{
    self, CategoryCount, GroupMean, HistogramBin, KpiSummary, RemarksText, TermCount, REMARKS,
};

// ---------------------------------------------------------------------------
// Widget model: what the dashboard shows, independent of rendering
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartStyle {
    Pie,
    Bar,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WordCloud {
    Terms(Vec<TermCount>),
    NoData,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WidgetContent {
    Kpis(KpiSummary),
    Distribution {
        column: &'static str,
        style: ChartStyle,
        counts: Vec<CategoryCount>,
    },
    BalanceHistogram(Vec<HistogramBin>),
    BalanceByStatus(Vec<GroupMean>),
    Remarks(WordCloud),
    FollowUpsByPerson(Vec<CategoryCount>),
}

/// A widget that could not be built. Shown inline; the other widgets
/// still render.
#[derive(Debug, Error)]
#[error("Error displaying {widget}: {source}")]
pub struct RenderError {
    pub widget: &'static str,
    #[source]
    pub source: SummaryError,
}

#[derive(Debug)]
pub enum WidgetOutcome {
    Ready(WidgetContent),
    /// Required column absent or nothing to show.
    Hidden,
    Failed(RenderError),
}

#[derive(Debug)]
pub struct Widget {
    /// Sub-heading the widget sits under (empty for the KPI row).
    pub heading: &'static str,
    pub title: &'static str,
    pub outcome: WidgetOutcome,
}

#[derive(Debug, Clone, Copy)]
enum WidgetKind {
    Kpis,
    Distribution(&'static str, ChartStyle),
    BalanceHistogram,
    BalanceByStatus,
    Remarks,
    FollowUpsByPerson,
}

/// Dashboard order: (heading, title, kind).
const LAYOUT: &[(&str, &str, WidgetKind)] = &[
    ("", "Key figures", WidgetKind::Kpis),
    ("Reasons Distribution", "Reasons Distribution", WidgetKind::Distribution(REASON, ChartStyle::Pie)),
    ("Follow-up Reasons Details", "Reasons Distribution", WidgetKind::Distribution(REASON, ChartStyle::Bar)),
    ("Programs", "Programs Distribution", WidgetKind::Distribution(PROGRAM, ChartStyle::Pie)),
    ("Status Distribution", "Statuses Distribution", WidgetKind::Distribution(STATUS, ChartStyle::Pie)),
    ("Follow-up by Week", "Follow-ups by Week", WidgetKind::Distribution(WEEK, ChartStyle::Bar)),
    ("Financial Patterns", "Balance Distribution", WidgetKind::BalanceHistogram),
    ("Financial Patterns", "Average Balance by Status", WidgetKind::BalanceByStatus),
    ("Remarks Analysis", "Remarks Word Cloud", WidgetKind::Remarks),
    ("Follow-ups by Person", "Follow-ups by Person", WidgetKind::FollowUpsByPerson),
];

fn build(
    kind: WidgetKind,
    table: &RecordTable,
    config: &DashboardConfig,
) -> Result<Option<WidgetContent>, SummaryError> {
    if table.is_empty() {
        return Ok(None);
    }
    let content = match kind {
        WidgetKind::Kpis => summary::kpi_summary(table)?.map(WidgetContent::Kpis),
        WidgetKind::Distribution(column, style) => {
            let counts = summary::category_frequencies(table, column);
            (!counts.is_empty()).then_some(WidgetContent::Distribution {
                column,
                style,
                counts,
            })
        }
        WidgetKind::BalanceHistogram => {
            let bins = summary::balance_histogram(table, config.histogram_bins)?;
            (!bins.is_empty()).then_some(WidgetContent::BalanceHistogram(bins))
        }
        WidgetKind::BalanceByStatus => {
            let groups = summary::mean_balance_by_status(table)?;
            (!groups.is_empty()).then_some(WidgetContent::BalanceByStatus(groups))
        }
        WidgetKind::Remarks => {
            if !table.has_column(REMARKS) {
                return Ok(None);
            }
            let cloud = match summary::remarks_text(table) {
                RemarksText::Text(text) => {
                    WordCloud::Terms(summary::term_frequencies(&text, config.word_cloud_terms))
                }
                RemarksText::NoData => WordCloud::NoData,
            };
            Some(WidgetContent::Remarks(cloud))
        }
        WidgetKind::FollowUpsByPerson => {
            let counts = summary::follow_ups_by_person(table);
            (!counts.is_empty()).then_some(WidgetContent::FollowUpsByPerson(counts))
        }
    };
    Ok(content)
}

/// Build every dashboard widget. A failing widget is logged and kept as a
/// placeholder; it never stops the ones after it.
pub fn build_widgets(table: &RecordTable, config: &DashboardConfig) -> Vec<Widget> {
    LAYOUT
        .iter()
        .map(|&(heading, title, kind)| {
            let outcome = match build(kind, table, config) {
                Ok(Some(content)) => {
                    log::info!("{title} displayed successfully");
                    WidgetOutcome::Ready(content)
                }
                Ok(None) => {
                    log::debug!("{title} skipped: no data");
                    WidgetOutcome::Hidden
                }
                Err(source) => {
                    let err = RenderError {
                        widget: title,
                        source,
                    };
                    log::error!("{err}");
                    WidgetOutcome::Failed(err)
                }
            };
            Widget {
                heading,
                title,
                outcome,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NormalizeConfig;
    use crate::data::loader::load_csv;

    fn table(text: &str, cfg: &NormalizeConfig) -> RecordTable {
        load_csv(text.as_bytes(), cfg).unwrap()
    }

    const FULL: &str = "Program,Status,Reason,Week,Balance,No of Follow Up,Remarks,Follow Up By\n\
                        CS,Active,Fees,1,1000,2,fees pending,Ayesha\n\
                        EE,Done,Other,2,3000,1,paid in full,Bilal\n";

    #[test]
    fn every_widget_ready_for_complete_data() {
        let widgets = build_widgets(&table(FULL, &NormalizeConfig::default()), &DashboardConfig::default());
        assert_eq!(widgets.len(), LAYOUT.len());
        for w in &widgets {
            assert!(matches!(w.outcome, WidgetOutcome::Ready(_)), "{} not ready", w.title);
        }
        assert!(matches!(
            &widgets[5].outcome,
            WidgetOutcome::Ready(WidgetContent::Distribution { column: "week", style: ChartStyle::Bar, .. })
        ));
    }

    #[test]
    fn absent_columns_hide_widgets() {
        let widgets = build_widgets(
            &table("Program\nCS\n", &NormalizeConfig::default()),
            &DashboardConfig::default(),
        );
        let ready: Vec<_> = widgets
            .iter()
            .filter(|w| matches!(w.outcome, WidgetOutcome::Ready(_)))
            .map(|w| w.title)
            .collect();
        assert_eq!(ready, vec!["Key figures", "Programs Distribution"]);
    }

    #[test]
    fn empty_table_hides_everything() {
        let empty = table(FULL, &NormalizeConfig::default()).with_rows(Vec::new());
        let widgets = build_widgets(&empty, &DashboardConfig::default());
        assert!(widgets.iter().all(|w| matches!(w.outcome, WidgetOutcome::Hidden)));
    }

    #[test]
    fn one_failing_widget_does_not_stop_the_rest() {
        // Without numeric coercion a "1,000" balance stays text.
        let cfg = NormalizeConfig {
            numeric_columns: vec![],
            ..NormalizeConfig::default()
        };
        let t = table(
            "Program,Status,Balance\nCS,Active,\"1,000\"\nEE,Done,\"2,000\"\n",
            &cfg,
        );
        let widgets = build_widgets(&t, &DashboardConfig::default());
        let failed: Vec<_> = widgets
            .iter()
            .filter(|w| matches!(w.outcome, WidgetOutcome::Failed(_)))
            .map(|w| w.title)
            .collect();
        assert_eq!(
            failed,
            vec!["Key figures", "Balance Distribution", "Average Balance by Status"]
        );
        let ready = widgets
            .iter()
            .filter(|w| matches!(w.outcome, WidgetOutcome::Ready(_)))
            .count();
        assert_eq!(ready, 2);
    }

    #[test]
    fn missing_remarks_report_no_data() {
        let t = table("Program,Remarks\nCS,\n", &NormalizeConfig::default());
        let widgets = build_widgets(&t, &DashboardConfig::default());
        let remarks = widgets.iter().find(|w| w.title == "Remarks Word Cloud").unwrap();
        assert!(matches!(
            remarks.outcome,
            WidgetOutcome::Ready(WidgetContent::Remarks(WordCloud::NoData))
        ));
    }
}
