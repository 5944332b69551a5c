use std::fmt::Write;

use crate::config::DashboardConfig;
use crate::dashboard::{ChartStyle, Widget, WidgetContent, WidgetOutcome, WordCloud};
use crate::data::model::{format_number, RecordTable};
use crate::data::summary::format_thousands;

/// Render the dashboard widgets as a Markdown document.
pub fn build_report(
    source: &str,
    total_records: usize,
    filtered: &RecordTable,
    widgets: &[Widget],
    config: &DashboardConfig,
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Student Follow-up Analysis");
    let _ = writeln!(
        output,
        "Generated from {} ({} of {} records after filters)",
        source,
        filtered.len(),
        total_records
    );

    if filtered.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "No data matches filters. Adjust to see results.");
        return output;
    }

    let mut last_heading = "";
    for widget in widgets {
        if matches!(widget.outcome, WidgetOutcome::Hidden) {
            continue;
        }
        if widget.heading != last_heading && !widget.heading.is_empty() {
            let _ = writeln!(output);
            let _ = writeln!(output, "## {}", widget.heading);
            last_heading = widget.heading;
        }
        match &widget.outcome {
            WidgetOutcome::Ready(content) => write_content(&mut output, widget.title, content, config),
            WidgetOutcome::Failed(err) => {
                let _ = writeln!(output);
                let _ = writeln!(output, "> {err}");
            }
            WidgetOutcome::Hidden => {}
        }
    }

    output
}

fn write_content(output: &mut String, title: &str, content: &WidgetContent, config: &DashboardConfig) {
    let _ = writeln!(output);
    match content {
        WidgetContent::Kpis(kpis) => {
            let _ = writeln!(output, "- Total Students: {}", kpis.total_records);
            let _ = writeln!(output, "- Avg Balance: {}", kpis.avg_balance_label(&config.currency));
            let _ = writeln!(output, "- Total Follow-ups: {}", kpis.total_follow_ups_label());
        }
        WidgetContent::Distribution {
            column,
            style,
            counts,
        } => {
            let kind = match style {
                ChartStyle::Pie => "share",
                ChartStyle::Bar => "count",
            };
            let _ = writeln!(output, "### {title} (by {kind})");
            let _ = writeln!(output, "| {column} | count | percent |");
            let _ = writeln!(output, "|---|---:|---:|");
            for c in counts {
                let _ = writeln!(output, "| {} | {} | {:.1}% |", c.value, c.count, c.percent);
            }
        }
        WidgetContent::BalanceHistogram(bins) => {
            let _ = writeln!(output, "### {title}");
            let _ = writeln!(output, "| balance range | count |");
            let _ = writeln!(output, "|---|---:|");
            for bin in bins {
                let _ = writeln!(
                    output,
                    "| {} – {} | {} |",
                    format_thousands(bin.start),
                    format_thousands(bin.end),
                    bin.count
                );
            }
        }
        WidgetContent::BalanceByStatus(groups) => {
            let _ = writeln!(output, "### {title}");
            for g in groups {
                let _ = writeln!(
                    output,
                    "- {}: {} across {} records",
                    g.key,
                    format_thousands(g.mean),
                    g.count
                );
            }
        }
        WidgetContent::Remarks(WordCloud::NoData) => {
            let _ = writeln!(output, "No remarks available for word cloud.");
        }
        WidgetContent::Remarks(WordCloud::Terms(terms)) => {
            let _ = writeln!(output, "### Most frequent remark terms");
            for t in terms.iter().take(20) {
                let _ = writeln!(output, "- {} ({})", t.term, t.count);
            }
        }
        WidgetContent::FollowUpsByPerson(counts) => {
            let _ = writeln!(output, "### {title}");
            for c in counts {
                let _ = writeln!(output, "- {}: {}", c.value, format_number(c.count as f64));
            }
        }
    }
}
