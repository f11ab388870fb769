//! Implementation of the `near-fees report` command.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use serde::Serialize;

use crate::cli::context::AppContext;
use crate::cli::output::{create_spinner_with_message, output, CommandOutput, ProgressBarExt, TableFormatter};
use crate::domain::models::QueryResult;
use crate::services::{DailyFeePoint, ReportKind, ReportService, ReportSummary};

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Report to run
    #[arg(value_enum)]
    pub report: ReportName,

    /// Also print the SQL behind the report
    #[arg(long)]
    pub show_sql: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportName {
    /// Fees by asset, largest first
    TopAssets,
    /// Daily and cumulative fees with spike dates
    DailyFees,
}

impl From<ReportName> for ReportKind {
    fn from(name: ReportName) -> Self {
        match name {
            ReportName::TopAssets => Self::TopAssets,
            ReportName::DailyFees => Self::DailyFees,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReportOutput {
    pub report: ReportKind,
    pub title: &'static str,
    pub row_count: usize,
    pub summary: Option<ReportSummary>,
    pub result: QueryResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql: Option<&'static str>,
}

impl CommandOutput for ReportOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![console::style(self.title).bold().to_string()];

        match &self.summary {
            Some(ReportSummary::TopAssets(summary)) => {
                lines.push(format!(
                    "Assets: {}  |  Total fees: {}  |  Top asset: {}",
                    summary.asset_count,
                    format_usd(summary.total_usd),
                    summary.leader.as_deref().unwrap_or("-")
                ));
            }
            Some(ReportSummary::DailyFees(summary)) => {
                lines.push(format!(
                    "Days: {}  |  Transactions: {}  |  Total fees: {}",
                    summary.days.len(),
                    summary.total_transactions,
                    format_usd(summary.total_usd)
                ));
                lines.push(format!(
                    "Count spikes:  {}",
                    join_points(&summary.count_spikes, |p| p.transaction_count.to_string())
                ));
                lines.push(format!(
                    "Volume spikes: {}",
                    join_points(&summary.volume_spikes, |p| format_usd(p.usd_amount))
                ));
            }
            None => {}
        }

        lines.push(TableFormatter::new().format_result(&self.result));
        lines.push(format!("{} row(s)", self.row_count));

        if let Some(sql) = self.sql {
            lines.push(String::new());
            lines.push(console::style("SQL").bold().to_string());
            lines.push(sql.to_string());
        }

        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: ReportArgs, context: &AppContext, json_mode: bool) -> Result<()> {
    let kind = ReportKind::from(args.report);
    let service = ReportService::new(context.query_service()?);

    let spinner = create_spinner_with_message(format!("Running {kind} query..."), json_mode);
    let report = match service.run(kind).await {
        Ok(report) => report,
        Err(err) => {
            spinner.finish_error("Report failed");
            return Err(err).with_context(|| format!("Failed to run {kind} report"));
        }
    };
    spinner.finish_success(format!("Returned {} rows", report.result.len()));

    let report_output = ReportOutput {
        report: kind,
        title: kind.title(),
        row_count: report.result.len(),
        summary: report.summary,
        result: (*report.result).clone(),
        sql: args.show_sql.then(|| kind.sql()),
    };
    output(&report_output, json_mode);
    Ok(())
}

/// `$1,234.56`
fn format_usd(amount: f64) -> String {
    let formatted = format!("{:.2}", amount.abs());
    let (whole, cents) = formatted.split_once('.').unwrap_or((&formatted, "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{sign}${grouped}.{cents}")
}

fn join_points(points: &[DailyFeePoint], value: impl Fn(&DailyFeePoint) -> String) -> String {
    if points.is_empty() {
        return "-".to_string();
    }
    points
        .iter()
        .map(|p| format!("{} ({})", p.date, value(p)))
        .collect::<Vec<_>>()
        .join(", ")
}
