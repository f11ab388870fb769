//! The fixed dashboard reports and their KPI aggregation.
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::domain::errors::WarehouseResult;
use crate::domain::models::QueryResult;
use crate::domain::ports::ConfigProvider;

use super::query_service::QueryService;

const TOP_ASSETS_SQL: &str = include_str!("../../queries/top_assets.sql");
const DAILY_CUMULATIVE_SQL: &str = include_str!("../../queries/daily_cumulative.sql");

/// Number of spike dates reported per metric
pub const SPIKE_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportKind {
    TopAssets,
    DailyFees,
}

impl ReportKind {
    pub const ALL: [Self; 2] = [Self::TopAssets, Self::DailyFees];

    pub const fn name(self) -> &'static str {
        match self {
            Self::TopAssets => "top-assets",
            Self::DailyFees => "daily-fees",
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            Self::TopAssets => "Top assets by fees",
            Self::DailyFees => "Daily & cumulative fees",
        }
    }

    pub fn sql(self) -> &'static str {
        match self {
            Self::TopAssets => TOP_ASSETS_SQL.trim(),
            Self::DailyFees => DAILY_CUMULATIVE_SQL.trim(),
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| format!("unknown report '{s}', expected one of: top-assets, daily-fees"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopAssetsSummary {
    pub asset_count: usize,
    pub total_usd: f64,
    /// Asset with the largest USD total
    pub leader: Option<String>,
}

/// One date after aggregation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyFeePoint {
    pub date: String,
    pub transaction_count: i64,
    pub usd_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyFeesSummary {
    /// Per-date totals, ascending by date
    pub days: Vec<DailyFeePoint>,
    pub total_transactions: i64,
    pub total_usd: f64,
    /// Highest transaction counts, largest first
    pub count_spikes: Vec<DailyFeePoint>,
    /// Highest USD amounts, largest first
    pub volume_spikes: Vec<DailyFeePoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "report", rename_all = "kebab-case")]
pub enum ReportSummary {
    TopAssets(TopAssetsSummary),
    DailyFees(DailyFeesSummary),
}

/// A report run: the SQL, the table and its KPIs.
#[derive(Debug, Clone)]
pub struct Report {
    pub kind: ReportKind,
    pub result: Arc<QueryResult>,
    /// `None` when the result lacks the columns the KPIs need
    pub summary: Option<ReportSummary>,
}

/// Runs the dashboard reports through a [`QueryService`].
pub struct ReportService<P> {
    queries: Arc<QueryService<P>>,
}

impl<P: ConfigProvider> ReportService<P> {
    pub fn new(queries: Arc<QueryService<P>>) -> Self {
        Self { queries }
    }

    #[instrument(skip(self), fields(report = %kind))]
    pub async fn run(&self, kind: ReportKind) -> WarehouseResult<Report> {
        let result = self.queries.run_sql(kind.sql().to_string()).await?;
        let summary = summarize(kind, &result);
        if summary.is_none() && !result.is_empty() {
            debug!(columns = ?result.columns, "expected columns missing, skipping KPIs");
        }
        Ok(Report {
            kind,
            result,
            summary,
        })
    }
}

/// KPIs for a report result.
pub fn summarize(kind: ReportKind, result: &QueryResult) -> Option<ReportSummary> {
    match kind {
        ReportKind::TopAssets => summarize_top_assets(result).map(ReportSummary::TopAssets),
        ReportKind::DailyFees => aggregate_daily_fees(result).map(ReportSummary::DailyFees),
    }
}

/// Asset count and USD total. Needs `asset` and `total_usd`.
pub fn summarize_top_assets(result: &QueryResult) -> Option<TopAssetsSummary> {
    let asset_idx = result.column_index("asset")?;
    let usd_idx = result.column_index("total_usd")?;

    let mut total_usd = 0.0;
    let mut leader: Option<(&Value, f64)> = None;
    for row in &result.rows {
        let Some(usd) = row.get(usd_idx).and_then(numeric) else {
            continue;
        };
        total_usd += usd;
        if leader.map_or(true, |(_, best)| usd > best) {
            leader = row.get(asset_idx).map(|asset| (asset, usd));
        }
    }

    Some(TopAssetsSummary {
        asset_count: result.len(),
        total_usd,
        leader: leader.map(|(asset, _)| cell_text(asset)),
    })
}

/// Sum counts and USD per date and pick spike dates. Needs `date`,
/// `transaction_count` and `daily_usd_amount`; empty results yield `None`.
pub fn aggregate_daily_fees(result: &QueryResult) -> Option<DailyFeesSummary> {
    if result.is_empty() {
        return None;
    }
    let date_idx = result.column_index("date")?;
    let count_idx = result.column_index("transaction_count")?;
    let usd_idx = result.column_index("daily_usd_amount")?;

    let mut by_date: BTreeMap<String, (i64, f64)> = BTreeMap::new();
    for row in &result.rows {
        let Some(date) = row.get(date_idx).filter(|v| !v.is_null()) else {
            continue;
        };
        let entry = by_date.entry(cell_text(date)).or_default();
        entry.0 += row.get(count_idx).and_then(integer).unwrap_or(0);
        entry.1 += row.get(usd_idx).and_then(numeric).unwrap_or(0.0);
    }

    let days: Vec<DailyFeePoint> = by_date
        .into_iter()
        .map(|(date, (transaction_count, usd_amount))| DailyFeePoint {
            date,
            transaction_count,
            usd_amount,
        })
        .collect();

    let count_spikes = top_n(&days, |a, b| b.transaction_count.cmp(&a.transaction_count));
    let volume_spikes = top_n(&days, |a, b| b.usd_amount.total_cmp(&a.usd_amount));

    Some(DailyFeesSummary {
        total_transactions: days.iter().map(|d| d.transaction_count).sum(),
        total_usd: days.iter().map(|d| d.usd_amount).sum(),
        days,
        count_spikes,
        volume_spikes,
    })
}

/// First `SPIKE_COUNT` points under `order`; ties keep date order.
fn top_n<F>(days: &[DailyFeePoint], order: F) -> Vec<DailyFeePoint>
where
    F: Fn(&DailyFeePoint, &DailyFeePoint) -> Ordering,
{
    let mut sorted = days.to_vec();
    sorted.sort_by(order);
    sorted.truncate(SPIKE_COUNT);
    sorted
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn integer(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| numeric(value).map(|f| f as i64))
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
