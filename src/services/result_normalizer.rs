//! Conversion of raw SQL API results into [`QueryResult`].
//!
//! The SQL API returns every cell as a string. Temporal values use
//! epoch-based encodings:
//! - `date`: days since 1970-01-01
//! - `time`: seconds since midnight, with fraction
//! - `timestamp_ntz` / `timestamp_ltz`: seconds since the epoch, with fraction
//! - `timestamp_tz`: `<seconds> <offset minutes + 1440>`
//!
//! Cells that do not parse are kept as the original string.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::{Number, Value};
use tracing::debug;

use crate::domain::models::{ColumnType, QueryResult, RawColumn, RawResultSet};

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const TIME_FORMAT: &str = "%H:%M:%S";

/// How a datetime column is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DatetimeStyle {
    DateOnly,
    DateTime,
}

impl DatetimeStyle {
    /// `DATE` columns are always date-only. Timestamp columns are date-only
    /// when the name mentions `date` but not `timestamp`.
    fn for_column(name: &str, column_type: &ColumnType) -> Self {
        match column_type {
            ColumnType::Date => Self::DateOnly,
            _ if name.contains("date") && !name.contains("timestamp") => Self::DateOnly,
            _ => Self::DateTime,
        }
    }

    const fn format(self) -> &'static str {
        match self {
            Self::DateOnly => DATE_FORMAT,
            Self::DateTime => DATETIME_FORMAT,
        }
    }
}

/// Lower-case column names and convert cells to typed JSON values.
pub fn normalize(raw: RawResultSet) -> QueryResult {
    let columns: Vec<String> = raw
        .columns
        .iter()
        .map(|column| column.name.to_lowercase())
        .collect();

    let rows = raw
        .rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .enumerate()
                .map(|(idx, cell)| match (cell, raw.columns.get(idx)) {
                    (None, _) => Value::Null,
                    (Some(text), Some(column)) => convert_cell(&columns[idx], column, text),
                    (Some(text), None) => Value::String(text),
                })
                .collect()
        })
        .collect();

    QueryResult { columns, rows }
}

fn convert_cell(name: &str, column: &RawColumn, text: String) -> Value {
    let converted = match &column.column_type {
        ColumnType::Fixed { scale: 0 } => parse_integer(&text),
        ColumnType::Fixed { .. } | ColumnType::Real => parse_float(&text),
        ColumnType::Boolean => parse_bool(&text),
        ColumnType::Time => parse_time(&text).map(|t| Value::String(t.format(TIME_FORMAT).to_string())),
        column_type if column_type.is_datetime() => {
            let style = DatetimeStyle::for_column(name, column_type);
            parse_datetime(column_type, &text).map(|dt| Value::String(dt.format(style.format()).to_string()))
        }
        _ => None,
    };

    converted.unwrap_or_else(|| {
        if !matches!(column.column_type, ColumnType::Text | ColumnType::Other(_)) {
            debug!(column = name, value = %text, "cell kept as text");
        }
        Value::String(text)
    })
}

fn parse_integer(text: &str) -> Option<Value> {
    if let Ok(value) = text.parse::<i64>() {
        return Some(Value::from(value));
    }
    if let Ok(value) = text.parse::<u64>() {
        return Some(Value::from(value));
    }
    // NUMBER(38,0) can exceed 64 bits
    parse_float(text)
}

fn parse_float(text: &str) -> Option<Value> {
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

fn parse_bool(text: &str) -> Option<Value> {
    match text.to_ascii_lowercase().as_str() {
        "true" | "1" => Some(Value::Bool(true)),
        "false" | "0" => Some(Value::Bool(false)),
        _ => None,
    }
}

/// Wall-clock value of a date or timestamp cell.
fn parse_datetime(column_type: &ColumnType, text: &str) -> Option<NaiveDateTime> {
    match column_type {
        ColumnType::Date => text
            .parse::<i64>()
            .ok()
            .and_then(|days| DateTime::UNIX_EPOCH.date_naive().checked_add_signed(chrono::Duration::days(days)))
            .map(|date| date.and_time(NaiveTime::MIN))
            .or_else(|| NaiveDate::parse_from_str(text, DATE_FORMAT).ok().map(|d| d.and_time(NaiveTime::MIN))),
        ColumnType::TimestampTz => parse_timestamp_tz(text),
        _ => parse_epoch(text)
            .map(|dt| dt.naive_utc())
            .or_else(|| parse_text_datetime(text)),
    }
}

/// `<seconds>.<fraction>` since the epoch. The fraction carries the sign of
/// the whole value, so `-1.5` is one and a half seconds before the epoch.
fn parse_epoch(text: &str) -> Option<DateTime<Utc>> {
    let (secs, fraction) = text.split_once('.').unwrap_or((text, "0"));
    let negative = secs.starts_with('-');
    let secs = secs.parse::<i64>().ok()?;
    let nanos = fraction_to_nanos(fraction)?;
    if negative && nanos > 0 {
        DateTime::from_timestamp(secs.checked_sub(1)?, 1_000_000_000 - nanos)
    } else {
        DateTime::from_timestamp(secs, nanos)
    }
}

/// `<epoch> <offset>` where the offset is minutes east of UTC plus 1440.
fn parse_timestamp_tz(text: &str) -> Option<NaiveDateTime> {
    let Some((instant, offset)) = text.split_once(' ') else {
        return parse_text_datetime(text);
    };
    let instant = parse_epoch(instant)?;
    let offset_seconds = offset
        .trim()
        .parse::<i64>()
        .ok()?
        .checked_sub(1440)?
        .checked_mul(60)?;
    let offset = FixedOffset::east_opt(i32::try_from(offset_seconds).ok()?)?;
    Some(instant.with_timezone(&offset).naive_local())
}

fn parse_time(text: &str) -> Option<NaiveTime> {
    let (secs, fraction) = text.split_once('.').unwrap_or((text, "0"));
    let secs = secs.parse::<u32>().ok()?;
    NaiveTime::from_num_seconds_from_midnight_opt(secs, fraction_to_nanos(fraction)?)
}

/// Already-formatted values, for accounts configured to return text.
fn parse_text_datetime(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.naive_local()))
}

/// Right-pad the fraction to nine digits.
fn fraction_to_nanos(fraction: &str) -> Option<u32> {
    if fraction.is_empty() || fraction.len() > 9 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    format!("{fraction:0<9}").parse().ok()
}
