//! Readers for the two raw input series.
//!
//! Both loaders normalise timestamps to Europe/Paris wall-clock time and
//! deduplicate on timestamp keeping the first occurrence. Any malformed row,
//! missing column or unparseable cell fails the whole load.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime};
use chrono_tz::Europe::Paris;
use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::CsvFormat;
use crate::errors::PipelineError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionRecord {
    /// Paris-local naive timestamp.
    pub timestamp: NaiveDateTime,
    pub consumption_mw: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    /// Paris-local naive timestamp.
    pub timestamp: NaiveDateTime,
    /// Kelvin until the aligner converts during merge.
    pub temperature_k: f64,
}

/// Load the consumption series. Timestamps carry a UTC offset and are
/// converted to Paris-local naive time.
pub fn load_consumption<R: Read>(
    reader: R,
    format: &CsvFormat,
) -> Result<Vec<ConsumptionRecord>, PipelineError> {
    const INPUT: &str = "consumption";

    let mut rdr = ReaderBuilder::new()
        .delimiter(format.delimiter)
        .has_headers(true)
        .from_reader(reader);
    let headers = read_headers(&mut rdr, INPUT)?;
    let ts_idx = column_index(&headers, &format.timestamp_column, INPUT)?;
    let mw_idx = column_index(&headers, &format.value_column, INPUT)?;

    let mut records = Vec::new();
    let mut seen = HashSet::new();
    let mut duplicates = 0usize;
    for (row_index, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| PipelineError::Csv { input: INPUT, source: e })?;
        let row = row_index + 2; // 1-based, header row included

        let ts_raw = field(&record, ts_idx, &format.timestamp_column, INPUT, row)?;
        let timestamp = parse_offset_timestamp(ts_raw).map_err(|reason| {
            PipelineError::Timestamp {
                input: INPUT,
                row,
                value: ts_raw.to_string(),
                reason,
            }
        })?;

        let mw_raw = field(&record, mw_idx, &format.value_column, INPUT, row)?;
        let consumption_mw: f64 = mw_raw.trim().parse().map_err(|_| PipelineError::Value {
            input: INPUT,
            row,
            column: format.value_column.clone(),
            value: mw_raw.to_string(),
        })?;

        if seen.insert(timestamp) {
            records.push(ConsumptionRecord { timestamp, consumption_mw });
        } else {
            duplicates += 1;
        }
    }

    info!(
        "Loaded {} consumption records ({} duplicate timestamps dropped)",
        records.len(),
        duplicates
    );
    Ok(records)
}

/// Load the weather series. Timestamps are Unix epoch seconds interpreted as
/// UTC and converted to Paris-local naive time; temperature stays in Kelvin.
pub fn load_weather<R: Read>(
    reader: R,
    format: &CsvFormat,
) -> Result<Vec<WeatherRecord>, PipelineError> {
    const INPUT: &str = "weather";

    let mut rdr = ReaderBuilder::new()
        .delimiter(format.delimiter)
        .has_headers(true)
        .from_reader(reader);
    let headers = read_headers(&mut rdr, INPUT)?;
    let ts_idx = column_index(&headers, &format.timestamp_column, INPUT)?;
    let temp_idx = column_index(&headers, &format.value_column, INPUT)?;

    let mut records = Vec::new();
    let mut seen = HashSet::new();
    let mut duplicates = 0usize;
    for (row_index, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| PipelineError::Csv { input: INPUT, source: e })?;
        let row = row_index + 2;

        let ts_raw = field(&record, ts_idx, &format.timestamp_column, INPUT, row)?;
        let timestamp = parse_epoch_seconds(ts_raw).map_err(|reason| {
            PipelineError::Timestamp {
                input: INPUT,
                row,
                value: ts_raw.to_string(),
                reason,
            }
        })?;

        let temp_raw = field(&record, temp_idx, &format.value_column, INPUT, row)?;
        let temperature_k: f64 = temp_raw.trim().parse().map_err(|_| PipelineError::Value {
            input: INPUT,
            row,
            column: format.value_column.clone(),
            value: temp_raw.to_string(),
        })?;

        if seen.insert(timestamp) {
            records.push(WeatherRecord { timestamp, temperature_k });
        } else {
            duplicates += 1;
        }
    }

    info!(
        "Loaded {} weather records ({} duplicate timestamps dropped)",
        records.len(),
        duplicates
    );
    Ok(records)
}

pub fn load_consumption_path(
    path: &Path,
    format: &CsvFormat,
) -> Result<Vec<ConsumptionRecord>, PipelineError> {
    let file = File::open(path).map_err(|e| PipelineError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    load_consumption(file, format)
}

pub fn load_weather_path(
    path: &Path,
    format: &CsvFormat,
) -> Result<Vec<WeatherRecord>, PipelineError> {
    let file = File::open(path).map_err(|e| PipelineError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    load_weather(file, format)
}

fn read_headers<R: Read>(
    rdr: &mut csv::Reader<R>,
    input: &'static str,
) -> Result<StringRecord, PipelineError> {
    rdr.headers()
        .map(|h| h.clone())
        .map_err(|e| PipelineError::Csv { input, source: e })
}

fn column_index(
    headers: &StringRecord,
    name: &str,
    input: &'static str,
) -> Result<usize, PipelineError> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| PipelineError::MissingColumn {
            input,
            column: name.to_string(),
        })
}

fn field<'r>(
    record: &'r StringRecord,
    idx: usize,
    column: &str,
    input: &'static str,
    row: usize,
) -> Result<&'r str, PipelineError> {
    record.get(idx).ok_or_else(|| PipelineError::Value {
        input,
        row,
        column: column.to_string(),
        value: String::from("<missing field>"),
    })
}

/// Parse an offset-carrying timestamp and convert the instant to Paris-local
/// naive time. Accepts RFC 3339 and the minutes-precision variant used by the
/// consumption feed.
fn parse_offset_timestamp(raw: &str) -> Result<NaiveDateTime, String> {
    let trimmed = raw.trim();
    DateTime::parse_from_rfc3339(trimmed)
        .or_else(|_| DateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M%:z"))
        .map(|dt| dt.with_timezone(&Paris).naive_local())
        .map_err(|e| e.to_string())
}

/// Parse Unix epoch seconds and convert the UTC instant to Paris-local naive
/// time.
fn parse_epoch_seconds(raw: &str) -> Result<NaiveDateTime, String> {
    let secs: i64 = raw
        .trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| e.to_string())?;
    DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.with_timezone(&Paris).naive_local())
        .ok_or_else(|| format!("epoch seconds {} out of range", secs))
}
