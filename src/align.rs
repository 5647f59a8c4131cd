//! Alignment of the two raw series onto the canonical half-hourly grid.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime};
use polars::prelude::*;
use tracing::{debug, info};

use crate::config::GridConfig;
use crate::errors::PipelineError;
use crate::loader::{ConsumptionRecord, WeatherRecord};

pub const KELVIN_OFFSET: f64 = 273.15;

/// Encoding of a Paris-local naive timestamp for the `time` column.
pub fn encode_time(ts: NaiveDateTime) -> i64 {
    ts.and_utc().timestamp()
}

pub fn decode_time(secs: i64) -> NaiveDateTime {
    DateTime::from_timestamp(secs, 0).unwrap().naive_utc()
}

/// Merge both series onto the canonical grid, interpolate short gaps and drop
/// every row that still has a missing value.
///
/// Returns a `DataFrame` with columns `time`, `conso`, `temp`, strictly
/// ordered by `time` with one row per surviving grid tick.
pub fn align(
    consumption: &[ConsumptionRecord],
    weather: &[WeatherRecord],
    grid: &GridConfig,
) -> Result<DataFrame, PipelineError> {
    // Left-merge weather onto consumption by exact timestamp. Weather
    // readings at timestamps absent from the consumption feed are dropped
    // here and never act as interpolation anchors.
    let mut weather_at: HashMap<i64, f64> = HashMap::new();
    for rec in weather {
        weather_at.entry(encode_time(rec.timestamp)).or_insert(rec.temperature_k);
    }

    let mut conso_at: HashMap<i64, f64> = HashMap::new();
    let mut temp_at: HashMap<i64, f64> = HashMap::new();
    let mut t_min = i64::MAX;
    let mut t_max = i64::MIN;
    for rec in consumption {
        let t = encode_time(rec.timestamp);
        conso_at.entry(t).or_insert(rec.consumption_mw);
        if let Some(kelvin) = weather_at.get(&t) {
            // Kelvin to Celsius during merge.
            temp_at.entry(t).or_insert(kelvin - KELVIN_OFFSET);
        }
        t_min = t_min.min(t);
        t_max = t_max.max(t);
    }

    if conso_at.is_empty() {
        return Err(PipelineError::EmptyResult { stage: "alignment" });
    }

    // Canonical grid from the earliest to the latest merged timestamp,
    // inclusive; ticks absent from the raw feed get fully missing rows.
    let step = grid.step_minutes * 60;
    let mut times: Vec<i64> = Vec::new();
    let mut conso: Vec<Option<f64>> = Vec::new();
    let mut temp: Vec<Option<f64>> = Vec::new();
    let mut t = t_min;
    while t <= t_max {
        times.push(t);
        conso.push(conso_at.get(&t).copied());
        temp.push(temp_at.get(&t).copied());
        t += step;
    }
    debug!(
        "Canonical grid: {} ticks from {} to {}",
        times.len(),
        decode_time(t_min),
        decode_time(t_max)
    );

    let filled_conso = interpolate_bounded(&mut conso, grid.max_interpolation_gap);
    let filled_temp = interpolate_bounded(&mut temp, grid.max_interpolation_gap);
    debug!(
        "Interpolation filled {} consumption and {} temperature ticks",
        filled_conso, filled_temp
    );

    // Drop rows that still hold a missing value.
    let mut out_time: Vec<i64> = Vec::new();
    let mut out_conso: Vec<f64> = Vec::new();
    let mut out_temp: Vec<f64> = Vec::new();
    for (i, &t) in times.iter().enumerate() {
        if let (Some(c), Some(m)) = (conso[i], temp[i]) {
            out_time.push(t);
            out_conso.push(c);
            out_temp.push(m);
        }
    }

    if out_time.is_empty() {
        return Err(PipelineError::EmptyResult { stage: "alignment" });
    }

    info!(
        "Aligned table: {} of {} grid ticks fully populated",
        out_time.len(),
        times.len()
    );

    let df = df![
        "time" => out_time,
        "conso" => out_conso,
        "temp" => out_temp,
    ]?;
    Ok(df)
}

/// Linearly interpolate runs of missing values in place. A run is filled only
/// when it has valid anchors on both sides and is no longer than `max_gap`
/// positions; longer runs and edge runs are left missing. Returns the number
/// of filled positions.
pub(crate) fn interpolate_bounded(values: &mut [Option<f64>], max_gap: usize) -> usize {
    let mut filled = 0;
    let mut i = 0;
    while i < values.len() {
        if values[i].is_some() {
            i += 1;
            continue;
        }
        let run_start = i;
        let mut run_end = i;
        while run_end < values.len() && values[run_end].is_none() {
            run_end += 1;
        }
        let run_len = run_end - run_start;
        if run_start > 0 && run_end < values.len() && run_len <= max_gap {
            if let (Some(prev), Some(next)) = (values[run_start - 1], values[run_end]) {
                for (k, slot) in values[run_start..run_end].iter_mut().enumerate() {
                    let weight = (k + 1) as f64 / (run_len + 1) as f64;
                    *slot = Some(prev + (next - prev) * weight);
                    filled += 1;
                }
            }
        }
        i = run_end;
    }
    filled
}
