//! Feature table construction on top of the aligned grid.

use std::io::Read;
use std::path::Path;

use chrono::Datelike;
use polars::prelude::*;
use tracing::info;

use crate::align::{self, decode_time};
use crate::calendar;
use crate::config::{FeatureConfig, PipelineConfig};
use crate::errors::PipelineError;
use crate::loader;
use crate::thermal;

/// Build the full feature table from the two raw inputs.
///
/// The returned `DataFrame` is keyed by its `time` column (strictly
/// increasing, unique, half-hour ticks) and has no missing value in any
/// column: rows inside uninterpolatable gaps and the lag/rolling warm-up
/// period are dropped.
pub fn build_feature_table<C: Read, W: Read>(
    consumption: C,
    weather: W,
    config: &PipelineConfig,
) -> Result<DataFrame, PipelineError> {
    let consumption_records = loader::load_consumption(consumption, &config.consumption)?;
    let weather_records = loader::load_weather(weather, &config.weather)?;
    let aligned = align::align(&consumption_records, &weather_records, &config.grid)?;
    attach_features(aligned, &config.features)
}

/// Path-based variant of [`build_feature_table`].
pub fn build_feature_table_from_paths(
    consumption_path: &Path,
    weather_path: &Path,
    config: &PipelineConfig,
) -> Result<DataFrame, PipelineError> {
    let consumption_records = loader::load_consumption_path(consumption_path, &config.consumption)?;
    let weather_records = loader::load_weather_path(weather_path, &config.weather)?;
    let aligned = align::align(&consumption_records, &weather_records, &config.grid)?;
    attach_features(aligned, &config.features)
}

/// Append calendar, thermal, lag and rolling columns to the aligned table,
/// then drop the rows whose lag/rolling history is incomplete.
pub fn attach_features(
    aligned: DataFrame,
    features: &FeatureConfig,
) -> Result<DataFrame, PipelineError> {
    let time: Vec<i64> = aligned.column("time")?.i64()?.into_no_null_iter().collect();
    let conso: Vec<f64> = aligned.column("conso")?.f64()?.into_no_null_iter().collect();
    let temp: Vec<f64> = aligned.column("temp")?.f64()?.into_no_null_iter().collect();

    let stamps: Vec<chrono::NaiveDateTime> = time.iter().map(|&t| decode_time(t)).collect();

    let is_day_off: Vec<bool> = stamps.iter().map(|ts| calendar::is_day_off(ts.date())).collect();
    let is_bridge: Vec<bool> = stamps.iter().map(|ts| calendar::is_bridge(ts.date())).collect();
    let is_weekend: Vec<bool> = stamps.iter().map(|ts| calendar::is_weekend(ts.date())).collect();
    let day_of_week: Vec<i32> = stamps
        .iter()
        .map(|ts| ts.weekday().num_days_from_monday() as i32)
        .collect();
    let month: Vec<i32> = stamps.iter().map(|ts| ts.month() as i32).collect();

    let conso_24_lag = lag(&conso, features.day_lag_steps);
    let temp_24_lag = lag(&temp, features.day_lag_steps);
    let conso_7_days_lag = lag(&conso, features.week_lag_steps);

    let heating: Vec<f64> = temp.iter().map(|&t| thermal::heating_degrees(t)).collect();
    let cooling: Vec<f64> = temp.iter().map(|&t| thermal::cooling_degrees(t)).collect();

    let temp_rolling_7_days = rolling_mean(&temp, features.rolling_window_steps);

    // Lag and rolling columns are the only ones that can be missing; a row
    // survives iff all of them are populated.
    let keep: BooleanChunked = (0..time.len())
        .map(|i| {
            conso_24_lag[i].is_some()
                && temp_24_lag[i].is_some()
                && conso_7_days_lag[i].is_some()
                && temp_rolling_7_days[i].is_some()
        })
        .collect();

    let df = df![
        "time" => time,
        "conso" => conso,
        "temp" => temp,
        "is_day_off" => is_day_off,
        "is_bridge" => is_bridge,
        "is_weekend" => is_weekend,
        "day_of_week" => day_of_week,
        "month" => month,
        "conso_24_lag" => conso_24_lag,
        "temp_24_lag" => temp_24_lag,
        "conso_7_days_lag" => conso_7_days_lag,
        "heating_degrees" => heating,
        "cooling_degrees" => cooling,
        "temp_rolling_7_days" => temp_rolling_7_days,
    ]?;

    let filtered = df.filter(&keep)?;
    if filtered.height() == 0 {
        return Err(PipelineError::EmptyResult { stage: "feature filtering" });
    }

    info!(
        "Feature table: {} rows kept of {} aligned ({} warm-up rows dropped)",
        filtered.height(),
        df.height(),
        df.height() - filtered.height()
    );
    Ok(filtered)
}

/// Value from exactly `steps` grid rows earlier; missing for the first
/// `steps` rows.
fn lag(values: &[f64], steps: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| if i >= steps { Some(values[i - steps]) } else { None })
        .collect()
}

/// Trailing mean over `window` rows inclusive of the current one; missing
/// until a full window of history exists.
fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }
    let mut out = Vec::with_capacity(values.len());
    let mut sum = 0.0;
    for i in 0..values.len() {
        sum += values[i];
        if i >= window {
            sum -= values[i - window];
        }
        out.push(if i + 1 >= window { Some(sum / window as f64) } else { None });
    }
    out
}
