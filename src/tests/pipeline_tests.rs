use approx::assert_relative_eq;
use chrono::{Duration, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Europe::Paris;
use polars::prelude::*;

use crate::align::encode_time;
use crate::config::PipelineConfig;
use crate::errors::PipelineError;
use crate::features::build_feature_table;

fn start(date: (i32, u32, u32)) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(date.0, date.1, date.2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Consumption CSV with offset-carrying timestamps, one row per half hour,
/// skipping the tick indices in `skip`.
fn consumption_csv(start: NaiveDateTime, ticks: usize, skip: &[usize]) -> String {
    let mut out = String::from("Date - Heure;Consommation (MW)\n");
    for i in 0..ticks {
        if skip.contains(&i) {
            continue;
        }
        let local = start + Duration::minutes(30 * i as i64);
        let stamped = Paris.from_local_datetime(&local).unwrap();
        out.push_str(&format!(
            "{};{}\n",
            stamped.format("%Y-%m-%dT%H:%M:%S%:z"),
            conso_value(i)
        ));
    }
    out
}

/// Weather CSV with epoch-second timestamps and a constant 285.15 K (12 degC).
fn weather_csv(start: NaiveDateTime, ticks: usize) -> String {
    let mut out = String::from("dt,temp\n");
    for i in 0..ticks {
        let local = start + Duration::minutes(30 * i as i64);
        let epoch = Paris.from_local_datetime(&local).unwrap().timestamp();
        out.push_str(&format!("{},285.15\n", epoch));
    }
    out
}

fn conso_value(i: usize) -> f64 {
    1000.0 + i as f64
}

fn build(consumption: &str, weather: &str) -> Result<DataFrame, PipelineError> {
    super::init_tracing();
    build_feature_table(
        consumption.as_bytes(),
        weather.as_bytes(),
        &PipelineConfig::default(),
    )
}

#[test]
fn warm_up_rows_are_dropped_and_lags_line_up() {
    let start = start((2013, 1, 1));
    let df = build(
        &consumption_csv(start, 480, &[]),
        &weather_csv(start, 480),
    )
    .unwrap();

    // 10 days of ticks minus the 7-day warm-up.
    assert_eq!(df.height(), 480 - 336);

    let first_time: i64 = df.column("time").unwrap().i64().unwrap().get(0).unwrap();
    assert_eq!(first_time, encode_time(start + Duration::minutes(30 * 336)));

    let conso = df.column("conso").unwrap().f64().unwrap();
    let conso_24 = df.column("conso_24_lag").unwrap().f64().unwrap();
    let conso_7d = df.column("conso_7_days_lag").unwrap().f64().unwrap();
    assert_relative_eq!(conso.get(0).unwrap(), conso_value(336));
    assert_relative_eq!(conso_24.get(0).unwrap(), conso_value(336 - 48));
    assert_relative_eq!(conso_7d.get(0).unwrap(), conso_value(0));

    // Lag identity holds at every surviving row.
    for i in 0..df.height() {
        assert_relative_eq!(conso_24.get(i).unwrap(), conso_value(336 + i - 48));
    }

    // Constant 12 degC weather.
    let temp = df.column("temp").unwrap().f64().unwrap();
    let rolling = df.column("temp_rolling_7_days").unwrap().f64().unwrap();
    let heating = df.column("heating_degrees").unwrap().f64().unwrap();
    let cooling = df.column("cooling_degrees").unwrap().f64().unwrap();
    assert_relative_eq!(temp.get(0).unwrap(), 12.0);
    assert_relative_eq!(rolling.get(0).unwrap(), 12.0, epsilon = 1e-9);
    assert_relative_eq!(heating.get(0).unwrap(), 6.0);
    assert_relative_eq!(cooling.get(0).unwrap(), 0.0);
}

#[test]
fn output_is_ordered_unique_and_fully_populated() {
    let start = start((2013, 1, 1));
    let df = build(
        &consumption_csv(start, 480, &[]),
        &weather_csv(start, 480),
    )
    .unwrap();

    let times: Vec<i64> = df.column("time").unwrap().i64().unwrap().into_no_null_iter().collect();
    assert!(times.windows(2).all(|w| w[1] > w[0]));
    assert!(times.iter().all(|t| t % 1800 == 0));

    for column in df.get_columns() {
        assert_eq!(column.null_count(), 0, "column {} has nulls", column.name());
    }
}

#[test]
fn single_missing_tick_survives_through_interpolation() {
    let start = start((2013, 1, 1));
    let df = build(
        &consumption_csv(start, 480, &[400]),
        &weather_csv(start, 480),
    )
    .unwrap();

    // The gap was filled, so the table is as long as without it.
    assert_eq!(df.height(), 480 - 336);

    // Linear consumption makes the interpolated value exact.
    let row = 400 - 336;
    let conso = df.column("conso").unwrap().f64().unwrap();
    assert_relative_eq!(conso.get(row).unwrap(), conso_value(400));
}

#[test]
fn long_gap_rows_are_absent_from_the_output() {
    let start = start((2013, 1, 1));
    let df = build(
        &consumption_csv(start, 480, &[200, 201, 202, 203, 204]),
        &weather_csv(start, 480),
    )
    .unwrap();

    // Five ticks above the interpolation limit: dropped before the lag
    // filter, which then operates positionally on the sparser table.
    assert_eq!(df.height(), 475 - 336);

    let gap_time = encode_time(start + Duration::minutes(30 * 200));
    let times: Vec<i64> = df.column("time").unwrap().i64().unwrap().into_no_null_iter().collect();
    assert!(!times.contains(&gap_time));
}

#[test]
fn one_day_of_data_is_all_warm_up() {
    let start = start((2013, 1, 1));
    let err = build(&consumption_csv(start, 48, &[]), &weather_csv(start, 48)).unwrap_err();
    assert!(matches!(err, PipelineError::EmptyResult { .. }));
}

#[test]
fn pipeline_is_deterministic() {
    let start = start((2013, 1, 1));
    let consumption = consumption_csv(start, 480, &[100]);
    let weather = weather_csv(start, 480);

    let first = build(&consumption, &weather).unwrap();
    let second = build(&consumption, &weather).unwrap();
    assert!(first.equals(&second));
}

#[test]
fn calendar_columns_follow_the_row_date() {
    // 20 days from late April 2013: the surviving window covers May 8th
    // (public holiday, Wednesday), May 10th (bridge Friday after Ascension)
    // and May 11th (Saturday).
    let start = start((2013, 4, 25));
    let ticks = 960;
    let df = build(
        &consumption_csv(start, ticks, &[]),
        &weather_csv(start, ticks),
    )
    .unwrap();

    let times: Vec<i64> = df.column("time").unwrap().i64().unwrap().into_no_null_iter().collect();
    let at = |date: (i32, u32, u32)| {
        let t = encode_time(self::start(date));
        times.iter().position(|&x| x == t).unwrap()
    };

    let day_off = df.column("is_day_off").unwrap().bool().unwrap();
    let bridge = df.column("is_bridge").unwrap().bool().unwrap();
    let weekend = df.column("is_weekend").unwrap().bool().unwrap();
    let day_of_week = df.column("day_of_week").unwrap().i32().unwrap();
    let month = df.column("month").unwrap().i32().unwrap();

    let may8 = at((2013, 5, 8));
    assert_eq!(day_off.get(may8), Some(true));
    assert_eq!(bridge.get(may8), Some(false));
    assert_eq!(day_of_week.get(may8), Some(2));
    assert_eq!(month.get(may8), Some(5));

    let may10 = at((2013, 5, 10));
    assert_eq!(bridge.get(may10), Some(true));
    assert_eq!(day_off.get(may10), Some(false));
    assert_eq!(weekend.get(may10), Some(false));

    let may11 = at((2013, 5, 11));
    assert_eq!(weekend.get(may11), Some(true));
    assert_eq!(day_of_week.get(may11), Some(5));
}
