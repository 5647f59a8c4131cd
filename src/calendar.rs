//! Working-day calendar for French demand data.
//!
//! The holiday table is a fixed literal list covering 2013-2019; queries
//! outside that range always answer `false`.

use chrono::{Datelike, NaiveDate, Weekday};
use once_cell::sync::Lazy;
use std::collections::HashSet;
use tracing::warn;

const FIRST_COVERED_YEAR: i32 = 2013;
const LAST_COVERED_YEAR: i32 = 2019;

// French public holidays 2013-2019. Adjacent civil/religious observances
// repeat some dates (e.g. Pentecost Sunday and Monday); membership testing
// makes the duplicates harmless.
const DAYS_OFF: &[&str] = &[
    "2013-01-01", "2013-01-06", "2013-02-12", "2013-02-14", "2013-03-31", "2013-03-31", "2013-04-01",
    "2013-05-01", "2013-05-08", "2013-05-09", "2013-05-19", "2013-05-19", "2013-05-20", "2013-07-14",
    "2013-08-15", "2013-11-01", "2013-11-11", "2013-12-25", "2013-12-31", "2014-01-01", "2014-01-06",
    "2014-02-14", "2014-03-04", "2014-04-20", "2014-04-20", "2014-04-21", "2014-05-01", "2014-05-08",
    "2014-05-29", "2014-06-08", "2014-06-08", "2014-06-09", "2014-07-14", "2014-08-15", "2014-11-01",
    "2014-11-11", "2014-12-25", "2014-12-31", "2015-01-01", "2015-01-06", "2015-02-14", "2015-02-17",
    "2015-04-05", "2015-04-05", "2015-04-06", "2015-05-01", "2015-05-08", "2015-05-14", "2015-05-24",
    "2015-05-24", "2015-05-25", "2015-07-14", "2015-08-15", "2015-11-01", "2015-11-11", "2015-12-25",
    "2015-12-31", "2016-01-01", "2016-01-06", "2016-02-09", "2016-02-14", "2016-03-27", "2016-03-27",
    "2016-03-28", "2016-05-01", "2016-05-05", "2016-05-08", "2016-05-15", "2016-05-15", "2016-05-16",
    "2016-07-14", "2016-08-15", "2016-11-01", "2016-11-11", "2016-12-25", "2016-12-31", "2017-01-01",
    "2017-01-06", "2017-02-14", "2017-02-28", "2017-04-16", "2017-04-16", "2017-04-17", "2017-05-01",
    "2017-05-08", "2017-05-25", "2017-06-04", "2017-06-04", "2017-06-05", "2017-07-14", "2017-08-15",
    "2017-11-01", "2017-11-11", "2017-12-25", "2017-12-31", "2018-01-01", "2018-01-06", "2018-02-13",
    "2018-02-14", "2018-04-01", "2018-04-01", "2018-04-02", "2018-05-01", "2018-05-08", "2018-05-10",
    "2018-05-20", "2018-05-20", "2018-05-21", "2018-07-14", "2018-08-15", "2018-11-01", "2018-11-11",
    "2018-12-25", "2018-12-31", "2019-01-01", "2019-01-06", "2019-02-14", "2019-03-05", "2019-04-21",
    "2019-04-21", "2019-04-22", "2019-05-01", "2019-05-08", "2019-05-30", "2019-06-09", "2019-06-09",
    "2019-06-10", "2019-07-14", "2019-08-15", "2019-11-01", "2019-11-11", "2019-12-25", "2019-12-31",
];

static DAYS_OFF_SET: Lazy<HashSet<NaiveDate>> = Lazy::new(|| {
    DAYS_OFF
        .iter()
        .map(|s| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("invalid literal in holiday table")
        })
        .collect()
});

/// True iff `date` is a French public holiday.
///
/// Only 2013-2019 is covered; a query outside that range logs a warning and
/// answers `false`.
pub fn is_day_off(date: NaiveDate) -> bool {
    if date.year() < FIRST_COVERED_YEAR || date.year() > LAST_COVERED_YEAR {
        warn!(
            "Holiday calendar only covers {}-{}; {} treated as a working day",
            FIRST_COVERED_YEAR, LAST_COVERED_YEAR, date
        );
        return false;
    }
    DAYS_OFF_SET.contains(&date)
}

/// True iff the weekday index (0=Monday..6=Sunday) is 5 or 6.
pub fn is_weekend(date: NaiveDate) -> bool {
    date.weekday().num_days_from_monday() >= 5
}

/// True for a Friday whose preceding Thursday is a day off, or a Monday whose
/// following Tuesday is a day off.
pub fn is_bridge(date: NaiveDate) -> bool {
    match date.weekday() {
        Weekday::Fri => date.pred_opt().map_or(false, is_day_off),
        Weekday::Mon => date.succ_opt().map_or(false, is_day_off),
        _ => false,
    }
}
