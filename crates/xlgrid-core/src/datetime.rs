//! Excel serial date/time numbers
//!
//! Dates are stored in cells as plain numbers: the whole part counts days
//! in the 1900 date system (1900-01-01 is 1), the fraction is the time of
//! day. Serial 60 stands for 1900-02-29, a day that never existed but that
//! Excel counts, so every serial from 61 on is one day ahead of a plain
//! count from 1899-12-31.

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};

use crate::error::{Error, Result};

const SECONDS_PER_DAY: i64 = 86_400;

/// Serial of the phantom 1900-02-29
const PHANTOM_LEAP_DAY: i64 = 60;

/// Serial of 1900-01-01
pub const MIN_SERIAL: f64 = 1.0;

/// Serial of 9999-12-31, the last day Excel can show
pub const MAX_SERIAL: f64 = 2_958_465.0;

fn midnight(year: i32, month: u32, day: u32) -> Result<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| Error::internal(format!("invalid base date {}-{}-{}", year, month, day)))
}

/// Convert a serial number to a date and time, rounded to the second
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use xlgrid_core::datetime::from_serial;
///
/// let moment = from_serial(6069.86742).unwrap();
/// assert_eq!(
///     moment,
///     NaiveDate::from_ymd_opt(1916, 8, 12).unwrap().and_hms_opt(20, 49, 5).unwrap()
/// );
/// ```
pub fn from_serial(serial: f64) -> Result<NaiveDateTime> {
    if !serial.is_finite() || serial < MIN_SERIAL || serial >= MAX_SERIAL + 1.0 {
        return Err(Error::InvalidDateTime(format!(
            "serial {} is outside of {}..{}",
            serial,
            MIN_SERIAL,
            MAX_SERIAL + 1.0
        )));
    }

    let seconds = (serial * SECONDS_PER_DAY as f64).round() as i64;
    let days = seconds / SECONDS_PER_DAY;
    let base = match days.cmp(&PHANTOM_LEAP_DAY) {
        std::cmp::Ordering::Less => midnight(1899, 12, 31)?,
        std::cmp::Ordering::Greater => midnight(1899, 12, 30)?,
        std::cmp::Ordering::Equal => {
            return Err(Error::InvalidDateTime(format!(
                "serial {} is 1900-02-29, which does not exist",
                serial
            )))
        }
    };
    base.checked_add_signed(Duration::seconds(seconds))
        .ok_or_else(|| Error::InvalidDateTime(format!("serial {} overflows", serial)))
}

/// Convert a date and time to its serial number
///
/// Only 1900-01-01 through 9999-12-31 can be represented.
pub fn to_serial(moment: NaiveDateTime) -> Result<f64> {
    let first = midnight(1900, 1, 1)?;
    let last = midnight(9999, 12, 31)?;
    if moment < first || moment.date() > last.date() {
        return Err(Error::InvalidDateTime(format!(
            "{} is outside of 1900-01-01..=9999-12-31",
            moment
        )));
    }

    let mut days = (moment.date() - midnight(1899, 12, 30)?.date()).num_days();
    // before 1900-03-01 the count runs one day short of Excel's
    if days <= PHANTOM_LEAP_DAY {
        days -= 1;
    }
    let time = moment.time();
    let seconds = time.num_seconds_from_midnight() as f64 + time.nanosecond() as f64 / 1e9;
    Ok(days as f64 + seconds / SECONDS_PER_DAY as f64)
}
