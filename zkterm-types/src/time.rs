//! Terminal clock encoding
//!
//! Terminals count seconds in a calendar where every month has 31 days
//! and every year 12 such months, starting at 2000-01-01 00:00:00.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::error::{Error, Result};

const SECONDS_PER_DAY: u32 = 86_400;
const DAYS_PER_MONTH: u32 = 31;
const MONTHS_PER_YEAR: u32 = 12;
const BASE_YEAR: i32 = 2000;

/// Encode a timestamp for `CMD_SET_TIME`
///
/// Only years 2000..=2099 fit the two-digit year field.
pub fn encode_time(time: &NaiveDateTime) -> Result<u32> {
    let year = time.year();
    if !(BASE_YEAR..BASE_YEAR + 100).contains(&year) {
        return Err(Error::Validation(format!(
            "year {} outside the terminal range 2000-2099",
            year
        )));
    }

    let days = ((year - BASE_YEAR) as u32 * MONTHS_PER_YEAR + (time.month() - 1)) * DAYS_PER_MONTH
        + (time.day() - 1);
    let seconds = (time.hour() * 60 + time.minute()) * 60 + time.second();

    Ok(days * SECONDS_PER_DAY + seconds)
}

/// Decode a `CMD_GET_TIME` value
pub fn decode_time(value: u32) -> Result<NaiveDateTime> {
    let mut t = value;

    let second = t % 60;
    t /= 60;
    let minute = t % 60;
    t /= 60;
    let hour = t % 24;
    t /= 24;
    let day = t % DAYS_PER_MONTH + 1;
    t /= DAYS_PER_MONTH;
    let month = t % MONTHS_PER_YEAR + 1;
    t /= MONTHS_PER_YEAR;
    let year = BASE_YEAR + t as i32;

    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .ok_or_else(|| {
            Error::Parse(format!(
                "terminal time {} is not a calendar date ({}-{:02}-{:02})",
                value, year, month, day
            ))
        })
}

/// Decode the six-byte `yy mm dd HH MM SS` stamp carried by events
pub fn decode_event_stamp(stamp: &[u8]) -> Result<NaiveDateTime> {
    crate::error::ensure_len("event timestamp", stamp, 6)?;

    let [yy, mo, d, h, mi, s] = [stamp[0], stamp[1], stamp[2], stamp[3], stamp[4], stamp[5]];
    NaiveDate::from_ymd_opt(BASE_YEAR + yy as i32, mo as u32, d as u32)
        .and_then(|date| date.and_hms_opt(h as u32, mi as u32, s as u32))
        .ok_or_else(|| Error::Parse(format!("invalid event timestamp {:?}", &stamp[..6])))
}
