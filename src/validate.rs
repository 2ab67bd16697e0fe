//! Input checks run before the browser is touched.

use chrono::{Datelike, Local, Months, NaiveDate};

use crate::error::ValidationError;

/// First year PRISM has data for.
pub const FIRST_YEAR: i32 = 1895;

pub fn check_month(month: u32) -> Result<(), ValidationError> {
    if (1..=12).contains(&month) {
        Ok(())
    } else {
        Err(ValidationError::Month(month))
    }
}

pub fn is_leap_year(year: i32) -> bool {
    NaiveDate::from_ymd_opt(year, 2, 29).is_some()
}

/// Number of days in `month` of `year`. `month` must already be valid.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        2 if is_leap_year(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

pub fn check_day(day: u32, month: u32, year: i32) -> Result<(), ValidationError> {
    check_month(month)?;
    let max = days_in_month(year, month);
    if (1..=max).contains(&day) {
        Ok(())
    } else {
        Err(ValidationError::Day {
            day,
            month,
            year,
            max,
        })
    }
}

/// `year` must fall between [`FIRST_YEAR`] and `present`.
pub fn check_year(year: i32, present: i32) -> Result<(), ValidationError> {
    if (FIRST_YEAR..=present).contains(&year) {
        Ok(())
    } else {
        Err(ValidationError::Year {
            year,
            min: FIRST_YEAR,
            max: present,
        })
    }
}

pub fn check_year_now(year: i32) -> Result<(), ValidationError> {
    check_year(year, Local::now().year())
}

pub fn check_coordinates(latitude: f64, longitude: f64) -> Result<(), ValidationError> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(ValidationError::Latitude(latitude));
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(ValidationError::Longitude(longitude));
    }
    Ok(())
}

pub fn check_year_order(start_year: i32, end_year: i32) -> Result<(), ValidationError> {
    if start_year > end_year {
        return Err(ValidationError::YearOrder);
    }
    Ok(())
}

/// Orders two (year, month, day) triples, reporting the coarsest field that is out of order.
pub fn check_date_order(
    start: (i32, u32, u32),
    end: (i32, u32, u32),
) -> Result<(), ValidationError> {
    let ((sy, sm, sd), (ey, em, ed)) = (start, end);
    check_year_order(sy, ey)?;
    if sy == ey && sm > em {
        return Err(ValidationError::MonthOrder);
    }
    if sy == ey && sm == em && sd > ed {
        return Err(ValidationError::DayOrder);
    }
    Ok(())
}

/// PRISM marks the last six months as provisional; values there may still change.
pub fn is_within_past_6_months(date: NaiveDate, today: NaiveDate) -> bool {
    match today.checked_sub_months(Months::new(6)) {
        Some(cutoff) => date > cutoff,
        None => false,
    }
}

pub fn is_float_string(value: &str) -> bool {
    value.trim().parse::<f64>().is_ok()
}
