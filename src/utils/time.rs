//! Shift arithmetic. Payable time is always derived from the raw clock
//! times; quarter-hour rounding only feeds what is displayed to people.

use crate::error::{Error, Result};
use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;
const QUARTER_HOUR_SECONDS: i64 = 15 * 60;
/// Oldest shift that can still be submitted, in days before today.
const MAX_SHIFT_AGE_DAYS: u64 = 366;
/// Slack for submitters whose local date is ahead of UTC.
const MAX_SHIFT_LEAD_DAYS: u64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftHours {
    pub worked_minutes: i64,
    pub is_overnight: bool,
}

impl ShiftHours {
    /// Exact hours worked, unrounded.
    pub fn hours(&self) -> Decimal {
        Decimal::from(self.worked_minutes) / Decimal::from(60)
    }

    /// Hours rounded to two places for storage and display.
    pub fn total_hours(&self) -> Decimal {
        let mut hours = self
            .hours()
            .round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven);
        hours.rescale(2);
        hours
    }

    pub fn ensure_within(&self, max_hours: i64) -> Result<()> {
        if self.worked_minutes > max_hours * 60 {
            return Err(Error::InvalidInterval(format!(
                "shift of {} exceeds the {} hour ceiling",
                self.total_hours(),
                max_hours
            )));
        }
        Ok(())
    }
}

/// Hours between two clock times, less the unpaid break.
///
/// An `end` at or before `start` is read as falling on the next day.
pub fn compute_shift_hours(start: NaiveTime, end: NaiveTime, break_minutes: i64) -> Result<ShiftHours> {
    if break_minutes < 0 {
        return Err(Error::InvalidInterval("break cannot be negative".to_string()));
    }

    let start_secs = i64::from(start.num_seconds_from_midnight());
    let end_secs = i64::from(end.num_seconds_from_midnight());
    let is_overnight = end_secs <= start_secs;
    let elapsed = if is_overnight {
        end_secs + SECONDS_PER_DAY - start_secs
    } else {
        end_secs - start_secs
    };

    let worked_secs = elapsed - break_minutes * 60;
    if worked_secs < 0 {
        return Err(Error::InvalidInterval(format!(
            "break of {} minutes is longer than the {} minute shift",
            break_minutes,
            elapsed / 60
        )));
    }

    Ok(ShiftHours {
        worked_minutes: worked_secs / 60,
        is_overnight,
    })
}

/// Anchors clock times to a calendar date in UTC, moving `end` to the
/// following day for overnight shifts.
pub fn shift_bounds(
    shift_date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
    is_overnight: bool,
) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let start_at = Utc.from_utc_datetime(&shift_date.and_time(start));
    let end_date = if is_overnight {
        shift_date
            .checked_add_days(Days::new(1))
            .ok_or_else(|| Error::InvalidInterval(format!("shift date {} is out of range", shift_date)))?
    } else {
        shift_date
    };
    let end_at = Utc.from_utc_datetime(&end_date.and_time(end));
    Ok((start_at, end_at))
}

/// Rejects shift dates more than a day ahead of `today` or older than a year.
pub fn ensure_recent_shift_date(shift_date: NaiveDate, today: NaiveDate) -> Result<()> {
    let earliest = today.checked_sub_days(Days::new(MAX_SHIFT_AGE_DAYS));
    let latest = today.checked_add_days(Days::new(MAX_SHIFT_LEAD_DAYS));
    let too_old = earliest.map_or(false, |earliest| shift_date < earliest);
    let too_new = latest.map_or(false, |latest| shift_date > latest);
    if too_old || too_new {
        return Err(Error::InvalidInterval(format!(
            "shift date {} is outside the accepted window around {}",
            shift_date, today
        )));
    }
    Ok(())
}

/// Nearest 15-minute boundary; the 7m30s midpoint rounds up.
pub fn round_to_quarter_hour(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    let secs = timestamp.timestamp();
    let floor = secs - secs.rem_euclid(QUARTER_HOUR_SECONDS);
    let offset_nanos = i128::from(secs - floor) * 1_000_000_000
        + i128::from(timestamp.timestamp_subsec_nanos());
    let half_nanos = i128::from(QUARTER_HOUR_SECONDS / 2) * 1_000_000_000;
    let rounded = if offset_nanos >= half_nanos {
        floor + QUARTER_HOUR_SECONDS
    } else {
        floor
    };
    Utc.timestamp_opt(rounded, 0)
        .single()
        .unwrap_or(timestamp)
}

/// Parses `HH:MM` (or `HH:MM:SS`) clock times, dropping seconds.
pub fn parse_clock_time(raw: &str) -> Result<NaiveTime> {
    let raw = raw.trim();
    let parsed = NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| Error::BadRequest(format!("invalid clock time '{}', expected HH:MM", raw)))?;
    Ok(parsed.with_second(0).unwrap_or(parsed).with_nanosecond(0).unwrap_or(parsed))
}
