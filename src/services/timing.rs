//! Timing Advisor
//!
//! Frames a best-weekday result against the current wall-clock time. The
//! current time is always passed in.

use crate::types::{BestDayResult, SessionTiming, TimingInfo, Urgency};
use chrono::{DateTime, Datelike, Duration, NaiveTime, Timelike, Utc, Weekday};

/// Hour (UTC) at which a future target day is considered to start.
pub const SESSION_HOUR: u32 = 9;

/// `now` moved to `hour:minute:second` on the same UTC day.
fn at_time(now: DateTime<Utc>, hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
    let time = NaiveTime::from_hms_opt(hour, minute, second).unwrap_or(NaiveTime::MIN);
    now.date_naive().and_time(time).and_utc()
}

fn hours_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 3_600_000.0
}

/// Days from `from` forward to the next `to` (0 when equal).
pub fn days_until(from: Weekday, to: Weekday) -> u32 {
    (to.num_days_from_monday() + 7 - from.num_days_from_monday()) % 7
}

/// Time until the next occurrence of the best weekday.
///
/// When today is the best day the target is 23:59:59 today and urgency is
/// always [`Urgency::Inmediata`]. Otherwise the target is 09:00 UTC on the
/// best day.
pub fn advise(now: DateTime<Utc>, best: &BestDayResult) -> TimingInfo {
    let current_weekday = now.weekday();
    let days = days_until(current_weekday, best.best_day);

    let next_best_day = if days == 0 {
        at_time(now, 23, 59, 59)
    } else {
        at_time(now, SESSION_HOUR, 0, 0) + Duration::days(days as i64)
    };
    let hours_until_best_day = hours_between(now, next_best_day);

    let urgency = if days == 0 {
        Urgency::Inmediata
    } else {
        Urgency::from_hours(hours_until_best_day)
    };

    TimingInfo {
        now,
        current_weekday,
        best_day: best.best_day,
        best_day_score: best.best_day_score,
        confidence: best.confidence,
        is_best_day_today: days == 0,
        days_until_best_day: days,
        hours_until_best_day,
        next_best_day,
        urgency,
        total_samples: best.total_samples,
        per_day: best.per_day.clone(),
    }
}

/// Time until the next 09:00 UTC session on `weekday`.
///
/// If today is `weekday` and 09:00 has already passed, the next session is
/// a week away.
pub fn session_timing(now: DateTime<Utc>, weekday: Weekday) -> SessionTiming {
    let mut days = days_until(now.weekday(), weekday);
    if days == 0 && now.hour() >= SESSION_HOUR {
        days = 7;
    }

    let next_session = at_time(now, SESSION_HOUR, 0, 0) + Duration::days(days as i64);
    let hours_until = hours_between(now, next_session);
    let urgency = Urgency::from_hours(hours_until);
    let timing_score = match urgency {
        Urgency::Inmediata => 1.0,
        Urgency::Alta => 0.8,
        Urgency::Media => 0.5,
        Urgency::Baja => 0.2,
    };

    SessionTiming {
        next_session,
        hours_until,
        urgency,
        timing_score,
        is_session_day_today: now.weekday() == weekday && now.hour() < 12,
    }
}
