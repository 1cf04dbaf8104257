use std::collections::HashMap;
use std::fmt;
use time::{Duration, OffsetDateTime};

use crate::domain::enrollment::{Enrollment, EnrollmentStatus};

pub const EXPIRED: &str = "Expired";

/// Active enrollments with this many whole days left (or fewer) offer renewal.
pub const RENEWAL_WINDOW_DAYS: i64 = 5;

/// Enrollment id to countdown text.
pub type Countdowns = HashMap<String, String>;

/// Source of "now" for everything that renders time left.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> OffsetDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Remaining {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl fmt::Display for Remaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}d {}h {}m {}s",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}

/// Time left until `expiration`, or `None` once it has passed.
pub fn remaining(expiration: OffsetDateTime, now: OffsetDateTime) -> Option<Remaining> {
    let diff = expiration - now;
    if diff <= Duration::ZERO {
        return None;
    }

    Some(Remaining {
        days: diff.whole_days(),
        hours: diff.whole_hours() % 24,
        minutes: diff.whole_minutes() % 60,
        seconds: diff.whole_seconds() % 60,
    })
}

pub fn format_remaining(expiration: OffsetDateTime, now: OffsetDateTime) -> String {
    match remaining(expiration, now) {
        Some(remaining) => remaining.to_string(),
        None => EXPIRED.to_string(),
    }
}

/// Whole days left on an enrollment, floored at zero.
pub fn days_remaining(enrollment: &Enrollment, now: OffsetDateTime) -> Option<i64> {
    let expiration = enrollment.expiration_date?;
    Some(remaining(expiration, now).map_or(0, |remaining| remaining.days))
}

/// Countdown text for every approved enrollment the backend has not marked
/// expired. Entries whose date passed since the last fetch read "Expired".
pub fn countdowns(enrollments: &[Enrollment], now: OffsetDateTime) -> Countdowns {
    enrollments
        .iter()
        .filter(|enrollment| enrollment.status == EnrollmentStatus::Approved && !enrollment.expired)
        .filter_map(|enrollment| {
            let expiration = enrollment.expiration_date?;
            Some((enrollment.id.clone(), format_remaining(expiration, now)))
        })
        .collect()
}

pub fn renewal_due(enrollment: &Enrollment, now: OffsetDateTime) -> bool {
    if enrollment.status != EnrollmentStatus::Approved || enrollment.expired {
        return false;
    }
    match enrollment.expiration_date.and_then(|date| remaining(date, now)) {
        Some(remaining) => remaining.days <= RENEWAL_WINDOW_DAYS,
        None => false,
    }
}
