//! Relative date-phrase resolution.
//!
//! Queries carry phrases like "yesterday", "last Tuesday", or "this month".
//! Resolution is always performed against an explicit reference date so the
//! classifier stays a pure function; callers pass `Utc::now().date_naive()`
//! (or a fixed date in tests).

use chrono::{Datelike, Days, NaiveDate, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::DateScope;

static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").expect("valid regex"));

static LAST_N_DAYS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:last|past)\s+(\d{1,3})\s+days?\b").expect("valid regex"));

static MONTH_DAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(january|february|march|april|may|june|july|august|september|october|november|december)\s+(\d{1,2})(?:st|nd|rd|th)?\b",
    )
    .expect("valid regex")
});

static LAST_WEEKDAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:last|this)\s+(monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b")
        .expect("valid regex")
});

/// Resolve a relative or explicit date phrase in `text` against `today`.
///
/// Matching is ordered: explicit dates win over relative phrases, and more
/// specific relative phrases win over broader ones. Returns `None` when no
/// phrase is found; defaulting per intent is the classifier's job.
pub fn resolve_date_scope(text: &str, today: NaiveDate) -> Option<DateScope> {
    let text = text.to_lowercase();

    if let Some(caps) = ISO_DATE.captures(&text) {
        let y: i32 = caps[1].parse().ok()?;
        let m: u32 = caps[2].parse().ok()?;
        let d: u32 = caps[3].parse().ok()?;
        if let Some(date) = NaiveDate::from_ymd_opt(y, m, d) {
            return Some(DateScope::single(date));
        }
    }

    if let Some(caps) = MONTH_DAY.captures(&text) {
        let month = month_number(&caps[1]);
        let day: u32 = caps[2].parse().ok()?;
        if let Some(date) = NaiveDate::from_ymd_opt(today.year(), month, day) {
            return Some(DateScope::single(date));
        }
    }

    if let Some(caps) = LAST_N_DAYS.captures(&text) {
        let n: u64 = caps[1].parse().ok()?;
        if n > 0 {
            return Some(last_n_days(today, n));
        }
    }

    if let Some(caps) = LAST_WEEKDAY.captures(&text) {
        let weekday = weekday_from_name(&caps[1]);
        return Some(DateScope::single(previous_weekday(today, weekday)));
    }

    // Broad named phrases, most specific first.
    if text.contains("day before yesterday") {
        return today
            .checked_sub_days(Days::new(2))
            .map(DateScope::single);
    }
    if text.contains("yesterday") {
        return Some(DateScope::single(yesterday(today)));
    }
    if text.contains("today") {
        return Some(DateScope::single(today));
    }
    if text.contains("this week") {
        let monday = today - Days::new(today.weekday().num_days_from_monday() as u64);
        return Some(DateScope::range(monday, today));
    }
    if text.contains("last week") {
        return Some(last_n_days(today, 7));
    }
    if text.contains("this month") {
        let first = NaiveDate::from_ymd_opt(today.year(), today.month(), 1)?;
        return Some(DateScope::range(first, today));
    }
    if text.contains("last month") {
        return Some(last_n_days(today, 30));
    }

    None
}

/// The day before `today`.
pub fn yesterday(today: NaiveDate) -> NaiveDate {
    today - Days::new(1)
}

/// Inclusive range covering the n days ending at `today`.
pub fn last_n_days(today: NaiveDate, n: u64) -> DateScope {
    DateScope::range(today - Days::new(n), today)
}

/// Most recent date strictly before `today` falling on `weekday`.
fn previous_weekday(today: NaiveDate, weekday: Weekday) -> NaiveDate {
    let mut date = today - Days::new(1);
    while date.weekday() != weekday {
        date = date - Days::new(1);
    }
    date
}

fn weekday_from_name(name: &str) -> Weekday {
    match name {
        "monday" => Weekday::Mon,
        "tuesday" => Weekday::Tue,
        "wednesday" => Weekday::Wed,
        "thursday" => Weekday::Thu,
        "friday" => Weekday::Fri,
        "saturday" => Weekday::Sat,
        _ => Weekday::Sun,
    }
}

fn month_number(name: &str) -> u32 {
    match name {
        "january" => 1,
        "february" => 2,
        "march" => 3,
        "april" => 4,
        "may" => 5,
        "june" => 6,
        "july" => 7,
        "august" => 8,
        "september" => 9,
        "october" => 10,
        "november" => 11,
        _ => 12,
    }
}
