//! Employment duration and experience score
//!
//! Date tokens are "MM.YYYY" or "YYYY" (also "MM/YYYY", "MM-YYYY"). A year-only
//! token means January of that year. An end date containing a present-tense
//! marker as a whole word means "today".

use crate::profile::CvRecord;
use chrono::{Datelike, NaiveDate, Utc};
use regex::Regex;
use std::sync::LazyLock;

static PRESENT_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:present|current|now|ongoing|today|obecnie|teraz)\b")
        .expect("static regex")
});

static DATE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    // Month is optional; year is four digits
    Regex::new(r"(?:\b(\d{1,2})\s*[./-]\s*)?\b(\d{4})\b").expect("static regex")
});

const PROJECT_WEIGHT: f64 = 0.5;
const ACHIEVEMENT_WEIGHT: f64 = 1.0;

/// Months between two date tokens, anchored to the current date for "present"
pub fn duration_in_months(start: &str, end: &str) -> Option<u32> {
    duration_in_months_at(start, end, Utc::now().date_naive())
}

/// Months between two date tokens with an explicit "today".
///
/// Returns `None` when either side cannot be parsed or the range runs backwards.
pub fn duration_in_months_at(start: &str, end: &str, today: NaiveDate) -> Option<u32> {
    let (start_year, start_month) = parse_date_token(start)?;
    let (end_year, end_month) = if is_present(end) {
        (today.year(), today.month())
    } else {
        parse_date_token(end)?
    };

    let months = (end_year - start_year) * 12 + end_month as i32 - start_month as i32;
    u32::try_from(months).ok()
}

fn is_present(token: &str) -> bool {
    PRESENT_MARKER.is_match(token)
}

fn parse_date_token(token: &str) -> Option<(i32, u32)> {
    let captures = DATE_TOKEN.captures(token)?;
    let year: i32 = captures.get(2)?.as_str().parse().ok()?;
    let month = match captures.get(1) {
        Some(m) => m.as_str().parse::<u32>().ok()?,
        None => 1,
    };
    (1..=12).contains(&month).then_some((year, month))
}

/// Experience score for a parsed CV:
/// years of work + 0.5 per project + 1.0 per achievement, rounded to 2 decimals.
///
/// Work entries with an unparsable range count as zero.
pub fn experience_score(record: &CvRecord, today: NaiveDate) -> f64 {
    let total_months: u32 = record
        .work_experience
        .iter()
        .filter_map(|exp| {
            duration_in_months_at(
                exp.start_date.as_deref().unwrap_or_default(),
                exp.end_date.as_deref().unwrap_or_default(),
                today,
            )
        })
        .sum();

    let score = total_months as f64 / 12.0
        + record.projects.len() as f64 * PROJECT_WEIGHT
        + record.achievements.len() as f64 * ACHIEVEMENT_WEIGHT;
    (score * 100.0).round() / 100.0
}
