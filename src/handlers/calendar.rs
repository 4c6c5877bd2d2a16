//! Date arithmetic: `age <YYYY-MM-DD>` and `leap <year>`.

use chrono::{Datelike, NaiveDate};

use super::strip_keyword;
use crate::dispatch::TurnContext;
use crate::error::{HandlerError, HandlerResult};
use crate::memory::MemoryState;
use crate::response::AgentResponse;

pub(super) fn is_age(text: &str, _state: &MemoryState) -> bool {
    strip_keyword(text, "age").is_some()
}

pub(super) fn age(text: &str, ctx: &mut TurnContext<'_>) -> HandlerResult<AgentResponse> {
    let raw = strip_keyword(text, "age").unwrap_or_default();
    if raw.is_empty() {
        return Err(HandlerError::user("Usage: age <YYYY-MM-DD>, e.g. age 1990-05-17"));
    }
    let birth = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        HandlerError::user(format!(
            "I couldn't read '{raw}' as a date. Please use the YYYY-MM-DD format."
        ))
    })?;

    let today = ctx.clock().today();
    let years = years_between(birth, today).ok_or_else(|| {
        HandlerError::user(format!("{birth} is in the future, so you haven't been born yet."))
    })?;

    Ok(AgentResponse::new(format!("You are {years} years old."), "age", 1.0)
        .with_metadata("years", years))
}

/// Whole years elapsed from `birth` to `today`, or `None` if `birth` is later.
///
/// A birthday counts as reached once `(month, day)` is not before it, so a
/// Feb-29 birthday is reached on Mar-1 in common years.
pub(crate) fn years_between(birth: NaiveDate, today: NaiveDate) -> Option<u32> {
    if birth > today {
        return None;
    }
    let mut years = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        years -= 1;
    }
    u32::try_from(years).ok()
}

pub(super) fn is_leap(text: &str, _state: &MemoryState) -> bool {
    strip_keyword(text, "leap").is_some()
}

pub(super) fn leap(text: &str, _ctx: &mut TurnContext<'_>) -> HandlerResult<AgentResponse> {
    let raw = strip_keyword(text, "leap").unwrap_or_default();
    let year: i32 = raw
        .parse()
        .map_err(|_| HandlerError::user(format!("Usage: leap <year>; '{raw}' is not a year.")))?;

    let verdict = is_leap_year(year);
    let text = if verdict {
        format!("{year} is a leap year.")
    } else {
        format!("{year} is not a leap year.")
    };
    Ok(AgentResponse::new(text, "leap_year", 1.0).with_metadata("leap", verdict))
}

/// Gregorian rule: divisible by 4, and not by 100 unless also by 400.
pub(crate) fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}
