//! Reminders, notes and tasks: everything the agent writes to memory on the
//! user's behalf.

use std::sync::LazyLock;

use chrono::{DateTime, Local, TimeDelta, Utc};
use regex::Regex;

use super::{is_word, strip_keyword};
use crate::dispatch::TurnContext;
use crate::error::{HandlerError, HandlerResult};
use crate::memory::{MemoryState, Reminder, Task};
use crate::response::AgentResponse;

static REMINDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^remind\s+me\s+to\s+(.+)\s+in\s+([0-9]+)\s+([a-z]+)$").unwrap()
});

const REMINDER_USAGE: &str =
    "Usage: remind me to <task> in <N> <seconds|minutes|hours|days|weeks>";

// ---------------------------------------------------------------------------
// Reminders
// ---------------------------------------------------------------------------

pub(super) fn is_reminder(text: &str, _state: &MemoryState) -> bool {
    strip_keyword(text, "remind").is_some_and(|rest| strip_keyword(rest, "me").is_some())
        || is_word(text, "reminders")
}

pub(super) fn reminder(text: &str, ctx: &mut TurnContext<'_>) -> HandlerResult<AgentResponse> {
    if is_word(text, "reminders") {
        return Ok(list_reminders(ctx));
    }

    let caps = REMINDER_RE
        .captures(text.trim())
        .ok_or_else(|| HandlerError::user(REMINDER_USAGE))?;
    let what = caps[1].trim().to_string();
    let amount: i64 = caps[2]
        .parse()
        .map_err(|_| HandlerError::user(format!("'{}' is too large a number.", &caps[2])))?;
    let unit = caps[3].to_ascii_lowercase();

    if amount == 0 {
        return Err(HandlerError::user("The delay must be at least 1."));
    }
    let per_unit = unit_seconds(&unit).ok_or_else(|| {
        HandlerError::user(format!("I don't know the time unit '{unit}'. {REMINDER_USAGE}"))
    })?;
    let due = amount
        .checked_mul(per_unit)
        .and_then(TimeDelta::try_seconds)
        .and_then(|delta| ctx.clock().now().checked_add_signed(delta))
        .ok_or_else(|| HandlerError::user("That is too far in the future for me to remember."))?;

    ctx.state_mut().reminders.push(Reminder {
        text: what.clone(),
        due,
    });
    tracing::debug!(%due, "reminder scheduled");

    let text = format!("Okay, I'll remind you to {what} at {}.", local_time(due));
    Ok(AgentResponse::new(text, "reminder", 0.9).with_metadata("due", due.to_rfc3339()))
}

fn list_reminders(ctx: &TurnContext<'_>) -> AgentResponse {
    let reminders = &ctx.state().reminders;
    if reminders.is_empty() {
        return AgentResponse::new("You have no reminders.", "reminder", 1.0);
    }

    let now = ctx.clock().now();
    let mut ordered: Vec<&Reminder> = reminders.iter().collect();
    ordered.sort_by_key(|r| r.due);

    let mut text = String::from("Your reminders:");
    for (i, r) in ordered.iter().enumerate() {
        text.push_str(&format!("\n{}. {} at {}", i + 1, r.text, local_time(r.due)));
        if r.due <= now {
            text.push_str(" (due)");
        }
    }
    AgentResponse::new(text, "reminder", 1.0)
}

/// Seconds in one `unit`, accepting singular, plural and short forms.
fn unit_seconds(unit: &str) -> Option<i64> {
    let seconds = match unit {
        "second" | "seconds" | "sec" | "secs" => 1,
        "minute" | "minutes" | "min" | "mins" => 60,
        "hour" | "hours" | "hr" | "hrs" => 60 * 60,
        "day" | "days" => 24 * 60 * 60,
        "week" | "weeks" => 7 * 24 * 60 * 60,
        _ => return None,
    };
    Some(seconds)
}

fn local_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

// ---------------------------------------------------------------------------
// Notes
// ---------------------------------------------------------------------------

pub(super) fn is_note(text: &str, _state: &MemoryState) -> bool {
    strip_keyword(text, "note").is_some() || is_word(text, "notes")
}

pub(super) fn note(text: &str, ctx: &mut TurnContext<'_>) -> HandlerResult<AgentResponse> {
    if is_word(text, "notes") {
        let notes = &ctx.state().notes;
        if notes.is_empty() {
            return Ok(AgentResponse::new("You have no notes yet.", "note", 1.0));
        }
        let mut listing = String::from("Your notes:");
        for (i, n) in notes.iter().enumerate() {
            listing.push_str(&format!("\n{}. {n}", i + 1));
        }
        return Ok(AgentResponse::new(listing, "note", 1.0));
    }

    let body = strip_keyword(text, "note").unwrap_or_default();
    if body.is_empty() {
        return Err(HandlerError::user("Usage: note <text>"));
    }
    ctx.state_mut().notes.push(body.to_string());
    Ok(AgentResponse::new(format!("Noted: {body}"), "note", 1.0))
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

pub(super) fn is_task(text: &str, _state: &MemoryState) -> bool {
    strip_keyword(text, "task").is_some()
        || is_word(text, "tasks")
        || strip_keyword(text, "done").is_some()
}

pub(super) fn task(text: &str, ctx: &mut TurnContext<'_>) -> HandlerResult<AgentResponse> {
    if is_word(text, "tasks") {
        return Ok(list_tasks(ctx.state()));
    }
    if let Some(index) = strip_keyword(text, "done") {
        return complete_task(index, ctx);
    }

    let description = strip_keyword(text, "task").unwrap_or_default();
    if description.is_empty() {
        return Err(HandlerError::user("Usage: task <description>"));
    }
    let tasks = &mut ctx.state_mut().tasks;
    tasks.push(Task::pending(description));
    Ok(
        AgentResponse::new(format!("Added task {}: {description}", tasks.len()), "task", 1.0)
            .with_metadata("index", tasks.len()),
    )
}

fn list_tasks(state: &MemoryState) -> AgentResponse {
    if state.tasks.is_empty() {
        return AgentResponse::new("You have no tasks yet.", "task", 1.0);
    }
    let mut text = String::from("Your tasks:");
    for (i, t) in state.tasks.iter().enumerate() {
        let mark = if t.done { 'x' } else { ' ' };
        text.push_str(&format!("\n{}. [{mark}] {}", i + 1, t.description));
    }
    AgentResponse::new(text, "task", 1.0)
}

fn complete_task(raw: &str, ctx: &mut TurnContext<'_>) -> HandlerResult<AgentResponse> {
    let count = ctx.state().tasks.len();
    let index: usize = match raw.parse() {
        Ok(index) => index,
        // All digits but wider than usize: a real number, just not a task.
        Err(_) if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) => {
            return Err(no_such_task(raw, count));
        }
        Err(_) => {
            return Err(HandlerError::user(
                "Usage: done <N>, where N is a task number from 'tasks'.",
            ));
        }
    };

    let Some(existing) = index.checked_sub(1).and_then(|i| ctx.state().tasks.get(i)) else {
        return Err(no_such_task(&index.to_string(), count));
    };

    if existing.done {
        return Ok(AgentResponse::new(
            format!("Task {index} is already done: {}", existing.description),
            "task",
            1.0,
        ));
    }

    let description = match ctx.state_mut().task_mut(index) {
        Some(task) => {
            task.done = true;
            task.description.clone()
        }
        None => return Err(HandlerError::user(format!("There is no task {index}."))),
    };
    Ok(AgentResponse::new(format!("Marked task {index} as done: {description}"), "task", 1.0))
}

fn no_such_task(index: &str, count: usize) -> HandlerError {
    let message = match count {
        0 => format!("There is no task {index}; you have no tasks yet."),
        1 => format!("There is no task {index}; you have 1 task."),
        n => format!("There is no task {index}; you have {n} tasks."),
    };
    HandlerError::user(message)
}
