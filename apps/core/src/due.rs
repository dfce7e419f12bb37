use std::sync::OnceLock;

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use regex::{Captures, Regex};

use crate::model::DueStamp;

/// Outcome of reading the text after `due:`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DueDirective {
    Resolved(DueStamp),
    /// The user is still typing; the raw text is kept for the shortcut menu.
    Unresolved(String),
}

impl DueDirective {
    pub fn resolved(&self) -> Option<DueStamp> {
        match self {
            Self::Resolved(stamp) => Some(*stamp),
            Self::Unresolved(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueMenuEntry {
    pub title: String,
    pub subtitle: String,
    pub argument: String,
}

const SHORTCUTS: [(&str, u64); 4] = [
    ("today", 0),
    ("tomorrow", 1),
    ("in a week", 7),
    ("in a month", 30),
];

const INVALID_FORMAT_HINT: &str =
    "enter an integer (days) or add 'w' (weeks) or 'm' (months). Optional: time in 24h format";

fn relative_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^(\d+)([dwm])(?:(\d{2}):(\d{2}))?$").ok())
        .as_ref()
}

fn menu_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^(\d+)([wm]?)(?:(\d{2}):(\d{2}))?$").ok())
        .as_ref()
}

fn deadline_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"\{([^}]*)\}").ok())
        .as_ref()
}

/// Splits `{deadline}` text out of a new-task line.
///
/// Returns the line with every `{...}` run removed and whitespace collapsed,
/// plus the trimmed text of the first run when it is not blank.
pub fn extract_deadline(input: &str) -> (String, Option<String>) {
    let Some(pattern) = deadline_pattern() else {
        return (input.to_string(), None);
    };
    let Some(captures) = pattern.captures(input) else {
        return (input.to_string(), None);
    };
    let raw = captures
        .get(1)
        .map(|text| text.as_str().trim().to_string())
        .filter(|text| !text.is_empty());
    let cleaned = pattern
        .replace_all(input, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    (cleaned, raw)
}

/// Deadlines take the coded due forms and keep only the date.
pub fn resolve_deadline(raw: &str, today: NaiveDate) -> Option<NaiveDate> {
    resolve(raw.trim(), today).map(|stamp| stamp.date)
}

/// Resolves `spec` (the text after `due:`) against `today`.
pub fn parse_due(spec: &str, today: NaiveDate) -> DueDirective {
    let spec = spec.trim();
    resolve(spec, today)
        .map(DueDirective::Resolved)
        .unwrap_or_else(|| DueDirective::Unresolved(spec.to_string()))
}

fn resolve(spec: &str, today: NaiveDate) -> Option<DueStamp> {
    if let Some(captures) = relative_pattern().and_then(|pattern| pattern.captures(spec)) {
        let days = offset_days(&captures)?;
        let date = today.checked_add_days(Days::new(days))?;
        return match time_of_day(&captures) {
            TimeOfDay::Absent => Some(DueStamp::on(date)),
            TimeOfDay::Valid(time) => Some(DueStamp::at(date, time)),
            TimeOfDay::Invalid => None,
        };
    }

    if spec.len() == 10 {
        return NaiveDate::parse_from_str(spec, "%Y-%m-%d")
            .ok()
            .map(DueStamp::on);
    }
    if spec.len() == 16 && spec.as_bytes()[10] == b'T' {
        return NaiveDateTime::parse_from_str(spec, "%Y-%m-%dT%H:%M")
            .ok()
            .map(|stamp| DueStamp::at(stamp.date(), stamp.time()));
    }
    None
}

fn offset_days(captures: &Captures<'_>) -> Option<u64> {
    let count: u64 = captures.get(1)?.as_str().parse().ok()?;
    let unit = match captures.get(2).map(|unit| unit.as_str()) {
        Some("w") => 7,
        Some("m") => 30,
        _ => 1,
    };
    count.checked_mul(unit)
}

enum TimeOfDay {
    Absent,
    Valid(NaiveTime),
    Invalid,
}

fn time_of_day(captures: &Captures<'_>) -> TimeOfDay {
    let (Some(hours), Some(minutes)) = (captures.get(3), captures.get(4)) else {
        return TimeOfDay::Absent;
    };
    match validate_time(hours.as_str(), minutes.as_str()) {
        Some(time) => TimeOfDay::Valid(time),
        None => TimeOfDay::Invalid,
    }
}

/// Accepts hours 0-23 and minutes 0-59.
pub fn validate_time(hours: &str, minutes: &str) -> Option<NaiveTime> {
    let hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    NaiveTime::from_hms_opt(hours, minutes, 0)
}

/// Menu shown while a `due:` value cannot be resolved yet.
///
/// `remaining_input` is the query without the `due:` token; every entry's
/// argument is that text followed by a complete `due:` token.
pub fn due_menu(spec: &str, remaining_input: &str, today: NaiveDate) -> Vec<DueMenuEntry> {
    let prefix = passthrough_prefix(remaining_input);
    let spec = spec.trim();

    if let Some(custom) = custom_offset(spec) {
        let Some(date) = today.checked_add_days(Days::new(custom.days)) else {
            return shortcut_menu(&prefix, today);
        };
        let time_suffix = custom
            .time
            .map(|time| format!(", {}", time.format("%H:%M")))
            .unwrap_or_default();
        let time_argument = custom
            .time
            .map(|time| time.format("%H:%M").to_string())
            .unwrap_or_default();
        return vec![DueMenuEntry {
            title: format!(
                "Due in {} {} 🗓️ {}{time_suffix}",
                custom.days,
                day_word(custom.days as i64),
                DueStamp::on(date).human()
            ),
            subtitle: String::new(),
            argument: format!("{prefix}due:{}d{time_argument} ", custom.days),
        }];
    }

    shortcut_menu(&prefix, today)
}

fn shortcut_menu(prefix: &str, today: NaiveDate) -> Vec<DueMenuEntry> {
    SHORTCUTS
        .iter()
        .filter_map(|(label, days)| {
            let date = today.checked_add_days(Days::new(*days))?;
            Some(DueMenuEntry {
                title: format!("Due {label} 🗓️ {}", DueStamp::on(date).human()),
                subtitle: String::new(),
                argument: format!("{prefix}due:{days}d "),
            })
        })
        .collect()
}

/// Reschedule picker for an existing task.
pub fn reschedule_menu(spec: &str, task_content: &str, today: NaiveDate) -> Vec<DueMenuEntry> {
    let spec = spec.trim();
    if spec.is_empty() {
        return SHORTCUTS
            .iter()
            .filter_map(|(label, days)| {
                let date = today.checked_add_days(Days::new(*days))?;
                let connector = if *days < 2 { "to " } else { "" };
                Some(DueMenuEntry {
                    title: format!(
                        "Reschedule {connector}{label} 🗓️ {}",
                        DueStamp::on(date).human()
                    ),
                    subtitle: task_content.to_string(),
                    argument: days.to_string(),
                })
            })
            .collect();
    }

    if let Some(custom) = custom_offset(spec) {
        if let Some(date) = today.checked_add_days(Days::new(custom.days)) {
            let time_suffix = custom
                .time
                .map(|time| format!(", {}", time.format("%H:%M")))
                .unwrap_or_default();
            let time_argument = custom
                .time
                .map(|time| time.format("%H:%M").to_string())
                .unwrap_or_default();
            return vec![DueMenuEntry {
                title: format!(
                    "Reschedule in {} {} 🗓️ {}{time_suffix}",
                    custom.days,
                    day_word(custom.days as i64),
                    DueStamp::on(date).human()
                ),
                subtitle: task_content.to_string(),
                argument: format!("{}d{time_argument}", custom.days),
            }];
        }
    }

    if let Some(stamp) = resolve_absolute(spec) {
        let distance = days_between(today, stamp.date);
        return vec![DueMenuEntry {
            title: format!(
                "Reschedule in {distance} {} 🗓️ {}",
                day_word(distance),
                stamp.human()
            ),
            subtitle: task_content.to_string(),
            argument: spec.to_string(),
        }];
    }

    vec![DueMenuEntry {
        title: "Invalid format!".to_string(),
        subtitle: INVALID_FORMAT_HINT.to_string(),
        argument: String::new(),
    }]
}

/// Turns a reschedule menu argument back into an API due string.
pub fn resolve_reschedule(argument: &str, today: NaiveDate) -> Option<String> {
    let argument = argument.trim();
    if let Some(stamp) = resolve_absolute(argument) {
        return Some(stamp.to_api_string());
    }
    if let Ok(days) = argument.parse::<u64>() {
        return today
            .checked_add_days(Days::new(days))
            .map(|date| DueStamp::on(date).to_api_string());
    }
    resolve(argument, today).map(|stamp| stamp.to_api_string())
}

pub fn days_between(today: NaiveDate, date: NaiveDate) -> i64 {
    date.signed_duration_since(today).num_days()
}

pub fn day_word(count: i64) -> &'static str {
    if count.abs() == 1 {
        "day"
    } else {
        "days"
    }
}

fn resolve_absolute(spec: &str) -> Option<DueStamp> {
    if spec.contains('-') {
        DueStamp::parse(spec).filter(|_| spec.len() == 10 || spec.len() == 16)
    } else {
        None
    }
}

struct CustomOffset {
    days: u64,
    time: Option<NaiveTime>,
}

fn custom_offset(spec: &str) -> Option<CustomOffset> {
    let captures = menu_pattern()?.captures(spec)?;
    let days = offset_days(&captures)?;
    let time = match time_of_day(&captures) {
        TimeOfDay::Absent => None,
        TimeOfDay::Valid(time) => Some(time),
        TimeOfDay::Invalid => return None,
    };
    Some(CustomOffset { days, time })
}

fn passthrough_prefix(remaining_input: &str) -> String {
    let trimmed = remaining_input.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed} ")
    }
}
