use std::fmt::{Display, Formatter};

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use unicode_normalization::UnicodeNormalization;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub due: Option<Due>,
    #[serde(default)]
    pub labels: Vec<String>,
    pub project_id: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub section_id: Option<String>,
    #[serde(default = "Priority::lowest")]
    pub priority: Priority,
    #[serde(default, alias = "checked")]
    pub is_completed: bool,
}

impl Task {
    /// Parsed due stamp; unparseable due strings count as absent.
    pub fn due_stamp(&self) -> Option<DueStamp> {
        self.due.as_ref().and_then(|due| DueStamp::parse(&due.date))
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|candidate| candidate == label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Due {
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub is_deleted: bool,
}

impl Project {
    pub fn is_active(&self) -> bool {
        !self.is_archived && !self.is_deleted
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub name: String,
    pub project_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    #[serde(default)]
    pub is_deleted: bool,
}

/// Task urgency as the remote service stores it: 4 is the most urgent (`p1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Priority(u8);

impl Priority {
    pub const fn lowest() -> Self {
        Self(1)
    }

    pub fn from_api_level(level: u8) -> Option<Self> {
        (1..=4).contains(&level).then_some(Self(level))
    }

    /// Parses `p1`..`p4`, ignoring case.
    pub fn from_token(token: &str) -> Option<Self> {
        let digit = token
            .strip_prefix('p')
            .or_else(|| token.strip_prefix('P'))?;
        match digit {
            "1" => Some(Self(4)),
            "2" => Some(Self(3)),
            "3" => Some(Self(2)),
            "4" => Some(Self(1)),
            _ => None,
        }
    }

    pub fn api_level(self) -> u8 {
        self.0
    }

    pub fn token(self) -> String {
        format!("p{}", 5 - self.0)
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::lowest()
    }
}

/// A calendar date with an optional time of day, as used by due dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DueStamp {
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
}

impl DueStamp {
    /// Far-future sentinel used to sort undated tasks last.
    pub const FAR_FUTURE: DueStamp = DueStamp {
        date: NaiveDate::MAX,
        time: None,
    };

    pub fn on(date: NaiveDate) -> Self {
        Self { date, time: None }
    }

    pub fn at(date: NaiveDate, time: NaiveTime) -> Self {
        Self {
            date,
            time: Some(time),
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let Some((date_part, _)) = raw.split_once('T') else {
            return NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().map(Self::on);
        };
        if let Ok(zoned) = DateTime::parse_from_rfc3339(raw) {
            return Some(Self::local(zoned.with_timezone(&Local).naive_local()));
        }

        // Floating times are already local; a bare `Z` suffix means UTC.
        let (naive, utc) = match raw.strip_suffix('Z') {
            Some(naive) => (naive, true),
            None => (raw, false),
        };
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(naive, format).ok())
            .map(|stamp| {
                if utc {
                    Self::local(Utc.from_utc_datetime(&stamp).with_timezone(&Local).naive_local())
                } else {
                    Self::local(stamp)
                }
            })
            .or_else(|| NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok().map(Self::on))
    }

    fn local(stamp: NaiveDateTime) -> Self {
        Self::at(stamp.date(), stamp.time())
    }

    pub fn to_api_string(&self) -> String {
        match self.time {
            Some(time) => format!("{}T{}", self.date.format("%Y-%m-%d"), time.format("%H:%M")),
            None => self.date.format("%Y-%m-%d").to_string(),
        }
    }

    pub fn human(&self) -> String {
        match self.time {
            Some(time) => format!(
                "{}, {}",
                self.date.format("%A, %B %d, %Y"),
                time.format("%H:%M")
            ),
            None => self.date.format("%A, %B %d, %Y").to_string(),
        }
    }
}

impl Display for DueStamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_api_string())
    }
}

/// Trims and NFC-composes typed text, so `e` + U+0301 equals `é`.
pub fn normalize_unicode(input: &str) -> String {
    input.trim().nfc().collect()
}

/// Case-folds text for substring matching.
pub fn normalize_for_search(input: &str) -> String {
    normalize_unicode(input).to_lowercase()
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|id| !id.trim().is_empty()))
}
