use serde::{Deserialize, Serialize};

use crate::catalog::FrequencyTable;
use crate::model::normalize_for_search;
use crate::query_dsl::{escape_name, Fragment, FragmentKind};

/// Where a fragment has to occur inside a candidate name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchAnchor {
    #[default]
    Anywhere,
    Prefix,
}

impl MatchAnchor {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "anywhere" | "partial" | "1" | "true" => Some(Self::Anywhere),
            "prefix" | "0" | "false" => Some(Self::Prefix),
            _ => None,
        }
    }

    pub fn matches(self, name: &str, fragment: &str) -> bool {
        let name = normalize_for_search(name);
        let fragment = normalize_for_search(fragment);
        match self {
            Self::Anywhere => name.contains(&fragment),
            Self::Prefix => name.starts_with(&fragment),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub kind: FragmentKind,
    pub name: String,
    pub count: usize,
    /// Full query to feed back to the launcher, ending with a space.
    pub query: String,
}

impl Suggestion {
    pub fn title(&self) -> String {
        format!("{} ({})", self.name, self.count)
    }
}

/// Entries whose name matches `fragment`, most frequent first.
///
/// Ties keep catalog order.
pub fn candidates<'a>(
    table: &'a FrequencyTable,
    fragment: &str,
    anchor: MatchAnchor,
) -> Vec<(&'a str, usize)> {
    let mut matched: Vec<(&str, usize)> = table
        .iter()
        .filter(|(name, _)| anchor.matches(name, fragment))
        .collect();
    matched.sort_by(|a, b| b.1.cmp(&a.1));
    matched
}

pub fn suggest(
    table: &FrequencyTable,
    fragment: &Fragment,
    remaining_input: &str,
    anchor: MatchAnchor,
) -> Vec<Suggestion> {
    let prefix = match fragment.kind {
        FragmentKind::Label => '@',
        FragmentKind::Project => '#',
    };

    candidates(table, &fragment.text, anchor)
        .into_iter()
        .map(|(name, count)| Suggestion {
            kind: fragment.kind,
            name: name.to_string(),
            count,
            query: completed_query(remaining_input, &escape_name(prefix, name)),
        })
        .collect()
}

fn completed_query(remaining_input: &str, completion: &str) -> String {
    let remaining = remaining_input.trim();
    if remaining.is_empty() {
        format!("{completion} ")
    } else {
        format!("{remaining} {completion} ")
    }
}
