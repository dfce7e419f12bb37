use std::fmt::{Display, Formatter};

use chrono::NaiveDate;

use crate::catalog::{Catalog, ProjectRef};
use crate::due::{parse_due, DueDirective};
use crate::model::{normalize_unicode, Priority};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EscapeSubject {
    Label,
    Project,
}

impl EscapeSubject {
    fn from_prefix(prefix: char) -> Option<Self> {
        match prefix {
            '@' => Some(Self::Label),
            '#' => Some(Self::Project),
            _ => None,
        }
    }

    pub fn prefix(self) -> char {
        match self {
            Self::Label => '@',
            Self::Project => '#',
        }
    }
}

impl Display for EscapeSubject {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Label => f.write_str("label"),
            Self::Project => f.write_str("project"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("unbalanced parentheses in {subject} name '{token}'")]
    MalformedEscape {
        subject: EscapeSubject,
        token: String,
    },
}

/// Kind assigned to one raw token by the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Label(String),
    LabelFragment(String),
    Project { path: String, target: ProjectRef },
    ProjectFragment(String),
    Due(DueDirective),
    Priority(Priority),
    Search(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    Label,
    Project,
}

/// An incomplete `@label` or `#project` awaiting autocomplete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub kind: FragmentKind,
    /// Typed text without the prefix or escape parentheses.
    pub text: String,
    pub token_index: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryIntent {
    pub tokens: Vec<String>,
    pub classified: Vec<Token>,
    pub labels: Vec<String>,
    pub projects: Vec<ProjectRef>,
    pub project_path: Option<String>,
    pub search_terms: Vec<String>,
    pub fragment: Option<Fragment>,
    pub due: Option<DueDirective>,
    pub due_token: Option<usize>,
    pub priority: Option<Priority>,
}

impl QueryIntent {
    /// Tokenizes and classifies `query` against the catalog.
    ///
    /// Classification stops at the first label or project fragment; tokens
    /// after it stay in `tokens` but are left unclassified.
    pub fn parse(query: &str, catalog: &Catalog, today: NaiveDate) -> Result<Self, QueryError> {
        let tokens = tokenize(query)?;
        let mut intent = Self {
            tokens,
            ..Self::default()
        };

        for index in 0..intent.tokens.len() {
            let token = classify(&intent.tokens[index], catalog, today)?;
            match &token {
                Token::Label(name) => {
                    if !intent.labels.contains(name) {
                        intent.labels.push(name.clone());
                    }
                }
                Token::LabelFragment(text) => {
                    intent.fragment = Some(Fragment {
                        kind: FragmentKind::Label,
                        text: text.clone(),
                        token_index: index,
                    });
                }
                Token::Project { path, target } => {
                    if !intent.projects.contains(target) {
                        intent.projects.push(target.clone());
                    }
                    intent.project_path = Some(path.clone());
                }
                Token::ProjectFragment(text) => {
                    intent.fragment = Some(Fragment {
                        kind: FragmentKind::Project,
                        text: text.clone(),
                        token_index: index,
                    });
                }
                Token::Due(directive) => {
                    intent.due = Some(directive.clone());
                    intent.due_token = Some(index);
                }
                Token::Priority(priority) => intent.priority = Some(*priority),
                Token::Search(term) => intent.search_terms.push(term.clone()),
            }
            intent.classified.push(token);
            if intent.fragment.is_some() {
                break;
            }
        }

        Ok(intent)
    }

    /// Typed input with the pending fragment removed.
    pub fn remaining_input(&self) -> String {
        match &self.fragment {
            Some(fragment) => self.input_without(fragment.token_index),
            None => self.tokens.join(" "),
        }
    }

    /// Typed input with the token at `index` removed, rejoined by single spaces.
    pub fn input_without(&self, index: usize) -> String {
        self.tokens
            .iter()
            .enumerate()
            .filter(|(position, _)| *position != index)
            .map(|(_, token)| token.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn has_filters(&self) -> bool {
        !self.labels.is_empty() || !self.projects.is_empty() || !self.search_terms.is_empty()
    }

    /// The `due:` text when it could not be resolved.
    pub fn unresolved_due(&self) -> Option<&str> {
        match &self.due {
            Some(DueDirective::Unresolved(spec)) => Some(spec.as_str()),
            _ => None,
        }
    }
}

/// Splits on whitespace, keeping `@(...)` and `#(...)` runs whole.
pub fn tokenize(input: &str) -> Result<Vec<String>, QueryError> {
    let mut tokens = Vec::new();
    let mut rest = input;

    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }

        let end = if let Some(subject) = escape_subject(rest) {
            escaped_run_end(rest).ok_or_else(|| QueryError::MalformedEscape {
                subject,
                token: rest.trim_end().to_string(),
            })?
        } else {
            rest.find(char::is_whitespace).unwrap_or(rest.len())
        };

        tokens.push(rest[..end].to_string());
        rest = &rest[end..];
    }

    Ok(tokens)
}

fn escape_subject(token: &str) -> Option<EscapeSubject> {
    let mut chars = token.chars();
    let subject = EscapeSubject::from_prefix(chars.next()?)?;
    (chars.next() == Some('(')).then_some(subject)
}

/// Byte offset just past the `)` that closes the escape opened at offset 1.
fn escaped_run_end(run: &str) -> Option<usize> {
    let mut depth = 0_usize;
    for (offset, ch) in run.char_indices().skip(1) {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(offset + ch.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}

pub fn classify(token: &str, catalog: &Catalog, today: NaiveDate) -> Result<Token, QueryError> {
    let token = normalize_unicode(token);
    let token = token.as_str();

    if token.starts_with('@') {
        let name = unescape(token, EscapeSubject::Label)?;
        if catalog.label_counts().contains(&name) {
            return Ok(Token::Label(name));
        }
        return Ok(Token::LabelFragment(name));
    }

    if token.starts_with('#') {
        let path = unescape(token, EscapeSubject::Project)?;
        if catalog.project_counts().contains(&path) {
            if let Some(target) = catalog.resolve_path(&path) {
                return Ok(Token::Project { path, target });
            }
        }
        return Ok(Token::ProjectFragment(path));
    }

    if let Some(priority) = Priority::from_token(token) {
        return Ok(Token::Priority(priority));
    }

    if let Some(spec) = parse_prefixed(token, "due:") {
        return Ok(Token::Due(parse_due(spec, today)));
    }

    Ok(Token::Search(token.to_string()))
}

/// Strips the prefix and an optional `(...)` escape from a label/project token.
pub fn unescape(token: &str, subject: EscapeSubject) -> Result<String, QueryError> {
    let malformed = || QueryError::MalformedEscape {
        subject,
        token: token.to_string(),
    };
    let body = token.strip_prefix(subject.prefix()).unwrap_or(token);

    let Some(opened) = body.strip_prefix('(') else {
        return Ok(body.to_string());
    };
    let inner = opened.strip_suffix(')').ok_or_else(malformed)?;
    if !is_balanced(inner) {
        return Err(malformed());
    }
    Ok(inner.trim().to_string())
}

/// Re-applies the parenthesis escape when `name` contains whitespace.
pub fn escape_name(prefix: char, name: &str) -> String {
    if name.chars().any(char::is_whitespace) {
        format!("{prefix}({name})")
    } else {
        format!("{prefix}{name}")
    }
}

fn is_balanced(text: &str) -> bool {
    let mut depth = 0_i32;
    for ch in text.chars() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

fn parse_prefixed<'a>(token: &'a str, prefix: &str) -> Option<&'a str> {
    token
        .strip_prefix(prefix)
        .or_else(|| token.strip_prefix(&prefix.to_ascii_uppercase()))
}
