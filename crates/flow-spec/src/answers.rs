use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::spec::step::StepName;

/// A coerced answer value.
///
/// Integers are tried before decimals when deserializing, so `30` stays an
/// integer while `12.5` and `100.0` become decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Integer(i64),
    Decimal(f64),
    Text(String),
}

impl Answer {
    /// Numeric value of the answer, if it has one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Answer::Integer(value) => Some(*value as f64),
            Answer::Decimal(value) => Some(*value),
            Answer::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Answer::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Answer::Integer(value) => write!(f, "{value}"),
            Answer::Decimal(value) => f.write_str(&format_number(*value)),
            Answer::Text(text) => f.write_str(text),
        }
    }
}

impl From<i64> for Answer {
    fn from(value: i64) -> Self {
        Answer::Integer(value)
    }
}

impl From<f64> for Answer {
    fn from(value: f64) -> Self {
        Answer::Decimal(value)
    }
}

impl From<&str> for Answer {
    fn from(value: &str) -> Self {
        Answer::Text(value.to_string())
    }
}

/// Renders a number in its natural decimal form: `13`, `12.5`, never `13.0`.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        // folds -0 into 0
        return "0".to_string();
    }
    format!("{value}")
}

/// Per-session mapping from fully-qualified step name to coerced answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerStore {
    answers: BTreeMap<StepName, Answer>,
}

impl AnswerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Answer> {
        self.answers.get(name)
    }

    pub fn insert(&mut self, name: StepName, answer: Answer) -> Option<Answer> {
        self.answers.insert(name, answer)
    }

    pub fn remove(&mut self, name: &str) -> Option<Answer> {
        self.answers.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.answers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StepName, &Answer)> {
        self.answers.iter()
    }

    /// Scopes the store to one flow namespace.
    pub fn view<'a>(&'a self, prefix: &'a str) -> AnswerView<'a> {
        AnswerView {
            store: self,
            prefix,
        }
    }

    pub fn to_cbor(&self) -> Result<Vec<u8>, serde_cbor::Error> {
        serde_cbor::to_vec(self)
    }

    pub fn from_cbor(bytes: &[u8]) -> Result<Self, serde_cbor::Error> {
        serde_cbor::from_slice(bytes)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl FromIterator<(StepName, Answer)> for AnswerStore {
    fn from_iter<T: IntoIterator<Item = (StepName, Answer)>>(iter: T) -> Self {
        Self {
            answers: iter.into_iter().collect(),
        }
    }
}

/// Read-only view of the answers that belong to one flow prefix.
#[derive(Debug, Clone, Copy)]
pub struct AnswerView<'a> {
    store: &'a AnswerStore,
    prefix: &'a str,
}

impl<'a> AnswerView<'a> {
    pub fn prefix(&self) -> &'a str {
        self.prefix
    }

    pub fn store(&self) -> &'a AnswerStore {
        self.store
    }

    pub fn get(&self, suffix: &str) -> Option<&'a Answer> {
        self.store.get(&format!("{}{}", self.prefix, suffix))
    }

    pub fn number(&self, suffix: &str) -> Option<f64> {
        self.get(suffix).and_then(Answer::as_number)
    }
}

/// A single failed answer reported by whole-set validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub step: StepName,
    pub message: String,
    pub code: String,
}

/// Outcome of validating a stored answer set against a flow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub missing_required: Vec<StepName>,
    pub unknown_fields: Vec<String>,
}
