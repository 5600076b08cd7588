use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::answers::AnswerView;
use crate::message::MessageTemplate;
use crate::validator::Validator;

/// Fully-qualified step identifier: flow prefix followed by the step suffix.
///
/// Doubles as the answer-store key for question steps.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepName(String);

impl StepName {
    pub fn new(prefix: &str, suffix: &str) -> Self {
        StepName(format!("{prefix}{suffix}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Suffix relative to `prefix`, if the name lives under it.
    pub fn suffix<'a>(&'a self, prefix: &str) -> Option<&'a str> {
        self.0.strip_prefix(prefix)
    }
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for StepName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for StepName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StepName {
    fn from(value: &str) -> Self {
        StepName(value.to_string())
    }
}

impl From<String> for StepName {
    fn from(value: String) -> Self {
        StepName(value)
    }
}

/// Free-text or numeric question producing exactly one answer.
#[derive(Debug, Clone)]
pub struct QuestionStep {
    pub question: String,
    pub validator: Validator,
}

/// Read-only checkpoint showing the sum of earlier answers.
#[derive(Debug, Clone)]
pub struct TotalStep {
    /// Prompt template; `{{total}}` is replaced by the computed sum.
    pub question: String,
    /// Suffixes of the summed steps, within the same flow.
    pub sources: Vec<String>,
}

impl TotalStep {
    /// Sum of the numeric answers; missing or non-numeric answers count as 0.
    pub fn total(&self, view: &AnswerView<'_>) -> f64 {
        self.sources
            .iter()
            .map(|suffix| view.number(suffix).unwrap_or(0.0))
            .sum()
    }
}

/// Side effects run once when a flow reaches its terminal step.
#[derive(Debug, Clone, Default)]
pub struct Completion {
    /// Messages rendered from the flow's answers and sent to the reporting endpoint.
    pub messages: Vec<MessageTemplate>,
    /// Whether finishing the flow registers the user.
    pub mark_registered: bool,
}

/// Last step of a flow.
#[derive(Debug, Clone)]
pub struct TerminalStep {
    pub text: String,
    pub on_complete: Option<Completion>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Question,
    Total,
    Terminal,
}

impl StepKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::Question => "question",
            StepKind::Total => "total",
            StepKind::Terminal => "terminal",
        }
    }
}

/// One unit of conversation.
#[derive(Debug, Clone)]
pub enum Step {
    Question(QuestionStep),
    Total(TotalStep),
    Terminal(TerminalStep),
}

impl Step {
    pub fn question(question: impl Into<String>, validator: Validator) -> Self {
        Step::Question(QuestionStep {
            question: question.into(),
            validator,
        })
    }

    pub fn total<I, S>(question: impl Into<String>, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Step::Total(TotalStep {
            question: question.into(),
            sources: sources.into_iter().map(Into::into).collect(),
        })
    }

    pub fn terminal(text: impl Into<String>) -> Self {
        Step::Terminal(TerminalStep {
            text: text.into(),
            on_complete: None,
        })
    }

    pub fn terminal_with(text: impl Into<String>, on_complete: Completion) -> Self {
        Step::Terminal(TerminalStep {
            text: text.into(),
            on_complete: Some(on_complete),
        })
    }

    pub fn kind(&self) -> StepKind {
        match self {
            Step::Question(_) => StepKind::Question,
            Step::Total(_) => StepKind::Total,
            Step::Terminal(_) => StepKind::Terminal,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Step::Terminal(_))
    }
}
