use serde_json::{Map, Value, json};
use thiserror::Error;

use crate::{
    answers::{AnswerStore, format_number},
    spec::{flow::Flow, step::Step},
    template::{TemplateEngine, TemplateError},
};

/// Status labels returned by the renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    /// The transport should collect another reply.
    NeedInput,
    /// The session ends with this text.
    Complete,
}

impl RenderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderStatus::NeedInput => "need_input",
            RenderStatus::Complete => "complete",
        }
    }
}

/// Position of a step within its flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderProgress {
    pub answered: usize,
    pub total: usize,
}

/// A numbered menu entry. `value` names the state it leads to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderChoice {
    pub value: String,
    pub label: String,
}

impl RenderChoice {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Everything a transport needs to show one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderPayload {
    pub state: String,
    pub status: RenderStatus,
    pub text: String,
    pub error: Option<String>,
    pub choices: Vec<RenderChoice>,
    pub progress: Option<RenderProgress>,
}

impl RenderPayload {
    pub fn prompt(state: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            status: RenderStatus::NeedInput,
            text: text.into(),
            error: None,
            choices: Vec::new(),
            progress: None,
        }
    }

    pub fn menu(
        state: impl Into<String>,
        text: impl Into<String>,
        choices: Vec<RenderChoice>,
    ) -> Self {
        Self {
            choices,
            ..Self::prompt(state, text)
        }
    }

    pub fn end(state: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            status: RenderStatus::Complete,
            ..Self::prompt(state, text)
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn ends_session(&self) -> bool {
        self.status == RenderStatus::Complete
    }

    /// Resolves a 1-based menu selection to the choice's value.
    pub fn choice_value(&self, input: &str) -> Option<&str> {
        let index: usize = input.trim().parse().ok()?;
        index
            .checked_sub(1)
            .and_then(|index| self.choices.get(index))
            .map(|choice| choice.value.as_str())
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("step '{0}' is not part of flow '{1}'")]
    UnknownStep(String, String),
    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// Build the payload for one flow step from the current answers.
pub fn build_step_payload(
    flow: &Flow,
    name: &str,
    answers: &AnswerStore,
    engine: &TemplateEngine,
) -> Result<RenderPayload, RenderError> {
    let step = flow
        .step(name)
        .ok_or_else(|| RenderError::UnknownStep(name.to_string(), flow.prefix().to_string()))?;
    let progress = flow.position(name).map(|answered| RenderProgress {
        answered,
        total: flow.len(),
    });

    let payload = match step {
        Step::Question(question) => RenderPayload::prompt(name, question.question.clone()),
        Step::Total(total) => {
            let sum = total.total(&flow.view(answers));
            let text = engine.render(&total.question, &json!({ "total": format_number(sum) }))?;
            RenderPayload::menu(name, text, vec![RenderChoice::new("continue", "Continue")])
        }
        Step::Terminal(terminal) => RenderPayload::end(name, terminal.text.clone()),
    };

    Ok(RenderPayload {
        progress,
        ..payload
    })
}

/// Render the payload as the text a USSD/SMS user sees.
pub fn render_text(payload: &RenderPayload) -> String {
    let mut lines = Vec::new();
    if let Some(error) = &payload.error {
        lines.push(error.clone());
    }
    lines.push(payload.text.clone());
    for (index, choice) in payload.choices.iter().enumerate() {
        lines.push(format!("{}. {}", index + 1, choice.label));
    }
    lines.join("\n")
}

/// Render the payload as a structured JSON-friendly value.
pub fn render_json_ui(payload: &RenderPayload) -> Value {
    let choices = payload
        .choices
        .iter()
        .map(|choice| {
            let mut map = Map::new();
            map.insert("value".into(), Value::String(choice.value.clone()));
            map.insert("label".into(), Value::String(choice.label.clone()));
            Value::Object(map)
        })
        .collect::<Vec<_>>();

    let progress = payload
        .progress
        .map(|progress| {
            json!({
                "answered": progress.answered,
                "total": progress.total,
            })
        })
        .unwrap_or(Value::Null);

    json!({
        "state": payload.state,
        "status": payload.status.as_str(),
        "text": payload.text,
        "error": payload.error,
        "choices": choices,
        "progress": progress,
        "ends_session": payload.ends_session(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choice_value_is_one_based() {
        let payload = RenderPayload::menu(
            "states:start",
            "Welcome",
            vec![
                RenderChoice::new("states:register", "Register"),
                RenderChoice::new("states:end", "Exit"),
            ],
        );
        assert_eq!(payload.choice_value("1"), Some("states:register"));
        assert_eq!(payload.choice_value(" 2 "), Some("states:end"));
        assert_eq!(payload.choice_value("0"), None);
        assert_eq!(payload.choice_value("3"), None);
        assert_eq!(payload.choice_value("Exit"), None);
    }

    #[test]
    fn text_puts_error_before_prompt() {
        let payload = RenderPayload::prompt("s", "Male enrollment:").with_error("Expected a whole number.");
        assert_eq!(
            render_text(&payload),
            "Expected a whole number.\nMale enrollment:"
        );
    }
}
