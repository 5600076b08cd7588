use serde::{Deserialize, Serialize};

use crate::answers::AnswerView;
use crate::spec::step::StepName;
use crate::template::TemplateError;

/// A literal label followed by the answer to one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageField {
    pub label: String,
    pub key: String,
}

/// Ordered `(label, answer key)` pairs rendered into one compact line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageTemplate {
    pub name: String,
    pub fields: Vec<MessageField>,
}

impl MessageTemplate {
    pub fn new<'a>(name: impl Into<String>, pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            name: name.into(),
            fields: pairs
                .into_iter()
                .map(|(label, key)| MessageField {
                    label: label.to_string(),
                    key: key.to_string(),
                })
                .collect(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|field| field.key.as_str())
    }

    /// Emits `label + answer` for every field, joined by single spaces.
    ///
    /// Every key must already be answered; the first unanswered key fails
    /// the whole render.
    pub fn render(&self, view: &AnswerView<'_>) -> Result<String, TemplateError> {
        let parts = self
            .fields
            .iter()
            .map(|field| {
                view.get(&field.key)
                    .map(|answer| format!("{}{}", field.label, answer))
                    .ok_or_else(|| {
                        TemplateError::Unanswered(StepName::new(view.prefix(), &field.key))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(parts.join(" "))
    }
}
