use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use crate::answers::{Answer, AnswerStore, AnswerView};
use crate::spec::step::{QuestionStep, Step, StepName, TerminalStep};

/// Configuration errors raised while assembling a flow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error("step '{0}' is already registered")]
    DuplicateSuffix(StepName),
    #[error("flow '{0}' has no steps")]
    Empty(String),
    #[error("terminal step '{0}' must be the last step of its flow")]
    TerminalNotLast(StepName),
    #[error("step '{step}' has a bound on '{reference}', which is not an earlier question")]
    ForwardReference { step: StepName, reference: String },
    #[error("total '{step}' sums '{key}', which is not an earlier question")]
    UnknownTotalSource { step: StepName, key: String },
    #[error("terminal '{step}' sends field '{key}', which is not a question of this flow")]
    UnknownMessageField { step: StepName, key: String },
}

/// Collects steps in registration order and finalizes them into a [`Flow`].
#[derive(Debug)]
pub struct FlowBuilder {
    prefix: String,
    steps: Vec<(StepName, Step)>,
}

impl FlowBuilder {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            steps: Vec::new(),
        }
    }

    /// Appends `step` under `prefix + suffix`.
    pub fn register(&mut self, suffix: &str, step: Step) -> Result<StepName, FlowError> {
        let name = StepName::new(&self.prefix, suffix);
        if self.steps.iter().any(|(existing, _)| existing == &name) {
            return Err(FlowError::DuplicateSuffix(name));
        }
        self.steps.push((name.clone(), step));
        Ok(name)
    }

    /// Checks ordering constraints and freezes the step order.
    pub fn build(self) -> Result<Flow, FlowError> {
        if self.steps.is_empty() {
            return Err(FlowError::Empty(self.prefix));
        }

        let last = self.steps.len() - 1;
        let mut questions = BTreeSet::new();
        for (index, (name, step)) in self.steps.iter().enumerate() {
            match step {
                Step::Question(question) => {
                    if let Some(reference) = question
                        .validator
                        .references()
                        .into_iter()
                        .find(|reference| !questions.contains(*reference))
                    {
                        return Err(FlowError::ForwardReference {
                            step: name.clone(),
                            reference: reference.to_string(),
                        });
                    }
                    if let Some(suffix) = name.suffix(&self.prefix) {
                        questions.insert(suffix.to_string());
                    }
                }
                Step::Total(total) => {
                    if let Some(key) = total.sources.iter().find(|key| !questions.contains(*key)) {
                        return Err(FlowError::UnknownTotalSource {
                            step: name.clone(),
                            key: key.clone(),
                        });
                    }
                }
                Step::Terminal(terminal) => {
                    if index != last {
                        return Err(FlowError::TerminalNotLast(name.clone()));
                    }
                    let fields = terminal
                        .on_complete
                        .iter()
                        .flat_map(|completion| completion.messages.iter())
                        .flat_map(|message| message.keys());
                    for key in fields {
                        if !questions.contains(key) {
                            return Err(FlowError::UnknownMessageField {
                                step: name.clone(),
                                key: key.to_string(),
                            });
                        }
                    }
                }
            }
        }

        let positions = self
            .steps
            .iter()
            .enumerate()
            .map(|(index, (name, _))| (name.clone(), index))
            .collect();

        Ok(Flow {
            prefix: self.prefix,
            steps: self.steps,
            positions,
        })
    }
}

/// Immutable, ordered sequence of steps sharing a prefix.
///
/// Registration order is conversation order; a built flow is never empty.
#[derive(Debug, Clone)]
pub struct Flow {
    prefix: String,
    steps: Vec<(StepName, Step)>,
    positions: BTreeMap<StepName, usize>,
}

impl Flow {
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn first(&self) -> &StepName {
        &self.steps[0].0
    }

    /// Step registered right after `name`; `None` for the last step or a
    /// name outside this flow.
    pub fn next(&self, name: &str) -> Option<&StepName> {
        let index = self.positions.get(name)?;
        self.steps.get(index + 1).map(|(next, _)| next)
    }

    pub fn step(&self, name: &str) -> Option<&Step> {
        self.positions.get(name).map(|index| &self.steps[*index].1)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> impl Iterator<Item = (&StepName, &Step)> {
        self.steps.iter().map(|(name, step)| (name, step))
    }

    pub fn questions(&self) -> impl Iterator<Item = (&StepName, &QuestionStep)> {
        self.steps.iter().filter_map(|(name, step)| match step {
            Step::Question(question) => Some((name, question)),
            _ => None,
        })
    }

    /// The closing step, when the flow ends in one.
    pub fn terminal(&self) -> Option<(&StepName, &TerminalStep)> {
        match self.steps.last() {
            Some((name, Step::Terminal(terminal))) => Some((name, terminal)),
            _ => None,
        }
    }

    pub fn name(&self, suffix: &str) -> StepName {
        StepName::new(&self.prefix, suffix)
    }

    pub fn answer<'a>(&self, answers: &'a AnswerStore, suffix: &str) -> Option<&'a Answer> {
        answers.get(&format!("{}{}", self.prefix, suffix))
    }

    pub fn view<'a>(&'a self, answers: &'a AnswerStore) -> AnswerView<'a> {
        answers.view(&self.prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::Validator;

    #[test]
    fn register_returns_qualified_name() {
        let mut builder = FlowBuilder::new("states:report:");
        let name = builder
            .register("school_id", Step::question("School ID:", Validator::free_text()))
            .expect("register");
        assert_eq!(name.as_str(), "states:report:school_id");
        assert_eq!(name.suffix("states:report:"), Some("school_id"));
    }

    #[test]
    fn next_outside_flow_is_none() {
        let mut builder = FlowBuilder::new("a:");
        builder
            .register("one", Step::question("One", Validator::integer()))
            .expect("register");
        builder.register("end", Step::terminal("Bye")).expect("register");
        let flow = builder.build().expect("build");
        assert_eq!(flow.next("b:one"), None);
        assert_eq!(flow.next("a:one").map(StepName::as_str), Some("a:end"));
        assert!(flow.terminal().is_some());
    }
}
