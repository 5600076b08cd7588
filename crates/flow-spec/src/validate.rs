use crate::answers::{AnswerStore, ValidationError, ValidationResult};
use crate::spec::{flow::Flow, step::Step};

/// Replays every question's validator over a stored answer set.
///
/// Answers are fed back through their string form, in flow order, so bounds
/// that reference earlier answers see the same values the conversation did.
pub fn validate(flow: &Flow, answers: &AnswerStore) -> ValidationResult {
    let view = flow.view(answers);

    let mut errors = Vec::new();
    let mut missing_required = Vec::new();

    for (name, question) in flow.questions() {
        match answers.get(name.as_str()) {
            None => missing_required.push(name.clone()),
            Some(answer) => {
                if let Err(rejection) = question.validator.validate(&answer.to_string(), &view) {
                    errors.push(ValidationError {
                        step: name.clone(),
                        message: rejection.to_string(),
                        code: rejection.code().to_string(),
                    });
                }
            }
        }
    }

    let unknown_fields: Vec<String> = answers
        .iter()
        .map(|(name, _)| name)
        .filter(|name| name.as_str().starts_with(flow.prefix()))
        .filter(|name| !matches!(flow.step(name.as_str()), Some(Step::Question(_))))
        .map(|name| name.to_string())
        .collect();

    ValidationResult {
        valid: errors.is_empty() && missing_required.is_empty() && unknown_fields.is_empty(),
        errors,
        missing_required,
        unknown_fields,
    }
}
