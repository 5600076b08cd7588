#![allow(missing_docs)]

pub mod answers;
pub mod message;
pub mod render;
pub mod spec;
pub mod template;
pub mod validate;
pub mod validator;

pub use answers::{
    Answer, AnswerStore, AnswerView, ValidationError, ValidationResult, format_number,
};
pub use message::{MessageField, MessageTemplate};
pub use render::{
    RenderChoice, RenderError, RenderPayload, RenderProgress, RenderStatus, build_step_payload,
    render_json_ui, render_text,
};
pub use spec::{
    Completion, Flow, FlowBuilder, FlowError, QuestionStep, Step, StepKind, StepName,
    TerminalStep, TotalStep,
};
pub use template::{TemplateEngine, TemplateError};
pub use validate::validate;
pub use validator::{Bound, Range, Rejection, Validator};
