pub mod flow;
pub mod step;

pub use flow::{Flow, FlowBuilder, FlowError};
pub use step::{Completion, QuestionStep, Step, StepKind, StepName, TerminalStep, TotalStep};
