use flow_spec::AnswerStore;
use serde::{Deserialize, Serialize};

use crate::flows::START;

/// Per-session conversation state, persisted between turns by a `SessionStore`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    /// Transport address of the user, also used as the report sender.
    pub user: String,
    /// Current state name: a step name, or one of the menu states.
    pub state: String,
    #[serde(default)]
    pub answers: AnswerStore,
    /// Set while the resume menu is shown for a session that started mid-flow.
    #[serde(default)]
    pub resume_pending: bool,
}

impl Session {
    pub fn new(id: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            user: user.into(),
            state: START.to_string(),
            answers: AnswerStore::new(),
            resume_pending: false,
        }
    }

    /// Whether the session sits somewhere other than the start menu.
    pub fn is_mid_flow(&self) -> bool {
        self.state != START
    }
}
