//! Turn-by-turn driver for the start menu and the two flows.

use std::sync::Arc;

use flow_spec::{
    Flow, FlowError, Rejection, RenderChoice, RenderPayload, Step, StepName, TemplateEngine,
    TerminalStep, build_step_payload,
};

use crate::config::AppConfig;
use crate::error::AppError;
use crate::flows::{
    BYE_TEXT, END, REGISTER, REPORT, RESUME, RESUME_TEXT, START, WELCOME_TEXT, registration_flow,
    report_flow,
};
use crate::gateway::{ReportingGateway, gateway_from_config};
use crate::session::Session;
use crate::store::{ContactStore, SessionStore};

const CONTINUE: &str = "continue";
const RESTART: &str = "restart";

/// One event delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A new transport session opened for the user.
    SessionStart,
    /// The user's reply to the last prompt.
    Content(String),
}

/// Applies exactly one transition per inbound event.
pub struct Orchestrator {
    registration: Flow,
    report: Flow,
    templates: TemplateEngine,
    gateway: Arc<dyn ReportingGateway>,
    contacts: Arc<dyn ContactStore>,
    sessions: Arc<dyn SessionStore>,
}

impl Orchestrator {
    pub fn new(
        gateway: Arc<dyn ReportingGateway>,
        contacts: Arc<dyn ContactStore>,
        sessions: Arc<dyn SessionStore>,
    ) -> Result<Self, FlowError> {
        Ok(Self {
            registration: registration_flow()?,
            report: report_flow()?,
            templates: TemplateEngine::new(),
            gateway,
            contacts,
            sessions,
        })
    }

    /// Wires the gateway selected by `config`.
    pub fn from_config(
        config: &AppConfig,
        contacts: Arc<dyn ContactStore>,
        sessions: Arc<dyn SessionStore>,
    ) -> Result<Self, AppError> {
        let gateway = gateway_from_config(config)?;
        Ok(Self::new(gateway, contacts, sessions)?)
    }

    pub fn registration(&self) -> &Flow {
        &self.registration
    }

    pub fn report(&self) -> &Flow {
        &self.report
    }

    /// Loads the session, applies one transition and saves it again.
    pub async fn handle(
        &self,
        session_id: &str,
        user: &str,
        inbound: Inbound,
    ) -> Result<RenderPayload, AppError> {
        let mut session = self
            .sessions
            .load(session_id)
            .await?
            .unwrap_or_else(|| Session::new(session_id, user));
        let payload = self.step(&mut session, inbound).await?;
        self.sessions.save(&session).await?;
        Ok(payload)
    }

    /// Store-free core of [`Orchestrator::handle`].
    pub async fn step(
        &self,
        session: &mut Session,
        inbound: Inbound,
    ) -> Result<RenderPayload, AppError> {
        let from = session.state.clone();
        let payload = match inbound {
            Inbound::SessionStart => self.on_session_start(session).await?,
            Inbound::Content(text) if session.resume_pending => {
                self.on_resume_choice(session, &text).await?
            }
            Inbound::Content(text) => self.on_content(session, &text).await?,
        };
        tracing::debug!(
            session = %session.id,
            from = %from,
            to = %session.state,
            shown = %payload.state,
            "turn handled"
        );
        Ok(payload)
    }

    async fn on_session_start(&self, session: &mut Session) -> Result<RenderPayload, AppError> {
        if session.is_mid_flow() {
            session.resume_pending = true;
            return Ok(resume_menu());
        }
        self.start_menu(&session.user).await
    }

    async fn on_resume_choice(
        &self,
        session: &mut Session,
        input: &str,
    ) -> Result<RenderPayload, AppError> {
        let menu = resume_menu();
        match menu.choice_value(input) {
            Some(CONTINUE) => {
                session.resume_pending = false;
                self.render_current(session).await
            }
            Some(RESTART) => {
                session.resume_pending = false;
                self.enter(session, START).await
            }
            _ => Ok(menu),
        }
    }

    async fn on_content(&self, session: &mut Session, input: &str) -> Result<RenderPayload, AppError> {
        if session.state == START {
            let menu = self.start_menu(&session.user).await?;
            return match menu.choice_value(input) {
                Some(target) => {
                    let target = target.to_string();
                    self.enter(session, &target).await
                }
                None => Ok(menu),
            };
        }

        let current = session.state.clone();
        let flow = self
            .flow_for(&current)
            .ok_or_else(|| AppError::UnknownState(current.clone()))?;
        let step = flow
            .step(&current)
            .ok_or_else(|| AppError::UnknownState(current.clone()))?;

        match step {
            Step::Question(question) => {
                let outcome = question.validator.validate(input, &flow.view(&session.answers));
                match outcome {
                    Ok(answer) => {
                        session.answers.insert(StepName::from(current.as_str()), answer);
                        self.advance(session, flow, &current).await
                    }
                    Err(rejection) => {
                        if let Rejection::UnresolvedBound { bound } = &rejection {
                            tracing::warn!(
                                step = %current,
                                bound = %bound,
                                "range bound depends on an unanswered step"
                            );
                        }
                        let payload =
                            build_step_payload(flow, &current, &session.answers, &self.templates)?;
                        Ok(payload.with_error(rejection.to_string()))
                    }
                }
            }
            Step::Total(_) => self.advance(session, flow, &current).await,
            Step::Terminal(_) => self.enter(session, START).await,
        }
    }

    async fn advance(
        &self,
        session: &mut Session,
        flow: &Flow,
        current: &str,
    ) -> Result<RenderPayload, AppError> {
        match flow.next(current) {
            Some(next) => self.enter_step(session, flow, next).await,
            None => self.enter(session, START).await,
        }
    }

    /// Moves to one of the top-level states.
    async fn enter(&self, session: &mut Session, target: &str) -> Result<RenderPayload, AppError> {
        match target {
            START => {
                session.state = START.to_string();
                self.start_menu(&session.user).await
            }
            REGISTER => {
                self.enter_step(session, &self.registration, self.registration.first())
                    .await
            }
            REPORT => self.enter_step(session, &self.report, self.report.first()).await,
            END => {
                session.state = START.to_string();
                Ok(RenderPayload::end(END, BYE_TEXT))
            }
            other => Err(AppError::UnknownState(other.to_string())),
        }
    }

    async fn enter_step(
        &self,
        session: &mut Session,
        flow: &Flow,
        name: &StepName,
    ) -> Result<RenderPayload, AppError> {
        let payload = build_step_payload(flow, name.as_str(), &session.answers, &self.templates)?;
        if let Some(Step::Terminal(terminal)) = flow.step(name.as_str()) {
            self.complete(session, flow, terminal).await?;
            session.state = START.to_string();
        } else {
            session.state = name.to_string();
        }
        Ok(payload)
    }

    /// Runs a terminal's completion exactly once, on entry.
    ///
    /// Delivery and contact-store problems are logged and never keep the
    /// user from the closing text.
    async fn complete(
        &self,
        session: &Session,
        flow: &Flow,
        terminal: &TerminalStep,
    ) -> Result<(), AppError> {
        let Some(completion) = &terminal.on_complete else {
            return Ok(());
        };

        let view = flow.view(&session.answers);
        for template in &completion.messages {
            let message = match template.render(&view) {
                Ok(message) => message,
                Err(err) => {
                    tracing::error!(
                        template = %template.name,
                        sender = %session.user,
                        error = %err,
                        "report message could not be rendered"
                    );
                    continue;
                }
            };
            match self.gateway.send(&session.user, &message).await {
                Ok(delivery) => {
                    tracing::debug!(template = %template.name, ?delivery, "report delivered");
                }
                Err(err) => {
                    tracing::error!(
                        template = %template.name,
                        sender = %session.user,
                        report = %message,
                        error = %err,
                        "report delivery failed"
                    );
                }
            }
        }

        if completion.mark_registered
            && let Err(err) = self.contacts.mark_registered(&session.user).await
        {
            tracing::error!(
                sender = %session.user,
                error = %err,
                "contact could not be marked registered"
            );
        }
        Ok(())
    }

    async fn render_current(&self, session: &Session) -> Result<RenderPayload, AppError> {
        if session.state == START {
            return self.start_menu(&session.user).await;
        }
        let flow = self
            .flow_for(&session.state)
            .ok_or_else(|| AppError::UnknownState(session.state.clone()))?;
        Ok(build_step_payload(
            flow,
            &session.state,
            &session.answers,
            &self.templates,
        )?)
    }

    async fn start_menu(&self, user: &str) -> Result<RenderPayload, AppError> {
        let flow_choice = if self.contacts.is_registered(user).await? {
            RenderChoice::new(REPORT, "Report")
        } else {
            RenderChoice::new(REGISTER, "Register")
        };
        Ok(RenderPayload::menu(
            START,
            WELCOME_TEXT,
            vec![flow_choice, RenderChoice::new(END, "Exit")],
        ))
    }

    fn flow_for(&self, state: &str) -> Option<&Flow> {
        [&self.registration, &self.report]
            .into_iter()
            .find(|flow| flow.contains(state))
    }
}

fn resume_menu() -> RenderPayload {
    RenderPayload::menu(
        RESUME,
        RESUME_TEXT,
        vec![
            RenderChoice::new(CONTINUE, "Continue"),
            RenderChoice::new(RESTART, "Restart"),
        ],
    )
}
