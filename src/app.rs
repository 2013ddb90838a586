//! Interaction pipeline for dbchat.
//!
//! Every UI event re-runs the whole cycle: apply the event to the session's
//! settings, check the API key, configure the database handle, build a fresh
//! agent, and answer the question if one was submitted. Only the chat history
//! and the settings survive between cycles; the handle cache is shared by all
//! sessions.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};

use crate::agent::{build_agent, SqlAgent};
use crate::config::{AgentConfig, Config, DatabaseMode};
use crate::connection::{ConnectionConfigurator, ConnectionForm};
use crate::error::Result;
use crate::llm::{create_client, LlmClient, LlmProvider};
use crate::session::SessionState;

pub use crate::llm::MISSING_API_KEY_MESSAGE;

/// Resources shared by every session in the process.
#[derive(Clone)]
pub struct SharedResources {
    configurator: ConnectionConfigurator,
    provider: LlmProvider,
    model: String,
    agent_config: AgentConfig,
    llm_override: Option<Arc<dyn LlmClient>>,
}

impl SharedResources {
    pub fn new(
        configurator: ConnectionConfigurator,
        provider: LlmProvider,
        model: impl Into<String>,
        agent_config: AgentConfig,
    ) -> Self {
        Self {
            configurator,
            provider,
            model: model.into(),
            agent_config,
            llm_override: None,
        }
    }

    /// Builds the shared resources described by a loaded config.
    pub fn from_config(config: &Config, provider: LlmProvider) -> Self {
        let configurator = ConnectionConfigurator::with_sqlx(
            config.cache.ttl(),
            config.database.resolve_embedded_path(),
        );
        Self::new(configurator, provider, &config.llm.model, config.agent)
    }

    /// Uses `client` for every agent instead of creating one per cycle.
    pub fn with_llm_client(mut self, client: Arc<dyn LlmClient>) -> Self {
        self.llm_override = Some(client);
        self
    }

    pub fn configurator(&self) -> &ConnectionConfigurator {
        &self.configurator
    }

    fn llm_client(&self, api_key: &str) -> Result<Arc<dyn LlmClient>> {
        match &self.llm_override {
            Some(client) => Ok(client.clone()),
            None => create_client(self.provider, api_key, &self.model),
        }
    }
}

/// Editable settings fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Host,
    User,
    Password,
    Database,
    ApiKey,
}

impl Field {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Host => "MySQL Host",
            Self::User => "MySQL User",
            Self::Password => "MySQL Password",
            Self::Database => "MySQL Database",
            Self::ApiKey => "OpenAI API Key",
        }
    }

    /// Whether the value is masked on screen.
    pub fn is_secret(&self) -> bool {
        matches!(self, Self::Password | Self::ApiKey)
    }
}

/// Widget values that persist across cycles of one session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSettings {
    pub mode: DatabaseMode,
    pub host: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub api_key: String,
}

impl SessionSettings {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Host => &self.host,
            Field::User => &self.user,
            Field::Password => &self.password,
            Field::Database => &self.database,
            Field::ApiKey => &self.api_key,
        }
    }

    pub fn set(&mut self, field: Field, value: String) {
        match field {
            Field::Host => self.host = value,
            Field::User => self.user = value,
            Field::Password => self.password = value,
            Field::Database => self.database = value,
            Field::ApiKey => self.api_key = value,
        }
    }

    /// Connection form for the current widget values.
    pub fn form(&self) -> ConnectionForm {
        match self.mode {
            DatabaseMode::Embedded => ConnectionForm::embedded(),
            DatabaseMode::Remote => ConnectionForm::remote(
                &self.host,
                &self.user,
                &self.password,
                &self.database,
            ),
        }
    }
}

/// One user interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// The session was opened or the screen redrawn.
    Refresh,
    SelectMode(DatabaseMode),
    /// A settings field was committed with a new value.
    EditField(Field, String),
    ClearHistory,
    /// A question was submitted.
    Submit(String),
}

/// Severity of an inline notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Warning,
    Error,
}

/// Inline message shown above the question box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// How a cycle ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Configuration is missing; nothing past the notice ran.
    Halted(Notice),
    /// An agent is ready but no question was asked.
    Ready,
    /// A question was answered.
    Answered(String),
}

/// A question whose user turn is recorded and whose answer is still owed.
pub struct PendingAnswer {
    agent: SqlAgent,
    question: String,
}

/// Where [`ChatSession::begin`] stopped.
pub enum Cycle {
    Done(CycleOutcome),
    /// The agent still has to answer.
    Pending(PendingAnswer),
}

/// One user's session: settings, chat history and the pipeline that drives them.
pub struct ChatSession {
    shared: SharedResources,
    settings: SessionSettings,
    history: SessionState,
    connection_info: Option<String>,
    agents_built: usize,
}

impl ChatSession {
    pub fn new(shared: SharedResources, settings: SessionSettings) -> Self {
        Self {
            shared,
            settings,
            history: SessionState::new(),
            connection_info: None,
            agents_built: 0,
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn history(&self) -> &SessionState {
        &self.history
    }

    /// Display string of the most recently configured database.
    pub fn connection_info(&self) -> Option<&str> {
        self.connection_info.as_deref()
    }

    /// Number of agents this session has built.
    pub fn agents_built(&self) -> usize {
        self.agents_built
    }

    pub fn shared(&self) -> &SharedResources {
        &self.shared
    }

    /// Runs one cycle of the pipeline for `event`.
    ///
    /// Missing configuration halts the cycle with a notice. Connection and
    /// agent failures are returned as errors; a failed question keeps its
    /// user turn but gets no answer.
    pub async fn handle_event(&mut self, event: UiEvent) -> Result<CycleOutcome> {
        match self.begin(event).await? {
            Cycle::Done(outcome) => Ok(outcome),
            Cycle::Pending(pending) => self.finish(pending).await,
        }
    }

    /// Runs the cycle up to the agent call.
    ///
    /// A submitted question is recorded as a user turn before this returns,
    /// so it can be drawn while the agent works on it.
    pub async fn begin(&mut self, event: UiEvent) -> Result<Cycle> {
        let question = self.apply(event);

        if self.settings.api_key.trim().is_empty() {
            return Ok(Cycle::Done(CycleOutcome::Halted(Notice::warning(
                MISSING_API_KEY_MESSAGE,
            ))));
        }

        let configurator = self.shared.configurator();
        let descriptor = match self
            .settings
            .form()
            .to_descriptor(configurator.embedded_path())
        {
            Ok(descriptor) => descriptor,
            Err(e) if e.is_missing_input() => {
                self.connection_info = None;
                return Ok(Cycle::Done(CycleOutcome::Halted(Notice::error(
                    e.to_string(),
                ))));
            }
            Err(e) => return Err(e),
        };

        let handle = configurator.configure(&descriptor).await?;
        self.connection_info = Some(descriptor.display_string());

        let llm = self.shared.llm_client(&self.settings.api_key)?;
        let agent = build_agent(handle, llm, self.shared.agent_config);
        self.agents_built += 1;

        let Some(question) = question else {
            return Ok(Cycle::Done(CycleOutcome::Ready));
        };

        self.history.push_user(question.clone());
        Ok(Cycle::Pending(PendingAnswer { agent, question }))
    }

    /// Runs the agent on a recorded question and appends its answer.
    pub async fn finish(&mut self, pending: PendingAnswer) -> Result<CycleOutcome> {
        let PendingAnswer { agent, question } = pending;

        let start = Instant::now();
        let answer = agent.run(&question).await?;
        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Question answered"
        );
        self.history.push_assistant(answer.clone());

        Ok(CycleOutcome::Answered(answer))
    }

    /// Applies the event to the persisted state and returns the submitted
    /// question, if any.
    fn apply(&mut self, event: UiEvent) -> Option<String> {
        match event {
            UiEvent::Refresh => None,
            UiEvent::SelectMode(mode) => {
                debug!(mode = %mode, "Database mode selected");
                self.settings.mode = mode;
                None
            }
            UiEvent::EditField(field, value) => {
                self.settings.set(field, value);
                None
            }
            UiEvent::ClearHistory => {
                self.history.reset();
                None
            }
            UiEvent::Submit(question) => {
                let question = question.trim();
                (!question.is_empty()).then(|| question.to_string())
            }
        }
    }
}
