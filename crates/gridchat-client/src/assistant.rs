//! The ask pipeline: context, completion, and the optional write step.

use std::sync::Arc;

use crate::backend::BackendApi;
use crate::completion::{ChatMessage, CompletionApi};
use crate::config::ClientConfig;
use crate::context::ContextFetcher;
use crate::error::{ClientError, Result};
use crate::executor::{WriteExecutor, WriteReport};
use crate::extract;
use crate::fence::RequestGate;
use crate::health::PauseHandle;
use crate::prompt;
use crate::session::{Role, Session};
use crate::store::KeyValueStore;

/// What happened to the write step of an answered ask.
#[derive(Debug)]
pub enum WriteOutcome {
    Applied(WriteReport),
    /// The write request itself failed; the answer still stands.
    Failed(ClientError),
}

#[derive(Debug)]
pub struct Answer {
    pub reply: String,
    /// Shown to the user next to the reply, e.g. when context was missing.
    pub notice: Option<String>,
    /// `None` unless write mode is on and the reply carried operations.
    pub write: Option<WriteOutcome>,
}

#[derive(Debug)]
pub enum AskOutcome {
    Answered(Answer),
    /// The user cancelled; no assistant turn was added.
    Cancelled,
    /// A newer ask started first; this reply was dropped.
    Superseded,
}

/// Runs asks against a session. Cheap to share; all asks made through one
/// assistant (or its clones) share a single request gate.
#[derive(Clone)]
pub struct Assistant {
    backend: Arc<dyn BackendApi>,
    completion: Arc<dyn CompletionApi>,
    store: Arc<dyn KeyValueStore>,
    context: Arc<ContextFetcher>,
    executor: Arc<WriteExecutor>,
    gate: Arc<RequestGate>,
    config: Arc<ClientConfig>,
}

impl Assistant {
    pub fn new(
        config: ClientConfig,
        backend: Arc<dyn BackendApi>,
        completion: Arc<dyn CompletionApi>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let context = ContextFetcher::new(backend.clone(), config.context_attempts);
        let executor = WriteExecutor::new(backend.clone(), config.target());
        Self {
            backend,
            completion,
            store,
            context: Arc::new(context),
            executor: Arc::new(executor),
            gate: Arc::new(RequestGate::new()),
            config: Arc::new(config),
        }
    }

    /// Pause `monitor` around writes, resuming it after the configured
    /// quiescence delay.
    pub fn with_monitor(self, monitor: PauseHandle) -> Self {
        let quiescence = self.config.write_quiescence();
        let executor = WriteExecutor::new(self.backend.clone(), self.config.target())
            .with_monitor(monitor, quiescence);
        Self {
            executor: Arc::new(executor),
            ..self
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The system prompt a new session should start with.
    pub fn system_prompt(&self) -> String {
        self.config
            .system_prompt
            .clone()
            .unwrap_or_else(|| prompt::system_prompt(self.config.write_mode))
    }

    /// A session restored from the store, or a fresh one.
    pub fn load_session(&self) -> Session {
        match Session::load(self.store.as_ref(), self.system_prompt()) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("could not restore chat history: {e}");
                Session::new(self.system_prompt())
            }
        }
    }

    /// Persist the visible turns of `session`.
    pub fn save_session(&self, session: &Session) -> Result<()> {
        session.save(self.store.as_ref())
    }

    /// Cancel the ask currently in flight, if any.
    pub fn cancel(&self) -> bool {
        self.gate.cancel_current()
    }

    /// Ask `question` in `session`.
    ///
    /// Context failures become a notice and write failures are reported in
    /// the answer; only a failed completion is an error.
    pub async fn ask(&self, session: &mut Session, question: &str) -> Result<AskOutcome> {
        let ticket = self.gate.begin();
        session.push_user(question);

        let target = self.config.target();
        let fetched = tokio::select! {
            biased;
            _ = ticket.token().cancelled() => return Ok(self.cancelled(&ticket)),
            fetched = self.context.fetch(&target) => fetched,
        };
        let (context, notice) = match fetched {
            Ok(data) => (
                Some(prompt::render_context(&data, self.config.context_row_limit)),
                None,
            ),
            Err(e) => (
                None,
                Some(format!("Could not read the spreadsheet ({e}); answering without it.")),
            ),
        };

        let messages = self.messages(session, context.as_deref());
        let reply = tokio::select! {
            biased;
            _ = ticket.token().cancelled() => return Ok(self.cancelled(&ticket)),
            reply = self.completion.complete(&messages) => reply?,
        };

        if !self.gate.is_current(&ticket) {
            tracing::warn!(generation = ticket.generation(), "dropping reply to superseded request");
            return Ok(AskOutcome::Superseded);
        }

        session.push_assistant(reply.clone());
        if let Err(e) = self.save_session(session) {
            tracing::warn!("could not save chat history: {e}");
        }

        let write = if self.config.write_mode {
            self.write_step(&reply).await
        } else {
            None
        };

        Ok(AskOutcome::Answered(Answer {
            reply,
            notice,
            write,
        }))
    }

    async fn write_step(&self, reply: &str) -> Option<WriteOutcome> {
        let batch = extract::extract(reply)?;
        Some(match self.executor.execute(&batch).await {
            Ok(report) => WriteOutcome::Applied(report),
            Err(e) => {
                tracing::warn!("write batch failed: {e}");
                WriteOutcome::Failed(e)
            }
        })
    }

    fn cancelled(&self, ticket: &crate::fence::RequestTicket) -> AskOutcome {
        tracing::info!(generation = ticket.generation(), "request cancelled");
        AskOutcome::Cancelled
    }

    /// System turn, earlier turns, then the latest user turn with context.
    fn messages(&self, session: &Session, context: Option<&str>) -> Vec<ChatMessage> {
        let mut messages: Vec<ChatMessage> = session
            .all_turns()
            .map(|t| ChatMessage::new(t.role, t.text.clone()))
            .collect();
        if let Some(last) = messages.last_mut().filter(|m| m.role == Role::User) {
            last.content = prompt::with_context(&last.content, context);
        }
        messages
    }
}
