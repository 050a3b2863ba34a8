//! Session controller: conversation lifecycle and message flow
//!
//! Owns the conversation history and the session lifecycle for one user.
//! Every user action maps to one remote call at most; failures recover
//! locally (apology message, lifecycle revert) and never escape to callers.

use crate::messages::{Approach, ConversationHistory, Message};
use crate::service::ResponseServiceClient;
use crossbeam_channel::{unbounded, Receiver, Sender as ChannelSender};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Fixed reply appended when a chat turn fails
pub const CHAT_FAILURE_APOLOGY: &str =
    "Извините, произошла ошибка. Пожалуйста, попробуйте еще раз.";

/// Notice surfaced when summary generation fails
pub const SUMMARY_FAILURE_NOTICE: &str =
    "Не удалось сформировать рекомендации. Пожалуйста, попробуйте позже.";

/// Coarse phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// User may send further chat turns
    Active,
    /// A summary request is in flight; chat input is rejected
    Summarizing,
    /// Terminal; only reset is accepted
    Ended,
}

/// Events the presentation layer polls for
#[derive(Debug, Clone)]
pub enum SessionEvent {
    MessageAppended(Message),
    LifecycleChanged(Lifecycle),
    /// Summary generation failed; carries the user-visible notice
    SummaryFailed(String),
}

struct SessionState {
    lifecycle: Lifecycle,
    chat_pending: bool,
    /// Bumped by reset; responses issued under an older generation are dropped
    generation: u64,
}

/// Drives a single-user conversational session against the remote service
pub struct SessionController<C> {
    client: Arc<C>,
    history: ConversationHistory,
    state: Arc<RwLock<SessionState>>,
    event_tx: ChannelSender<SessionEvent>,
    event_rx: Receiver<SessionEvent>,
}

impl<C: ResponseServiceClient> SessionController<C> {
    pub fn new(client: Arc<C>) -> Self {
        let (event_tx, event_rx) = unbounded();
        Self {
            client,
            history: ConversationHistory::seeded(),
            state: Arc::new(RwLock::new(SessionState {
                lifecycle: Lifecycle::Active,
                chat_pending: false,
                generation: 0,
            })),
            event_tx,
            event_rx,
        }
    }

    /// Current message list in display order
    pub fn messages(&self) -> Vec<Message> {
        self.history.snapshot()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.state.read().lifecycle
    }

    /// Whether a chat request is outstanding (input should be disabled)
    pub fn is_chat_pending(&self) -> bool {
        self.state.read().chat_pending
    }

    /// Whether a summary request is outstanding
    pub fn is_summary_pending(&self) -> bool {
        self.state.read().lifecycle == Lifecycle::Summarizing
    }

    /// Poll the next pending event, if any
    pub fn try_recv_event(&self) -> Option<SessionEvent> {
        self.event_rx.try_recv().ok()
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.event_tx.send(event);
    }

    /// Send one user chat turn.
    ///
    /// Silently ignored when the text is empty, the session is not active, or
    /// a chat request is already outstanding. The user message is appended
    /// before the remote call; the reply (or a fixed apology) follows it.
    pub async fn send_user_message(&self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        let generation = {
            let mut state = self.state.write();
            if state.lifecycle != Lifecycle::Active {
                debug!(lifecycle = ?state.lifecycle, "Rejecting chat turn outside active session");
                return;
            }
            if state.chat_pending {
                debug!("Rejecting chat turn while another is outstanding");
                return;
            }
            state.chat_pending = true;
            state.generation
        };

        // Project before appending so the new turn is not embedded twice: it
        // travels as the separate current-turn argument.
        let projection = self.history.project();

        let user_message = Message::user(text);
        self.history.push(user_message.clone());
        self.emit(SessionEvent::MessageAppended(user_message));

        let result = self.client.request_chat_turn(&projection, text).await;

        {
            let mut state = self.state.write();
            if state.generation != generation {
                debug!("Discarding chat reply from a previous session generation");
                return;
            }
            state.chat_pending = false;
        }

        let reply = match result {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Chat turn failed: {e}");
                let apology = Message::bot(CHAT_FAILURE_APOLOGY, None);
                self.history.push(apology.clone());
                self.emit(SessionEvent::MessageAppended(apology));
                return;
            }
        };

        // Unrecognized classifications never reach display state
        let approach = Approach::from_label(&reply.approach).unwrap_or_else(|| {
            debug!(label = %reply.approach, "Coercing unrecognized approach");
            Approach::Integrative
        });

        let bot_message = Message::bot(reply.text, Some(approach));
        self.history.push(bot_message.clone());
        self.emit(SessionEvent::MessageAppended(bot_message));
    }

    /// End the session: request the summary and, on success, append it as the
    /// final message. No-op unless the session is active; a failed summary
    /// reverts to active so the user can retry.
    pub async fn end_session(&self) {
        let generation = {
            let mut state = self.state.write();
            if state.lifecycle != Lifecycle::Active {
                debug!(lifecycle = ?state.lifecycle, "Ignoring end-session request");
                return;
            }
            state.lifecycle = Lifecycle::Summarizing;
            state.generation
        };
        self.emit(SessionEvent::LifecycleChanged(Lifecycle::Summarizing));
        info!("Summarizing session");

        let projection = self.history.project();
        let result = self.client.request_summary(&projection).await;

        {
            let state = self.state.read();
            if state.generation != generation {
                debug!("Discarding summary from a previous session generation");
                return;
            }
        }

        match result {
            Ok(text) => {
                self.state.write().lifecycle = Lifecycle::Ended;
                let summary = Message::summary(text);
                self.history.push(summary.clone());
                self.emit(SessionEvent::MessageAppended(summary));
                self.emit(SessionEvent::LifecycleChanged(Lifecycle::Ended));
                info!("Session ended");
            }
            Err(e) => {
                warn!("Summary generation failed: {e}");
                self.state.write().lifecycle = Lifecycle::Active;
                self.emit(SessionEvent::SummaryFailed(SUMMARY_FAILURE_NOTICE.to_string()));
                self.emit(SessionEvent::LifecycleChanged(Lifecycle::Active));
            }
        }
    }

    /// Discard the conversation and start over from the seed greeting.
    /// Unconditional and idempotent; callable from any lifecycle state.
    pub fn reset(&self) {
        {
            let mut state = self.state.write();
            state.lifecycle = Lifecycle::Active;
            state.chat_pending = false;
            // In-flight responses for the old conversation no longer apply
            state.generation += 1;
        }
        self.history.reseed();
        self.emit(SessionEvent::LifecycleChanged(Lifecycle::Active));
        info!("Session reset");
    }
}
