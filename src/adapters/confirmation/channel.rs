//! Channel-backed confirmation for interactive front ends.
//!
//! Each confirmation is forwarded as a [`PendingConfirmation`] over an mpsc
//! channel. The front end shows the description and answers through the
//! embedded responder. No answer within the timeout, a dropped responder,
//! or a closed channel all count as declined.
//!
//! # Example
//!
//! ```ignore
//! let (handler, mut pending) = ChannelConfirmationHandler::new(Duration::from_secs(60));
//! bus.register_command_handler(CommandKind::Confirmation, Arc::new(handler), scope)?;
//!
//! tokio::spawn(async move {
//!     while let Some(request) = pending.recv().await {
//!         let yes = ask_user(&request.description).await;
//!         request.respond(yes);
//!     }
//! });
//! ```

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::DEFAULT_CONFIRMATION_TIMEOUT_SECS;
use crate::domain::bus::{Command, CommandResult};
use crate::domain::foundation::SessionId;
use crate::ports::CommandHandler;

const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// A confirmation waiting for a human answer.
#[derive(Debug)]
pub struct PendingConfirmation {
    pub session_id: SessionId,
    pub description: String,
    responder: oneshot::Sender<bool>,
}

impl PendingConfirmation {
    /// Sends the answer. Has no effect if the engine stopped waiting.
    pub fn respond(self, approved: bool) {
        let _ = self.responder.send(approved);
    }

    pub fn approve(self) {
        self.respond(true);
    }

    pub fn deny(self) {
        self.respond(false);
    }
}

/// Forwards confirmations to a front end and waits for the answer.
#[derive(Debug, Clone)]
pub struct ChannelConfirmationHandler {
    sender: mpsc::Sender<PendingConfirmation>,
    timeout: Duration,
}

impl ChannelConfirmationHandler {
    /// Creates the handler and the receiving end for the front end.
    pub fn new(timeout: Duration) -> (Self, mpsc::Receiver<PendingConfirmation>) {
        Self::with_capacity(timeout, DEFAULT_CHANNEL_CAPACITY)
    }

    /// Like [`new`](Self::new) with an explicit channel capacity.
    pub fn with_capacity(
        timeout: Duration,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<PendingConfirmation>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender, timeout }, receiver)
    }

    async fn ask(&self, session_id: SessionId, description: String) -> bool {
        let (responder, answer) = oneshot::channel();
        let pending = PendingConfirmation {
            session_id: session_id.clone(),
            description,
            responder,
        };

        let exchange = async {
            self.sender.send(pending).await.map_err(|_| "front end closed")?;
            answer.await.map_err(|_| "responder dropped")
        };

        match timeout(self.timeout, exchange).await {
            Ok(Ok(approved)) => {
                debug!(session_id = %session_id, approved, "Confirmation answered");
                approved
            }
            Ok(Err(reason)) => {
                warn!(session_id = %session_id, "Confirmation declined: {}", reason);
                false
            }
            Err(_) => {
                warn!(
                    session_id = %session_id,
                    timeout_secs = self.timeout.as_secs(),
                    "Confirmation timed out, treating as declined"
                );
                false
            }
        }
    }
}

impl Default for ChannelConfirmationHandler {
    /// A handler with the default timeout whose receiver is already dropped,
    /// so every confirmation is declined.
    fn default() -> Self {
        let (handler, _receiver) =
            Self::new(Duration::from_secs(DEFAULT_CONFIRMATION_TIMEOUT_SECS));
        handler
    }
}

#[async_trait]
impl CommandHandler for ChannelConfirmationHandler {
    async fn handle(&self, command: Command) -> CommandResult {
        match command {
            Command::Confirmation(request) => {
                let approved = self.ask(request.session_id, request.prompt).await;
                CommandResult::success(approved)
            }
            other => CommandResult::failure(format!(
                "{} only answers confirmation commands, got {}",
                self.name(),
                other.kind()
            )),
        }
    }

    fn name(&self) -> &'static str {
        "ChannelConfirmationHandler"
    }
}
