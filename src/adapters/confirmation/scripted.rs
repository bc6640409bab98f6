//! Fixed and scripted confirmation answers.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::domain::bus::{Command, CommandResult, ConfirmationCommand};
use crate::ports::CommandHandler;

fn not_a_confirmation(command: &Command, handler: &str) -> CommandResult {
    CommandResult::failure(format!(
        "{} only answers confirmation commands, got {}",
        handler,
        command.kind()
    ))
}

/// Gives the same answer to every confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticConfirmationHandler {
    approve: bool,
}

impl StaticConfirmationHandler {
    pub fn approve_all() -> Self {
        Self { approve: true }
    }

    pub fn deny_all() -> Self {
        Self { approve: false }
    }
}

#[async_trait]
impl CommandHandler for StaticConfirmationHandler {
    async fn handle(&self, command: Command) -> CommandResult {
        match command {
            Command::Confirmation(_) => CommandResult::success(self.approve),
            other => not_a_confirmation(&other, self.name()),
        }
    }

    fn name(&self) -> &'static str {
        "StaticConfirmationHandler"
    }
}

/// Answers from a queue and records every request.
///
/// Once the queue is empty the fallback answer is used (deny unless set).
#[derive(Debug, Default)]
pub struct RecordingConfirmationHandler {
    answers: Mutex<VecDeque<bool>>,
    fallback: bool,
    requests: Mutex<Vec<ConfirmationCommand>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RecordingConfirmationHandler {
    /// Creates a handler that denies everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a handler that plays back `answers` in order.
    pub fn with_answers(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Sets the answer used once the queue is empty.
    pub fn with_fallback(mut self, approve: bool) -> Self {
        self.fallback = approve;
        self
    }

    /// Returns every confirmation received, in order.
    pub fn requests(&self) -> Vec<ConfirmationCommand> {
        lock(&self.requests).clone()
    }

    /// Returns the descriptions shown, in order.
    pub fn descriptions(&self) -> Vec<String> {
        lock(&self.requests).iter().map(|r| r.prompt.clone()).collect()
    }

    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }
}

#[async_trait]
impl CommandHandler for RecordingConfirmationHandler {
    async fn handle(&self, command: Command) -> CommandResult {
        match command {
            Command::Confirmation(request) => {
                lock(&self.requests).push(request);
                let answer = lock(&self.answers).pop_front().unwrap_or(self.fallback);
                CommandResult::success(answer)
            }
            other => not_a_confirmation(&other, self.name()),
        }
    }

    fn name(&self) -> &'static str {
        "RecordingConfirmationHandler"
    }
}
