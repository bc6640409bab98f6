//! In-process command/event bus shared by every engine session.
//!
//! Commands are routed to exactly one handler keyed by
//! ([`CommandKind`], [`SessionScope`]). A handler registered for a concrete
//! session wins over a `Global` one. Events fan out to every subscriber whose
//! kind matches and whose scope is the event's session or `Global`, in
//! registration order.
//!
//! Delivery is inline: `execute` and `publish` await their handlers before
//! returning. Registry locks are released before any handler runs.
//!
//! # Example
//!
//! ```ignore
//! let bus = Arc::new(MessageBus::new());
//! bus.start();
//!
//! bus.register_command_handler(CommandKind::Confirmation, approver, SessionScope::Global)?;
//! bus.register_event_handler(EventKind::Status, printer, SessionScope::from(&session));
//!
//! let answer = bus.execute(ConfirmationCommand::new(session, "Creating task ...")).await?;
//! ```

use futures::FutureExt;
use std::collections::HashMap;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

use crate::domain::bus::{BusError, Command, CommandKind, CommandResult, Event, EventKind};
use crate::domain::foundation::{panic_message, SessionId, SessionScope};
use crate::ports::{CommandHandler, EventHandler};

/// Handle returned by [`MessageBus::register_event_handler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

type CommandRoute = (CommandKind, SessionScope);

struct Subscription {
    id: SubscriptionId,
    kind: EventKind,
    scope: SessionScope,
    handler: Arc<dyn EventHandler>,
}

/// The command/event bus.
pub struct MessageBus {
    command_handlers: RwLock<HashMap<CommandRoute, Arc<dyn CommandHandler>>>,
    subscriptions: RwLock<Vec<Subscription>>,
    next_subscription: AtomicU64,
    running: AtomicBool,
}

impl MessageBus {
    /// Creates a stopped bus with empty registries.
    pub fn new() -> Self {
        Self {
            command_handlers: RwLock::new(HashMap::new()),
            subscriptions: RwLock::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
            running: AtomicBool::new(false),
        }
    }

    // === Lifecycle ===

    /// Starts accepting commands and events. Idempotent.
    pub fn start(&self) {
        if !self.running.swap(true, Ordering::SeqCst) {
            debug!("Message bus started");
        }
    }

    /// Stops accepting commands and events. Registrations are kept.
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            debug!("Message bus stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn ensure_running(&self) -> Result<(), BusError> {
        if self.is_running() {
            Ok(())
        } else {
            Err(BusError::BusNotRunning)
        }
    }

    // === Commands ===

    /// Registers the single handler for (`kind`, `scope`).
    ///
    /// # Errors
    ///
    /// `DuplicateRegistration` if a handler already owns that route.
    pub fn register_command_handler(
        &self,
        kind: CommandKind,
        handler: Arc<dyn CommandHandler>,
        scope: SessionScope,
    ) -> Result<(), BusError> {
        let mut handlers = self
            .command_handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let route = (kind, scope);
        if handlers.contains_key(&route) {
            let (kind, scope) = route;
            return Err(BusError::DuplicateRegistration { kind, scope });
        }

        debug!(kind = %kind, scope = %route.1, handler = handler.name(), "Command handler registered");
        handlers.insert(route, handler);
        Ok(())
    }

    /// Removes the handler for (`kind`, `scope`). Returns whether one existed.
    pub fn unregister_command_handler(&self, kind: CommandKind, scope: &SessionScope) -> bool {
        let removed = self
            .command_handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&(kind, scope.clone()))
            .is_some();

        if removed {
            debug!(kind = %kind, scope = %scope, "Command handler unregistered");
        }
        removed
    }

    /// Checks whether exactly this route has a handler (no global fallback).
    pub fn has_command_handler(&self, kind: CommandKind, scope: &SessionScope) -> bool {
        self.command_handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&(kind, scope.clone()))
    }

    fn resolve_command_handler(
        &self,
        kind: CommandKind,
        session: &SessionId,
    ) -> Option<Arc<dyn CommandHandler>> {
        let handlers = self
            .command_handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        handlers
            .get(&(kind, SessionScope::from(session)))
            .or_else(|| handlers.get(&(kind, SessionScope::Global)))
            .cloned()
    }

    /// Routes `command` to its handler and returns that handler's answer.
    ///
    /// A panicking handler is reported as a failed result.
    ///
    /// # Errors
    ///
    /// - `BusNotRunning` outside `start()`/`stop()`
    /// - `UnhandledCommand` if neither the session nor `Global` has a handler
    pub async fn execute(&self, command: impl Into<Command>) -> Result<CommandResult, BusError> {
        let command = command.into();
        self.ensure_running()?;

        let kind = command.kind();
        let session = command.session_id().clone();
        let handler = self
            .resolve_command_handler(kind, &session)
            .ok_or_else(|| BusError::UnhandledCommand {
                kind,
                session: session.clone(),
            })?;

        debug!(kind = %kind, session_id = %session, handler = handler.name(), "Executing command");

        match AssertUnwindSafe(handler.handle(command)).catch_unwind().await {
            Ok(result) => Ok(result),
            Err(panic) => {
                let reason = panic_message(panic.as_ref());
                warn!(
                    kind = %kind,
                    session_id = %session,
                    handler = handler.name(),
                    "Command handler panicked: {}",
                    reason
                );
                Ok(CommandResult::failure(format!(
                    "{} handler panicked: {}",
                    handler.name(),
                    reason
                )))
            }
        }
    }

    // === Events ===

    /// Subscribes `handler` to events of `kind` within `scope`.
    ///
    /// Any number of subscribers may share a kind and scope.
    pub fn register_event_handler(
        &self,
        kind: EventKind,
        handler: Arc<dyn EventHandler>,
        scope: SessionScope,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        debug!(kind = %kind, scope = %scope, handler = handler.name(), subscription = %id, "Event handler registered");

        self.subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Subscription {
                id,
                kind,
                scope,
                handler,
            });
        id
    }

    /// Removes one subscription. Returns whether it existed.
    pub fn unregister_event_handler(&self, id: SubscriptionId) -> bool {
        let mut subscriptions = self
            .subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = subscriptions.len();
        subscriptions.retain(|s| s.id != id);
        before != subscriptions.len()
    }

    /// Number of subscriptions for `kind`, across all scopes.
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|s| s.kind == kind)
            .count()
    }

    /// Delivers `event` to every matching subscriber.
    ///
    /// Subscriber failures are logged and never reach the publisher or stop
    /// delivery to the remaining subscribers.
    ///
    /// # Errors
    ///
    /// `BusNotRunning` outside `start()`/`stop()`.
    pub async fn publish(&self, event: impl Into<Event>) -> Result<(), BusError> {
        let event = event.into();
        self.ensure_running()?;

        let kind = event.kind();
        // Clone handlers to release lock before await points
        let targets: Vec<Arc<dyn EventHandler>> = {
            let subscriptions = self
                .subscriptions
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            subscriptions
                .iter()
                .filter(|s| s.kind == kind && s.scope.matches(event.session_id()))
                .map(|s| Arc::clone(&s.handler))
                .collect()
        };

        debug!(kind = %kind, session_id = %event.session_id(), subscribers = targets.len(), "Publishing event");

        for handler in targets {
            match AssertUnwindSafe(handler.handle(event.clone()))
                .catch_unwind()
                .await
            {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(kind = %kind, handler = handler.name(), "Event handler failed: {}", e);
                }
                Err(panic) => {
                    warn!(
                        kind = %kind,
                        handler = handler.name(),
                        "Event handler panicked: {}",
                        panic_message(panic.as_ref())
                    );
                }
            }
        }

        Ok(())
    }

    // === Session teardown ===

    /// Drops every command handler and subscription scoped to `session`.
    ///
    /// `Global` registrations are untouched.
    pub fn unregister_session(&self, session: &SessionId) {
        let scope = SessionScope::from(session);

        let commands_removed = {
            let mut handlers = self
                .command_handlers
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            let before = handlers.len();
            handlers.retain(|(_, s), _| *s != scope);
            before - handlers.len()
        };

        let subscriptions_removed = {
            let mut subscriptions = self
                .subscriptions
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            let before = subscriptions.len();
            subscriptions.retain(|s| s.scope != scope);
            before - subscriptions.len()
        };

        debug!(
            session_id = %session,
            commands_removed,
            subscriptions_removed,
            "Session unregistered from bus"
        );
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MessageBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let commands = self
            .command_handlers
            .read()
            .map(|h| h.len())
            .unwrap_or_default();
        let subscriptions = self
            .subscriptions
            .read()
            .map(|s| s.len())
            .unwrap_or_default();
        f.debug_struct("MessageBus")
            .field("running", &self.is_running())
            .field("command_handlers", &commands)
            .field("subscriptions", &subscriptions)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bus::{
        ConfirmationCommand, EngineStatus, PromptCommand, StatusEvent, ToolResultEvent,
    };
    use crate::domain::foundation::{DomainError, ErrorCode};
    use async_trait::async_trait;
    use std::sync::Mutex;

    // ════════════════════════════════════════════════════════════════════════════
    // Test Handlers
    // ════════════════════════════════════════════════════════════════════════════

    struct Answer(&'static str);

    #[async_trait]
    impl CommandHandler for Answer {
        async fn handle(&self, _command: Command) -> CommandResult {
            CommandResult::success(self.0)
        }

        fn name(&self) -> &'static str {
            "Answer"
        }
    }

    struct Panicking;

    #[async_trait]
    impl CommandHandler for Panicking {
        async fn handle(&self, _command: Command) -> CommandResult {
            panic!("handler blew up")
        }

        fn name(&self) -> &'static str {
            "Panicking"
        }
    }

    #[derive(Default)]
    struct Collect {
        seen: Mutex<Vec<String>>,
        tag: &'static str,
        log: Option<Arc<Mutex<Vec<&'static str>>>>,
    }

    impl Collect {
        fn tagged(tag: &'static str, log: Arc<Mutex<Vec<&'static str>>>) -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
                tag,
                log: Some(log),
            }
        }

        fn count(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl EventHandler for Collect {
        async fn handle(&self, event: Event) -> Result<(), DomainError> {
            self.seen.lock().unwrap().push(event.session_id().to_string());
            if let Some(log) = &self.log {
                log.lock().unwrap().push(self.tag);
            }
            Ok(())
        }

        fn name(&self) -> &'static str {
            "Collect"
        }
    }

    struct Failing;

    #[async_trait]
    impl EventHandler for Failing {
        async fn handle(&self, _event: Event) -> Result<(), DomainError> {
            Err(DomainError::new(ErrorCode::SubscriberFailed, "subscriber broke"))
        }

        fn name(&self) -> &'static str {
            "Failing"
        }
    }

    struct PanickingSubscriber;

    #[async_trait]
    impl EventHandler for PanickingSubscriber {
        async fn handle(&self, _event: Event) -> Result<(), DomainError> {
            panic!("subscriber panicked")
        }

        fn name(&self) -> &'static str {
            "PanickingSubscriber"
        }
    }

    fn session(token: &str) -> SessionId {
        SessionId::parse(token).unwrap()
    }

    fn running_bus() -> MessageBus {
        let bus = MessageBus::new();
        bus.start();
        bus
    }

    fn status(session_id: SessionId) -> StatusEvent {
        StatusEvent::new(session_id, EngineStatus::CallingModel)
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Lifecycle
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn execute_before_start_fails() {
        let bus = MessageBus::new();
        let result = bus.execute(PromptCommand::new(session("a"), "hi")).await;
        assert_eq!(result.unwrap_err(), BusError::BusNotRunning);
    }

    #[tokio::test]
    async fn publish_after_stop_fails() {
        let bus = running_bus();
        bus.stop();
        let result = bus.publish(status(session("a"))).await;
        assert_eq!(result.unwrap_err(), BusError::BusNotRunning);
    }

    #[test]
    fn start_is_idempotent() {
        let bus = MessageBus::new();
        bus.start();
        bus.start();
        assert!(bus.is_running());
        bus.stop();
        assert!(!bus.is_running());
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Command routing
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn session_handler_beats_global() {
        let bus = running_bus();
        bus.register_command_handler(CommandKind::Confirmation, Arc::new(Answer("global")), SessionScope::Global)
            .unwrap();
        bus.register_command_handler(
            CommandKind::Confirmation,
            Arc::new(Answer("scoped")),
            SessionScope::from(session("a")),
        )
        .unwrap();

        let scoped = bus.execute(ConfirmationCommand::new(session("a"), "ok?")).await.unwrap();
        let fallback = bus.execute(ConfirmationCommand::new(session("b"), "ok?")).await.unwrap();

        assert_eq!(scoped.result_text(), Some("scoped"));
        assert_eq!(fallback.result_text(), Some("global"));
    }

    #[tokio::test]
    async fn unhandled_command_names_kind_and_session() {
        let bus = running_bus();
        bus.register_command_handler(
            CommandKind::Prompt,
            Arc::new(Answer("x")),
            SessionScope::from(session("a")),
        )
        .unwrap();

        let err = bus.execute(PromptCommand::new(session("z"), "hi")).await.unwrap_err();
        assert_eq!(
            err,
            BusError::UnhandledCommand {
                kind: CommandKind::Prompt,
                session: session("z")
            }
        );
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let bus = MessageBus::new();
        let scope = SessionScope::from(session("a"));
        bus.register_command_handler(CommandKind::Prompt, Arc::new(Answer("1")), scope.clone())
            .unwrap();

        let err = bus
            .register_command_handler(CommandKind::Prompt, Arc::new(Answer("2")), scope.clone())
            .unwrap_err();
        assert_eq!(
            err,
            BusError::DuplicateRegistration {
                kind: CommandKind::Prompt,
                scope
            }
        );
    }

    #[test]
    fn same_kind_different_sessions_coexist() {
        let bus = MessageBus::new();
        bus.register_command_handler(CommandKind::Prompt, Arc::new(Answer("a")), SessionScope::from(session("a")))
            .unwrap();
        bus.register_command_handler(CommandKind::Prompt, Arc::new(Answer("b")), SessionScope::from(session("b")))
            .unwrap();
        bus.register_command_handler(CommandKind::Confirmation, Arc::new(Answer("c")), SessionScope::from(session("a")))
            .unwrap();
    }

    #[tokio::test]
    async fn unregistered_route_can_be_taken_again() {
        let bus = running_bus();
        let scope = SessionScope::from(session("a"));
        bus.register_command_handler(CommandKind::Prompt, Arc::new(Answer("old")), scope.clone())
            .unwrap();

        assert!(bus.unregister_command_handler(CommandKind::Prompt, &scope));
        assert!(!bus.unregister_command_handler(CommandKind::Prompt, &scope));

        bus.register_command_handler(CommandKind::Prompt, Arc::new(Answer("new")), scope)
            .unwrap();
        let result = bus.execute(PromptCommand::new(session("a"), "hi")).await.unwrap();
        assert_eq!(result.result_text(), Some("new"));
    }

    #[tokio::test]
    async fn panicking_handler_becomes_failed_result() {
        let bus = running_bus();
        bus.register_command_handler(CommandKind::Prompt, Arc::new(Panicking), SessionScope::Global)
            .unwrap();

        let result = bus.execute(PromptCommand::new(session("a"), "hi")).await.unwrap();
        assert!(!result.is_success());
        assert!(result.error().unwrap().contains("handler blew up"));
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Event fan-out
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn publish_without_subscribers_is_ok() {
        let bus = running_bus();
        bus.publish(status(session("a"))).await.unwrap();
    }

    #[tokio::test]
    async fn scoped_subscriber_only_sees_its_session() {
        let bus = running_bus();
        let scoped = Arc::new(Collect::default());
        let global = Arc::new(Collect::default());
        bus.register_event_handler(EventKind::Status, scoped.clone(), SessionScope::from(session("a")));
        bus.register_event_handler(EventKind::Status, global.clone(), SessionScope::Global);

        bus.publish(status(session("a"))).await.unwrap();
        bus.publish(status(session("b"))).await.unwrap();

        assert_eq!(scoped.count(), 1);
        assert_eq!(global.count(), 2);
    }

    #[tokio::test]
    async fn subscribers_only_see_their_kind() {
        let bus = running_bus();
        let tool_results = Arc::new(Collect::default());
        bus.register_event_handler(EventKind::ToolResult, tool_results.clone(), SessionScope::Global);

        bus.publish(status(session("a"))).await.unwrap();
        bus.publish(ToolResultEvent::new(session("a"), "t", "r")).await.unwrap();

        assert_eq!(tool_results.count(), 1);
    }

    #[tokio::test]
    async fn delivery_follows_registration_order() {
        let bus = running_bus();
        let log = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            bus.register_event_handler(
                EventKind::Status,
                Arc::new(Collect::tagged(tag, log.clone())),
                SessionScope::Global,
            );
        }

        bus.publish(status(session("a"))).await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn failing_subscribers_do_not_stop_delivery() {
        let bus = running_bus();
        let after = Arc::new(Collect::default());
        bus.register_event_handler(EventKind::Status, Arc::new(Failing), SessionScope::Global);
        bus.register_event_handler(EventKind::Status, Arc::new(PanickingSubscriber), SessionScope::Global);
        bus.register_event_handler(EventKind::Status, after.clone(), SessionScope::Global);

        bus.publish(status(session("a"))).await.unwrap();
        assert_eq!(after.count(), 1);
    }

    #[tokio::test]
    async fn unregistered_subscription_stops_receiving() {
        let bus = running_bus();
        let collect = Arc::new(Collect::default());
        let id = bus.register_event_handler(EventKind::Status, collect.clone(), SessionScope::Global);

        assert!(bus.unregister_event_handler(id));
        assert!(!bus.unregister_event_handler(id));

        bus.publish(status(session("a"))).await.unwrap();
        assert_eq!(collect.count(), 0);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Session teardown
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn unregister_session_keeps_global_and_other_sessions() {
        let bus = running_bus();
        let a = SessionScope::from(session("a"));
        let b = SessionScope::from(session("b"));
        bus.register_command_handler(CommandKind::Prompt, Arc::new(Answer("a")), a.clone())
            .unwrap();
        bus.register_command_handler(CommandKind::Prompt, Arc::new(Answer("b")), b.clone())
            .unwrap();
        bus.register_command_handler(CommandKind::Confirmation, Arc::new(Answer("g")), SessionScope::Global)
            .unwrap();
        bus.register_event_handler(EventKind::Status, Arc::new(Collect::default()), a.clone());
        bus.register_event_handler(EventKind::Status, Arc::new(Collect::default()), SessionScope::Global);

        bus.unregister_session(&session("a"));

        assert!(!bus.has_command_handler(CommandKind::Prompt, &a));
        assert!(bus.has_command_handler(CommandKind::Prompt, &b));
        assert!(bus.has_command_handler(CommandKind::Confirmation, &SessionScope::Global));
        assert_eq!(bus.subscriber_count(EventKind::Status), 1);
    }
}
