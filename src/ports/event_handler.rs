//! EventHandler port - a subscriber to bus events.

use async_trait::async_trait;

use crate::domain::bus::Event;
use crate::domain::foundation::DomainError;

/// Handler for processing bus events.
///
/// Implementations should be:
/// - **Quick** - delivery is inline, so a slow subscriber delays the publisher
/// - **Isolated** - an error is logged by the bus and never reaches other subscribers
///
/// # Example
///
/// ```ignore
/// struct StatusPrinter;
///
/// #[async_trait]
/// impl EventHandler for StatusPrinter {
///     async fn handle(&self, event: Event) -> Result<(), DomainError> {
///         if let Some(status) = event.as_status() {
///             println!("{status}");
///         }
///         Ok(())
///     }
///
///     fn name(&self) -> &'static str {
///         "StatusPrinter"
///     }
/// }
/// ```
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Process an event.
    async fn handle(&self, event: Event) -> Result<(), DomainError>;

    /// Handler name for logging.
    fn name(&self) -> &'static str;
}
