use async_trait::async_trait;

use crate::error::NotifyError;

/// Common interface implemented by every notification transport.
///
/// Implementations must be `Send + Sync` so a single notifier can be shared
/// between the scheduler engine and HTTP handlers and driven from multiple
/// Tokio tasks.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Stable lowercase identifier for this transport (e.g. `"sms"`).
    fn name(&self) -> &str;

    /// Deliver `body` to the destination address `to`.
    ///
    /// This is intentionally `&self` (shared reference) so concurrent
    /// dispatch tasks can send without a mutable borrow.
    async fn send(&self, to: &str, body: &str) -> Result<(), NotifyError>;
}

/// Placeholder transport used when no SMS credentials are configured.
///
/// Every send fails with `Unavailable`; callers log the failure and carry on.
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    fn name(&self) -> &str {
        "null"
    }

    async fn send(&self, _to: &str, _body: &str) -> Result<(), NotifyError> {
        Err(NotifyError::Unavailable(
            "no SMS credentials configured — set [sms] in ombrelle.toml".into(),
        ))
    }
}
