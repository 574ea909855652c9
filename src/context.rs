//! Request-scoped context.

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Values that travel with one request through validation and storage.
///
/// The cancellation token is a child of the server's shutdown token, so it
/// fires when the process begins shutting down. The in-memory store checks it
/// before a full scan; point lookups and writes ignore it.
#[derive(Clone, Debug)]
pub struct Context {
    request_id: Uuid,
    cancel: CancellationToken,
}

impl Context {
    pub fn new(cancel: CancellationToken) -> Self {
        Self { request_id: Uuid::new_v4(), cancel }
    }

    /// A context that is never cancelled, for work outside a request.
    pub fn background() -> Self {
        Self::new(CancellationToken::new())
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}
