use std::sync::Arc;

use super::Middleware;
use crate::api::ErrorResponse;
use crate::handler::{BoxFuture, BoxedHandler, Endpoint};
use crate::request::Request;
use crate::status::Status;

/// Verdict of a [`Limiter`] for one request.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Decision {
    Allow,
    Deny,
}

/// Decides whether a request may proceed.
pub trait Limiter: Send + Sync + 'static {
    fn check(&self, req: &Request) -> Decision;
}

// TODO: token-bucket limiter keyed by remote address, plus a variant backed
// by a shared store for multi-instance deployments.

/// A [`Limiter`] that allows everything.
///
/// This is the only limiter shipped: throttling is left to the proxy in front
/// of the service for now.
pub struct Unlimited;

impl Limiter for Unlimited {
    fn check(&self, _req: &Request) -> Decision {
        Decision::Allow
    }
}

/// Consults a [`Limiter`] before the inner endpoint runs. A denied request
/// gets 429 `{"error":"Too many requests"}`.
pub struct RateLimit {
    limiter: Arc<dyn Limiter>,
}

impl RateLimit {
    pub fn new(limiter: impl Limiter) -> Self {
        Self { limiter: Arc::new(limiter) }
    }

    /// Pass-through: every request is allowed.
    pub fn unlimited() -> Self {
        Self::new(Unlimited)
    }
}

impl Middleware for RateLimit {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        Arc::new(Limited { limiter: Arc::clone(&self.limiter), next })
    }
}

struct Limited {
    limiter: Arc<dyn Limiter>,
    next: BoxedHandler,
}

impl Endpoint for Limited {
    fn call(&self, req: Request) -> BoxFuture {
        match self.limiter.check(&req) {
            Decision::Allow => self.next.call(req),
            Decision::Deny => Box::pin(async {
                ErrorResponse::new("Too many requests").respond(Status::TooManyRequests)
            }),
        }
    }
}
