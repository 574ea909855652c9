//! Middleware layer.
//!
//! Middleware intercepts requests and responses and is the right place for
//! cross-cutting concerns: request logging, fault isolation, throttling and
//! CORS. Each [`Middleware`] turns an endpoint into a wrapping endpoint; a
//! [`Chain`] lists them outermost first and applies them around the router.
//!
//! ```rust
//! use quill::{Chain, MemoryBlogStore};
//! use quill::middleware::{Cors, Logging, RateLimit, Recover};
//! use std::sync::Arc;
//!
//! let router = quill::api::routes(Arc::new(MemoryBlogStore::new()));
//! let app = Chain::new()
//!     .with(Logging)
//!     .with(Recover)
//!     .with(RateLimit::unlimited())
//!     .with(Cors)
//!     .around(router);
//! ```

mod cors;
mod logging;
mod rate_limit;
mod recover;

pub use cors::Cors;
pub use logging::Logging;
pub use rate_limit::{Decision, Limiter, RateLimit, Unlimited};
pub use recover::Recover;

use crate::handler::{BoxedHandler, Endpoint, boxed};

/// Wraps an endpoint in another endpoint.
pub trait Middleware: Send + Sync + 'static {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler;
}

/// An ordered list of middleware, outermost first.
#[derive(Default)]
pub struct Chain {
    layers: Vec<Box<dyn Middleware>>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `middleware` inside everything added before it.
    pub fn with(mut self, middleware: impl Middleware) -> Self {
        self.layers.push(Box::new(middleware));
        self
    }

    /// Wraps `endpoint` so a request passes through the layers in the order
    /// they were added.
    pub fn around(self, endpoint: impl Endpoint) -> BoxedHandler {
        self.layers
            .iter()
            .rev()
            .fold(boxed(endpoint), |next, layer| layer.wrap(next))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::handler::{BoxFuture, from_fn};
    use crate::method::Method;
    use crate::request::Request;

    /// Appends its tag to the `x-trace` header on the way out.
    struct Tag(&'static str);

    struct Tagged {
        tag: &'static str,
        next: BoxedHandler,
    }

    impl Endpoint for Tagged {
        fn call(&self, req: Request) -> BoxFuture {
            let tag = self.tag;
            let next = Arc::clone(&self.next);
            Box::pin(async move {
                let mut res = next.call(req).await;
                let trace = match res.header("x-trace") {
                    Some(inner) => format!("{inner},{tag}"),
                    None => tag.to_owned(),
                };
                res.set_header("x-trace", &trace);
                res
            })
        }
    }

    impl Middleware for Tag {
        fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
            Arc::new(Tagged { tag: self.0, next })
        }
    }

    #[tokio::test]
    async fn first_added_is_outermost() {
        let app = Chain::new()
            .with(Tag("outer"))
            .with(Tag("inner"))
            .around(from_fn(|_req: Request| async { "ok" }));

        let res = app.call(Request::builder(Method::Get, "/").build()).await;
        assert_eq!(res.header("x-trace"), Some("inner,outer"));
    }
}
