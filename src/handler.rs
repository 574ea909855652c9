//! Endpoint trait and type erasure.
//!
//! # How endpoints are stored
//!
//! The router, the middleware chain and the server all hold endpoints of
//! *different* concrete types, so they share one trait object type:
//! [`BoxedHandler`] = `Arc<dyn Endpoint>`.
//!
//! ```text
//! struct GetBlog { store }              ← implements Endpoint directly
//! from_fn(|req| async { … })            ← FnHandler adapts a closure
//!        ↓  Arc::new(…) as BoxedHandler
//! handler.call(req)  at request time    ← one vtable dispatch
//!        ↓
//! Box::pin(async { … .into_response() })  ← BoxFuture
//! ```
//!
//! The only runtime cost per request is **one Arc clone** (atomic inc) +
//! **one virtual call**, negligible compared to network I/O.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

/// A heap-allocated, type-erased future that resolves to a [`Response`].
///
/// `Send + 'static` let tokio move the future across worker threads.
pub type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// Something that turns a request into a response.
///
/// Implement it on a struct that owns the endpoint's dependencies, or adapt
/// a plain async function with [`from_fn`].
pub trait Endpoint: Send + Sync + 'static {
    fn call(&self, req: Request) -> BoxFuture;
}

/// A type-erased endpoint shared across concurrent requests.
pub type BoxedHandler = Arc<dyn Endpoint>;

/// Erases an endpoint's concrete type.
pub fn boxed(endpoint: impl Endpoint) -> BoxedHandler {
    Arc::new(endpoint)
}

/// Adapts a function with the signature
///
/// ```text
/// async fn name(req: Request) -> impl IntoResponse
/// ```
///
/// (or an equivalent closure) into an [`Endpoint`].
pub fn from_fn<F, Fut, R>(f: F) -> FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    FnHandler(f)
}

/// Newtype wrapper that holds a concrete function `F` and implements
/// [`Endpoint`], bridging the typed world to the trait-object world.
pub struct FnHandler<F>(F);

impl<F, Fut, R> Endpoint for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        // Calling the wrapped function returns the concrete `Fut`. Map it to
        // `Response` via `IntoResponse` and box it to match the trait.
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_response() })
    }
}
