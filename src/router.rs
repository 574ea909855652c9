//! Radix-tree request router.
//!
//! One tree keyed by path, O(path-length) lookup. Each path owns a
//! [`MethodRouter`]: a small per-method table with an optional catch-all.
//! A path that matches with no entry for the method answers 405; a path that
//! does not match answers 404.

use std::collections::HashMap;
use std::sync::Arc;

use matchit::Router as MatchitRouter;

use crate::handler::{BoxFuture, BoxedHandler, Endpoint};
use crate::method::Method;
use crate::request::Request;
use crate::response::Response;
use crate::status::Status;

/// Endpoints registered for one path.
#[derive(Clone, Default)]
pub struct MethodRouter {
    methods: HashMap<Method, BoxedHandler>,
    fallback: Option<BoxedHandler>,
}

impl MethodRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `endpoint` for `method`. Returns `self` for chaining.
    pub fn on(mut self, method: Method, endpoint: impl Endpoint) -> Self {
        self.methods.insert(method, Arc::new(endpoint));
        self
    }

    fn handler_for(&self, method: &Method) -> Option<&BoxedHandler> {
        self.methods.get(method).or(self.fallback.as_ref())
    }
}

/// A [`MethodRouter`] that sends every method to `endpoint`, for endpoints
/// that switch on the method themselves.
pub fn any(endpoint: impl Endpoint) -> MethodRouter {
    MethodRouter { methods: HashMap::new(), fallback: Some(Arc::new(endpoint)) }
}

/// The application router.
///
/// Build it once at startup, then hand it to the middleware chain. Each
/// [`Router::route`] call returns `self` so registrations chain naturally.
///
/// ```rust
/// # use quill::{Method, Request, Response, Router, from_fn};
/// # use quill::router::{any, MethodRouter};
/// # async fn list(_: Request) -> Response { Response::text("") }
/// # async fn create(_: Request) -> Response { Response::text("") }
/// # async fn by_id(_: Request) -> Response { Response::text("") }
/// Router::new()
///     .route("/posts", MethodRouter::new()
///         .on(Method::Get, from_fn(list))
///         .on(Method::Post, from_fn(create)))
///     .route("/posts/{*rest}", any(from_fn(by_id)));
/// ```
pub struct Router {
    tree: MatchitRouter<MethodRouter>,
}

/// Outcome of resolving a method and path.
enum Lookup<'a> {
    Found(&'a BoxedHandler),
    MethodNotAllowed,
    NotFound,
}

impl Router {
    pub fn new() -> Self {
        Self { tree: MatchitRouter::new() }
    }

    /// Register the endpoints for `path`.
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid route or conflicts with one already
    /// registered. Routes are fixed at startup, so this is a programming error.
    pub fn route(mut self, path: &str, methods: MethodRouter) -> Self {
        self.tree
            .insert(path, methods)
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    fn lookup(&self, method: &Method, path: &str) -> Lookup<'_> {
        let Ok(matched) = self.tree.at(path) else {
            return Lookup::NotFound;
        };
        match matched.value.handler_for(method) {
            Some(handler) => Lookup::Found(handler),
            None => Lookup::MethodNotAllowed,
        }
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

impl Endpoint for Router {
    fn call(&self, req: Request) -> BoxFuture {
        match self.lookup(req.method(), req.path()) {
            Lookup::Found(handler) => handler.call(req),
            Lookup::MethodNotAllowed => Box::pin(async { method_not_allowed() }),
            Lookup::NotFound => Box::pin(async {
                Response::builder()
                    .status(Status::NotFound)
                    .text("404 page not found")
            }),
        }
    }
}

/// Plain-text 405, shared by the router and endpoints that switch on method.
pub fn method_not_allowed() -> Response {
    Response::builder()
        .status(Status::MethodNotAllowed)
        .text("Method not allowed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::from_fn;

    fn router() -> Router {
        Router::new()
            .route("/items", MethodRouter::new()
                .on(Method::Get, from_fn(|_req: Request| async { "list" }))
                .on(Method::Post, from_fn(|_req: Request| async { Status::Created })))
            .route("/items/{*rest}", any(from_fn(|req: Request| async move {
                req.method().to_string()
            })))
    }

    async fn call(router: &Router, method: Method, path: &str) -> Response {
        router.call(Request::builder(method, path).build()).await
    }

    #[tokio::test]
    async fn dispatches_by_method() {
        let router = router();
        assert_eq!(call(&router, Method::Get, "/items").await.body(), b"list");
        assert_eq!(call(&router, Method::Post, "/items").await.status_code(), 201);
    }

    #[tokio::test]
    async fn unregistered_method_is_405() {
        let res = call(&router(), Method::Patch, "/items").await;
        assert_eq!(res.status_code(), 405);
        assert_eq!(res.body(), b"Method not allowed");
    }

    #[tokio::test]
    async fn catch_all_sees_every_method() {
        let res = call(&router(), Method::Patch, "/items/7").await;
        assert_eq!(res.status_code(), 200);
        assert_eq!(res.body(), b"PATCH");
    }

    #[tokio::test]
    async fn unknown_path_is_404() {
        let res = call(&router(), Method::Get, "/nope").await;
        assert_eq!(res.status_code(), 404);
    }

    #[test]
    #[should_panic(expected = "invalid route")]
    fn conflicting_route_panics() {
        let _ = router().route("/items", MethodRouter::new());
    }
}
