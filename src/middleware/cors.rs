use std::sync::Arc;

use super::{Middleware, recover};
use crate::handler::{BoxFuture, BoxedHandler, Endpoint};
use crate::method::Method;
use crate::request::Request;
use crate::response::Response;
use crate::status::Status;

const ALLOW_ORIGIN: &str = "*";
const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type, Authorization";

/// Permissive CORS: any origin may call the API.
///
/// The allow headers go on every response, including the 500 for a panic
/// below this layer. `OPTIONS` preflights are answered here with an empty 200
/// and never reach the router.
pub struct Cors;

impl Middleware for Cors {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        Arc::new(WithCors { next })
    }
}

struct WithCors {
    next: BoxedHandler,
}

impl Endpoint for WithCors {
    fn call(&self, req: Request) -> BoxFuture {
        if *req.method() == Method::Options {
            return Box::pin(async { with_cors_headers(Response::status(Status::Ok)) });
        }
        let fut = recover::guarded(&self.next, req);
        Box::pin(async move { with_cors_headers(fut.await) })
    }
}

fn with_cors_headers(mut res: Response) -> Response {
    res.set_header("access-control-allow-origin", ALLOW_ORIGIN);
    res.set_header("access-control-allow-methods", ALLOW_METHODS);
    res.set_header("access-control-allow-headers", ALLOW_HEADERS);
    res
}
