use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use futures::FutureExt;
use tracing::error;

use super::Middleware;
use crate::api::ErrorResponse;
use crate::handler::{BoxFuture, BoxedHandler, Endpoint};
use crate::method::Method;
use crate::request::Request;
use crate::response::Response;
use crate::status::Status;

/// Turns a panic anywhere below it into a 500 `{"error":"Internal server error"}`.
///
/// The panic message is logged with the method and path; it never reaches
/// the client.
pub struct Recover;

impl Middleware for Recover {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        Arc::new(Recovered { next })
    }
}

struct Recovered {
    next: BoxedHandler,
}

impl Endpoint for Recovered {
    fn call(&self, req: Request) -> BoxFuture {
        guarded(&self.next, req)
    }
}

/// Calls `next`, answering any panic it raises with the 500 envelope.
///
/// Middleware that decorates responses on the way out uses this too, so a
/// panic below it still gets a decorated response.
pub(super) fn guarded(next: &BoxedHandler, req: Request) -> BoxFuture {
    let method = req.method().clone();
    let path = req.path().to_owned();

    // A panic can surface while the inner future is built or while it is polled.
    let fut = match catch_unwind(AssertUnwindSafe(|| next.call(req))) {
        Ok(fut) => fut,
        Err(payload) => {
            log_panic(&*payload, &method, &path);
            return Box::pin(async { internal_error() });
        }
    };

    Box::pin(async move {
        match AssertUnwindSafe(fut).catch_unwind().await {
            Ok(res) => res,
            Err(payload) => {
                log_panic(&*payload, &method, &path);
                internal_error()
            }
        }
    })
}

fn log_panic(payload: &(dyn Any + Send), method: &Method, path: &str) {
    let message = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload");
    error!(error = %message, method = %method, path = %path, "panic recovered");
}

fn internal_error() -> Response {
    ErrorResponse::new("Internal server error").respond(Status::InternalServerError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{boxed, from_fn};
    use crate::response::IntoResponse;

    async fn body_of(endpoint: BoxedHandler) -> (u16, serde_json::Value) {
        let res = endpoint.call(Request::builder(Method::Get, "/boom").build()).await;
        (res.status_code(), serde_json::from_slice(res.body()).unwrap())
    }

    #[tokio::test]
    async fn panic_while_polling_becomes_500() {
        let app = Recover.wrap(boxed(from_fn(|_req: Request| async {
            if true {
                panic!("secret detail");
            }
            Status::Ok.into_response()
        })));

        let (status, body) = body_of(app).await;
        assert_eq!(status, 500);
        assert_eq!(body, serde_json::json!({"error": "Internal server error"}));
    }

    #[tokio::test]
    async fn panic_while_building_future_becomes_500() {
        let app = Recover.wrap(boxed(from_fn(|_req: Request| -> std::future::Ready<Response> {
            panic!("{}", String::from("owned secret"))
        })));

        let (status, body) = body_of(app).await;
        assert_eq!(status, 500);
        assert!(!body.to_string().contains("secret"));
    }

    #[tokio::test]
    async fn passes_normal_responses_through() {
        let app = Recover.wrap(boxed(from_fn(|_req: Request| async {
            Status::Created
        })));
        let res = app.call(Request::builder(Method::Get, "/").build()).await;
        assert_eq!(res.status_code(), 201);
    }
}
