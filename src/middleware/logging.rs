use std::sync::Arc;
use std::time::Instant;

use tracing::{Instrument, info, info_span};

use super::Middleware;
use crate::handler::{BoxFuture, BoxedHandler, Endpoint};
use crate::request::Request;

/// Emits one `request completed` event per request, inside a span that
/// carries the request id so events logged by handlers can be correlated.
///
/// The status is read from the finished [`Response`](crate::Response), which
/// is 200 unless the handler chose otherwise.
pub struct Logging;

impl Middleware for Logging {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        Arc::new(Logged { next })
    }
}

struct Logged {
    next: BoxedHandler,
}

impl Endpoint for Logged {
    fn call(&self, req: Request) -> BoxFuture {
        let start = Instant::now();
        let method = req.method().clone();
        let path = req.path().to_owned();
        let remote_addr = req.remote_addr().map(|a| a.to_string()).unwrap_or_default();
        let user_agent = req.header("user-agent").unwrap_or_default().to_owned();
        let span = info_span!("request", request_id = %req.context().request_id());

        let fut = {
            let _entered = span.enter();
            self.next.call(req)
        };

        Box::pin(
            async move {
                let res = fut.await;
                info!(
                    method = %method,
                    path = %path,
                    status = res.status_code(),
                    duration = ?start.elapsed(),
                    remote_addr = %remote_addr,
                    user_agent = %user_agent,
                    "request completed"
                );
                res
            }
            .instrument(span),
        )
    }
}
