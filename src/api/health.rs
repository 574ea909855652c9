//! Kubernetes health-check handler.
//!
//! | Probe | Path | Question |
//! |---|---|---|
//! | **Liveness** | `/healthz` | Is the process alive? Failure → restart. |
//! | **Readiness** | `/readyz` | Can the pod serve traffic? Failure → pulled from load-balancer. |
//!
//! The store lives in memory, so there is nothing to wait for: both probes
//! share one handler.

use std::collections::BTreeMap;

use tracing::error;

use crate::codec;
use crate::request::Request;
use crate::response::Response;
use crate::status::Status;

/// Always `200 OK` with `{"status":"ok"}`, whatever the method.
///
/// Encoding the body is best-effort: a failure is logged and the 200 stands.
pub async fn health(_req: Request) -> Response {
    let body = BTreeMap::from([("status", "ok")]);
    codec::encode(Status::Ok, &body).unwrap_or_else(|e| {
        error!(error = %e, "failed to encode health response");
        Response::status(Status::Ok)
    })
}
