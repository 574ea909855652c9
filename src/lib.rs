//! # quill
//!
//! A small blog service: posts with a title, content and author, kept in
//! memory and served as JSON over HTTP.
//!
//! ## Endpoints
//!
//! | Method | Path | Result |
//! |---|---|---|
//! | `POST` | `/api/v1/blogs` | `201` with the created post |
//! | `GET` | `/api/v1/blogs[?author=…]` | `200` with every (matching) post |
//! | `GET` | `/api/v1/blogs/{id}` | `200` with the post, or `404` |
//! | `PUT` | `/api/v1/blogs/{id}` | `200` with the updated post |
//! | `DELETE` | `/api/v1/blogs/{id}` | `204`, or `404` |
//! | any | `/healthz`, `/readyz` | `200 {"status":"ok"}` |
//!
//! Errors come back as `{"error": "…"}`; failed validation adds a
//! `problems` object mapping each field to what is wrong with it.
//!
//! ## Layout
//!
//! - [`store`]: the [`BlogStore`] contract and its in-memory implementation
//! - [`codec`]: JSON encoding, decoding and validation
//! - [`api`]: the endpoints, the route table and the composed app
//! - [`middleware`]: logging, panic recovery, rate limiting and CORS
//! - [`Server`]: hyper connection handling and graceful shutdown
//!
//! ## Running in-process
//!
//! ```rust
//! use std::sync::Arc;
//! use quill::{Method, MemoryBlogStore, Request};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let app = quill::api::app(Arc::new(MemoryBlogStore::new()));
//!
//! let res = app.call(Request::builder(Method::Get, "/healthz").build()).await;
//! assert_eq!(res.status_code(), 200);
//! # }
//! ```

pub mod api;
pub mod blog;
pub mod codec;
pub mod config;
pub mod logger;
pub mod middleware;
pub mod router;
pub mod server;
pub mod store;

mod context;
mod error;
mod handler;
mod method;
mod request;
mod response;
mod status;

pub use crate::blog::Blog;
pub use crate::config::Config;
pub use crate::context::Context;
pub use crate::error::Error;
pub use crate::handler::{BoxFuture, BoxedHandler, Endpoint, FnHandler, boxed, from_fn};
pub use crate::method::Method;
pub use crate::middleware::{Chain, Middleware};
pub use crate::request::{Request, RequestBuilder};
pub use crate::response::{IntoResponse, Response, ResponseBuilder};
pub use crate::router::Router;
pub use crate::server::Server;
pub use crate::status::Status;
pub use crate::store::{BlogStore, MemoryBlogStore, StoreError};
