//! The blog HTTP API: route table and composed application handler.
//!
//! | Method | Path | Endpoint |
//! |---|---|---|
//! | any | `/healthz`, `/readyz` | [`health::health`] |
//! | GET / POST | `/api/v1/blogs` | [`ListBlogs`] / [`CreateBlog`] |
//! | GET / PUT / DELETE | `/api/v1/blogs/{id}` | [`BlogById`] |

mod blogs;
mod error;
pub mod health;

use std::sync::Arc;

pub use blogs::{BLOG_PREFIX, BLOGS_PATH, BlogById, CreateBlog, ListBlogs};
pub use error::{ApiError, ErrorResponse};

use crate::handler::{BoxedHandler, from_fn};
use crate::method::Method;
use crate::middleware::{Chain, Cors, Logging, RateLimit, Recover};
use crate::router::{MethodRouter, Router, any};
use crate::store::BlogStore;

/// Registers every endpoint on a new [`Router`].
pub fn routes(store: Arc<dyn BlogStore>) -> Router {
    Router::new()
        .route("/healthz", any(from_fn(health::health)))
        .route("/readyz", any(from_fn(health::health)))
        .route(
            BLOGS_PATH,
            MethodRouter::new()
                .on(Method::Get, ListBlogs::new(Arc::clone(&store)))
                .on(Method::Post, CreateBlog::new(Arc::clone(&store))),
        )
        // The catch-all does not match an empty remainder, so the bare
        // prefix is routed separately and rejected by `BlogById`.
        .route(BLOG_PREFIX, any(BlogById::new(Arc::clone(&store))))
        .route(&format!("{BLOG_PREFIX}{{*id}}"), any(BlogById::new(store)))
}

/// The full application: routes wrapped in logging, panic recovery, rate
/// limiting and CORS, outermost first.
pub fn app(store: Arc<dyn BlogStore>) -> BoxedHandler {
    Chain::new()
        .with(Logging)
        .with(Recover)
        .with(RateLimit::unlimited())
        .with(Cors)
        .around(routes(store))
}
