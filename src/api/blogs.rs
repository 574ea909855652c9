//! Blog endpoints.
//!
//! Each endpoint is a small struct that owns its store handle and implements
//! [`Endpoint`]; the request logic lives in a plain async function returning
//! `Result<Response, ApiError>`.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info};

use super::{ApiError, ErrorResponse};
use crate::blog::{Blog, CreateBlogRequest, UpdateBlogRequest};
use crate::codec::{self, decode_valid};
use crate::handler::{BoxFuture, Endpoint};
use crate::method::Method;
use crate::request::Request;
use crate::response::{IntoResponse, Response};
use crate::status::Status;
use crate::store::BlogStore;

/// Collection path.
pub const BLOGS_PATH: &str = "/api/v1/blogs";

/// Prefix of item paths; the remainder is the blog id.
pub const BLOG_PREFIX: &str = "/api/v1/blogs/";

/// `POST /api/v1/blogs`
pub struct CreateBlog {
    store: Arc<dyn BlogStore>,
}

impl CreateBlog {
    pub fn new(store: Arc<dyn BlogStore>) -> Self {
        Self { store }
    }
}

impl Endpoint for CreateBlog {
    fn call(&self, req: Request) -> BoxFuture {
        let store = Arc::clone(&self.store);
        Box::pin(async move { create(store.as_ref(), req).await.into_response() })
    }
}

/// `GET /api/v1/blogs[?author=…]`
pub struct ListBlogs {
    store: Arc<dyn BlogStore>,
}

impl ListBlogs {
    pub fn new(store: Arc<dyn BlogStore>) -> Self {
        Self { store }
    }
}

impl Endpoint for ListBlogs {
    fn call(&self, req: Request) -> BoxFuture {
        let store = Arc::clone(&self.store);
        Box::pin(async move { list(store.as_ref(), req).await.into_response() })
    }
}

/// `GET`, `PUT` and `DELETE` on `/api/v1/blogs/{id}`.
///
/// The id is everything after [`BLOG_PREFIX`]; an empty id or one containing
/// `/` is rejected before the method is considered.
pub struct BlogById {
    store: Arc<dyn BlogStore>,
}

impl BlogById {
    pub fn new(store: Arc<dyn BlogStore>) -> Self {
        Self { store }
    }
}

impl Endpoint for BlogById {
    fn call(&self, req: Request) -> BoxFuture {
        let store = Arc::clone(&self.store);
        Box::pin(async move { by_id(store.as_ref(), req).await.into_response() })
    }
}

async fn create(store: &dyn BlogStore, req: Request) -> Result<Response, ApiError> {
    if *req.method() != Method::Post {
        return Err(ApiError::MethodNotAllowed);
    }
    let ctx = req.context();

    let payload: CreateBlogRequest = decode_valid(ctx, req.body())?;
    let blog = Blog::new(payload);
    store
        .create(ctx, blog.clone())
        .await
        .map_err(ApiError::store("Failed to create blog"))?;

    info!(id = %blog.id, title = %blog.title, "blog created");
    Ok(respond(Status::Created, &blog))
}

async fn list(store: &dyn BlogStore, req: Request) -> Result<Response, ApiError> {
    if *req.method() != Method::Get {
        return Err(ApiError::MethodNotAllowed);
    }
    let ctx = req.context();

    let blogs = match req.query_param("author").filter(|a| !a.is_empty()) {
        Some(author) => store.get_by_author(ctx, &author).await,
        None => store.get_all(ctx).await,
    }
    .map_err(ApiError::store("Failed to retrieve blogs"))?;

    Ok(respond(Status::Ok, &blogs))
}

async fn by_id(store: &dyn BlogStore, req: Request) -> Result<Response, ApiError> {
    let id = blog_id(req.path()).ok_or(ApiError::InvalidId)?;

    match req.method() {
        Method::Get => get(store, &req, id).await,
        Method::Put => update(store, &req, id).await,
        Method::Delete => delete(store, &req, id).await,
        _ => Err(ApiError::MethodNotAllowed),
    }
}

async fn get(store: &dyn BlogStore, req: &Request, id: &str) -> Result<Response, ApiError> {
    let blog = store
        .get_by_id(req.context(), id)
        .await
        .map_err(ApiError::store("Failed to retrieve blog"))?;
    Ok(respond(Status::Ok, &blog))
}

/// Read-modify-write: the stored post is fetched, the partial update applied
/// to that copy, and the whole post written back.
async fn update(store: &dyn BlogStore, req: &Request, id: &str) -> Result<Response, ApiError> {
    let ctx = req.context();

    let mut blog = store
        .get_by_id(ctx, id)
        .await
        .map_err(ApiError::store("Failed to retrieve blog"))?;
    let changes: UpdateBlogRequest = decode_valid(ctx, req.body())?;
    blog.apply(changes);
    store
        .update(ctx, id, blog.clone())
        .await
        .map_err(ApiError::store("Failed to update blog"))?;

    info!(id, "blog updated");
    Ok(respond(Status::Ok, &blog))
}

async fn delete(store: &dyn BlogStore, req: &Request, id: &str) -> Result<Response, ApiError> {
    store
        .delete(req.context(), id)
        .await
        .map_err(ApiError::store("Failed to delete blog"))?;

    info!(id, "blog deleted");
    Ok(Response::status(Status::NoContent))
}

/// Extracts a flat blog id from an item path.
fn blog_id(path: &str) -> Option<&str> {
    let id = path.strip_prefix(BLOG_PREFIX)?;
    (!id.is_empty() && !id.contains('/')).then_some(id)
}

/// Encodes a success body, falling back to a 500 envelope if that fails.
fn respond<T: Serialize + ?Sized>(status: Status, value: &T) -> Response {
    codec::encode(status, value).unwrap_or_else(|e| {
        error!(error = %e, "failed to encode response");
        ErrorResponse::new("Internal server error").respond(Status::InternalServerError)
    })
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::context::Context;
    use crate::store::{MemoryBlogStore, StoreError};

    /// A store whose every operation fails as if its lock were poisoned.
    struct BrokenStore;

    #[async_trait]
    impl BlogStore for BrokenStore {
        async fn create(&self, _: &Context, _: Blog) -> Result<(), StoreError> {
            Err(StoreError::Poisoned)
        }
        async fn get_by_id(&self, _: &Context, _: &str) -> Result<Blog, StoreError> {
            Err(StoreError::Poisoned)
        }
        async fn get_all(&self, _: &Context) -> Result<Vec<Blog>, StoreError> {
            Err(StoreError::Poisoned)
        }
        async fn get_by_author(&self, _: &Context, _: &str) -> Result<Vec<Blog>, StoreError> {
            Err(StoreError::Poisoned)
        }
        async fn update(&self, _: &Context, _: &str, _: Blog) -> Result<(), StoreError> {
            Err(StoreError::Poisoned)
        }
        async fn delete(&self, _: &Context, _: &str) -> Result<(), StoreError> {
            Err(StoreError::Poisoned)
        }
    }

    fn request(method: Method, target: &str, body: &str) -> Request {
        Request::builder(method, target).body(body.to_owned()).build()
    }

    fn error_of(res: &Response) -> String {
        let body: ErrorResponse = serde_json::from_slice(res.body()).unwrap();
        body.error
    }

    #[test]
    fn blog_id_shapes() {
        assert_eq!(blog_id("/api/v1/blogs/abc"), Some("abc"));
        assert_eq!(blog_id("/api/v1/blogs/"), None);
        assert_eq!(blog_id("/api/v1/blogs/a/b"), None);
        assert_eq!(blog_id("/api/v1/blogs/abc/"), None);
    }

    #[tokio::test]
    async fn create_rejects_wrong_method() {
        let endpoint = CreateBlog::new(Arc::new(MemoryBlogStore::new()));
        let res = endpoint.call(request(Method::Get, BLOGS_PATH, "")).await;
        assert_eq!(res.status_code(), 405);
    }

    #[tokio::test]
    async fn create_reports_bad_json() {
        let store = Arc::new(MemoryBlogStore::new());
        let endpoint = CreateBlog::new(store.clone());
        let res = endpoint.call(request(Method::Post, BLOGS_PATH, "invalid json")).await;
        assert_eq!(res.status_code(), 400);
        assert_eq!(error_of(&res), "Invalid request body");
        assert!(store.get_all(&Context::background()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_with_missing_fields_fails_validation() {
        let endpoint = CreateBlog::new(Arc::new(MemoryBlogStore::new()));
        let res = endpoint.call(request(Method::Post, BLOGS_PATH, "{}")).await;
        assert_eq!(res.status_code(), 400);
        let body: ErrorResponse = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body.error, "Validation failed");
        assert_eq!(body.problems.len(), 3);
    }

    #[tokio::test]
    async fn list_rejects_wrong_method() {
        let endpoint = ListBlogs::new(Arc::new(MemoryBlogStore::new()));
        let res = endpoint.call(request(Method::Put, BLOGS_PATH, "")).await;
        assert_eq!(res.status_code(), 405);
    }

    #[tokio::test]
    async fn by_id_checks_id_before_method() {
        let endpoint = BlogById::new(Arc::new(MemoryBlogStore::new()));
        let res = endpoint.call(request(Method::Patch, "/api/v1/blogs/", "")).await;
        assert_eq!(res.status_code(), 400);
        assert_eq!(error_of(&res), "Invalid blog ID");

        let res = endpoint.call(request(Method::Patch, "/api/v1/blogs/x", "")).await;
        assert_eq!(res.status_code(), 405);
    }

    #[tokio::test]
    async fn update_looks_up_before_decoding() {
        let endpoint = BlogById::new(Arc::new(MemoryBlogStore::new()));
        let res = endpoint.call(request(Method::Put, "/api/v1/blogs/missing", "not json")).await;
        assert_eq!(res.status_code(), 404);
        assert_eq!(error_of(&res), "Blog not found");
    }

    #[tokio::test]
    async fn list_for_cancelled_request_is_500() {
        let token = tokio_util::sync::CancellationToken::new();
        token.cancel();
        let req = Request::builder(Method::Get, "/api/v1/blogs?author=ann")
            .context(Context::new(token))
            .build();

        let res = ListBlogs::new(Arc::new(MemoryBlogStore::new())).call(req).await;
        assert_eq!(res.status_code(), 500);
        assert_eq!(error_of(&res), "Failed to retrieve blogs");
    }

    #[tokio::test]
    async fn store_failures_are_500_without_detail() {
        let store: Arc<dyn BlogStore> = Arc::new(BrokenStore);
        let cases = [
            (
                CreateBlog::new(store.clone()).call(request(
                    Method::Post,
                    BLOGS_PATH,
                    r#"{"title":"T","content":"C","author":"A"}"#,
                )),
                "Failed to create blog",
            ),
            (
                ListBlogs::new(store.clone()).call(request(Method::Get, BLOGS_PATH, "")),
                "Failed to retrieve blogs",
            ),
            (
                BlogById::new(store.clone()).call(request(Method::Get, "/api/v1/blogs/1", "")),
                "Failed to retrieve blog",
            ),
            (
                BlogById::new(store.clone()).call(request(Method::Put, "/api/v1/blogs/1", "{}")),
                "Failed to retrieve blog",
            ),
            (
                BlogById::new(store.clone()).call(request(Method::Delete, "/api/v1/blogs/1", "")),
                "Failed to delete blog",
            ),
        ];

        for (fut, message) in cases {
            let res = fut.await;
            assert_eq!(res.status_code(), 500);
            assert_eq!(error_of(&res), message);
        }
    }
}
