//! Blog persistence.
//!
//! Handlers depend on the [`BlogStore`] trait only. [`MemoryBlogStore`] is the
//! one implementation: a map behind a single reader/writer lock.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use crate::blog::Blog;
use crate::context::Context;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("blog not found")]
    NotFound,

    /// A writer panicked while holding the lock; the map may be inconsistent.
    #[error("store lock poisoned")]
    Poisoned,

    /// The request was cancelled before a scan started.
    #[error("request cancelled")]
    Cancelled,
}

impl<T> From<PoisonError<T>> for StoreError {
    fn from(_: PoisonError<T>) -> Self {
        Self::Poisoned
    }
}

/// Storage operations for blog posts.
///
/// Every read hands back owned values, so nothing a caller does to a result
/// can reach the stored copy.
#[async_trait]
pub trait BlogStore: Send + Sync {
    /// Inserts `blog`, replacing any post with the same id.
    async fn create(&self, ctx: &Context, blog: Blog) -> Result<(), StoreError>;

    async fn get_by_id(&self, ctx: &Context, id: &str) -> Result<Blog, StoreError>;

    /// Every post, in no particular order.
    async fn get_all(&self, ctx: &Context) -> Result<Vec<Blog>, StoreError>;

    /// Posts whose author equals `author` exactly (case-sensitive).
    async fn get_by_author(&self, ctx: &Context, author: &str) -> Result<Vec<Blog>, StoreError>;

    /// Replaces the post stored under `id` with `blog` as given.
    async fn update(&self, ctx: &Context, id: &str, blog: Blog) -> Result<(), StoreError>;

    async fn delete(&self, ctx: &Context, id: &str) -> Result<(), StoreError>;
}

/// In-memory [`BlogStore`].
///
/// Readers share the lock; a writer holds it alone. Locks are held only for
/// the map access and the clone, never across an `.await`. Scans refuse to
/// start for a cancelled context.
#[derive(Debug, Default)]
pub struct MemoryBlogStore {
    blogs: RwLock<HashMap<String, Blog>>,
}

impl MemoryBlogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlogStore for MemoryBlogStore {
    async fn create(&self, _ctx: &Context, blog: Blog) -> Result<(), StoreError> {
        let mut blogs = self.blogs.write()?;
        blogs.insert(blog.id.clone(), blog);
        Ok(())
    }

    async fn get_by_id(&self, _ctx: &Context, id: &str) -> Result<Blog, StoreError> {
        let blogs = self.blogs.read()?;
        blogs.get(id).cloned().ok_or(StoreError::NotFound)
    }

    async fn get_all(&self, ctx: &Context) -> Result<Vec<Blog>, StoreError> {
        if ctx.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        let blogs = self.blogs.read()?;
        Ok(blogs.values().cloned().collect())
    }

    async fn get_by_author(&self, ctx: &Context, author: &str) -> Result<Vec<Blog>, StoreError> {
        if ctx.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        let blogs = self.blogs.read()?;
        Ok(blogs.values().filter(|b| b.author == author).cloned().collect())
    }

    async fn update(&self, _ctx: &Context, id: &str, blog: Blog) -> Result<(), StoreError> {
        let mut blogs = self.blogs.write()?;
        let slot = blogs.get_mut(id).ok_or(StoreError::NotFound)?;
        *slot = blog;
        Ok(())
    }

    async fn delete(&self, _ctx: &Context, id: &str) -> Result<(), StoreError> {
        let mut blogs = self.blogs.write()?;
        blogs.remove(id).map(|_| ()).ok_or(StoreError::NotFound)
    }
}
