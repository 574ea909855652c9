//! The blog post entity and the request payloads that create and change it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::codec::{Problems, Validator};
use crate::context::Context;

pub const MAX_TITLE_CHARS: usize = 100;
pub const MAX_CONTENT_CHARS: usize = 5000;
pub const MAX_AUTHOR_CHARS: usize = 50;

/// A stored blog post.
///
/// Text fields are always held trimmed, and `created_at <= updated_at`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Blog {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Blog {
    /// Builds a new post from a create request: fresh id, trimmed fields, and
    /// both timestamps set to the same instant.
    pub fn new(req: CreateBlogRequest) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title: req.title.trim().to_owned(),
            content: req.content.trim().to_owned(),
            author: req.author.trim().to_owned(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrites each field present in `req` with its trimmed value.
    ///
    /// `updated_at` is refreshed even when `req` carries no fields.
    pub fn apply(&mut self, req: UpdateBlogRequest) {
        if let Some(title) = req.title {
            self.title = title.trim().to_owned();
        }
        if let Some(content) = req.content {
            self.content = content.trim().to_owned();
        }
        // Never step behind creation if the wall clock moved backwards.
        self.updated_at = Utc::now().max(self.created_at);
    }
}

/// Payload of `POST /api/v1/blogs`. Missing fields decode as empty and are
/// reported by validation.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateBlogRequest {
    pub title: String,
    pub content: String,
    pub author: String,
}

impl Validator for CreateBlogRequest {
    fn valid(&self, _ctx: &Context) -> Problems {
        let mut problems = Problems::new();
        check_required(&mut problems, "title", &self.title, MAX_TITLE_CHARS);
        check_required(&mut problems, "content", &self.content, MAX_CONTENT_CHARS);
        check_required(&mut problems, "author", &self.author, MAX_AUTHOR_CHARS);
        problems
    }
}

/// Payload of `PUT /api/v1/blogs/{id}`. An absent (or `null`) field is left
/// unchanged.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UpdateBlogRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Validator for UpdateBlogRequest {
    fn valid(&self, _ctx: &Context) -> Problems {
        let mut problems = Problems::new();
        if let Some(title) = &self.title {
            check_present(&mut problems, "title", title, MAX_TITLE_CHARS);
        }
        if let Some(content) = &self.content {
            check_present(&mut problems, "content", content, MAX_CONTENT_CHARS);
        }
        problems
    }
}

fn check_required(problems: &mut Problems, field: &str, value: &str, max: usize) {
    let value = value.trim();
    if value.is_empty() {
        problems.insert(field.to_owned(), format!("{field} is required"));
    } else if value.chars().count() > max {
        problems.insert(field.to_owned(), format!("{field} must be at most {max} characters"));
    }
}

fn check_present(problems: &mut Problems, field: &str, value: &str, max: usize) {
    let value = value.trim();
    if value.is_empty() {
        problems.insert(field.to_owned(), format!("{field} cannot be empty"));
    } else if value.chars().count() > max {
        problems.insert(field.to_owned(), format!("{field} must be at most {max} characters"));
    }
}
