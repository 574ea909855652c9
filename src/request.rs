//! Incoming HTTP request type.

use std::net::SocketAddr;

use bytes::Bytes;
use percent_encoding::percent_decode_str;

use crate::context::Context;
use crate::method::Method;

/// An incoming HTTP request with its body fully read.
pub struct Request {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) query: Option<String>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Bytes,
    pub(crate) remote_addr: Option<SocketAddr>,
    pub(crate) context: Context,
}

impl Request {
    /// Converts the parts hyper hands the server. Header values that are not
    /// visible ASCII are dropped.
    pub(crate) fn from_parts(
        method: Method,
        uri: &http::Uri,
        headers: &http::HeaderMap,
        body: Bytes,
        remote_addr: SocketAddr,
        context: Context,
    ) -> Self {
        let headers = headers
            .iter()
            .filter_map(|(k, v)| Some((k.as_str().to_owned(), v.to_str().ok()?.to_owned())))
            .collect();
        Self {
            method,
            path: decode_path(uri.path()),
            query: uri.query().map(str::to_owned),
            headers,
            body,
            remote_addr: Some(remote_addr),
            context,
        }
    }

    /// Builds a request without a connection, e.g. to drive a handler in tests.
    ///
    /// ```rust
    /// use quill::{Method, Request};
    ///
    /// let req = Request::builder(Method::Get, "/api/v1/blogs?author=ann")
    ///     .header("user-agent", "curl/8")
    ///     .build();
    /// assert_eq!(req.query_param("author").as_deref(), Some("ann"));
    /// ```
    pub fn builder(method: Method, target: &str) -> RequestBuilder {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (decode_path(path), Some(query.to_owned())),
            None => (decode_path(target), None),
        };
        RequestBuilder {
            inner: Request {
                method,
                path,
                query,
                headers: Vec::new(),
                body: Bytes::new(),
                remote_addr: None,
                context: Context::background(),
            },
        }
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn body(&self) -> &[u8] { &self.body }
    pub fn remote_addr(&self) -> Option<SocketAddr> { self.remote_addr }
    pub fn context(&self) -> &Context { &self.context }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// First value of a query-string parameter, percent-decoded.
    ///
    /// A query string that does not decode yields `None` for every key.
    pub fn query_param(&self, key: &str) -> Option<String> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(self.query.as_deref()?).ok()?;
        pairs.into_iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

/// Percent-decodes a request path so routing and id extraction see `%2F` as
/// `/`. Escapes that do not form UTF-8 are replaced rather than rejected.
fn decode_path(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

/// Fluent builder for [`Request`]. Obtain via [`Request::builder`].
pub struct RequestBuilder {
    inner: Request,
}

impl RequestBuilder {
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.inner.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.inner.body = body.into();
        self
    }

    pub fn context(mut self, context: Context) -> Self {
        self.inner.context = context;
        self
    }

    pub fn build(self) -> Request {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_param_decodes_and_takes_first() {
        let req = Request::builder(Method::Get, "/x?author=Ann%20Lee&author=Bob&tag=a+b").build();
        assert_eq!(req.path(), "/x");
        assert_eq!(req.query_param("author").as_deref(), Some("Ann Lee"));
        assert_eq!(req.query_param("tag").as_deref(), Some("a b"));
        assert_eq!(req.query_param("missing"), None);
    }

    #[test]
    fn header_lookup_ignores_case() {
        let req = Request::builder(Method::Post, "/")
            .header("Content-Type", "application/json")
            .build();
        assert_eq!(req.header("content-type"), Some("application/json"));
    }

    #[test]
    fn path_is_percent_decoded() {
        let req = Request::builder(Method::Get, "/api/v1/blogs/a%2Fb?author=x%2Fy").build();
        assert_eq!(req.path(), "/api/v1/blogs/a/b");
        assert_eq!(req.query_param("author").as_deref(), Some("x/y"));

        let uri: http::Uri = "/posts/caf%C3%A9".parse().unwrap();
        let req = Request::from_parts(
            Method::Get,
            &uri,
            &http::HeaderMap::new(),
            Bytes::new(),
            "127.0.0.1:9000".parse().unwrap(),
            Context::background(),
        );
        assert_eq!(req.path(), "/posts/café");
        assert_eq!(req.remote_addr(), Some("127.0.0.1:9000".parse().unwrap()));
    }
}
