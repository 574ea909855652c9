//! HTTP method as a typed enum.
//!
//! Covers the RFC 9110 standard methods. Any other valid method token (e.g.
//! `PROPFIND`) is carried as [`Method::Other`] and still passes through the
//! middleware chain, so it is logged and routed like any request; endpoints
//! that do not handle it answer `405 Method Not Allowed`.

use std::fmt;
use std::str::FromStr;

/// An HTTP request method.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Method {
    Connect,
    Delete,
    Get,
    Head,
    Options,
    Patch,
    Post,
    Put,
    Trace,
    /// An extension method, kept verbatim.
    Other(Box<str>),
}

impl Method {
    /// Returns the wire representation (e.g. `"GET"`).
    pub fn as_str(&self) -> &str {
        match self {
            Self::Connect  => "CONNECT",
            Self::Delete   => "DELETE",
            Self::Get      => "GET",
            Self::Head     => "HEAD",
            Self::Options  => "OPTIONS",
            Self::Patch    => "PATCH",
            Self::Post     => "POST",
            Self::Put      => "PUT",
            Self::Trace    => "TRACE",
            Self::Other(s) => s,
        }
    }
}

/// Parses a method token. Case-sensitive per RFC 9110 §9.1, so `"get"` is an
/// extension method, not `GET`. Fails only on an empty string or one with
/// characters outside the token alphabet.
impl FromStr for Method {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "CONNECT" => Self::Connect,
            "DELETE"  => Self::Delete,
            "GET"     => Self::Get,
            "HEAD"    => Self::Head,
            "OPTIONS" => Self::Options,
            "PATCH"   => Self::Patch,
            "POST"    => Self::Post,
            "PUT"     => Self::Put,
            "TRACE"   => Self::Trace,
            other if is_token(other) => Self::Other(other.into()),
            _ => return Err(()),
        })
    }
}

/// hyper has already validated the token, so every method maps.
impl From<&http::Method> for Method {
    fn from(method: &http::Method) -> Self {
        method
            .as_str()
            .parse()
            .unwrap_or_else(|()| Self::Other(method.as_str().into()))
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// RFC 9110 §5.6.2 tchar.
fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes().all(|b| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b))
}
