//! Request and response envelopes.
//!
//! These describe an outbound call independently of the HTTP stack that
//! eventually carries it. The coordinator reads and writes exactly three
//! things on a request (the path, the headers, and two routing markers)
//! and exactly one thing on a response (the status), so the envelopes stay
//! deliberately small.

use std::collections::BTreeMap;
use std::fmt;

use crate::endpoints;
use crate::headers;

// ---------------------------------------------------------------------------
// Method
// ---------------------------------------------------------------------------

/// HTTP-style request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// StatusCode
// ---------------------------------------------------------------------------

/// A response status code.
///
/// Newtype over `u16` so a status can't be confused with any other number
/// flowing through the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(pub u16);

impl StatusCode {
    pub const OK: Self = Self(200);
    pub const NO_CONTENT: Self = Self(204);
    pub const UNAUTHORIZED: Self = Self(401);
    pub const FORBIDDEN: Self = Self(403);
    pub const INTERNAL_SERVER_ERROR: Self = Self(500);

    /// `true` for any 2xx status.
    pub fn is_success(self) -> bool {
        (200..300).contains(&self.0)
    }

    /// `true` for 401, the refreshable auth failure.
    pub fn is_unauthorized(self) -> bool {
        self == Self::UNAUTHORIZED
    }

    /// `true` for 403, the hard block.
    pub fn is_forbidden(self) -> bool {
        self == Self::FORBIDDEN
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// An outbound request.
///
/// Header names are stored lowercase so lookups are case-insensitive no
/// matter how the caller spelled them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Request {
    /// Request method.
    pub method: Method,

    /// Path relative to the backend's base URL, e.g. `/auth/check`.
    pub path: String,

    /// Header map with lowercase names.
    pub headers: BTreeMap<String, String>,

    /// Optional raw body.
    pub body: Option<Vec<u8>>,

    /// Set once the request has been resubmitted after a refresh.
    /// A request carrying this marker is never retried again.
    pub retried: bool,

    /// A 401 on a request with this marker is surfaced as-is instead of
    /// triggering a refresh.
    pub skip_refresh: bool,
}

impl Request {
    /// Creates a request with the given method and path.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            ..Self::default()
        }
    }

    /// Shorthand for a `GET` request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    /// Shorthand for a `POST` request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    /// Builder-style header setter.
    pub fn with_header(
        mut self,
        name: &str,
        value: impl Into<String>,
    ) -> Self {
        self.set_header(name, value);
        self
    }

    /// Builder-style body setter.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Marks the request so a 401 on it never enters the refresh path.
    pub fn skipping_refresh(mut self) -> Self {
        self.skip_refresh = true;
        self
    }

    /// Inserts or replaces a header.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
    }

    /// Looks up a header by name, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Sets `Authorization: Bearer <token>`.
    pub fn set_bearer(&mut self, token: &str) {
        self.set_header(headers::AUTHORIZATION, format!("Bearer {token}"));
    }

    /// Returns the bearer token attached to this request, if any.
    pub fn bearer(&self) -> Option<&str> {
        self.header(headers::AUTHORIZATION)?.strip_prefix("Bearer ")
    }

    /// `true` if this request targets the refresh endpoint itself. A query
    /// string or fragment on the path does not change the answer.
    pub fn is_refresh_call(&self) -> bool {
        let path = self.path.split(['?', '#']).next().unwrap_or_default();
        path == endpoints::ACCESS
    }
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

/// A response to an outbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Response status.
    pub status: StatusCode,

    /// Raw body (may be empty).
    pub body: Vec<u8>,
}

impl Response {
    /// Creates a response with an empty body.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            body: Vec::new(),
        }
    }

    /// Shorthand for an empty `200 OK`.
    pub fn ok() -> Self {
        Self::new(StatusCode::OK)
    }

    /// Builder-style body setter.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }
}
