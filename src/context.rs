//! Normalized request/response descriptor: the surface an engine must fill in.
//!
//! The core does not parse HTTP wire bytes and does not own a transport. Any
//! engine that can produce a [`Context`] per request (method, host, path,
//! headers, query/form values) and consume the [`Response`] afterwards can
//! drive [`Application::dispatch`](crate::Application::dispatch). Tests build
//! one directly with [`Context::new`].

use http::Method;
use serde_json::Value;
use smallvec::SmallVec;
use std::sync::Arc;

use crate::ids::RequestId;
use crate::router::ParamVec;

/// Header carrying an inbound correlation id across hops.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Maximum inline headers before heap allocation.
/// Most requests carry ≤16 headers, so the common case stays on the stack.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header storage for the hot path.
///
/// Header names use `Arc<str>` because they are heavily repeated
/// (Content-Type, Host, ...) and `Arc::clone` is an O(1) atomic increment;
/// values stay `String` since they are per-request data.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// The `(module, pattern)` pair a request resolved to.
///
/// Populated by the dispatcher after routing; `None` while the Pre-chain
/// runs, which is a documented contract: Pre middleware observes no route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    pub module: String,
    pub pattern: String,
}

/// Per-request state threaded through the middleware chain.
#[derive(Debug)]
pub struct Context {
    /// Unique request id for log correlation.
    pub request_id: RequestId,
    pub method: Method,
    /// URL scheme as reported by the engine (`http`, `https`, ...).
    pub scheme: String,
    /// Exact host the request was addressed to, including any port,
    /// verbatim as the engine saw it. Domain bindings compare against this
    /// by plain string equality.
    pub host: String,
    pub path: String,
    pub headers: HeaderVec,
    pub query_params: ParamVec,
    pub form_params: ParamVec,
    /// Path parameters bound by the router once a route matches; empty
    /// before resolution.
    pub path_params: ParamVec,
    pub response: Response,
    pub(crate) resolved: Option<ResolvedRoute>,
}

impl Context {
    pub fn new(method: Method, host: &str, path: &str) -> Self {
        Self {
            request_id: RequestId::new(),
            method,
            scheme: "http".to_string(),
            host: host.to_string(),
            path: path.to_string(),
            headers: HeaderVec::new(),
            query_params: ParamVec::new(),
            form_params: ParamVec::new(),
            path_params: ParamVec::new(),
            response: Response::default(),
            resolved: None,
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((Arc::from(name), value.to_string()));
        self
    }

    pub fn with_query_param(mut self, name: &str, value: &str) -> Self {
        self.query_params.push((Arc::from(name), value.to_string()));
        self
    }

    pub fn with_form_param(mut self, name: &str, value: &str) -> Self {
        self.form_params.push((Arc::from(name), value.to_string()));
        self
    }

    /// Adopt the correlation id from the [`REQUEST_ID_HEADER`] header, if
    /// present and parsable. Otherwise the generated id is kept, so every
    /// request ends up with a usable id either way. Engines call this after
    /// the headers are in place.
    #[must_use]
    pub fn correlate(mut self) -> Self {
        self.request_id = RequestId::from_header_or_new(self.header(REQUEST_ID_HEADER));
        self
    }

    /// Get a request header by name (case-insensitive per RFC 7230).
    #[inline]
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Get a path parameter by name.
    ///
    /// Uses "last write wins" semantics: with duplicate names at different
    /// path depths (`/org/:id/user/:id`), the deepest capture is returned.
    #[inline]
    #[must_use]
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a query parameter by name ("last write wins" for duplicates).
    #[inline]
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a form value by name ("last write wins" for duplicates).
    #[inline]
    #[must_use]
    pub fn form_param(&self, name: &str) -> Option<&str> {
        self.form_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// The route this request resolved to, if routing has happened and
    /// succeeded. Always `None` inside Pre middleware.
    #[must_use]
    pub fn resolved_route(&self) -> Option<&ResolvedRoute> {
        self.resolved.as_ref()
    }

    pub(crate) fn bind_route(&mut self, module: &str, pattern: &str, params: ParamVec) {
        self.path_params = params;
        self.resolved = Some(ResolvedRoute {
            module: module.to_string(),
            pattern: pattern.to_string(),
        });
    }
}

/// Writable response state owned by the [`Context`].
///
/// The core treats this as an opaque sink: handlers and middleware write
/// into it, the engine translates it to the transport once dispatch returns.
#[derive(Debug)]
pub struct Response {
    /// HTTP status code; starts at 200 and is overwritten by whichever link
    /// decides otherwise (the dispatcher itself only writes 404 on no-match).
    pub status: u16,
    pub headers: HeaderVec,
    pub body: Vec<u8>,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            status: 200,
            headers: HeaderVec::new(),
            body: Vec::new(),
        }
    }
}

impl Response {
    /// Append UTF-8 text to the body.
    pub fn write_str(&mut self, s: &str) {
        self.body.extend_from_slice(s.as_bytes());
    }

    /// Replace the body with a serialized JSON value and set the status and
    /// content type accordingly.
    pub fn json(&mut self, status: u16, body: &Value) -> anyhow::Result<()> {
        self.status = status;
        self.set_header("content-type", "application/json".to_string());
        self.body = serde_json::to_vec(body)?;
        Ok(())
    }

    /// Get a response header by name (case-insensitive).
    #[inline]
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or replace a header (case-insensitive on the name).
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }

    /// Body as text, lossily decoded. Mostly useful in tests.
    #[must_use]
    pub fn body_str(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_is_case_insensitive() {
        let ctx = Context::new(Method::GET, "example:80", "/").with_header("X-Trace", "abc");
        assert_eq!(ctx.header("x-trace"), Some("abc"));
        assert_eq!(ctx.header("missing"), None);
    }

    #[test]
    fn path_param_last_write_wins() {
        let mut ctx = Context::new(Method::GET, "example:80", "/org/1/user/2");
        let mut params = ParamVec::new();
        params.push((Arc::from("id"), "1".to_string()));
        params.push((Arc::from("id"), "2".to_string()));
        ctx.bind_route("base", "/org/:id/user/:id", params);
        assert_eq!(ctx.path_param("id"), Some("2"));
    }

    #[test]
    fn query_and_form_params_last_write_wins() {
        let ctx = Context::new(Method::POST, "example:80", "/search")
            .with_query_param("q", "first")
            .with_query_param("q", "second")
            .with_form_param("tag", "a")
            .with_form_param("tag", "b");
        assert_eq!(ctx.query_param("q"), Some("second"));
        assert_eq!(ctx.form_param("tag"), Some("b"));
        assert_eq!(ctx.query_param("missing"), None);
        assert_eq!(ctx.form_param("missing"), None);
    }

    #[test]
    fn request_id_adopted_from_header() {
        let inbound = "01ARZ3NDEKTSV4RRFFQ69G5FAV";
        let ctx = Context::new(Method::GET, "example:80", "/")
            .with_header(REQUEST_ID_HEADER, inbound)
            .correlate();
        assert_eq!(ctx.request_id.to_string(), inbound);
    }

    #[test]
    fn garbage_correlation_header_keeps_a_fresh_id() {
        let ctx = Context::new(Method::GET, "example:80", "/")
            .with_header(REQUEST_ID_HEADER, "not-a-ulid")
            .correlate();
        assert_ne!(ctx.request_id.to_string(), "not-a-ulid");
        // Parse round-trip proves the fallback id is well formed.
        assert!(ctx.request_id.to_string().parse::<RequestId>().is_ok());
    }

    #[test]
    fn json_sets_status_and_content_type() {
        let mut res = Response::default();
        res.json(201, &serde_json::json!({"id": 7})).unwrap();
        assert_eq!(res.status, 201);
        assert_eq!(res.header("content-type"), Some("application/json"));
        assert_eq!(res.body_str(), r#"{"id":7}"#);
    }

    #[test]
    fn set_header_replaces_existing() {
        let mut res = Response::default();
        res.set_header("Content-Type", "text/plain".to_string());
        res.set_header("content-type", "application/json".to_string());
        assert_eq!(res.headers.len(), 1);
        assert_eq!(res.header("Content-Type"), Some("application/json"));
    }
}
