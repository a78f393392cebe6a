//! Router hot path: route table, matching, pattern validation.

use arc_swap::ArcSwap;
use http::Method;
use smallvec::SmallVec;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

use super::radix::{split_segments, RadixTree};
use crate::error::ConfigError;
use crate::middleware::{Handler, Middleware};

/// Maximum number of path parameters before heap allocation.
/// Most route patterns capture ≤4 parameters, so captures stay on the stack.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the hot path.
///
/// Parameter names use `Arc<str>` because they come from the route tree and
/// are known at registration time; `Arc::clone` is an O(1) atomic increment.
/// Values are per-request data and stay `String`.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// A registered route: method, pattern, handler and the middleware list
/// fixed at registration. Immutable afterwards.
pub struct Route {
    method: Method,
    pattern: String,
    handler: Handler,
    middlewares: Vec<Middleware>,
    /// Position in registration order, for diagnostics.
    index: usize,
}

impl Route {
    pub(crate) fn new(
        method: Method,
        pattern: &str,
        handler: Handler,
        middlewares: Vec<Middleware>,
        index: usize,
    ) -> Self {
        Self {
            method,
            pattern: pattern.to_string(),
            handler,
            middlewares,
            index,
        }
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    #[must_use]
    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    /// Middleware applied around this route's handler, innermost in the
    /// overall chain, in the exact order supplied at registration.
    #[must_use]
    pub fn middlewares(&self) -> &[Middleware] {
        &self.middlewares
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern)
            .field("middlewares", &self.middlewares.len())
            .field("index", &self.index)
            .finish()
    }
}

/// Result of successfully matching a path against a router.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub route: Arc<Route>,
    /// Parameters captured from the path (stack-allocated for ≤8 params).
    pub path_params: ParamVec,
}

impl RouteMatch {
    /// Get a captured parameter by name ("last write wins" for duplicate
    /// names at different path depths).
    #[inline]
    #[must_use]
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Everything a match needs, swapped atomically as one unit.
#[derive(Clone, Default)]
struct RouteTable {
    tree: RadixTree,
    /// Registration-ordered listing for introspection.
    patterns: Vec<(Method, String)>,
}

/// Per-scope path matcher mapping `(method, pattern)` to a handler plus its
/// own middleware list.
///
/// Matching reads are lock-free (`ArcSwap` snapshot); registration clones
/// the table, mutates the copy and swaps it in, serialized by a mutex.
/// Registration is expected during single-threaded setup, but racing it
/// against matching never corrupts state: an in-flight match keeps using
/// the snapshot it loaded.
pub struct Router {
    table: ArcSwap<RouteTable>,
    write_lock: Mutex<()>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: ArcSwap::from_pointee(RouteTable::default()),
            write_lock: Mutex::new(()),
        }
    }

    /// Register a route.
    ///
    /// Pattern syntax: literal segments match exactly, `:name` captures one
    /// segment, a trailing `*` captures the remainder (bound to param `"*"`).
    /// Malformed patterns fail here, at registration, not at request time.
    /// For an identical `(method, pattern)` pair the first registration wins
    /// and the duplicate is dropped entirely, so the table listing only ever
    /// names routes that can match.
    pub fn register<I>(
        &self,
        method: Method,
        pattern: &str,
        handler: Handler,
        middlewares: I,
    ) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = Middleware>,
    {
        validate_pattern(pattern)?;

        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let current = self.table.load_full();
        if current
            .patterns
            .iter()
            .any(|(m, p)| m == &method && p == pattern)
        {
            debug!(method = %method, pattern = %pattern, "duplicate route ignored, first registration kept");
            return Ok(());
        }
        let mut next = (*current).clone();

        let route = Arc::new(Route::new(
            method.clone(),
            pattern,
            handler,
            middlewares.into_iter().collect(),
            next.patterns.len(),
        ));
        next.tree.insert(method.clone(), route);
        next.patterns.push((method.clone(), pattern.to_string()));
        self.table.store(Arc::new(next));

        info!(method = %method, pattern = %pattern, "route registered");
        Ok(())
    }

    /// Match a `(method, path)` pair against the route table.
    ///
    /// A non-match returns `None`; it is an outcome for the caller to
    /// translate, not an error.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        debug!(method = %method, path = %path, "route match attempt");

        let table = self.table.load();
        let mut params = ParamVec::new();
        match table.tree.find(method, path, &mut params) {
            Some(route) => {
                debug!(
                    method = %method,
                    path = %path,
                    pattern = %route.pattern(),
                    path_params = ?params,
                    "route matched"
                );
                Some(RouteMatch {
                    route,
                    path_params: params,
                })
            }
            None => {
                warn!(method = %method, path = %path, "no route matched");
                None
            }
        }
    }

    /// All registered `(method, pattern)` pairs in registration order.
    #[must_use]
    pub fn path_patterns(&self) -> Vec<(Method, String)> {
        self.table.load().patterns.clone()
    }

    /// Log the full routing table, one line per route.
    pub fn dump_routes(&self) {
        let table = self.table.load();
        info!(routes_count = table.patterns.len(), "routing table");
        for (method, pattern) in &table.patterns {
            info!(method = %method, pattern = %pattern, "route");
        }
    }
}

fn validate_pattern(pattern: &str) -> Result<(), ConfigError> {
    if !pattern.starts_with('/') {
        return Err(ConfigError::invalid_pattern(pattern, "must start with '/'"));
    }
    let segments = split_segments(pattern);
    for (i, segment) in segments.iter().enumerate() {
        if *segment == "*" {
            if i != segments.len() - 1 {
                return Err(ConfigError::invalid_pattern(
                    pattern,
                    "'*' is only allowed as the final segment",
                ));
            }
        } else if segment.contains('*') {
            return Err(ConfigError::invalid_pattern(
                pattern,
                "'*' must be a segment of its own",
            ));
        } else if *segment == ":" {
            return Err(ConfigError::invalid_pattern(
                pattern,
                "':' must be followed by a parameter name",
            ));
        } else if segment.chars().skip(1).any(|c| c == ':') {
            return Err(ConfigError::invalid_pattern(
                pattern,
                "':' is only allowed at the start of a segment",
            ));
        }
    }
    Ok(())
}
