//! Named grouping of routes with a fixed middleware set.

use http::Method;

use crate::error::ConfigError;
use crate::middleware::{Handler, Middleware};
use crate::router::Router;

/// A named grouping of routes, owning a dedicated [`Router`] and a
/// middleware set applied at module granularity.
///
/// Created through [`Application::new_module`](crate::Application::new_module)
/// and destroyed with the application. The middleware set is fixed at
/// creation; only the route table changes afterwards. Whether the module is
/// reachable by virtual host or by path prefix is decided by the
/// application's domain registry, not stored here, so the two views cannot
/// drift apart.
pub struct Module {
    name: String,
    middlewares: Vec<Middleware>,
    router: Router,
}

impl std::fmt::Debug for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("middlewares", &self.middlewares.len())
            .finish_non_exhaustive()
    }
}

impl Module {
    pub(crate) fn new(name: &str, middlewares: Vec<Middleware>) -> Self {
        Self {
            name: name.to_string(),
            middlewares,
            router: Router::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The router holding this module's routes. Paths registered here are
    /// relative to the module, not the full request path.
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Middleware applied to every route in this module, between the
    /// application's Use-chain and the route's own middleware.
    #[must_use]
    pub fn middlewares(&self) -> &[Middleware] {
        &self.middlewares
    }

    /// Shorthand for registering a route on this module's router.
    pub fn route<I>(
        &self,
        method: Method,
        pattern: &str,
        handler: Handler,
        middlewares: I,
    ) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = Middleware>,
    {
        self.router.register(method, pattern, handler, middlewares)
    }

    pub fn get(&self, pattern: &str, handler: Handler) -> Result<(), ConfigError> {
        self.route(Method::GET, pattern, handler, [])
    }

    pub fn post(&self, pattern: &str, handler: Handler) -> Result<(), ConfigError> {
        self.route(Method::POST, pattern, handler, [])
    }

    pub fn put(&self, pattern: &str, handler: Handler) -> Result<(), ConfigError> {
        self.route(Method::PUT, pattern, handler, [])
    }

    pub fn delete(&self, pattern: &str, handler: Handler) -> Result<(), ConfigError> {
        self.route(Method::DELETE, pattern, handler, [])
    }

    pub fn patch(&self, pattern: &str, handler: Handler) -> Result<(), ConfigError> {
        self.route(Method::PATCH, pattern, handler, [])
    }

    pub fn head(&self, pattern: &str, handler: Handler) -> Result<(), ConfigError> {
        self.route(Method::HEAD, pattern, handler, [])
    }

    pub fn options(&self, pattern: &str, handler: Handler) -> Result<(), ConfigError> {
        self.route(Method::OPTIONS, pattern, handler, [])
    }
}
