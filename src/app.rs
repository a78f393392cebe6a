//! Composition root: pre/use chains, module registry, dispatch.

use http::Method;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, warn};

use crate::context::Context;
use crate::domain::DomainRegistry;
use crate::error::ConfigError;
use crate::middleware::{compose, Handler, Middleware};
use crate::module::Module;
use crate::router::RouteMatch;

/// Module consulted when the first path segment names no registered module.
/// Overridable per application with [`Application::set_default_module`].
pub const DEFAULT_MODULE: &str = "base";

/// Terminal classification of a dispatch.
///
/// `NotFound` is an outcome, not an error: the Pre-chain has run, a 404
/// response is staged on the context, and no Use/module/route middleware
/// was invoked. Errors from handlers or middleware surface separately
/// through the `Result`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A module and route were resolved and the post-routing chain ran.
    Matched,
    /// Nothing matched (or a Pre middleware declined to continue).
    NotFound,
}

/// Top-level dispatch framework instance.
///
/// Owns the Pre-chain, the Use-chain, the module registry and the domain
/// registry, and ties routing and middleware together per request. Cheaply
/// cloneable (the state lives behind an inner `Arc`), so an engine can hand
/// one to each connection task.
///
/// ```
/// use hostroute::{Application, Context, DispatchOutcome, Handler};
/// use http::Method;
///
/// # fn main() -> anyhow::Result<()> {
/// let app = Application::new("demo");
/// let base = app.new_module("base", Vec::new())?;
/// base.get("/hello/:name", Handler::new(|ctx| {
///     let name = ctx.path_param("name").unwrap_or("world").to_string();
///     ctx.response.write_str(&format!("hello {name}"));
///     Ok(())
/// }))?;
///
/// let mut ctx = Context::new(Method::GET, "localhost:8080", "/hello/rust");
/// assert_eq!(app.dispatch(&mut ctx)?, DispatchOutcome::Matched);
/// assert_eq!(ctx.response.body_str(), "hello rust");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Application {
    inner: Arc<AppInner>,
}

struct AppInner {
    name: String,
    /// Groups in registration order; the effective Pre-chain is the reverse
    /// concatenation (most recent group outermost).
    pre_groups: RwLock<Vec<Vec<Middleware>>>,
    use_chain: RwLock<Vec<Middleware>>,
    modules: RwLock<HashMap<String, Arc<Module>>>,
    domains: DomainRegistry,
    default_module: RwLock<String>,
}

impl Application {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            inner: Arc::new(AppInner {
                name: name.to_string(),
                pre_groups: RwLock::new(Vec::new()),
                use_chain: RwLock::new(Vec::new()),
                modules: RwLock::new(HashMap::new()),
                domains: DomainRegistry::new(),
                default_module: RwLock::new(DEFAULT_MODULE.to_string()),
            }),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Register a Pre group: middleware that runs unconditionally before
    /// route resolution, observing no resolved route.
    ///
    /// Each call's group is placed *before* all previously registered
    /// groups, while the order within one call is preserved. After
    /// `pre([a1, a2])` then `pre([b1, b2])` a request observes
    /// `b1, b2, a1, a2`.
    pub fn pre<I>(&self, middlewares: I)
    where
        I: IntoIterator<Item = Middleware>,
    {
        let group: Vec<Middleware> = middlewares.into_iter().collect();
        if group.is_empty() {
            return;
        }
        self.inner
            .pre_groups
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(group);
    }

    /// Append middleware to the Use-chain: runs after a route is resolved,
    /// before module and route middleware. FIFO across and within calls.
    pub fn use_middleware<I>(&self, middlewares: I)
    where
        I: IntoIterator<Item = Middleware>,
    {
        self.inner
            .use_chain
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(middlewares);
    }

    /// Create and register a module. The middleware set is fixed for the
    /// module's lifetime; module names are unique per application.
    pub fn new_module(
        &self,
        name: &str,
        middlewares: Vec<Middleware>,
    ) -> Result<Arc<Module>, ConfigError> {
        let mut modules = self
            .inner
            .modules
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if modules.contains_key(name) {
            return Err(ConfigError::DuplicateModule(name.to_string()));
        }
        let module = Arc::new(Module::new(name, middlewares));
        modules.insert(name.to_string(), Arc::clone(&module));
        info!(app = %self.inner.name, module = %name, "module registered");
        Ok(module)
    }

    #[must_use]
    pub fn has_module(&self, name: &str) -> bool {
        self.inner
            .modules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    #[must_use]
    pub fn module(&self, name: &str) -> Option<Arc<Module>> {
        self.inner
            .modules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Bind `module` to a virtual-host domain, or unbind with `""`.
    ///
    /// A hot-swappable routing rule: it takes effect for subsequent
    /// dispatches with no restart. While bound, the module is unreachable
    /// by path prefix; the domain is compared by exact string equality
    /// (including any port) against the request host. Binding a domain
    /// already owned by another module evicts that owner (last write wins).
    pub fn set_domain(&self, module: &str, domain: &str) -> Result<(), ConfigError> {
        if !self.has_module(module) {
            return Err(ConfigError::UnknownModule(module.to_string()));
        }
        self.inner.domains.bind(module, domain);
        Ok(())
    }

    /// Domain currently bound to `module`, if any.
    #[must_use]
    pub fn domain_of(&self, module: &str) -> Option<String> {
        self.inner.domains.domain_of(module)
    }

    /// Change which module handles paths whose first segment names no
    /// registered module. Defaults to [`DEFAULT_MODULE`].
    pub fn set_default_module(&self, name: &str) {
        let mut default = self
            .inner
            .default_module
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *default = name.to_string();
    }

    /// Dispatch one request.
    ///
    /// Runs the Pre-chain around a terminal that resolves
    /// `(module, route, params)` and, on a match, executes
    /// `use ++ module ++ route` middleware around the handler. Pre
    /// middleware runs even when nothing will match. Errors from any link
    /// propagate unmodified; a no-match stages a 404 response instead.
    pub fn dispatch(&self, ctx: &mut Context) -> anyhow::Result<DispatchOutcome> {
        debug!(
            app = %self.inner.name,
            request_id = %ctx.request_id,
            method = %ctx.method,
            host = %ctx.host,
            path = %ctx.path,
            "dispatch"
        );

        let pre: Vec<Middleware> = {
            let groups = self
                .inner
                .pre_groups
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            groups.iter().rev().flatten().cloned().collect()
        };

        let app = self.clone();
        let terminal = Handler::new(move |ctx: &mut Context| app.route_and_run(ctx));
        compose(&pre, terminal).call(ctx)?;

        Ok(if ctx.resolved_route().is_some() {
            DispatchOutcome::Matched
        } else {
            DispatchOutcome::NotFound
        })
    }

    /// Post-Pre phase: resolution plus the post-routing chain.
    fn route_and_run(&self, ctx: &mut Context) -> anyhow::Result<()> {
        let Some((module, matched)) = self.resolve(&ctx.host, &ctx.path, &ctx.method) else {
            warn!(
                request_id = %ctx.request_id,
                method = %ctx.method,
                host = %ctx.host,
                path = %ctx.path,
                "no module or route matched"
            );
            ctx.response.status = 404;
            ctx.response.write_str("404 page not found");
            return Ok(());
        };

        let RouteMatch { route, path_params } = matched;
        ctx.bind_route(module.name(), route.pattern(), path_params);

        let mut chain: Vec<Middleware> = self
            .inner
            .use_chain
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        chain.extend(module.middlewares().iter().cloned());
        chain.extend(route.middlewares().iter().cloned());

        compose(&chain, route.handler().clone()).call(ctx)
    }

    /// Resolve `(host, path, method)` to a module and route.
    ///
    /// Domain-first, then path prefix: an exact host binding routes the full
    /// path inside the bound module; otherwise the first path segment names
    /// a module and the remainder is matched against its router, unless the
    /// module is currently domain-bound (which removes it from prefix
    /// dispatch). When the first segment names no module at all, the full
    /// path is tried against the default module.
    fn resolve(&self, host: &str, path: &str, method: &Method) -> Option<(Arc<Module>, RouteMatch)> {
        if let Some(name) = self.inner.domains.module_for(host) {
            let module = self.module(&name)?;
            let matched = module.router().match_route(method, path)?;
            return Some((module, matched));
        }

        let trimmed = path.trim_start_matches('/');
        let (first, rest) = trimmed.split_once('/').unwrap_or((trimmed, ""));
        if !first.is_empty() {
            if let Some(module) = self.module(first) {
                // Bound modules are served by host only; their prefix is a
                // non-match, and resolution does not fall through to the
                // default module.
                if self.inner.domains.is_bound(first) {
                    debug!(module = %first, "prefix access disabled while domain-bound");
                    return None;
                }
                let remainder = format!("/{rest}");
                let matched = module.router().match_route(method, &remainder)?;
                return Some((module, matched));
            }
        }

        let default = self
            .inner
            .default_module
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let module = self.module(&default)?;
        if self.inner.domains.is_bound(&default) {
            return None;
        }
        let matched = module.router().match_route(method, path)?;
        Some((module, matched))
    }
}
