//! # hostroute
//!
//! **hostroute** is an embeddable HTTP request-dispatch core: given an
//! incoming request (method, host, path, headers), it resolves which
//! application logic should handle it and executes an ordered chain of
//! cross-cutting middleware around that logic.
//!
//! ## Architecture
//!
//! - **[`middleware`]** - onion-style middleware types and explicit-fold
//!   composition
//! - **[`router`]** - radix-tree path matcher with `:name` captures and
//!   trailing `*` wildcards
//! - **[`module`]** - named route groupings with a fixed middleware set
//! - **[`domain`]** - runtime-mutable virtual-host bindings
//! - **[`app`]** - the [`Application`] composition root and dispatch
//!   algorithm
//! - **[`context`]** - the normalized request/response descriptor an engine
//!   fills in
//!
//! ## Request flow
//!
//! 1. An engine (any transport that terminates HTTP) builds a [`Context`]
//!    and calls [`Application::dispatch`].
//! 2. The Pre-chain runs unconditionally: groups registered later wrap
//!    groups registered earlier (LIFO of groups, FIFO within a group).
//!    Pre middleware observes no resolved route by design, so logging and
//!    recovery wrappers see literally every request.
//! 3. The dispatcher resolves a `(module, route, params)` triple: an exact
//!    host match against the domain registry first, otherwise the first
//!    path segment as module name (with the remainder matched inside that
//!    module), otherwise the default module. A module bound to a domain is
//!    unreachable by prefix, and vice versa.
//! 4. On a match, `use-chain ++ module middleware ++ route middleware` is
//!    composed around the handler and executed with path parameters bound
//!    into the context. On a miss, a 404 response is staged and none of
//!    those chains run.
//! 5. Errors returned by any link propagate to the engine unmodified.
//!
//! Domain bindings are hot-swappable at runtime ([`Application::set_domain`])
//! with no restart and are safe under concurrent dispatch.
//!
//! ## What this crate is not
//!
//! It does not parse HTTP wire bytes, manage connections, implement TLS, or
//! prescribe templating or persistence. Concrete middleware (logging, auth,
//! static files, ...) are consumers of the [`Middleware`] contract, not part
//! of the core.

pub mod app;
pub mod context;
pub mod domain;
pub mod error;
pub mod ids;
pub mod middleware;
pub mod module;
pub mod router;

pub use app::{Application, DispatchOutcome, DEFAULT_MODULE};
pub use context::{
    Context, HeaderVec, ResolvedRoute, Response, MAX_INLINE_HEADERS, REQUEST_ID_HEADER,
};
pub use domain::DomainRegistry;
pub use error::ConfigError;
pub use ids::RequestId;
pub use middleware::{compose, wrap, Handler, Middleware};
pub use module::Module;
pub use router::{ParamVec, Route, RouteMatch, Router, MAX_INLINE_PARAMS, WILDCARD_PARAM};
