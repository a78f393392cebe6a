//! Onion-style middleware composition.
//!
//! A [`Middleware`] is a pure wrapper: it maps a continuation (the "next
//! handler") to another continuation. Composition is an explicit fold, so a
//! chain can be built, inspected and exercised in isolation from routing.
//! Composing the same list twice yields behaviorally identical pipelines.

use std::fmt;
use std::sync::Arc;

use crate::context::Context;

/// Terminal continuation of a chain: consumes the request context, returns
/// `Ok(())` or an error that unwinds the whole dispatch.
#[derive(Clone)]
pub struct Handler(Arc<dyn Fn(&mut Context) -> anyhow::Result<()> + Send + Sync>);

impl Handler {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut Context) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Invoke the handler.
    pub fn call(&self, ctx: &mut Context) -> anyhow::Result<()> {
        (&*self.0)(ctx)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Handler(..)")
    }
}

/// A wrapping function from continuation to continuation.
///
/// Must call (or deliberately not call) the continuation it was given, and
/// may return an error from its own body to short-circuit the chain.
#[derive(Clone)]
pub struct Middleware(Arc<dyn Fn(Handler) -> Handler + Send + Sync>);

impl Middleware {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Handler) -> Handler + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Wrap a continuation, producing the wrapped continuation.
    #[must_use]
    pub fn apply(&self, next: Handler) -> Handler {
        (&*self.0)(next)
    }
}

impl fmt::Debug for Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Middleware(..)")
    }
}

/// Compose `chain` around `terminal` so that `chain[0]` is the outermost
/// wrapper: it runs first on the way in and last on the way out.
///
/// An empty chain returns `terminal` unchanged. Pure function; safe to call
/// concurrently with different chains.
#[must_use]
pub fn compose(chain: &[Middleware], terminal: Handler) -> Handler {
    chain.iter().rev().fold(terminal, |next, mw| mw.apply(next))
}

/// Build a [`Middleware`] from a plain closure receiving the context and the
/// continuation. The closure decides whether and when to call `next`.
///
/// ```
/// use hostroute::{wrap, Handler, Middleware};
///
/// let timing: Middleware = wrap(|ctx, next: &Handler| {
///     let start = std::time::Instant::now();
///     let result = next.call(ctx);
///     tracing::debug!(elapsed_us = start.elapsed().as_micros() as u64, "handled");
///     result
/// });
/// ```
pub fn wrap<F>(f: F) -> Middleware
where
    F: Fn(&mut Context, &Handler) -> anyhow::Result<()> + Send + Sync + 'static,
{
    let f = Arc::new(f);
    Middleware::new(move |next: Handler| {
        let f = Arc::clone(&f);
        Handler::new(move |ctx: &mut Context| (*f)(ctx, &next))
    })
}
