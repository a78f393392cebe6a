mod chain;

pub use chain::{compose, wrap, Handler, Middleware};
