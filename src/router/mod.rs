//! Path matching and route resolution.
//!
//! Each [`Module`](crate::Module) owns one [`Router`]. Patterns are compiled
//! into a radix tree at registration time; matching an incoming request is a
//! lock-free tree walk that extracts path parameters as it goes.
//!
//! Overlapping patterns resolve deterministically: literal segments beat
//! `:name` captures, which beat a trailing `*`, evaluated segment-by-segment
//! left to right; exact ties fall to the first route registered.

mod core;
mod radix;

pub use core::{ParamVec, Route, RouteMatch, Router, MAX_INLINE_PARAMS};
pub use radix::WILDCARD_PARAM;
