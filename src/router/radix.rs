//! Radix tree for route matching.
//!
//! Paths are split into segments and inserted into a tree where static
//! segments match exactly, `:name` segments capture one path segment, and a
//! trailing `*` captures the remainder. Lookup is O(k) in the path length.
//!
//! Precedence is decided segment-by-segment, left to right: static children
//! are tried before parameter children, and a trailing wildcard is only
//! consulted once both fail. Within a precedence class, children are kept in
//! insertion order, so ties between equally specific patterns fall to the
//! first one registered.

use http::Method;
use std::collections::HashMap;
use std::sync::Arc;

use super::core::{ParamVec, Route};

/// Parameter name under which a trailing `*` stores the captured remainder.
pub const WILDCARD_PARAM: &str = "*";

pub(crate) fn split_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

#[derive(Clone, Default)]
pub(crate) struct RadixTree {
    root: RadixNode,
}

impl RadixTree {
    /// Insert a route under its pattern. Duplicate `(method, pattern)` pairs
    /// keep the first registration.
    pub(crate) fn insert(&mut self, method: Method, route: Arc<Route>) {
        let pattern = route.pattern().to_string();
        let segments = split_segments(&pattern);
        self.root.insert(&segments, method, route);
    }

    /// Find the route for `(method, path)`, pushing captured parameters into
    /// `params`. On `None`, `params` is left as it was.
    pub(crate) fn find(
        &self,
        method: &Method,
        path: &str,
        params: &mut ParamVec,
    ) -> Option<Arc<Route>> {
        let segments = split_segments(path);
        self.root.search(&segments, method, params)
    }
}

#[derive(Clone, Default)]
struct RadixNode {
    /// Static segment this node matches (empty for the root and param nodes).
    segment: String,
    /// Routes terminating at this node, keyed by HTTP method.
    routes: HashMap<Method, Arc<Route>>,
    /// Capture name if this is a `:name` node.
    param_name: Option<Arc<str>>,
    /// Static children, in insertion order.
    children: Vec<RadixNode>,
    /// Parameter children, in insertion order. Kept separate per capture
    /// name so `/users/:id/posts` and `/users/:uid/comments` do not share
    /// a node and leak each other's parameter names.
    param_children: Vec<RadixNode>,
    /// Routes whose pattern ends in `*` anchored at this node, keyed by
    /// method. The wildcard also covers an empty remainder.
    wildcards: HashMap<Method, Arc<Route>>,
}

impl RadixNode {
    fn new_static(segment: &str) -> Self {
        Self {
            segment: segment.to_string(),
            ..Self::default()
        }
    }

    fn new_param(name: &str) -> Self {
        Self {
            param_name: Some(Arc::from(name)),
            ..Self::default()
        }
    }

    fn insert(&mut self, segments: &[&str], method: Method, route: Arc<Route>) {
        let Some((&segment, remaining)) = segments.split_first() else {
            self.routes.entry(method).or_insert(route);
            return;
        };

        if segment == "*" {
            // Pattern validation guarantees this is the final segment.
            self.wildcards.entry(method).or_insert(route);
            return;
        }

        if let Some(name) = segment.strip_prefix(':') {
            for param_child in &mut self.param_children {
                if param_child.param_name.as_deref() == Some(name) {
                    param_child.insert(remaining, method, route);
                    return;
                }
            }
            let mut node = RadixNode::new_param(name);
            node.insert(remaining, method, route);
            self.param_children.push(node);
            return;
        }

        for child in &mut self.children {
            if child.segment == segment {
                child.insert(remaining, method, route);
                return;
            }
        }
        let mut node = RadixNode::new_static(segment);
        node.insert(remaining, method, route);
        self.children.push(node);
    }

    fn search(
        &self,
        segments: &[&str],
        method: &Method,
        params: &mut ParamVec,
    ) -> Option<Arc<Route>> {
        let Some((&segment, remaining)) = segments.split_first() else {
            if let Some(route) = self.routes.get(method) {
                return Some(Arc::clone(route));
            }
            if let Some(route) = self.wildcards.get(method) {
                params.push((Arc::from(WILDCARD_PARAM), String::new()));
                return Some(Arc::clone(route));
            }
            return None;
        };

        for child in &self.children {
            if child.segment == segment {
                if let Some(route) = child.search(remaining, method, params) {
                    return Some(route);
                }
            }
        }

        for param_child in &self.param_children {
            if let Some(name) = &param_child.param_name {
                // Backtrack captured params if this subtree does not pan out.
                let depth = params.len();
                params.push((Arc::clone(name), segment.to_string()));
                if let Some(route) = param_child.search(remaining, method, params) {
                    return Some(route);
                }
                params.truncate(depth);
            }
        }

        if let Some(route) = self.wildcards.get(method) {
            params.push((Arc::from(WILDCARD_PARAM), segments.join("/")));
            return Some(Arc::clone(route));
        }

        None
    }
}
