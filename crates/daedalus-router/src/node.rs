//! Radix tree node implementation.
//!
//! Each node owns one path segment. Lookup prefers static children, then the
//! parameter child, then the catch-all child, backtracking when a deeper
//! match fails.

use crate::method_router::MethodRouter;
use crate::params::Params;
use crate::pattern::{RoutePattern, Segment};

/// A node in the radix tree.
#[derive(Debug, Clone, Default)]
pub struct Node {
    segment: String,
    methods: Option<MethodRouter>,
    /// Sorted by segment for binary search.
    static_children: Vec<Node>,
    param_child: Option<(String, Box<Node>)>,
    catch_all: Option<(String, MethodRouter)>,
}

impl Node {
    /// Creates a root node.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    fn new_static(segment: &str) -> Self {
        Self {
            segment: segment.to_string(),
            ..Self::default()
        }
    }

    /// Inserts a route, merging with any methods already registered there.
    pub fn insert(&mut self, pattern: &RoutePattern, methods: MethodRouter) {
        self.insert_segments(pattern.segments(), methods);
    }

    fn insert_segments(&mut self, segments: &[Segment], methods: MethodRouter) {
        let Some((first, remaining)) = segments.split_first() else {
            merge_into(&mut self.methods, methods);
            return;
        };

        match first {
            Segment::Static(text) => {
                let index = match self
                    .static_children
                    .binary_search_by(|c| c.segment.as_str().cmp(text))
                {
                    Ok(index) => index,
                    Err(index) => {
                        self.static_children.insert(index, Node::new_static(text));
                        index
                    }
                };
                self.static_children[index].insert_segments(remaining, methods);
            }
            Segment::Param(name) => {
                // The first registered name wins for a shared position.
                let (_, child) = self
                    .param_child
                    .get_or_insert_with(|| (name.clone(), Box::default()));
                child.insert_segments(remaining, methods);
            }
            Segment::CatchAll(name) => match &mut self.catch_all {
                Some((_, existing)) => existing.merge(methods),
                None => self.catch_all = Some((name.clone(), methods)),
            },
        }
    }

    /// Matches a request path, returning the route's methods and values.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<(&MethodRouter, Params)> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = Params::new();
        let methods = self.match_segments(&segments, &mut params)?;
        Some((methods, params))
    }

    fn match_segments<'a>(&'a self, segments: &[&str], params: &mut Params) -> Option<&'a MethodRouter> {
        let Some((first, remaining)) = segments.split_first() else {
            return self.methods.as_ref().or_else(|| {
                // A catch-all also matches an empty remainder.
                self.catch_all.as_ref().map(|(name, methods)| {
                    params.push(name.as_str(), "");
                    methods
                })
            });
        };

        if let Ok(index) = self
            .static_children
            .binary_search_by(|c| c.segment.as_str().cmp(*first))
        {
            if let Some(methods) = self.static_children[index].match_segments(remaining, params) {
                return Some(methods);
            }
        }

        if let Some((name, child)) = &self.param_child {
            let mark = params.len();
            params.push(name.as_str(), *first);
            if let Some(methods) = child.match_segments(remaining, params) {
                return Some(methods);
            }
            params.truncate(mark);
        }

        self.catch_all.as_ref().map(|(name, methods)| {
            params.push(name.as_str(), segments.join("/"));
            methods
        })
    }
}

fn merge_into(slot: &mut Option<MethodRouter>, methods: MethodRouter) {
    match slot {
        Some(existing) => existing.merge(methods),
        None => *slot = Some(methods),
    }
}
