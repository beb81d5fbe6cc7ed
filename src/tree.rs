//! The routing tree.
//!
//! Routes are stored in a trie keyed by path segment. Every node has three
//! kinds of children, tried in order while matching: static children by
//! their literal text, a single parameter child, and a single wildcard
//! child. A failed branch backtracks to the next kind at each ancestor, so
//! the most specific route always wins.
//!
//! ```text
//! /users/new      ─┐
//! /users/:id       ├─  root ── users ─┬─ new            (static)
//! /users/:id/posts │                  ├─ :  ── posts    (param)
//! /files/*        ─┘           files ─┴─ *              (wildcard)
//! ```

use crate::context::Context;
use crate::endpoint::{Endpoint, Endpoints};
use crate::error::RouteError;
use crate::handler::BoxHandler;
use crate::http::Method;
use crate::route::{Route, Routes};
use crate::router::pattern::{segments_of, Pattern, Segment};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A node in the routing tree.
#[derive(Default)]
pub struct Node {
  statics: BTreeMap<String, Node>,
  param: Option<Box<Node>>,
  wildcard: Option<Box<Node>>,
  endpoints: Endpoints,
  subroutes: Option<Arc<dyn Routes>>,
}

impl Node {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers `handler` for `method` on `pattern`, returning the node the
  /// pattern ends at. A `None` method matches any method.
  ///
  /// Registering the same method twice on the same pattern shape fails and
  /// leaves the tree untouched.
  pub fn insert_route(
    &mut self,
    method: Option<Method>,
    pattern: &str,
    handler: BoxHandler,
  ) -> Result<&mut Node, RouteError> {
    self.insert_endpoint(method, pattern, handler, false)
  }

  pub(crate) fn insert_endpoint(
    &mut self,
    method: Option<Method>,
    pattern: &str,
    handler: BoxHandler,
    stub: bool,
  ) -> Result<&mut Node, RouteError> {
    let pattern = Pattern::parse(pattern)?;
    self.check_slot(method.as_ref(), &pattern)?;

    let mut node = self;
    for segment in pattern.segments() {
      node = match segment {
        Segment::Static(text) => node.statics.entry(text.clone()).or_default(),
        Segment::Param(_) => &mut **node.param.get_or_insert_with(Box::default),
        Segment::Wildcard => &mut **node.wildcard.get_or_insert_with(Box::default),
      };
    }

    node.endpoints.insert(
      method,
      Endpoint {
        handler,
        param_keys: pattern.param_keys(),
        pattern: pattern.as_str().to_owned(),
        stub,
      },
    )?;

    Ok(node)
  }

  /// Checks that a handler could be registered for `method` on `pattern`
  /// without touching the tree.
  pub(crate) fn check_insert(&self, method: Option<&Method>, pattern: &str) -> Result<(), RouteError> {
    self.check_slot(method, &Pattern::parse(pattern)?)
  }

  fn check_slot(&self, method: Option<&Method>, pattern: &Pattern) -> Result<(), RouteError> {
    match self.find_shape(pattern) {
      Some(existing) if existing.endpoints.slot(method).is_some() => {
        Err(RouteError::conflict(method, pattern.as_str()))
      }
      _ => Ok(()),
    }
  }

  /// Looks up the route serving `method` on `path`.
  ///
  /// On success, the captured parameters are appended to the context's URL
  /// parameters and the matched pattern is recorded. When the path exists
  /// but not for `method`, the context is flagged as method-not-allowed with
  /// the methods that are registered.
  pub fn find_route(&self, rctx: &mut Context, method: &Method, path: &str) -> Option<(&Node, &Endpoint)> {
    rctx.route_params.clear();
    rctx.method_not_allowed = false;
    rctx.methods_allowed.clear();

    let node = match segments_of(path) {
      // the root path may still be served by a root wildcard
      None => match self.terminal(rctx, method) {
        Some(node) => Some(node),
        None => self.find_node(rctx, method, Some("")),
      },
      search => self.find_node(rctx, method, search),
    }?;

    let endpoint = node.endpoints.get(method)?;

    rctx.route_params.keys.clear();
    rctx.route_params.keys.extend(endpoint.param_keys.iter().cloned());
    rctx.url_params.extend(&rctx.route_params);

    if !endpoint.pattern.is_empty() {
      rctx.route_patterns.push(endpoint.pattern.clone());
    }

    Some((node, endpoint))
  }

  fn find_node(&self, rctx: &mut Context, method: &Method, search: Option<&str>) -> Option<&Node> {
    let search = match search {
      None => return self.terminal(rctx, method),
      Some(search) => search,
    };

    let (segment, rest) = match search.find('/') {
      Some(i) => (&search[..i], Some(&search[i + 1..])),
      None => (search, None),
    };

    if let Some(child) = self.statics.get(segment) {
      if let Some(found) = child.find_node(rctx, method, rest) {
        return Some(found);
      }
    }

    if let Some(child) = &self.param {
      if !segment.is_empty() {
        rctx.route_params.values.push(segment.to_owned());
        if let Some(found) = child.find_node(rctx, method, rest) {
          return Some(found);
        }
        rctx.route_params.values.pop();
      }
    }

    if let Some(child) = &self.wildcard {
      rctx.route_params.values.push(search.to_owned());
      if let Some(found) = child.terminal(rctx, method) {
        return Some(found);
      }
      rctx.route_params.values.pop();
    }

    None
  }

  // Checks whether the search can end at this node.
  fn terminal(&self, rctx: &mut Context, method: &Method) -> Option<&Node> {
    if self.endpoints.is_empty() {
      return None;
    }

    if self.endpoints.get(method).is_some() {
      return Some(self);
    }

    rctx.method_not_allowed = true;
    for allowed in self.endpoints.allowed() {
      if !rctx.methods_allowed.contains(allowed) {
        rctx.methods_allowed.push(allowed.clone());
      }
    }
    None
  }

  /// Whether a route with the same shape as `pattern` is registered.
  pub fn find_pattern(&self, pattern: &str) -> bool {
    Pattern::parse(pattern)
      .ok()
      .and_then(|pattern| self.find_shape(&pattern))
      .map_or(false, |node| !node.endpoints.is_empty())
  }

  fn find_shape(&self, pattern: &Pattern) -> Option<&Node> {
    let mut node = self;
    for segment in pattern.segments() {
      node = match segment {
        Segment::Static(text) => node.statics.get(text)?,
        Segment::Param(_) => node.param.as_deref()?,
        Segment::Wildcard => node.wildcard.as_deref()?,
      };
    }
    Some(node)
  }

  /// The router mounted at this node, if any.
  pub fn subroutes(&self) -> Option<&Arc<dyn Routes>> {
    self.subroutes.as_ref()
  }

  pub(crate) fn set_subroutes(&mut self, subroutes: Arc<dyn Routes>) {
    self.subroutes = Some(subroutes);
  }

  /// Every route registered in this tree, in tree order.
  pub fn routes(&self) -> Vec<Route> {
    let mut routes = Vec::new();
    self.collect_routes(&mut routes);
    routes
  }

  fn collect_routes(&self, routes: &mut Vec<Route>) {
    let start = routes.len();
    for (method, endpoint) in self.endpoints.iter().filter(|(_, ep)| !ep.stub) {
      let handler = (method.cloned(), endpoint.handler.clone());
      match routes[start..].iter_mut().find(|r| r.pattern == endpoint.pattern) {
        Some(route) => route.handlers.push(handler),
        None => routes.push(Route {
          pattern: endpoint.pattern.clone(),
          handlers: vec![handler],
          sub_routes: self.subroutes.clone(),
        }),
      }
    }

    for child in self.statics.values() {
      child.collect_routes(routes);
    }
    if let Some(child) = &self.param {
      child.collect_routes(routes);
    }
    if let Some(child) = &self.wildcard {
      child.collect_routes(routes);
    }
  }

  /// Visits every node that has a mounted router.
  pub(crate) fn for_each_subroutes(&self, f: &mut dyn FnMut(&Arc<dyn Routes>)) {
    if let Some(subroutes) = &self.subroutes {
      f(subroutes);
    }
    for child in self.statics.values() {
      child.for_each_subroutes(f);
    }
    if let Some(child) = &self.param {
      child.for_each_subroutes(f);
    }
    if let Some(child) = &self.wildcard {
      child.for_each_subroutes(f);
    }
  }
}
