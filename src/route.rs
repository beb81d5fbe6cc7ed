//! Route introspection.
//!
//! Anything that owns a routing tree, routers in particular, can expose it
//! through [`Routes`]. Mounted sub-routers are discovered through this trait
//! so that dry-run matching and fallback propagation can descend into them.

use crate::context::Context;
use crate::handler::BoxHandler;
use crate::http::Method;
use crate::middleware::Middlewares;
use std::fmt;
use std::sync::Arc;

/// Traversal interface over a routing tree.
pub trait Routes: Send + Sync + 'static {
  /// Returns the routing tree in an easily traversable structure.
  fn routes(&self) -> Vec<Route>;

  /// Returns the middleware stack in use by the router.
  fn middlewares(&self) -> Middlewares;

  /// Searches the routing tree for a handler that matches the method and
  /// path, like routing a request would, but without executing the handler.
  /// The method name is matched exactly, `GET` but not `get`.
  fn match_route(&self, rctx: &mut Context, method: &str, path: &str) -> bool;

  /// Adopts the given fallback handlers wherever this router has none set.
  fn inherit_fallbacks(&self, _not_found: Option<&BoxHandler>, _method_not_allowed: Option<&BoxHandler>) {}
}

/// A registered route, as returned by [`Routes::routes`].
#[derive(Clone)]
pub struct Route {
  /// The pattern the route was registered with.
  pub pattern: String,

  /// Handlers by method. `None` is the "any method" entry.
  pub handlers: Vec<(Option<Method>, BoxHandler)>,

  /// The router mounted at this pattern, if any.
  pub sub_routes: Option<Arc<dyn Routes>>,
}

impl fmt::Debug for Route {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let methods: Vec<String> = self
      .handlers
      .iter()
      .map(|(m, _)| m.as_ref().map_or_else(|| "*".to_owned(), Method::to_string))
      .collect();

    f.debug_struct("Route")
      .field("pattern", &self.pattern)
      .field("methods", &methods)
      .field("sub_routes", &self.sub_routes.is_some())
      .finish()
  }
}

/// Visits every registered (method, pattern) pair, descending into mounted
/// sub-routers. Patterns of mounted routes are reported with the mount
/// prefix prepended, ex: `/api/widgets`.
pub fn walk<F>(routes: &dyn Routes, mut f: F)
where
  F: FnMut(Option<&Method>, &str, &BoxHandler),
{
  walk_prefixed(routes, "", &mut f)
}

fn walk_prefixed(routes: &dyn Routes, parent: &str, f: &mut dyn FnMut(Option<&Method>, &str, &BoxHandler)) {
  for route in routes.routes() {
    if let Some(sub) = &route.sub_routes {
      let prefix = format!("{}{}", parent, route.pattern.trim_end_matches("/*"));
      walk_prefixed(sub.as_ref(), &prefix, f);
      continue;
    }

    let full = format!("{}{}", parent, route.pattern);
    for (method, handler) in &route.handlers {
      f(method.as_ref(), &full, handler);
    }
  }
}
