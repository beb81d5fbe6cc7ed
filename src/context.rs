//! Per-request routing state.
//!
//! Every request served by a [`Router`](crate::Router) carries a [`Context`]
//! in its extensions, reachable through [`RouteContext::from_request`]. The
//! context records the URL parameters captured while matching, the path left
//! to route when delegating to a mounted sub-router, and the methods that
//! would have matched when the request's method did not.
//!
//! Contexts are recycled through a [`ContextPool`] owned by the top-level
//! router and shared with its inline routers.

use crate::http::{Method, Request};
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;

/// Idle contexts kept by a pool beyond this count are dropped.
const MAX_IDLE: usize = 1024;

/// Ordered URL parameter keys and values, in capture order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RouteParams {
  pub keys: Vec<String>,
  pub values: Vec<String>,
}

impl RouteParams {
  pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
    self.keys.push(key.into());
    self.values.push(value.into());
  }

  /// Returns the value of the last parameter captured under `key`, so a
  /// sub-router's captures shadow those of its parents.
  pub fn get(&self, key: &str) -> Option<&str> {
    self
      .keys
      .iter()
      .rposition(|k| k == key)
      .and_then(|i| self.values.get(i))
      .map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.keys.len()
  }

  pub fn is_empty(&self) -> bool {
    self.keys.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self
      .keys
      .iter()
      .zip(self.values.iter())
      .map(|(k, v)| (k.as_str(), v.as_str()))
  }

  pub fn clear(&mut self) {
    self.keys.clear();
    self.values.clear();
  }

  pub(crate) fn extend(&mut self, other: &RouteParams) {
    self.keys.extend(other.keys.iter().cloned());
    self.values.extend(other.values.iter().cloned());
  }
}

/// The routing state of a single request.
#[derive(Debug, Default)]
pub struct Context {
  /// The path left to match. Set when delegating to a mounted sub-router,
  /// empty otherwise, in which case the request's own path is used.
  pub route_path: String,

  /// The method to route by. Falls back to the request's method when empty.
  pub route_method: String,

  /// Parameters captured so far, across every router the request passed.
  pub url_params: RouteParams,

  // Values captured by the current lookup, keyed once an endpoint is found.
  pub(crate) route_params: RouteParams,

  // Patterns matched by every router along the way.
  pub(crate) route_patterns: Vec<String>,

  pub(crate) method_not_allowed: bool,
  pub(crate) methods_allowed: Vec<Method>,
}

impl Context {
  pub fn new() -> Self {
    Self::default()
  }

  /// Clears the context for reuse, keeping its allocations.
  pub fn reset(&mut self) {
    self.route_path.clear();
    self.route_method.clear();
    self.url_params.clear();
    self.route_params.clear();
    self.route_patterns.clear();
    self.method_not_allowed = false;
    self.methods_allowed.clear();
  }

  /// Returns the value of the URL parameter `key`.
  pub fn url_param(&self, key: &str) -> Option<&str> {
    self.url_params.get(key)
  }

  /// Returns the full routing pattern that matched the request, joined
  /// across mounted routers, ex: `/api/users/:id`.
  pub fn route_pattern(&self) -> String {
    let mut pattern = self.route_patterns.concat();
    while pattern.contains("/*/") {
      pattern = pattern.replace("/*/", "/");
    }
    if pattern != "/" {
      pattern = pattern.trim_end_matches("//").to_owned();
      if pattern.len() > 1 {
        pattern = pattern.trim_end_matches('/').to_owned();
      }
    }
    pattern
  }

  pub fn route_patterns(&self) -> &[String] {
    &self.route_patterns
  }

  /// Whether the path matched a route that does not accept the method.
  pub fn method_not_allowed(&self) -> bool {
    self.method_not_allowed
  }

  /// Methods registered on the path when the request's method is not.
  pub fn methods_allowed(&self) -> &[Method] {
    &self.methods_allowed
  }

  /// The path to hand to a mounted sub-router: the wildcard captured by the
  /// mount, rooted at `/`.
  pub(crate) fn next_route_path(&self) -> String {
    match self.route_params.keys.last() {
      Some(key) if key == "*" => match self.route_params.values.get(self.route_params.keys.len() - 1) {
        Some(rest) => format!("/{}", rest),
        None => "/".to_owned(),
      },
      _ => "/".to_owned(),
    }
  }

  /// Drops the wildcard captured by a mount so it does not show up among
  /// the sub-router's parameters.
  pub(crate) fn clear_mount_wildcard(&mut self) {
    if self.url_params.keys.last().map_or(false, |key| key == "*") {
      self.url_params.keys.pop();
      self.url_params.values.pop();
    }
  }
}

/// A handle to the [`Context`] of an in-flight request.
#[derive(Debug, Clone)]
pub struct RouteContext(Arc<Mutex<Context>>);

impl RouteContext {
  pub(crate) fn new(ctx: Context) -> Self {
    RouteContext(Arc::new(Mutex::new(ctx)))
  }

  /// Returns the routing context attached to the request, if any.
  pub fn from_request(req: &Request) -> Option<RouteContext> {
    req.extensions().get::<RouteContext>().cloned()
  }

  /// Locks the context. The guard must not be held across an `.await`.
  pub fn lock(&self) -> MutexGuard<'_, Context> {
    self.0.lock()
  }

  pub fn url_param(&self, key: &str) -> Option<String> {
    self.lock().url_param(key).map(str::to_owned)
  }

  pub fn route_pattern(&self) -> String {
    self.lock().route_pattern()
  }
}

/// Returns the URL parameter `key` captured for the request.
///
/// ```rust
/// use waypoint::{url_param, Request, Response};
///
/// async fn show_user(req: Request) -> Result<Response, waypoint::BoxError> {
///   let id = url_param(&req, "id").unwrap_or_default();
///   Ok(Response::new(id.into()))
/// }
/// ```
pub fn url_param(req: &Request, key: &str) -> Option<String> {
  RouteContext::from_request(req).and_then(|rctx| rctx.url_param(key))
}

/// A pool of reusable routing contexts.
///
/// Any idle context may be handed out; a miss allocates a fresh one.
#[derive(Debug, Default)]
pub struct ContextPool {
  idle: Mutex<Vec<Context>>,
}

impl ContextPool {
  pub fn new() -> Self {
    Self::default()
  }

  /// Takes a reset context from the pool.
  pub fn get(&self) -> Context {
    let mut ctx = self.idle.lock().pop().unwrap_or_default();
    ctx.reset();
    ctx
  }

  /// Returns a context to the pool.
  pub fn put(&self, ctx: Context) {
    let mut idle = self.idle.lock();
    if idle.len() < MAX_IDLE {
      idle.push(ctx);
    }
  }

  /// The number of idle contexts.
  pub fn idle(&self) -> usize {
    self.idle.lock().len()
  }

  /// Attaches a pooled context to the request. The context goes back to
  /// the pool when the returned guard is dropped.
  pub(crate) fn attach(self: &Arc<Self>, req: &mut Request) -> PooledContext {
    let rctx = RouteContext::new(self.get());
    req.extensions_mut().insert(rctx.clone());
    PooledContext {
      rctx: Some(rctx),
      pool: self.clone(),
    }
  }
}

pub(crate) struct PooledContext {
  rctx: Option<RouteContext>,
  pool: Arc<ContextPool>,
}

impl Drop for PooledContext {
  fn drop(&mut self) {
    // a context still referenced elsewhere is never reused
    if let Some(RouteContext(shared)) = self.rctx.take() {
      if let Ok(ctx) = Arc::try_unwrap(shared) {
        self.pool.put(ctx.into_inner());
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::http::Body;

  #[test]
  fn reset_clears_everything() {
    let mut ctx = Context::new();
    ctx.route_path.push_str("/rest");
    ctx.route_method.push_str("GET");
    ctx.url_params.add("id", "1");
    ctx.route_params.add("id", "1");
    ctx.route_patterns.push("/users/:id".into());
    ctx.method_not_allowed = true;
    ctx.methods_allowed.push(Method::GET);

    ctx.reset();

    assert!(ctx.route_path.is_empty());
    assert!(ctx.route_method.is_empty());
    assert!(ctx.url_params.is_empty());
    assert!(ctx.route_params.is_empty());
    assert!(ctx.route_patterns.is_empty());
    assert!(!ctx.method_not_allowed());
    assert!(ctx.methods_allowed().is_empty());
  }

  #[test]
  fn later_params_shadow_earlier_ones() {
    let mut params = RouteParams::default();
    params.add("id", "outer");
    params.add("id", "inner");
    assert_eq!(params.get("id"), Some("inner"));
    assert_eq!(params.get("missing"), None);
  }

  #[test]
  fn route_pattern_joins_mounts() {
    let mut ctx = Context::new();
    ctx.route_patterns = vec!["/api/*".into(), "/users/*".into(), "/:id".into()];
    assert_eq!(ctx.route_pattern(), "/api/users/:id");

    ctx.route_patterns = vec!["/".into()];
    assert_eq!(ctx.route_pattern(), "/");
  }

  #[test]
  fn next_route_path_uses_wildcard() {
    let mut ctx = Context::new();
    assert_eq!(ctx.next_route_path(), "/");

    ctx.route_params.add("*", "widgets/1");
    assert_eq!(ctx.next_route_path(), "/widgets/1");

    ctx.route_params.clear();
    ctx.route_params.add("*", "");
    assert_eq!(ctx.next_route_path(), "/");
  }

  #[test]
  fn pool_returns_attached_context() {
    let pool = Arc::new(ContextPool::new());
    let mut req = hyper::Request::builder().uri("/").body(Body::empty()).unwrap();

    let guard = pool.attach(&mut req);
    RouteContext::from_request(&req).unwrap().lock().url_params.add("id", "7");
    assert_eq!(pool.idle(), 0);

    drop(req);
    drop(guard);
    assert_eq!(pool.idle(), 1);

    let ctx = pool.get();
    assert!(ctx.url_params.is_empty());
  }

  #[test]
  fn leaked_context_is_not_reused() {
    let pool = Arc::new(ContextPool::new());
    let mut req = hyper::Request::builder().uri("/").body(Body::empty()).unwrap();

    let guard = pool.attach(&mut req);
    drop(guard);

    assert_eq!(pool.idle(), 0);
    assert!(RouteContext::from_request(&req).is_some());
  }
}
