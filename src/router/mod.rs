//! `Router` registers routes to be matched and dispatches a handler.
//!
//! The registered path, against which the router matches incoming requests,
//! can contain named parameters and a trailing wildcard:
//!
//! ```text
//!  Path: /blog/:category/:post
//!
//!  /blog/rust/request-routers            match: category="rust", post="request-routers"
//!  /blog/rust/                           no match
//!  /blog/rust/request-routers/comments   no match
//!
//!  Path: /files/*
//!
//!  /files/                               match: *=""
//!  /files/LICENSE                        match: *="LICENSE"
//!  /files/templates/article.html         match: *="templates/article.html"
//!  /files                                no match
//! ```
//!
//! Static segments take priority over parameters, which take priority over
//! a wildcard, regardless of the order routes were registered in.
//!
//! Routers compose: a router is itself a [`Handler`], so independent routers
//! can be [mounted](Router::mount) under a prefix of another one.

pub mod pattern;

mod dispatch;
mod mount;

use crate::context::{Context, ContextPool};
use crate::error::RouteError;
use crate::handler::{handler_fn, BoxHandler, Handler};
use crate::http::{BoxError, Method, Request, Response};
use crate::middleware::{Middleware, Middlewares};
use crate::route::{Route, Routes};
use crate::tree::Node;
use dispatch::RouteHandler;
use mount::Mount;
use pattern::Pattern;
use parking_lot::RwLock;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

/// State shared by a router and the inline routers created from it.
pub(crate) struct Shared {
  tree: RwLock<Node>,
  pool: Arc<ContextPool>,
  not_found: RwLock<Option<BoxHandler>>,
  method_not_allowed: RwLock<Option<BoxHandler>>,
}

impl Shared {
  fn new() -> Self {
    Shared {
      tree: RwLock::new(Node::new()),
      pool: Arc::new(ContextPool::new()),
      not_found: RwLock::new(None),
      method_not_allowed: RwLock::new(None),
    }
  }

  /// Sets the given fallbacks and hands them down to every mounted router
  /// that has none of its own.
  fn set_fallbacks(&self, not_found: Option<&BoxHandler>, method_not_allowed: Option<&BoxHandler>) {
    if let Some(h) = not_found {
      *self.not_found.write() = Some(h.clone());
    }
    if let Some(h) = method_not_allowed {
      *self.method_not_allowed.write() = Some(h.clone());
    }

    self
      .tree
      .read()
      .for_each_subroutes(&mut |sub| sub.inherit_fallbacks(not_found, method_not_allowed));
  }
}

// Middlewares can be added until the first route is registered, at which
// point the router's handler is built and the stack is frozen.
enum Phase {
  Configuring,
  Serving(BoxHandler),
}

/// A request router.
///
/// ```rust
/// use waypoint::{url_param, Request, Response, Router};
///
/// let mut router = Router::new();
/// router.get("/", |_: Request| async { Ok(Response::new("Welcome!".into())) });
/// router.get("/hello/:name", |req: Request| async move {
///   let name = url_param(&req, "name").unwrap_or_default();
///   Ok(Response::new(format!("Hello, {}", name).into()))
/// });
/// ```
pub struct Router {
  shared: Arc<Shared>,

  /// Middlewares wrapping this router's handler, or each endpoint
  /// registered through an inline router.
  middlewares: Middlewares,

  /// Whether this is an inline router created by `with` or `group`. Inline
  /// routers register into their parent's tree.
  inline: bool,

  phase: Phase,
}

impl Default for Router {
  fn default() -> Self {
    Router {
      shared: Arc::new(Shared::new()),
      middlewares: Middlewares::new(),
      inline: false,
      phase: Phase::Configuring,
    }
  }
}

impl fmt::Debug for Router {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Router")
      .field("routes", &self.shared.tree.read().routes())
      .field("middlewares", &self.middlewares)
      .field("inline", &self.inline)
      .finish()
  }
}

#[track_caller]
fn fatal(err: RouteError) -> ! {
  panic!("waypoint: {}", err)
}

/// Maps a method name onto one of the supported HTTP methods.
pub(crate) fn parse_method(method: &str) -> Result<Method, RouteError> {
  match method.to_ascii_uppercase().as_str() {
    "CONNECT" => Ok(Method::CONNECT),
    "DELETE" => Ok(Method::DELETE),
    "GET" => Ok(Method::GET),
    "HEAD" => Ok(Method::HEAD),
    "OPTIONS" => Ok(Method::OPTIONS),
    "PATCH" => Ok(Method::PATCH),
    "POST" => Ok(Method::POST),
    "PUT" => Ok(Method::PUT),
    "TRACE" => Ok(Method::TRACE),
    _ => Err(RouteError::UnsupportedMethod(method.to_owned())),
  }
}

/// Maps a request's method onto a supported one. Method names in requests
/// are case-sensitive, so `get` is not `GET`.
pub(crate) fn request_method(method: &str) -> Option<Method> {
  parse_method(method).ok().filter(|m| m.as_str() == method)
}

macro_rules! method_routes {
  ($($(#[$doc:meta])* $name:ident => $method:expr),* $(,)?) => { $(
    $(#[$doc])*
    #[track_caller]
    pub fn $name<F, Fut>(&mut self, pattern: &str, handler: F) -> &mut Self
    where
      F: Fn(Request) -> Fut + Send + Sync + 'static,
      Fut: Future<Output = Result<Response, BoxError>> + Send + 'static,
    {
      self.register(Some($method), pattern, Arc::new(handler_fn(handler)))
    }
  )* };
}

impl Router {
  /// Returns a new router with an empty routing tree.
  pub fn new() -> Self {
    Self::default()
  }

  /// Appends a middleware to the router's stack.
  ///
  /// # Panics
  ///
  /// Middlewares must be added before any route is registered on this router.
  #[track_caller]
  pub fn use_middleware(&mut self, middleware: impl Middleware) -> &mut Self {
    if let Phase::Serving(_) = self.phase {
      fatal(RouteError::MiddlewareAfterRoutes);
    }
    self.middlewares.push(middleware);
    self
  }

  /// Adds the route `pattern` that matches any HTTP method.
  #[track_caller]
  pub fn handle(&mut self, pattern: &str, handler: impl Handler) -> &mut Self {
    self.register(None, pattern, Arc::new(handler))
  }

  /// Adds the route `pattern` that matches any HTTP method to execute an
  /// async function.
  #[track_caller]
  pub fn handle_fn<F, Fut>(&mut self, pattern: &str, handler: F) -> &mut Self
  where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, BoxError>> + Send + 'static,
  {
    self.register(None, pattern, Arc::new(handler_fn(handler)))
  }

  /// Adds the route `pattern` that matches the `method` HTTP method.
  ///
  /// # Panics
  ///
  /// Panics if the method is not supported, or on any error
  /// [`try_method`](Router::try_method) would return.
  #[track_caller]
  pub fn method(&mut self, method: &str, pattern: &str, handler: impl Handler) -> &mut Self {
    match self.try_method(method, pattern, handler) {
      Ok(router) => router,
      Err(err) => fatal(err),
    }
  }

  /// Adds the route `pattern` that matches the `method` HTTP method to
  /// execute an async function.
  #[track_caller]
  pub fn method_fn<F, Fut>(&mut self, method: &str, pattern: &str, handler: F) -> &mut Self
  where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, BoxError>> + Send + 'static,
  {
    self.method(method, pattern, handler_fn(handler))
  }

  /// Like [`method`](Router::method), but returns configuration errors
  /// instead of panicking. A failed registration leaves the tree unchanged.
  pub fn try_method(&mut self, method: &str, pattern: &str, handler: impl Handler) -> Result<&mut Self, RouteError> {
    let method = parse_method(method)?;
    self.insert(Some(method), pattern, Arc::new(handler), false, None)?;
    Ok(self)
  }

  method_routes! {
    /// Adds the route `pattern` that matches a CONNECT request.
    connect => Method::CONNECT,
    /// Adds the route `pattern` that matches a DELETE request.
    delete => Method::DELETE,
    /// Adds the route `pattern` that matches a GET request.
    get => Method::GET,
    /// Adds the route `pattern` that matches a HEAD request.
    head => Method::HEAD,
    /// Adds the route `pattern` that matches an OPTIONS request.
    options => Method::OPTIONS,
    /// Adds the route `pattern` that matches a PATCH request.
    patch => Method::PATCH,
    /// Adds the route `pattern` that matches a POST request.
    post => Method::POST,
    /// Adds the route `pattern` that matches a PUT request.
    put => Method::PUT,
    /// Adds the route `pattern` that matches a TRACE request.
    trace => Method::TRACE,
  }

  /// Sets a custom handler for paths that could not be found. The default
  /// responds `404` with a plain text body.
  ///
  /// Mounted routers without a handler of their own adopt this one.
  pub fn not_found(&mut self, handler: impl Handler) -> &mut Self {
    let handler: BoxHandler = Arc::new(handler);
    self.shared.set_fallbacks(Some(&handler), None);
    self
  }

  /// Sets a custom handler for paths that exist but not for the request's
  /// method. The default responds `405` with an `Allow` header per allowed
  /// method and an empty body.
  ///
  /// Mounted routers without a handler of their own adopt this one.
  pub fn method_not_allowed(&mut self, handler: impl Handler) -> &mut Self {
    let handler: BoxHandler = Arc::new(handler);
    self.shared.set_fallbacks(None, Some(&handler));
    self
  }

  /// Returns the handler that responds when no route matches.
  pub fn not_found_handler(&self) -> BoxHandler {
    match &*self.shared.not_found.read() {
      Some(h) => h.clone(),
      None => Arc::new(dispatch::NotFound),
    }
  }

  /// Returns the handler that responds when a route matches the path but
  /// not the method.
  pub fn method_not_allowed_handler(&self) -> BoxHandler {
    match &*self.shared.method_not_allowed.read() {
      Some(h) => h.clone(),
      None => Arc::new(dispatch::MethodNotAllowed),
    }
  }

  /// Returns an inline router that wraps every handler registered through
  /// it with `middleware`, on top of the inline middlewares of `self`.
  ///
  /// ```rust
  /// use waypoint::{middleware, BoxHandler, Handler, Request, Response, Router};
  ///
  /// let auth = middleware::from_fn(|req: Request, next: BoxHandler| async move {
  ///   next.call(req).await
  /// });
  ///
  /// let mut router = Router::new();
  /// router.with(auth).get("/admin", |_: Request| async { Ok(Response::default()) });
  /// ```
  pub fn with(&mut self, middleware: impl Middleware) -> Router {
    let mut middlewares = Middlewares::new();
    middlewares.push(middleware);
    self.inline_router(middlewares)
  }

  /// Creates an inline router with a fresh middleware stack and configures
  /// it with `f`. Useful for a group of handlers along the same routing
  /// path that share additional middlewares.
  pub fn group(&mut self, f: impl FnOnce(&mut Router)) -> Router {
    let mut inline = self.inline_router(Middlewares::new());
    f(&mut inline);
    inline
  }

  /// Creates a new router configured by `f` and mounts it along `pattern`.
  #[track_caller]
  pub fn route(&mut self, pattern: &str, f: impl FnOnce(&mut Router)) -> &mut Self {
    let mut sub = Router::new();
    f(&mut sub);
    self.mount(pattern, sub)
  }

  /// Attaches another handler, usually a router, along `pattern`. Requests
  /// for `pattern` and anything below it are delegated to `handler`, with
  /// the route path rewritten relative to the mount point.
  ///
  /// ```rust
  /// use waypoint::{Request, Response, Router};
  ///
  /// let mut api = Router::new();
  /// api.get("/widgets", |_: Request| async { Ok(Response::default()) });
  ///
  /// let mut router = Router::new();
  /// router.mount("/api", api); // serves /api/widgets
  /// ```
  ///
  /// # Panics
  ///
  /// Panics if something is already mounted on `pattern`.
  #[track_caller]
  pub fn mount(&mut self, pattern: &str, handler: impl Handler) -> &mut Self {
    match self.try_mount(pattern, handler) {
      Ok(router) => router,
      Err(err) => fatal(err),
    }
  }

  /// Like [`mount`](Router::mount), but returns configuration errors instead
  /// of panicking.
  pub fn try_mount(&mut self, pattern: &str, handler: impl Handler) -> Result<&mut Self, RouteError> {
    Pattern::parse(pattern)?;

    let base = pattern.trim_end_matches('/');
    let exact = if base.is_empty() { "/" } else { base };
    let wildcard = format!("{}/*", base);

    {
      let tree = self.shared.tree.read();
      if tree.find_pattern(&wildcard) {
        return Err(RouteError::MountConflict(pattern.to_owned()));
      }
      // both entries go in or neither does
      tree.check_insert(None, exact)?;
      tree.check_insert(None, &wildcard)?;
    }

    let handler = Arc::new(handler);
    let subroutes = handler.clone().as_routes();
    if let Some(sub) = &subroutes {
      sub.inherit_fallbacks(
        self.shared.not_found.read().as_ref(),
        self.shared.method_not_allowed.read().as_ref(),
      );
    }

    let mount: BoxHandler = Arc::new(Mount::new(handler));
    self.insert(None, exact, mount.clone(), true, subroutes.clone())?;
    self.insert(None, &wildcard, mount, false, subroutes)?;

    debug!(pattern, "mounted handler");
    Ok(self)
  }

  #[track_caller]
  fn register(&mut self, method: Option<Method>, pattern: &str, handler: BoxHandler) -> &mut Self {
    if let Err(err) = self.insert(method, pattern, handler, false, None) {
      fatal(err);
    }
    self
  }

  // Registers a handler in the routing tree for a particular method and
  // pattern.
  fn insert(
    &mut self,
    method: Option<Method>,
    pattern: &str,
    handler: BoxHandler,
    stub: bool,
    subroutes: Option<Arc<dyn Routes>>,
  ) -> Result<(), RouteError> {
    let handler = if self.inline {
      self.middlewares.handler(handler)
    } else {
      handler
    };

    {
      let mut tree = self.shared.tree.write();
      let node = tree.insert_endpoint(method.clone(), pattern, handler, stub)?;
      if let Some(subroutes) = subroutes {
        node.set_subroutes(subroutes);
      }
    }

    if let Phase::Configuring = self.phase {
      self.update_route_handler();
    }

    debug!(
      method = method.as_ref().map_or("*", Method::as_str),
      pattern,
      inline = self.inline,
      "registered route"
    );
    Ok(())
  }

  /// Builds the handler serving this router: the middleware stack wrapping
  /// the tree dispatch. No middleware can be added past this point.
  fn update_route_handler(&mut self) {
    let route: BoxHandler = Arc::new(RouteHandler::new(self.shared.clone()));
    let handler = if self.inline {
      route
    } else {
      self.middlewares.handler(route)
    };
    self.phase = Phase::Serving(handler);
  }

  fn inline_router(&mut self, extra: Middlewares) -> Router {
    if !self.inline {
      if let Phase::Configuring = self.phase {
        self.update_route_handler();
      }
    }

    let mut middlewares = if self.inline {
      self.middlewares.clone()
    } else {
      Middlewares::new()
    };
    middlewares.extend(&extra);

    Router {
      shared: self.shared.clone(),
      middlewares,
      inline: true,
      phase: Phase::Configuring,
    }
  }

  pub(crate) fn serving_handler(&self) -> Option<BoxHandler> {
    match &self.phase {
      Phase::Serving(handler) => Some(handler.clone()),
      Phase::Configuring => None,
    }
  }

  pub(crate) fn pool(&self) -> &Arc<ContextPool> {
    &self.shared.pool
  }
}

impl Routes for Router {
  fn routes(&self) -> Vec<Route> {
    self.shared.tree.read().routes()
  }

  fn middlewares(&self) -> Middlewares {
    self.middlewares.clone()
  }

  fn match_route(&self, rctx: &mut Context, method: &str, path: &str) -> bool {
    let parsed = match request_method(method) {
      Some(m) => m,
      None => return false,
    };

    let sub = {
      let tree = self.shared.tree.read();
      match tree.find_route(rctx, &parsed, path) {
        Some((node, _)) => match node.subroutes() {
          Some(sub) => sub.clone(),
          None => return true,
        },
        None => return false,
      }
    };

    rctx.route_path = rctx.next_route_path();
    let next = rctx.route_path.clone();
    sub.match_route(rctx, method, &next)
  }

  fn inherit_fallbacks(&self, not_found: Option<&BoxHandler>, method_not_allowed: Option<&BoxHandler>) {
    let not_found = not_found.filter(|_| self.shared.not_found.read().is_none());
    let method_not_allowed = method_not_allowed.filter(|_| self.shared.method_not_allowed.read().is_none());

    if not_found.is_some() || method_not_allowed.is_some() {
      self.shared.set_fallbacks(not_found, method_not_allowed);
    }
  }
}
