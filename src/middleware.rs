//! Middleware chains.
//!
//! A middleware takes the next handler in the chain and returns a handler
//! wrapping it. A [`Middlewares`] stack composed with an endpoint handler
//! behaves like a single handler: middlewares run in the order they were
//! added, and the endpoint runs last.
//!
//! ```text
//! chain[A, B].handler(H)  =>  A(B(H))
//! request   → A → B → H
//! response  ← A ← B ← H
//! ```

use crate::handler::{BoxHandler, Handler};
use crate::http::{BoxError, Request, Response};
use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::iter::FromIterator;
use std::sync::Arc;

/// A request interceptor wrapping the next handler in a chain.
pub trait Middleware: Send + Sync + 'static {
  /// Wraps `next`, returning the handler that runs in its place.
  fn wrap(&self, next: BoxHandler) -> BoxHandler;
}

impl<F> Middleware for F
where
  F: Fn(BoxHandler) -> BoxHandler + Send + Sync + 'static,
{
  fn wrap(&self, next: BoxHandler) -> BoxHandler {
    (self)(next)
  }
}

/// An ordered middleware stack.
#[derive(Clone, Default)]
pub struct Middlewares(Vec<Arc<dyn Middleware>>);

/// Returns a [`Middlewares`] stack from a list of middlewares.
pub fn chain(middlewares: Vec<Arc<dyn Middleware>>) -> Middlewares {
  Middlewares(middlewares)
}

impl Middlewares {
  pub fn new() -> Self {
    Self::default()
  }

  /// Appends a middleware to the end of the stack.
  pub fn push(&mut self, middleware: impl Middleware) {
    self.0.push(Arc::new(middleware));
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub(crate) fn extend(&mut self, other: &Middlewares) {
    self.0.extend(other.0.iter().cloned());
  }

  /// Builds a single handler from the stack with `endpoint` as the final
  /// handler. An empty stack returns `endpoint` itself.
  pub fn handler(&self, endpoint: BoxHandler) -> BoxHandler {
    self
      .0
      .iter()
      .rev()
      .fold(endpoint, |next, middleware| middleware.wrap(next))
  }
}

impl Middleware for Middlewares {
  fn wrap(&self, next: BoxHandler) -> BoxHandler {
    self.handler(next)
  }
}

impl FromIterator<Arc<dyn Middleware>> for Middlewares {
  fn from_iter<I: IntoIterator<Item = Arc<dyn Middleware>>>(iter: I) -> Self {
    Middlewares(iter.into_iter().collect())
  }
}

impl fmt::Debug for Middlewares {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Middlewares").field("len", &self.0.len()).finish()
  }
}

/// Creates a middleware from an async function taking the request and the
/// next handler in the chain.
///
/// ```rust
/// use waypoint::{middleware, Handler, Request, BoxHandler};
///
/// let logger = middleware::from_fn(|req: Request, next: BoxHandler| async move {
///   let path = req.uri().path().to_owned();
///   let res = next.call(req).await;
///   println!("served {}", path);
///   res
/// });
/// ```
pub fn from_fn<F, Fut>(f: F) -> FromFn<F>
where
  F: Fn(Request, BoxHandler) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = Result<Response, BoxError>> + Send + 'static,
{
  FromFn { f: Arc::new(f) }
}

/// A middleware backed by an async function. See [`from_fn`].
pub struct FromFn<F> {
  f: Arc<F>,
}

impl<F, Fut> Middleware for FromFn<F>
where
  F: Fn(Request, BoxHandler) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = Result<Response, BoxError>> + Send + 'static,
{
  fn wrap(&self, next: BoxHandler) -> BoxHandler {
    Arc::new(FromFnHandler {
      f: self.f.clone(),
      next,
    })
  }
}

struct FromFnHandler<F> {
  f: Arc<F>,
  next: BoxHandler,
}

#[async_trait]
impl<F, Fut> Handler for FromFnHandler<F>
where
  F: Fn(Request, BoxHandler) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = Result<Response, BoxError>> + Send + 'static,
{
  async fn call(&self, req: Request) -> Result<Response, BoxError> {
    (self.f)(req, self.next.clone()).await
  }
}
