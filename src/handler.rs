use crate::http::{BoxError, Request, Response};
use crate::route::Routes;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

/// A shared, type-erased [`Handler`].
pub type BoxHandler = Arc<dyn Handler>;

/// A unit of work that turns a request into a response.
///
/// Routers are handlers too, so a [`Router`](crate::Router) can be registered
/// as the leaf of another router's tree. Handlers that also expose their
/// routing tree advertise it through [`as_routes`](Handler::as_routes).
#[async_trait]
pub trait Handler: Send + Sync + 'static {
  /// Serve the request.
  async fn call(&self, req: Request) -> Result<Response, BoxError>;

  /// Returns the route introspection interface of this handler, if it has one.
  fn as_routes(self: Arc<Self>) -> Option<Arc<dyn Routes>> {
    None
  }
}

#[async_trait]
impl Handler for BoxHandler {
  async fn call(&self, req: Request) -> Result<Response, BoxError> {
    (**self).call(req).await
  }

  fn as_routes(self: Arc<Self>) -> Option<Arc<dyn Routes>> {
    (*self).clone().as_routes()
  }
}

/// A [`Handler`] backed by an async function or closure.
///
/// See [`handler_fn`].
#[derive(Clone)]
pub struct HandlerFn<F> {
  f: F,
}

/// Wraps an async function into a [`Handler`].
///
/// ```rust
/// use waypoint::{handler_fn, Request, Response};
///
/// let hello = handler_fn(|_: Request| async {
///   Ok(Response::new("hello".into()))
/// });
/// ```
pub fn handler_fn<F, Fut>(f: F) -> HandlerFn<F>
where
  F: Fn(Request) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = Result<Response, BoxError>> + Send + 'static,
{
  HandlerFn { f }
}

#[async_trait]
impl<F, Fut> Handler for HandlerFn<F>
where
  F: Fn(Request) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = Result<Response, BoxError>> + Send + 'static,
{
  async fn call(&self, req: Request) -> Result<Response, BoxError> {
    (self.f)(req).await
  }
}
