//! Adapters serving a [`Router`] through `hyper`.

use crate::handler::Handler;
use crate::http::{Body, Request, Response, StatusCode};
use crate::router::Router;
use futures::future::{ready, BoxFuture, Ready};
use hyper::service::Service;
use std::convert::Infallible;
use std::sync::Arc;
use std::task::{Context, Poll};
use tracing::error;

/// Produces a [`RouterService`] per connection.
pub struct MakeRouterService(RouterService);

impl MakeRouterService {
  pub fn new(router: Router) -> Self {
    Self(RouterService(Arc::new(router)))
  }
}

impl<T> Service<T> for MakeRouterService {
  type Response = RouterService;
  type Error = Infallible;
  type Future = Ready<Result<Self::Response, Self::Error>>;

  fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
    Poll::Ready(Ok(()))
  }

  fn call(&mut self, _: T) -> Self::Future {
    ready(Ok(self.0.clone()))
  }
}

/// A `hyper` service dispatching every request to a shared [`Router`].
///
/// Handler errors end here: they are logged and answered with an empty `500`.
#[derive(Clone)]
pub struct RouterService(Arc<Router>);

impl RouterService {
  pub fn new(router: Arc<Router>) -> Self {
    Self(router)
  }
}

impl Service<Request> for RouterService {
  type Response = Response;
  type Error = Infallible;
  type Future = BoxFuture<'static, Result<Response, Infallible>>;

  fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
    Poll::Ready(Ok(()))
  }

  fn call(&mut self, req: Request) -> Self::Future {
    let router = self.0.clone();
    Box::pin(async move {
      let method = req.method().clone();
      let path = req.uri().path().to_owned();

      match router.call(req).await {
        Ok(res) => Ok(res),
        Err(err) => {
          error!(%method, %path, error = %err, "handler failed");
          let mut res = Response::new(Body::empty());
          *res.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
          Ok(res)
        }
      }
    })
  }
}
