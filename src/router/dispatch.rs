//! Request dispatch.
//!
//! ```text
//! UNROUTED ─┬─> MATCHED ──> DISPATCHED
//!           ├─> NOT_FOUND
//!           └─> METHOD_NOT_ALLOWED
//! ```

use super::{request_method, Router, Shared};
use crate::context::RouteContext;
use crate::handler::{BoxHandler, Handler};
use crate::http::{header, Body, BoxError, Request, Response, StatusCode};
use crate::route::Routes;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tracing::{trace, warn};

#[async_trait]
impl Handler for Router {
  /// Serves the request through the router's middleware stack and routing
  /// tree. A routing context is taken from the pool unless the request
  /// already carries one, as it does when a parent router delegates here.
  async fn call(&self, mut req: Request) -> Result<Response, BoxError> {
    let handler = match self.serving_handler() {
      Some(handler) => handler,
      None => return self.not_found_handler().call(req).await,
    };

    if RouteContext::from_request(&req).is_some() {
      return handler.call(req).await;
    }

    let _rctx = self.pool().attach(&mut req);
    handler.call(req).await
  }

  fn as_routes(self: Arc<Self>) -> Option<Arc<dyn Routes>> {
    Some(self)
  }
}

enum Dispatch {
  Matched(BoxHandler),
  NotFound,
  MethodNotAllowed,
}

/// The terminal handler of a router: looks the request up in the tree.
pub(crate) struct RouteHandler {
  shared: Arc<Shared>,
}

impl RouteHandler {
  pub(crate) fn new(shared: Arc<Shared>) -> Self {
    RouteHandler { shared }
  }

  fn resolve(&self, rctx: &RouteContext, req: &Request) -> Dispatch {
    let mut ctx = rctx.lock();

    let route_path = if ctx.route_path.is_empty() {
      match req.uri().path() {
        "" => "/".to_owned(),
        path => path.to_owned(),
      }
    } else {
      ctx.route_path.clone()
    };

    if ctx.route_method.is_empty() {
      ctx.route_method = req.method().as_str().to_owned();
    }

    let method = match request_method(&ctx.route_method) {
      Some(method) => method,
      None => {
        warn!(method = %ctx.route_method, "unsupported request method");
        return Dispatch::MethodNotAllowed;
      }
    };

    let tree = self.shared.tree.read();
    match tree.find_route(&mut ctx, &method, &route_path) {
      Some((_, endpoint)) => {
        trace!(%method, path = %route_path, pattern = endpoint.pattern(), "matched route");
        Dispatch::Matched(endpoint.handler().clone())
      }
      None if ctx.method_not_allowed() => {
        trace!(%method, path = %route_path, allowed = ?ctx.methods_allowed(), "method not allowed");
        Dispatch::MethodNotAllowed
      }
      None => {
        trace!(%method, path = %route_path, "route not found");
        Dispatch::NotFound
      }
    }
  }

  fn fallback(slot: &parking_lot::RwLock<Option<BoxHandler>>, default: BoxHandler) -> BoxHandler {
    slot.read().clone().unwrap_or(default)
  }
}

#[async_trait]
impl Handler for RouteHandler {
  async fn call(&self, req: Request) -> Result<Response, BoxError> {
    // the router attaches a context before the middleware stack runs
    let dispatch = match RouteContext::from_request(&req) {
      Some(rctx) => self.resolve(&rctx, &req),
      None => {
        trace!(path = req.uri().path(), "request without routing context");
        Dispatch::NotFound
      }
    };

    let handler = match dispatch {
      Dispatch::Matched(handler) => handler,
      Dispatch::NotFound => Self::fallback(&self.shared.not_found, Arc::new(NotFound)),
      Dispatch::MethodNotAllowed => Self::fallback(&self.shared.method_not_allowed, Arc::new(MethodNotAllowed)),
    };
    handler.call(req).await
  }
}

/// The default `404` responder.
pub(crate) struct NotFound;

#[async_trait]
impl Handler for NotFound {
  async fn call(&self, _: Request) -> Result<Response, BoxError> {
    let res = hyper::Response::builder()
      .status(StatusCode::NOT_FOUND)
      .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
      .header(header::X_CONTENT_TYPE_OPTIONS, "nosniff")
      .body(Body::from(Bytes::from_static(b"404 page not found")))?;
    Ok(res)
  }
}

/// The default `405` responder. Advertises the allowed methods recorded in
/// the routing context.
pub(crate) struct MethodNotAllowed;

#[async_trait]
impl Handler for MethodNotAllowed {
  async fn call(&self, req: Request) -> Result<Response, BoxError> {
    let allowed = RouteContext::from_request(&req)
      .map(|rctx| rctx.lock().methods_allowed().to_vec())
      .unwrap_or_default();

    let mut res = hyper::Response::builder().status(StatusCode::METHOD_NOT_ALLOWED);
    for method in allowed {
      res = res.header(header::ALLOW, method.as_str());
    }
    Ok(res.body(Body::empty())?)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::context::Context;
  use crate::http::Method;

  fn request(uri: &str) -> Request {
    hyper::Request::builder().uri(uri).body(Body::empty()).unwrap()
  }

  #[tokio::test]
  async fn not_found_responds_with_plain_text() {
    let res = NotFound.call(request("/")).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");

    let body = hyper::body::to_bytes(res.into_body()).await.unwrap();
    assert_eq!(&body[..], b"404 page not found");
  }

  #[tokio::test]
  async fn method_not_allowed_sets_allow_headers() {
    let mut req = request("/");
    let rctx = RouteContext::new(Context::new());
    rctx.lock().methods_allowed = vec![Method::GET, Method::POST];
    req.extensions_mut().insert(rctx);

    let res = MethodNotAllowed.call(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);

    let allowed: Vec<_> = res.headers().get_all(header::ALLOW).iter().collect();
    assert_eq!(allowed, vec!["GET", "POST"]);
  }

  #[tokio::test]
  async fn request_without_context_is_not_found() {
    let route = RouteHandler::new(Arc::new(Shared::new()));
    let res = route.call(request("/")).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
  }
}
