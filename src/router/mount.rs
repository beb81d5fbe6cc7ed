use crate::context::RouteContext;
use crate::handler::{BoxHandler, Handler};
use crate::http::{BoxError, Request, Response};
use async_trait::async_trait;

/// The handler registered at a mount point. Rewrites the route path to the
/// part below the mount before delegating.
pub(crate) struct Mount {
  handler: BoxHandler,
}

impl Mount {
  pub(crate) fn new(handler: BoxHandler) -> Self {
    Mount { handler }
  }
}

fn descend(req: &Request) {
  if let Some(rctx) = RouteContext::from_request(req) {
    let mut ctx = rctx.lock();
    ctx.route_path = ctx.next_route_path();
    ctx.clear_mount_wildcard();
  }
}

#[async_trait]
impl Handler for Mount {
  async fn call(&self, req: Request) -> Result<Response, BoxError> {
    descend(&req);
    self.handler.call(req).await
  }
}
