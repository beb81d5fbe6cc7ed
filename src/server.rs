use crate::config::ServerConfig;
use crate::router::Router;
use crate::service::MakeRouterService;
use std::time::Duration;
use tracing::info;

/// Serves `router` on the address in `config` until the server fails.
///
/// ```rust,no_run
/// use waypoint::{Request, Response, Router, ServerConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), hyper::Error> {
///   let mut router = Router::new();
///   router.get("/", |_: Request| async { Ok(Response::new("hello".into())) });
///   waypoint::launch(router, ServerConfig::builder().port(3000)).await
/// }
/// ```
pub async fn launch(router: Router, config: ServerConfig) -> Result<(), hyper::Error> {
  let addr = config.socket_addr();

  let server = hyper::Server::try_bind(&addr)?
    .http1_keepalive(config.keep_alive.is_some())
    .http2_keep_alive_interval(config.keep_alive.map(Duration::from_secs))
    .serve(MakeRouterService::new(router));

  info!(address = %addr, "router launching");
  server.await
}
