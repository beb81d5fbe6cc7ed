#![allow(dead_code)]

use waypoint::http::Body;
use waypoint::{BoxError, Handler, Method, Request, Response, RouteContext, Router};

pub fn request(method: Method, uri: &str) -> Request {
  hyper::Request::builder()
    .method(method)
    .uri(uri)
    .body(Body::empty())
    .unwrap()
}

pub fn text(body: &str) -> Response {
  Response::new(Body::from(body.to_owned()))
}

pub async fn body_string(res: Response) -> String {
  let bytes = hyper::body::to_bytes(res.into_body()).await.unwrap();
  String::from_utf8(bytes.to_vec()).unwrap()
}

/// Serves a request and returns the status and body.
pub async fn send(router: &Router, method: Method, uri: &str) -> (u16, String) {
  let res = router.call(request(method, uri)).await.unwrap();
  let status = res.status().as_u16();
  (status, body_string(res).await)
}

/// Responds with the matched route pattern and the captured parameters,
/// ex: `/users/:id [id=42]`.
pub async fn echo(req: Request) -> Result<Response, BoxError> {
  let summary = {
    let rctx = RouteContext::from_request(&req).expect("routing context");
    let ctx = rctx.lock();
    let params: Vec<String> = ctx
      .url_params
      .iter()
      .map(|(k, v)| format!("{}={}", k, v))
      .collect();
    format!("{} [{}]", ctx.route_pattern(), params.join(","))
  };
  Ok(text(&summary))
}
