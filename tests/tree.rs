use std::sync::Arc;
use waypoint::tree::Node;
use waypoint::{handler_fn, BoxError, BoxHandler, Context, Method, Request, Response, RouteError};

async fn ok(_: Request) -> Result<Response, BoxError> {
  Ok(Response::default())
}

fn handler() -> BoxHandler {
  Arc::new(handler_fn(ok))
}

fn tree(routes: &[(Option<Method>, &str)]) -> Node {
  let mut tree = Node::new();
  for (method, pattern) in routes {
    tree.insert_route(method.clone(), pattern, handler()).unwrap();
  }
  tree
}

struct MatchTest {
  routes: Vec<(Option<Method>, &'static str)>,
  cases: Vec<(Method, &'static str, Option<(&'static str, Vec<(&'static str, &'static str)>)>)>,
}

impl MatchTest {
  fn run(self) {
    let tree = tree(&self.routes);

    for (method, path, expected) in self.cases {
      let mut rctx = Context::new();
      let got = tree
        .find_route(&mut rctx, &method, path)
        .map(|(_, ep)| ep.pattern().to_owned());

      match expected {
        None => assert_eq!(got, None, "unexpected match for '{} {}'", method, path),
        Some((pattern, params)) => {
          assert_eq!(got.as_deref(), Some(pattern), "wrong route for '{} {}'", method, path);
          let got_params: Vec<(&str, &str)> = rctx.url_params.iter().collect();
          assert_eq!(got_params, params, "wrong params for '{} {}'", method, path);
        }
      }
    }
  }
}

#[test]
fn static_routes() {
  MatchTest {
    routes: vec![
      (Some(Method::GET), "/"),
      (Some(Method::GET), "/hi"),
      (Some(Method::GET), "/contact"),
      (Some(Method::GET), "/co"),
      (Some(Method::GET), "/c"),
      (Some(Method::GET), "/a/b/c"),
      (Some(Method::GET), "/doc/"),
    ],
    cases: vec![
      (Method::GET, "/", Some(("/", vec![]))),
      (Method::GET, "/hi", Some(("/hi", vec![]))),
      (Method::GET, "/contact", Some(("/contact", vec![]))),
      (Method::GET, "/co", Some(("/co", vec![]))),
      (Method::GET, "/c", Some(("/c", vec![]))),
      (Method::GET, "/a/b/c", Some(("/a/b/c", vec![]))),
      (Method::GET, "/doc/", Some(("/doc/", vec![]))),
      (Method::GET, "/doc", None),
      (Method::GET, "/con", None),
      (Method::GET, "/a/b", None),
    ],
  }
  .run()
}

#[test]
fn params_and_wildcards() {
  MatchTest {
    routes: vec![
      (Some(Method::GET), "/users/:id"),
      (Some(Method::GET), "/users/:id/posts/:post"),
      (Some(Method::GET), "/files/*"),
      (Some(Method::GET), "/src/:dir/*"),
    ],
    cases: vec![
      (Method::GET, "/users/42", Some(("/users/:id", vec![("id", "42")]))),
      (Method::GET, "/users/42/extra", None),
      (Method::GET, "/users/", None),
      (
        Method::GET,
        "/users/42/posts/7",
        Some(("/users/:id/posts/:post", vec![("id", "42"), ("post", "7")])),
      ),
      (Method::GET, "/files/a/b/c", Some(("/files/*", vec![("*", "a/b/c")]))),
      (Method::GET, "/files/", Some(("/files/*", vec![("*", "")]))),
      (Method::GET, "/files", None),
      (
        Method::GET,
        "/src/lib/tree/node.rs",
        Some(("/src/:dir/*", vec![("dir", "lib"), ("*", "tree/node.rs")])),
      ),
    ],
  }
  .run()
}

#[test]
fn static_beats_param_beats_wildcard() {
  // registration order must not matter
  MatchTest {
    routes: vec![
      (Some(Method::GET), "/users/*"),
      (Some(Method::GET), "/users/:id"),
      (Some(Method::GET), "/users/new"),
    ],
    cases: vec![
      (Method::GET, "/users/new", Some(("/users/new", vec![]))),
      (Method::GET, "/users/7", Some(("/users/:id", vec![("id", "7")]))),
      (Method::GET, "/users/7/edit", Some(("/users/*", vec![("*", "7/edit")]))),
    ],
  }
  .run()
}

#[test]
fn param_names_follow_the_matched_endpoint() {
  MatchTest {
    routes: vec![(Some(Method::GET), "/items/:id"), (Some(Method::POST), "/items/:slug")],
    cases: vec![
      (Method::GET, "/items/x", Some(("/items/:id", vec![("id", "x")]))),
      (Method::POST, "/items/x", Some(("/items/:slug", vec![("slug", "x")]))),
    ],
  }
  .run()
}

#[test]
fn any_method_slot() {
  MatchTest {
    routes: vec![(None, "/ping"), (Some(Method::GET), "/ping")],
    cases: vec![
      (Method::GET, "/ping", Some(("/ping", vec![]))),
      (Method::DELETE, "/ping", Some(("/ping", vec![]))),
    ],
  }
  .run()
}

#[test]
fn duplicate_routes_are_rejected() {
  let mut tree = tree(&[(Some(Method::GET), "/users/:id"), (None, "/users/:id")]);

  assert_eq!(
    tree.insert_route(Some(Method::GET), "/users/:uid", handler()).err(),
    Some(RouteError::Conflict {
      method: "GET".into(),
      pattern: "/users/:uid".into()
    })
  );
  assert!(tree.insert_route(None, "/users/:id", handler()).is_err());
  assert!(tree.insert_route(Some(Method::POST), "/users/:id", handler()).is_ok());

  let routes = tree.routes();
  assert_eq!(routes.len(), 1);
  assert_eq!(routes[0].handlers.len(), 3);
}

#[test]
fn invalid_patterns_are_rejected() {
  let mut tree = Node::new();
  assert!(matches!(
    tree.insert_route(None, "users", handler()),
    Err(RouteError::MissingLeadingSlash(_))
  ));
  assert!(matches!(
    tree.insert_route(None, "/a/*/b", handler()),
    Err(RouteError::InvalidWildcard(_))
  ));
  assert!(tree.routes().is_empty());
}

#[test]
fn method_not_allowed_is_recorded() {
  let tree = tree(&[
    (Some(Method::GET), "/users/:id"),
    (Some(Method::PUT), "/users/:id"),
    (Some(Method::GET), "/about"),
  ]);

  let mut rctx = Context::new();
  assert!(tree.find_route(&mut rctx, &Method::DELETE, "/users/1").is_none());
  assert!(rctx.method_not_allowed());
  assert_eq!(rctx.methods_allowed(), &[Method::GET, Method::PUT]);

  let mut rctx = Context::new();
  assert!(tree.find_route(&mut rctx, &Method::GET, "/nowhere").is_none());
  assert!(!rctx.method_not_allowed());
  assert!(rctx.methods_allowed().is_empty());
}

#[test]
fn routes_lists_patterns_with_methods() {
  let tree = tree(&[
    (Some(Method::GET), "/b"),
    (Some(Method::POST), "/b"),
    (Some(Method::GET), "/a/:id"),
  ]);

  let listed: Vec<(String, usize)> = tree
    .routes()
    .into_iter()
    .map(|r| (r.pattern, r.handlers.len()))
    .collect();
  assert_eq!(listed, vec![("/a/:id".to_owned(), 1), ("/b".to_owned(), 2)]);
}
