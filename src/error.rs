use crate::http::Method;
use thiserror::Error;

/// Errors raised while registering routes on a [`Router`](crate::Router).
///
/// These are configuration mistakes rather than request-time conditions, so
/// the router's registration methods treat every variant as fatal.
#[non_exhaustive]
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum RouteError {
  /// Routing patterns must begin with `/`.
  #[error("routing pattern must begin with '/' in '{0}'")]
  MissingLeadingSlash(String),

  /// Parameters must be registered with a name, ex: `/:id`.
  #[error("parameters must be registered with a name in '{0}'")]
  UnnamedParam(String),

  /// The same parameter name appears twice in one pattern.
  #[error("routing pattern '{pattern}' contains duplicate param key '{key}'")]
  DuplicateParam { pattern: String, key: String },

  /// A wildcard `*` may only appear as the final segment.
  #[error("wildcard '*' must be the last segment in '{0}'")]
  InvalidWildcard(String),

  /// A handler is already registered for this method and pattern shape.
  #[error("a handler for '{method}' is already registered on '{pattern}'")]
  Conflict { method: String, pattern: String },

  /// Two mounts cannot share a path.
  #[error("attempting to mount a handler on an existing path, '{0}'")]
  MountConflict(String),

  /// `use_middleware` was called after the first route was registered.
  #[error("all middlewares must be defined before routes on a router")]
  MiddlewareAfterRoutes,

  /// The method name is not one of the supported HTTP methods.
  #[error("'{0}' http method is not supported")]
  UnsupportedMethod(String),
}

impl RouteError {
  pub(crate) fn conflict(method: Option<&Method>, pattern: &str) -> Self {
    RouteError::Conflict {
      method: method.map_or_else(|| "*".to_owned(), |m| m.to_string()),
      pattern: pattern.to_owned(),
    }
  }
}
