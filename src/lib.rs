//! A lightweight HTTP request router.
//!
//! Routes are stored in a prefix tree keyed by path segment, with support for
//! named parameters (`/users/:id`), trailing wildcards (`/files/*`),
//! per-router and per-route middleware stacks, and mounting independent
//! routers under a common prefix.
#![forbid(unsafe_code)]

pub mod config;
pub mod context;
pub mod endpoint;
mod error;
pub mod handler;
pub mod http;
pub mod middleware;
pub mod route;
pub mod router;
pub mod server;
pub mod service;
pub mod tree;

pub use config::ServerConfig;
pub use context::{url_param, Context, RouteContext, RouteParams};
pub use error::RouteError;
pub use handler::{handler_fn, BoxHandler, Handler};
pub use crate::http::{BoxError, Method, Request, Response};
pub use middleware::{chain, Middleware, Middlewares};
pub use route::{walk, Route, Routes};
pub use router::Router;
pub use server::launch;
