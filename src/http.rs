#[doc(inline)]
pub use ::http::{header, HeaderMap, Method, StatusCode};

#[doc(inline)]
pub use hyper::Body;

/// The type of an incoming web request.
pub type Request = hyper::Request<hyper::Body>;

/// An HTTP Response.
pub type Response = hyper::Response<hyper::Body>;

/// The error type returned by a failing handler.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
