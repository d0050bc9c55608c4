//! Ergonomic decorators over [`http`] request and response values.
//!
//! [`ServerRequest`] wraps a buffered [`http::Request`] and adds
//! content-negotiated body parsing with a pluggable, per-request parser
//! registry, along with media-type helpers and parameter access.
//! [`Response`] adds construction shortcuts for JSON payloads, redirects and
//! file downloads, plus status-code predicates.
//!
//! ```
//! use ibis::{Body, ServerRequest};
//!
//! let request = http::Request::builder()
//!     .method("POST")
//!     .uri("https://example.com/login")
//!     .header("Content-Type", "application/json")
//!     .body(Body::from(r#"{"user":"crab"}"#))
//!     .map(ServerRequest::from)
//!     .unwrap();
//!
//! let body = request.parsed_body().unwrap();
//! assert_eq!(body.unwrap()["user"], "crab");
//! ```

mod body;
mod form;
mod media_type;
mod parser;
mod request;
mod response;

#[cfg(feature = "xml")]
mod xml;

pub use body::Body;
pub use parser::{BodyParser, ParseBodyError};
pub use request::ServerRequest;
pub use response::{JsonError, Response};

pub use http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri, Version};
pub use serde_json::Value;
