use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use http::{Method, Uri, Version};
use once_cell::sync::OnceCell;
use serde_json::{Map, Value};

use crate::parser::{self, BodyParser, ParseBodyError};
use crate::{form, media_type, Body};

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// An HTTP request decorated with body parsing and parameter access.
///
/// The request is an immutable value: every `with_*` method consumes it and
/// returns a new value carrying the change, including a copy of the parser
/// registry.
///
/// Body parsing is driven by the `Content-Type` header. Parsers for
/// `application/json`, `application/xml`, `text/xml` and
/// `application/x-www-form-urlencoded` are registered at construction;
/// [`register_media_type_parser`](ServerRequest::register_media_type_parser)
/// adds or replaces entries.
#[derive(Clone)]
pub struct ServerRequest {
    method: Method,
    uri: Uri,
    version: Version,
    headers: HeaderMap,
    body: Body,
    parsers: HashMap<String, BodyParser>,
    parsed: Option<Value>,
    parse_cache: OnceCell<Option<Value>>,
    query: Option<Value>,
    query_cache: OnceCell<Value>,
}

impl ServerRequest {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    /// All values of the given header joined with `, `, or an empty string
    /// when the header is absent.
    pub fn header_line(&self, name: &str) -> String {
        let values: Vec<&str> = self
            .headers
            .get_all(name)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect();

        values.join(", ")
    }

    /// The raw `Content-Type` header value, if present.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(header::CONTENT_TYPE)?.to_str().ok()
    }

    /// The parsed `Content-Length` header value, if present.
    pub fn content_length(&self) -> Option<u64> {
        self.headers
            .get(header::CONTENT_LENGTH)?
            .to_str()
            .ok()?
            .trim()
            .parse()
            .ok()
    }

    /// The request media type: the `Content-Type` value lower-cased, minus
    /// any parameters.
    pub fn media_type(&self) -> Option<String> {
        media_type::media_type(self.content_type()?)
    }

    /// The `Content-Type` parameters in header order, names lower-cased.
    pub fn media_type_params(&self) -> Vec<(String, String)> {
        self.content_type()
            .map(media_type::media_type_params)
            .unwrap_or_default()
    }

    /// The `charset` media-type parameter, if present.
    pub fn content_charset(&self) -> Option<String> {
        self.media_type_params()
            .into_iter()
            .find(|(name, _)| name == "charset")
            .map(|(_, value)| value)
    }

    /// The body parsed according to the request media type.
    ///
    /// A non-empty value set via [`with_parsed_body`](Self::with_parsed_body)
    /// is returned as-is. Otherwise the registry is consulted for the media
    /// type, falling back to the `application/<suffix>` form for media types
    /// with a structured-syntax suffix (RFC 6839), and the matching parser
    /// runs over the full body text. The first result is cached, so repeated
    /// calls never re-run a parser.
    ///
    /// `Ok(None)` covers every recoverable case: no `Content-Type`, no
    /// registered parser, or a payload the parser could not decode. The only
    /// error is a registered parser returning something other than an
    /// object, an array, or null.
    pub fn parsed_body(&self) -> Result<Option<&Value>, ParseBodyError> {
        if let Some(parsed) = &self.parsed {
            if !is_empty_value(parsed) {
                return Ok(Some(parsed));
            }
        }

        let media_type = match self.media_type() {
            Some(media_type) => media_type,
            None => return Ok(self.parsed.as_ref()),
        };

        let parser = match self.parsers.get(&media_type) {
            Some(parser) => Some(parser),
            None => media_type::suffix_fallback(&media_type).and_then(|derived| {
                let parser = self.parsers.get(&derived);
                if parser.is_some() {
                    log::debug!("resolved media type '{}' as '{}'", media_type, derived);
                }
                parser
            }),
        };

        let parser: &dyn Fn(&str) -> Option<Value> = match parser {
            Some(parser) => &**parser,
            None => return Ok(None),
        };

        let parsed = self.parse_cache.get_or_try_init(|| {
            match parser(&self.body.text()) {
                None | Some(Value::Null) => Ok(None),
                Some(value @ (Value::Object(_) | Value::Array(_))) => Ok(Some(value)),
                // a scalar is a bug in the registered parser, not bad input
                Some(_) => Err(ParseBodyError::new(&media_type)),
            }
        })?;

        Ok(parsed.as_ref())
    }

    /// The decoded query string.
    ///
    /// A non-empty value set via [`with_query_params`](Self::with_query_params)
    /// wins; otherwise the URI query is decoded with the same shaping rules
    /// as form bodies and cached. Always an object.
    pub fn query_params(&self) -> &Value {
        if let Some(query) = &self.query {
            if !is_empty_value(query) {
                return query;
            }
        }

        self.query_cache.get_or_init(|| {
            self.uri
                .query()
                .and_then(form::parse)
                .unwrap_or(Value::Object(Map::new()))
        })
    }

    /// Fetch a parameter from the body or the query string, in that order.
    pub fn param(&self, key: &str) -> Result<Option<&Value>, ParseBodyError> {
        if let Some(value) = self.parsed_body()?.and_then(|body| body.get(key)) {
            return Ok(Some(value));
        }

        Ok(self.query_params().get(key))
    }

    /// Query-string and body parameters merged into one object, body
    /// entries winning. Non-object parsed bodies contribute nothing.
    pub fn params(&self) -> Result<Value, ParseBodyError> {
        let mut params = match self.query_params() {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };

        if let Some(Value::Object(body)) = self.parsed_body()? {
            for (key, value) in body {
                params.insert(key.clone(), value.clone());
            }
        }

        Ok(Value::Object(params))
    }

    /// Fetch a parameter from the parsed body.
    pub fn parsed_body_param(&self, key: &str) -> Result<Option<&Value>, ParseBodyError> {
        Ok(self.parsed_body()?.and_then(|body| body.get(key)))
    }

    /// Fetch a parameter from the query string.
    pub fn query_param(&self, key: &str) -> Option<&Value> {
        self.query_params().get(key)
    }

    /// Register a parser for a media type, replacing any previous entry for
    /// the same key.
    pub fn register_media_type_parser<F>(
        mut self,
        media_type: impl Into<String>,
        parser: F,
    ) -> ServerRequest
    where
        F: Fn(&str) -> Option<Value> + Send + Sync + 'static,
    {
        self.parsers.insert(media_type.into(), Arc::new(parser));
        self.parse_cache = OnceCell::new();
        self
    }

    pub fn is_method(&self, method: &Method) -> bool {
        self.method == *method
    }

    pub fn is_get(&self) -> bool {
        self.method == Method::GET
    }

    pub fn is_post(&self) -> bool {
        self.method == Method::POST
    }

    pub fn is_put(&self) -> bool {
        self.method == Method::PUT
    }

    pub fn is_patch(&self) -> bool {
        self.method == Method::PATCH
    }

    pub fn is_delete(&self) -> bool {
        self.method == Method::DELETE
    }

    pub fn is_head(&self) -> bool {
        self.method == Method::HEAD
    }

    pub fn is_options(&self) -> bool {
        self.method == Method::OPTIONS
    }

    /// Whether the request was made with `XMLHttpRequest`.
    pub fn is_xhr(&self) -> bool {
        self.header_line("x-requested-with") == "XMLHttpRequest"
    }

    pub fn with_method(mut self, method: Method) -> ServerRequest {
        self.method = method;
        self
    }

    pub fn with_uri(mut self, uri: Uri) -> ServerRequest {
        self.uri = uri;
        self.query_cache = OnceCell::new();
        self
    }

    pub fn with_version(mut self, version: Version) -> ServerRequest {
        self.version = version;
        self
    }

    /// Replace all values of a header.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> ServerRequest {
        self.headers.insert(name, value);
        self.parse_cache = OnceCell::new();
        self
    }

    /// Append a header value, keeping any existing ones.
    pub fn with_added_header(mut self, name: HeaderName, value: HeaderValue) -> ServerRequest {
        self.headers.append(name, value);
        self.parse_cache = OnceCell::new();
        self
    }

    pub fn without_header(mut self, name: &HeaderName) -> ServerRequest {
        self.headers.remove(name);
        self.parse_cache = OnceCell::new();
        self
    }

    pub fn with_body(mut self, body: impl Into<Body>) -> ServerRequest {
        self.body = body.into();
        self.parse_cache = OnceCell::new();
        self
    }

    /// Set the parsed body explicitly, overriding parsing.
    pub fn with_parsed_body(mut self, parsed: Option<Value>) -> ServerRequest {
        self.parsed = parsed;
        self.parse_cache = OnceCell::new();
        self
    }

    /// Set the query parameters explicitly, overriding the URI query.
    pub fn with_query_params(mut self, query: Map<String, Value>) -> ServerRequest {
        self.query = Some(Value::Object(query));
        self.query_cache = OnceCell::new();
        self
    }

    /// Unwrap the decorator into the underlying [`http::Request`].
    pub fn into_request(self) -> http::Request<Body> {
        let mut request = http::Request::new(self.body);
        *request.method_mut() = self.method;
        *request.uri_mut() = self.uri;
        *request.version_mut() = self.version;
        *request.headers_mut() = self.headers;
        request
    }
}

impl<B> From<http::Request<B>> for ServerRequest
where
    B: Into<Body>,
{
    fn from(request: http::Request<B>) -> ServerRequest {
        let (parts, body) = request.into_parts();

        ServerRequest {
            method: parts.method,
            uri: parts.uri,
            version: parts.version,
            headers: parts.headers,
            body: body.into(),
            parsers: parser::default_parsers(),
            parsed: None,
            parse_cache: OnceCell::new(),
            query: None,
            query_cache: OnceCell::new(),
        }
    }
}

impl fmt::Debug for ServerRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerRequest")
            .field("method", &self.method)
            .field("uri", &self.uri)
            .field("version", &self.version)
            .field("headers", &self.headers)
            .field("body", &self.body)
            .finish()
    }
}

/// Emptiness in the sense the parsed-body cache uses: null and empty
/// containers do not short-circuit parsing.
fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
