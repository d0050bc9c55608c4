use http::header::{self, HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue};
use http::{StatusCode, Version};
use mime::Mime;
use serde::Serialize;

use crate::Body;

use std::fmt;

/// An HTTP response decorated with construction shortcuts and status
/// predicates.
///
/// Like [`ServerRequest`](crate::ServerRequest), the response is an
/// immutable value: every `with_*` method consumes it and returns a new
/// value carrying the change.
#[derive(Clone, Debug, Default)]
pub struct Response {
    status: StatusCode,
    version: Version,
    headers: HeaderMap,
    body: Body,
}

impl Response {
    /// Create an empty response with the given status.
    pub fn new(status: StatusCode) -> Response {
        Response {
            status,
            ..Response::default()
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
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

    pub fn with_status(mut self, status: StatusCode) -> Response {
        self.status = status;
        self
    }

    pub fn with_version(mut self, version: Version) -> Response {
        self.version = version;
        self
    }

    /// Replace all values of a header.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Response {
        self.headers.insert(name, value);
        self
    }

    /// Append a header value, keeping any existing ones.
    pub fn with_added_header(mut self, name: HeaderName, value: HeaderValue) -> Response {
        self.headers.append(name, value);
        self
    }

    pub fn without_header(mut self, name: &HeaderName) -> Response {
        self.headers.remove(name);
        self
    }

    pub fn with_body(mut self, body: impl Into<Body>) -> Response {
        self.body = body.into();
        self
    }

    /// Serialize `data` into the body and set the `Content-Type` header to
    /// `application/json`.
    pub fn with_json<T>(self, data: &T) -> Result<Response, JsonError>
    where
        T: Serialize + ?Sized,
    {
        let json = serde_json::to_string(data).map_err(JsonError)?;

        Ok(self
            .with_header(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            )
            .with_body(json))
    }

    /// [`with_json`](Self::with_json) plus a status code.
    pub fn with_json_status<T>(self, data: &T, status: StatusCode) -> Result<Response, JsonError>
    where
        T: Serialize + ?Sized,
    {
        Ok(self.with_json(data)?.with_status(status))
    }

    /// Redirect to `location` with a `302 Found` status.
    pub fn with_redirect(self, location: &str) -> Result<Response, InvalidHeaderValue> {
        self.with_redirect_status(location, StatusCode::FOUND)
    }

    /// Redirect to `location` with the given status.
    pub fn with_redirect_status(
        self,
        location: &str,
        status: StatusCode,
    ) -> Result<Response, InvalidHeaderValue> {
        Ok(self
            .with_header(header::LOCATION, HeaderValue::from_str(location)?)
            .with_status(status))
    }

    /// Replace the body with a file payload, served inline.
    ///
    /// `content_type` overrides the `Content-Type` header; when `None` it
    /// defaults to `application/octet-stream`.
    pub fn with_file(self, file: impl Into<Body>, content_type: Option<Mime>) -> Response {
        let mime = content_type.unwrap_or(mime::APPLICATION_OCTET_STREAM);
        let mut response = self.with_body(file);

        if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
            response = response.with_header(header::CONTENT_TYPE, value);
        }

        response
    }

    /// Replace the body with a file payload served as an attachment.
    ///
    /// Adds a `Content-Disposition: attachment` header carrying `name` both
    /// quoted (control characters and `"` replaced with spaces) and in the
    /// percent-encoded `filename*` form.
    pub fn with_file_download(
        self,
        file: impl Into<Body>,
        name: Option<&str>,
        content_type: Option<Mime>,
    ) -> Response {
        let mut disposition = String::from("attachment");

        if let Some(name) = name.filter(|name| !name.is_empty()) {
            let quoted: String = name
                .chars()
                .map(|c| if c.is_ascii_control() || c == '"' { ' ' } else { c })
                .collect();

            disposition.push_str(&format!("; filename=\"{}\"", quoted));
            disposition.push_str(&format!("; filename*=UTF-8''{}", urlencoding::encode(name)));
        }

        let mut response = self.with_file(file, content_type);

        if let Ok(value) = HeaderValue::from_str(&disposition) {
            response = response.with_header(header::CONTENT_DISPOSITION, value);
        }

        response
    }

    /// 1xx.
    pub fn is_informational(&self) -> bool {
        self.status.is_informational()
    }

    /// Exactly `200 OK`.
    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::OK
    }

    /// 2xx.
    pub fn is_successful(&self) -> bool {
        self.status.is_success()
    }

    /// One of the redirect statuses carrying a `Location` target: 301, 302,
    /// 303, 307 or 308.
    pub fn is_redirect(&self) -> bool {
        matches!(self.status.as_u16(), 301 | 302 | 303 | 307 | 308)
    }

    /// 3xx.
    pub fn is_redirection(&self) -> bool {
        self.status.is_redirection()
    }

    /// Exactly `403 Forbidden`.
    pub fn is_forbidden(&self) -> bool {
        self.status == StatusCode::FORBIDDEN
    }

    /// Exactly `404 Not Found`.
    pub fn is_not_found(&self) -> bool {
        self.status == StatusCode::NOT_FOUND
    }

    /// 4xx.
    pub fn is_client_error(&self) -> bool {
        self.status.is_client_error()
    }

    /// 5xx.
    pub fn is_server_error(&self) -> bool {
        self.status.is_server_error()
    }

    /// A status that forbids a message body: 204, 205 or 304.
    pub fn is_empty(&self) -> bool {
        matches!(self.status.as_u16(), 204 | 205 | 304)
    }

    /// Unwrap the decorator into the underlying [`http::Response`].
    pub fn into_response(self) -> http::Response<Body> {
        let mut response = http::Response::new(self.body);
        *response.status_mut() = self.status;
        *response.version_mut() = self.version;
        *response.headers_mut() = self.headers;
        response
    }
}

impl<B> From<http::Response<B>> for Response
where
    B: Into<Body>,
{
    fn from(response: http::Response<B>) -> Response {
        let (parts, body) = response.into_parts();

        Response {
            status: parts.status,
            version: parts.version,
            headers: parts.headers,
            body: body.into(),
        }
    }
}

/// Renders the status line, headers and body with CRLF line endings.
impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HTTP/{} {} {}\r\n",
            version_str(self.version),
            self.status.as_u16(),
            self.status.canonical_reason().unwrap_or("")
        )?;

        for name in self.headers.keys() {
            write!(f, "{}: {}\r\n", name, self.header_line(name.as_str()))?;
        }

        write!(f, "\r\n{}", self.body.text())
    }
}

fn version_str(version: Version) -> &'static str {
    if version == Version::HTTP_09 {
        "0.9"
    } else if version == Version::HTTP_10 {
        "1.0"
    } else if version == Version::HTTP_2 {
        "2.0"
    } else if version == Version::HTTP_3 {
        "3.0"
    } else {
        "1.1"
    }
}

/// The error returned by [`Response::with_json`] when the value cannot be
/// serialized.
#[derive(Debug)]
pub struct JsonError(serde_json::Error);

impl fmt::Display for JsonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to encode response body as json: {}", self.0)
    }
}

impl std::error::Error for JsonError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}
