use serde_json::Value;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A media-type body parser.
///
/// A parser receives the full body text and returns the decoded structure,
/// or `None` when the payload cannot be decoded. A `Some` result must be an
/// object or an array; anything else is reported as a [`ParseBodyError`]
/// when the body is parsed.
pub type BodyParser = Arc<dyn Fn(&str) -> Option<Value> + Send + Sync>;

/// The parsers every request starts with.
pub(crate) fn default_parsers() -> HashMap<String, BodyParser> {
    let mut parsers: HashMap<String, BodyParser> = HashMap::new();

    parsers.insert("application/json".to_owned(), Arc::new(parse_json));

    #[cfg(feature = "xml")]
    {
        let xml: BodyParser = Arc::new(parse_xml);
        parsers.insert("application/xml".to_owned(), xml.clone());
        parsers.insert("text/xml".to_owned(), xml);
    }

    parsers.insert(
        "application/x-www-form-urlencoded".to_owned(),
        Arc::new(parse_form),
    );

    parsers
}

fn parse_json(input: &str) -> Option<Value> {
    match serde_json::from_str(input) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => Some(value),
        Ok(_) => None,
        Err(err) => {
            log::debug!("discarding request body that failed to decode as json: {}", err);
            None
        }
    }
}

#[cfg(feature = "xml")]
fn parse_xml(input: &str) -> Option<Value> {
    let parsed = crate::xml::parse(input);

    if parsed.is_none() {
        log::debug!("discarding request body that failed to parse as xml");
    }

    parsed
}

fn parse_form(input: &str) -> Option<Value> {
    let parsed = crate::form::parse(input);

    if parsed.is_none() {
        log::debug!("discarding request body that failed to decode as a form");
    }

    parsed
}

/// The error returned by [`parsed_body`](crate::ServerRequest::parsed_body)
/// when a registered parser breaks the output contract.
#[derive(Debug)]
pub struct ParseBodyError {
    media_type: String,
}

impl ParseBodyError {
    pub(crate) fn new(media_type: &str) -> ParseBodyError {
        ParseBodyError {
            media_type: media_type.to_owned(),
        }
    }

    /// The media type whose parser misbehaved.
    pub fn media_type(&self) -> &str {
        &self.media_type
    }
}

impl fmt::Display for ParseBodyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "request body parser for '{}' must return an object, an array, or null",
            self.media_type
        )
    }
}

impl std::error::Error for ParseBodyError {}
