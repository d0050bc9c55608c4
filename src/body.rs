use bytes::Bytes;

use std::borrow::Cow;
use std::fmt;

/// A fully buffered HTTP message payload.
///
/// Parsing operates on the complete payload, so the body is stored as a
/// contiguous byte buffer rather than a stream.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Body(Bytes);

impl Body {
    /// Create an empty `Body`.
    pub fn empty() -> Body {
        Body(Bytes::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }

    /// The payload as text.
    ///
    /// Invalid UTF-8 sequences are replaced with `U+FFFD`.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Body {
        Body(bytes)
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Body {
        Body(bytes.into())
    }
}

impl From<String> for Body {
    fn from(string: String) -> Body {
        Body(string.into())
    }
}

impl From<&'static str> for Body {
    fn from(str: &'static str) -> Body {
        Body(Bytes::from_static(str.as_bytes()))
    }
}

impl From<&'static [u8]> for Body {
    fn from(bytes: &'static [u8]) -> Body {
        Body(Bytes::from_static(bytes))
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Body").field("len", &self.len()).finish()
    }
}
