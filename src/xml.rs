//! XML body decoding into a generic value tree.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};

use std::str;

/// Parse an XML document into a mapping of the root element's children.
///
/// Text-only elements collapse to strings, repeated siblings accumulate
/// into arrays, attributes become `@`-prefixed keys and mixed content keeps
/// its text under `#text`. Returns `None` for any document that is not
/// well-formed; nothing is reported elsewhere.
pub(crate) fn parse(input: &str) -> Option<Value> {
    let mut reader = Reader::from_str(input);
    let mut stack: Vec<Frame> = Vec::new();
    let mut document = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                if stack.is_empty() && document.is_some() {
                    // a second root element
                    return None;
                }
                stack.push(open_frame(&start)?);
            }
            Ok(Event::Empty(start)) => {
                let frame = open_frame(&start)?;
                match stack.last_mut() {
                    Some(parent) => {
                        let (name, value) = close_child(frame);
                        add_child(&mut parent.entries, name, value);
                    }
                    None if document.is_none() => document = Some(close_root(frame)),
                    None => return None,
                }
            }
            Ok(Event::End(_)) => {
                let frame = stack.pop()?;
                match stack.last_mut() {
                    Some(parent) => {
                        let (name, value) = close_child(frame);
                        add_child(&mut parent.entries, name, value);
                    }
                    None => document = Some(close_root(frame)),
                }
            }
            Ok(Event::Text(text)) => {
                if let Some(frame) = stack.last_mut() {
                    let decoded = text.unescape().ok()?;
                    let trimmed = decoded.trim();
                    if !trimmed.is_empty() {
                        frame.text.push_str(trimmed);
                    }
                }
            }
            Ok(Event::CData(cdata)) => {
                if let Some(frame) = stack.last_mut() {
                    let raw = cdata.into_inner();
                    frame.text.push_str(str::from_utf8(&raw).ok()?);
                }
            }
            Ok(Event::Eof) => {
                return if stack.is_empty() { document } else { None };
            }
            // declarations, comments, processing instructions
            Ok(_) => {}
            Err(_) => return None,
        }
    }
}

struct Frame {
    name: String,
    entries: Map<String, Value>,
    text: String,
}

fn open_frame(start: &BytesStart<'_>) -> Option<Frame> {
    let name = str::from_utf8(start.name().as_ref()).ok()?.to_owned();

    let mut entries = Map::new();
    for attr in start.attributes() {
        let attr = attr.ok()?;
        let key = format!("@{}", str::from_utf8(attr.key.as_ref()).ok()?);
        let value = attr.unescape_value().ok()?;
        entries.insert(key, Value::String(value.into_owned()));
    }

    Some(Frame {
        name,
        entries,
        text: String::new(),
    })
}

fn close_child(frame: Frame) -> (String, Value) {
    let Frame {
        name,
        mut entries,
        text,
    } = frame;

    let value = if entries.is_empty() {
        Value::String(text)
    } else {
        if !text.is_empty() {
            entries.insert("#text".to_owned(), Value::String(text));
        }
        Value::Object(entries)
    };

    (name, value)
}

/// The root element itself is the document: its children and attributes
/// form the top-level mapping.
fn close_root(frame: Frame) -> Value {
    let Frame {
        mut entries, text, ..
    } = frame;

    if !text.is_empty() {
        entries.insert("#text".to_owned(), Value::String(text));
    }

    Value::Object(entries)
}

fn add_child(entries: &mut Map<String, Value>, name: String, value: Value) {
    match entries.get_mut(&name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            entries.insert(name, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::parse;
    use serde_json::json;

    #[test]
    fn children_of_the_root() {
        assert_eq!(
            parse("<person><name>John</name></person>"),
            Some(json!({"name": "John"}))
        );
    }

    #[test]
    fn nested_elements() {
        assert_eq!(
            parse("<person><name>John</name><address><city>NYC</city></address></person>"),
            Some(json!({"name": "John", "address": {"city": "NYC"}}))
        );
    }

    #[test]
    fn repeated_siblings_accumulate() {
        assert_eq!(
            parse("<list><item>1</item><item>2</item><item>3</item></list>"),
            Some(json!({"item": ["1", "2", "3"]}))
        );
    }

    #[test]
    fn attributes_are_prefixed() {
        assert_eq!(
            parse(r#"<person id="123"><name lang="en">John</name></person>"#),
            Some(json!({"@id": "123", "name": {"@lang": "en", "#text": "John"}}))
        );
    }

    #[test]
    fn empty_elements() {
        assert_eq!(parse("<a/>"), Some(json!({})));
        assert_eq!(parse("<a><b/></a>"), Some(json!({"b": ""})));
        assert_eq!(
            parse(r#"<a><b id="1"/></a>"#),
            Some(json!({"b": {"@id": "1"}}))
        );
    }

    #[test]
    fn cdata_is_text() {
        assert_eq!(
            parse("<root><![CDATA[<html>content</html>]]></root>"),
            Some(json!({"#text": "<html>content</html>"}))
        );
    }

    #[test]
    fn entities_are_unescaped() {
        assert_eq!(
            parse("<a><b>fish &amp; chips</b></a>"),
            Some(json!({"b": "fish & chips"}))
        );
    }

    #[test]
    fn malformed_documents_are_rejected() {
        assert_eq!(parse("<person><name>John</name></invalid"), None);
        assert_eq!(parse("<person><name>John</name>"), None);
        assert_eq!(parse("not xml at all"), None);
        assert_eq!(parse(""), None);
    }

    #[test]
    fn multiple_roots_are_rejected() {
        assert_eq!(parse("<a/><b/>"), None);
        assert_eq!(parse("<a></a><b></b>"), None);
    }

    #[test]
    fn declaration_is_ignored() {
        assert_eq!(
            parse("<?xml version=\"1.0\"?><person><name>John</name></person>"),
            Some(json!({"name": "John"}))
        );
    }
}
