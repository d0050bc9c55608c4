//! URL-encoded form decoding.

use serde_json::{Map, Value};

/// Decode a urlencoded payload into a JSON object.
///
/// Later duplicate keys overwrite earlier ones, `k[]` accumulates values
/// into an array and `k[sub]` nests into an object. Returns `None` when the
/// payload cannot be percent-decoded.
pub(crate) fn parse(input: &str) -> Option<Value> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(input).ok()?;

    let mut root = Map::new();
    for (key, value) in pairs {
        insert_pair(&mut root, &key, value);
    }

    Some(Value::Object(root))
}

fn insert_pair(map: &mut Map<String, Value>, key: &str, value: String) {
    let path = key.find('[').and_then(|start| {
        let segments = bracket_segments(&key[start..])?;
        Some((&key[..start], segments))
    });

    match path {
        Some((base, segments)) if !base.is_empty() => {
            let slot = map.entry(base.to_owned()).or_insert(Value::Null);
            set_path(slot, &segments, value);
        }
        // no brackets, or a key the bracket syntax does not apply to
        _ => {
            map.insert(key.to_owned(), Value::String(value));
        }
    }
}

/// Split a `[a][b][]` trailer into its segments. Returns `None` when the
/// brackets are unbalanced or interleaved with other characters.
fn bracket_segments(path: &str) -> Option<Vec<&str>> {
    let mut segments = Vec::new();
    let mut rest = path;

    while !rest.is_empty() {
        let inner = rest.strip_prefix('[')?;
        let end = inner.find(']')?;
        segments.push(&inner[..end]);
        rest = &inner[end + 1..];
    }

    Some(segments)
}

fn set_path(slot: &mut Value, segments: &[&str], value: String) {
    match segments.split_first() {
        None => *slot = Value::String(value),
        // `k[]` appends
        Some((segment, rest)) if segment.is_empty() => {
            let mut next = Value::Null;
            set_path(&mut next, rest, value);

            match slot {
                Value::Array(items) => items.push(next),
                other => *other = Value::Array(vec![next]),
            }
        }
        // `k[sub]` nests
        Some((segment, rest)) => match slot {
            Value::Object(map) => {
                let entry = map.entry(segment.to_owned()).or_insert(Value::Null);
                set_path(entry, rest, value);
            }
            other => {
                let mut map = Map::new();
                let entry = map.entry(segment.to_owned()).or_insert(Value::Null);
                set_path(entry, rest, value);
                *other = Value::Object(map);
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::parse;
    use serde_json::json;

    #[test]
    fn flat_pairs() {
        assert_eq!(parse("foo=bar"), Some(json!({"foo": "bar"})));
        assert_eq!(
            parse("foo=bar&abc=123"),
            Some(json!({"foo": "bar", "abc": "123"}))
        );
    }

    #[test]
    fn empty_input() {
        assert_eq!(parse(""), Some(json!({})));
    }

    #[test]
    fn percent_decoding() {
        assert_eq!(
            parse("name=John+Doe&city=S%C3%A3o+Paulo"),
            Some(json!({"name": "John Doe", "city": "São Paulo"}))
        );
    }

    #[test]
    fn later_duplicates_overwrite() {
        assert_eq!(parse("foo=1&foo=2"), Some(json!({"foo": "2"})));
        assert_eq!(parse("a[b]=1&a[b]=2"), Some(json!({"a": {"b": "2"}})));
    }

    #[test]
    fn empty_brackets_accumulate() {
        assert_eq!(parse("a[]=1&a[]=2"), Some(json!({"a": ["1", "2"]})));
    }

    #[test]
    fn named_brackets_nest() {
        assert_eq!(parse("a[b]=c"), Some(json!({"a": {"b": "c"}})));
        assert_eq!(
            parse("a[b][c]=1&a[b][d]=2"),
            Some(json!({"a": {"b": {"c": "1", "d": "2"}}}))
        );
    }

    #[test]
    fn mixed_bracket_styles() {
        assert_eq!(
            parse("a[b][]=1&a[b][]=2"),
            Some(json!({"a": {"b": ["1", "2"]}}))
        );
    }

    #[test]
    fn scalar_replaced_by_container() {
        assert_eq!(parse("a=1&a[b]=2"), Some(json!({"a": {"b": "2"}})));
        assert_eq!(parse("a=1&a[]=2"), Some(json!({"a": ["2"]})));
    }

    #[test]
    fn malformed_brackets_are_literal_keys() {
        assert_eq!(parse("a%5Bb=1"), Some(json!({"a[b": "1"})));
    }

    #[test]
    fn value_without_separator_is_empty() {
        assert_eq!(parse("foo"), Some(json!({"foo": ""})));
    }
}
