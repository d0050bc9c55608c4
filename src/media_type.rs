//! String transforms over the `Content-Type` header value.

/// Derive the media type from a `Content-Type` header value.
///
/// The header is split on `;` or `,`; the first segment is trimmed and
/// lower-cased. Returns `None` when no media type remains.
pub(crate) fn media_type(content_type: &str) -> Option<String> {
    let first = content_type.split([';', ',']).next()?.trim();

    if first.is_empty() {
        return None;
    }

    Some(first.to_ascii_lowercase())
}

/// The parameters following the media type, in header order.
///
/// Parameter names are lower-cased; segments without a `=` are skipped.
pub(crate) fn media_type_params(content_type: &str) -> Vec<(String, String)> {
    content_type
        .split([';', ','])
        .skip(1)
        .filter_map(|segment| {
            let (name, value) = segment.split_once('=')?;
            Some((name.trim().to_ascii_lowercase(), value.trim().to_owned()))
        })
        .collect()
}

/// Rewrite a media type with a structured-syntax suffix (RFC 6839) to the
/// `application/<suffix>` form, e.g. `application/vnd.api+json` to
/// `application/json`.
pub(crate) fn suffix_fallback(media_type: &str) -> Option<String> {
    let (_, suffix) = media_type.rsplit_once('+')?;
    Some(format!("application/{}", suffix))
}
