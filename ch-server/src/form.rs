//! Form decoding for page requests.

use url::form_urlencoded;

use ch_core::context::FormData;

/// Decode an `application/x-www-form-urlencoded` string. A bare name
/// (`?get`) decodes to an empty value.
pub fn parse_urlencoded(input: &str) -> FormData {
    FormData::from_pairs(
        form_urlencoded::parse(input.as_bytes()).map(|(k, v)| (k.into_owned(), v.into_owned())),
    )
}

/// Form for a page request: query fields overlaid with body fields.
pub fn merge(query: Option<&str>, body: &[u8]) -> FormData {
    let mut form = query.map(parse_urlencoded).unwrap_or_default();
    if !body.is_empty() {
        form.extend(parse_urlencoded(&String::from_utf8_lossy(body)));
    }
    form
}
