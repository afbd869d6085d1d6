use crate::error::LinkError;
use crate::types::DecodedLink;
use percent_encoding::percent_decode_str;

const PHONE_SEGMENT: usize = 3;
const TEXT_PREFIX: &str = "text=";

/// Splits a `scheme://host/<digits>?text=<encoded>` link into the raw phone
/// segment and the decoded message. A link without a query yields an empty
/// message. The phone segment is returned as-is, even when empty.
pub fn decode_link(link: &str) -> Result<DecodedLink, LinkError> {
    let (address, query) = match link.split_once('?') {
        Some((address, query)) => (address, Some(query)),
        None => (link, None),
    };

    let phone = address
        .split('/')
        .nth(PHONE_SEGMENT)
        .ok_or_else(|| LinkError::Malformed {
            link: link.to_string(),
        })?;

    let message = query
        .map(|q| decode_query_value(q.strip_prefix(TEXT_PREFIX).unwrap_or(q)))
        .unwrap_or_default();

    Ok(DecodedLink {
        phone: phone.to_string(),
        message,
    })
}

/// Query-string decoding: `+` is a space, then percent escapes.
pub fn decode_query_value(value: &str) -> String {
    let spaced = value.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}
