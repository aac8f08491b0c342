//! Placeholder markers standing in for nested fragments.
//!
//! A marker has the exact form `[[cache esi='<json>']]`, where `<json>` is
//! the serialized [`CacheContext`] of the nested fragment. The format is
//! shared with content written by other producers, so it defines no escaping:
//! a payload must never contain `']]`. [`encode`] guarantees this by writing
//! single quotes as the JSON escape `\u0027`; content from elsewhere is taken
//! as-is.

use edge_core::CacheContext;

use crate::error::{CacheError, CacheResult};

/// Opening token of a marker.
pub const MARKER_PREFIX: &str = "[[cache esi='";
/// Closing token of a marker.
pub const MARKER_SUFFIX: &str = "']]";

/// Encode a context as an inline marker.
pub fn encode(context: &CacheContext) -> CacheResult<String> {
    let json = serde_json::to_string(context)?;
    let payload = json.replace('\'', "\\u0027");
    Ok(format!("{}{}{}", MARKER_PREFIX, payload, MARKER_SUFFIX))
}

/// Decode a marker payload back into a context.
pub fn decode(payload: &str) -> CacheResult<CacheContext> {
    let context: CacheContext =
        serde_json::from_str(payload).map_err(|e| CacheError::MalformedPlaceholder {
            payload: payload.to_string(),
            reason: e.to_string(),
        })?;

    if context.cache_id.is_empty() {
        return Err(CacheError::MalformedPlaceholder {
            payload: payload.to_string(),
            reason: "empty cacheId".to_string(),
        });
    }

    Ok(context)
}

/// Decode a complete marker, or a bare payload.
pub fn decode_marker(text: &str) -> CacheResult<CacheContext> {
    let text = text.trim();
    let payload = text
        .strip_prefix(MARKER_PREFIX)
        .and_then(|rest| rest.strip_suffix(MARKER_SUFFIX))
        .unwrap_or(text);
    decode(payload)
}

/// Whether `content` holds at least one complete marker.
pub fn contains_marker(content: &str) -> bool {
    content
        .find(MARKER_PREFIX)
        .is_some_and(|start| content[start + MARKER_PREFIX.len()..].contains(MARKER_SUFFIX))
}

/// A piece of scanned content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Literal text copied verbatim.
    Text(&'a str),
    /// The payload of a marker, without its delimiters.
    Marker(&'a str),
}

/// Split `content` into literal text and marker payloads, in document order.
///
/// An opening token with no closing token after it is literal text.
pub fn segments(content: &str) -> Segments<'_> {
    Segments {
        rest: content,
        pending: None,
    }
}

/// Iterator returned by [`segments`].
#[derive(Debug, Clone)]
pub struct Segments<'a> {
    rest: &'a str,
    pending: Option<&'a str>,
}

impl<'a> Iterator for Segments<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Segment<'a>> {
        if let Some(payload) = self.pending.take() {
            return Some(Segment::Marker(payload));
        }
        if self.rest.is_empty() {
            return None;
        }

        let rest = self.rest;
        let found = rest.find(MARKER_PREFIX).and_then(|start| {
            let body = start + MARKER_PREFIX.len();
            rest[body..]
                .find(MARKER_SUFFIX)
                .map(|len| (start, body, body + len))
        });

        let Some((start, body, end)) = found else {
            self.rest = "";
            return Some(Segment::Text(rest));
        };

        let payload = &rest[body..end];
        self.rest = &rest[end + MARKER_SUFFIX.len()..];

        if start == 0 {
            Some(Segment::Marker(payload))
        } else {
            self.pending = Some(payload);
            Some(Segment::Text(&rest[..start]))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_encode_exact_wire_format() {
        let ctx = CacheContext::new("menu").vary_by("culture");
        assert_eq!(
            encode(&ctx).unwrap(),
            r#"[[cache esi='{"cacheId":"menu","dimensions":["culture"]}']]"#
        );
    }

    #[test]
    fn test_round_trip() {
        let ctx = CacheContext::new("cart")
            .vary_by("user")
            .vary_by("query:page")
            .with_tag("cart")
            .expires_after(Duration::from_secs(300))
            .expires_sliding(Duration::from_millis(1500));

        let marker = encode(&ctx).unwrap();
        assert_eq!(decode_marker(&marker).unwrap(), ctx);
    }

    #[test]
    fn test_single_quotes_are_escaped() {
        let ctx = CacheContext::new("o'brien']]").with_tag("it's");
        let marker = encode(&ctx).unwrap();

        let body = &marker[MARKER_PREFIX.len()..marker.len() - MARKER_SUFFIX.len()];
        assert!(!body.contains('\''));
        assert_eq!(decode_marker(&marker).unwrap(), ctx);
    }

    #[test]
    fn test_decode_rejects_invalid_payloads() {
        assert!(matches!(
            decode("not json"),
            Err(CacheError::MalformedPlaceholder { .. })
        ));
        assert!(matches!(
            decode(r#"{"cacheId":""}"#),
            Err(CacheError::MalformedPlaceholder { .. })
        ));
        assert!(matches!(
            decode(r#"{"dimensions":["x"]}"#),
            Err(CacheError::MalformedPlaceholder { .. })
        ));
    }

    #[test]
    fn test_segments_in_document_order() {
        let content = "pre-[[cache esi='A']]-mid-[[cache esi='B']][[cache esi='C']]-post";
        let parts: Vec<_> = segments(content).collect();
        assert_eq!(
            parts,
            vec![
                Segment::Text("pre-"),
                Segment::Marker("A"),
                Segment::Text("-mid-"),
                Segment::Marker("B"),
                Segment::Marker("C"),
                Segment::Text("-post"),
            ]
        );
    }

    #[test]
    fn test_segments_without_markers() {
        let parts: Vec<_> = segments("<p>plain</p>").collect();
        assert_eq!(parts, vec![Segment::Text("<p>plain</p>")]);
        assert_eq!(segments("").count(), 0);
        assert!(!contains_marker("<p>plain</p>"));
    }

    #[test]
    fn test_unterminated_marker_is_text() {
        let content = "a [[cache esi='{\"cacheId\":\"x\"} tail";
        let parts: Vec<_> = segments(content).collect();
        assert_eq!(parts, vec![Segment::Text(content)]);
        assert!(!contains_marker(content));
    }

    #[test]
    fn test_closing_token_before_opening_is_text() {
        let content = "x']] [[cache esi='P']]";
        let parts: Vec<_> = segments(content).collect();
        assert_eq!(parts, vec![Segment::Text("x']] "), Segment::Marker("P")]);
    }
}
