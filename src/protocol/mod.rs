//! Output protocol for the sandboxed render program.
//!
//! The render program shares its stdout with whatever the imported component
//! graph decides to print, so the structured result is fenced between fixed
//! delimiter tokens and extracted with a single bounded match. Everything
//! outside the fence is ignored; a missing or malformed fence is an explicit
//! error, never an empty result.

use regex::Regex;
use rustc_hash::FxHashMap;
use std::sync::OnceLock;
use thiserror::Error;

/// Opening fence written by the synthesized program.
pub const OUTPUT_START: &str = "<prerenderOutput>";
/// Closing fence written by the synthesized program.
pub const OUTPUT_END: &str = "</prerenderOutput>";

/// Rendered HTML keyed by the component's original source path.
pub type RenderResultMap = FxHashMap<String, String>;

// ============================================================================
// Errors
// ============================================================================

/// Failures while extracting the render result from captured output.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error(
        "no `{OUTPUT_START}...{OUTPUT_END}` payload found in sandbox output \
         (the render program did not reach its output step)"
    )]
    MissingPayload,

    #[error("render result payload is not a valid JSON string map")]
    Malformed(#[from] serde_json::Error),
}

// ============================================================================
// Codec
// ============================================================================

/// Fence-matching regex. Non-greedy so a stray closing token later in the
/// stream cannot widen the match; `(?s)` because rendered HTML may contain
/// newlines if a component logs inside the fence-building expression.
fn payload_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            "(?s){}(.*?){}",
            regex::escape(OUTPUT_START),
            regex::escape(OUTPUT_END)
        ))
        .unwrap()
    })
}

/// Wrap a render result map in the delimiter fence.
///
/// The exact inverse of [`decode`]. Production fencing happens inside the
/// synthesized program; this side only needs it to fabricate sandbox output
/// in tests.
#[cfg(test)]
pub fn encode(results: &RenderResultMap) -> String {
    // Serializing a string map cannot fail
    let payload = serde_json::to_string(results).unwrap_or_else(|_| "{}".into());
    format!("{OUTPUT_START}{payload}{OUTPUT_END}")
}

/// Extract and parse the fenced render result from raw captured output.
pub fn decode(raw: &str) -> Result<RenderResultMap, ProtocolError> {
    let captures = payload_regex()
        .captures(raw)
        .ok_or(ProtocolError::MissingPayload)?;

    let payload = captures.get(1).map_or("", |m| m.as_str());
    let results: RenderResultMap = serde_json::from_str(payload)?;
    Ok(results)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_map() -> RenderResultMap {
        let mut map = RenderResultMap::default();
        map.insert("/p/A.tsx".into(), "<div>A</div>".into());
        map
    }

    #[test]
    fn test_round_trip() {
        let encoded = encode(&sample_map());
        let decoded = decode(&encoded).unwrap();
        assert_eq!(decoded, sample_map());
    }

    #[test]
    fn test_decode_ignores_surrounding_noise() {
        let raw = format!(
            "warning: some library logged this\n{}\ntrailing noise",
            encode(&sample_map())
        );
        let decoded = decode(&raw).unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded["/p/A.tsx"], "<div>A</div>");
    }

    #[test]
    fn test_decode_missing_fence_is_explicit_error() {
        let err = decode("just some log output, no payload").unwrap_err();
        assert!(matches!(err, ProtocolError::MissingPayload));
    }

    #[test]
    fn test_decode_empty_input() {
        assert!(matches!(decode(""), Err(ProtocolError::MissingPayload)));
    }

    #[test]
    fn test_decode_malformed_interior() {
        let raw = format!("{OUTPUT_START}not json{OUTPUT_END}");
        assert!(matches!(decode(&raw), Err(ProtocolError::Malformed(_))));
    }

    #[test]
    fn test_decode_wrong_shape_is_malformed() {
        let raw = format!("{OUTPUT_START}[1, 2, 3]{OUTPUT_END}");
        assert!(matches!(decode(&raw), Err(ProtocolError::Malformed(_))));
    }

    #[test]
    fn test_decode_takes_first_bounded_match() {
        let mut other = RenderResultMap::default();
        other.insert("/p/B.tsx".into(), "<div>B</div>".into());
        let raw = format!("{}{}", encode(&sample_map()), encode(&other));
        let decoded = decode(&raw).unwrap();
        assert_eq!(decoded, sample_map());
    }

    #[test]
    fn test_decode_multiline_html() {
        let mut map = RenderResultMap::default();
        map.insert("/p/A.tsx".into(), "<pre>line1\nline2</pre>".into());
        let decoded = decode(&encode(&map)).unwrap();
        assert_eq!(decoded["/p/A.tsx"], "<pre>line1\nline2</pre>");
    }
}
