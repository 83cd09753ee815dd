//! Reply-line normalization and scalar reply parsers
//!
//! Replies arrive as single text lines. An empty line is a meaningful reply
//! (the board answered with nothing, e.g. an unfilled buffer) and must stay
//! distinguishable from a literal `0`.

use crate::error::ParseError;

/// The device-reported end-of-sequence marker
pub const END_MARKER: &str = "END";

/// Normalize a raw reply line: decode as UTF-8 and strip trailing CR/LF
pub fn normalize_reply(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    text.trim_end_matches(['\r', '\n']).to_string()
}

/// Parse a `getLen()` reply
///
/// Empty replies are valid and mean "no length reported"; they are NOT the
/// same as a reported length of zero.
pub fn parse_len(reply: &str) -> Result<Option<u32>, ParseError> {
    if reply.is_empty() {
        return Ok(None);
    }
    reply
        .parse::<u32>()
        .map(Some)
        .map_err(|_| ParseError::InvalidLength(reply.to_string()))
}

/// Check a `getEnded()` reply for the sentinel marker
///
/// Only the exact literal counts; the board replies with other text while
/// the sequence is still running.
pub fn is_ended(reply: &str) -> bool {
    reply == END_MARKER
}

/// Parse a `getSpeed()` reply: device-side processing time in milliseconds
pub fn parse_speed_ms(reply: &str) -> Result<u64, ParseError> {
    reply
        .parse::<u64>()
        .map_err(|_| ParseError::InvalidSpeed(reply.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_line_terminators() {
        assert_eq!(normalize_reply(b"42\r\n"), "42");
        assert_eq!(normalize_reply(b"42\n"), "42");
        assert_eq!(normalize_reply(b"42"), "42");
    }

    #[test]
    fn normalize_empty_reply() {
        assert_eq!(normalize_reply(b"\r\n"), "");
        assert_eq!(normalize_reply(b""), "");
    }

    #[test]
    fn empty_len_is_none_not_zero() {
        assert_eq!(parse_len("").unwrap(), None);
        assert_eq!(parse_len("0").unwrap(), Some(0));
    }

    #[test]
    fn len_parses_integers() {
        assert_eq!(parse_len("17").unwrap(), Some(17));
    }

    #[test]
    fn garbage_len_is_an_error() {
        assert!(parse_len("seventeen").is_err());
        assert!(parse_len("-3").is_err());
    }

    #[test]
    fn ended_requires_exact_marker() {
        assert!(is_ended("END"));
        assert!(!is_ended("end"));
        assert!(!is_ended("END\r\n"));
        assert!(!is_ended("no"));
        assert!(!is_ended(""));
    }

    #[test]
    fn speed_parses_milliseconds() {
        assert_eq!(parse_speed_ms("12").unwrap(), 12);
        assert!(parse_speed_ms("").is_err());
        assert!(parse_speed_ms("fast").is_err());
    }
}
