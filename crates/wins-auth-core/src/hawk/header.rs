//! `Authorization` / `Server-Authorization` header values.
//!
//! The attribute list itself is handled by [`hawk::Header`]; this module
//! deals with the `Hawk` scheme prefix and with timestamps the system clock
//! cannot represent.

use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use ::hawk::Header;

use crate::error::AuthError;

const SCHEME: &str = "Hawk";

/// Largest `ts` accepted; later instants overflow `SystemTime`.
const MAX_TIMESTAMP: u64 = i64::MAX as u64;

/// Parse a `Hawk ...` header value.
pub fn parse(value: &str) -> Result<Header, AuthError> {
    let value = value.trim();
    let attributes = match value.split_once(char::is_whitespace) {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case(SCHEME) => rest,
        _ => return Err(AuthError::MalformedHeader("expected Hawk scheme".to_string())),
    };

    check_timestamp_range(attributes)?;

    Header::from_str(attributes).map_err(|e| AuthError::MalformedHeader(e.to_string()))
}

/// Render a header with the `Hawk` scheme prefix.
pub fn to_header_value(header: &Header) -> String {
    format!("{SCHEME} {header}")
}

/// Header timestamp as unix seconds.
pub fn timestamp(header: &Header) -> Option<u64> {
    header
        .ts
        .and_then(|ts| ts.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
}

/// Unix seconds as the `SystemTime` a header carries.
pub fn system_time(unix_secs: u64) -> SystemTime {
    UNIX_EPOCH + std::time::Duration::from_secs(unix_secs.min(MAX_TIMESTAMP))
}

fn check_timestamp_range(attributes: &str) -> Result<(), AuthError> {
    let mut rest = attributes;
    while let Some(pos) = rest.find("ts=\"") {
        let at_boundary = rest[..pos]
            .chars()
            .next_back()
            .map_or(true, |c| c == ',' || c.is_whitespace());
        let value_start = &rest[pos + 4..];
        let value = value_start.split('"').next().unwrap_or("");

        if at_boundary
            && !value.is_empty()
            && value.bytes().all(|b| b.is_ascii_digit())
            && value.parse::<u64>().map_or(true, |ts| ts > MAX_TIMESTAMP)
        {
            return Err(AuthError::MalformedHeader(format!("ts out of range: {value}")));
        }
        rest = value_start;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str =
        r#"id="dh37fgj492je", ts="1353832234", nonce="j4h3g2", mac="6R4rV5iE+NPoym+WwjeHzjAGXUtLNIxmo1vpMofpLAE=", ext="some-app-ext-data""#;

    #[test]
    fn test_parse_request_header() {
        let header = parse(&format!("Hawk {SAMPLE}")).unwrap();
        assert_eq!(header.id.as_deref(), Some("dh37fgj492je"));
        assert_eq!(header.nonce.as_deref(), Some("j4h3g2"));
        assert_eq!(header.ext.as_deref(), Some("some-app-ext-data"));
        assert_eq!(timestamp(&header), Some(1353832234));
        assert!(header.mac.is_some());
        assert!(header.hash.is_none());
    }

    #[test]
    fn test_scheme_is_case_insensitive() {
        assert!(parse(&format!("hawk {SAMPLE}")).is_ok());
        assert!(parse(&format!("  HAWK   {SAMPLE}")).is_ok());
    }

    #[test]
    fn test_other_schemes_rejected() {
        for value in [SAMPLE.to_string(), format!("Bearer {SAMPLE}"), "Hawk".to_string(), String::new()] {
            assert!(
                matches!(parse(&value), Err(AuthError::MalformedHeader(_))),
                "accepted {value:?}"
            );
        }
    }

    #[test]
    fn test_unrepresentable_timestamps_rejected() {
        for ts in ["9223372036854775808", "18446744073709551615", "99999999999999999999999"] {
            let value = format!(r#"Hawk id="a", ts="{ts}", nonce="n", mac="bWFj""#);
            assert!(
                matches!(parse(&value), Err(AuthError::MalformedHeader(_))),
                "accepted ts {ts}"
            );
        }
    }

    #[test]
    fn test_render_round_trip() {
        let header = parse(&format!("Hawk {SAMPLE}")).unwrap();
        let rendered = to_header_value(&header);
        assert!(rendered.starts_with("Hawk "));

        let reparsed = parse(&rendered).unwrap();
        assert_eq!(reparsed.id, header.id);
        assert_eq!(reparsed.nonce, header.nonce);
        assert_eq!(reparsed.mac, header.mac);
        assert_eq!(timestamp(&reparsed), timestamp(&header));
    }
}
