//! Internal module for extracting readable text from fetched emails.

use crate::error::{Error, Result};
use mailparse::{parse_mail, ParsedMail};
use tracing::debug;

/// Extracts the most code-friendly text body from a raw RFC 822 message.
///
/// A `text/plain` part anywhere in the MIME tree is preferred; only when
/// none exists does a `text/html` part get used (the code extractor
/// tolerates markup). Single-part messages return their body as-is.
pub(crate) fn extract_body_text(raw: &[u8]) -> Result<String> {
    let parsed = parse_mail(raw).map_err(|source| Error::ParseEmail { source })?;

    if let Some(plain) = find_part(&parsed, "text/plain") {
        debug!(len = plain.len(), "Using text/plain body");
        return Ok(plain);
    }

    if let Some(html) = find_part(&parsed, "text/html") {
        debug!(len = html.len(), "No text/plain part, falling back to text/html");
        return Ok(html);
    }

    parsed.get_body().map_err(|source| Error::ExtractBody { source })
}

/// Depth-first search for the first part with the given MIME type.
fn find_part(part: &ParsedMail<'_>, mimetype: &str) -> Option<String> {
    if part.ctype.mimetype.eq_ignore_ascii_case(mimetype) {
        if let Ok(body) = part.get_body() {
            return Some(body);
        }
    }

    part.subparts
        .iter()
        .find_map(|subpart| find_part(subpart, mimetype))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::{Matcher, OtpExtractor};

    #[test]
    fn test_single_part_message() {
        let raw = b"From: portal@example.in\r\nTo: clerk@example.com\r\n\r\nYour OTP is 123456.";
        let text = extract_body_text(raw).unwrap();
        assert!(text.contains("123456"));
    }

    #[test]
    fn test_plain_preferred_over_html() {
        let raw = b"From: portal@example.in\r\n\
            Content-Type: multipart/alternative; boundary=\"sep\"\r\n\r\n\
            --sep\r\n\
            Content-Type: text/html\r\n\r\n\
            <p>Your OTP is <b>999999</b></p>\r\n\
            --sep\r\n\
            Content-Type: text/plain\r\n\r\n\
            Your OTP is 123456.\r\n\
            --sep--\r\n";

        // The plain part wins even though the HTML part comes first
        let text = extract_body_text(raw).unwrap();
        assert!(text.contains("123456"));
        assert!(!text.contains("999999"));
    }

    #[test]
    fn test_html_fallback() {
        let raw = b"From: portal@example.in\r\n\
            Content-Type: multipart/alternative; boundary=\"sep\"\r\n\r\n\
            --sep\r\n\
            Content-Type: text/html\r\n\r\n\
            <p>Your OTP is <b>204918</b></p>\r\n\
            --sep--\r\n";

        let text = extract_body_text(raw).unwrap();
        let matcher = OtpExtractor::new();
        assert_eq!(matcher.find_match(&text).as_deref(), Some("204918"));
    }

    #[test]
    fn test_nested_multipart() {
        let raw = b"From: portal@example.in\r\n\
            Content-Type: multipart/mixed; boundary=\"outer\"\r\n\r\n\
            --outer\r\n\
            Content-Type: multipart/alternative; boundary=\"inner\"\r\n\r\n\
            --inner\r\n\
            Content-Type: text/plain\r\n\r\n\
            Verification code - 204910\r\n\
            --inner--\r\n\
            --outer--\r\n";

        let text = extract_body_text(raw).unwrap();
        assert!(text.contains("204910"));
    }
}
