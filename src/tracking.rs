//! Tracking/reference identifier extraction from submission success pages.
//!
//! After a grievance is submitted, the portal's confirmation page carries a
//! reference identifier ("Reference ID: GRV2024/001234") that proves the
//! submission was registered. This module pulls that identifier out of the
//! page text, with an optional secondary pass over raw HTML.
//!
//! Extraction is gated: if the page does not look like a success page at all,
//! no pattern runs and the result is `None`. This keeps error and
//! intermediate pages from yielding false positives.
//!
//! # Example
//!
//! ```
//! use otp_sync::tracking::extract_tracking_id;
//!
//! let page = "Your complaint has been successfully registered. Reference ID: GRV2024/001234";
//! assert_eq!(extract_tracking_id(page, None).as_deref(), Some("GRV2024/001234"));
//!
//! // Not a success page: the label-shaped ID is ignored
//! let page = "An error occurred. ID: ABC12345";
//! assert_eq!(extract_tracking_id(page, None), None);
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

/// Phrases that mark a page as a submission success page.
///
/// Matched case-insensitively against the plain text before any ID pattern
/// runs.
const SUCCESS_INDICATORS: &[&str] = &[
    "successfully registered",
    "successfully submitted",
    "successfully lodged",
    "registered successfully",
    "submitted successfully",
    "lodged successfully",
    "complaint registered",
    "grievance registered",
    "has been registered",
    "has been submitted",
    "acknowledg",
    "thank you for registering",
    "thank you for your complaint",
];

/// Ordered ID patterns over plain page text: label-anchored first, then
/// format-shaped fallbacks. First capture whose normalized form is at least
/// five characters wins.
static TRACKING_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // Label + id-word: "Reference ID: ...", "Complaint No. ...", "Tracking Number - ..."
        r"(?i)\b(?:tracking|reference|complaint|registration|ticket|grievance|acknowledgement)\s*(?:id|no|number|num)\.?\s*[:#\-]?\s*([A-Za-z0-9][A-Za-z0-9/\-]{3,})",
        // Label + explicit separator: "Reference: ...", "Grievance# ..."
        r"(?i)\b(?:tracking|reference|complaint|registration|ticket|grievance|acknowledgement)\s*[:#]\s*([A-Za-z0-9][A-Za-z0-9/\-]{3,})",
        // Letter prefix + digit runs: GRV2024/001234, PGR-883321
        r"\b([A-Za-z]{2,6}[-/]?[0-9]{4,}(?:[-/][0-9]+)*)\b",
        // Date-like delimited digit runs: 2024/09/123456
        r"\b([0-9]{2,4}[-/][0-9]{2,}(?:[-/][0-9]+)+)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

/// Secondary patterns over raw HTML, tried only when the plain text yields
/// nothing. Portals often render the ID alone inside an emphasized element.
static HTML_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?is)<strong[^>]*>\s*([A-Za-z0-9][A-Za-z0-9/\-]{3,})\s*</strong>",
        r"(?is)<b[^>]*>\s*([A-Za-z0-9][A-Za-z0-9/\-]{3,})\s*</b>",
        r#"(?is)class="[^"]*(?:tracking|reference|complaint|grievance|ticket)[^"]*"[^>]*>\s*([A-Za-z0-9][A-Za-z0-9/\-]{3,})\s*<"#,
        r#"(?is)<span[^>]*id="[^"]*(?:track|ref|complaint)[^"]*"[^>]*>\s*([A-Za-z0-9][A-Za-z0-9/\-]{3,})\s*<"#,
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

/// Returns `true` if the page text contains a success-indicator phrase.
fn looks_like_success(text: &str) -> bool {
    let lowered = text.to_lowercase();
    SUCCESS_INDICATORS
        .iter()
        .any(|indicator| lowered.contains(indicator))
}

/// Extracts the best-guess tracking/reference identifier from a
/// post-submission page.
///
/// The plain `text` must first look like a success page; otherwise no
/// pattern runs and `None` is returned. If gated in, label-anchored
/// patterns are tried before format-shaped fallbacks, and if the plain
/// text yields nothing, `html` (when supplied) is scanned with a small set
/// of element-scoped patterns.
///
/// The returned identifier is normalized via [`format_tracking_id`].
#[must_use]
pub fn extract_tracking_id(text: &str, html: Option<&str>) -> Option<String> {
    if !looks_like_success(text) {
        tracing::debug!("Page text has no success indicator, skipping ID extraction");
        return None;
    }

    for pattern in TRACKING_PATTERNS.iter() {
        if let Some(id) = first_capture(pattern, text) {
            tracing::debug!(id = %id, "Extracted tracking ID from page text");
            return Some(id);
        }
    }

    if let Some(html) = html {
        for pattern in HTML_PATTERNS.iter() {
            if let Some(id) = first_capture(pattern, html) {
                tracing::debug!(id = %id, "Extracted tracking ID from HTML");
                return Some(id);
            }
        }
    }

    None
}

/// Returns every distinct identifier matched by any pattern over `text`,
/// in order of discovery. Diagnostic aid for portals whose success pages
/// carry several candidate identifiers.
#[must_use]
pub fn extract_all_ids(text: &str) -> Vec<String> {
    let mut ids = Vec::new();

    for pattern in TRACKING_PATTERNS.iter() {
        for captures in pattern.captures_iter(text) {
            let Some(candidate) = captures.get(1) else {
                continue;
            };
            let id = format_tracking_id(candidate.as_str());
            if id.len() >= 5 && !ids.contains(&id) {
                ids.push(id);
            }
        }
    }

    ids
}

/// Checks the generic shape invariant for a tracking identifier,
/// independently of how it was obtained: at least 5 characters, at least
/// one digit, and only uppercase letters, digits, hyphen, and slash.
///
/// # Example
///
/// ```
/// use otp_sync::tracking::validate_tracking_id;
///
/// assert!(validate_tracking_id("GRV-1234567"));
/// assert!(!validate_tracking_id("abc"));
/// assert!(!validate_tracking_id("GRV$$$$$"));
/// ```
#[must_use]
pub fn validate_tracking_id(id: &str) -> bool {
    id.len() >= 5
        && id.chars().any(|c| c.is_ascii_digit())
        && id
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-' || c == '/')
}

/// Normalizes a tracking identifier: uppercase, whitespace collapsed out.
///
/// # Example
///
/// ```
/// use otp_sync::tracking::format_tracking_id;
///
/// assert_eq!(format_tracking_id(" grv 2024/001234 "), "GRV2024/001234");
/// ```
#[must_use]
pub fn format_tracking_id(id: &str) -> String {
    id.split_whitespace().collect::<String>().to_uppercase()
}

/// Applies `pattern` to `haystack` and returns the first normalized capture
/// of acceptable length.
fn first_capture(pattern: &Regex, haystack: &str) -> Option<String> {
    let captures = pattern.captures(haystack)?;
    let candidate = captures.get(1)?;
    let id = format_tracking_id(candidate.as_str());
    (id.len() >= 5).then_some(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUCCESS_PAGE: &str =
        "Your complaint has been successfully registered. Reference ID: GRV2024/001234";

    #[test]
    fn test_reference_id_label() {
        assert_eq!(
            extract_tracking_id(SUCCESS_PAGE, None).as_deref(),
            Some("GRV2024/001234")
        );
    }

    #[test]
    fn test_gating_blocks_non_success_pages() {
        // Label-shaped ID present, but no success vocabulary
        let page = "Something went wrong while processing. ID: ABC12345";
        assert_eq!(extract_tracking_id(page, None), None);

        let page = "Please wait, your request is being processed. Tracking No: PGR-55210";
        assert_eq!(extract_tracking_id(page, None), None);
    }

    #[test]
    fn test_label_variants() {
        let page = "Grievance registered successfully. Complaint No. PGR-883321";
        assert_eq!(extract_tracking_id(page, None).as_deref(), Some("PGR-883321"));

        let page = "Thank you for your complaint. Ticket# 2024/11/50993";
        assert_eq!(
            extract_tracking_id(page, None).as_deref(),
            Some("2024/11/50993")
        );
    }

    #[test]
    fn test_format_fallback() {
        // No label, but a letter-prefixed identifier shape on a success page
        let page = "Registered successfully. Please note GRV2024/001234 for future correspondence.";
        assert_eq!(
            extract_tracking_id(page, None).as_deref(),
            Some("GRV2024/001234")
        );
    }

    #[test]
    fn test_html_secondary_pass() {
        let text = "Your grievance has been submitted successfully.";
        let html = r#"<div class="result"><strong> GRV-2024-00912 </strong></div>"#;
        assert_eq!(
            extract_tracking_id(text, Some(html)).as_deref(),
            Some("GRV-2024-00912")
        );

        // Plain-text match wins over the HTML pass
        assert_eq!(
            extract_tracking_id(SUCCESS_PAGE, Some(html)).as_deref(),
            Some("GRV2024/001234")
        );
    }

    #[test]
    fn test_extract_all_ids() {
        let page = "Reference ID: GRV2024/001234 (also quoted as GRV2024/001234). \
                    Ticket: PGR-55210";
        let ids = extract_all_ids(page);
        assert!(ids.contains(&"GRV2024/001234".to_string()));
        assert!(ids.contains(&"PGR-55210".to_string()));
        // Deduplicated
        assert_eq!(
            ids.iter().filter(|id| *id == "GRV2024/001234").count(),
            1
        );
    }

    #[test]
    fn test_validate() {
        assert!(validate_tracking_id("GRV-1234567"));
        assert!(validate_tracking_id("GRV2024/001234"));
        assert!(validate_tracking_id("12345"));
        assert!(!validate_tracking_id("abc")); // too short
        assert!(!validate_tracking_id("GRV$$$$$")); // disallowed chars, no digit
        assert!(!validate_tracking_id("grv-1234567")); // lowercase
        assert!(!validate_tracking_id("ABCDE")); // no digit
    }

    #[test]
    fn test_format() {
        assert_eq!(format_tracking_id(" grv 2024/001234 "), "GRV2024/001234");
        assert_eq!(format_tracking_id("PGR-55210"), "PGR-55210");
    }
}
