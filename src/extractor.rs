//! Verification-code extraction from message text.
//!
//! This module provides a flexible [`Matcher`] trait and the built-in
//! [`OtpExtractor`], which pulls a 4-8 digit verification code out of noisy,
//! semi-structured message text (email bodies, SMS payloads, English or Hindi).
//!
//! # Example
//!
//! ```
//! use otp_sync::extractor::{OtpExtractor, Matcher};
//!
//! let extractor = OtpExtractor::new();
//! assert_eq!(
//!     extractor.find_match("Your OTP is 123456. Valid for 5 minutes.").as_deref(),
//!     Some("123456")
//! );
//!
//! // A labelled code always wins over an unlabelled digit run
//! let text = "Call us at 9876543210. Your OTP is 482913.";
//! assert_eq!(extractor.find_match(text).as_deref(), Some("482913"));
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

/// Trait for matching and extracting content from message text.
///
/// Implement this trait to define custom matching logic, e.g. for tests
/// or for portals with unusual message formats.
///
/// # Example
///
/// ```
/// use otp_sync::extractor::Matcher;
/// use std::borrow::Cow;
///
/// struct FixedCode;
///
/// impl Matcher for FixedCode {
///     fn find_match<'a>(&self, text: &'a str) -> Option<Cow<'a, str>> {
///         text.contains("magic").then(|| Cow::Borrowed("000000"))
///     }
///
///     fn description(&self) -> &str {
///         "fixed test code"
///     }
/// }
/// ```
pub trait Matcher: Send + Sync {
    /// Attempts to find and extract matching content from the text.
    ///
    /// Returns `Some(matched_value)` if found, `None` otherwise.
    /// Uses `Cow<str>` to avoid allocations when the match can be borrowed
    /// directly from the input text.
    fn find_match<'a>(&self, text: &'a str) -> Option<Cow<'a, str>>;

    /// Returns a human-readable description of what this matcher looks for.
    ///
    /// Used in logging and error messages.
    fn description(&self) -> &str;
}

/// Shape every accepted code must satisfy, applied after trimming.
static CODE_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{4,8}$").expect("valid regex"));

/// One entry in the ordered pattern list.
struct Pattern {
    regex: Regex,
    name: &'static str,
}

/// The ordered pattern list. List order is the only precedence mechanism:
/// the first pattern whose first capture survives [`CODE_SHAPE`] wins.
/// Label-anchored patterns must stay ahead of the unlabelled fallbacks so
/// that a phone number is never mistaken for a code.
static PATTERNS: Lazy<Vec<Pattern>> = Lazy::new(|| {
    let pattern = |regex: &str, name: &'static str| Pattern {
        regex: Regex::new(regex).expect("valid regex"),
        name,
    };

    vec![
        // 1. Explicit OTP labels, label-before-digits and digits-before-label
        pattern(
            r"(?i)\b(?:otp|one[\s-]?time\s+pass(?:word|code))\b[^0-9]{0,20}?([0-9]{4,8})\b",
            "otp label",
        ),
        pattern(
            r"(?i)\b([0-9]{4,8})\b[^0-9]{0,20}?\b(?:otp|one[\s-]?time\s+pass(?:word|code))\b",
            "otp label (trailing)",
        ),
        // 2. Verification / confirmation code labels
        pattern(
            r"(?i)\b(?:verification|confirmation|security|auth(?:entication)?)\s+code\b[^0-9]{0,20}?([0-9]{4,8})\b",
            "verification code label",
        ),
        pattern(
            r"(?i)\b([0-9]{4,8})\b[^0-9]{0,20}?\b(?:verification|confirmation)\s+code\b",
            "verification code label (trailing)",
        ),
        // 3. PIN labels
        pattern(r"(?i)\bpin\b[^0-9]{0,20}?([0-9]{4,8})\b", "pin label"),
        // 4. Hindi label
        pattern(r"कोड[^0-9]{0,20}?([0-9]{4,8})\b", "hindi code label"),
        // 5. Generic "your code is ..." phrasing
        pattern(
            r"(?i)\b(?:your\s+)?code\s*(?:is|:)\s*([0-9]{4,8})\b",
            "generic code phrase",
        ),
        // 6. Unlabelled fallbacks: 6 digits dominate real-world codes, so they
        //    are tried before 4 and 8
        pattern(r"\b([0-9]{6})\b", "bare 6-digit run"),
        pattern(r"\b([0-9]{4})\b", "bare 4-digit run"),
        pattern(r"\b([0-9]{8})\b", "bare 8-digit run"),
    ]
});

/// Ordered-pattern extractor for one-time passwords.
///
/// Applies label-anchored patterns first (OTP / one-time password,
/// verification/confirmation code, PIN, the Hindi "कोड"), then a generic
/// "your code is" phrasing, and only then unlabelled digit-run fallbacks.
/// The first structural match whose capture is a 4-8 digit run wins; there
/// is no scoring. Matching is case-insensitive and tolerates HTML and
/// multi-line text. The extractor is a pure function over its input.
///
/// # Example
///
/// ```
/// use otp_sync::extractor::{OtpExtractor, Matcher};
///
/// let extractor = OtpExtractor::new();
/// assert_eq!(extractor.find_match("आपका कोड: 789456 है").as_deref(), Some("789456"));
/// assert_eq!(extractor.find_match("Welcome to our service!"), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct OtpExtractor;

impl OtpExtractor {
    /// Creates the extractor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Matcher for OtpExtractor {
    fn find_match<'a>(&self, text: &'a str) -> Option<Cow<'a, str>> {
        for pattern in PATTERNS.iter() {
            let Some(captures) = pattern.regex.captures(text) else {
                continue;
            };
            let Some(candidate) = captures.get(1) else {
                continue;
            };

            let code = candidate.as_str().trim();
            if CODE_SHAPE.is_match(code) {
                tracing::debug!(pattern = pattern.name, code_len = code.len(), "Extracted code");
                return Some(Cow::Borrowed(code));
            }
        }

        None
    }

    fn description(&self) -> &str {
        "4-8 digit verification code (label-anchored patterns first)"
    }
}

/// Shared extractor instance used by the convenience function and as the
/// default matcher for providers.
static SHARED: Lazy<OtpExtractor> = Lazy::new(OtpExtractor::new);

/// Extracts the best-guess verification code from `text`, or `None`.
///
/// Convenience wrapper over a shared [`OtpExtractor`].
///
/// # Example
///
/// ```
/// use otp_sync::extract_otp;
///
/// assert_eq!(extract_otp("Your OTP is 123456."), Some("123456".to_string()));
/// assert_eq!(extract_otp("no digits here"), None);
/// ```
#[must_use]
pub fn extract_otp(text: &str) -> Option<String> {
    SHARED.find_match(text).map(Cow::into_owned)
}
