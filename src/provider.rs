//! The provider abstraction over OTP delivery channels.
//!
//! A [provider](OtpProvider) knows how to poll exactly one communication
//! channel (an email inbox, an SMS inbox) and hand raw message text to the
//! code extractor. The [`crate::handler::OtpHandler`] dispatches to
//! registered providers by [`ChannelType`].

use crate::extractor::Matcher;
use async_trait::async_trait;
use std::time::Duration;

/// The kind of communication channel an OTP arrives through.
///
/// Channel types are enumerated rather than free-form strings so that
/// registration is validated at compile time; the [`std::str::FromStr`]
/// impl accepts the conventional names `"email"` and `"sms"` for call
/// sites driven by runtime configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelType {
    /// An email inbox polled over IMAP.
    Email,
    /// An SMS inbox polled over an HTTP query API.
    Sms,
}

impl std::fmt::Display for ChannelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelType::Email => write!(f, "email"),
            ChannelType::Sms => write!(f, "sms"),
        }
    }
}

impl std::str::FromStr for ChannelType {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "email" => Ok(ChannelType::Email),
            "sms" => Ok(ChannelType::Sms),
            other => Err(crate::error::Error::InvalidConfig {
                message: format!("unknown channel type '{other}' (expected 'email' or 'sms')"),
            }),
        }
    }
}

/// Outcome of one poll cycle against a channel.
///
/// Transient failures are first-class values rather than swallowed
/// exceptions: the polling loop logs them and keeps going until the
/// attempt deadline.
#[derive(Debug)]
pub(crate) enum CycleOutcome {
    /// A valid code was extracted this cycle; the attempt is over.
    Found(String),
    /// The cycle completed but no new message carried a code.
    NoCode,
    /// The cycle failed (network, protocol, decode); the attempt continues.
    Transient(crate::error::Error),
}

/// A pollable OTP delivery channel.
///
/// Implementations encapsulate channel credentials and transport; they
/// share the retrieval contract:
///
/// - [`get_otp`](Self::get_otp) polls from invocation time until `timeout`
///   elapses or a code is found, returning on the first valid extraction.
///   Exhaustion is an expected outcome and is reported as `None`, never as
///   an error. `retry_count` additional full polling attempts (fresh
///   deadline, fresh seen-set) are made after an exhausted one.
/// - [`extract_otp`](Self::extract_otp) runs the provider's matcher over
///   arbitrary text without touching the channel, for offline testing.
///
/// Construction is where configuration problems surface: a provider with a
/// missing credential must fail fast naming the credential, so a
/// misconfigured channel is never silently polled.
#[async_trait]
pub trait OtpProvider: Send + Sync {
    /// Polls the channel until a code is found or `timeout` elapses.
    async fn get_otp(&self, timeout: Duration, retry_count: u32) -> Option<String>;

    /// Runs the provider's matcher over `text` without polling.
    fn extract_otp(&self, text: &str) -> Option<String>;

    /// The channel type this provider serves.
    fn channel(&self) -> ChannelType;

    /// Human-readable provider description for logs.
    fn description(&self) -> &str;
}

/// Shared default-matcher plumbing for providers.
pub(crate) fn run_matcher(matcher: &dyn Matcher, text: &str) -> Option<String> {
    matcher.find_match(text).map(std::borrow::Cow::into_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_type_from_str() {
        assert_eq!("email".parse::<ChannelType>().unwrap(), ChannelType::Email);
        assert_eq!(" SMS ".parse::<ChannelType>().unwrap(), ChannelType::Sms);
        assert!("pigeon".parse::<ChannelType>().is_err());
    }

    #[test]
    fn test_channel_type_display_round_trips() {
        for channel in [ChannelType::Email, ChannelType::Sms] {
            assert_eq!(channel.to_string().parse::<ChannelType>().unwrap(), channel);
        }
    }
}
