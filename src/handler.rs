//! Channel registry and dispatch for OTP retrieval.
//!
//! The [`OtpHandler`] is the single entry point for "I need a code of type
//! X within Y seconds". It maps a [`ChannelType`] to a registered provider
//! and delegates; it performs no polling and holds no channel credentials.
//!
//! Prefer constructing one handler at startup and injecting it where
//! needed. [`OtpHandler::global()`] exists for call sites that cannot
//! thread a handle; it is process-wide state with a trivial lifecycle
//! (created once, never torn down).
//!
//! # Example
//!
//! ```
//! use otp_sync::{ChannelType, OtpHandler};
//!
//! let handler = OtpHandler::new();
//! // No provider registered: a soft failure, not a panic
//! assert_eq!(handler.extract_otp_from_text("OTP is 123456", ChannelType::Sms), None);
//! ```

use crate::provider::{ChannelType, OtpProvider};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, error, instrument};

static GLOBAL: Lazy<OtpHandler> = Lazy::new(OtpHandler::new);

/// Registry + dispatch layer over channel providers.
///
/// One provider per [`ChannelType`]; re-registering a type replaces the
/// prior provider (last-write-wins). All failures at this layer are soft:
/// asking for a channel with no registration logs an error and yields
/// `None`, so calling workflows can fall back instead of crashing.
#[derive(Default)]
pub struct OtpHandler {
    providers: RwLock<HashMap<ChannelType, Arc<dyn OtpProvider>>>,
}

impl OtpHandler {
    /// Creates an empty handler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the lazily-initialized process-wide handler.
    #[must_use]
    pub fn global() -> &'static OtpHandler {
        &GLOBAL
    }

    /// Associates `provider` with `channel`, replacing any previous
    /// association for that channel.
    pub fn register_provider(&self, channel: ChannelType, provider: Arc<dyn OtpProvider>) {
        debug!(channel = %channel, provider = provider.description(), "Registering provider");

        let mut providers = self
            .providers
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if providers.insert(channel, provider).is_some() {
            debug!(channel = %channel, "Replaced previously registered provider");
        }
    }

    /// Waits for a code on `channel`, delegating to the registered
    /// provider with a retry count of 1 if `retry_on_failure` else 0.
    ///
    /// Returns `None` if no provider is registered for the channel (logged
    /// as an error) or if the provider exhausts its timeout.
    #[instrument(
        name = "OtpHandler::get_otp",
        skip(self),
        fields(channel = %channel, timeout_secs = timeout.as_secs(), retry_on_failure)
    )]
    pub async fn get_otp(
        &self,
        channel: ChannelType,
        timeout: Duration,
        retry_on_failure: bool,
    ) -> Option<String> {
        let Some(provider) = self.provider(channel) else {
            error!(channel = %channel, "No provider registered for channel");
            return None;
        };

        provider.get_otp(timeout, u32::from(retry_on_failure)).await
    }

    /// Runs `channel`'s extractor over `text` without polling, for offline
    /// testing. `None` if the channel has no registered provider.
    pub fn extract_otp_from_text(&self, text: &str, channel: ChannelType) -> Option<String> {
        self.provider(channel)?.extract_otp(text)
    }

    /// Clones the provider handle out of the registry so no lock is held
    /// across channel I/O.
    fn provider(&self, channel: ChannelType) -> Option<Arc<dyn OtpProvider>> {
        self.providers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&channel)
            .cloned()
    }
}

impl std::fmt::Debug for OtpHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let channels: Vec<ChannelType> = self
            .providers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect();
        f.debug_struct("OtpHandler")
            .field("registered", &channels)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor;
    use async_trait::async_trait;

    struct StubProvider {
        channel: ChannelType,
    }

    #[async_trait]
    impl OtpProvider for StubProvider {
        async fn get_otp(&self, _timeout: Duration, _retry_count: u32) -> Option<String> {
            Some("123456".into())
        }

        fn extract_otp(&self, text: &str) -> Option<String> {
            extractor::extract_otp(text)
        }

        fn channel(&self) -> ChannelType {
            self.channel
        }

        fn description(&self) -> &str {
            "stub provider"
        }
    }

    #[test]
    fn test_extract_passthrough_and_soft_failure() {
        let handler = OtpHandler::new();
        assert_eq!(
            handler.extract_otp_from_text("OTP is 123456", ChannelType::Email),
            None
        );

        handler.register_provider(
            ChannelType::Email,
            Arc::new(StubProvider {
                channel: ChannelType::Email,
            }),
        );
        assert_eq!(
            handler.extract_otp_from_text("OTP is 123456", ChannelType::Email),
            Some("123456".into())
        );
        // Other channel still unregistered
        assert_eq!(
            handler.extract_otp_from_text("OTP is 123456", ChannelType::Sms),
            None
        );
    }

    #[test]
    fn test_reregistration_overwrites() {
        let handler = OtpHandler::new();
        handler.register_provider(
            ChannelType::Sms,
            Arc::new(StubProvider {
                channel: ChannelType::Sms,
            }),
        );
        handler.register_provider(
            ChannelType::Sms,
            Arc::new(StubProvider {
                channel: ChannelType::Sms,
            }),
        );

        let debug_str = format!("{handler:?}");
        assert!(debug_str.contains("Sms"));
    }

    #[test]
    fn test_global_is_shared() {
        assert!(std::ptr::eq(OtpHandler::global(), OtpHandler::global()));
    }
}
