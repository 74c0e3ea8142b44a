//! Configuration for the OTP channel providers.
//!
//! Each channel has a builder-style config with sensible defaults. A
//! missing credential fails the build immediately, naming the credential:
//!
//! ```
//! use otp_sync::EmailConfig;
//!
//! let err = EmailConfig::builder()
//!     .address("clerk@rediffmail.com")
//!     .build()
//!     .unwrap_err();
//! assert!(err.to_string().contains("email password"));
//! ```

use crate::error::{Error, Result};
use crate::sms::SmsService;
use email_address::EmailAddress;
use once_cell::sync::Lazy;
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::time::Duration;

// ─────────────────────────────────────────────────────────────────────────────
// IMAP host discovery
// ─────────────────────────────────────────────────────────────────────────────

/// Map of email domains to their IMAP server hostnames.
///
/// Seeded with the providers grievance workflows actually use: the big
/// international inboxes plus the common Indian ones. Unknown domains fall
/// back to `imap.{domain}`.
static KNOWN_IMAP_SERVERS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("gmail.com", "imap.gmail.com"),
        ("googlemail.com", "imap.gmail.com"),
        ("yahoo.com", "imap.mail.yahoo.com"),
        ("yahoo.in", "imap.mail.yahoo.com"),
        ("yahoo.co.in", "imap.mail.yahoo.com"),
        ("hotmail.com", "imap-mail.outlook.com"),
        ("outlook.com", "imap-mail.outlook.com"),
        ("live.com", "imap-mail.outlook.com"),
        ("rediffmail.com", "imap.rediffmail.com"),
        ("zoho.com", "imap.zoho.com"),
        ("zoho.in", "imap.zoho.in"),
        ("icloud.com", "imap.mail.me.com"),
        ("protonmail.com", "imap.protonmail.ch"),
    ])
});

/// Discovers the IMAP hostname for an email address.
///
/// Known domains resolve to their published IMAP servers; anything else
/// falls back to `imap.{domain}`.
///
/// # Example
///
/// ```
/// use otp_sync::config::discover_imap_host;
///
/// assert_eq!(discover_imap_host("user@gmail.com"), "imap.gmail.com");
/// assert_eq!(discover_imap_host("user@rediffmail.com"), "imap.rediffmail.com");
/// assert_eq!(discover_imap_host("user@nagarnigam.in"), "imap.nagarnigam.in");
/// ```
#[must_use]
pub fn discover_imap_host(email: &str) -> String {
    let domain = email.split('@').nth(1).unwrap_or(email).to_lowercase();

    KNOWN_IMAP_SERVERS
        .get(domain.as_str())
        .map_or_else(|| format!("imap.{domain}"), |&host| host.to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Shared knobs
// ─────────────────────────────────────────────────────────────────────────────

/// Timeout configuration for individual IMAP operations within one poll
/// cycle.
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Timeout for establishing TCP/TLS connection.
    pub connect: Duration,
    /// Timeout for IMAP authentication.
    pub auth: Duration,
    /// Timeout for selecting a mailbox.
    pub select: Duration,
    /// Timeout for searching the mailbox.
    pub search: Duration,
    /// Timeout for fetching one message.
    pub fetch: Duration,
    /// Timeout for logout at the end of a cycle.
    pub logout: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(30),
            auth: Duration::from_secs(30),
            select: Duration::from_secs(10),
            search: Duration::from_secs(10),
            fetch: Duration::from_secs(30),
            logout: Duration::from_secs(5),
        }
    }
}

/// Polling knobs shared by both channel providers.
#[derive(Debug, Clone)]
pub struct PollingConfig {
    /// Fixed interval between poll cycles.
    pub interval: Duration,
    /// Messages timestamped up to this long before the attempt start are
    /// still considered; tolerates clock skew between the channel's server
    /// and the local loop.
    pub skew_margin: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            skew_margin: Duration::from_secs(60),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Email channel
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration for the email channel provider.
///
/// Create using [`EmailConfig::builder()`] or [`EmailConfig::from_env()`].
///
/// The password is stored as a [`SecretString`] to keep it out of logs; the
/// address is a validated [`EmailAddress`].
#[derive(Clone)]
pub struct EmailConfig {
    address: EmailAddress,
    password: SecretString,
    /// IMAP server hostname (auto-discovered from the address domain if not set).
    pub imap_host: Option<String>,
    /// IMAP server port (default: 993 for IMAPS).
    pub imap_port: u16,
    /// Per-operation timeouts.
    pub timeouts: TimeoutConfig,
    /// Polling knobs.
    pub polling: PollingConfig,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("address", &self.address.as_str())
            .field("password", &"[REDACTED]")
            .field("imap_host", &self.imap_host)
            .field("imap_port", &self.imap_port)
            .field("timeouts", &self.timeouts)
            .field("polling", &self.polling)
            .finish()
    }
}

impl EmailConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> EmailConfigBuilder {
        EmailConfigBuilder::default()
    }

    /// Builds a configuration from the environment: `OTP_EMAIL_ADDRESS`,
    /// `OTP_EMAIL_PASSWORD`, and optionally `OTP_IMAP_HOST`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCredential`] naming the absent variable's
    /// credential, or [`Error::InvalidEmailFormat`] for a malformed address.
    pub fn from_env() -> Result<Self> {
        let mut builder = Self::builder();

        if let Ok(address) = std::env::var("OTP_EMAIL_ADDRESS") {
            builder = builder.address(address);
        }
        if let Ok(password) = std::env::var("OTP_EMAIL_PASSWORD") {
            builder = builder.password(password);
        }
        if let Ok(host) = std::env::var("OTP_IMAP_HOST") {
            builder = builder.imap_host(host);
        }

        builder.build()
    }

    /// Returns the email address as a string slice.
    #[must_use]
    pub fn address(&self) -> &str {
        self.address.as_str()
    }

    /// Returns the password for authentication.
    ///
    /// Intentionally the only way to reach the secret, so it never lands in
    /// a `Debug` dump.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }

    /// Returns the effective IMAP host, explicit or discovered from the
    /// address domain.
    #[must_use]
    pub fn effective_imap_host(&self) -> String {
        self.imap_host
            .clone()
            .unwrap_or_else(|| discover_imap_host(self.address.as_str()))
    }

    /// Returns the full IMAP server address as "host:port".
    #[must_use]
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.effective_imap_host(), self.imap_port)
    }
}

/// Builder for [`EmailConfig`].
#[derive(Debug, Default)]
pub struct EmailConfigBuilder {
    address: Option<String>,
    password: Option<String>,
    imap_host: Option<String>,
    imap_port: Option<u16>,
    timeouts: Option<TimeoutConfig>,
    polling: Option<PollingConfig>,
}

impl EmailConfigBuilder {
    /// Sets the email address (required).
    ///
    /// The domain is used to auto-discover the IMAP server if no explicit
    /// host is set.
    #[must_use]
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Sets the mailbox password (required). For Gmail/Outlook use an
    /// app-specific password.
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Sets the IMAP server hostname explicitly, overriding discovery.
    #[must_use]
    pub fn imap_host(mut self, host: impl Into<String>) -> Self {
        self.imap_host = Some(host.into());
        self
    }

    /// Sets the IMAP server port. Default is 993 (IMAPS).
    #[must_use]
    pub fn imap_port(mut self, port: u16) -> Self {
        self.imap_port = Some(port);
        self
    }

    /// Sets per-operation timeouts.
    #[must_use]
    pub fn timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = Some(timeouts);
        self
    }

    /// Sets polling knobs.
    #[must_use]
    pub fn polling(mut self, polling: PollingConfig) -> Self {
        self.polling = Some(polling);
        self
    }

    /// Sets the interval between poll cycles.
    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.polling
            .get_or_insert_with(PollingConfig::default)
            .interval = interval;
        self
    }

    /// Sets the clock-skew margin for message timestamps.
    #[must_use]
    pub fn skew_margin(mut self, margin: Duration) -> Self {
        self.polling
            .get_or_insert_with(PollingConfig::default)
            .skew_margin = margin;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCredential`] if the address or password is
    /// absent, or [`Error::InvalidEmailFormat`] if the address is malformed.
    pub fn build(self) -> Result<EmailConfig> {
        let address_raw = self.address.ok_or(Error::MissingCredential {
            name: "email address",
        })?;

        let address = EmailAddress::parse_with_options(&address_raw, email_address::Options::default())
            .map_err(|_| Error::InvalidEmailFormat {
                email: address_raw.clone(),
            })?;

        let password = self.password.ok_or(Error::MissingCredential {
            name: "email password",
        })?;

        Ok(EmailConfig {
            address,
            password: SecretString::from(password),
            imap_host: self.imap_host,
            imap_port: self.imap_port.unwrap_or(993),
            timeouts: self.timeouts.unwrap_or_default(),
            polling: self.polling.unwrap_or_default(),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SMS channel
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration for the SMS channel provider.
///
/// Create using [`SmsConfig::builder()`] or [`SmsConfig::from_env()`].
#[derive(Clone)]
pub struct SmsConfig {
    /// The inbox-query service to poll.
    pub service: SmsService,
    api_key: SecretString,
    virtual_number: String,
    /// Bounded timeout for each inbox query.
    pub http_timeout: Duration,
    /// How many of the most recent messages to inspect per cycle.
    pub fetch_limit: usize,
    /// Polling knobs.
    pub polling: PollingConfig,
}

impl std::fmt::Debug for SmsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmsConfig")
            .field("service", &self.service)
            .field("api_key", &"[REDACTED]")
            .field("virtual_number", &self.virtual_number)
            .field("http_timeout", &self.http_timeout)
            .field("fetch_limit", &self.fetch_limit)
            .field("polling", &self.polling)
            .finish()
    }
}

impl SmsConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> SmsConfigBuilder {
        SmsConfigBuilder::default()
    }

    /// Builds a configuration from the environment: `OTP_SMS_API_KEY`,
    /// `OTP_SMS_NUMBER`, and optionally `OTP_SMS_SERVICE`
    /// (`"textlocal"` or `"msg91"`, default textlocal).
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCredential`] naming the absent variable's
    /// credential, or [`Error::InvalidConfig`] for an unknown service name.
    pub fn from_env() -> Result<Self> {
        let mut builder = Self::builder();

        if let Ok(service) = std::env::var("OTP_SMS_SERVICE") {
            builder = builder.service(service.parse()?);
        }
        if let Ok(api_key) = std::env::var("OTP_SMS_API_KEY") {
            builder = builder.api_key(api_key);
        }
        if let Ok(number) = std::env::var("OTP_SMS_NUMBER") {
            builder = builder.virtual_number(number);
        }

        builder.build()
    }

    /// Returns the service API key.
    #[must_use]
    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    /// Returns the registered virtual number whose inbox is polled.
    #[must_use]
    pub fn virtual_number(&self) -> &str {
        &self.virtual_number
    }
}

/// Builder for [`SmsConfig`].
#[derive(Debug, Default)]
pub struct SmsConfigBuilder {
    service: Option<SmsService>,
    api_key: Option<String>,
    virtual_number: Option<String>,
    http_timeout: Option<Duration>,
    fetch_limit: Option<usize>,
    polling: Option<PollingConfig>,
}

impl SmsConfigBuilder {
    /// Selects the inbox-query service. Default is
    /// [`SmsService::Textlocal`].
    #[must_use]
    pub fn service(mut self, service: SmsService) -> Self {
        self.service = Some(service);
        self
    }

    /// Sets the service API key (required).
    #[must_use]
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets the registered virtual number (required).
    #[must_use]
    pub fn virtual_number(mut self, number: impl Into<String>) -> Self {
        self.virtual_number = Some(number.into());
        self
    }

    /// Sets the per-query HTTP timeout. Default is 10 seconds.
    #[must_use]
    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = Some(timeout);
        self
    }

    /// Sets how many recent messages to inspect per cycle. Default is 10.
    #[must_use]
    pub fn fetch_limit(mut self, limit: usize) -> Self {
        self.fetch_limit = Some(limit);
        self
    }

    /// Sets polling knobs.
    #[must_use]
    pub fn polling(mut self, polling: PollingConfig) -> Self {
        self.polling = Some(polling);
        self
    }

    /// Sets the interval between poll cycles.
    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.polling
            .get_or_insert_with(PollingConfig::default)
            .interval = interval;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCredential`] if the API key or virtual
    /// number is absent.
    pub fn build(self) -> Result<SmsConfig> {
        let api_key = self.api_key.ok_or(Error::MissingCredential {
            name: "sms api key",
        })?;

        let virtual_number = self.virtual_number.ok_or(Error::MissingCredential {
            name: "sms virtual number",
        })?;

        Ok(SmsConfig {
            service: self.service.unwrap_or(SmsService::Textlocal),
            api_key: SecretString::from(api_key),
            virtual_number,
            http_timeout: self.http_timeout.unwrap_or(Duration::from_secs(10)),
            fetch_limit: self.fetch_limit.unwrap_or(10),
            polling: self.polling.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_builder_minimal() {
        let config = EmailConfig::builder()
            .address("clerk@example.com")
            .password("secret")
            .build()
            .unwrap();

        assert_eq!(config.address(), "clerk@example.com");
        assert_eq!(config.password(), "secret");
        assert_eq!(config.imap_port, 993);
        assert_eq!(config.effective_imap_host(), "imap.example.com");
    }

    #[test]
    fn test_email_builder_missing_credentials_named() {
        let err = EmailConfig::builder().password("secret").build().unwrap_err();
        assert!(err.to_string().contains("email address"));

        let err = EmailConfig::builder()
            .address("clerk@example.com")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("email password"));
    }

    #[test]
    fn test_email_builder_invalid_address() {
        let result = EmailConfig::builder()
            .address("not-an-address")
            .password("secret")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_email_explicit_host_overrides_discovery() {
        let config = EmailConfig::builder()
            .address("clerk@gmail.com")
            .password("secret")
            .imap_host("mail.internal.example")
            .build()
            .unwrap();

        assert_eq!(config.effective_imap_host(), "mail.internal.example");
        assert_eq!(config.server_address(), "mail.internal.example:993");
    }

    #[test]
    fn test_discovery_table() {
        assert_eq!(discover_imap_host("a@gmail.com"), "imap.gmail.com");
        assert_eq!(discover_imap_host("a@rediffmail.com"), "imap.rediffmail.com");
        assert_eq!(discover_imap_host("a@YAHOO.IN"), "imap.mail.yahoo.com");
        assert_eq!(discover_imap_host("a@unknown.org"), "imap.unknown.org");
    }

    #[test]
    fn test_email_password_not_in_debug() {
        let config = EmailConfig::builder()
            .address("clerk@example.com")
            .password("super-secret-password")
            .build()
            .unwrap();

        let debug_str = format!("{config:?}");
        assert!(!debug_str.contains("super-secret-password"));
        assert!(debug_str.contains("[REDACTED]"));
    }

    #[test]
    fn test_sms_builder_minimal() {
        let config = SmsConfig::builder()
            .api_key("key-123")
            .virtual_number("917700012345")
            .build()
            .unwrap();

        assert_eq!(config.service, SmsService::Textlocal);
        assert_eq!(config.api_key(), "key-123");
        assert_eq!(config.virtual_number(), "917700012345");
        assert_eq!(config.fetch_limit, 10);
    }

    #[test]
    fn test_sms_builder_missing_credentials_named() {
        let err = SmsConfig::builder()
            .virtual_number("917700012345")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("sms api key"));

        let err = SmsConfig::builder().api_key("key-123").build().unwrap_err();
        assert!(err.to_string().contains("sms virtual number"));
    }

    #[test]
    fn test_sms_key_not_in_debug() {
        let config = SmsConfig::builder()
            .api_key("very-secret-key")
            .virtual_number("917700012345")
            .build()
            .unwrap();

        let debug_str = format!("{config:?}");
        assert!(!debug_str.contains("very-secret-key"));
    }

    #[test]
    fn test_polling_defaults() {
        let polling = PollingConfig::default();
        assert_eq!(polling.interval, Duration::from_secs(5));
        assert_eq!(polling.skew_margin, Duration::from_secs(60));
    }
}
