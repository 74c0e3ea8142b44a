//! SMS channel provider: polls an HTTP inbox-query API for a verification
//! code sent to a registered virtual number.
//!
//! Two gateway services are supported. They differ in endpoint and payload
//! shape but share the polling contract, and both reduce to the same
//! normalized inbox message before matching. As with the email channel, a
//! failed cycle (request error, non-2xx, undecodable payload) is absorbed
//! and the loop continues until the attempt deadline.

use crate::config::SmsConfig;
use crate::error::{Error, Result};
use crate::extractor::{Matcher, OtpExtractor};
use crate::provider::{run_matcher, ChannelType, CycleOutcome, OtpProvider};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

const TEXTLOCAL_ENDPOINT: &str = "https://api.textlocal.in/get_messages/";
const MSG91_ENDPOINT: &str = "https://control.msg91.com/api/v5/inbound";

/// The SMS inbox-query service to poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmsService {
    /// Textlocal inbox API (`get_messages`).
    Textlocal,
    /// MSG91 inbound-report API.
    Msg91,
}

impl SmsService {
    /// Service name used in errors and logs.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            SmsService::Textlocal => "textlocal",
            SmsService::Msg91 => "msg91",
        }
    }
}

impl std::fmt::Display for SmsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for SmsService {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "textlocal" => Ok(SmsService::Textlocal),
            "msg91" => Ok(SmsService::Msg91),
            other => Err(Error::InvalidConfig {
                message: format!("unknown sms service '{other}' (expected 'textlocal' or 'msg91')"),
            }),
        }
    }
}

/// A service-agnostic inbox message.
#[derive(Debug, Clone)]
struct InboxMessage {
    id: String,
    body: String,
    /// `None` when the service timestamp failed to parse; the message is
    /// still checked for a code.
    received_at: Option<DateTime<Utc>>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Service payloads
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct TextlocalInbox {
    #[serde(default)]
    messages: Vec<TextlocalMessage>,
}

#[derive(Debug, Deserialize)]
struct TextlocalMessage {
    id: String,
    message: String,
    #[serde(default)]
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Msg91Inbox {
    #[serde(default)]
    data: Vec<Msg91Message>,
}

#[derive(Debug, Deserialize)]
struct Msg91Message {
    uuid: String,
    message: String,
    #[serde(default, rename = "receivedAt")]
    received_at: Option<String>,
}

/// Best-effort timestamp parse in the service's documented format.
fn parse_timestamp(service: SmsService, raw: &str) -> Option<DateTime<Utc>> {
    let parsed = match service {
        SmsService::Textlocal => NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
            .ok()
            .map(|dt| dt.and_utc()),
        SmsService::Msg91 => DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
    };

    if parsed.is_none() {
        debug!(service = %service, raw, "Unparseable message timestamp, message kept");
    }

    parsed
}

/// Orders messages newest-first. When every timestamp in the batch parsed,
/// sort on them; otherwise trust the API's own descending order rather
/// than dropping messages.
fn newest_first(mut messages: Vec<InboxMessage>) -> Vec<InboxMessage> {
    if messages.iter().all(|m| m.received_at.is_some()) {
        messages.sort_by(|a, b| b.received_at.cmp(&a.received_at));
    }
    messages
}

// ─────────────────────────────────────────────────────────────────────────────
// Provider
// ─────────────────────────────────────────────────────────────────────────────

/// OTP provider backed by an SMS inbox-query API.
///
/// # Example
///
/// ```no_run
/// use otp_sync::{SmsConfig, SmsOtpProvider, SmsService, OtpProvider};
/// use std::time::Duration;
///
/// # async fn example() -> otp_sync::Result<()> {
/// let config = SmsConfig::builder()
///     .service(SmsService::Textlocal)
///     .api_key("key")
///     .virtual_number("917700012345")
///     .build()?;
///
/// let provider = SmsOtpProvider::new(config)?;
/// let code = provider.get_otp(Duration::from_secs(90), 0).await;
/// # Ok(())
/// # }
/// ```
pub struct SmsOtpProvider {
    config: SmsConfig,
    client: reqwest::Client,
    matcher: Arc<dyn Matcher>,
    description: String,
}

impl SmsOtpProvider {
    /// Creates a provider using the default [`OtpExtractor`].
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: SmsConfig) -> Result<Self> {
        Self::with_matcher(config, Arc::new(OtpExtractor::new()))
    }

    /// Creates a provider with a custom matcher.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_matcher(config: SmsConfig, matcher: Arc<dyn Matcher>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|source| Error::HttpClientBuild { source })?;

        let description = format!("{} inbox for {}", config.service, config.virtual_number());

        Ok(Self {
            config,
            client,
            matcher,
            description,
        })
    }

    /// One full polling attempt: fresh deadline, fresh seen-set.
    #[instrument(
        name = "SmsOtpProvider::poll_attempt",
        skip(self),
        fields(service = %self.config.service, timeout_secs = timeout.as_secs())
    )]
    async fn poll_attempt(&self, timeout: Duration) -> Option<String> {
        let skew = chrono::Duration::from_std(self.config.polling.skew_margin)
            .unwrap_or_else(|_| chrono::Duration::zero());
        let cutoff = Utc::now() - skew;
        let deadline = Instant::now() + timeout;
        let mut seen: HashSet<String> = HashSet::new();

        loop {
            if Instant::now() >= deadline {
                debug!(timeout_secs = timeout.as_secs(), "Attempt deadline reached");
                return None;
            }

            match self.poll_cycle(cutoff, &mut seen).await {
                CycleOutcome::Found(code) => return Some(code),
                CycleOutcome::NoCode => {}
                CycleOutcome::Transient(error) => warn!(
                    error = %error,
                    category = %error.category(),
                    "Poll cycle failed, continuing until deadline"
                ),
            }

            tokio::time::sleep(self.config.polling.interval).await;
        }
    }

    /// One poll cycle: a single bounded inbox query plus matching.
    async fn poll_cycle(
        &self,
        cutoff: DateTime<Utc>,
        seen: &mut HashSet<String>,
    ) -> CycleOutcome {
        let messages = match self.fetch_inbox().await {
            Ok(messages) => messages,
            Err(error) => return CycleOutcome::Transient(error),
        };

        let mut messages = newest_first(messages);
        messages.truncate(self.config.fetch_limit);

        for message in messages {
            if !seen.insert(message.id.clone()) {
                continue;
            }

            if let Some(received) = message.received_at {
                if received < cutoff {
                    debug!(id = %message.id, "Message predates the attempt, skipping");
                    continue;
                }
            }

            if let Some(code) = run_matcher(self.matcher.as_ref(), &message.body) {
                debug!(id = %message.id, "Found code in SMS");
                return CycleOutcome::Found(code);
            }
        }

        CycleOutcome::NoCode
    }

    async fn fetch_inbox(&self) -> Result<Vec<InboxMessage>> {
        match self.config.service {
            SmsService::Textlocal => self.fetch_textlocal().await,
            SmsService::Msg91 => self.fetch_msg91().await,
        }
    }

    async fn fetch_textlocal(&self) -> Result<Vec<InboxMessage>> {
        let service = SmsService::Textlocal.name();
        let limit = self.config.fetch_limit.to_string();

        let response = self
            .client
            .get(TEXTLOCAL_ENDPOINT)
            .query(&[
                ("apikey", self.config.api_key()),
                ("number", self.config.virtual_number()),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .map_err(|source| Error::InboxRequest { service, source })?;

        if !response.status().is_success() {
            return Err(Error::InboxStatus {
                service,
                status: response.status().as_u16(),
            });
        }

        let payload: TextlocalInbox = response
            .json()
            .await
            .map_err(|source| Error::InboxDecode { service, source })?;

        Ok(payload
            .messages
            .into_iter()
            .map(|m| InboxMessage {
                id: m.id,
                body: m.message,
                received_at: m
                    .date
                    .as_deref()
                    .and_then(|raw| parse_timestamp(SmsService::Textlocal, raw)),
            })
            .collect())
    }

    async fn fetch_msg91(&self) -> Result<Vec<InboxMessage>> {
        let service = SmsService::Msg91.name();
        let limit = self.config.fetch_limit.to_string();

        let response = self
            .client
            .get(MSG91_ENDPOINT)
            .header("authkey", self.config.api_key())
            .query(&[
                ("mobile", self.config.virtual_number()),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .map_err(|source| Error::InboxRequest { service, source })?;

        if !response.status().is_success() {
            return Err(Error::InboxStatus {
                service,
                status: response.status().as_u16(),
            });
        }

        let payload: Msg91Inbox = response
            .json()
            .await
            .map_err(|source| Error::InboxDecode { service, source })?;

        Ok(payload
            .data
            .into_iter()
            .map(|m| InboxMessage {
                id: m.uuid,
                body: m.message,
                received_at: m
                    .received_at
                    .as_deref()
                    .and_then(|raw| parse_timestamp(SmsService::Msg91, raw)),
            })
            .collect())
    }
}

#[async_trait]
impl OtpProvider for SmsOtpProvider {
    async fn get_otp(&self, timeout: Duration, retry_count: u32) -> Option<String> {
        for attempt in 0..=retry_count {
            if attempt > 0 {
                debug!(attempt, "Retrying with a fresh polling attempt");
            }
            if let Some(code) = self.poll_attempt(timeout).await {
                return Some(code);
            }
        }

        None
    }

    fn extract_otp(&self, text: &str) -> Option<String> {
        run_matcher(self.matcher.as_ref(), text)
    }

    fn channel(&self) -> ChannelType {
        ChannelType::Sms
    }

    fn description(&self) -> &str {
        &self.description
    }
}

impl std::fmt::Debug for SmsOtpProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmsOtpProvider")
            .field("service", &self.config.service)
            .field("virtual_number", &self.config.virtual_number())
            .field("matcher", &self.matcher.description())
            .finish_non_exhaustive()
    }
}
