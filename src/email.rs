//! Email channel provider: polls an IMAP inbox for a verification code.
//!
//! Each retrieval attempt runs `IDLE → POLLING → (FOUND | TIMED_OUT)`:
//! on a fixed interval the provider opens a fresh IMAP session, searches
//! messages received since shortly before the attempt started, inspects
//! unseen ones newest-first, and closes the session again. The first
//! extracted code ends the attempt; reaching the deadline ends it with
//! absence. A failed cycle is logged and absorbed, never fatal.
//!
//! # Example
//!
//! ```no_run
//! use otp_sync::{EmailConfig, EmailOtpProvider, OtpProvider};
//! use std::time::Duration;
//!
//! # async fn example() -> otp_sync::Result<()> {
//! let config = EmailConfig::builder()
//!     .address("clerk@rediffmail.com")
//!     .password("app-password")
//!     .build()?;
//!
//! let provider = EmailOtpProvider::new(config);
//! if let Some(code) = provider.get_otp(Duration::from_secs(120), 0).await {
//!     println!("Got OTP: {code}");
//! }
//! # Ok(())
//! # }
//! ```

use crate::config::EmailConfig;
use crate::connection;
use crate::error::Error;
use crate::extractor::{Matcher, OtpExtractor};
use crate::parser;
use crate::provider::{run_matcher, ChannelType, CycleOutcome, OtpProvider};
use crate::session::{self, ImapSession};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

/// OTP provider backed by an IMAP mailbox.
///
/// Create with [`EmailOtpProvider::new`]; credentials are validated when
/// the [`EmailConfig`] is built, so construction here is infallible.
pub struct EmailOtpProvider {
    config: EmailConfig,
    matcher: Arc<dyn Matcher>,
    description: String,
}

impl EmailOtpProvider {
    /// Creates a provider using the default [`OtpExtractor`].
    #[must_use]
    pub fn new(config: EmailConfig) -> Self {
        Self::with_matcher(config, Arc::new(OtpExtractor::new()))
    }

    /// Creates a provider with a custom matcher.
    #[must_use]
    pub fn with_matcher(config: EmailConfig, matcher: Arc<dyn Matcher>) -> Self {
        let description = format!("email inbox {}", config.address());
        Self {
            config,
            matcher,
            description,
        }
    }

    /// One full polling attempt: fresh deadline, fresh seen-set.
    #[instrument(
        name = "EmailOtpProvider::poll_attempt",
        skip(self),
        fields(email = %self.config.address(), timeout_secs = timeout.as_secs())
    )]
    async fn poll_attempt(&self, timeout: Duration) -> Option<String> {
        let start = Utc::now();
        let deadline = Instant::now() + timeout;
        let mut seen: HashSet<u32> = HashSet::new();

        loop {
            if Instant::now() >= deadline {
                debug!(timeout_secs = timeout.as_secs(), "Attempt deadline reached");
                return None;
            }

            match self.poll_cycle(start, &mut seen).await {
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

    /// One poll cycle: connect, inspect, disconnect.
    ///
    /// The session never outlives the cycle, whatever the outcome.
    async fn poll_cycle(&self, start: DateTime<Utc>, seen: &mut HashSet<u32>) -> CycleOutcome {
        let mut session = match self.open_session().await {
            Ok(session) => session,
            Err(error) => return CycleOutcome::Transient(error),
        };

        let outcome = self.inspect_new_messages(&mut session, start, seen).await;

        match tokio::time::timeout(self.config.timeouts.logout, session::logout(&mut session))
            .await
        {
            Ok(Ok(())) => {}
            Ok(Err(error)) => debug!(error = %error, "Logout failed, dropping connection"),
            Err(_) => debug!("Logout timed out, dropping connection"),
        }

        outcome
    }

    /// Opens a TLS connection, authenticates, and selects INBOX.
    async fn open_session(&self) -> crate::Result<ImapSession> {
        let imap_host = self.config.effective_imap_host();
        let target_addr = self.config.server_address();
        let timeouts = &self.config.timeouts;

        let tls_stream = tokio::time::timeout(
            timeouts.connect,
            connection::establish_tls_connection(&imap_host, &target_addr),
        )
        .await
        .map_err(|_| Error::ConnectTimeout {
            target: target_addr.clone(),
            timeout: timeouts.connect,
        })??;

        let mut session = tokio::time::timeout(
            timeouts.auth,
            session::authenticate(tls_stream, self.config.address(), self.config.password()),
        )
        .await
        .map_err(|_| Error::AuthTimeout {
            email: self.config.address().to_string(),
            timeout: timeouts.auth,
        })??;

        tokio::time::timeout(
            timeouts.select,
            session::select_mailbox(&mut session, "INBOX"),
        )
        .await
        .map_err(|_| Error::SelectTimeout {
            mailbox: "INBOX".to_string(),
            timeout: timeouts.select,
        })??;

        Ok(session)
    }

    /// Searches the attempt window and runs the matcher over unseen
    /// messages, newest first.
    async fn inspect_new_messages(
        &self,
        session: &mut ImapSession,
        start: DateTime<Utc>,
        seen: &mut HashSet<u32>,
    ) -> CycleOutcome {
        let timeouts = &self.config.timeouts;
        let skew = chrono::Duration::from_std(self.config.polling.skew_margin)
            .unwrap_or_else(|_| chrono::Duration::zero());
        let cutoff = start - skew;

        let uids = match tokio::time::timeout(
            timeouts.search,
            session::search_uids_since(session, cutoff.date_naive()),
        )
        .await
        {
            Ok(Ok(uids)) => uids,
            Ok(Err(error)) => return CycleOutcome::Transient(error),
            Err(_) => {
                return CycleOutcome::Transient(Error::SearchTimeout {
                    timeout: timeouts.search,
                })
            }
        };

        for uid in uids.into_iter().rev() {
            if !seen.insert(uid) {
                continue;
            }

            let fetched = match tokio::time::timeout(
                timeouts.fetch,
                session::fetch_message(session, uid),
            )
            .await
            {
                Ok(Ok(fetched)) => fetched,
                Ok(Err(error)) => return CycleOutcome::Transient(error),
                Err(_) => {
                    return CycleOutcome::Transient(Error::FetchTimeout {
                        uid,
                        timeout: timeouts.fetch,
                    })
                }
            };

            let Some(message) = fetched else {
                debug!(uid, "UID vanished between search and fetch");
                continue;
            };

            // SINCE is day-granular; re-filter on the actual receive time
            if let Some(received) = message.internal_date() {
                if received.with_timezone(&Utc) < cutoff {
                    debug!(uid, "Message predates the attempt, skipping");
                    continue;
                }
            }

            let Some(body) = message.body() else {
                debug!(uid, "Message has no body");
                continue;
            };

            let text = match parser::extract_body_text(body) {
                Ok(text) => text,
                Err(error) => {
                    warn!(uid, error = %error, "Failed to parse email, skipping message");
                    continue;
                }
            };

            if let Some(code) = run_matcher(self.matcher.as_ref(), &text) {
                debug!(uid, matcher = %self.matcher.description(), "Found code in email");
                return CycleOutcome::Found(code);
            }
        }

        CycleOutcome::NoCode
    }
}

#[async_trait]
impl OtpProvider for EmailOtpProvider {
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
        ChannelType::Email
    }

    fn description(&self) -> &str {
        &self.description
    }
}

impl std::fmt::Debug for EmailOtpProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailOtpProvider")
            .field("email", &self.config.address())
            .field("imap_host", &self.config.effective_imap_host())
            .field("matcher", &self.matcher.description())
            .finish_non_exhaustive()
    }
}
