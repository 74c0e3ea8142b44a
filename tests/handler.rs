//! Handler dispatch and timing contract tests using mock providers.
//!
//! These run under tokio's paused clock (`start_paused`), so the
//! wall-clock assertions are exact and the suite finishes instantly.

use async_trait::async_trait;
use otp_sync::{ChannelType, OtpHandler, OtpProvider, OtpStats};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Finds a code on its first poll cycle.
struct InstantProvider {
    channel: ChannelType,
}

#[async_trait]
impl OtpProvider for InstantProvider {
    async fn get_otp(&self, _timeout: Duration, _retry_count: u32) -> Option<String> {
        Some("482913".into())
    }

    fn extract_otp(&self, text: &str) -> Option<String> {
        otp_sync::extract_otp(text)
    }

    fn channel(&self) -> ChannelType {
        self.channel
    }

    fn description(&self) -> &str {
        "instant mock"
    }
}

/// Polls on a fixed interval and never finds a code; counts attempts.
struct NeverProvider {
    interval: Duration,
    attempts: AtomicU32,
}

impl NeverProvider {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            attempts: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl OtpProvider for NeverProvider {
    async fn get_otp(&self, timeout: Duration, retry_count: u32) -> Option<String> {
        for _ in 0..=retry_count {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            let deadline = tokio::time::Instant::now() + timeout;
            while tokio::time::Instant::now() < deadline {
                tokio::time::sleep(self.interval).await;
            }
        }
        None
    }

    fn extract_otp(&self, text: &str) -> Option<String> {
        otp_sync::extract_otp(text)
    }

    fn channel(&self) -> ChannelType {
        ChannelType::Sms
    }

    fn description(&self) -> &str {
        "never-matching mock"
    }
}

#[tokio::test(start_paused = true)]
async fn first_cycle_success_returns_without_waiting_out_the_timeout() {
    let handler = OtpHandler::new();
    handler.register_provider(
        ChannelType::Email,
        Arc::new(InstantProvider {
            channel: ChannelType::Email,
        }),
    );

    let started = tokio::time::Instant::now();
    let code = handler
        .get_otp(ChannelType::Email, Duration::from_secs(300), false)
        .await;

    assert_eq!(code.as_deref(), Some("482913"));
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn exhaustion_returns_none_after_approximately_the_timeout() {
    let provider = Arc::new(NeverProvider::new(Duration::from_secs(1)));
    let handler = OtpHandler::new();
    handler.register_provider(ChannelType::Sms, provider.clone());

    let started = tokio::time::Instant::now();
    let code = handler
        .get_otp(ChannelType::Sms, Duration::from_secs(10), false)
        .await;

    assert_eq!(code, None);
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(10), "returned early: {elapsed:?}");
    assert!(elapsed <= Duration::from_secs(12), "overshot: {elapsed:?}");
    assert_eq!(provider.attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn retry_on_failure_runs_one_extra_attempt() {
    let provider = Arc::new(NeverProvider::new(Duration::from_secs(1)));
    let handler = OtpHandler::new();
    handler.register_provider(ChannelType::Sms, provider.clone());

    let started = tokio::time::Instant::now();
    let code = handler
        .get_otp(ChannelType::Sms, Duration::from_secs(5), true)
        .await;

    assert_eq!(code, None);
    assert_eq!(provider.attempts.load(Ordering::SeqCst), 2);
    assert!(started.elapsed() >= Duration::from_secs(10));
}

#[tokio::test]
async fn unregistered_channel_is_a_soft_failure() {
    let handler = OtpHandler::new();

    // No provider registered: absence, no panic, immediate return
    let code = handler
        .get_otp(ChannelType::Email, Duration::from_secs(60), true)
        .await;
    assert_eq!(code, None);
}

#[tokio::test(start_paused = true)]
async fn concurrent_attempts_do_not_serialize() {
    let handler = Arc::new(OtpHandler::new());
    handler.register_provider(
        ChannelType::Email,
        Arc::new(InstantProvider {
            channel: ChannelType::Email,
        }),
    );
    handler.register_provider(
        ChannelType::Sms,
        Arc::new(NeverProvider::new(Duration::from_secs(1))),
    );

    let slow = {
        let handler = handler.clone();
        tokio::spawn(async move {
            handler
                .get_otp(ChannelType::Sms, Duration::from_secs(30), false)
                .await
        })
    };

    // The email attempt completes while the SMS attempt is still polling
    let started = tokio::time::Instant::now();
    let code = handler
        .get_otp(ChannelType::Email, Duration::from_secs(30), false)
        .await;
    assert_eq!(code.as_deref(), Some("482913"));
    assert!(started.elapsed() < Duration::from_secs(1));

    assert_eq!(slow.await.unwrap(), None);
}

#[tokio::test(start_paused = true)]
async fn call_sites_can_record_outcomes() {
    let handler = OtpHandler::new();
    handler.register_provider(
        ChannelType::Email,
        Arc::new(InstantProvider {
            channel: ChannelType::Email,
        }),
    );

    let stats = OtpStats::new();

    let started = tokio::time::Instant::now();
    match handler
        .get_otp(ChannelType::Email, Duration::from_secs(60), false)
        .await
    {
        Some(_code) => stats.record_success(started.elapsed()),
        None => stats.record_failure(),
    }

    match handler
        .get_otp(ChannelType::Sms, Duration::from_secs(60), false)
        .await
    {
        Some(_code) => stats.record_success(started.elapsed()),
        None => stats.record_failure(),
    }

    let report = stats.report();
    assert_eq!(report.total_requests, 2);
    assert_eq!(report.successful, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.total_requests, report.successful + report.failed);
}
