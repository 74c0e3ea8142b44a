//! Integration tests for otp-sync.
//!
//! These tests require real channel credentials and are disabled by
//! default. To run them:
//!
//! ```bash
//! # Email channel
//! export OTP_SYNC_TEST_EMAIL="your@email.com"
//! export OTP_SYNC_TEST_PASSWORD="your-app-password"
//!
//! # SMS channel (Textlocal-style gateway)
//! export OTP_SYNC_TEST_SMS_KEY="api-key"
//! export OTP_SYNC_TEST_SMS_NUMBER="917700012345"
//!
//! # Run with the integration-tests feature
//! cargo test --features integration-tests -- --ignored
//! ```

use otp_sync::{
    ChannelType, EmailConfig, EmailOtpProvider, OtpHandler, OtpProvider, SmsConfig,
    SmsOtpProvider,
};
use std::env;
use std::sync::Arc;
use std::time::Duration;

// ─────────────────────────────────────────────────────────────────────────────
// Test Configuration Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn email_test_config() -> Option<EmailConfig> {
    dotenvy::dotenv().ok();
    let address = env::var("OTP_SYNC_TEST_EMAIL").ok()?;
    let password = env::var("OTP_SYNC_TEST_PASSWORD").ok()?;

    EmailConfig::builder()
        .address(address)
        .password(password)
        .poll_interval(Duration::from_secs(2))
        .build()
        .ok()
}

fn sms_test_config() -> Option<SmsConfig> {
    dotenvy::dotenv().ok();
    let api_key = env::var("OTP_SYNC_TEST_SMS_KEY").ok()?;
    let number = env::var("OTP_SYNC_TEST_SMS_NUMBER").ok()?;

    SmsConfig::builder()
        .api_key(api_key)
        .virtual_number(number)
        .poll_interval(Duration::from_secs(2))
        .build()
        .ok()
}

// ─────────────────────────────────────────────────────────────────────────────
// Live Email Channel Tests
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
#[ignore = "requires real IMAP credentials"]
async fn test_email_wait_for_code() {
    let config = email_test_config().expect("Test config from environment variables");
    let provider = EmailOtpProvider::new(config);

    println!("Send yourself an email containing an OTP within 2 minutes...");
    match provider.get_otp(Duration::from_secs(120), 0).await {
        Some(code) => {
            assert!(code.len() >= 4 && code.len() <= 8);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
        None => println!("No code arrived before the deadline (expected if none sent)"),
    }
}

#[tokio::test]
#[ignore = "requires real IMAP credentials"]
async fn test_email_short_timeout_returns_none() {
    let config = email_test_config().expect("Test config from environment variables");
    let provider = EmailOtpProvider::new(config);

    // Nothing should arrive within two seconds of an unannounced attempt
    let code = provider.get_otp(Duration::from_secs(2), 0).await;
    assert_eq!(code, None);
}

// ─────────────────────────────────────────────────────────────────────────────
// Live SMS Channel Tests
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
#[ignore = "requires real SMS gateway credentials"]
async fn test_sms_wait_for_code() {
    let config = sms_test_config().expect("Test config from environment variables");
    let provider = SmsOtpProvider::new(config).expect("HTTP client");

    println!("Trigger an SMS to the virtual number within 2 minutes...");
    match provider.get_otp(Duration::from_secs(120), 0).await {
        Some(code) => {
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
        None => println!("No code arrived before the deadline (expected if none sent)"),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Handler Wiring Tests (no network)
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_handler_wiring_with_real_providers() {
    let config = EmailConfig::builder()
        .address("clerk@example.com")
        .password("secret")
        .build()
        .expect("valid config");

    let handler = OtpHandler::new();
    handler.register_provider(ChannelType::Email, Arc::new(EmailOtpProvider::new(config)));

    // Offline extraction goes through the registered provider
    assert_eq!(
        handler.extract_otp_from_text("Your OTP is 482913.", ChannelType::Email),
        Some("482913".to_string())
    );
    assert_eq!(
        handler.extract_otp_from_text("Your OTP is 482913.", ChannelType::Sms),
        None
    );
}

#[tokio::test]
async fn test_missing_credentials_fail_fast() {
    let err = EmailConfig::builder()
        .address("clerk@example.com")
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("email password"));

    let err = SmsConfig::builder().build().unwrap_err();
    assert!(err.to_string().contains("sms api key"));
}
