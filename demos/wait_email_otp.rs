//! Basic example: wait for an OTP code to arrive by email.
//!
//! # Usage
//!
//! ```bash
//! export OTP_EMAIL_ADDRESS="your@email.com"
//! export OTP_EMAIL_PASSWORD="your-app-password"
//! cargo run --example wait_email_otp
//! ```
//!
//! For Gmail, you'll need to use an [App Password](https://support.google.com/accounts/answer/185833).

use otp_sync::{ChannelType, EmailConfig, EmailOtpProvider, OtpHandler, OtpStats};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[tokio::main]
async fn main() -> otp_sync::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "otp_sync=debug".into()),
        )
        .init();

    // Credentials come from OTP_EMAIL_ADDRESS / OTP_EMAIL_PASSWORD
    let config = EmailConfig::from_env()?;
    println!("Polling inbox of {}...", config.address());

    let handler = OtpHandler::new();
    handler.register_provider(ChannelType::Email, Arc::new(EmailOtpProvider::new(config)));

    println!("Waiting for OTP (send yourself an email with a code, or Ctrl+C)...");

    let stats = OtpStats::global();
    let started = Instant::now();

    match handler
        .get_otp(ChannelType::Email, Duration::from_secs(120), true)
        .await
    {
        Some(code) => {
            stats.record_success(started.elapsed());
            println!("Got OTP code: {code}");
        }
        None => {
            stats.record_failure();
            println!("No code arrived before the deadline");
        }
    }

    println!("Stats: {}", stats.report());

    Ok(())
}
