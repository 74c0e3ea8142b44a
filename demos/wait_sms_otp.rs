//! Wait for an OTP code to arrive at an SMS gateway's virtual number.
//!
//! # Usage
//!
//! ```bash
//! export OTP_SMS_SERVICE="textlocal"   # or "msg91"
//! export OTP_SMS_API_KEY="api-key"
//! export OTP_SMS_NUMBER="917700012345"
//! cargo run --example wait_sms_otp
//! ```

use otp_sync::{ChannelType, OtpHandler, SmsConfig, SmsOtpProvider};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> otp_sync::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "otp_sync=debug".into()),
        )
        .init();

    let config = SmsConfig::from_env()?;
    println!(
        "Polling {} inbox for {}...",
        config.service,
        config.virtual_number()
    );

    let handler = OtpHandler::new();
    handler.register_provider(ChannelType::Sms, Arc::new(SmsOtpProvider::new(config)?));

    println!("Waiting for OTP (trigger an SMS to the virtual number, or Ctrl+C)...");

    match handler
        .get_otp(ChannelType::Sms, Duration::from_secs(120), false)
        .await
    {
        Some(code) => println!("Got OTP code: {code}"),
        None => println!("No code arrived before the deadline"),
    }

    Ok(())
}
