//! # otp-sync
//!
//! Async retrieval of one-time passwords (OTPs) from email and SMS inboxes,
//! with ordered pattern extraction tuned for the noisy bilingual messages
//! Indian municipal portals send.
//!
//! This crate provides a high-level, async API for:
//! - Waiting, with a bounded timeout, for a verification code to arrive in
//!   an IMAP mailbox or an SMS gateway inbox
//! - Extracting the code from semi-structured English/Hindi text without
//!   mistaking phone numbers for codes
//! - Extracting and validating the tracking/reference ID a portal issues
//!   on its submission success page
//!
//! ## Features
//!
//! - **`observability`**: Enables OpenTelemetry integration for distributed
//!   tracing. Without this feature, tracing spans are still emitted but
//!   require no OTEL dependencies.
//!
//! ## Quick Start
//!
//! ```no_run
//! use otp_sync::{ChannelType, EmailConfig, EmailOtpProvider, OtpHandler};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> otp_sync::Result<()> {
//! // Configure the email channel (fails fast on a missing credential)
//! let config = EmailConfig::builder()
//!     .address("clerk@rediffmail.com")
//!     .password("app-password")  // Use app-specific password for Gmail
//!     .build()?;
//!
//! // Wire the handler once, then share it
//! let handler = OtpHandler::new();
//! handler.register_provider(ChannelType::Email, Arc::new(EmailOtpProvider::new(config)));
//!
//! // Wait up to two minutes for a code
//! match handler.get_otp(ChannelType::Email, Duration::from_secs(120), true).await {
//!     Some(code) => println!("Got OTP: {code}"),
//!     None => println!("No code before the deadline"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Offline extraction
//!
//! The extractors are pure functions and usable without any channel:
//!
//! ```
//! use otp_sync::{extract_otp, tracking};
//!
//! assert_eq!(extract_otp("Your OTP is 482913."), Some("482913".to_string()));
//!
//! let page = "Your complaint has been successfully registered. Reference ID: GRV2024/001234";
//! assert_eq!(
//!     tracking::extract_tracking_id(page, None).as_deref(),
//!     Some("GRV2024/001234")
//! );
//! ```
//!
//! ## Retrieval semantics
//!
//! A retrieval attempt computes its deadline once, then repeats poll cycles
//! (connect, fetch, inspect, disconnect) on a fixed interval. Transient
//! channel failures are absorbed per cycle; exhausting the deadline yields
//! `None`, never an error. Each attempt keeps its own seen-set of message
//! IDs, so a message is inspected at most once per attempt. Concurrent
//! attempts on different channels never block each other.
//!
//! ## Statistics
//!
//! Call sites can record outcomes on an [`OtpStats`] tracker and read a
//! derived report:
//!
//! ```
//! use otp_sync::OtpStats;
//! use std::time::Duration;
//!
//! let stats = OtpStats::new();
//! stats.record_success(Duration::from_secs(3));
//! println!("{}", stats.report());
//! ```
//!
//! ## Observability
//!
//! The crate uses `tracing` for instrumentation. All major operations emit
//! spans with structured fields suitable for distributed tracing.
//!
//! ### Span Naming Convention
//!
//! - `OtpHandler::get_otp` - Dispatch to a registered provider
//! - `EmailOtpProvider::get_otp` / `SmsOtpProvider::get_otp` - One retrieval
//! - `session::authenticate` - IMAP authentication
//! - `connection::establish_tls` - TLS connection
//!
//! Credentials never appear in spans or logs.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Public modules
pub mod config;
pub mod error;
pub mod extractor;
pub mod handler;
pub mod provider;
pub mod stats;
pub mod tracking;

// Channel providers
pub mod email;
pub mod sms;

// Internal modules
mod connection;
mod parser;
mod session;

// Re-exports for ergonomic API
pub use config::{EmailConfig, EmailConfigBuilder, PollingConfig, SmsConfig, SmsConfigBuilder, TimeoutConfig};
pub use email::EmailOtpProvider;
pub use email_address::EmailAddress;
pub use error::{Error, ErrorCategory, Result};
pub use extractor::{extract_otp, Matcher, OtpExtractor};
pub use handler::OtpHandler;
pub use provider::{ChannelType, OtpProvider};
pub use sms::{SmsOtpProvider, SmsService};
pub use stats::{OtpStats, StatsReport};
