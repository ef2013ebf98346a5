//! EKDSend Client Library
//!
//! A Rust client for the EKDSend email, SMS and voice API. Every call goes
//! through one request executor that rate limits, retries transient
//! failures, and maps error responses to typed errors.
//!
//! # Features
//!
//! - **Email, SMS, Voice**: send, inspect, list and cancel messages and calls
//! - **Resilience**: token bucket rate limiting, retries with exponential backoff
//! - **Cancellation**: every call takes a `CancellationToken`
//! - **Typed Errors**: one variant per failure kind, with request ids
//! - **Debug Output**: optional request/response log with secrets redacted
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use ekdsend_client::{CreateCallParams, EkdSendClient, SendSmsParams};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = EkdSendClient::from_env()?;
//!     let cancel = CancellationToken::new();
//!
//!     let sms = client
//!         .sms()
//!         .send(&SendSmsParams::new("+15551234567", "Your code is 1234"), &cancel)
//!         .await?;
//!     println!("sms {} is {}", sms.id, sms.status);
//!
//!     let call = client
//!         .calls()
//!         .create(
//!             &CreateCallParams::tts("+15551234567", "+15557654321", "Your code is 1 2 3 4"),
//!             &cancel,
//!         )
//!         .await?;
//!     println!("call {} is {}", call.id, call.status);
//!     Ok(())
//! }
//! ```
//!
//! # Pagination
//!
//! ```rust,no_run
//! use ekdsend_client::{EkdSendClient, ListEmailsParams};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run(client: EkdSendClient) -> ekdsend_client::EkdSendResult<()> {
//! let cancel = CancellationToken::new();
//! let mut params = ListEmailsParams::new().status("delivered");
//! loop {
//!     let page = client.emails().list(Some(&params), &cancel).await?;
//!     for email in page.iter() {
//!         println!("{} {}", email.id, email.subject);
//!     }
//!     if !page.has_more() {
//!         break;
//!     }
//!     params = params.offset(u32::try_from(page.next_offset()).unwrap_or(u32::MAX));
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod auth;
pub mod client;
pub mod config;
pub mod errors;
pub mod observability;
pub mod resilience;
pub mod services;
pub mod transport;
pub mod types;

// Re-exports for convenience
pub use client::{EkdSendClient, EkdSendClientBuilder, RequestExecutor};
pub use config::{EkdSendConfig, EkdSendConfigBuilder};
pub use errors::{ApiErrorInfo, EkdSendError, EkdSendResult};
pub use resilience::{RateLimiter, RetryConfig, TokenBucketLimiter};

// Type re-exports
pub use types::common::{ListParams, PaginatedResponse};
pub use types::email::{Attachment, Email, ListEmailsParams, SendEmailParams};
pub use types::sms::{SendSmsParams, Sms};
pub use types::voice::{CreateCallParams, Recording, VoiceCall};

/// Mock implementations for testing.
#[cfg(any(test, feature = "mocks"))]
pub mod mocks;
