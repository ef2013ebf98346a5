//! Type definitions for the EKDSend API.
//!
//! Request parameters and response resources for email, SMS and voice,
//! plus the envelopes and paging types they share.

pub mod common;
pub mod email;
pub mod sms;
pub mod voice;

pub use common::{DataEnvelope, ListParams, PaginatedResponse};
pub use email::{Attachment, Email, ListEmailsParams, SendEmailParams};
pub use sms::{SendSmsParams, Sms};
pub use voice::{CreateCallParams, Recording, VoiceCall, DEFAULT_LANGUAGE, DEFAULT_VOICE};
