//! SMS types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::common::null_as_default;

/// An SMS message as stored by EKDSend.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Sms {
    /// Message ID.
    pub id: String,

    /// Delivery status.
    pub status: String,

    /// Recipient phone number (E.164).
    pub to: String,

    /// Sender ID or phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,

    /// Message text.
    pub message: String,

    /// Number of billed segments.
    #[serde(default)]
    pub segments: u32,

    /// Caller-supplied metadata.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "HashMap::is_empty"
    )]
    pub metadata: HashMap<String, String>,

    /// Creation time.
    pub created_at: DateTime<Utc>,

    /// Time the message was handed to the carrier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,

    /// Time the carrier confirmed delivery.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<DateTime<Utc>>,
}

/// Parameters for sending an SMS.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SendSmsParams {
    /// Recipient phone number (E.164).
    pub to: String,

    /// Message text.
    pub message: String,

    /// Sender ID or phone number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,

    /// Deliver at this time instead of immediately.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,

    /// URL notified on status changes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,

    /// Caller-supplied metadata.
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

impl SendSmsParams {
    /// Creates parameters with the required fields.
    pub fn new(to: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            message: message.into(),
            ..Default::default()
        }
    }

    /// Sets the sender.
    pub fn from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    /// Schedules delivery.
    pub fn scheduled_at(mut self, at: DateTime<Utc>) -> Self {
        self.scheduled_at = Some(at);
        self
    }

    /// Sets the status webhook.
    pub fn webhook_url(mut self, url: impl Into<String>) -> Self {
        self.webhook_url = Some(url.into());
        self
    }

    /// Adds a metadata entry.
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_send_params_serialize() {
        let params = SendSmsParams::new("+15551234567", "Your code is 1234")
            .from("EKDSend")
            .metadata("user_id", "42");

        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            json!({
                "to": "+15551234567",
                "message": "Your code is 1234",
                "from": "EKDSend",
                "metadata": {"user_id": "42"}
            })
        );
    }

    #[test]
    fn test_sms_deserializes() {
        let sms: Sms = serde_json::from_value(json!({
            "id": "sms_1",
            "status": "delivered",
            "to": "+15551234567",
            "message": "hi",
            "segments": 1,
            "created_at": "2024-01-15T10:30:00Z",
            "delivered_at": "2024-01-15T10:30:05Z"
        }))
        .unwrap();

        assert_eq!(sms.segments, 1);
        assert!(sms.from.is_none());
        assert!(sms.delivered_at.is_some());
    }

    #[test]
    fn test_sms_null_metadata_reads_as_empty() {
        let sms: Sms = serde_json::from_value(json!({
            "id": "sms_2",
            "status": "queued",
            "to": "+15551234567",
            "message": "hi",
            "metadata": null,
            "created_at": "2024-01-15T10:30:00Z"
        }))
        .unwrap();

        assert!(sms.metadata.is_empty());
    }
}
