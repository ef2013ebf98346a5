//! Voice call types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::common::null_as_default;
use crate::errors::{EkdSendError, EkdSendResult};

/// Voice used when none is specified.
pub const DEFAULT_VOICE: &str = "alloy";

/// Language used when none is specified.
pub const DEFAULT_LANGUAGE: &str = "en-US";

/// A voice call as stored by EKDSend.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct VoiceCall {
    /// Call ID.
    pub id: String,

    /// Call status.
    pub status: String,

    /// Callee phone number.
    pub to: String,

    /// Caller phone number.
    pub from: String,

    /// Text spoken to the callee.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tts_message: Option<String>,

    /// Audio played to the callee.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,

    /// Synthesized voice.
    #[serde(default)]
    pub voice: String,

    /// Speech language.
    #[serde(default)]
    pub language: String,

    /// Whether the call is recorded.
    #[serde(default)]
    pub record: bool,

    /// Whether answering machines are detected.
    #[serde(default)]
    pub machine_detection: bool,

    /// Call length in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,

    /// Recording location, once available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recording_url: Option<String>,

    /// Caller-supplied metadata.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "HashMap::is_empty"
    )]
    pub metadata: HashMap<String, String>,

    /// Creation time.
    pub created_at: DateTime<Utc>,

    /// Time the callee answered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answered_at: Option<DateTime<Utc>>,

    /// Time the call ended.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

/// A call recording.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Recording {
    /// Download URL.
    pub url: String,
    /// Length in seconds.
    pub duration: u32,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Parameters for placing a voice call.
///
/// Either `tts_message` or `audio_url` must be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CreateCallParams {
    /// Callee phone number.
    pub to: String,

    /// Caller phone number.
    pub from: String,

    /// Text to speak.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tts_message: Option<String>,

    /// Audio to play.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,

    /// Synthesized voice; defaults to `alloy`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,

    /// Speech language; defaults to `en-US`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Record the call.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub record: bool,

    /// Detect answering machines.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub machine_detection: bool,

    /// URL notified on status changes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,

    /// Caller-supplied metadata.
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

impl CreateCallParams {
    /// Creates parameters for a text-to-speech call.
    pub fn tts(to: impl Into<String>, from: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            from: from.into(),
            tts_message: Some(message.into()),
            ..Default::default()
        }
    }

    /// Creates parameters for a call that plays an audio file.
    pub fn audio(to: impl Into<String>, from: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            from: from.into(),
            audio_url: Some(url.into()),
            ..Default::default()
        }
    }

    /// Sets the voice.
    pub fn voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }

    /// Sets the language.
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Enables recording.
    pub fn record(mut self, record: bool) -> Self {
        self.record = record;
        self
    }

    /// Enables answering machine detection.
    pub fn machine_detection(mut self, enabled: bool) -> Self {
        self.machine_detection = enabled;
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

    /// Checks that a speech or audio source is present.
    pub fn validate(&self) -> EkdSendResult<()> {
        let has_tts = self.tts_message.as_deref().is_some_and(|m| !m.is_empty());
        let has_audio = self.audio_url.as_deref().is_some_and(|u| !u.is_empty());

        if has_tts || has_audio {
            Ok(())
        } else {
            Err(EkdSendError::invalid_param(
                "either tts_message or audio_url is required",
                "tts_message",
            ))
        }
    }

    /// Returns a copy with the default voice and language filled in.
    pub(crate) fn with_defaults(&self) -> Self {
        let mut params = self.clone();
        if params.voice.as_deref().map_or(true, str::is_empty) {
            params.voice = Some(DEFAULT_VOICE.to_string());
        }
        if params.language.as_deref().map_or(true, str::is_empty) {
            params.language = Some(DEFAULT_LANGUAGE.to_string());
        }
        params
    }
}
