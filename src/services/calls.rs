//! Voice calls service.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use super::resource_path;
use crate::client::RequestExecutor;
use crate::errors::EkdSendResult;
use crate::types::common::{DataEnvelope, ListParams, PaginatedResponse};
use crate::types::voice::{CreateCallParams, Recording, VoiceCall};

/// Calls service for placing and managing voice calls.
pub struct CallsService {
    executor: Arc<RequestExecutor>,
}

impl CallsService {
    /// Creates a new calls service.
    pub fn new(executor: Arc<RequestExecutor>) -> Self {
        Self { executor }
    }

    /// Places a voice call.
    ///
    /// Fails with [`crate::EkdSendError::InvalidRequest`] before any request
    /// if neither `tts_message` nor `audio_url` is set. Voice and language
    /// default to `alloy` and `en-US`.
    #[instrument(skip(self, params, cancel))]
    pub async fn create(
        &self,
        params: &CreateCallParams,
        cancel: &CancellationToken,
    ) -> EkdSendResult<VoiceCall> {
        params.validate()?;
        let params = params.with_defaults();

        let response: DataEnvelope<VoiceCall> =
            self.executor.post(cancel, "/calls", &params).await?;
        Ok(response.data)
    }

    /// Gets a call by ID.
    #[instrument(skip(self, cancel))]
    pub async fn get(&self, call_id: &str, cancel: &CancellationToken) -> EkdSendResult<VoiceCall> {
        let path = resource_path("/calls", call_id, "call_id")?;
        let response: DataEnvelope<VoiceCall> = self.executor.get(cancel, &path, &[]).await?;
        Ok(response.data)
    }

    /// Lists calls. `None` requests the first page with the default size.
    #[instrument(skip(self, params, cancel))]
    pub async fn list(
        &self,
        params: Option<&ListParams>,
        cancel: &CancellationToken,
    ) -> EkdSendResult<PaginatedResponse<VoiceCall>> {
        let query = params.cloned().unwrap_or_default().to_query();
        self.executor.get(cancel, "/calls", &query).await
    }

    /// Ends an active call.
    #[instrument(skip(self, cancel))]
    pub async fn hangup(&self, call_id: &str, cancel: &CancellationToken) -> EkdSendResult<VoiceCall> {
        let path = resource_path("/calls", call_id, "call_id")?;
        let response: DataEnvelope<VoiceCall> = self.executor.delete(cancel, &path).await?;
        Ok(response.data)
    }

    /// Gets the recording of a finished call.
    #[instrument(skip(self, cancel))]
    pub async fn get_recording(
        &self,
        call_id: &str,
        cancel: &CancellationToken,
    ) -> EkdSendResult<Recording> {
        let path = format!("{}/recording", resource_path("/calls", call_id, "call_id")?);
        let response: DataEnvelope<Recording> = self.executor.get(cancel, &path, &[]).await?;
        Ok(response.data)
    }
}

impl std::fmt::Debug for CallsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallsService").finish()
    }
}
