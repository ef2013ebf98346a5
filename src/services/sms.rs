//! SMS service.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use super::resource_path;
use crate::client::RequestExecutor;
use crate::errors::EkdSendResult;
use crate::types::common::{DataEnvelope, ListParams, PaginatedResponse};
use crate::types::sms::{SendSmsParams, Sms};

/// SMS service for sending and tracking text messages.
pub struct SmsService {
    executor: Arc<RequestExecutor>,
}

impl SmsService {
    /// Creates a new SMS service.
    pub fn new(executor: Arc<RequestExecutor>) -> Self {
        Self { executor }
    }

    /// Sends an SMS.
    #[instrument(skip(self, params, cancel))]
    pub async fn send(&self, params: &SendSmsParams, cancel: &CancellationToken) -> EkdSendResult<Sms> {
        let response: DataEnvelope<Sms> =
            self.executor.post(cancel, "/sms", params).await?;
        Ok(response.data)
    }

    /// Gets an SMS by ID.
    #[instrument(skip(self, cancel))]
    pub async fn get(&self, sms_id: &str, cancel: &CancellationToken) -> EkdSendResult<Sms> {
        let path = resource_path("/sms", sms_id, "sms_id")?;
        let response: DataEnvelope<Sms> = self.executor.get(cancel, &path, &[]).await?;
        Ok(response.data)
    }

    /// Lists SMS messages. `None` requests the first page with the default size.
    #[instrument(skip(self, params, cancel))]
    pub async fn list(
        &self,
        params: Option<&ListParams>,
        cancel: &CancellationToken,
    ) -> EkdSendResult<PaginatedResponse<Sms>> {
        let query = params.cloned().unwrap_or_default().to_query();
        self.executor.get(cancel, "/sms", &query).await
    }

    /// Cancels a scheduled SMS.
    #[instrument(skip(self, cancel))]
    pub async fn cancel(&self, sms_id: &str, cancel: &CancellationToken) -> EkdSendResult<Sms> {
        let path = resource_path("/sms", sms_id, "sms_id")?;
        let response: DataEnvelope<Sms> = self.executor.delete(cancel, &path).await?;
        Ok(response.data)
    }
}

impl std::fmt::Debug for SmsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmsService").finish()
    }
}
