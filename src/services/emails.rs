//! Emails service.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use super::resource_path;
use crate::client::RequestExecutor;
use crate::errors::EkdSendResult;
use crate::types::common::{DataEnvelope, PaginatedResponse};
use crate::types::email::{Email, ListEmailsParams, SendEmailParams};

/// Emails service for sending and tracking email.
pub struct EmailsService {
    executor: Arc<RequestExecutor>,
}

impl EmailsService {
    /// Creates a new emails service.
    pub fn new(executor: Arc<RequestExecutor>) -> Self {
        Self { executor }
    }

    /// Sends an email.
    #[instrument(skip(self, params, cancel), fields(recipients = params.to.len()))]
    pub async fn send(
        &self,
        params: &SendEmailParams,
        cancel: &CancellationToken,
    ) -> EkdSendResult<Email> {
        let response: DataEnvelope<Email> = self.executor.post(cancel, "/emails", params).await?;
        Ok(response.data)
    }

    /// Gets an email by ID.
    #[instrument(skip(self, cancel))]
    pub async fn get(&self, email_id: &str, cancel: &CancellationToken) -> EkdSendResult<Email> {
        let path = resource_path("/emails", email_id, "email_id")?;
        let response: DataEnvelope<Email> = self.executor.get(cancel, &path, &[]).await?;
        Ok(response.data)
    }

    /// Lists emails. `None` requests the first page with the default size.
    #[instrument(skip(self, params, cancel))]
    pub async fn list(
        &self,
        params: Option<&ListEmailsParams>,
        cancel: &CancellationToken,
    ) -> EkdSendResult<PaginatedResponse<Email>> {
        let query = params.cloned().unwrap_or_default().to_query();
        self.executor.get(cancel, "/emails", &query).await
    }

    /// Cancels a scheduled email.
    #[instrument(skip(self, cancel))]
    pub async fn cancel(&self, email_id: &str, cancel: &CancellationToken) -> EkdSendResult<Email> {
        let path = resource_path("/emails", email_id, "email_id")?;
        let response: DataEnvelope<Email> = self.executor.delete(cancel, &path).await?;
        Ok(response.data)
    }
}

impl std::fmt::Debug for EmailsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailsService").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::ApiKeyAuth;
    use crate::errors::EkdSendError;
    use crate::mocks::{fixtures, MockResponse, MockTransport};
    use crate::observability::NoopLogger;
    use crate::resilience::NoopRateLimiter;
    use crate::transport::HttpMethod;
    use pretty_assertions::assert_eq;

    fn service(transport: &Arc<MockTransport>) -> EmailsService {
        EmailsService::new(Arc::new(RequestExecutor::new(
            transport.clone(),
            Arc::new(ApiKeyAuth::from_string("ek_test_emails")),
            Arc::new(NoopRateLimiter),
            Arc::new(NoopLogger),
        )))
    }

    #[tokio::test]
    async fn test_send_posts_params_and_unwraps_data() {
        let transport = Arc::new(MockTransport::new());
        transport.queue_data(&fixtures::email("em_123"));

        let params = SendEmailParams::new("hello@example.com", ["user@example.com"], "Welcome!")
            .html("<h1>Welcome!</h1>");
        let email = service(&transport)
            .send(&params, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(email.id, "em_123");
        assert_eq!(email.status, "queued");

        let request = transport.last_request().unwrap();
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.path, "/emails");
        assert_eq!(request.json().unwrap()["subject"], "Welcome!");
    }

    #[tokio::test]
    async fn test_send_with_invalid_recipient_yields_validation_details() {
        let transport = Arc::new(MockTransport::new());
        transport.queue(MockResponse::raw(
            400,
            r#"{"error":{"message":"invalid recipient","code":"VALIDATION_ERROR","details":{"to":"invalid format"}}}"#,
        ));

        let params = SendEmailParams::new("hello@example.com", ["invalid-email"], "Hi");
        let err = service(&transport)
            .send(&params, &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            EkdSendError::Validation { info, details } => {
                assert_eq!(info.message, "invalid recipient");
                assert_eq!(info.code, "VALIDATION_ERROR");
                assert!(details.contains_key("to"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_rejects_empty_id_without_request() {
        let transport = Arc::new(MockTransport::new());

        let err = service(&transport)
            .get("", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, EkdSendError::InvalidRequest { .. }));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_get_empty_body_is_decode_error() {
        let transport = Arc::new(MockTransport::new());
        transport.queue(MockResponse::empty(200).with_request_id("req_empty"));

        let err = service(&transport)
            .get("em_1", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, EkdSendError::Decode { .. }));
        assert_eq!(err.status_code(), Some(200));
        assert_eq!(err.request_id(), Some("req_empty"));
        assert_eq!(transport.last_request().unwrap().path, "/emails/em_1");
    }

    #[tokio::test]
    async fn test_get_encodes_id_as_one_segment() {
        let transport = Arc::new(MockTransport::new());
        transport.queue_data(&fixtures::email("em_1"));

        service(&transport)
            .get("em_1/../sms?x=1#f", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            transport.last_request().unwrap().path,
            "/emails/em_1%2F..%2Fsms%3Fx%3D1%23f"
        );
    }

    #[tokio::test]
    async fn test_list_with_null_page_is_empty() {
        let transport = Arc::new(MockTransport::new());
        transport.queue(MockResponse::raw(
            200,
            r#"{"data":null,"total":0,"limit":20,"offset":0}"#,
        ));

        let page = service(&transport)
            .list(None, &CancellationToken::new())
            .await
            .unwrap();

        assert!(page.is_empty());
        assert!(!page.has_more());
    }

    #[tokio::test]
    async fn test_list_defaults_and_filters() {
        let transport = Arc::new(MockTransport::new());
        transport.set_default(MockResponse::json(&fixtures::page(
            vec![fixtures::email("em_1"), fixtures::email("em_2")],
            45,
            20,
            0,
        )));
        let service = service(&transport);
        let cancel = CancellationToken::new();

        let page = service.list(None, &cancel).await.unwrap();
        assert_eq!(page.len(), 2);
        assert!(page.has_more());
        assert_eq!(page.next_offset(), 20);
        assert_eq!(transport.last_request().unwrap().path, "/emails?limit=20&offset=0");

        let params = ListEmailsParams::new()
            .limit(5)
            .offset(10)
            .status("delivered")
            .tag("welcome")
            .tag("beta");
        service.list(Some(&params), &cancel).await.unwrap();
        assert_eq!(
            transport.last_request().unwrap().path,
            "/emails?limit=5&offset=10&status=delivered&tags=welcome%2Cbeta"
        );
    }

    #[tokio::test]
    async fn test_cancel_sends_delete() {
        let transport = Arc::new(MockTransport::new());
        let mut cancelled = fixtures::email("em_9");
        cancelled["status"] = "cancelled".into();
        transport.queue_data(&cancelled);

        let email = service(&transport)
            .cancel("em_9", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(email.status, "cancelled");
        let request = transport.last_request().unwrap();
        assert_eq!(request.method, HttpMethod::Delete);
        assert_eq!(request.path, "/emails/em_9");
    }
}
