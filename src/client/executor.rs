//! Request execution pipeline.
//!
//! Every API call funnels through one [`RequestExecutor`]: permit
//! acquisition, request construction, retries with backoff, and response
//! classification.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::auth::AuthProvider;
use crate::config::USER_AGENT;
use crate::errors::{EkdSendError, EkdSendResult, REQUEST_ID_HEADER};
use crate::observability::Logger;
use crate::resilience::{RateLimiter, RetryConfig, RetryPolicy};
use crate::transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};

/// Sends requests to the EKDSend API on behalf of the resource services.
///
/// Shared by all services of one client; safe to call from many tasks at once.
pub struct RequestExecutor {
    transport: Arc<dyn HttpTransport>,
    auth: Arc<dyn AuthProvider>,
    rate_limiter: Arc<dyn RateLimiter>,
    retry: RetryPolicy,
    logger: Arc<dyn Logger>,
    debug: bool,
}

impl RequestExecutor {
    /// Creates an executor with the default retry policy and debug output off.
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        auth: Arc<dyn AuthProvider>,
        rate_limiter: Arc<dyn RateLimiter>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            transport,
            auth,
            rate_limiter,
            retry: RetryPolicy::default_policy(),
            logger,
            debug: false,
        }
    }

    /// Replaces the retry configuration.
    pub fn with_retry(mut self, config: RetryConfig) -> Self {
        self.retry = RetryPolicy::new(config);
        self
    }

    /// Enables or disables request/response output to the diagnostic sink.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Executes a request and decodes the response body.
    ///
    /// Returns `Ok(None)` when the server answers 2xx with an empty body.
    pub async fn request<B, T>(
        &self,
        cancel: &CancellationToken,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
    ) -> EkdSendResult<Option<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.execute(cancel, method, path, body).await?;
        decode(&response)
    }

    /// Sends a GET request, appending `query` when it is non-empty.
    ///
    /// An empty 2xx body is a [`EkdSendError::Decode`] carrying the
    /// response's status and request id.
    pub async fn get<T: DeserializeOwned>(
        &self,
        cancel: &CancellationToken,
        path: &str,
        query: &[(&str, String)],
    ) -> EkdSendResult<T> {
        let path = with_query(path, query);
        let response = self
            .execute::<()>(cancel, HttpMethod::Get, &path, None)
            .await?;
        decode_required(&response)
    }

    /// Sends a POST request with a JSON body. An empty 2xx body is a decode error.
    pub async fn post<B, T>(
        &self,
        cancel: &CancellationToken,
        path: &str,
        body: &B,
    ) -> EkdSendResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .execute(cancel, HttpMethod::Post, path, Some(body))
            .await?;
        decode_required(&response)
    }

    /// Sends a DELETE request. An empty 2xx body is a decode error.
    pub async fn delete<T: DeserializeOwned>(
        &self,
        cancel: &CancellationToken,
        path: &str,
    ) -> EkdSendResult<T> {
        let response = self
            .execute::<()>(cancel, HttpMethod::Delete, path, None)
            .await?;
        decode_required(&response)
    }

    #[instrument(level = "debug", skip(self, cancel, body), fields(method = %method, path = %path))]
    async fn execute<B: Serialize + ?Sized>(
        &self,
        cancel: &CancellationToken,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
    ) -> EkdSendResult<HttpResponse> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                return Err(EkdSendError::RateLimiter {
                    message: "cancelled while waiting for a rate limit permit".to_string(),
                });
            }
            () = self.rate_limiter.acquire() => {}
        }

        let request = self.build_request(method, path, body)?;

        if self.debug {
            self.logger.debug(&format!("{} {}", method, path));
            if let Some(body) = &request.body {
                self.logger
                    .debug(&format!("Request body: {}", String::from_utf8_lossy(body)));
            }
        }

        self.retry
            .execute(cancel, || {
                let request = request.clone();
                async move { self.send_once(request).await }
            })
            .await
    }

    fn build_request<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
    ) -> EkdSendResult<HttpRequest> {
        let mut request = HttpRequest::new(method, path)
            .with_header("Content-Type", "application/json")
            .with_header("Accept", "application/json")
            .with_header("User-Agent", USER_AGENT);
        self.auth.apply_auth(&mut request.headers);

        if let Some(body) = body {
            request = request.with_body(serde_json::to_vec(body)?);
        }

        Ok(request)
    }

    /// One attempt: non-2xx responses become typed errors so the retry
    /// policy can classify them.
    async fn send_once(&self, request: HttpRequest) -> EkdSendResult<HttpResponse> {
        let response = self.transport.send(request).await?;

        tracing::debug!(status = response.status, "Received response");
        if self.debug {
            self.logger.debug(&format!(
                "Response ({}): {}",
                response.status,
                String::from_utf8_lossy(&response.body)
            ));
        }

        if response.is_success() {
            Ok(response)
        } else {
            Err(EkdSendError::from_response(
                response.status,
                &response.body,
                request_id(&response),
            ))
        }
    }
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("retry", &self.retry)
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}

fn with_query(path: &str, query: &[(&str, String)]) -> String {
    if query.is_empty() {
        return path.to_string();
    }

    let encoded = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(query)
        .finish();
    format!("{}?{}", path, encoded)
}

fn request_id(response: &HttpResponse) -> Option<String> {
    response.header(REQUEST_ID_HEADER).map(str::to_string)
}

fn decode<T: DeserializeOwned>(response: &HttpResponse) -> EkdSendResult<Option<T>> {
    if response.body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    response.json().map(Some).map_err(|e| EkdSendError::Decode {
        message: format!("Failed to parse response: {}", e),
        status_code: response.status,
        request_id: request_id(response),
    })
}

fn decode_required<T: DeserializeOwned>(response: &HttpResponse) -> EkdSendResult<T> {
    decode(response)?.ok_or_else(|| EkdSendError::Decode {
        message: "empty response body".to_string(),
        status_code: response.status,
        request_id: request_id(response),
    })
}
