//! reqwest-backed verification and submission services.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;

use super::{
    CheckCodeRequest, RawReply, ReplyBody, ReplyResult, SendCodeRequest, SubmissionService,
    TransportError, VerificationService,
};
use crate::models::SubmissionPayload;

/// POSTs JSON bodies and captures whatever comes back.
#[derive(Clone)]
pub struct JsonPoster {
    client: reqwest::Client,
    timeout_secs: u64,
}

impl JsonPoster {
    pub fn new(timeout_secs: u64) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;
        Ok(Self {
            client,
            timeout_secs,
        })
    }

    fn transport_error(&self, url: &str, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout(self.timeout_secs)
        } else if e.is_connect() {
            TransportError::Connect(url.to_string())
        } else {
            TransportError::Other(e.to_string())
        }
    }

    /// POST `body` as JSON to `url`, with optional extra headers.
    pub async fn post<B: Serialize + ?Sized + Sync>(
        &self,
        url: &str,
        body: &B,
        headers: &[(&str, &str)],
    ) -> ReplyResult {
        let mut request = self.client.post(url).json(body);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(url, e))?;

        let status = response.status().as_u16();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("application/json"))
            .unwrap_or(false);

        let text = response
            .text()
            .await
            .map_err(|e| self.transport_error(url, e))?;

        let body = if is_json {
            match serde_json::from_str(&text) {
                Ok(value) => ReplyBody::Json(value),
                Err(e) => ReplyBody::Malformed(e.to_string()),
            }
        } else {
            ReplyBody::Text(text)
        };

        tracing::debug!(url = %url, status, "Remote call completed");
        Ok(RawReply { status, body })
    }
}

/// Verification backend reached over HTTP.
pub struct HttpVerificationService {
    poster: JsonPoster,
    send_url: String,
    check_url: String,
}

impl HttpVerificationService {
    pub fn new(poster: JsonPoster, send_url: &str, check_url: &str) -> Self {
        Self {
            poster,
            send_url: send_url.to_string(),
            check_url: check_url.to_string(),
        }
    }
}

#[async_trait]
impl VerificationService for HttpVerificationService {
    async fn send_code(&self, request: &SendCodeRequest) -> ReplyResult {
        self.poster.post(&self.send_url, request, &[]).await
    }

    async fn check_code(&self, request: &CheckCodeRequest) -> ReplyResult {
        self.poster.post(&self.check_url, request, &[]).await
    }
}

/// Submission endpoint reached over HTTP.
pub struct HttpSubmissionService {
    poster: JsonPoster,
    url: String,
}

impl HttpSubmissionService {
    pub fn new(poster: JsonPoster, url: &str) -> Self {
        Self {
            poster,
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl SubmissionService for HttpSubmissionService {
    async fn submit(&self, payload: &SubmissionPayload, idempotency_key: &str) -> ReplyResult {
        self.poster
            .post(&self.url, payload, &[("Idempotency-Key", idempotency_key)])
            .await
    }
}
