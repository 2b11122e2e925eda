use async_trait::async_trait;
use log::{debug, info, trace, warn};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Serialize;
use std::time::Duration;

use super::{
    BackendError, BackendReply, ManagerPromptBody, ReasoningBackend, ReplyPayload,
    UserMessageBody,
};
use crate::core::urls::ApiUrls;

/// Reasoning backend reached over HTTP. Each endpoint has its own deadline;
/// when it passes the request is dropped and reported as a timeout.
#[derive(Debug, Clone)]
pub struct HttpReasoningBackend {
    client: reqwest::Client,
    base_url: String,
    user_message_timeout: Duration,
    manager_prompt_timeout: Duration,
}

impl HttpReasoningBackend {
    pub fn new(
        base_url: impl Into<String>,
        user_message_timeout: Duration,
        manager_prompt_timeout: Duration,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            user_message_timeout,
            manager_prompt_timeout,
        }
    }

    fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        timeout: Duration,
    ) -> Result<BackendReply, BackendError> {
        let url = self.build_url(path);
        info!("Calling reasoning backend at {url}");
        trace!(
            "Backend request body: {}",
            serde_json::to_string(body).unwrap_or_default()
        );

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| classify(e, timeout))?;

        let status = response.status();
        debug!("Backend response status: {status}");
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!("Backend API error ({status}): {error_text}");
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: error_text,
            });
        }

        let raw = response.text().await.map_err(|e| classify(e, timeout))?;
        trace!("Backend response body: {raw}");
        let payload: ReplyPayload =
            serde_json::from_str(&raw).map_err(|e| BackendError::Decode(e.to_string()))?;
        Ok(payload.into())
    }
}

fn classify(error: reqwest::Error, timeout: Duration) -> BackendError {
    if error.is_timeout() {
        BackendError::Timeout(timeout)
    } else {
        BackendError::Transport(error)
    }
}

#[async_trait]
impl ReasoningBackend for HttpReasoningBackend {
    async fn user_message(&self, body: &UserMessageBody) -> Result<BackendReply, BackendError> {
        self.post_json(ApiUrls::BACKEND_USER_MESSAGE, body, self.user_message_timeout)
            .await
    }

    async fn manager_prompt(
        &self,
        body: &ManagerPromptBody,
    ) -> Result<BackendReply, BackendError> {
        self.post_json(ApiUrls::BACKEND_MANAGER_PROMPT, body, self.manager_prompt_timeout)
            .await
    }
}
