//! REST API Client
//!
//! HTTP client for the durable history/send endpoints. The realtime channel
//! is a hint layer on top of these: a client that never receives a single
//! push still converges by fetching.

use thiserror::Error;
use uuid::Uuid;

use crate::shared::messaging::{ChatMessage, MessageHistoryResponse, SendMessageRequest};

/// Errors from the REST path
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport-level failure
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server rejected the request
    #[error("api error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Server-provided error message
        message: String,
    },
}

#[derive(serde::Deserialize)]
struct ApiErrorBody {
    error: String,
}

/// Client for the history/send REST endpoints
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Fetch one history page as served: newest first
    pub async fn fetch_history_page(
        &self,
        conversation_id: Uuid,
        page: u32,
        page_size: u32,
    ) -> Result<MessageHistoryResponse, ClientError> {
        let url = format!(
            "{}/api/conversations/{}/messages?page={}&page_size={}",
            self.base_url, conversation_id, page, page_size
        );
        let response = self.http.get(url).send().await?;
        Self::parse(response).await
    }

    /// Fetch the full history in display order, oldest first
    pub async fn fetch_history(
        &self,
        conversation_id: Uuid,
        page_size: u32,
    ) -> Result<Vec<ChatMessage>, ClientError> {
        let mut newest_first = Vec::new();
        let mut page = 0;
        loop {
            let response = self
                .fetch_history_page(conversation_id, page, page_size)
                .await?;
            let has_more = response.has_more;
            newest_first.extend(response.messages);
            if !has_more {
                break;
            }
            page += 1;
        }
        newest_first.reverse();
        Ok(newest_first)
    }

    /// Durable send; the response is the authoritative local echo
    pub async fn send_message(
        &self,
        sender: Uuid,
        receiver: Uuid,
        message: impl Into<String>,
    ) -> Result<ChatMessage, ClientError> {
        let url = format!("{}/api/messages", self.base_url);
        let body = SendMessageRequest {
            sender,
            receiver,
            message: message.into(),
        };
        let response = self.http.post(url).json(&body).send().await?;
        Self::parse(response).await
    }

    async fn parse<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ApiErrorBody>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| status.to_string());
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json::<T>().await?)
    }
}
