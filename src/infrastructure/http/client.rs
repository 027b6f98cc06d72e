//! Reqwest implementation of the collaborator ports.
//!
//! One client covers all three ports; connection pooling and the request
//! timeout come from the shared `reqwest::Client`. No retry policy: every
//! caller in the core treats a failed call as a classified error, and the
//! gate in particular must fail closed rather than retry spend checks.

use async_trait::async_trait;
use reqwest::multipart;
use reqwest::{Client as ReqwestClient, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::domain::errors::TransportError;
use crate::domain::models::{ApiConfig, Conversation, ConversationId, TaskId, TaskQueueSnapshot};
use crate::domain::ports::{
    ConversationBackend, ListFilter, SubmitResponse, TaskFeed, TokenLedger,
};

use super::error::{from_reqwest, from_status};
use super::types::{BalanceWire, ConversationWire, SubmitWire, TasksWire};

/// HTTP client for the assessment backend.
pub struct ApiClient {
    http: ReqwestClient,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, TransportError> {
        let http = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(4)
            .build()
            .map_err(from_reqwest)?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn check(response: Response) -> Result<Response, TransportError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(from_status(status, body))
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, TransportError> {
        Self::check(response)
            .await?
            .json::<T>()
            .await
            .map_err(from_reqwest)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, TransportError> {
        debug!(path, "GET");
        let response = self
            .http
            .get(self.url(path))
            .send()
            .await
            .map_err(from_reqwest)?;
        Self::decode(response).await
    }

    async fn post_empty(&self, path: &str) -> Result<(), TransportError> {
        debug!(path, "POST");
        let response = self
            .http
            .post(self.url(path))
            .send()
            .await
            .map_err(from_reqwest)?;
        Self::check(response).await.map(|_| ())
    }
}

#[async_trait]
impl TokenLedger for ApiClient {
    #[instrument(skip(self))]
    async fn balance(&self) -> Result<Option<f64>, TransportError> {
        let wire: BalanceWire = self.get_json("/balance").await?;
        Ok(wire.balance())
    }
}

#[async_trait]
impl TaskFeed for ApiClient {
    async fn fetch(
        &self,
        conversation: &ConversationId,
    ) -> Result<TaskQueueSnapshot, TransportError> {
        let wire: TasksWire = self
            .get_json(&format!("/conversations/{conversation}/tasks"))
            .await?;
        wire.into_domain()
    }

    async fn cancel(&self, task: &TaskId) -> Result<(), TransportError> {
        self.post_empty(&format!("/tasks/{task}/cancel")).await
    }
}

#[async_trait]
impl ConversationBackend for ApiClient {
    #[instrument(skip(self, text), fields(conversation = %conversation))]
    async fn submit(
        &self,
        conversation: &ConversationId,
        text: &str,
    ) -> Result<SubmitResponse, TransportError> {
        let response = self
            .http
            .post(self.url(&format!("/conversations/{conversation}/messages")))
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await
            .map_err(from_reqwest)?;
        let wire: SubmitWire = Self::decode(response).await?;
        wire.into_domain()
    }

    #[instrument(skip(self, bytes), fields(conversation = %conversation))]
    async fn upload(
        &self,
        conversation: &ConversationId,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<SubmitResponse, TransportError> {
        let part = multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = multipart::Form::new().part("file", part);
        let response = self
            .http
            .post(self.url(&format!("/conversations/{conversation}/uploads")))
            .multipart(form)
            .send()
            .await
            .map_err(from_reqwest)?;
        let wire: SubmitWire = Self::decode(response).await?;
        wire.into_domain()
    }

    async fn fetch_conversation(
        &self,
        conversation: &ConversationId,
    ) -> Result<Conversation, TransportError> {
        let wire: ConversationWire = self
            .get_json(&format!("/conversations/{conversation}"))
            .await?;
        wire.into_domain()
    }

    async fn list_conversations(
        &self,
        filter: ListFilter,
    ) -> Result<Vec<Conversation>, TransportError> {
        let deleted = matches!(filter, ListFilter::Trashed);
        let wire: Vec<ConversationWire> = self
            .get_json(&format!("/conversations?deleted={deleted}"))
            .await?;
        wire.into_iter().map(ConversationWire::into_domain).collect()
    }

    async fn create_conversation(&self) -> Result<Conversation, TransportError> {
        let response = self
            .http
            .post(self.url("/conversations"))
            .send()
            .await
            .map_err(from_reqwest)?;
        let wire: ConversationWire = Self::decode(response).await?;
        wire.into_domain()
    }

    async fn rename_conversation(
        &self,
        conversation: &ConversationId,
        title: &str,
    ) -> Result<(), TransportError> {
        let response = self
            .http
            .patch(self.url(&format!("/conversations/{conversation}")))
            .json(&serde_json::json!({ "title": title }))
            .send()
            .await
            .map_err(from_reqwest)?;
        Self::check(response).await.map(|_| ())
    }

    async fn trash_conversation(
        &self,
        conversation: &ConversationId,
    ) -> Result<(), TransportError> {
        self.post_empty(&format!("/conversations/{conversation}/trash"))
            .await
    }

    async fn restore_conversation(
        &self,
        conversation: &ConversationId,
    ) -> Result<(), TransportError> {
        self.post_empty(&format!("/conversations/{conversation}/restore"))
            .await
    }

    async fn purge_conversation(
        &self,
        conversation: &ConversationId,
    ) -> Result<(), TransportError> {
        debug!(conversation = %conversation, "DELETE");
        let response = self
            .http
            .delete(self.url(&format!("/conversations/{conversation}")))
            .send()
            .await
            .map_err(from_reqwest)?;
        Self::check(response).await.map(|_| ())
    }
}
