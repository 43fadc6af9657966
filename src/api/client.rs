//! reqwest implementation of the backend API

use super::types::{
    ApiConversation, ApiMessage, ApiPage, AssignConversationRequest, ChangeStatusRequest,
    MessagePageRequest, SendMessageMetadata, SendMessageResponse,
};
use super::{ApiError, ConsoleBackend, MessagePage, SentMessage};
use crate::config::ConsoleConfig;
use crate::conversation::Conversation;
use crate::status::ConversationStatus;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{multipart, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

/// HTTP client for the console backend
pub struct HttpBackend {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpBackend {
    pub fn new(config: &ConsoleConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| ApiError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.api_url.clone(),
            token: config.api_token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = self.authorized(request).send().await?;
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_response(status, content_type.as_deref(), &body))
    }

    async fn execute_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = self.execute(request).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::decode(e.to_string()))
    }
}

#[async_trait]
impl ConsoleBackend for HttpBackend {
    async fn get_conversation(&self, conversation_id: &str) -> Result<Conversation, ApiError> {
        let request = self.client.get(self.url(&format!("conversations/{conversation_id}")));
        let conversation: ApiConversation = self.execute_json(request).await?;
        Ok(conversation.into_conversation())
    }

    async fn change_status(
        &self,
        conversation_id: &str,
        status: ConversationStatus,
    ) -> Result<(), ApiError> {
        let request = self
            .client
            .put(self.url(&format!("conversations/{conversation_id}/status")))
            .json(&ChangeStatusRequest { status });
        self.execute(request).await?;
        Ok(())
    }

    async fn assign_conversation(
        &self,
        conversation_id: &str,
        agent_ids: &[String],
    ) -> Result<(), ApiError> {
        let request = self
            .client
            .put(self.url(&format!("conversations/{conversation_id}/agents")))
            .json(&AssignConversationRequest {
                agent_ids: agent_ids.to_vec(),
            });
        self.execute(request).await?;
        Ok(())
    }

    async fn list_messages(
        &self,
        conversation_id: &str,
        page: MessagePageRequest,
    ) -> Result<MessagePage, ApiError> {
        let request = self.client.get(self.url(&format!(
            "conversations/{conversation_id}/messages?{}",
            page.query()
        )));
        let api_page: ApiPage<ApiMessage> = self.execute_json(request).await?;
        Ok(MessagePage::from_newest_first(api_page))
    }

    async fn send_text(&self, conversation_id: &str, text: &str) -> Result<SentMessage, ApiError> {
        let metadata = serde_json::to_string(&SendMessageMetadata {
            conversation_id,
            kind: "text",
            text,
        })
        .map_err(|e| ApiError::decode(e.to_string()))?;
        let form = multipart::Form::new().text("metadata", metadata);

        let request = self.client.post(self.url("messages/send")).multipart(form);
        let response: SendMessageResponse = self.execute_json(request).await?;
        Ok(SentMessage {
            id: response.id,
            conversation_id: response
                .conversation_id
                .unwrap_or_else(|| conversation_id.to_string()),
        })
    }
}
