use async_trait::async_trait;
use reqwest::Client as HttpClient;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::api::error::ApiError;
use crate::api::models::{Conversation, CreateConversationRequest, CreateMessageRequest, Message};

/// Path segment every endpoint hangs off.
pub const RESOURCE: &str = "ai-conversations";

/// The REST surface the chat state depends on.
///
/// `ApiClient` talks to the real server; tests swap in an in-memory double.
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn fetch_conversations(&self, user_id: &str) -> Result<Vec<Conversation>, ApiError>;

    async fn fetch_messages(&self, conversation_id: &str, user_id: &str) -> Result<Vec<Message>, ApiError>;

    async fn create_message(&self, conversation_id: &str, dto: &CreateMessageRequest) -> Result<Message, ApiError>;

    async fn create_conversation(&self, dto: &CreateConversationRequest) -> Result<Conversation, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: HttpClient,
    base: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Self::with_http(HttpClient::new(), base_url)
    }

    pub fn with_http(http: HttpClient, base_url: &str) -> Result<Self, ApiError> {
        Ok(Self {
            http,
            base: Self::resource_url(base_url)?,
        })
    }

    /// `{base}/ai-conversations`, accepting a base that already ends in the resource.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn resource_url(base_url: &str) -> Result<Url, ApiError> {
        let normalized = crate::utils::normalize_url(base_url);
        let host_part = normalized.split_once("://").map(|(_, rest)| rest).unwrap_or_default();
        if host_part.trim_matches('/').is_empty() {
            return Err(ApiError::InvalidUrl(url::ParseError::EmptyHost));
        }
        let trimmed = normalized.trim_end_matches('/');
        let full = if trimmed.ends_with(&format!("/{RESOURCE}")) {
            trimmed.to_string()
        } else {
            format!("{}/{}", trimmed, RESOURCE)
        };
        Ok(Url::parse(&full)?)
    }

    fn conversations_url(&self, user_id: Option<&str>) -> Url {
        let mut url = self.base.clone();
        if let Some(uid) = user_id {
            url.query_pairs_mut().append_pair("userId", uid);
        }
        url
    }

    fn messages_url(&self, conversation_id: &str, user_id: Option<&str>) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .push(conversation_id)
            .push("messages");
        if let Some(uid) = user_id {
            url.query_pairs_mut().append_pair("userId", uid);
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        log::debug!("GET {}", url);
        let resp = self.http.get(url).send().await?;
        Self::read_json(resp).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(&self, url: Url, body: &B) -> Result<T, ApiError> {
        let body = serde_json::to_vec(body).map_err(ApiError::Encode)?;
        log::debug!("POST {} ({} bytes)", url, body.len());
        let resp = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        Self::read_json(resp).await
    }

    async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                url: resp.url().to_string(),
            });
        }
        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes).map_err(ApiError::Decode)
    }
}

#[async_trait]
impl ChatApi for ApiClient {
    async fn fetch_conversations(&self, user_id: &str) -> Result<Vec<Conversation>, ApiError> {
        self.get_json(self.conversations_url(Some(user_id))).await
    }

    async fn fetch_messages(&self, conversation_id: &str, user_id: &str) -> Result<Vec<Message>, ApiError> {
        let url = self.messages_url(conversation_id, Some(user_id))?;
        self.get_json(url).await
    }

    async fn create_message(&self, conversation_id: &str, dto: &CreateMessageRequest) -> Result<Message, ApiError> {
        let url = self.messages_url(conversation_id, None)?;
        self.post_json(url, dto).await
    }

    async fn create_conversation(&self, dto: &CreateConversationRequest) -> Result<Conversation, ApiError> {
        self.post_json(self.conversations_url(None), dto).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_gets_resource_appended() {
        let client = ApiClient::new("http://localhost:3001").unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:3001/ai-conversations");
    }

    #[test]
    fn base_with_resource_and_slash_is_kept() {
        let client = ApiClient::new("http://localhost:3001/ai-conversations/").unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:3001/ai-conversations");
    }

    #[test]
    fn missing_scheme_defaults_to_http() {
        let client = ApiClient::new("localhost:3001").unwrap();
        assert_eq!(client.base_url().scheme(), "http");
    }

    #[test]
    fn blank_base_is_rejected() {
        for base in ["", "   ", "http://", "https:///"] {
            let err = ApiClient::new(base).unwrap_err();
            assert!(
                matches!(err, ApiError::InvalidUrl(url::ParseError::EmptyHost)),
                "{:?} gave {:?}",
                base,
                err
            );
        }
    }

    #[test]
    fn conversations_url_carries_user_id() {
        let client = ApiClient::new("http://localhost:3001").unwrap();
        let url = client.conversations_url(Some("u-1"));
        assert_eq!(url.as_str(), "http://localhost:3001/ai-conversations?userId=u-1");
    }

    #[test]
    fn messages_url_escapes_the_conversation_id() {
        let client = ApiClient::new("http://localhost:3001").unwrap();
        let url = client.messages_url("a/b c", Some("u 1")).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:3001/ai-conversations/a%2Fb%20c/messages?userId=u+1"
        );
    }
}
