use application::{MessageDto, RoomDto, TokenDto, UserDto};
use domain::RoomId;
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;

use crate::error::ClientError;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// 历史刷新等非实时操作走 HTTP
#[derive(Debug, Clone)]
pub struct RestClient {
    http: Client,
    base_url: String,
}

impl RestClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response.json::<ErrorBody>().await.unwrap_or(ErrorBody {
            code: String::new(),
            message: String::new(),
        });
        Err(ClientError::Api {
            status: status.as_u16(),
            code: body.code,
            message: body.message,
        })
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<UserDto, ClientError> {
        let response = self
            .http
            .post(self.url("/auth/register"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;
        Self::decode(response).await
    }

    /// 登录并返回 bearer token
    pub async fn login(&self, username: &str, password: &str) -> Result<String, ClientError> {
        let response = self
            .http
            .post(self.url("/auth/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;
        let token: TokenDto = Self::decode(response).await?;
        Ok(token.token)
    }

    pub async fn list_rooms(&self) -> Result<Vec<RoomDto>, ClientError> {
        let response = self.http.get(self.url("/rooms")).send().await?;
        Self::decode(response).await
    }

    pub async fn create_room(&self, name: &str) -> Result<RoomDto, ClientError> {
        let response = self
            .http
            .post(self.url("/rooms"))
            .json(&json!({ "name": name }))
            .send()
            .await?;
        Self::decode(response).await
    }

    /// `None` 列出没有房间的旧消息
    pub async fn list_messages(&self, room_id: Option<RoomId>) -> Result<Vec<MessageDto>, ClientError> {
        let room_id = room_id.map(|id| id.to_string()).unwrap_or_default();
        let response = self
            .http
            .get(self.url("/messages"))
            .query(&[("roomId", room_id)])
            .send()
            .await?;
        Self::decode(response).await
    }

    pub async fn post_message(
        &self,
        token: &str,
        text: &str,
        author: &str,
        room_id: Option<RoomId>,
    ) -> Result<MessageDto, ClientError> {
        let response = self
            .http
            .post(self.url("/messages"))
            .bearer_auth(token)
            .json(&json!({
                "text": text,
                "author": author,
                "roomId": room_id.map(|id| id.to_string()),
            }))
            .send()
            .await?;
        Self::decode(response).await
    }
}
