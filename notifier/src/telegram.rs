//! Telegram Bot API sink.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

use crate::format::PARSE_MODE;
use crate::sink::NotificationSink;

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("telegram rejected the request ({status}): {description}")]
    Rejected { status: u16, description: String },
}

#[derive(Clone)]
pub struct TelegramSink {
    http: Client,
    api_base: String,
    token: String,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
}

#[derive(Serialize)]
struct SendPhoto<'a> {
    chat_id: &'a str,
    photo: &'a str,
    caption: &'a str,
    parse_mode: &'static str,
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

impl TelegramSink {
    pub fn new(token: impl Into<String>) -> Result<Self, TelegramError> {
        let http = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            http,
            api_base: DEFAULT_API_BASE.to_string(),
            token: token.into(),
        })
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.api_base.trim_end_matches('/'),
            self.token,
            method
        )
    }

    async fn post<T: Serialize>(&self, method: &str, body: &T) -> Result<(), TelegramError> {
        let resp = self.http.post(self.method_url(method)).json(body).send().await?;
        let status = resp.status();
        let parsed: ApiResponse = resp.json().await?;

        if !status.is_success() || !parsed.ok {
            return Err(TelegramError::Rejected {
                status: status.as_u16(),
                description: parsed.description.unwrap_or_default(),
            });
        }
        Ok(())
    }

    async fn deliver(
        &self,
        chat_id: &str,
        message: &str,
        image_url: Option<&str>,
    ) -> Result<(), TelegramError> {
        match image_url {
            Some(photo) => {
                let body = SendPhoto {
                    chat_id,
                    photo,
                    caption: message,
                    parse_mode: PARSE_MODE,
                };
                self.post("sendPhoto", &body).await
            }
            None => {
                let body = SendMessage {
                    chat_id,
                    text: message,
                    parse_mode: PARSE_MODE,
                };
                self.post("sendMessage", &body).await
            }
        }
    }
}

#[async_trait]
impl NotificationSink for TelegramSink {
    async fn send(&self, endpoint: &str, message: &str, image_url: Option<&str>) -> bool {
        match self.deliver(endpoint, message, image_url).await {
            Ok(()) => {
                debug!(chat_id = endpoint, photo = image_url.is_some(), "telegram delivery ok");
                true
            }
            Err(e) => {
                error!(chat_id = endpoint, error = %e, "telegram delivery failed");
                false
            }
        }
    }
}
