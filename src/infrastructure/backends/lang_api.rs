#[cfg(test)]
#[path = "lang_api_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::AudioPayload;
use crate::domain::models::Backend;
use crate::domain::models::FeedbackRequest;
use crate::domain::models::FeedbackResponse;
use crate::domain::models::LearnRequest;
use crate::domain::models::LearnResponse;

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct TranscriptResponse {
    transcript: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ErrorResponse {
    detail: Option<String>,
}

/// HTTP client for the tutor backend.
pub struct LangApi {
    url: String,
    timeout: u64,
    health_check_timeout: u64,
}

impl Default for LangApi {
    fn default() -> LangApi {
        return LangApi {
            url: Config::get(ConfigKey::ApiURL),
            timeout: Config::get_millis(ConfigKey::RequestTimeout),
            health_check_timeout: Config::get_millis(ConfigKey::HealthCheckTimeout),
        };
    }
}

impl LangApi {
    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        let mut req = reqwest::Client::new().post(format!(
            "{url}/api/{path}",
            url = self.url.trim_end_matches('/')
        ));
        if self.timeout > 0 {
            req = req.timeout(Duration::from_millis(self.timeout));
        }

        return req;
    }
}

#[async_trait]
impl Backend for LangApi {
    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        if self.url.is_empty() {
            bail!("API URL is not defined");
        }

        let res = reqwest::Client::new()
            .get(format!(
                "{url}/openapi.json",
                url = self.url.trim_end_matches('/')
            ))
            .timeout(Duration::from_millis(self.health_check_timeout))
            .send()
            .await;

        let res = match res {
            Ok(res) => res,
            Err(err) => {
                tracing::error!(error = ?err, "Backend is not reachable");
                bail!("Backend is not reachable at {}", self.url);
            }
        };

        let status = res.status().as_u16();
        if status >= 400 {
            tracing::error!(status = status, "Backend health check failed");
            bail!("Backend health check failed with status {status}");
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn learn(&self, request: LearnRequest) -> Result<LearnResponse> {
        let res = self.post("learn").json(&request).send().await?;

        if !res.status().is_success() {
            tracing::error!(status = res.status().as_u16(), "Learn request failed");
            bail!("HTTP error! status: {}", res.status().as_u16());
        }

        return Ok(res.json::<LearnResponse>().await?);
    }

    #[allow(clippy::implicit_return)]
    async fn feedback(&self, request: FeedbackRequest) -> Result<FeedbackResponse> {
        let res = self.post("feedback").json(&request).send().await?;

        if !res.status().is_success() {
            tracing::error!(status = res.status().as_u16(), "Feedback request failed");
            bail!("HTTP error! status: {}", res.status().as_u16());
        }

        return Ok(res.json::<FeedbackResponse>().await?);
    }

    #[allow(clippy::implicit_return)]
    async fn speech_to_text(&self, audio: AudioPayload) -> Result<String> {
        let part = reqwest::multipart::Part::bytes(audio.bytes)
            .file_name(audio.file_name)
            .mime_str(&audio.mime_type)?;
        let form = reqwest::multipart::Form::new().part("audio", part);

        let res = self.post("speech-to-text").multipart(form).send().await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.json::<ErrorResponse>().await.unwrap_or_default();
            tracing::error!(
                status = status.as_u16(),
                detail = ?body.detail,
                "Speech to text request failed"
            );
            if let Some(detail) = body.detail {
                bail!(detail);
            }
            bail!("HTTP error! status: {}", status.as_u16());
        }

        let body = res.json::<TranscriptResponse>().await?;
        match body.transcript {
            Some(transcript) if !transcript.trim().is_empty() => {
                return Ok(transcript.trim().to_string());
            }
            _ => {
                bail!("No transcript received");
            }
        }
    }
}
