//! Assistant backend client.
//!
//! [`AssistantBackend`] is the seam the pipeline talks through; [`HttpAssistant`]
//! is the real backend over HTTP and tests substitute canned implementations.

use crate::error::{VoiceError, VoiceResult};
use async_trait::async_trait;
use nivesh_core::NiveshConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// One answered turn: the reply text plus optional synthesized speech as a
/// base64 data URI.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnReply {
    pub text: String,
    pub audio_data: Option<String>,
}

/// Operations the voice session needs from the assistant backend.
#[async_trait]
pub trait AssistantBackend: Send + Sync {
    /// Speech to text. The payload is a WAV data URI.
    async fn transcribe(&self, audio_data_uri: &str) -> VoiceResult<String>;

    /// Answer a text query, optionally with synthesized speech.
    async fn answer(&self, query: &str) -> VoiceResult<TurnReply>;

    /// Tell the backend to stop generating the in-flight response.
    async fn cancel_response(&self) -> VoiceResult<()>;

    /// Whether the backend is reachable and ready.
    async fn health(&self) -> VoiceResult<bool>;
}

#[derive(Serialize)]
struct TranscribeRequest<'a> {
    audio: &'a str,
}

#[derive(Deserialize)]
struct TranscribeResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    audio_data: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// The assistant backend over HTTP.
#[derive(Debug, Clone)]
pub struct HttpAssistant {
    base_url: String,
    client: reqwest::Client,
}

impl HttpAssistant {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> VoiceResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VoiceError::Network(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into().trim().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_config(config: &NiveshConfig) -> VoiceResult<Self> {
        Self::new(
            config.assistant_base.clone(),
            Duration::from_secs(config.http_timeout_secs),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

async fn check_status(resp: reqwest::Response) -> VoiceResult<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        Err(VoiceError::Api {
            status: status.as_u16(),
            body: resp.text().await.unwrap_or_default(),
        })
    }
}

#[async_trait]
impl AssistantBackend for HttpAssistant {
    async fn transcribe(&self, audio_data_uri: &str) -> VoiceResult<String> {
        let resp = self
            .client
            .post(self.url("/transcribe"))
            .json(&TranscribeRequest {
                audio: audio_data_uri,
            })
            .send()
            .await?;
        let body: TranscribeResponse = check_status(resp).await?.json().await.map_err(|e| {
            VoiceError::Network(e.to_string())
        })?;
        if !body.success {
            return Err(VoiceError::Api {
                status: 200,
                body: body.error.unwrap_or_else(|| "transcription failed".to_string()),
            });
        }
        let text = body.text.unwrap_or_default().trim().to_string();
        if text.is_empty() {
            return Err(VoiceError::EmptyTranscription);
        }
        debug!("transcribed {} chars", text.len());
        Ok(text)
    }

    async fn answer(&self, query: &str) -> VoiceResult<TurnReply> {
        let resp = self
            .client
            .post(self.url("/process_query"))
            .json(&QueryRequest { query })
            .send()
            .await?;
        let body: QueryResponse = check_status(resp).await?.json().await.map_err(|e| {
            VoiceError::Network(e.to_string())
        })?;
        if !body.success {
            return Err(VoiceError::Api {
                status: 200,
                body: body.error.unwrap_or_else(|| "query failed".to_string()),
            });
        }
        Ok(TurnReply {
            text: body.text.unwrap_or_default(),
            audio_data: body.audio_data.filter(|a| !a.is_empty()),
        })
    }

    async fn cancel_response(&self) -> VoiceResult<()> {
        let resp = self
            .client
            .post(self.url("/cancel_response"))
            .send()
            .await?;
        check_status(resp).await?;
        Ok(())
    }

    async fn health(&self) -> VoiceResult<bool> {
        match self.client.get(self.url("/health")).send().await {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(e) if e.is_timeout() || e.is_connect() => Ok(false),
            Err(e) => Err(VoiceError::Network(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_join_cleanly() {
        let backend =
            HttpAssistant::new("http://localhost:5000/", Duration::from_secs(5)).unwrap();
        assert_eq!(backend.url("/transcribe"), "http://localhost:5000/transcribe");
    }

    #[test]
    fn transcribe_response_tolerates_missing_fields() {
        let body: TranscribeResponse = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(body.success);
        assert!(body.text.is_none());
        assert!(body.error.is_none());
    }

    #[test]
    fn query_response_parses_audio() {
        let json = r#"{"success":true,"text":"TCS is up 1.4% today.","audio_data":"UklGRg=="}"#;
        let body: QueryResponse = serde_json::from_str(json).unwrap();
        assert_eq!(body.text.as_deref(), Some("TCS is up 1.4% today."));
        assert_eq!(body.audio_data.as_deref(), Some("UklGRg=="));
    }
}
