//! HTTP client for the hosted exercise gateway.
//!
//! The gateway is an opaque collaborator: a hosted space addressed as
//! `owner/name` whose runtime is probed (and woken) through the hub API and
//! whose exercise operations are JSON calls with a `{"data": [...]}`
//! envelope. Every failure is classified so callers can retry, wake the
//! space, or fall back to [`crate::simulation::LocalSimulation`].

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use pictalk_core::model::{Checklist, ExerciseSession, ExerciseSettings, ImageReference};

use crate::error::{GatewayError, ProviderError};
use crate::markup;
use crate::provider::{ExerciseProvider, ExerciseReply, GeneratedImage};

const DEFAULT_HUB_URL: &str = "https://huggingface.co";
const DEFAULT_SPACE: &str = "pictalk/exercise";

// A hang is a recoverable error, not a crash: image generation is slow but
// bounded, so cap every request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const WAKE_POLL_INTERVAL: Duration = Duration::from_secs(5);
const WAKE_POLL_ATTEMPTS: u32 = 12;

const STAGE_RUNNING: &str = "RUNNING";
const STAGE_RUNNING_BUILDING: &str = "RUNNING_BUILDING";
const STAGE_SLEEPING: &str = "SLEEPING";

//
// ─── CONFIG ────────────────────────────────────────────────────────────────────
//

/// Connection settings for the hosted exercise space.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub token: String,
    pub space: String,
    pub hub_url: String,
}

impl GatewayConfig {
    /// Reads gateway settings from the environment.
    ///
    /// Returns `None` when no token is configured, which callers treat as
    /// "run the local simulation instead".
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let token = env::var("PICTALK_HF_TOKEN").ok()?;
        if token.trim().is_empty() {
            return None;
        }
        let space = env::var("PICTALK_SPACE").unwrap_or_else(|_| DEFAULT_SPACE.into());
        let hub_url = env::var("PICTALK_HUB_URL").unwrap_or_else(|_| DEFAULT_HUB_URL.into());
        Some(Self {
            token,
            space,
            hub_url,
        })
    }
}

//
// ─── CLIENT ────────────────────────────────────────────────────────────────────
//

/// Authenticated client for one exercise space.
pub struct GatewayClient {
    client: Client,
    config: GatewayConfig,
}

impl GatewayClient {
    /// Builds the client with a bounded request timeout.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Http` when the underlying HTTP client cannot
    /// be constructed.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, config })
    }

    #[must_use]
    pub fn space(&self) -> &str {
        &self.config.space
    }

    fn space_host(&self) -> String {
        // owner/name is hosted at https://owner-name.hf.space
        format!(
            "https://{}.hf.space",
            self.config.space.replace('/', "-").to_lowercase()
        )
    }

    fn hub_api_url(&self, tail: &str) -> String {
        format!(
            "{}/api/spaces/{}/{tail}",
            self.config.hub_url.trim_end_matches('/'),
            self.config.space
        )
    }

    /// Probes the space runtime, waking a sleeping space and waiting for it
    /// to come up.
    ///
    /// # Errors
    ///
    /// Returns a classified `GatewayError` when the probe fails, the space is
    /// in a non-recoverable stage, or the wake deadline passes.
    pub async fn ensure_running(&self) -> Result<(), GatewayError> {
        let stage = self.runtime_stage().await?;
        match stage.as_str() {
            STAGE_RUNNING | STAGE_RUNNING_BUILDING => Ok(()),
            STAGE_SLEEPING => self.wake_and_wait().await,
            other => Err(GatewayError::Unavailable {
                stage: other.to_owned(),
            }),
        }
    }

    async fn runtime_stage(&self) -> Result<String, GatewayError> {
        let response = self
            .client
            .get(self.hub_api_url("runtime"))
            .bearer_auth(&self.config.token)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status, &self.config.space));
        }
        let body: RuntimeResponse = response.json().await?;
        Ok(body.stage)
    }

    async fn wake_and_wait(&self) -> Result<(), GatewayError> {
        debug!(space = %self.config.space, "waking sleeping exercise space");
        let response = self
            .client
            .post(self.hub_api_url("wake"))
            .bearer_auth(&self.config.token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(classify_status(response.status(), &self.config.space));
        }

        for _ in 0..WAKE_POLL_ATTEMPTS {
            tokio::time::sleep(WAKE_POLL_INTERVAL).await;
            if self.runtime_stage().await? == STAGE_RUNNING {
                return Ok(());
            }
        }
        warn!(space = %self.config.space, "space did not reach RUNNING before the wake deadline");
        Err(GatewayError::WakeTimeout)
    }

    /// POSTs one exercise operation and unwraps the data envelope.
    async fn call(&self, operation: &str, data: Value) -> Result<Vec<Value>, GatewayError> {
        let url = format!("{}/api/{operation}", self.space_host());
        debug!(%operation, "calling exercise gateway");
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.config.token)
            .json(&json!({ "data": data }))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status, &self.config.space));
        }
        let body: CallResponse = response
            .json()
            .await
            .map_err(|err| GatewayError::Malformed(format!("{operation}: {err}")))?;
        Ok(body.data)
    }

    /// Calls a no-argument operation whose single payload is a string
    /// (markup panels and save statuses).
    async fn fetch_string(&self, operation: &str) -> Result<String, GatewayError> {
        let data = self.call(operation, json!([])).await?;
        data.first()
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| GatewayError::Malformed(format!("{operation}: missing string payload")))
    }
}

#[async_trait]
impl ExerciseProvider for GatewayClient {
    async fn generate_image(
        &self,
        settings: &ExerciseSettings,
    ) -> Result<GeneratedImage, ProviderError> {
        self.ensure_running().await?;
        let data = self
            .call(
                "generate_image_and_reset_chat",
                json!([
                    settings.age().to_string(),
                    settings.autism_level().as_str(),
                    settings.topic_focus(),
                    settings.treatment_plan(),
                    settings.attempt_limit(),
                    settings.details_threshold(),
                    settings.image_style().as_str(),
                ]),
            )
            .await?;
        let payload = data.first().ok_or_else(|| {
            GatewayError::Malformed("generate_image_and_reset_chat: empty data".to_owned())
        })?;
        Ok(decode_image(payload)?)
    }

    async fn initial_checklist(
        &self,
        _settings: &ExerciseSettings,
    ) -> Result<Checklist, ProviderError> {
        let raw = self.fetch_string("update_checklist_html").await?;
        Ok(markup::decode_checklist(&raw).map_err(GatewayError::from)?)
    }

    async fn respond(
        &self,
        utterance: &str,
        _session: &ExerciseSession,
    ) -> Result<ExerciseReply, ProviderError> {
        let data = self.call("chat_respond", json!([utterance])).await?;
        let message = data
            .first()
            .and_then(Value::as_str)
            .ok_or_else(|| GatewayError::Malformed("chat_respond: missing response text".to_owned()))?
            .to_owned();
        let image = match data.get(2) {
            Some(value) if !value.is_null() => Some(decode_image(value)?),
            _ => None,
        };

        // The authoritative per-item state lives in the checklist markup.
        // Refreshing it is best effort: a successful chat round with a stale
        // panel beats failing the whole attempt.
        let checklist = match self.fetch_string("update_checklist_html").await {
            Ok(raw) => Some(markup::decode_checklist(&raw).map_err(GatewayError::from)?),
            Err(err) => {
                warn!(error = %err, "checklist refresh failed after chat response");
                None
            }
        };

        Ok(ExerciseReply {
            message,
            checklist,
            image,
        })
    }

    async fn checklist_markup(&self, _session: &ExerciseSession) -> Result<String, ProviderError> {
        Ok(self.fetch_string("update_checklist_html").await?)
    }

    async fn progress_markup(&self, _session: &ExerciseSession) -> Result<String, ProviderError> {
        Ok(self.fetch_string("update_progress_html").await?)
    }

    async fn save_log(&self) -> Result<String, ProviderError> {
        Ok(self.fetch_string("save_session_log").await?)
    }

    async fn save_images(&self) -> Result<String, ProviderError> {
        Ok(self.fetch_string("save_all_session_images").await?)
    }
}

//
// ─── WIRE TYPES ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
struct RuntimeResponse {
    stage: String,
}

#[derive(Debug, Deserialize)]
struct CallResponse {
    data: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ImagePayload {
    url: String,
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    size: Option<u64>,
}

fn classify_status(status: StatusCode, space: &str) -> GatewayError {
    match status {
        StatusCode::UNAUTHORIZED => GatewayError::Auth,
        StatusCode::FORBIDDEN => GatewayError::Permission,
        StatusCode::NOT_FOUND => GatewayError::NotFound {
            space: space.to_owned(),
        },
        StatusCode::SERVICE_UNAVAILABLE => GatewayError::Unavailable {
            stage: "unavailable".to_owned(),
        },
        other => GatewayError::HttpStatus(other),
    }
}

fn decode_image(value: &Value) -> Result<GeneratedImage, GatewayError> {
    let payload: ImagePayload = serde_json::from_value(value.clone())
        .map_err(|err| GatewayError::Malformed(format!("image payload: {err}")))?;
    let reference = ImageReference::parse(&payload.url)?;
    let mime_type = payload
        .mime_type
        .or_else(|| reference.mime().map(str::to_owned))
        .unwrap_or_else(|| "image/png".to_owned());
    let size_bytes = payload.size.unwrap_or_else(|| reference.size_bytes());
    Ok(GeneratedImage {
        reference,
        mime_type,
        size_bytes,
    })
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
