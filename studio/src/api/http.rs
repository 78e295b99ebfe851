//! reqwest implementation of the agent backend

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::types::ApiReply;
use super::{
    AgentApi, ApiError, DeviceStatus, ExecutionRequest, ExecutionSessionResponse, HealthStatus,
    PlanningSessionResponse, SessionList,
};

/// HTTP client for the agent backend
#[derive(Debug, Clone)]
pub struct HttpAgentApi {
    base_url: String,
    http: Client,
}

impl HttpAgentApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        debug!(%base_url, ?timeout, "HttpAgentApi::new: called");
        let base_url = base_url.trim_end_matches('/');
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ApiError::BaseUrl(base_url.to_string()));
        }
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        debug!(%path, "HttpAgentApi::get: called");
        let response = self.http.get(self.url(path)).send().await?;
        read_reply(response).await
    }

    async fn image_form(images: &[PathBuf], prompt: &str) -> Result<Form, ApiError> {
        let mut form = Form::new().text("prompt", prompt.to_string());
        for (i, path) in images.iter().enumerate() {
            let bytes = tokio::fs::read(path).await.map_err(|source| ApiError::Image {
                path: path.clone(),
                source,
            })?;
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| format!("image_{}", i));
            let part = Part::bytes(bytes).file_name(file_name).mime_str(image_mime(path))?;
            form = form.part(format!("image_{}", i), part);
        }
        Ok(form)
    }
}

#[async_trait]
impl AgentApi for HttpAgentApi {
    async fn start_planning(&self, images: &[PathBuf], prompt: &str) -> Result<PlanningSessionResponse, ApiError> {
        debug!(images = images.len(), "HttpAgentApi::start_planning: called");
        let form = Self::image_form(images, prompt).await?;
        let response = self.http.post(self.url("/plan")).multipart(form).send().await?;
        let session: PlanningSessionResponse = read_reply(response).await?;
        info!(session_id = %session.session_id, "planning session created");
        Ok(session)
    }

    async fn start_execution(&self, request: &ExecutionRequest) -> Result<ExecutionSessionResponse, ApiError> {
        debug!(
            planning_session_id = ?request.planning_session_id,
            audio = request.audio_path.is_some(),
            "HttpAgentApi::start_execution: called"
        );
        let response = self.http.post(self.url("/execute")).json(request).send().await?;
        let session: ExecutionSessionResponse = read_reply(response).await?;
        info!(session_id = ?session.session_id, "execution session created");
        Ok(session)
    }

    async fn device_status(&self) -> Result<DeviceStatus, ApiError> {
        self.get("/device/status").await
    }

    async fn health(&self) -> Result<HealthStatus, ApiError> {
        self.get("/health").await
    }

    async fn sessions(&self) -> Result<SessionList, ApiError> {
        self.get("/sessions").await
    }
}

async fn read_reply<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        debug!(%status, "read_reply: API error");
        return Err(ApiError::Status {
            status: status.as_u16(),
            message,
        });
    }
    let reply: ApiReply<T> = response.json().await?;
    reply.into_result()
}

fn image_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        _ => "image/jpeg",
    }
}
