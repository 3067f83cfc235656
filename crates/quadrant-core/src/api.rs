use std::time::Duration;

use anyhow::{Context, anyhow};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use quadrant_shared::{AuthReply, Credentials, Task, TaskCreate, TaskId};
use reqwest::header::CONTENT_DISPOSITION;
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::error::NetworkError;
use crate::export::{ExportKind, ExportPayload};

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";

const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// The task-storage service as the client sees it.
#[allow(async_fn_in_trait)]
pub trait TaskApi {
    async fn list(&self) -> Result<Vec<Task>, NetworkError>;
    async fn create(&self, create: &TaskCreate) -> Result<(), NetworkError>;
    async fn toggle(&self, id: &TaskId) -> Result<(), NetworkError>;
    async fn delete(&self, id: &TaskId) -> Result<(), NetworkError>;
    async fn export(&self, kind: ExportKind) -> Result<ExportPayload, NetworkError>;
}

#[derive(Debug, Clone)]
pub struct HttpTaskApi {
    client: reqwest::Client,
    base: String,
}

impl HttpTaskApi {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> anyhow::Result<Self> {
        let base = base_url.trim().trim_end_matches('/').to_string();
        if base.is_empty() {
            return Err(anyhow!("server URL is empty"));
        }

        let mut builder = reqwest::Client::builder().cookie_store(true);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .context("failed building HTTP client for task service")?;

        info!(base = %base, timeout_secs = ?timeout.map(|t| t.as_secs()), "task service client ready");
        Ok(Self { client, base })
    }

    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let base = cfg
            .get("server.url")
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
        let timeout = match cfg.get("server.timeout") {
            Some(raw) => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("invalid server.timeout: {raw}"))?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };
        Self::new(&base, timeout)
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn task_url(&self, id: &TaskId, suffix: &str) -> String {
        let segment = utf8_percent_encode(id.as_str(), PATH_SEGMENT);
        self.url(&format!("/api/tasks/{segment}{suffix}"))
    }

    async fn send(
        &self,
        method: &'static str,
        url: String,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, NetworkError> {
        let response = request
            .send()
            .await
            .map_err(|source| NetworkError::Transport {
                method,
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(method, url = %url, status = %status, "task service returned non-success status");
            return Err(NetworkError::Status {
                method,
                url,
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        debug!(method, url = %url, status = %status, "task service responded");
        Ok(response)
    }

    async fn body(
        method: &'static str,
        url: &str,
        response: reqwest::Response,
    ) -> Result<Vec<u8>, NetworkError> {
        response
            .bytes()
            .await
            .map(|bytes| bytes.to_vec())
            .map_err(|source| NetworkError::Transport {
                method,
                url: url.to_string(),
                source,
            })
    }

    #[instrument(skip(self, creds), fields(username = %creds.username))]
    pub async fn login(&self, creds: &Credentials) -> Result<(), NetworkError> {
        self.authenticate("/login", creds).await
    }

    #[instrument(skip(self, creds), fields(username = %creds.username))]
    pub async fn signup(&self, creds: &Credentials) -> Result<(), NetworkError> {
        self.authenticate("/signup", creds).await
    }

    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), NetworkError> {
        let url = self.url("/logout");
        self.send("GET", url.clone(), self.client.get(&url)).await?;
        info!("logged out");
        Ok(())
    }

    async fn authenticate(&self, path: &str, creds: &Credentials) -> Result<(), NetworkError> {
        let url = self.url(path);
        let response = self
            .client
            .post(&url)
            .json(creds)
            .send()
            .await
            .map_err(|source| NetworkError::Transport {
                method: "POST",
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        let raw = Self::body("POST", &url, response).await?;
        let reply: AuthReply = serde_json::from_slice(&raw).unwrap_or_default();

        if status.is_success() && reply.success {
            info!(path, "session established");
            return Ok(());
        }

        let reason = reply
            .error
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
        warn!(path, status = %status, reason = %reason, "authentication refused");
        Err(NetworkError::Rejected(reason))
    }
}

impl TaskApi for HttpTaskApi {
    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<Task>, NetworkError> {
        let url = self.url("/api/tasks");
        let response = self.send("GET", url.clone(), self.client.get(&url)).await?;
        let raw = Self::body("GET", &url, response).await?;

        let tasks: Vec<Task> = serde_json::from_slice(&raw).map_err(|err| NetworkError::Decode {
            url: url.clone(),
            message: err.to_string(),
        })?;
        debug!(count = tasks.len(), "fetched tasks");
        Ok(tasks)
    }

    #[instrument(skip(self, create), fields(text_len = create.text.len(), important = create.important, urgent = create.urgent))]
    async fn create(&self, create: &TaskCreate) -> Result<(), NetworkError> {
        let url = self.url("/api/tasks");
        self.send("POST", url.clone(), self.client.post(&url).json(create))
            .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn toggle(&self, id: &TaskId) -> Result<(), NetworkError> {
        let url = self.task_url(id, "/toggle");
        self.send("POST", url.clone(), self.client.post(&url)).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn delete(&self, id: &TaskId) -> Result<(), NetworkError> {
        let url = self.task_url(id, "");
        self.send("DELETE", url.clone(), self.client.delete(&url))
            .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(kind = ?kind))]
    async fn export(&self, kind: ExportKind) -> Result<ExportPayload, NetworkError> {
        let url = self.url(kind.path());
        let response = self.send("GET", url.clone(), self.client.get(&url)).await?;
        let disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = Self::body("GET", &url, response).await?;

        debug!(bytes = bytes.len(), disposition = ?disposition, "export payload received");
        Ok(ExportPayload { disposition, bytes })
    }
}
