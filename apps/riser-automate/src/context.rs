//! Host-side plumbing: the run metadata handed to the function and the
//! result channel back to the Speckle server.

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context as _, Result};
use async_trait::async_trait;
use datafusr_sdk::Secret;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::FunctionInputs;

/// The model version whose creation started the run.
#[derive(Debug, Clone, Deserialize)]
pub struct TriggerPayload {
    pub model_id: String,
    pub version_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VersionTrigger {
    #[serde(default)]
    pub trigger_type: String,
    pub payload: TriggerPayload,
}

/// Run metadata the host supplies for one invocation.
#[derive(Debug, Clone, Deserialize)]
pub struct AutomationRunData {
    pub project_id: String,
    pub speckle_server_url: String,
    pub automation_id: String,
    pub automation_run_id: String,
    pub triggers: Vec<VersionTrigger>,
}

impl AutomationRunData {
    /// The first trigger is the one acted upon.
    pub fn primary_trigger(&self) -> Result<&VersionTrigger> {
        self.triggers.first().context("run data carries no triggers")
    }
}

/// The full JSON document the host writes for one invocation.
#[derive(Debug, Clone, Deserialize)]
pub struct RunPayload {
    pub automation_run_data: AutomationRunData,
    pub function_inputs: FunctionInputs,
}

/// Carries the run metadata plus the reporting channel.
pub struct AutomationContext<R> {
    pub run_data: AutomationRunData,
    pub reporter: R,
}

impl<R> AutomationContext<R> {
    pub fn new(run_data: AutomationRunData, reporter: R) -> Self {
        Self { run_data, reporter }
    }

    /// Frontend URL of the model version that triggered the run.
    pub fn model_version_url(&self) -> Result<String> {
        let trigger = self.run_data.primary_trigger()?;
        Ok(format!(
            "{}/projects/{}/models/{}@{}",
            self.run_data.speckle_server_url.trim_end_matches('/'),
            self.run_data.project_id,
            trigger.payload.model_id,
            trigger.payload.version_id
        ))
    }
}

/// Result channel back to the host. Exactly one of the two terminal calls
/// is made per run.
#[async_trait]
pub trait HostReporter: Send + Sync {
    async fn store_file_result(&self, path: &Path) -> Result<()>;
    async fn mark_run_success(&self, message: &str) -> Result<()>;
    async fn mark_run_failed(&self, message: &str) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct StatusReport<'a> {
    status: &'a str,
    message: &'a str,
    blob_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct BlobUploadResponse {
    blob_id: String,
}

/// Reports run results to the Speckle server over its REST surface:
/// attachments as blob uploads, the terminal status as one JSON POST.
pub struct SpeckleReporter {
    http: Client,
    server_url: String,
    project_id: String,
    automation_id: String,
    run_id: String,
    token: Secret,
    blob_ids: Mutex<Vec<String>>,
}

impl SpeckleReporter {
    pub fn new(run_data: &AutomationRunData, token: Secret) -> Self {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            http,
            server_url: run_data.speckle_server_url.trim_end_matches('/').to_string(),
            project_id: run_data.project_id.clone(),
            automation_id: run_data.automation_id.clone(),
            run_id: run_data.automation_run_id.clone(),
            token,
            blob_ids: Mutex::new(Vec::new()),
        }
    }

    async fn report(&self, status: &str, message: &str) -> Result<()> {
        let blob_ids = self.blob_ids.lock().await.clone();
        let url = format!(
            "{}/api/automate/automations/{}/runs/{}/status",
            self.server_url, self.automation_id, self.run_id
        );
        let response = self
            .http
            .post(url)
            .bearer_auth(self.token.expose())
            .json(&StatusReport {
                status,
                message,
                blob_ids,
            })
            .send()
            .await
            .context("status report request failed")?;
        if !response.status().is_success() {
            bail!("status report rejected: {}", response.status());
        }
        Ok(())
    }
}

#[async_trait]
impl HostReporter for SpeckleReporter {
    async fn store_file_result(&self, path: &Path) -> Result<()> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("reading attachment {}", path.display()))?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("attachment")
            .to_string();
        let part = Part::bytes(bytes)
            .file_name(file_name.clone())
            .mime_str("image/png")
            .context("building multipart body")?;
        let url = format!("{}/api/stream/{}/blob", self.server_url, self.project_id);
        let response = self
            .http
            .post(url)
            .bearer_auth(self.token.expose())
            .multipart(Form::new().part("file", part))
            .send()
            .await
            .context("blob upload request failed")?;
        if !response.status().is_success() {
            bail!("blob upload rejected: {}", response.status());
        }
        let uploaded: BlobUploadResponse = response
            .json()
            .await
            .context("decoding blob upload response")?;
        info!(file = %file_name, blob = %uploaded.blob_id, "attached file result");
        self.blob_ids.lock().await.push(uploaded.blob_id);
        Ok(())
    }

    async fn mark_run_success(&self, message: &str) -> Result<()> {
        info!(%message, "marking run succeeded");
        self.report("succeeded", message).await
    }

    async fn mark_run_failed(&self, message: &str) -> Result<()> {
        warn!(%message, "marking run failed");
        self.report("failed", message).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run_data() -> AutomationRunData {
        AutomationRunData {
            project_id: "proj-1".into(),
            speckle_server_url: "https://speckle.example/".into(),
            automation_id: "auto-1".into(),
            automation_run_id: "run-1".into(),
            triggers: vec![VersionTrigger {
                trigger_type: "versionCreated".into(),
                payload: TriggerPayload {
                    model_id: "model-1".into(),
                    version_id: "version-1".into(),
                },
            }],
        }
    }

    #[test]
    fn model_version_url_is_composed_from_the_first_trigger() {
        let context = AutomationContext::new(run_data(), ());
        assert_eq!(
            context.model_version_url().expect("url"),
            "https://speckle.example/projects/proj-1/models/model-1@version-1"
        );
    }

    #[test]
    fn missing_triggers_are_an_error() {
        let mut data = run_data();
        data.triggers.clear();
        let context = AutomationContext::new(data, ());
        assert!(context.model_version_url().is_err());
    }

    #[test]
    fn run_payload_parses_with_default_aspect_ratio() {
        let payload: RunPayload = serde_json::from_value(json!({
            "automation_run_data": {
                "project_id": "proj-1",
                "speckle_server_url": "https://speckle.example",
                "automation_id": "auto-1",
                "automation_run_id": "run-1",
                "triggers": [
                    {
                        "trigger_type": "versionCreated",
                        "payload": {"model_id": "m", "version_id": "v"}
                    }
                ]
            },
            "function_inputs": {
                "username": "alice",
                "speckle_token": "spk",
                "api_url": "https://mep.example",
                "api_token": "api"
            }
        }))
        .expect("valid payload");
        assert_eq!(payload.function_inputs.aspect_ratio, 2.0);
        assert_eq!(payload.automation_run_data.triggers.len(), 1);
    }
}
