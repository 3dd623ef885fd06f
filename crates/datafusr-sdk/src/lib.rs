//! Asynchronous client for the DataFusr MEP post-processing API.
//!
//! The API takes a reference to a versioned design model and replies with
//! sizing tables for the building's service shafts. This crate owns the
//! request payload and header conventions, the single POST, and typed
//! access to the returned tables.

mod secret;
pub mod tables;

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use secret::Secret;
pub use tables::{ShaftDesign, ShaftRecord};

/// Project tag the MEP backend files incoming requests under.
pub const PROJECT_NAME: &str = "MEPPostprocessingProject";
/// Fixed source-application tag expected by the API.
pub const SOURCE_APPLICATION: &str = "RoomBook";
/// We always ask for tabular results.
pub const RETURN_TYPE: &str = "tables";

#[derive(Debug, Error)]
pub enum DatafusrError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status: {status} body={body}")]
    UnexpectedStatus {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("table `{table}` has no value for shaft `{shaft}`")]
    MissingValue { table: &'static str, shaft: String },
    #[error("table `{table}` value for shaft `{shaft}` is not a number")]
    NotANumber { table: &'static str, shaft: String },
}

#[derive(Debug, Serialize)]
struct DatafusrRequest<'a> {
    datafusr_config: DatafusrConfig<'a>,
}

#[derive(Debug, Serialize)]
struct DatafusrConfig<'a> {
    project_name: &'a str,
    source_url: &'a str,
    speckle_token: &'a str,
}

/// Top-level API response. `shaft_design` is absent when the backend had
/// nothing to size.
#[derive(Debug, Default, Deserialize)]
pub struct DatafusrResponse {
    #[serde(default)]
    pub shaft_design: Option<ShaftDesign>,
}

pub struct DatafusrClient {
    http: Client,
    base_url: String,
    username: String,
    token: Secret,
}

impl DatafusrClient {
    /// `base_url` is the API root; a trailing slash is tolerated. The
    /// username and token ride along as headers on every request.
    pub fn new(base_url: impl Into<String>, username: impl Into<String>, token: Secret) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        // Conservative timeouts; a stuck MEP backend should fail the run,
        // not hang the host worker.
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            http,
            base_url,
            username: username.into(),
            token,
        }
    }

    /// POST the model reference to `/from_datafusr/` and decode the reply.
    pub async fn fetch_shaft_design(
        &self,
        source_url: &str,
        speckle_token: &Secret,
    ) -> Result<DatafusrResponse, DatafusrError> {
        let request = DatafusrRequest {
            datafusr_config: DatafusrConfig {
                project_name: PROJECT_NAME,
                source_url,
                speckle_token: speckle_token.expose(),
            },
        };

        tracing::debug!(source_url, "requesting shaft design tables");
        let response = self
            .http
            .post(format!("{}/from_datafusr/", self.base_url))
            .header("enable-logging", "False")
            .header("source-application", SOURCE_APPLICATION)
            .header("return-type", RETURN_TYPE)
            .header("username", &self.username)
            .header("token", self.token.expose())
            .json(&request)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response.json::<DatafusrResponse>().await?)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(DatafusrError::UnexpectedStatus { status, body })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};

    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    type Captured = Arc<Mutex<Option<(HeaderMap, Value)>>>;

    async fn serve(reply: Value, status: StatusCode) -> (SocketAddr, Captured) {
        let captured: Captured = Arc::new(Mutex::new(None));
        let sink = captured.clone();
        let app = Router::new().route(
            "/from_datafusr/",
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                let sink = sink.clone();
                let reply = reply.clone();
                async move {
                    *sink.lock().unwrap() = Some((headers, body));
                    (status, Json(reply))
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock listener");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve mock");
        });
        (addr, captured)
    }

    #[tokio::test]
    async fn posts_payload_and_headers() {
        let reply = json!({"shaft_design": {"shaft_area": {"S1": 4.0}}});
        let (addr, captured) = serve(reply, StatusCode::OK).await;

        let client = DatafusrClient::new(
            format!("http://{addr}/"),
            "alice",
            Secret::new("api-token"),
        );
        let response = client
            .fetch_shaft_design(
                "https://speckle.example/projects/p/models/m@v",
                &Secret::new("speckle-token"),
            )
            .await
            .expect("request succeeds");

        let design = response.shaft_design.expect("shaft_design present");
        assert_eq!(design.planned_area("S1").expect("area"), 4.0);

        let (headers, body) = captured.lock().unwrap().take().expect("request captured");
        assert_eq!(headers.get("username").unwrap(), "alice");
        assert_eq!(headers.get("token").unwrap(), "api-token");
        assert_eq!(headers.get("enable-logging").unwrap(), "False");
        assert_eq!(headers.get("source-application").unwrap(), "RoomBook");
        assert_eq!(headers.get("return-type").unwrap(), "tables");
        assert_eq!(
            headers.get("content-type").unwrap(),
            "application/json"
        );
        assert_eq!(
            body["datafusr_config"]["project_name"],
            "MEPPostprocessingProject"
        );
        assert_eq!(
            body["datafusr_config"]["source_url"],
            "https://speckle.example/projects/p/models/m@v"
        );
        assert_eq!(body["datafusr_config"]["speckle_token"], "speckle-token");
    }

    #[tokio::test]
    async fn missing_table_decodes_to_none() {
        let (addr, _captured) = serve(json!({}), StatusCode::OK).await;
        let client = DatafusrClient::new(format!("http://{addr}"), "alice", Secret::new("t"));
        let response = client
            .fetch_shaft_design("https://speckle.example/x", &Secret::new("s"))
            .await
            .expect("request succeeds");
        assert!(response.shaft_design.is_none());
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let (addr, _captured) = serve(json!({"detail": "boom"}), StatusCode::INTERNAL_SERVER_ERROR).await;
        let client = DatafusrClient::new(format!("http://{addr}"), "alice", Secret::new("t"));
        let err = client
            .fetch_shaft_design("https://speckle.example/x", &Secret::new("s"))
            .await
            .unwrap_err();
        match err {
            DatafusrError::UnexpectedStatus { status, body } => {
                // reqwest and the mock server pin different `http` major
                // versions, so compare the raw code.
                assert_eq!(status.as_u16(), 500);
                assert!(body.contains("boom"));
            }
            other => panic!("expected UnexpectedStatus, got {other:?}"),
        }
    }
}
