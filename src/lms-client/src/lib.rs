pub mod plugin;
pub mod protocol;

use async_trait::async_trait;
use lms_core::{ClientError, ClientResult, RelativePath, RescanTarget, ServerConfig};
use protocol::{JsonRpcPayload, JsonRpcResponse, RescanCommand};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use std::time::Duration;
use url::Url;

pub use plugin::{install, InstallError};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// JSON-RPC client for the rescan commands of a Lyrion Music Server.
///
/// Every call is one independent POST; nothing is retried.
#[derive(Debug, Clone)]
pub struct LmsClient {
    client: Client,
    endpoint: Url,
    server_url: String,
    config: ServerConfig,
}

impl LmsClient {
    pub fn new(config: ServerConfig) -> ClientResult<Self> {
        let server_url = config.server_url();
        let endpoint = Url::parse(&server_url).map_err(|e| ClientError::InvalidUrl {
            url: server_url.clone(),
            message: e.to_string(),
        })?;
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT.min(config.timeout))
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::Transport {
                message: e.to_string(),
            })?;
        Ok(Self {
            client,
            endpoint,
            server_url,
            config,
        })
    }

    /// Endpoint as configured, before `Url` normalization (host case, default ports).
    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Command for a rescan of `path`, or of the whole library.
    pub fn rescan_command(&self, path: Option<&RelativePath>) -> RescanCommand {
        match path {
            None => RescanCommand::Full,
            Some(path) => RescanCommand::Path {
                uri: self.config.file_uri(path.as_str()),
            },
        }
    }

    async fn send(&self, command: &RescanCommand) -> ClientResult<Response> {
        let payload = JsonRpcPayload::new(command);
        tracing::debug!("POST {} {:?}", self.server_url, command.args());

        let res = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| ClientError::Transport {
                message: e.to_string(),
            })?;

        let status = res.status();
        if !status.is_success() {
            return Err(ClientError::HttpStatus {
                status: status.as_u16(),
            });
        }
        Ok(res)
    }
}

#[async_trait]
impl RescanTarget for LmsClient {
    async fn is_scanning(&self) -> ClientResult<bool> {
        let res = self.send(&RescanCommand::Status).await?;
        let body: JsonRpcResponse = res.json().await.map_err(|e| ClientError::MalformedResponse {
            message: e.to_string(),
        })?;
        let flag = body
            .rescan_flag()
            .map_err(|message| ClientError::MalformedResponse { message })?;
        Ok(flag == 1)
    }

    async fn trigger_rescan(&self, path: Option<&RelativePath>) -> ClientResult<()> {
        let command = self.rescan_command(path);
        self.send(&command).await?;
        Ok(())
    }
}
