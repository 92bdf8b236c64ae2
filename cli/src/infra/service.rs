//! Provisioning service client: implements `ProvisioningService` over HTTP/JSON.

use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::application::ports::ProvisioningService;
use crate::domain::ApplianceError;
use crate::domain::machine::{DestroyRequest, Machine, MachineRequest, ServiceErrorBody};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// `reqwest` client for the Acrobox provisioning API.
pub struct HttpProvisioningService {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpProvisioningService {
    /// Client for `base_url`, authenticating with `token` when present.
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the TLS backend cannot be initialised.
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, ApplianceError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("abx/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApplianceError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&(impl Serialize + Sync)>,
    ) -> Result<reqwest::Response, ApplianceError> {
        let url = format!("{}{path}", self.base_url);
        debug!(%method, %url, "provisioning request");
        let mut request = self
            .client
            .request(method, &url)
            .header(ACCEPT, "application/json");
        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, "application/json; charset=utf-8")
                .json(body);
        }
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .map_err(|e| ApplianceError::Transport(e.to_string()))?;
        if response.status().is_success() {
            return Ok(response);
        }
        Err(service_error(response).await)
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApplianceError> {
        let status = response.status();
        response.json().await.map_err(|e| ApplianceError::Service {
            status: status.as_u16(),
            message: format!("unreadable response: {e}"),
        })
    }
}

/// Map a non-success response to `Service`, preferring the body's message.
async fn service_error(response: reqwest::Response) -> ApplianceError {
    let status = response.status();
    let message = match response.json::<ServiceErrorBody>().await {
        Ok(body) if !body.message.is_empty() => body.message,
        Ok(body) if !body.title.is_empty() => body.title,
        _ => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
    };
    ApplianceError::Service {
        status: status.as_u16(),
        message,
    }
}

impl ProvisioningService for HttpProvisioningService {
    async fn request_machine(&self, request: &MachineRequest) -> Result<String, ApplianceError> {
        let response = self.send(Method::POST, "/machines", Some(request)).await?;
        let machine: Machine = Self::parse(response).await?;
        Ok(machine.id)
    }

    async fn get_machine(&self, id: &str) -> Result<Machine, ApplianceError> {
        let response = self
            .send(Method::GET, &format!("/machines/{id}"), None::<&()>)
            .await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(Machine {
                id: id.to_string(),
                ..Machine::default()
            });
        }
        Self::parse(response).await
    }

    async fn cancel_machine(&self, id: &str) -> Result<(), ApplianceError> {
        self.send(Method::POST, &format!("/machines/{id}/cancel"), None::<&()>)
            .await
            .map(drop)
    }

    async fn renew_machine(&self, id: &str) -> Result<(), ApplianceError> {
        self.send(Method::POST, &format!("/machines/{id}/renew"), None::<&()>)
            .await
            .map(drop)
    }

    async fn destroy_machine(
        &self,
        id: &str,
        request: &DestroyRequest,
    ) -> Result<(), ApplianceError> {
        self.send(Method::DELETE, &format!("/machines/{id}"), Some(request))
            .await
            .map(drop)
    }
}
