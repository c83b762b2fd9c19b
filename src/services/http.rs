//! HTTP Gateway
//!
//! One reqwest client serving every collection, the tunnel actions and the
//! panel-wide endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::constants::{API_KEY_HEADER, CURRENCIES_PATH};
use crate::domain::{
    ActionMessage, ListQuery, Page, PanelConfig, Record, Settings, TunnelAction,
    TunnelStatusReport,
};
use crate::error::{Error, Result};
use crate::services::gateway::{PanelGateway, RecordGateway, TunnelGateway};

/// HTTP implementation of every gateway trait
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    config: PanelConfig,
}

impl HttpGateway {
    pub fn new(config: PanelConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.server.timeout_secs.max(1)))
            .user_agent(concat!("cloud-connect-panel/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, config })
    }

    fn prepare(&self, method: Method, url: String) -> RequestBuilder {
        debug!(%method, %url, "Gateway request");
        let builder = self.client.request(method, url);
        match self.config.server.api_key.as_deref() {
            Some(key) if !key.is_empty() => builder.header(API_KEY_HEADER, key),
            _ => builder,
        }
    }

    fn collection_url(&self, route: &str) -> String {
        self.config.api_url(route)
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = check(builder.send().await?).await?;
        Ok(response.json().await?)
    }
}

impl std::fmt::Debug for HttpGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGateway")
            .field("base_url", &self.config.server.base_url)
            .field("api_prefix", &self.config.server.api_prefix)
            .finish()
    }
}

/// Turn a non-success response into the matching error variant.
///
/// The server reports failures as `{"detail": "..."}`; that text is what the user sees.
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_detail(&body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    });

    Err(match status {
        StatusCode::NOT_FOUND => Error::NotFound { message },
        StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
            Error::Rejected {
                status: status.as_u16(),
                message,
            }
        }
        _ => Error::Server {
            status: status.as_u16(),
            message,
        },
    })
}

fn error_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(text) => Some(text.clone()),
        // Validation errors come back as a list of {loc, msg}
        serde_json::Value::Array(items) => {
            let messages: Vec<String> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .map(str::to_string)
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        other => Some(other.to_string()),
    }
}

#[async_trait]
impl<R: Record> RecordGateway<R> for HttpGateway {
    async fn list(&self, query: &ListQuery) -> Result<Page<R>> {
        let url = self.collection_url(&R::COLLECTION.list_path());
        let builder = self.prepare(Method::GET, url).query(&query.to_pairs());
        self.send_json(builder).await
    }

    async fn create(&self, draft: &R) -> Result<R> {
        let url = self.collection_url(R::COLLECTION.path());
        self.send_json(self.prepare(Method::POST, url).json(draft)).await
    }

    async fn update(&self, id: &str, record: &R) -> Result<R> {
        let url = self.collection_url(&format!("{}/{id}", R::COLLECTION.path()));
        self.send_json(self.prepare(Method::PUT, url).json(record)).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let url = self.collection_url(&format!("{}/{id}", R::COLLECTION.path()));
        check(self.prepare(Method::DELETE, url).send().await?).await?;
        Ok(())
    }
}

#[async_trait]
impl TunnelGateway for HttpGateway {
    async fn request(&self, id: &str, action: TunnelAction) -> Result<ActionMessage> {
        let url = self.collection_url(&format!("ssh-tunnels/{id}/{}", action.path()));
        self.send_json(self.prepare(Method::POST, url)).await
    }

    async fn status(&self, id: &str) -> Result<TunnelStatusReport> {
        let url = self.collection_url(&format!("ssh-tunnels/{id}/status"));
        self.send_json(self.prepare(Method::GET, url)).await
    }
}

#[async_trait]
impl PanelGateway for HttpGateway {
    async fn settings(&self) -> Result<Settings> {
        let url = self.collection_url("settings");
        self.send_json(self.prepare(Method::GET, url)).await
    }

    async fn update_settings(&self, settings: &Settings) -> Result<Settings> {
        let url = self.collection_url("settings");
        self.send_json(self.prepare(Method::PUT, url).json(settings)).await
    }

    async fn currencies(&self) -> Result<Vec<String>> {
        let url = self.config.server_url(CURRENCIES_PATH);
        self.send_json(self.prepare(Method::GET, url)).await
    }
}
