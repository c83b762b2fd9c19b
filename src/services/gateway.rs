//! Remote Collection Gateway
//!
//! The network boundary of the panel. Controllers only ever talk to these traits,
//! so tests can swap the HTTP client for an in-memory fake.

use async_trait::async_trait;

use crate::domain::{ActionMessage, ListQuery, Page, Record, Settings, TunnelAction, TunnelStatusReport};
use crate::error::Result;

/// CRUD + pagination for one record type
#[async_trait]
pub trait RecordGateway<R: Record>: Send + Sync {
    /// `GET /{collection}/paginated?…` (tunnels: `GET /ssh-tunnels?…`)
    async fn list(&self, query: &ListQuery) -> Result<Page<R>>;

    /// `POST /{collection}` with a draft that has no id
    async fn create(&self, draft: &R) -> Result<R>;

    /// `PUT /{collection}/{id}`
    async fn update(&self, id: &str, record: &R) -> Result<R>;

    /// `DELETE /{collection}/{id}`
    async fn delete(&self, id: &str) -> Result<()>;
}

/// Connect/disconnect requests for SSH tunnels
#[async_trait]
pub trait TunnelGateway: Send + Sync {
    /// `POST /ssh-tunnels/{id}/{connect|disconnect}`
    ///
    /// Success means the server accepted the request, not that the tunnel is up.
    async fn request(&self, id: &str, action: TunnelAction) -> Result<ActionMessage>;

    /// `GET /ssh-tunnels/{id}/status`
    async fn status(&self, id: &str) -> Result<TunnelStatusReport>;
}

/// Panel-wide endpoints outside the three collections
#[async_trait]
pub trait PanelGateway: Send + Sync {
    async fn settings(&self) -> Result<Settings>;

    async fn update_settings(&self, settings: &Settings) -> Result<Settings>;

    /// Fiat currency codes supported by the server
    async fn currencies(&self) -> Result<Vec<String>>;
}
