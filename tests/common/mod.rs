//! Shared fakes for the integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use cloud_connect_panel::domain::{
    ActionMessage, ClientData, ListQuery, OwnerData, Page, Record, Settings, SshTunnel,
    TunnelAction, TunnelStatusReport,
};
use cloud_connect_panel::error::{Error, Result};
use cloud_connect_panel::eventing::{Notification, Notifier};
use cloud_connect_panel::services::{PanelGateway, RecordGateway, TunnelGateway};
use crossbeam_channel::Receiver;

/// In-memory server for all three collections.
///
/// Every call is appended to `calls` as `"<METHOD> <path>"` so tests can assert order.
#[derive(Default)]
pub struct FakeRemote {
    pub owners: Mutex<Vec<OwnerData>>,
    pub clients: Mutex<Vec<ClientData>>,
    pub tunnels: Arc<Mutex<Vec<SshTunnel>>>,
    pub calls: Arc<Mutex<Vec<String>>>,
    pub created: Mutex<Vec<serde_json::Value>>,
    pub settings: Mutex<Settings>,
    pub reject_saves: AtomicBool,
    /// How long after an accepted connect the tunnel reports connected
    pub connect_after: Mutex<Option<Duration>>,
    pub next_id: Mutex<u32>,
}

impl FakeRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_tunnels(count: usize) -> Arc<Self> {
        let remote = Self::default();
        *remote.tunnels.lock() = (0..count).map(|i| tunnel(&format!("t{i}"), false)).collect();
        Arc::new(remote)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn count_calls(&self, prefix: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.starts_with(prefix)).count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    pub fn set_connected(&self, id: &str, connected: bool) {
        if let Some(t) = self.tunnels.lock().iter_mut().find(|t| t.id.as_deref() == Some(id)) {
            t.is_connected = connected;
        }
    }

    fn log(&self, call: String) {
        self.calls.lock().push(call);
    }

    fn assign_id(&self, prefix: &str) -> String {
        let mut next = self.next_id.lock();
        *next += 1;
        format!("{prefix}-{next}")
    }

    fn check_saves(&self) -> Result<()> {
        if self.reject_saves.load(Ordering::SeqCst) {
            return Err(Error::Rejected {
                status: 400,
                message: "Remote server URL is required".to_string(),
            });
        }
        Ok(())
    }
}

pub fn tunnel(id: &str, connected: bool) -> SshTunnel {
    SshTunnel {
        id: Some(id.to_string()),
        name: format!("tunnel {id}"),
        remote_server_user: "tunnel".to_string(),
        remote_server_url: "vps.example.com".to_string(),
        local_port: Some(5000),
        remote_port: Some(9000),
        is_connected: connected,
        ..Default::default()
    }
}

fn page_of<R: Clone>(records: &[R], query: &ListQuery) -> Page<R> {
    let offset = usize::try_from(query.pagination.offset()).unwrap_or(usize::MAX);
    Page {
        data: records
            .iter()
            .skip(offset)
            .take(query.pagination.rows_per_page as usize)
            .cloned()
            .collect(),
        total: records.len() as u64,
    }
}

fn not_found(what: &str) -> Error {
    Error::NotFound {
        message: format!("{what} does not exist."),
    }
}

fn matches_search(name: Option<&str>, query: &ListQuery) -> bool {
    match query.search.as_deref() {
        Some(term) => name.is_some_and(|n| n.to_lowercase().contains(&term.to_lowercase())),
        None => true,
    }
}

#[async_trait]
impl RecordGateway<OwnerData> for FakeRemote {
    async fn list(&self, query: &ListQuery) -> Result<Page<OwnerData>> {
        self.log("GET owner_data/paginated".to_string());
        let owners: Vec<OwnerData> = self
            .owners
            .lock()
            .iter()
            .filter(|o| matches_search(o.name.as_deref(), query))
            .cloned()
            .collect();
        Ok(page_of(&owners, query))
    }

    async fn create(&self, draft: &OwnerData) -> Result<OwnerData> {
        self.log("POST owner_data".to_string());
        self.created.lock().push(serde_json::to_value(draft)?);
        self.check_saves()?;
        let mut saved = draft.clone();
        saved.id = Some(self.assign_id("owner"));
        self.owners.lock().push(saved.clone());
        Ok(saved)
    }

    async fn update(&self, id: &str, record: &OwnerData) -> Result<OwnerData> {
        self.log(format!("PUT owner_data/{id}"));
        self.check_saves()?;
        let mut owners = self.owners.lock();
        let slot = owners
            .iter_mut()
            .find(|o| o.id.as_deref() == Some(id))
            .ok_or_else(|| not_found("Owner Data"))?;
        *slot = record.clone();
        Ok(record.clone())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.log(format!("DELETE owner_data/{id}"));
        let mut owners = self.owners.lock();
        let before = owners.len();
        owners.retain(|o| o.id.as_deref() != Some(id));
        if owners.len() == before {
            return Err(not_found("Owner Data"));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordGateway<ClientData> for FakeRemote {
    async fn list(&self, query: &ListQuery) -> Result<Page<ClientData>> {
        self.log(format!("GET client_data/paginated {:?}", query.filters));
        let owner = query
            .filters
            .iter()
            .find(|(k, _)| k == "owner_data_id")
            .map(|(_, v)| v.clone());
        let clients: Vec<ClientData> = self
            .clients
            .lock()
            .iter()
            .filter(|c| owner.is_none() || c.owner_data_id == owner)
            .filter(|c| matches_search(c.name.as_deref(), query))
            .cloned()
            .collect();
        Ok(page_of(&clients, query))
    }

    async fn create(&self, draft: &ClientData) -> Result<ClientData> {
        self.log("POST client_data".to_string());
        self.created.lock().push(serde_json::to_value(draft)?);
        self.check_saves()?;
        let mut saved = draft.clone();
        saved.id = Some(self.assign_id("client"));
        self.clients.lock().push(saved.clone());
        Ok(saved)
    }

    async fn update(&self, id: &str, record: &ClientData) -> Result<ClientData> {
        self.log(format!("PUT client_data/{id}"));
        self.check_saves()?;
        Ok(record.clone())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.log(format!("DELETE client_data/{id}"));
        self.clients.lock().retain(|c| c.id.as_deref() != Some(id));
        Ok(())
    }
}

#[async_trait]
impl RecordGateway<SshTunnel> for FakeRemote {
    async fn list(&self, query: &ListQuery) -> Result<Page<SshTunnel>> {
        self.log("GET ssh-tunnels".to_string());
        Ok(page_of(&self.tunnels.lock(), query))
    }

    async fn create(&self, draft: &SshTunnel) -> Result<SshTunnel> {
        self.log("POST ssh-tunnels".to_string());
        self.created.lock().push(serde_json::to_value(draft)?);
        self.check_saves()?;
        let mut saved = draft.clone();
        saved.id = Some(self.assign_id("tunnel"));
        saved.public_key = Some("ssh-ed25519 AAAAC3Nz".to_string());
        self.tunnels.lock().push(saved.clone());
        Ok(saved)
    }

    async fn update(&self, id: &str, record: &SshTunnel) -> Result<SshTunnel> {
        self.log(format!("PUT ssh-tunnels/{id}"));
        self.check_saves()?;
        Ok(record.clone())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.log(format!("DELETE ssh-tunnels/{id}"));
        let mut tunnels = self.tunnels.lock();
        let before = tunnels.len();
        tunnels.retain(|t| t.id.as_deref() != Some(id));
        if tunnels.len() == before {
            return Err(not_found("SSH tunnel"));
        }
        Ok(())
    }
}

#[async_trait]
impl TunnelGateway for FakeRemote {
    async fn request(&self, id: &str, action: TunnelAction) -> Result<ActionMessage> {
        self.log(format!("POST ssh-tunnels/{id}/{}", action.path()));
        if !self.tunnels.lock().iter().any(|t| t.id.as_deref() == Some(id)) {
            return Err(not_found("SSH tunnel"));
        }
        match action {
            TunnelAction::Connect => {
                let delay = *self.connect_after.lock();
                match delay {
                    // Connection comes up asynchronously after the request returns
                    Some(delay) => {
                        let tunnels = self.tunnels.clone();
                        let id = id.to_string();
                        tokio::spawn(async move {
                            tokio::time::sleep(delay).await;
                            if let Some(t) = tunnels.lock().iter_mut().find(|t| t.id.as_deref() == Some(id.as_str())) {
                                t.is_connected = true;
                            }
                        });
                    }
                    None => self.set_connected(id, true),
                }
            }
            TunnelAction::Disconnect => self.set_connected(id, false),
        }
        Ok(ActionMessage {
            success: true,
            message: format!("SSH tunnel {} initiated", action.path()),
        })
    }

    async fn status(&self, id: &str) -> Result<TunnelStatusReport> {
        self.log(format!("GET ssh-tunnels/{id}/status"));
        let tunnels = self.tunnels.lock();
        let t = tunnels
            .iter()
            .find(|t| t.id.as_deref() == Some(id))
            .ok_or_else(|| not_found("SSH tunnel"))?;
        Ok(TunnelStatusReport {
            tunnel_id: id.to_string(),
            is_active: t.is_connected,
            process_id: t.is_connected.then_some(4242),
        })
    }
}

#[async_trait]
impl PanelGateway for FakeRemote {
    async fn settings(&self) -> Result<Settings> {
        self.log("GET settings".to_string());
        Ok(self.settings.lock().clone())
    }

    async fn update_settings(&self, settings: &Settings) -> Result<Settings> {
        self.log("PUT settings".to_string());
        self.check_saves()?;
        *self.settings.lock() = settings.clone();
        Ok(settings.clone())
    }

    async fn currencies(&self) -> Result<Vec<String>> {
        self.log("GET currencies".to_string());
        Ok(vec!["USD".to_string(), "EUR".to_string()])
    }
}

/// Listing gateway whose responses are released by the test, one gate per call
pub struct GatedGateway<R> {
    script: Mutex<VecDeque<(oneshot::Receiver<()>, Result<Page<R>>)>>,
}

impl<R: Record> GatedGateway<R> {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
        })
    }

    /// Queue the response for the next list call; send on the returned gate to release it
    pub fn push(&self, response: Result<Page<R>>) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.script.lock().push_back((rx, response));
        tx
    }
}

#[async_trait]
impl<R: Record> RecordGateway<R> for GatedGateway<R> {
    async fn list(&self, _query: &ListQuery) -> Result<Page<R>> {
        let next = self.script.lock().pop_front();
        let Some((gate, response)) = next else {
            return Err(Error::Invalid {
                message: "unexpected list call".to_string(),
            });
        };
        let _ = gate.await;
        response
    }

    async fn create(&self, draft: &R) -> Result<R> {
        Ok(draft.clone())
    }

    async fn update(&self, _id: &str, record: &R) -> Result<R> {
        Ok(record.clone())
    }

    async fn delete(&self, _id: &str) -> Result<()> {
        Ok(())
    }
}

pub fn notifier() -> (Notifier, Receiver<Notification>) {
    Notifier::channel()
}

/// Let spawned tasks run until they block again
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}
