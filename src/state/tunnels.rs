//! TunnelSynchronizer - Keeps the Tunnel Table in Step with the Server
//!
//! The server owns `is_connected` and may flip it at any time (a tunnel dies, a
//! connect finishes after the request returned). The synchronizer never flips it
//! locally. It only asks the server for a transition and then re-reads the list:
//!
//! ```text
//! toggle ──► POST connect/disconnect ──► refresh ──► (connect only) refresh after settle delay
//!
//! every poll interval ──────────────────► refresh
//! ```
//!
//! Optionally each accepted request is remembered as a pending transition. A refresh
//! that shows the requested state clears it; if the timeout passes first the user
//! gets a warning. The displayed status is still whatever the server reported.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::domain::config::RefreshConfig;
use crate::domain::{Record, SshTunnel, TunnelAction, TunnelStatus, TunnelStatusReport};
use crate::error::{Error, Result};
use crate::services::{TaskHandle, TaskSet, TunnelGateway, spawn_delayed, spawn_periodic};
use crate::state::confirm::Confirm;
use crate::state::table::{DeleteOutcome, TableState};

/// Refresh timing of the synchronizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncTiming {
    pub poll_interval: Duration,
    /// Extra refresh after an accepted connect request
    pub settle_delay: Duration,
    /// `None` disables pending-transition tracking
    pub transition_timeout: Option<Duration>,
}

impl From<&RefreshConfig> for SyncTiming {
    fn from(config: &RefreshConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            settle_delay: config.connect_settle_delay(),
            transition_timeout: config.transition_timeout(),
        }
    }
}

impl Default for SyncTiming {
    fn default() -> Self {
        Self::from(&RefreshConfig::default())
    }
}

/// A connect/disconnect the server accepted but has not been observed yet
#[derive(Debug, Clone)]
pub struct PendingTransition {
    pub action: TunnelAction,
    pub name: String,
    pub requested_at: Instant,
    seq: u64,
}

struct SyncInner {
    table: TableState<SshTunnel>,
    actions: Arc<dyn TunnelGateway>,
    timing: SyncTiming,
    poller: Mutex<Option<TaskHandle>>,
    delayed: TaskSet,
    pending: Mutex<HashMap<String, PendingTransition>>,
    next_seq: AtomicU64,
}

/// Tunnel table plus background refresh and connect/disconnect requests
#[derive(Clone)]
pub struct TunnelSynchronizer {
    inner: Arc<SyncInner>,
}

impl TunnelSynchronizer {
    pub fn new(
        table: TableState<SshTunnel>,
        actions: Arc<dyn TunnelGateway>,
        timing: SyncTiming,
    ) -> Self {
        Self {
            inner: Arc::new(SyncInner {
                table,
                actions,
                timing,
                poller: Mutex::new(None),
                delayed: TaskSet::new(),
                pending: Mutex::new(HashMap::new()),
                next_seq: AtomicU64::new(0),
            }),
        }
    }

    fn from_inner(inner: Arc<SyncInner>) -> Self {
        Self { inner }
    }

    pub fn table(&self) -> &TableState<SshTunnel> {
        &self.inner.table
    }

    /// Refetch the tunnel list and settle any pending transitions it confirms
    pub async fn refresh(&self) -> Result<()> {
        self.inner.table.fetch().await?;
        self.reconcile_pending();
        Ok(())
    }

    /// Ask the server to flip the tunnel's connection state.
    ///
    /// The action is chosen from the status the row currently shows. The row itself
    /// is not changed; the refresh that follows shows whatever the server reports.
    pub async fn toggle(&self, tunnel: &SshTunnel) -> Result<TunnelAction> {
        let Some(id) = tunnel.id().filter(|id| !id.is_empty()) else {
            return Err(Error::Invalid {
                message: "tunnel has not been created yet".to_string(),
            });
        };
        let action = tunnel.toggle_action();
        let notifier = self.inner.table.notifier();
        info!(tunnel_id = id, action = action.path(), "Requesting tunnel transition");

        let ack = match self.inner.actions.request(id, action).await {
            Ok(ack) => ack,
            Err(e) => {
                warn!(tunnel_id = id, action = action.path(), error = %e, "Tunnel request failed");
                notifier.api_error(&e);
                if e.is_not_found() {
                    let _ = self.refresh().await;
                }
                return Err(e);
            }
        };

        if self.inner.table.is_closed() {
            return Ok(action);
        }

        match (ack.success, ack.message.is_empty()) {
            (true, true) => notifier.positive(format!("Tunnel {} requested", action.path())),
            (true, false) => notifier.positive(ack.message),
            (false, _) => notifier.warning(ack.message),
        }

        self.track(id, &tunnel.name, action);
        let _ = self.refresh().await;
        if action == TunnelAction::Connect {
            self.schedule_settle_refresh();
        }
        Ok(action)
    }

    /// One extra refresh after the settle delay, catching connects that finish
    /// after the request returned
    fn schedule_settle_refresh(&self) {
        let weak = Arc::downgrade(&self.inner);
        let delay = self.inner.timing.settle_delay;
        debug!(delay_ms = delay.as_millis() as u64, "Scheduling settle refresh");
        self.inner.delayed.insert(spawn_delayed("tunnels.settle", delay, async move {
            if let Some(inner) = weak.upgrade() {
                let _ = TunnelSynchronizer::from_inner(inner).refresh().await;
            }
        }));
    }

    fn track(&self, id: &str, name: &str, action: TunnelAction) {
        let Some(timeout) = self.inner.timing.transition_timeout else {
            return;
        };
        let seq = self.inner.next_seq.fetch_add(1, Ordering::SeqCst);
        self.inner.pending.lock().insert(
            id.to_string(),
            PendingTransition {
                action,
                name: name.to_string(),
                requested_at: Instant::now(),
                seq,
            },
        );

        let weak: Weak<SyncInner> = Arc::downgrade(&self.inner);
        let id = id.to_string();
        self.inner.delayed.insert(spawn_delayed("tunnels.transition", timeout, async move {
            if let Some(inner) = weak.upgrade() {
                TunnelSynchronizer::from_inner(inner).expire_pending(&id, seq).await;
            }
        }));
    }

    fn reconcile_pending(&self) {
        let rows = self.inner.table.rows();
        let mut pending = self.inner.pending.lock();
        if pending.is_empty() {
            return;
        }
        for tunnel in &rows {
            let Some(id) = tunnel.id() else { continue };
            let reached = pending
                .get(id)
                .is_some_and(|p| tunnel.status() == p.action.target());
            if reached {
                if let Some(done) = pending.remove(id) {
                    info!(
                        tunnel_id = id,
                        action = done.action.path(),
                        elapsed_ms = done.requested_at.elapsed().as_millis() as u64,
                        "Tunnel reached requested state"
                    );
                }
            }
        }
    }

    /// Close out a transition that no refresh has confirmed. The row may be off the
    /// current page, so the server is asked directly before warning.
    async fn expire_pending(&self, id: &str, seq: u64) {
        let expired = {
            let mut pending = self.inner.pending.lock();
            match pending.get(id) {
                Some(p) if p.seq == seq => pending.remove(id),
                _ => None,
            }
        };
        let Some(expired) = expired else { return };
        if self.inner.table.is_closed() {
            return;
        }

        let target = expired.action.target();
        match self.inner.actions.status(id).await {
            Ok(report) if report.is_active == (target == TunnelStatus::Connected) => {
                info!(
                    tunnel_id = id,
                    action = expired.action.path(),
                    "Tunnel reached requested state off the current page"
                );
                return;
            }
            Ok(_) => {}
            Err(e) => debug!(tunnel_id = id, error = %e, "Status check before expiry failed"),
        }
        if self.inner.table.is_closed() {
            return;
        }

        warn!(tunnel_id = id, action = expired.action.path(), "Tunnel transition timed out");
        let name = if expired.name.is_empty() { id } else { expired.name.as_str() };
        self.inner
            .table
            .notifier()
            .warning(format!("Tunnel {name} is not {} yet", target.label()));
    }

    /// Pending transition of one tunnel, if tracking is enabled and one is open
    pub fn pending(&self, id: &str) -> Option<PendingTransition> {
        self.inner.pending.lock().get(id).cloned()
    }

    /// Query the live process state of one tunnel without touching the table
    pub async fn status(&self, id: &str) -> Result<TunnelStatusReport> {
        match self.inner.actions.status(id).await {
            Ok(report) => {
                debug!(
                    tunnel_id = id,
                    is_active = report.is_active,
                    process_id = ?report.process_id,
                    "Tunnel status"
                );
                Ok(report)
            }
            Err(e) => {
                warn!(tunnel_id = id, error = %e, "Status query failed");
                self.inner.table.notifier().api_error(&e);
                Err(e)
            }
        }
    }

    pub async fn delete(&self, id: &str, confirm: &dyn Confirm) -> Result<DeleteOutcome> {
        let outcome = self.inner.table.delete(id, confirm).await?;
        if outcome == DeleteOutcome::Deleted {
            self.inner.pending.lock().remove(id);
        }
        Ok(outcome)
    }

    /// Start the periodic background refresh. Calling it again while running is a no-op.
    pub fn start_polling(&self) {
        let mut poller = self.inner.poller.lock();
        if poller.as_ref().is_some_and(|p| !p.is_finished()) {
            return;
        }
        let weak = Arc::downgrade(&self.inner);
        let period = self.inner.timing.poll_interval;
        info!(period_secs = period.as_secs(), "Starting tunnel polling");
        *poller = Some(spawn_periodic("tunnels.poll", period, move || {
            let weak = weak.clone();
            async move {
                if let Some(inner) = weak.upgrade() {
                    let _ = TunnelSynchronizer::from_inner(inner).refresh().await;
                }
            }
        }));
    }

    pub fn is_polling(&self) -> bool {
        self.inner
            .poller
            .lock()
            .as_ref()
            .is_some_and(|p| !p.is_finished())
    }

    pub fn stop_polling(&self) {
        if let Some(poller) = self.inner.poller.lock().take() {
            poller.cancel();
        }
    }

    /// Number of delayed refreshes and transition checks still scheduled
    pub fn scheduled(&self) -> usize {
        self.inner.delayed.pending()
    }

    /// Cancel every timer and stop applying responses. Idempotent.
    pub fn teardown(&self) {
        self.stop_polling();
        self.inner.delayed.cancel_all();
        self.inner.pending.lock().clear();
        self.inner.table.close();
    }
}

impl std::fmt::Debug for TunnelSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TunnelSynchronizer")
            .field("table", &self.inner.table)
            .field("timing", &self.inner.timing)
            .field("polling", &self.is_polling())
            .field("pending", &self.inner.pending.lock().len())
            .finish()
    }
}
