//! Entities - Per-Entity State Bundles
//!
//! One bundle per record type, each independently owned by the panel. This pattern
//! avoids a monolith state: a tunnel poll never touches the owner data bundle.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::domain::config::PanelConfig;
use crate::domain::{ClientData, OwnerData, OwnerFilter, SshTunnel};
use crate::eventing::Notifier;
use crate::services::{PanelGateway, RecordGateway, TunnelGateway};
use crate::state::{DetailsDialog, FormDialog, SyncTiming, TableState, TunnelSynchronizer};

/// Listing filter carrying the selected owner
pub const OWNER_FILTER_KEY: &str = "owner_data_id";

/// Every gateway the panel talks to
#[derive(Clone)]
pub struct Gateways {
    pub owner_data: Arc<dyn RecordGateway<OwnerData>>,
    pub client_data: Arc<dyn RecordGateway<ClientData>>,
    pub tunnels: Arc<dyn RecordGateway<SshTunnel>>,
    pub tunnel_actions: Arc<dyn TunnelGateway>,
    pub panel: Arc<dyn PanelGateway>,
}

impl Gateways {
    /// Use one implementation (e.g. `HttpGateway`) for every endpoint
    pub fn shared<G>(gateway: Arc<G>) -> Self
    where
        G: RecordGateway<OwnerData>
            + RecordGateway<ClientData>
            + RecordGateway<SshTunnel>
            + TunnelGateway
            + PanelGateway
            + 'static,
    {
        Self {
            owner_data: gateway.clone(),
            client_data: gateway.clone(),
            tunnels: gateway.clone(),
            tunnel_actions: gateway.clone(),
            panel: gateway,
        }
    }
}

/// Owner data table and its form
#[derive(Debug, Clone)]
pub struct OwnerDataBundle {
    pub table: TableState<OwnerData>,
    pub dialog: FormDialog<OwnerData>,
}

impl OwnerDataBundle {
    pub fn new(gateway: Arc<dyn RecordGateway<OwnerData>>, notifier: Notifier, rows_per_page: u32) -> Self {
        let table = TableState::new(gateway, notifier, rows_per_page);
        Self {
            dialog: FormDialog::new(table.clone()),
            table,
        }
    }
}

/// Client data table, its form and the owner it is filtered by
#[derive(Debug, Clone)]
pub struct ClientDataBundle {
    pub table: TableState<ClientData>,
    pub dialog: FormDialog<ClientData>,
    owner: Arc<RwLock<OwnerFilter>>,
}

impl ClientDataBundle {
    pub fn new(gateway: Arc<dyn RecordGateway<ClientData>>, notifier: Notifier, rows_per_page: u32) -> Self {
        let table = TableState::new(gateway, notifier, rows_per_page);
        Self {
            dialog: FormDialog::new(table.clone()),
            table,
            owner: Arc::new(RwLock::new(OwnerFilter::All)),
        }
    }

    pub fn owner(&self) -> OwnerFilter {
        self.owner.read().clone()
    }

    /// Change the owner filter; the table's change observer picks up the refetch.
    pub fn select_owner(&self, filter: OwnerFilter) -> bool {
        let owner_id = filter.owner_id().map(str::to_string);
        *self.owner.write() = filter;
        self.table.set_filter(OWNER_FILTER_KEY, owner_id)
    }

    /// New client data pre-assigned to the selected owner
    pub fn open_for_create(&self) {
        let owner_id = self.owner.read().owner_id().map(str::to_string);
        self.dialog.open_for_create_with(|draft| draft.owner_data_id = owner_id);
    }
}

/// Tunnel synchronizer, its form and the read-only details view
#[derive(Debug, Clone)]
pub struct TunnelBundle {
    pub sync: TunnelSynchronizer,
    pub dialog: FormDialog<SshTunnel>,
    pub details: Arc<DetailsDialog<SshTunnel>>,
}

impl TunnelBundle {
    pub fn new(gateways: &Gateways, notifier: Notifier, config: &PanelConfig) -> Self {
        let table = TableState::new(gateways.tunnels.clone(), notifier, config.table.rows_per_page);
        let sync = TunnelSynchronizer::new(
            table.clone(),
            gateways.tunnel_actions.clone(),
            SyncTiming::from(&config.refresh),
        );
        Self {
            sync,
            dialog: FormDialog::new(table),
            details: Arc::new(DetailsDialog::new()),
        }
    }

    pub fn table(&self) -> &TableState<SshTunnel> {
        self.sync.table()
    }
}
