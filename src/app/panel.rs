//! Panel - Application Root
//!
//! Owns every bundle, bootstraps the initial loads and owns the background tasks
//! (change observers and the tunnel poller) for the lifetime of the panel.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, RwLock};
use tracing::{info, warn};

use crate::app::entities::{ClientDataBundle, Gateways, OwnerDataBundle, TunnelBundle};
use crate::constants::BASE_CURRENCY;
use crate::domain::config::PanelConfig;
use crate::eventing::Notifier;
use crate::services::{PanelGateway, TaskHandle};
use crate::state::SettingsDialog;

/// The whole controller: three record bundles, settings, currencies
pub struct Panel {
    pub owner_data: OwnerDataBundle,
    pub client_data: ClientDataBundle,
    pub tunnels: TunnelBundle,
    pub settings: SettingsDialog,
    config: PanelConfig,
    notifier: Notifier,
    panel_gateway: Arc<dyn PanelGateway>,
    currencies: RwLock<Vec<String>>,
    observers: Mutex<Vec<TaskHandle>>,
    torn_down: AtomicBool,
}

impl Panel {
    pub fn new(gateways: Gateways, config: PanelConfig, notifier: Notifier) -> Self {
        let rows_per_page = config.table.rows_per_page;
        Self {
            owner_data: OwnerDataBundle::new(gateways.owner_data.clone(), notifier.clone(), rows_per_page),
            client_data: ClientDataBundle::new(gateways.client_data.clone(), notifier.clone(), rows_per_page),
            tunnels: TunnelBundle::new(&gateways, notifier.clone(), &config),
            settings: SettingsDialog::new(gateways.panel.clone(), notifier.clone()),
            panel_gateway: gateways.panel,
            currencies: RwLock::new(vec![BASE_CURRENCY.to_string()]),
            observers: Mutex::new(Vec::new()),
            torn_down: AtomicBool::new(false),
            config,
            notifier,
        }
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Currency codes offered to the user, `sat` first
    pub fn currencies(&self) -> Vec<String> {
        self.currencies.read().clone()
    }

    /// Initial loads, then the change observers and the tunnel poller.
    ///
    /// Failures are reported per load; one failing listing does not stop the others.
    pub async fn bootstrap(&self) {
        info!("Bootstrapping panel");
        let _ = futures::join!(
            self.load_currencies(),
            self.owner_data.table.fetch(),
            self.client_data.table.fetch(),
            self.tunnels.sync.refresh(),
        );

        if self.is_torn_down() {
            return;
        }

        let debounce = self.config.refresh.search_debounce();
        {
            let mut observers = self.observers.lock();
            if observers.is_empty() {
                observers.push(self.owner_data.table.subscribe_changes(debounce));
                observers.push(self.client_data.table.subscribe_changes(debounce));
                observers.push(self.tunnels.table().subscribe_changes(debounce));
            }
        }
        self.tunnels.sync.start_polling();
    }

    async fn load_currencies(&self) {
        match self.panel_gateway.currencies().await {
            Ok(remote) => {
                let mut currencies = vec![BASE_CURRENCY.to_string()];
                currencies.extend(remote.into_iter().filter(|c| c != BASE_CURRENCY));
                info!(count = currencies.len(), "Loaded currencies");
                *self.currencies.write() = currencies;
            }
            Err(e) => {
                warn!(error = %e, "Loading currencies failed");
                self.notifier.api_error(&e);
            }
        }
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::SeqCst)
    }

    /// Cancel every timer and observer and stop applying responses. Idempotent.
    pub fn teardown(&self) {
        if self.torn_down.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("Tearing down panel");
        for observer in self.observers.lock().drain(..) {
            observer.cancel();
        }
        self.tunnels.sync.teardown();
        self.owner_data.table.close();
        self.client_data.table.close();
        self.owner_data.dialog.close();
        self.client_data.dialog.close();
        self.tunnels.dialog.close();
        self.tunnels.details.close();
        self.settings.close();
    }
}

impl Drop for Panel {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for Panel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Panel")
            .field("owner_data", &self.owner_data.table)
            .field("client_data", &self.client_data.table)
            .field("tunnels", &self.tunnels.sync)
            .field("torn_down", &self.is_torn_down())
            .finish()
    }
}
