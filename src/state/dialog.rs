//! Dialogs - Draft Editing and Commit Protocol
//!
//! A dialog edits a private copy of a record. Nothing it does touches the owning
//! table's rows; a successful save triggers a refetch instead.
//!
//! Every `open_*`/`close` bumps a generation counter. A save that settles after the
//! dialog moved on still refreshes the table but leaves the new draft alone.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::domain::{Record, Settings, SshTunnel};
use crate::error::{Error, Result};
use crate::eventing::Notifier;
use crate::services::PanelGateway;
use crate::state::table::TableState;

#[derive(Debug, Clone)]
struct DraftState<T> {
    draft: T,
    visible: bool,
    saving: bool,
    generation: u64,
}

impl<T> DraftState<T> {
    fn new(draft: T) -> Self {
        Self {
            draft,
            visible: false,
            saving: false,
            generation: 0,
        }
    }

    fn show(&mut self, draft: T) {
        self.draft = draft;
        self.visible = true;
        self.saving = false;
        self.generation += 1;
    }

    fn hide(&mut self) {
        self.visible = false;
        self.saving = false;
        self.generation += 1;
    }

    /// Mark a save as started and return the generation it belongs to
    fn begin_save(&mut self) -> Result<u64> {
        if !self.visible {
            return Err(Error::Invalid {
                message: "dialog is not open".to_string(),
            });
        }
        if self.saving {
            return Err(Error::Invalid {
                message: "a save is already in progress".to_string(),
            });
        }
        self.saving = true;
        Ok(self.generation)
    }

    /// Settle a save. Returns `true` if the dialog is still on the same generation.
    fn finish_save(&mut self, generation: u64, succeeded: bool) -> bool {
        if self.generation != generation {
            return false;
        }
        self.saving = false;
        if succeeded {
            self.hide();
        }
        true
    }
}

// ============================================================================
// FormDialog
// ============================================================================

/// Create/edit dialog for one record type, bound to the table it refreshes
pub struct FormDialog<R: Record> {
    table: TableState<R>,
    state: Arc<RwLock<DraftState<R>>>,
}

impl<R: Record> Clone for FormDialog<R> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            state: self.state.clone(),
        }
    }
}

impl<R: Record> FormDialog<R> {
    pub fn new(table: TableState<R>) -> Self {
        Self {
            table,
            state: Arc::new(RwLock::new(DraftState::new(R::draft()))),
        }
    }

    /// Open with a fresh draft carrying every default field
    pub fn open_for_create(&self) {
        self.open_for_create_with(|_| {});
    }

    /// Open with a fresh draft, pre-filling some fields (e.g. the selected owner)
    pub fn open_for_create_with(&self, prefill: impl FnOnce(&mut R)) {
        let mut draft = R::draft();
        prefill(&mut draft);
        debug!(collection = %R::COLLECTION, "Opening create dialog");
        self.state.write().show(draft);
    }

    /// Open on a copy of `record`
    pub fn open_for_edit(&self, record: &R) {
        debug!(collection = %R::COLLECTION, id = ?record.id(), "Opening edit dialog");
        self.state.write().show(record.clone());
    }

    /// Discard the draft without sending anything
    pub fn close(&self) {
        self.state.write().hide();
    }

    pub fn is_open(&self) -> bool {
        self.state.read().visible
    }

    pub fn is_saving(&self) -> bool {
        self.state.read().saving
    }

    pub fn draft(&self) -> R {
        self.state.read().draft.clone()
    }

    /// Mutate the draft in place
    pub fn edit(&self, apply: impl FnOnce(&mut R)) {
        apply(&mut self.state.write().draft);
    }

    pub fn table(&self) -> &TableState<R> {
        &self.table
    }

    /// Commit the draft: create when it has no id, update otherwise.
    ///
    /// On success the dialog closes and the table refetches. On failure the dialog
    /// stays open with the draft exactly as it was.
    pub async fn save(&self) -> Result<R> {
        let (generation, mut outgoing) = {
            let mut state = self.state.write();
            let generation = state.begin_save()?;
            (generation, state.draft.clone())
        };
        outgoing.prepare_for_save();

        let created = !outgoing.is_persisted();
        let result = match outgoing.id().filter(|_| !created) {
            Some(id) => self.table.gateway().update(id, &outgoing).await,
            None => self.table.gateway().create(&outgoing).await,
        };

        let current = self.state.write().finish_save(generation, result.is_ok());
        match result {
            Ok(saved) => {
                info!(collection = %R::COLLECTION, id = ?saved.id(), created, "Record saved");
                if !current {
                    debug!(collection = %R::COLLECTION, "Dialog moved on before save settled");
                }
                if let Some(message) = R::saved_message(created) {
                    self.table.notifier().positive(message);
                }
                let _ = self.table.fetch().await;
                Ok(saved)
            }
            Err(e) => {
                warn!(collection = %R::COLLECTION, created, error = %e, "Save failed");
                self.table.notifier().api_error(&e);
                Err(e)
            }
        }
    }
}

impl<R: Record> std::fmt::Debug for FormDialog<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("FormDialog")
            .field("collection", &R::COLLECTION)
            .field("visible", &state.visible)
            .field("saving", &state.saving)
            .field("draft_id", &state.draft.id())
            .finish()
    }
}

// ============================================================================
// DetailsDialog
// ============================================================================

/// Read-only view of one record
#[derive(Debug)]
pub struct DetailsDialog<R> {
    record: RwLock<Option<R>>,
}

impl<R: Clone> Default for DetailsDialog<R> {
    fn default() -> Self {
        Self {
            record: RwLock::new(None),
        }
    }
}

impl<R: Clone> DetailsDialog<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self, record: &R) {
        *self.record.write() = Some(record.clone());
    }

    pub fn close(&self) {
        *self.record.write() = None;
    }

    pub fn is_open(&self) -> bool {
        self.record.read().is_some()
    }

    pub fn record(&self) -> Option<R> {
        self.record.read().clone()
    }
}

impl DetailsDialog<SshTunnel> {
    /// Setup instructions for the open tunnel, if it already has a public key
    pub fn setup_hint(&self) -> Option<String> {
        let record = self.record.read();
        let tunnel = record.as_ref()?;
        let line = tunnel.authorized_keys_line()?;
        Some(format!(
            "Add this line to ~/.ssh/authorized_keys for {} on the remote server:\n{line}",
            tunnel.endpoint()
        ))
    }
}

// ============================================================================
// SettingsDialog
// ============================================================================

/// Extension settings editor
pub struct SettingsDialog {
    gateway: Arc<dyn PanelGateway>,
    notifier: Notifier,
    state: RwLock<DraftState<Settings>>,
}

impl SettingsDialog {
    pub fn new(gateway: Arc<dyn PanelGateway>, notifier: Notifier) -> Self {
        Self {
            gateway,
            notifier,
            state: RwLock::new(DraftState::new(Settings::default())),
        }
    }

    /// Load the current settings, then show them. Stays closed if loading fails.
    pub async fn open(&self) -> Result<()> {
        match self.gateway.settings().await {
            Ok(settings) => {
                self.state.write().show(settings);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Loading settings failed");
                self.notifier.api_error(&e);
                Err(e)
            }
        }
    }

    pub fn close(&self) {
        self.state.write().hide();
    }

    pub fn is_open(&self) -> bool {
        self.state.read().visible
    }

    pub fn draft(&self) -> Settings {
        self.state.read().draft.clone()
    }

    pub fn edit(&self, apply: impl FnOnce(&mut Settings)) {
        apply(&mut self.state.write().draft);
    }

    pub async fn save(&self) -> Result<Settings> {
        let (generation, outgoing) = {
            let mut state = self.state.write();
            let generation = state.begin_save()?;
            (generation, state.draft.clone())
        };

        let result = self.gateway.update_settings(&outgoing).await;
        self.state.write().finish_save(generation, result.is_ok());
        match result {
            Ok(saved) => {
                info!("Settings saved");
                Ok(saved)
            }
            Err(e) => {
                warn!(error = %e, "Saving settings failed");
                self.notifier.api_error(&e);
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for SettingsDialog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsDialog")
            .field("visible", &self.state.read().visible)
            .finish()
    }
}
