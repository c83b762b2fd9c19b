//! State - Per-Entity Controller State
//!
//! Each record type gets an independently owned bundle: a table, a form dialog and,
//! for tunnels, a synchronizer. Bundles never hold references to each other; the
//! client data listing learns the selected owner through a query filter.

pub mod confirm;
pub mod dialog;
pub mod log_state;
pub mod table;
pub mod tunnels;

pub use confirm::{AutoConfirm, Confirm};
pub use dialog::{DetailsDialog, FormDialog, SettingsDialog};
pub use log_state::NotificationLog;
pub use table::{DeleteOutcome, TableState, TableView};
pub use tunnels::{PendingTransition, SyncTiming, TunnelSynchronizer};
