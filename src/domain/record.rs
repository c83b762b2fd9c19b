//! Record - Shared Shape of Every Managed Entity
//!
//! Owner data, client data and SSH tunnels all follow the same lifecycle: a draft
//! without `id` becomes a persisted record once the remote side assigns one.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Debug;

/// The three remote collections the panel manages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    OwnerData,
    ClientData,
    SshTunnels,
}

impl Collection {
    /// URL segment of the collection root
    pub fn path(&self) -> &'static str {
        match self {
            Collection::OwnerData => "owner_data",
            Collection::ClientData => "client_data",
            Collection::SshTunnels => "ssh-tunnels",
        }
    }

    /// URL segment of the paginated listing.
    ///
    /// Tunnels are listed from the collection root, the other two from `/paginated`.
    pub fn list_path(&self) -> String {
        match self {
            Collection::SshTunnels => self.path().to_string(),
            other => format!("{}/paginated", other.path()),
        }
    }

    /// Human-readable label used in prompts and logs
    pub fn label(&self) -> &'static str {
        match self {
            Collection::OwnerData => "Owner Data",
            Collection::ClientData => "Client Data",
            Collection::SshTunnels => "SSH tunnel",
        }
    }

    /// Parse the short names accepted by the console (`owner`, `client`, `tunnel`)
    pub fn from_alias(alias: &str) -> Option<Self> {
        match alias.trim().to_ascii_lowercase().as_str() {
            "owner" | "owners" | "owner_data" => Some(Collection::OwnerData),
            "client" | "clients" | "client_data" => Some(Collection::ClientData),
            "tunnel" | "tunnels" | "ssh-tunnels" => Some(Collection::SshTunnels),
            _ => None,
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// A persisted or draft entity held by a table or a form dialog.
///
/// A record with `id() == Some(_)` is persisted; `None` marks a draft that has not
/// been created yet.
pub trait Record: Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    const COLLECTION: Collection;

    /// Default sort column of the table listing this record
    const DEFAULT_SORT: &'static str = "updated_at";

    /// Confirmation prompt shown before a delete request
    const DELETE_PROMPT: &'static str;

    fn id(&self) -> Option<&str>;

    /// A fresh draft with every field the remote schema expects set to its default.
    fn draft() -> Self;

    /// Normalization applied to the outgoing copy on save. The dialog's draft is
    /// never touched by this.
    fn prepare_for_save(&mut self) {}

    /// Positive message shown after a successful save, if any.
    fn saved_message(_created: bool) -> Option<String> {
        None
    }

    /// Positive message shown after a successful delete, if any.
    fn deleted_message() -> Option<String> {
        None
    }

    fn is_persisted(&self) -> bool {
        self.id().is_some_and(|id| !id.is_empty())
    }
}
