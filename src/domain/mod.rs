//! Domain - Pure Data Structures and Protocol Types
//!
//! These types don't depend on the runtime and represent the records the panel
//! manages and the wire shapes of the remote API.

pub mod client_data;
pub mod config;
pub mod owner_data;
pub mod page;
pub mod record;
pub mod settings;
pub mod ssh_tunnel;

pub use client_data::{ClientData, OwnerFilter};
pub use config::PanelConfig;
pub use owner_data::OwnerData;
pub use page::{ListQuery, Page, Pagination};
pub use record::{Collection, Record};
pub use settings::Settings;
pub use ssh_tunnel::{ActionMessage, SshTunnel, TunnelAction, TunnelStatus, TunnelStatusReport};
