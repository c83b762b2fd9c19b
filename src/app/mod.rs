//! Application Layer
//!
//! The panel root that owns every per-entity bundle, and the console front-end
//! that drives it.

pub mod console;
pub mod entities;
pub mod panel;

pub use entities::{ClientDataBundle, Gateways, OwnerDataBundle, TunnelBundle};
pub use panel::Panel;
