//! Cloud Connect Panel Library
//!
//! Headless controller for the Cloud Connect admin panel: paginated tables for owner
//! data, client data and SSH tunnels, their form dialogs, and the synchronizer that
//! keeps tunnel connection status in step with the server.

pub mod app;
pub mod constants;
pub mod domain;
pub mod error;
pub mod eventing;
pub mod helpers;
pub mod services;
pub mod state;
