//! Service Layer
//!
//! Everything that crosses the network boundary or runs in the background.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        HttpGateway                            │
//! │  RecordGateway<R>  │  TunnelGateway  │  PanelGateway          │
//! └──────────────────────────────────────────────────────────────┘
//!                 ▲ async requests          │ Page / Record / ActionMessage
//!                 │                         ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         State Layer                           │
//! │  TableState<R>  │  FormDialog<R>  │  TunnelSynchronizer       │
//! └──────────────────────────────────────────────────────────────┘
//!                 ▲
//!                 │ TaskHandle (periodic / delayed refresh, change observers)
//!           scheduler
//! ```

mod gateway;
mod http;
mod scheduler;

pub use gateway::*;
pub use http::*;
pub use scheduler::*;
