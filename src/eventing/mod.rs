//! Eventing - User-Visible Notifications
//!
//! Controllers never print or pop dialogs themselves; they push notifications into
//! a channel that the front-end drains.

mod notification;

pub use notification::*;
