//! Settings - Per-User Extension Settings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Extension settings as exposed by `/settings`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Fields this client does not know about, sent back untouched
    #[serde(flatten)]
    pub other: Map<String, Value>,
}
