//! OwnerData - Top-Level Record Owned by the Current User

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::record::{Collection, Record};

/// An owner data record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OwnerData {
    /// Assigned by the server; absent on a draft
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub name: Option<String>,
    /// Free-form attributes; always sent, even when empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl OwnerData {
    /// Label used in owner pickers and console listings
    pub fn display_name(&self) -> String {
        match (&self.name, &self.id) {
            (Some(name), _) if !name.is_empty() => name.clone(),
            (_, Some(id)) => id.clone(),
            _ => "(unnamed)".to_string(),
        }
    }
}

impl Record for OwnerData {
    const COLLECTION: Collection = Collection::OwnerData;
    const DELETE_PROMPT: &'static str = "Are you sure you want to delete this Owner Data?";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn draft() -> Self {
        Self {
            name: None,
            ..Default::default()
        }
    }

    fn prepare_for_save(&mut self) {
        self.extra.get_or_insert_with(Map::new);
    }
}
