//! ClientData - Records Filed Under an Owner

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::record::{Collection, Record};

/// A client data record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Owning owner data record, used as a listing filter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_data_id: Option<String>,
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Record for ClientData {
    const COLLECTION: Collection = Collection::ClientData;
    const DELETE_PROMPT: &'static str = "Are you sure you want to delete this Client Data?";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn draft() -> Self {
        Self::default()
    }

    fn prepare_for_save(&mut self) {
        self.extra.get_or_insert_with(Map::new);
    }
}

/// Owner selection driving the client data listing filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OwnerFilter {
    /// "All Owner Data"
    #[default]
    All,
    Owner(String),
}

impl OwnerFilter {
    pub fn owner_id(&self) -> Option<&str> {
        match self {
            OwnerFilter::All => None,
            OwnerFilter::Owner(id) => Some(id.as_str()),
        }
    }
}

impl From<Option<String>> for OwnerFilter {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(id) if !id.is_empty() => OwnerFilter::Owner(id),
            _ => OwnerFilter::All,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_filter_from_option() {
        assert_eq!(OwnerFilter::from(None), OwnerFilter::All);
        assert_eq!(OwnerFilter::from(Some(String::new())), OwnerFilter::All);
        assert_eq!(
            OwnerFilter::from(Some("o1".to_string())).owner_id(),
            Some("o1")
        );
    }

    #[test]
    fn test_update_body_carries_id_and_extra() {
        let mut record = ClientData {
            id: Some("c1".to_string()),
            owner_data_id: Some("o1".to_string()),
            name: Some("Bob".to_string()),
            ..Default::default()
        };
        record.prepare_for_save();
        let body = serde_json::to_value(&record).expect("serialize");
        assert_eq!(body["id"], "c1");
        assert_eq!(body["extra"], serde_json::json!({}));
    }
}
