//! SshTunnel - Reverse SSH Tunnel Definition
//!
//! The connection itself is run by the remote server. The only field whose source
//! of truth lives there and changes without any local action is `is_connected`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::record::{Collection, Record};

/// An SSH tunnel definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SshTunnel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub remote_server_user: String,
    #[serde(default)]
    pub remote_server_url: String,
    pub local_port: Option<u16>,
    pub remote_port: Option<u16>,
    #[serde(default = "default_auto_reconnect")]
    pub auto_reconnect: bool,
    #[serde(default)]
    pub startup_enabled: bool,
    /// Reported by the server; never written locally
    #[serde(default, skip_serializing)]
    pub is_connected: bool,
    /// Generated server-side on create; must be installed on the remote host
    #[serde(default, skip_serializing)]
    pub public_key: Option<String>,
    #[serde(default, skip_serializing)]
    pub last_connected_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_auto_reconnect() -> bool {
    true
}

impl Default for SshTunnel {
    fn default() -> Self {
        Self {
            id: None,
            wallet_id: None,
            name: String::new(),
            remote_server_user: String::new(),
            remote_server_url: String::new(),
            local_port: None,
            remote_port: None,
            auto_reconnect: true,
            startup_enabled: false,
            is_connected: false,
            public_key: None,
            last_connected_at: None,
            created_at: None,
            updated_at: None,
        }
    }
}

/// Connection state as last reported by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TunnelStatus {
    Disconnected,
    Connected,
}

impl TunnelStatus {
    pub fn label(&self) -> &'static str {
        match self {
            TunnelStatus::Disconnected => "disconnected",
            TunnelStatus::Connected => "connected",
        }
    }
}

/// Transition request sent to the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TunnelAction {
    Connect,
    Disconnect,
}

impl TunnelAction {
    /// URL segment of the action endpoint
    pub fn path(&self) -> &'static str {
        match self {
            TunnelAction::Connect => "connect",
            TunnelAction::Disconnect => "disconnect",
        }
    }

    /// Status the tunnel is expected to reach once the action completes
    pub fn target(&self) -> TunnelStatus {
        match self {
            TunnelAction::Connect => TunnelStatus::Connected,
            TunnelAction::Disconnect => TunnelStatus::Disconnected,
        }
    }
}

impl SshTunnel {
    pub fn status(&self) -> TunnelStatus {
        if self.is_connected {
            TunnelStatus::Connected
        } else {
            TunnelStatus::Disconnected
        }
    }

    /// The request a toggle issues from the current status
    pub fn toggle_action(&self) -> TunnelAction {
        match self.status() {
            TunnelStatus::Connected => TunnelAction::Disconnect,
            TunnelStatus::Disconnected => TunnelAction::Connect,
        }
    }

    /// `user@host`, as shown in the server column
    pub fn endpoint(&self) -> String {
        if self.remote_server_user.is_empty() {
            self.remote_server_url.clone()
        } else {
            format!("{}@{}", self.remote_server_user, self.remote_server_url)
        }
    }

    /// Port mapping summary, e.g. `localhost:5000 -> :9000`
    pub fn forwarding(&self) -> String {
        let port = |p: Option<u16>| p.map(|p| p.to_string()).unwrap_or_else(|| "?".into());
        format!(
            "localhost:{} -> {}:{}",
            port(self.local_port),
            self.remote_server_url,
            port(self.remote_port)
        )
    }

    /// Line to append to `~/.ssh/authorized_keys` on the remote host
    pub fn authorized_keys_line(&self) -> Option<String> {
        let key = self.public_key.as_deref()?.trim();
        if key.is_empty() {
            return None;
        }
        Some(format!("{key} cloud-connect-{}", self.name))
    }
}

impl Record for SshTunnel {
    const COLLECTION: Collection = Collection::SshTunnels;
    const DEFAULT_SORT: &'static str = "created_at";
    const DELETE_PROMPT: &'static str = "Are you sure you want to delete this SSH tunnel?";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn draft() -> Self {
        Self::default()
    }

    fn saved_message(created: bool) -> Option<String> {
        let message = if created {
            "SSH tunnel created successfully! Public key generated for server setup."
        } else {
            "SSH tunnel updated successfully!"
        };
        Some(message.to_string())
    }

    fn deleted_message() -> Option<String> {
        Some("SSH tunnel deleted successfully".to_string())
    }
}

/// Acknowledgement returned by connect/disconnect
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionMessage {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

fn default_success() -> bool {
    true
}

/// Live process state reported by `/ssh-tunnels/{id}/status`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TunnelStatusReport {
    pub tunnel_id: String,
    pub is_active: bool,
    #[serde(default)]
    pub process_id: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_defaults() {
        let draft = SshTunnel::draft();
        let body = serde_json::to_value(&draft).expect("serialize");
        assert_eq!(
            body,
            serde_json::json!({
                "name": "",
                "remote_server_user": "",
                "remote_server_url": "",
                "local_port": null,
                "remote_port": null,
                "auto_reconnect": true,
                "startup_enabled": false
            })
        );
    }

    #[test]
    fn test_toggle_action_follows_reported_status() {
        let mut tunnel = SshTunnel::draft();
        assert_eq!(tunnel.toggle_action(), TunnelAction::Connect);
        tunnel.is_connected = true;
        assert_eq!(tunnel.status(), TunnelStatus::Connected);
        assert_eq!(tunnel.toggle_action(), TunnelAction::Disconnect);
    }

    #[test]
    fn test_server_fields_are_read_only() {
        let tunnel: SshTunnel = serde_json::from_value(serde_json::json!({
            "id": "t1",
            "wallet_id": "w1",
            "name": "home",
            "remote_server_user": "root",
            "remote_server_url": "vps.example.com",
            "local_port": 5000,
            "remote_port": 9000,
            "auto_reconnect": false,
            "startup_enabled": true,
            "is_connected": true,
            "public_key": "ssh-rsa AAAA",
            "private_key": "ignored"
        }))
        .expect("deserialize");

        assert!(tunnel.is_connected);
        assert_eq!(tunnel.endpoint(), "root@vps.example.com");
        assert_eq!(
            tunnel.authorized_keys_line().as_deref(),
            Some("ssh-rsa AAAA cloud-connect-home")
        );

        let body = serde_json::to_value(&tunnel).expect("serialize");
        assert!(body.get("is_connected").is_none());
        assert!(body.get("public_key").is_none());
        assert_eq!(body["id"], "t1");
    }

    #[test]
    fn test_saved_message_distinguishes_create() {
        let created = SshTunnel::saved_message(true).expect("message");
        assert!(created.contains("Public key generated"));
        let updated = SshTunnel::saved_message(false).expect("message");
        assert!(!updated.contains("Public key"));
    }
}
