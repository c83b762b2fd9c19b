//! Integration tests for the panel root: bootstrap, observers and teardown

mod common;

use std::time::Duration;

use cloud_connect_panel::app::{Gateways, Panel};
use cloud_connect_panel::domain::{ClientData, OwnerFilter, PanelConfig};

use common::{FakeRemote, notifier, settle};

fn panel(remote: &std::sync::Arc<FakeRemote>) -> Panel {
    let (notifier, _rx) = notifier();
    Panel::new(Gateways::shared(remote.clone()), PanelConfig::default(), notifier)
}

#[tokio::test(start_paused = true)]
async fn test_bootstrap_loads_everything() {
    let remote = FakeRemote::with_tunnels(3);
    let panel = panel(&remote);
    assert_eq!(panel.currencies(), vec!["sat"]);

    panel.bootstrap().await;

    assert_eq!(panel.currencies(), vec!["sat", "USD", "EUR"]);
    assert_eq!(panel.tunnels.table().total(), 3);
    assert_eq!(remote.count_calls("GET owner_data/paginated"), 1);
    assert_eq!(remote.count_calls("GET client_data/paginated"), 1);
    assert_eq!(remote.count_calls("GET ssh-tunnels"), 1);
    assert_eq!(remote.count_calls("GET currencies"), 1);
    assert!(panel.tunnels.sync.is_polling());

    panel.teardown();
}

#[tokio::test(start_paused = true)]
async fn test_owner_selection_refetches_client_data() {
    let remote = FakeRemote::new();
    remote.clients.lock().extend([
        ClientData {
            id: Some("c1".to_string()),
            owner_data_id: Some("o1".to_string()),
            ..Default::default()
        },
        ClientData {
            id: Some("c2".to_string()),
            owner_data_id: Some("o2".to_string()),
            ..Default::default()
        },
    ]);
    let panel = panel(&remote);
    panel.bootstrap().await;
    assert_eq!(panel.client_data.table.total(), 2);

    panel.client_data.select_owner(OwnerFilter::Owner("o2".to_string()));
    settle().await;

    let rows = panel.client_data.table.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id.as_deref(), Some("c2"));
    assert_eq!(
        remote.calls().last().map(String::as_str),
        Some(r#"GET client_data/paginated [("owner_data_id", "o2")]"#)
    );
}

#[tokio::test(start_paused = true)]
async fn test_search_change_triggers_fetch() {
    let remote = FakeRemote::with_tunnels(2);
    let panel = panel(&remote);
    panel.bootstrap().await;
    let before = remote.count_calls("GET ssh-tunnels");

    panel.tunnels.table().set_search("t1");
    settle().await;
    assert_eq!(remote.count_calls("GET ssh-tunnels"), before + 1);

    // Unchanged term is not a change
    panel.tunnels.table().set_search("t1");
    settle().await;
    assert_eq!(remote.count_calls("GET ssh-tunnels"), before + 1);
}

#[tokio::test(start_paused = true)]
async fn test_teardown_is_idempotent_and_final() {
    let remote = FakeRemote::with_tunnels(1);
    let panel = panel(&remote);
    panel.bootstrap().await;

    panel.teardown();
    panel.teardown();
    assert!(panel.is_torn_down());
    remote.clear_calls();

    panel.owner_data.table.set_search("late");
    tokio::time::sleep(Duration::from_secs(120)).await;
    settle().await;
    assert!(remote.calls().is_empty());
    assert!(!panel.tunnels.sync.is_polling());
}

#[tokio::test(start_paused = true)]
async fn test_settings_round_trip() {
    let remote = FakeRemote::new();
    let panel = panel(&remote);

    panel.settings.open().await.expect("open");
    assert!(panel.settings.is_open());
    panel.settings.edit(|s| s.name = Some("My panel".to_string()));
    panel.settings.save().await.expect("save");

    assert!(!panel.settings.is_open());
    assert_eq!(remote.settings.lock().name.as_deref(), Some("My panel"));
}
