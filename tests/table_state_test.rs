//! Integration tests for the paginated table state
//!
//! Overlapping fetches, the loading flag and delete/refresh ordering.

mod common;

use std::sync::Arc;

use cloud_connect_panel::domain::{OwnerData, Page, SshTunnel};
use cloud_connect_panel::error::Error;
use cloud_connect_panel::eventing::NotificationLevel;
use cloud_connect_panel::state::{AutoConfirm, DeleteOutcome, TableState};

use common::{FakeRemote, GatedGateway, notifier, settle};

fn owner(id: &str) -> OwnerData {
    OwnerData {
        id: Some(id.to_string()),
        name: Some(format!("Owner {id}")),
        ..Default::default()
    }
}

fn page(ids: &[&str], total: u64) -> Page<OwnerData> {
    Page {
        data: ids.iter().map(|id| owner(id)).collect(),
        total,
    }
}

fn ids(table: &TableState<OwnerData>) -> Vec<String> {
    table.rows().into_iter().filter_map(|r| r.id).collect()
}

/// The response that settles last is the one shown, even if it was issued first
#[tokio::test]
async fn test_last_settled_response_wins() {
    let gateway = GatedGateway::<OwnerData>::new();
    let (notifier, _rx) = notifier();
    let table = TableState::new(gateway.clone(), notifier, 10);

    let first_gate = gateway.push(Ok(page(&["a"], 1)));
    let second_gate = gateway.push(Ok(page(&["b1", "b2"], 2)));

    let first = tokio::spawn({
        let table = table.clone();
        async move { table.fetch().await }
    });
    settle().await;
    let second = tokio::spawn({
        let table = table.clone();
        async move { table.fetch().await }
    });
    settle().await;
    assert!(table.loading());

    second_gate.send(()).expect("release second");
    second.await.expect("join").expect("second fetch");
    assert_eq!(ids(&table), vec!["b1", "b2"]);
    assert!(table.loading(), "first fetch is still outstanding");

    first_gate.send(()).expect("release first");
    first.await.expect("join").expect("first fetch");
    assert_eq!(ids(&table), vec!["a"]);
    assert_eq!(table.total(), 1);
    assert_eq!(table.view().shown_ticket, Some(1));
    assert!(!table.loading());
}

/// A failure settling after a success never clears rows and never leaves loading stuck
#[tokio::test]
async fn test_overlapping_failure_keeps_last_good_page() {
    let gateway = GatedGateway::<OwnerData>::new();
    let (notifier, rx) = notifier();
    let table = TableState::new(gateway.clone(), notifier, 10);

    let ok_gate = gateway.push(Ok(page(&["a", "b"], 2)));
    let err_gate = gateway.push(Err(Error::Server {
        status: 502,
        message: "Bad Gateway".to_string(),
    }));

    let ok = tokio::spawn({
        let table = table.clone();
        async move { table.fetch().await }
    });
    settle().await;
    let failing = tokio::spawn({
        let table = table.clone();
        async move { table.fetch().await }
    });
    settle().await;

    ok_gate.send(()).expect("release ok");
    err_gate.send(()).expect("release err");
    ok.await.expect("join").expect("ok fetch");
    assert!(failing.await.expect("join").is_err());

    assert_eq!(ids(&table), vec!["a", "b"]);
    assert!(!table.loading());
    let notification = rx.try_recv().expect("notification");
    assert_eq!(notification.level, NotificationLevel::Negative);
    assert_eq!(notification.message, "Bad Gateway");
}

/// Dropping an in-flight fetch (e.g. an aborted task) still resets loading
#[tokio::test]
async fn test_aborted_fetch_resets_loading() {
    let gateway = GatedGateway::<OwnerData>::new();
    let (notifier, _rx) = notifier();
    let table = TableState::new(gateway.clone(), notifier, 10);
    let _gate = gateway.push(Ok(page(&["a"], 1)));

    let task = tokio::spawn({
        let table = table.clone();
        async move { table.fetch().await }
    });
    settle().await;
    assert!(table.loading());

    task.abort();
    let _ = task.await;
    assert!(!table.loading());
    assert!(table.rows().is_empty());
}

/// A response that settles after teardown is discarded
#[tokio::test]
async fn test_response_after_close_is_discarded() {
    let gateway = GatedGateway::<OwnerData>::new();
    let (notifier, _rx) = notifier();
    let table = TableState::new(gateway.clone(), notifier, 10);
    let gate = gateway.push(Ok(page(&["late"], 1)));

    let task = tokio::spawn({
        let table = table.clone();
        async move { table.fetch().await }
    });
    settle().await;
    table.close();
    gate.send(()).expect("release");
    task.await.expect("join").expect("fetch");

    assert!(table.rows().is_empty());
    assert!(!table.loading());
}

/// Confirm, then delete, then refresh; in that order
#[tokio::test]
async fn test_delete_confirms_then_deletes_then_refreshes() {
    let remote = FakeRemote::with_tunnels(3);
    let (notifier, rx) = notifier();
    let table: TableState<SshTunnel> = TableState::new(remote.clone(), notifier, 10);
    table.fetch().await.expect("fetch");
    remote.clear_calls();

    let outcome = table.delete("t1", &AutoConfirm(true)).await.expect("delete");
    assert_eq!(outcome, DeleteOutcome::Deleted);
    assert_eq!(remote.calls(), vec!["DELETE ssh-tunnels/t1", "GET ssh-tunnels"]);
    assert_eq!(table.total(), 2);

    let message = rx.try_recv().expect("notification");
    assert_eq!(message.message, "SSH tunnel deleted successfully");
}

#[tokio::test]
async fn test_declined_delete_issues_no_request() {
    let remote = FakeRemote::with_tunnels(3);
    let (notifier, rx) = notifier();
    let table: TableState<SshTunnel> = TableState::new(remote.clone(), notifier, 10);

    let outcome = table.delete("t1", &AutoConfirm(false)).await.expect("declined");
    assert_eq!(outcome, DeleteOutcome::Declined);
    assert!(remote.calls().is_empty());
    assert!(rx.try_recv().is_err());
}

/// Deleting the only row on the last page moves the view back a page
#[tokio::test]
async fn test_delete_only_row_on_last_page() {
    let remote = FakeRemote::with_tunnels(11);
    let (notifier, _rx) = notifier();
    let table: TableState<SshTunnel> = TableState::new(remote.clone(), notifier, 10);
    table.set_page(2);
    table.fetch().await.expect("fetch");
    assert_eq!(table.rows().len(), 1);
    assert_eq!(table.total(), 11);

    table.delete("t10", &AutoConfirm(true)).await.expect("delete");

    let view = table.view();
    assert_eq!(view.total, 10);
    assert_eq!(view.pagination.page, 1);
    assert_eq!(view.total_pages(), 1);
    assert_eq!(view.rows.len(), 10);
    assert!(!view.loading);
}

#[tokio::test]
async fn test_search_only_sent_when_non_empty() {
    let remote = FakeRemote::new();
    remote.owners.lock().extend([owner("o1"), owner("o2")]);
    let (notifier, _rx) = notifier();
    let table: TableState<OwnerData> = TableState::new(remote.clone(), notifier, 10);

    table.set_search("o2");
    table.fetch().await.expect("fetch");
    assert_eq!(ids(&table), vec!["o2"]);

    table.set_search("");
    table.fetch().await.expect("fetch");
    assert_eq!(ids(&table), vec!["o1", "o2"]);
    assert_eq!(table.total(), 2);
}

#[tokio::test]
async fn test_shared_fake_is_usable_as_gateway() {
    let remote: Arc<FakeRemote> = FakeRemote::new();
    let (notifier, _rx) = notifier();
    let table: TableState<OwnerData> = TableState::new(remote, notifier, 5);
    table.fetch().await.expect("fetch");
    assert!(table.rows().is_empty());
    assert_eq!(table.view().total_pages(), 1);
}
