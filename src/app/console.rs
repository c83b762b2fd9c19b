//! Console - Line-Oriented Front-End
//!
//! Reads commands from stdin, routes them to the panel's mutation entry points and
//! prints tables and notifications. Destructive actions ask `y/N` on the same input.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use crossbeam_channel::Receiver;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;
use tracing::debug;

use crate::app::Panel;
use crate::domain::{Collection, OwnerFilter, Record, SshTunnel};
use crate::error::Result;
use crate::eventing::Notification;
use crate::state::{Confirm, DeleteOutcome, NotificationLog, TableView};

type SharedInput = Arc<Mutex<Lines<BufReader<Stdin>>>>;

const HELP: &str = "\
Commands:
  list <owner|client|tunnel>             show the current page
  refresh <owner|client|tunnel>          reload the current page
  search <entity> [term]                 set (or clear) the search term
  page <entity> <n>                      go to page n
  sort <entity> <field> [asc|desc]       change the sort column
  owner <id|all>                         filter client data by owner
  new-owner <name>                       create owner data
  new-client <name>                      create client data for the selected owner
  new-tunnel name=.. user=.. url=.. local=.. remote=.. [auto_reconnect=..] [startup=..]
  toggle <tunnel-id>                     connect or disconnect a tunnel
  status <tunnel-id>                     live process state of a tunnel
  details <tunnel-id>                    tunnel details and public key
  delete <entity> <id>                   delete a record
  settings [name=<value>]                show or update extension settings
  save-config                            write the running config (api key encrypted)
  log                                    recent notifications
  quit";

/// A parsed console command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    List(Collection),
    Refresh(Collection),
    Search(Collection, String),
    Page(Collection, u32),
    Sort {
        collection: Collection,
        field: String,
        descending: bool,
    },
    Owner(OwnerFilter),
    NewOwner(String),
    NewClient(String),
    NewTunnel(SshTunnel),
    Toggle(String),
    Status(String),
    Details(String),
    Delete(Collection, String),
    Settings(Option<String>),
    SaveConfig,
    Log,
    Help,
    Quit,
}

impl Command {
    /// Parse one input line. `Ok(None)` for a blank line.
    pub fn parse(line: &str) -> std::result::Result<Option<Self>, String> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };
        let rest: Vec<&str> = words.collect();

        let collection = |index: usize| -> std::result::Result<Collection, String> {
            let alias = rest.get(index).ok_or("missing entity (owner, client or tunnel)")?;
            Collection::from_alias(alias).ok_or_else(|| format!("unknown entity: {alias}"))
        };
        let argument = |index: usize, what: &str| -> std::result::Result<String, String> {
            rest.get(index)
                .map(|s| s.to_string())
                .ok_or_else(|| format!("missing {what}"))
        };

        let command = match verb {
            "list" | "ls" => Command::List(collection(0)?),
            "refresh" => Command::Refresh(collection(0)?),
            "search" => Command::Search(collection(0)?, rest.get(1..).unwrap_or_default().join(" ")),
            "page" => {
                let page = argument(1, "page number")?;
                let page = page.parse().map_err(|_| format!("not a page number: {page}"))?;
                Command::Page(collection(0)?, page)
            }
            "sort" => Command::Sort {
                collection: collection(0)?,
                field: argument(1, "sort field")?,
                descending: match rest.get(2).copied() {
                    None | Some("desc") => true,
                    Some("asc") => false,
                    Some(other) => return Err(format!("direction must be asc or desc, got {other}")),
                },
            },
            "owner" => {
                let id = argument(0, "owner id or `all`")?;
                Command::Owner(if id == "all" {
                    OwnerFilter::All
                } else {
                    OwnerFilter::Owner(id)
                })
            }
            "new-owner" => Command::NewOwner(rest.join(" ")),
            "new-client" => Command::NewClient(rest.join(" ")),
            "new-tunnel" => Command::NewTunnel(parse_tunnel(&rest)?),
            "toggle" => Command::Toggle(argument(0, "tunnel id")?),
            "status" => Command::Status(argument(0, "tunnel id")?),
            "details" => Command::Details(argument(0, "tunnel id")?),
            "delete" | "rm" => Command::Delete(collection(0)?, argument(1, "record id")?),
            "settings" => Command::Settings(match rest.first() {
                None => None,
                Some(pair) => Some(
                    pair.strip_prefix("name=")
                        .ok_or("usage: settings [name=<value>]")?
                        .to_string(),
                ),
            }),
            "save-config" => Command::SaveConfig,
            "log" => Command::Log,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(format!("unknown command: {other} (try `help`)")),
        };
        Ok(Some(command))
    }
}

/// Build a tunnel draft from `key=value` pairs
fn parse_tunnel(pairs: &[&str]) -> std::result::Result<SshTunnel, String> {
    let mut tunnel = SshTunnel::draft();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| format!("expected key=value, got {pair}"))?;
        let port = |v: &str| v.parse::<u16>().ok().filter(|p| *p > 0).ok_or(format!("invalid port: {v}"));
        let flag = |v: &str| match v {
            "true" | "yes" | "1" => Ok(true),
            "false" | "no" | "0" => Ok(false),
            _ => Err(format!("invalid flag for {key}: {v}")),
        };
        match key {
            "name" => tunnel.name = value.to_string(),
            "user" => tunnel.remote_server_user = value.to_string(),
            "url" | "host" => tunnel.remote_server_url = value.to_string(),
            "local" => tunnel.local_port = Some(port(value)?),
            "remote" => tunnel.remote_port = Some(port(value)?),
            "auto_reconnect" => tunnel.auto_reconnect = flag(value)?,
            "startup" => tunnel.startup_enabled = flag(value)?,
            other => return Err(format!("unknown tunnel field: {other}")),
        }
    }
    Ok(tunnel)
}

/// `y/N` prompt on the console's input
pub struct StdinConfirm {
    input: SharedInput,
}

#[async_trait]
impl Confirm for StdinConfirm {
    async fn confirm(&self, prompt: &str) -> bool {
        let mut stdout = tokio::io::stdout();
        let _ = stdout.write_all(format!("{prompt} [y/N] ").as_bytes()).await;
        let _ = stdout.flush().await;
        match self.input.lock().await.next_line().await {
            Ok(Some(answer)) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            _ => false,
        }
    }
}

/// The interactive loop
pub struct Console {
    panel: Arc<Panel>,
    input: SharedInput,
    confirm: StdinConfirm,
    notifications: Receiver<Notification>,
    log: NotificationLog,
}

impl Console {
    pub fn new(panel: Arc<Panel>, notifications: Receiver<Notification>) -> Self {
        let input = Arc::new(Mutex::new(BufReader::new(tokio::io::stdin()).lines()));
        Self {
            panel,
            confirm: StdinConfirm {
                input: input.clone(),
            },
            input,
            notifications,
            log: NotificationLog::default(),
        }
    }

    /// Run until `quit` or end of input
    pub async fn run(&mut self) -> Result<()> {
        println!("Cloud Connect panel. Type `help` for commands.");
        let mut ticker = tokio::time::interval(Duration::from_millis(500));
        loop {
            let line = {
                let input = self.input.clone();
                let mut input = input.lock().await;
                tokio::select! {
                    line = input.next_line() => line?,
                    _ = ticker.tick() => {
                        drop(input);
                        self.print_notifications();
                        continue;
                    }
                }
            };
            let Some(line) = line else {
                debug!("Console input closed");
                return Ok(());
            };

            match Command::parse(&line) {
                Ok(None) => {}
                Ok(Some(Command::Quit)) => return Ok(()),
                Ok(Some(command)) => self.execute(command).await,
                Err(message) => println!("{message}"),
            }
            self.print_notifications();
        }
    }

    fn print_notifications(&mut self) {
        for notification in self.log.drain(&self.notifications) {
            println!("{notification}");
        }
    }

    async fn execute(&mut self, command: Command) {
        let panel = self.panel.clone();
        match command {
            Command::List(collection) => self.print_table(collection),
            Command::Refresh(collection) => {
                let _ = match collection {
                    Collection::OwnerData => panel.owner_data.table.fetch().await,
                    Collection::ClientData => panel.client_data.table.fetch().await,
                    Collection::SshTunnels => panel.tunnels.sync.refresh().await,
                };
                self.print_table(collection);
            }
            Command::Search(collection, term) => {
                let changed = match collection {
                    Collection::OwnerData => panel.owner_data.table.set_search(term),
                    Collection::ClientData => panel.client_data.table.set_search(term),
                    Collection::SshTunnels => panel.tunnels.table().set_search(term),
                };
                report_cursor_change(changed);
            }
            Command::Page(collection, page) => {
                let changed = match collection {
                    Collection::OwnerData => panel.owner_data.table.set_page(page),
                    Collection::ClientData => panel.client_data.table.set_page(page),
                    Collection::SshTunnels => panel.tunnels.table().set_page(page),
                };
                report_cursor_change(changed);
            }
            Command::Sort {
                collection,
                field,
                descending,
            } => {
                let changed = match collection {
                    Collection::OwnerData => panel.owner_data.table.set_sort(field, descending),
                    Collection::ClientData => panel.client_data.table.set_sort(field, descending),
                    Collection::SshTunnels => panel.tunnels.table().set_sort(field, descending),
                };
                report_cursor_change(changed);
            }
            Command::Owner(filter) => report_cursor_change(panel.client_data.select_owner(filter)),
            Command::NewOwner(name) => {
                let dialog = &panel.owner_data.dialog;
                dialog.open_for_create();
                dialog.edit(|d| d.name = (!name.is_empty()).then_some(name));
                if let Ok(saved) = dialog.save().await {
                    println!("Created owner data {}", saved.display_name());
                }
            }
            Command::NewClient(name) => {
                panel.client_data.open_for_create();
                let dialog = &panel.client_data.dialog;
                dialog.edit(|d| d.name = (!name.is_empty()).then_some(name));
                if let Ok(saved) = dialog.save().await {
                    println!("Created client data {}", saved.id.unwrap_or_default());
                }
            }
            Command::NewTunnel(draft) => {
                let dialog = &panel.tunnels.dialog;
                dialog.open_for_create_with(|d| *d = draft);
                if let Ok(saved) = dialog.save().await {
                    panel.tunnels.details.open(&saved);
                    if let Some(hint) = panel.tunnels.details.setup_hint() {
                        println!("{hint}");
                    }
                }
            }
            Command::Toggle(id) => match panel.tunnels.table().find(&id) {
                Some(tunnel) => {
                    let _ = panel.tunnels.sync.toggle(&tunnel).await;
                }
                None => println!("No tunnel {id} on the current page"),
            },
            Command::Status(id) => {
                if let Ok(report) = panel.tunnels.sync.status(&id).await {
                    let process = report
                        .process_id
                        .map(|pid| format!(" (pid {pid})"))
                        .unwrap_or_default();
                    let state = if report.is_active { "active" } else { "inactive" };
                    println!("{}: {state}{process}", report.tunnel_id);
                }
            }
            Command::Details(id) => match panel.tunnels.table().find(&id) {
                Some(tunnel) => {
                    panel.tunnels.details.open(&tunnel);
                    print_details(&tunnel);
                    if let Some(hint) = panel.tunnels.details.setup_hint() {
                        println!("{hint}");
                    }
                }
                None => println!("No tunnel {id} on the current page"),
            },
            Command::Delete(collection, id) => {
                let outcome = match collection {
                    Collection::OwnerData => panel.owner_data.table.delete(&id, &self.confirm).await,
                    Collection::ClientData => panel.client_data.table.delete(&id, &self.confirm).await,
                    Collection::SshTunnels => panel.tunnels.sync.delete(&id, &self.confirm).await,
                };
                if let Ok(DeleteOutcome::Declined) = outcome {
                    println!("Cancelled");
                }
            }
            Command::Settings(name) => {
                if panel.settings.open().await.is_err() {
                    return;
                }
                if let Some(name) = name {
                    panel.settings.edit(|s| s.name = Some(name));
                    if panel.settings.save().await.is_err() {
                        return;
                    }
                }
                let settings = panel.settings.draft();
                match serde_json::to_string_pretty(&settings) {
                    Ok(text) => println!("{text}"),
                    Err(e) => println!("{e}"),
                }
                panel.settings.close();
            }
            Command::SaveConfig => match panel.config().save() {
                Ok(path) => println!("Config written to {}", path.display()),
                Err(e) => println!("Could not write config: {e}"),
            },
            Command::Log => {
                for notification in self.log.recent(20).into_iter().rev() {
                    println!("{notification}");
                }
            }
            Command::Help => println!("{HELP}"),
            Command::Quit => {}
        }
    }

    fn print_table(&self, collection: Collection) {
        let panel = &self.panel;
        match collection {
            Collection::OwnerData => print_view(&panel.owner_data.table.view(), |r| {
                format!("{:<36}  {}", r.id.as_deref().unwrap_or("-"), r.display_name())
            }),
            Collection::ClientData => print_view(&panel.client_data.table.view(), |r| {
                format!(
                    "{:<36}  {:<36}  {}",
                    r.id.as_deref().unwrap_or("-"),
                    r.owner_data_id.as_deref().unwrap_or("-"),
                    r.name.as_deref().unwrap_or("")
                )
            }),
            Collection::SshTunnels => print_view(&panel.tunnels.table().view(), |t| {
                format!(
                    "{:<36}  {:<16}  {:<12}  {}",
                    t.id.as_deref().unwrap_or("-"),
                    t.name,
                    t.status().label(),
                    t.forwarding()
                )
            }),
        }
    }
}

fn report_cursor_change(changed: bool) {
    if changed {
        println!("Updated, reloading in the background (use `list` to show)");
    } else {
        println!("Unchanged");
    }
}

fn print_view<R: Record>(view: &TableView<R>, row: impl Fn(&R) -> String) {
    println!("{}", R::COLLECTION.label());
    for record in &view.rows {
        println!("  {}", row(record));
    }
    if view.rows.is_empty() {
        println!("  (no rows)");
    }
    let mut footer = format!(
        "  page {}/{}, {} total, sorted by {} {}",
        view.pagination.page,
        view.total_pages(),
        view.total,
        view.pagination.sort_by,
        if view.pagination.descending { "desc" } else { "asc" }
    );
    if !view.search.is_empty() {
        footer.push_str(&format!(", search \"{}\"", view.search));
    }
    if view.loading {
        footer.push_str(", loading");
    }
    println!("{footer}");
}

fn print_details(tunnel: &SshTunnel) {
    println!("{}", tunnel.name);
    println!("  server:         {}", tunnel.endpoint());
    println!("  forwarding:     {}", tunnel.forwarding());
    println!("  status:         {}", tunnel.status().label());
    println!("  auto reconnect: {}", tunnel.auto_reconnect);
    println!("  on startup:     {}", tunnel.startup_enabled);
    if let Some(at) = tunnel.last_connected_at {
        println!("  last connected: {at}");
    }
}
