//! Watch command handler
//!
//! Runs the background sync task and renders every change to the queue.
//! Line commands on stdin drive moderation while it runs.

use anyhow::{bail, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

use penssum_core::{spawn_sync_task, PushNotification, SyncCommand, SyncSnapshot, View};

use super::App;
use crate::output::Output;

const HELP: &str =
    "Commands: r = refresh, a <id> = approve, x <id> = reject, n [text] = notify, q = quit";

/// A parsed stdin line
#[derive(Debug, PartialEq)]
enum Input {
    Command(SyncCommand),
    /// Deliver a notification locally, as if pushed by the service
    Notify(PushNotification),
    Help,
    Quit,
}

fn parse_line(line: &str) -> Result<Option<Input>> {
    let mut parts = line.split_whitespace();
    let Some(verb) = parts.next() else {
        return Ok(None);
    };
    let arg = parts.next();

    if verb == "n" {
        let text = line.trim_start().trim_start_matches('n').trim();
        return Ok(Some(Input::Notify(PushNotification {
            title: Some("Nueva publicación".to_string()),
            body: (!text.is_empty()).then(|| text.to_string()),
            ..Default::default()
        })));
    }

    let input = match (verb, arg) {
        ("r", None) => Input::Command(SyncCommand::Refresh),
        ("a", Some(id)) => Input::Command(SyncCommand::Approve(id.to_string())),
        ("x", Some(id)) => Input::Command(SyncCommand::Reject(id.to_string())),
        ("a" | "x", None) => bail!("'{}' needs a product id", verb),
        ("q", None) => Input::Quit,
        ("h" | "?", None) => Input::Help,
        _ => bail!("Unrecognised command '{}'", line.trim()),
    };
    Ok(Some(input))
}

/// What the user sees; `refreshing` alone does not warrant a redraw
fn rendered(snapshot: &SyncSnapshot) -> (View, Option<Vec<String>>) {
    let ids = snapshot
        .products
        .as_ref()
        .map(|products| products.iter().map(|p| p.id.clone()).collect());
    (snapshot.view(), ids)
}

pub async fn run(app: &App, output: &Output) -> Result<()> {
    let mut handle = spawn_sync_task(app.controller.clone(), app.hub.subscribe());
    let mut received = app.hub.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut last = None;

    output.message(HELP);

    loop {
        tokio::select! {
            changed = handle.snapshot_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = handle.snapshot_rx.borrow_and_update().clone();
                let current = rendered(&snapshot);
                if last.as_ref() != Some(&current) {
                    output.print_snapshot(&snapshot, &app.config.web_url);
                    last = Some(current);
                }
            }

            Some(event) = handle.event_rx.recv() => {
                output.print_event(&event);
            }

            Some(notification) = received.recv() => {
                let pending = handle
                    .snapshot_rx
                    .borrow()
                    .products
                    .as_ref()
                    .map(Vec::len);
                output.print_notification(&notification, app.hub.presentation(), pending);
            }

            line = lines.next_line(), if stdin_open => {
                let Some(line) = line? else {
                    stdin_open = false;
                    continue;
                };
                match parse_line(&line) {
                    Ok(Some(Input::Command(cmd))) => {
                        if handle.command_tx.send(cmd).await.is_err() {
                            break;
                        }
                    }
                    Ok(Some(Input::Notify(notification))) => {
                        app.hub.publish(notification);
                    }
                    Ok(Some(Input::Help)) => output.message(HELP),
                    Ok(Some(Input::Quit)) => break,
                    Ok(None) => {}
                    Err(e) => output.warning(&e.to_string()),
                }
            }

            _ = tokio::signal::ctrl_c() => break,
        }
    }

    handle.shutdown().await;
    Ok(())
}
