// src/engine/runtime.rs

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::errors::Result;

use super::RuntimeEvent;
use super::session::Session;

/// Main event loop: feed events into the session until it asks to stop or
/// every sender is gone.
pub async fn run_session(mut session: Session, mut event_rx: mpsc::Receiver<RuntimeEvent>) -> Result<()> {
    info!("devloop session started");

    loop {
        let event = match event_rx.recv().await {
            Some(e) => e,
            None => {
                info!("event channel closed; stopping");
                session.shutdown().await?;
                break;
            }
        };

        debug!(?event, "session received event");

        if !session.handle_event(event).await? {
            break;
        }
    }

    info!("devloop session finished");
    Ok(())
}

/// Spawn the Ctrl-C listener, the poll ticker and the stdin rebuild trigger.
pub fn spawn_event_sources(tx: mpsc::Sender<RuntimeEvent>, poll_interval: Duration) -> Vec<JoinHandle<()>> {
    vec![
        spawn_ctrl_c(tx.clone()),
        spawn_ticker(tx.clone(), poll_interval),
        spawn_stdin_trigger(tx),
    ]
}

fn spawn_ctrl_c(tx: mpsc::Sender<RuntimeEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("failed to listen for Ctrl+C: {e}");
            return;
        }
        let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
    })
}

fn spawn_ticker(tx: mpsc::Sender<RuntimeEvent>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately; the initial build already ran.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if tx.send(RuntimeEvent::Poll).await.is_err() {
                break;
            }
        }
    })
}

/// Typing `r` or `rs` followed by Enter requests a rebuild.
fn spawn_stdin_trigger(tx: mpsc::Sender<RuntimeEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        while let Ok(Some(line)) = lines.next_line().await {
            if is_rebuild_command(&line) {
                if tx.send(RuntimeEvent::RebuildRequested).await.is_err() {
                    break;
                }
            }
        }

        debug!("stdin closed; manual rebuild trigger disabled");
    })
}

fn is_rebuild_command(line: &str) -> bool {
    matches!(line.trim(), "r" | "rs")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rebuild_command_accepts_short_forms() {
        assert!(is_rebuild_command("r"));
        assert!(is_rebuild_command(" rs \n"));
        assert!(!is_rebuild_command("rebuild please"));
        assert!(!is_rebuild_command(""));
    }
}
