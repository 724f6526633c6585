//! Live roster view.
//!
//! Re-renders whenever the engine publishes a settled snapshot. Pressing
//! Enter dismisses the error banner and is treated as regaining focus.

use clap::Args;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

use roastcheck::sync::SyncState;

use super::{print_snapshot, CommandResult, Engine, OutputFormat};

#[derive(Args)]
pub struct WatchCommand {
    /// Seconds between background reloads (overrides config)
    #[arg(long, short)]
    interval: Option<u64>,
}

impl WatchCommand {
    pub async fn run(&self, engine: Arc<Engine>, default_interval: Duration) -> CommandResult {
        let interval = self
            .interval
            .map(|secs| Duration::from_secs(secs.max(1)))
            .unwrap_or(default_interval);

        let mut updates = engine.subscribe();
        let handle = engine.spawn_revalidation(interval);
        tracing::debug!(?interval, "Watching roster");

        render(&updates.borrow_and_update().clone())?;

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                changed = updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let state = updates.borrow_and_update().clone();
                    if !state.loading {
                        render(&state)?;
                    }
                }
                line = lines.next_line() => {
                    match line? {
                        Some(_) => {
                            engine.clear_error();
                            handle.focus();
                        }
                        None => break,
                    }
                }
                _ = &mut ctrl_c => break,
            }
        }

        drop(handle);
        Ok(())
    }
}

fn render(state: &SyncState) -> CommandResult {
    println!();
    print_snapshot(&state.snapshot, &OutputFormat::Text)?;
    if let Some(error) = &state.last_error {
        println!("\n! {}", error);
    }
    println!("\n(Enter to refresh, Ctrl-C to quit)");
    Ok(())
}
