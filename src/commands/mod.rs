mod config_cmd;
mod group;
mod member;
mod watch;

pub use config_cmd::{ConfigCommand, OutputFormat};
pub use group::GroupCommand;
pub use member::MemberCommand;
pub use watch::WatchCommand;

use roastcheck::sync::{HttpClient, Snapshot, SyncEngine};
use std::io::{self, Write};

pub type Engine = SyncEngine<HttpClient>;

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Print every group with its members.
pub fn print_snapshot(snapshot: &Snapshot, format: &OutputFormat) -> CommandResult {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(snapshot.groups())?);
        }
        OutputFormat::Text => {
            if snapshot.is_empty() {
                println!("No groups yet.");
                return Ok(());
            }
            for (i, group) in snapshot.groups().iter().enumerate() {
                if i > 0 {
                    println!();
                }
                print!("{}", group);
            }
        }
    }
    Ok(())
}

/// Ask a yes/no question on stdin. Anything but `y` means no.
fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}
