use clap::{Args, Subcommand};

use super::{confirm, print_snapshot, CommandResult, Engine, OutputFormat};

#[derive(Args)]
pub struct GroupCommand {
    #[command(subcommand)]
    pub command: GroupSubcommand,
}

#[derive(Subcommand)]
pub enum GroupSubcommand {
    /// List all groups with their members
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Create a new group
    Add {
        /// Group name (defaults to "Untitled Group")
        name: Option<String>,
    },

    /// Rename a group
    Rename {
        /// Group ID
        id: i64,

        /// New name; a blank name leaves the group unchanged
        name: String,
    },

    /// Delete a group and all of its members
    Delete {
        /// Group ID
        id: i64,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

impl GroupCommand {
    pub async fn run(&self, engine: &Engine) -> CommandResult {
        match &self.command {
            GroupSubcommand::List { format } => print_snapshot(&engine.snapshot(), format),
            GroupSubcommand::Add { name } => {
                let group = engine.add_group(name.as_deref()).await?;
                println!("Created group: {} (#{})", group.name, group.id);
                Ok(())
            }
            GroupSubcommand::Rename { id, name } => {
                let group = engine.rename_group(*id, name).await?;
                println!("Group #{} is now '{}'", group.id, group.name);
                Ok(())
            }
            GroupSubcommand::Delete { id, force } => {
                let snapshot = engine.snapshot();
                let group = snapshot
                    .group(*id)
                    .ok_or_else(|| format!("Group not found: {}", id))?;

                if !force {
                    let prompt = format!(
                        "Delete group '{}' and its {} member(s)?",
                        group.name,
                        group.members.len()
                    );
                    if !confirm(&prompt)? {
                        println!("Deletion cancelled.");
                        return Ok(());
                    }
                }

                engine.delete_group(*id).await?;
                println!("Deleted group: {}", group.name);
                Ok(())
            }
        }
    }
}
