use clap::{Args, Subcommand};

use roastcheck::models::{Member, MemberUpdate};

use super::{confirm, CommandResult, Engine};

#[derive(Args)]
pub struct MemberCommand {
    #[command(subcommand)]
    pub command: MemberSubcommand,
}

#[derive(Subcommand)]
pub enum MemberSubcommand {
    /// Add a member to a group
    Add {
        /// Group ID
        group_id: i64,

        /// Member name (defaults to "New Member")
        name: Option<String>,
    },

    /// Mark a member as checked in
    Checkin {
        /// Member ID
        id: i64,
    },

    /// Clear a member's check-in
    Checkout {
        /// Member ID
        id: i64,
    },

    /// Rename a member
    Rename {
        /// Member ID
        id: i64,

        /// New name
        name: String,
    },

    /// Remove a member from its group
    Remove {
        /// Member ID
        id: i64,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

impl MemberCommand {
    pub async fn run(&self, engine: &Engine) -> CommandResult {
        match &self.command {
            MemberSubcommand::Add { group_id, name } => {
                let member = engine.add_member(*group_id, name.as_deref()).await?;
                println!(
                    "Added {} (#{}) to group #{}",
                    member.name, member.id, member.group_id
                );
                Ok(())
            }
            MemberSubcommand::Checkin { id } => {
                let member = edit(engine, *id, MemberUpdate::checked_in(true)).await?;
                println!("{}", member);
                Ok(())
            }
            MemberSubcommand::Checkout { id } => {
                let member = edit(engine, *id, MemberUpdate::checked_in(false)).await?;
                println!("{}", member);
                Ok(())
            }
            MemberSubcommand::Rename { id, name } => {
                let member = edit(engine, *id, MemberUpdate::name(name.as_str())).await?;
                println!("{}", member);
                Ok(())
            }
            MemberSubcommand::Remove { id, force } => {
                let member = find_member(engine, *id)?;

                if !force && !confirm(&format!("Remove member '{}'?", member.name))? {
                    println!("Removal cancelled.");
                    return Ok(());
                }

                engine.remove_member(member.id, member.group_id).await?;
                println!("Removed member: {}", member.name);
                Ok(())
            }
        }
    }
}

async fn edit(
    engine: &Engine,
    id: i64,
    update: MemberUpdate,
) -> Result<Member, Box<dyn std::error::Error>> {
    let member = find_member(engine, id)?;
    Ok(engine.edit_member(member.id, member.group_id, update).await?)
}

/// The cache is the only place that knows which group a member lives in.
fn find_member(engine: &Engine, id: i64) -> Result<Member, Box<dyn std::error::Error>> {
    engine
        .snapshot()
        .member(id)
        .cloned()
        .ok_or_else(|| format!("Member not found: {}", id).into())
}
