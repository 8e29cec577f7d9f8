//! Friend commands for CLI.

use clap::Subcommand;
use wakapp_core::{wake_up_candidates, Config, CoreError, FriendService, Friendship, Session};

use super::{api, confirm, open_session, CommandResult};

#[derive(Subcommand)]
pub enum FriendsAction {
    /// List friends
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Send a friend request
    Add {
        /// Friend's name
        name: String,
        /// Friend's phone number
        phone: String,
    },
    /// Send a pending invitation again
    Resend {
        /// Friendship ID
        id: String,
    },
    /// Remove a friend
    Remove {
        /// Friendship ID
        id: String,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// Friends you can set an alarm for
    Candidates,
}

fn print_friend(f: &Friendship) {
    println!(
        "{:<8} {:<20} {:<16} {}",
        f.id,
        f.display_name(),
        f.friend_phone,
        f.status.label()
    );
}

async fn find(
    service: &FriendService<'_>,
    session: &Session,
    id: &str,
) -> Result<Friendship, CoreError> {
    service
        .list(session)
        .await?
        .into_iter()
        .find(|f| f.id == id)
        .ok_or_else(|| CoreError::NotFound {
            kind: "friendship",
            id: id.to_string(),
        })
}

pub async fn run(action: FriendsAction, config: &Config) -> CommandResult {
    let session = open_session()?;
    let client = api(config)?;
    let service = FriendService::new(&client);

    match action {
        FriendsAction::List { json } => {
            let friends = service.list(&session).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&friends)?);
            } else if friends.is_empty() {
                println!("No friends yet. Add one with: wakapp-cli friends add <name> <phone>");
            } else {
                friends.iter().for_each(print_friend);
            }
        }
        FriendsAction::Add { name, phone } => {
            let friendship = service.request(&session, &name, &phone).await?;
            println!(
                "Friend request sent to {} ({})",
                friendship.display_name(),
                friendship.status.label()
            );
        }
        FriendsAction::Resend { id } => {
            let friendship = find(&service, &session, &id).await?;
            service.resend(&friendship).await?;
            println!("Invitation resent to {}", friendship.display_name());
        }
        FriendsAction::Remove { id, yes } => {
            let friendship = find(&service, &session, &id).await?;
            let confirmation = service.propose_removal(&friendship)?;
            if !confirm(&confirmation, yes)? {
                println!("Cancelled");
                return Ok(());
            }
            let removed = service.remove(confirmation).await?;
            println!("Removed {}", removed.display_name());
        }
        FriendsAction::Candidates => {
            let friends = service.list(&session).await?;
            let candidates = wake_up_candidates(&friends);
            if candidates.is_empty() {
                println!("No accepted friends yet");
            }
            for f in candidates {
                print_friend(f);
            }
        }
    }
    Ok(())
}
