use clap::Subcommand;
use wakapp_core::{Auth, Config, LoginInput, Registration, RegistrationOutcome};

use super::{api, open_session, CommandResult};

#[derive(Subcommand)]
pub enum AuthAction {
    /// Log in by email (defaults to the last email used) or username
    Login {
        /// Account email
        #[arg(long, conflicts_with = "username")]
        email: Option<String>,
        /// Account username
        #[arg(long)]
        username: Option<String>,
        /// Accepted for compatibility; not checked
        #[arg(long, requires = "username", default_value = "")]
        password: String,
    },
    /// Create an account
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
    },
    /// Forget the stored session
    Logout,
    /// Show who is logged in
    Status,
}

pub async fn run(action: AuthAction, config: &Config) -> CommandResult {
    let mut session = open_session()?;

    match action {
        AuthAction::Login {
            email,
            username,
            password,
        } => {
            let client = api(config)?;
            let auth = Auth::new(&client);
            let identity = match username {
                Some(username) => {
                    auth.login(&mut session, LoginInput::Credentials { username, password })
                        .await?
                }
                None => {
                    let email = email
                        .or_else(|| session.remembered_email())
                        .ok_or("no email given and none remembered; pass --email")?;
                    auth.login_with_email(&mut session, &email).await?
                }
            };
            println!("Logged in as {} ({})", identity.username, identity.id);
        }
        AuthAction::Register {
            username,
            email,
            phone,
        } => {
            let registration = Registration::new(&username, &email, &phone)?;
            let client = api(config)?;
            match Auth::new(&client).register(&mut session, registration).await? {
                RegistrationOutcome::SignedIn(identity) => {
                    println!("Registered and logged in as {} ({})", identity.username, identity.id);
                }
                RegistrationOutcome::Registered => {
                    println!("Registered. Log in with: wakapp-cli auth login --email {}", email.trim());
                }
            }
        }
        AuthAction::Logout => {
            let client = api(config)?;
            Auth::new(&client).logout(&mut session)?;
            println!("Logged out");
        }
        AuthAction::Status => {
            match session.current() {
                Some(identity) => {
                    println!("Logged in as {} ({})", identity.username, identity.id);
                    if !identity.email.is_empty() {
                        println!("  email: {}", identity.email);
                    }
                }
                None => println!("Not logged in"),
            }
            if let Some(email) = session.remembered_email() {
                println!("Remembered email: {email}");
            }
        }
    }
    Ok(())
}
