use clap::{Parser, Subcommand};
use wakapp_core::Config;

mod commands;
mod logging;

#[derive(Parser)]
#[command(name = "wakapp-cli", version, about = "Wakapp CLI")]
struct Cli {
    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in, register, log out
    Auth {
        #[command(subcommand)]
        action: commands::auth::AuthAction,
    },
    /// Friend list and friend requests
    Friends {
        #[command(subcommand)]
        action: commands::friends::FriendsAction,
    },
    /// Alarms for yourself and your friends
    Alarm {
        #[command(subcommand)]
        action: commands::alarm::AlarmAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Print shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let (config, load_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };
    logging::init(&config.logging, cli.json_logs);
    if let Some(e) = load_error {
        tracing::warn!(error = %e, "using default configuration");
    }

    let result = match cli.command {
        Commands::Auth { action } => commands::auth::run(action, &config).await,
        Commands::Friends { action } => commands::friends::run(action, &config).await,
        Commands::Alarm { action } => commands::alarm::run(action, &config).await,
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
