use std::path::PathBuf;

use clap::{Parser, Subcommand};
use repairdesk_client::client::DEFAULT_BASE_URL;
use repairdesk_dashboard::config::DEFAULT_STATE_DIR;

#[derive(Parser, Debug)]
#[command(author, version, about = "Service desk dashboard in the terminal", long_about = None)]
pub struct Cli {
    /// Backend base URL
    #[arg(long, env = "REPAIRDESK_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Directory holding the session and the cached dashboard
    #[arg(long, env = "REPAIRDESK_STATE_DIR", default_value = DEFAULT_STATE_DIR)]
    pub state_dir: PathBuf,

    /// HTTP request timeout in seconds
    #[arg(long, env = "REPAIRDESK_TIMEOUT_SECS", default_value_t = 10)]
    pub timeout_secs: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in and keep the session for later commands
    Login {
        #[arg(long, env = "REPAIRDESK_USERNAME")]
        username: String,

        /// Read from stdin when omitted
        #[arg(long, env = "REPAIRDESK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// End the current session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Fetch and print the dashboard once
    Dashboard {
        /// Print the raw payload as JSON instead of the cards
        #[arg(long)]
        json: bool,
    },
    /// Keep the dashboard on screen, refetching periodically
    Watch {
        #[arg(long, env = "REPAIRDESK_REFRESH_SECS", default_value_t = 60)]
        interval_secs: u64,
    },
}
