use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "tasklane")]
#[command(about = "Tasklane CLI - Multi-tenant task API from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Sign in and store the session
    Login {
        email: String,
        password: String,
        /// Forget the session when the process exits
        #[arg(long)]
        session_only: bool,
    },

    /// Send an authenticated GET and print the response
    Get {
        #[arg(value_name = "PATH")]
        path: String,
    },

    /// Select the tenant sent with every request
    Tenant {
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Show the stored session
    Whoami,

    /// Clear the stored session
    Logout,
}
