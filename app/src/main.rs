//! Tasklane command-line client

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;
use tokio::sync::broadcast;

use cli::{Cli, Commands};
use tasklane_core::{Config, LogoutEvent, Workspace};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tasklane_core::init_logging();

    let config = Config::from_env().context("loading configuration")?;
    let workspace = Workspace::new(config).context("opening workspace")?;

    let mut logout_events = workspace.client().subscribe_logout();
    let outcome = run(cli.command, &workspace).await;
    report_logout_events(&mut logout_events);

    outcome
}

async fn run(command: Commands, workspace: &Workspace) -> Result<()> {
    match command {
        Commands::Login {
            email,
            password,
            session_only,
        } => {
            let session = workspace
                .login(&email, &password, !session_only)
                .await
                .context("login failed")?;
            println!(
                "Signed in{}",
                session
                    .tenant_id
                    .map(|t| format!(" to tenant {}", t))
                    .unwrap_or_default()
            );
        }
        Commands::Get { path } => {
            let response = workspace.client().get(&path).await?;
            match response.json::<Value>() {
                Ok(body) => println!("{}", serde_json::to_string_pretty(&body)?),
                Err(_) => println!("{}", response.text()),
            }
        }
        Commands::Tenant { id } => {
            workspace.select_tenant(&id)?;
            println!("Tenant set to {}", id);
        }
        Commands::Whoami => match workspace.session() {
            Some(session) => println!(
                "Signed in (tenant: {}, refreshable: {})",
                session.tenant_id.as_deref().unwrap_or("none"),
                session.has_refresh_token()
            ),
            None => println!("Not signed in"),
        },
        Commands::Logout => {
            workspace.logout();
            println!("Signed out");
        }
    }

    Ok(())
}

/// Log the logout events emitted while the command ran
fn report_logout_events(events: &mut broadcast::Receiver<LogoutEvent>) -> usize {
    let mut reported = 0;
    while let Ok(event) = events.try_recv() {
        tracing::warn!(event = event.name(), reason = %event.reason, "Signed out");
        reported += 1;
    }
    reported
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_logout_event_is_reported_before_exit() {
        let workspace =
            Workspace::open_in_memory(Config::new(PathBuf::from("/nonexistent"))).unwrap();
        let mut events = workspace.client().subscribe_logout();

        assert_eq!(report_logout_events(&mut events), 0);

        workspace.logout();
        assert_eq!(report_logout_events(&mut events), 1);
        assert_eq!(report_logout_events(&mut events), 0);
    }
}
