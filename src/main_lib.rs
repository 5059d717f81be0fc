// Library module containing the testable flows behind the CLI subcommands.

use crate::backend::DriveBackend;
use crate::command::Command;
use crate::error::{DriveShellError, Result};
use crate::executor::Executor;
use crate::session::DriveSession;
use crate::snapshot::SessionSnapshot;
use crate::tasks;

/// The `execute` subcommand: load a snapshot, apply one command offline,
/// emit the resulting snapshot.
pub fn execute_command(
    snapshot_path: &str,
    command_str: &str,
    output_path: Option<&str>,
) -> Result<()> {
    let snapshot = SessionSnapshot::load_from_file(snapshot_path)?;
    let command = Command::from_string(command_str).map_err(DriveShellError::Generic)?;

    let result = Executor::execute(&snapshot, command);
    let result_json = serde_json::to_string_pretty(&result.snapshot)?;

    match output_path {
        Some(path) => {
            std::fs::write(path, &result_json)?;
            println!("Result saved to: {}", path);
        }
        None => {
            println!("{}", result_json);
        }
    }

    eprintln!("Status: {}", result.status_message);
    if result.should_quit {
        eprintln!("Command resulted in quit");
    }

    Ok(())
}

/// The `save-state` subcommand: build a fresh session, load the root
/// listing, and write the snapshot.
pub async fn save_current_state(
    output_path: Option<&str>,
    backend: &dyn DriveBackend,
) -> Result<()> {
    let mut session = DriveSession::new();

    let task = session.refresh();
    let result = tasks::run_task(backend, task).await;
    // A fresh session is at root; a root listing produces no follow-ups.
    let _ = session.apply_result(result);

    let snapshot = SessionSnapshot::from_session(&session);
    let config_json = serde_json::to_string_pretty(&snapshot)?;

    match output_path {
        Some(path) => {
            std::fs::write(path, &config_json)?;
            println!("Current state saved to: {}", path);
        }
        None => {
            println!("{}", config_json);
        }
    }

    Ok(())
}
