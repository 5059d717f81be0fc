//! Headless script runner for the `test` subcommand.
//!
//! Script format is a plain text file, one step per line:
//! - any command in the `Command` string grammar (`open:A:Docs`, `root`,
//!   `query:report`, `refresh`, ...)
//! - `wait` / `settle`: wait until all in-flight background tasks settle
//! - `wait:<ms>`: sleep, then drain whatever results have arrived
//! - `assert:<property>:<value>`: check session state
//! - `# comment`: ignored
//!
//! Example:
//! ```text
//! # open a folder and check the breadcrumb
//! open:A:Docs
//! settle
//! assert:current_folder:A
//! assert:path:Docs
//! ```

use std::path::Path;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

use crate::command::Command;
use crate::error::{DriveShellError, Result};
use crate::executor::apply_to_session;
use crate::session::DriveSession;
use crate::tasks::{Task, TaskResult};

#[derive(Debug, Clone, PartialEq)]
pub enum ScriptStep {
    Command(Command),
    /// `None` waits for full settle; `Some` sleeps for the given duration.
    Wait(Option<Duration>),
    Assert { property: String, expected: String },
}

#[derive(Debug, Clone)]
pub struct ScriptRunner {
    pub steps: Vec<ScriptStep>,
    pub max_settle_time: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct ScriptReport {
    pub commands_run: usize,
    pub assertions_run: usize,
    pub failures: Vec<String>,
}

impl ScriptReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn print_summary(&self) {
        println!(
            "script: {} commands, {} assertions, {} failures",
            self.commands_run,
            self.assertions_run,
            self.failures.len()
        );
        for failure in &self.failures {
            println!("  FAIL: {}", failure);
        }
    }
}

impl ScriptRunner {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_string(&content)
    }

    pub fn from_string(content: &str) -> Result<Self> {
        let mut steps = Vec::new();
        for (line_number, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if line == "wait" || line == "settle" {
                steps.push(ScriptStep::Wait(None));
                continue;
            }
            if let Some(ms) = line.strip_prefix("wait:") {
                let ms: u64 = ms.parse().map_err(|_| {
                    DriveShellError::Generic(format!(
                        "line {}: invalid wait duration: {}",
                        line_number + 1,
                        line
                    ))
                })?;
                steps.push(ScriptStep::Wait(Some(Duration::from_millis(ms))));
                continue;
            }
            if let Some(rest) = line.strip_prefix("assert:") {
                let (property, expected) = rest.split_once(':').ok_or_else(|| {
                    DriveShellError::Generic(format!(
                        "line {}: assert needs property and value: {}",
                        line_number + 1,
                        line
                    ))
                })?;
                steps.push(ScriptStep::Assert {
                    property: property.to_string(),
                    expected: expected.to_string(),
                });
                continue;
            }

            let command = Command::from_string(line).map_err(|e| {
                DriveShellError::Generic(format!("line {}: {}", line_number + 1, e))
            })?;
            steps.push(ScriptStep::Command(command));
        }

        Ok(Self {
            steps,
            max_settle_time: Duration::from_secs(5),
        })
    }

    pub async fn run(
        &self,
        session: &mut DriveSession,
        task_sender: &mpsc::Sender<Task>,
        result_receiver: &mut mpsc::Receiver<TaskResult>,
    ) -> Result<ScriptReport> {
        let mut report = ScriptReport::default();
        let mut in_flight: usize = 0;

        for step in &self.steps {
            match step {
                ScriptStep::Command(command) => {
                    log::info!("🧪 script: {}", command.as_string());
                    let tasks = apply_to_session(session, command.clone());
                    for task in tasks {
                        dispatch(task_sender, task, &mut in_flight).await?;
                    }
                    report.commands_run += 1;
                }

                ScriptStep::Wait(Some(duration)) => {
                    tokio::time::sleep(*duration).await;
                    // Drain whatever has arrived without blocking further.
                    while let Ok(result) = result_receiver.try_recv() {
                        in_flight = in_flight.saturating_sub(1);
                        for task in session.apply_result(result) {
                            dispatch(task_sender, task, &mut in_flight).await?;
                        }
                    }
                }

                ScriptStep::Wait(None) => {
                    while in_flight > 0 {
                        match timeout(self.max_settle_time, result_receiver.recv()).await {
                            Ok(Some(result)) => {
                                in_flight -= 1;
                                for task in session.apply_result(result) {
                                    dispatch(task_sender, task, &mut in_flight).await?;
                                }
                            }
                            Ok(None) => {
                                return Err(DriveShellError::Generic(
                                    "worker result channel closed during settle".to_string(),
                                ));
                            }
                            Err(_) => {
                                report.failures.push(format!(
                                    "settle timed out with {} tasks in flight",
                                    in_flight
                                ));
                                break;
                            }
                        }
                    }
                }

                ScriptStep::Assert { property, expected } => {
                    report.assertions_run += 1;
                    let actual = evaluate_property(session, property)?;
                    if &actual != expected {
                        report.failures.push(format!(
                            "assert:{}: expected {:?}, got {:?}",
                            property, expected, actual
                        ));
                    }
                }
            }

            if session.should_quit {
                break;
            }
        }

        Ok(report)
    }
}

async fn dispatch(
    task_sender: &mpsc::Sender<Task>,
    task: Task,
    in_flight: &mut usize,
) -> Result<()> {
    task_sender
        .send(task)
        .await
        .map_err(|e| DriveShellError::Generic(format!("failed to send task: {}", e)))?;
    *in_flight += 1;
    Ok(())
}

/// Session properties addressable from `assert:` lines.
fn evaluate_property(session: &DriveSession, property: &str) -> Result<String> {
    let value = match property {
        "current_folder" => session
            .current_folder_id()
            .unwrap_or_else(|| "none".to_string()),
        "current_folder_name" => session
            .navigation
            .current_folder
            .as_ref()
            .map(|f| f.name.clone())
            .unwrap_or_else(|| "My Drive".to_string()),
        "path" => session
            .navigation
            .folder_path
            .iter()
            .map(|f| f.name.as_str())
            .collect::<Vec<_>>()
            .join("/"),
        "file_count" => session.listing.files.len().to_string(),
        "folder_count" => session.listing.folders.len().to_string(),
        "visible_file_count" => session.visible().files.len().to_string(),
        "visible_folder_count" => session.visible().folders.len().to_string(),
        "search_active" => session.search.active.to_string(),
        "query" => session.search.query.clone(),
        "loading" => session.listing.loading.to_string(),
        "error" => session
            .listing
            .last_error
            .map(|kind| kind.label().to_string())
            .unwrap_or_else(|| "none".to_string()),
        "status" => session.status_message.clone(),
        _ => {
            return Err(DriveShellError::Generic(format!(
                "unknown assert property: {}",
                property
            )))
        }
    };
    Ok(value)
}
