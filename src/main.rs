use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use drive_shell::backend::InMemoryDrive;
use drive_shell::cli::{Cli, Commands};
use drive_shell::command::Command;
use drive_shell::config::Config;
use drive_shell::entry::format_file_size;
use drive_shell::error::{DriveShellError, Result};
use drive_shell::executor::apply_to_session;
use drive_shell::main_lib;
use drive_shell::script::ScriptRunner;
use drive_shell::session::DriveSession;
use drive_shell::snapshot::SessionSnapshot;
use drive_shell::tasks::{self, Task, TaskResult};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger only if DRIVE_SHELL_LOG environment variable is set
    if let Ok(log_file) = std::env::var("DRIVE_SHELL_LOG") {
        env_logger::Builder::new()
            .target(env_logger::Target::Pipe(Box::new(
                std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&log_file)
                    .expect("Failed to open log file"),
            )))
            .filter_level(log::LevelFilter::Debug)
            .init();

        log::info!("drive-shell starting up");
    }

    let cli = Cli::parse();
    let config = Config::load_or_default(cli.config.as_deref().unwrap_or("drive-shell.json"))?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_interactive(&config).await,
        Commands::Execute {
            snapshot,
            command,
            output,
        } => main_lib::execute_command(&snapshot, &command, output.as_deref()),
        Commands::SaveState { output } => {
            let backend = InMemoryDrive::with_sample_data();
            main_lib::save_current_state(output.as_deref(), &backend).await
        }
        Commands::Test {
            script,
            snapshot,
            settle_timeout,
            verbose,
        } => run_script_test(&config, &script, snapshot.as_deref(), settle_timeout, verbose).await,
    }
}

async fn run_interactive(config: &Config) -> Result<()> {
    let mut session = DriveSession::from_config(config);

    // The HTTP transport lives behind DriveBackend; the shell runs against
    // the bundled in-memory drive.
    let backend = Box::new(InMemoryDrive::with_sample_data());

    // Setup async task channels
    let (task_sender, task_receiver) = mpsc::channel::<Task>(32);
    let (result_sender, mut result_receiver) = mpsc::channel::<TaskResult>(32);
    let shutdown = CancellationToken::new();

    // Start background worker
    let worker_handle = tokio::spawn(tasks::run_worker(
        task_receiver,
        result_sender,
        backend,
        shutdown.clone(),
    ));

    // Load initial data
    log::info!("📤 main: requesting initial listing");
    let initial = session.refresh();
    if let Err(e) = task_sender.send(initial).await {
        session.status_message = format!("Failed to request listing: {}", e);
    }

    println!("drive-shell commands:  open:<id>:<name>  root  refresh  query:<text>  search:<text>");
    println!("              filter:type|size|date|ext:<value>  sort:<key>  order:<asc|desc>  clear  quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line? {
                    Some(line) => line,
                    None => break, // stdin closed
                };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match Command::from_string(line) {
                    Ok(command) => {
                        let pending = apply_to_session(&mut session, command);
                        for task in pending {
                            if let Err(e) = task_sender.send(task).await {
                                session.status_message = format!("Worker unavailable: {}", e);
                            }
                        }
                    }
                    Err(e) => session.status_message = format!("Error: {}", e),
                }
                render(&session);
            }
            result = result_receiver.recv() => {
                let result = match result {
                    Some(result) => result,
                    None => break,
                };
                log::debug!("📨 main: received task result: {:?}", std::mem::discriminant(&result));
                let follow_ups = session.apply_result(result);
                for task in follow_ups {
                    if task_sender.send(task).await.is_err() {
                        break;
                    }
                }
                render(&session);
            }
        }

        if session.should_quit {
            break;
        }
    }

    // Cleanup
    shutdown.cancel();
    worker_handle.abort();

    Ok(())
}

fn render(session: &DriveSession) {
    println!();
    println!("{}", session.navigation.breadcrumb_labels().join(" / "));

    let view = session.visible();
    if view.from_search {
        println!("search results for {:?}:", session.search.query);
    }
    for folder in &view.folders {
        println!("  [dir]  {:<30} ({})", folder.name, folder.id);
    }
    for file in &view.files {
        println!(
            "  [file] {:<30} {:>10}  ({})",
            file.name,
            format_file_size(file.size),
            file.id
        );
    }
    if view.folders.is_empty() && view.files.is_empty() {
        println!("  (empty)");
    }

    if session.listing.loading {
        println!("  loading...");
    }
    if let Some(kind) = session.listing.last_error {
        println!("  ! refresh failed ({}), showing last good listing", kind.label());
    }
    println!("status: {}", session.status_message);
}

async fn run_script_test(
    config: &Config,
    script_path: &str,
    snapshot_path: Option<&str>,
    settle_timeout: u64,
    verbose: bool,
) -> Result<()> {
    // Set up logging if verbose or if environment variable is set
    if verbose && std::env::var("DRIVE_SHELL_LOG").is_err() {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Debug)
            .init();
    }

    log::info!("🧪 Starting headless script run");
    log::info!("🧪 Script: {}", script_path);

    let mut session = match snapshot_path {
        Some(path) => {
            log::info!("🧪 Snapshot: {}", path);
            SessionSnapshot::load_from_file(path)?.into_session()
        }
        None => DriveSession::from_config(config),
    };

    let backend = Box::new(InMemoryDrive::with_sample_data());
    let (task_sender, task_receiver) = mpsc::channel::<Task>(32);
    let (result_sender, mut result_receiver) = mpsc::channel::<TaskResult>(32);
    let shutdown = CancellationToken::new();
    let worker_handle = tokio::spawn(tasks::run_worker(
        task_receiver,
        result_sender,
        backend,
        shutdown.clone(),
    ));

    let mut runner = ScriptRunner::from_file(script_path)?;
    runner.max_settle_time = Duration::from_secs(settle_timeout);
    log::info!("🧪 Running script with {} steps", runner.steps.len());

    let report = runner
        .run(&mut session, &task_sender, &mut result_receiver)
        .await?;

    shutdown.cancel();
    worker_handle.abort();

    report.print_summary();

    if report.is_success() {
        log::info!("🧪 Script completed successfully");
        Ok(())
    } else {
        log::error!("🧪 Script failed");
        Err(DriveShellError::from("Script failed".to_string()))
    }
}
