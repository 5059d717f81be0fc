//! Background task plumbing: the session issues [`Task`]s over a channel, a
//! single worker owns the backend and answers with [`TaskResult`]s. All
//! staleness decisions happen at the commit point in the session, not here;
//! the worker just reports what the backend said, tagged with enough
//! identity (generation, target, query) for the session to judge relevance.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::backend::{DriveBackend, FolderContents, SearchHit};
use crate::entry::FolderRef;
use crate::error::ErrorKind;

#[derive(Debug, Clone)]
pub enum Task {
    /// Resolve the authoritative ancestor chain for a just-opened folder.
    ResolvePath { target: FolderRef },
    /// Fetch contents for a folder (or root). `generation` identifies the
    /// refresh that issued this task.
    LoadContents {
        folder: Option<FolderRef>,
        generation: u64,
    },
    /// Server-backed search.
    Search { query: String },
    CreateFolder {
        name: String,
        parent_id: Option<String>,
    },
    Rename { item_id: String, name: String },
    Delete { item_id: String },
}

#[derive(Debug, Clone)]
pub enum TaskResult {
    PathResolved {
        target: FolderRef,
        ancestors: Vec<FolderRef>,
    },
    /// Resolution failed or came back empty; the local breadcrumb stands.
    PathUnavailable { target: FolderRef },
    ContentsLoaded {
        generation: u64,
        folder_id: Option<String>,
        contents: FolderContents,
    },
    ContentsFailed {
        generation: u64,
        folder_id: Option<String>,
        kind: ErrorKind,
    },
    SearchLoaded {
        query: String,
        hits: Vec<SearchHit>,
    },
    SearchFailed { query: String },
    MutationDone { description: String },
    MutationFailed {
        description: String,
        message: String,
    },
}

/// Worker loop. Exits when the task channel closes, the result channel
/// closes, or the shutdown token fires. Requests themselves are never
/// aborted mid-flight; navigating away is handled by the staleness checks
/// on the session side.
pub async fn run_worker(
    mut task_receiver: mpsc::Receiver<Task>,
    result_sender: mpsc::Sender<TaskResult>,
    backend: Box<dyn DriveBackend>,
    shutdown: CancellationToken,
) {
    loop {
        let task = tokio::select! {
            _ = shutdown.cancelled() => {
                log::info!("worker: shutdown requested");
                break;
            }
            task = task_receiver.recv() => match task {
                Some(task) => task,
                None => break,
            },
        };

        let result = run_task(backend.as_ref(), task).await;
        if result_sender.send(result).await.is_err() {
            // Main loop dropped the receiver, exit worker.
            break;
        }
    }
}

/// Execute one task against the backend. Exposed for flows that do not need
/// the worker loop (state capture, one-shot commands).
pub async fn run_task(backend: &dyn DriveBackend, task: Task) -> TaskResult {
    match task {
        Task::ResolvePath { target } => match backend.folder_ancestors(&target.id).await {
            Ok(ancestors) if !ancestors.is_empty() => TaskResult::PathResolved { target, ancestors },
            Ok(_) => {
                log::debug!("worker: empty ancestor chain for {}", target.id);
                TaskResult::PathUnavailable { target }
            }
            Err(e) => {
                log::debug!("worker: ancestor resolution failed for {}: {}", target.id, e);
                TaskResult::PathUnavailable { target }
            }
        },
        Task::LoadContents { folder, generation } => {
            let folder_id = folder.as_ref().map(|f| f.id.clone());
            match backend.folder_contents(folder_id.as_deref()).await {
                Ok(contents) => TaskResult::ContentsLoaded {
                    generation,
                    folder_id,
                    contents,
                },
                Err(e) => {
                    log::warn!("worker: listing fetch failed: {}", e);
                    TaskResult::ContentsFailed {
                        generation,
                        folder_id,
                        kind: e.listing_kind(),
                    }
                }
            }
        }
        Task::Search { query } => match backend.search_candidates(&query).await {
            Ok(hits) => TaskResult::SearchLoaded { query, hits },
            Err(e) => {
                log::warn!("worker: search failed for {:?}: {}", query, e);
                TaskResult::SearchFailed { query }
            }
        },
        Task::CreateFolder { name, parent_id } => {
            let description = format!("create folder \"{}\"", name);
            match backend.create_folder(&name, parent_id.as_deref()).await {
                Ok(_) => TaskResult::MutationDone { description },
                Err(e) => TaskResult::MutationFailed {
                    description,
                    message: e.to_string(),
                },
            }
        }
        Task::Rename { item_id, name } => {
            let description = format!("rename {} to \"{}\"", item_id, name);
            match backend.rename(&item_id, &name).await {
                Ok(()) => TaskResult::MutationDone { description },
                Err(e) => TaskResult::MutationFailed {
                    description,
                    message: e.to_string(),
                },
            }
        }
        Task::Delete { item_id } => {
            let description = format!("delete {}", item_id);
            match backend.delete(&item_id).await {
                Ok(()) => TaskResult::MutationDone { description },
                Err(e) => TaskResult::MutationFailed {
                    description,
                    message: e.to_string(),
                },
            }
        }
    }
}
