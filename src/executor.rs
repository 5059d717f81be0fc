//! Applies [`Command`]s to a session. The interactive shell and the script
//! runner dispatch the returned tasks to the worker; the snapshot-based
//! [`Executor`] discards them, which yields exactly the documented offline
//! semantics (optimistic navigation with local breadcrumb fallback, search
//! over the already-loaded listing, `loading` left pending).

use crate::command::Command;
use crate::session::DriveSession;
use crate::snapshot::SessionSnapshot;
use crate::tasks::Task;

/// Apply one command, returning the background tasks it produced.
pub fn apply_to_session(session: &mut DriveSession, command: Command) -> Vec<Task> {
    match command {
        Command::OpenFolder { id, name } => {
            session.navigate_to(Some(crate::entry::FolderRef::new(id, name)))
        }
        Command::GoRoot => session.navigate_to(None),
        Command::Refresh => vec![session.refresh()],

        Command::Query(query) => {
            let filters = session.search.filters.clone();
            session.apply_query(&query, filters);
            Vec::new()
        }
        Command::ServerSearch(query) => {
            let filters = session.search.filters.clone();
            session.server_search(&query, filters)
        }
        Command::FilterKind(kind) => {
            let query = session.search.query.clone();
            let mut filters = session.search.filters.clone();
            filters.kind = kind;
            session.apply_query(&query, filters);
            Vec::new()
        }
        Command::FilterSize(band) => {
            let query = session.search.query.clone();
            let mut filters = session.search.filters.clone();
            filters.size = band;
            session.apply_query(&query, filters);
            Vec::new()
        }
        Command::FilterDate(range) => {
            let query = session.search.query.clone();
            let mut filters = session.search.filters.clone();
            filters.date = range;
            session.apply_query(&query, filters);
            Vec::new()
        }
        Command::FilterExtension(extension) => {
            let query = session.search.query.clone();
            let mut filters = session.search.filters.clone();
            filters.extension = extension;
            session.apply_query(&query, filters);
            Vec::new()
        }
        Command::ClearSearch => {
            session.clear_query();
            Vec::new()
        }

        Command::SortBy(key) => {
            session.set_sort(key);
            Vec::new()
        }
        Command::OrderBy(order) => {
            session.set_order(order);
            Vec::new()
        }

        Command::CreateFolder(name) => vec![session.create_folder(&name)],
        Command::Rename { id, name } => vec![session.rename_item(&id, &name)],
        Command::Delete(id) => vec![session.delete_item(&id)],

        Command::Quit => {
            session.should_quit = true;
            session.status_message = "Goodbye!".to_string();
            Vec::new()
        }

        Command::Sequence(commands) => {
            let mut tasks = Vec::new();
            for command in commands {
                tasks.extend(apply_to_session(session, command));
                if session.should_quit {
                    break;
                }
            }
            tasks
        }
    }
}

/// Result of executing a command against a snapshot.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub snapshot: SessionSnapshot,
    pub status_message: String,
    pub should_quit: bool,
}

/// Executes commands against session snapshots, offline.
pub struct Executor;

impl Executor {
    pub fn execute(snapshot: &SessionSnapshot, command: Command) -> ExecutionResult {
        let mut session = snapshot.clone().into_session();
        // Dropped on purpose: there is no worker behind a snapshot run.
        let _tasks = apply_to_session(&mut session, command);

        ExecutionResult {
            status_message: session.status_message.clone(),
            should_quit: session.should_quit,
            snapshot: SessionSnapshot::from_session(&session),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{FileEntry, FileKind, FolderRef};
    use chrono::Utc;

    fn snapshot_with_listing() -> SessionSnapshot {
        let mut session = DriveSession::new();
        session.listing.commit(
            vec![
                FileEntry {
                    id: "f1".to_string(),
                    name: "report.pdf".to_string(),
                    size: 1000,
                    mime_type: "application/pdf".to_string(),
                    tags: Vec::new(),
                    uploaded_at: Utc::now(),
                },
                FileEntry {
                    id: "f2".to_string(),
                    name: "scan.png".to_string(),
                    size: 2000,
                    mime_type: "image/png".to_string(),
                    tags: Vec::new(),
                    uploaded_at: Utc::now(),
                },
            ],
            vec![FolderRef::new("A", "Docs")],
        );
        SessionSnapshot::from_session(&session)
    }

    #[test]
    fn test_execute_open_is_offline_optimistic() {
        let snapshot = SessionSnapshot::default();
        let result = Executor::execute(
            &snapshot,
            Command::from_string("open:A:Docs").unwrap(),
        );

        let nav = &result.snapshot.navigation;
        assert_eq!(nav.current_folder.as_ref().unwrap().id, "A");
        assert_eq!(nav.folder_path.len(), 1, "local breadcrumb fallback");
        assert!(result.snapshot.listing.loading, "refresh left pending");
        assert!(!result.should_quit);
    }

    #[test]
    fn test_execute_breadcrumb_click_truncates() {
        let base = Executor::execute(
            &SessionSnapshot::default(),
            Command::from_string("sequence:[open:A:Docs, open:B:Sub, open:C:Deep]").unwrap(),
        );
        assert_eq!(base.snapshot.navigation.folder_path.len(), 3);

        let clicked = Executor::execute(&base.snapshot, Command::from_string("open:A:Docs").unwrap());
        assert_eq!(clicked.snapshot.navigation.folder_path.len(), 1);
        assert_eq!(
            clicked.snapshot.navigation.current_folder.as_ref().unwrap().id,
            "A"
        );
    }

    #[test]
    fn test_execute_query_over_snapshot_listing() {
        let result = Executor::execute(
            &snapshot_with_listing(),
            Command::Query("report".to_string()),
        );
        assert!(result.snapshot.search.active);
        assert_eq!(result.snapshot.search.files.len(), 1);
        assert_eq!(result.snapshot.search.files[0].id, "f1");
        // Underlying listing untouched.
        assert_eq!(result.snapshot.listing.files.len(), 2);
    }

    #[test]
    fn test_filter_composes_with_query() {
        let after_query = Executor::execute(
            &snapshot_with_listing(),
            Command::Query("sc".to_string()),
        );
        let after_filter = Executor::execute(
            &after_query.snapshot,
            Command::FilterKind(Some(FileKind::Image)),
        );
        assert_eq!(after_filter.snapshot.search.query, "sc");
        let files = &after_filter.snapshot.search.files;
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].id, "f2");
    }

    #[test]
    fn test_clear_restores_listing() {
        let searched = Executor::execute(
            &snapshot_with_listing(),
            Command::Query("report".to_string()),
        );
        let cleared = Executor::execute(&searched.snapshot, Command::ClearSearch);
        assert!(!cleared.snapshot.search.active);
        assert!(cleared.snapshot.search.query.is_empty());
        assert_eq!(cleared.snapshot.listing.files.len(), 2);
    }

    #[test]
    fn test_quit_short_circuits_sequence() {
        let result = Executor::execute(
            &SessionSnapshot::default(),
            Command::Sequence(vec![
                Command::Quit,
                Command::OpenFolder {
                    id: "A".to_string(),
                    name: "Docs".to_string(),
                },
            ]),
        );
        assert!(result.should_quit);
        assert!(result.snapshot.navigation.current_folder.is_none());
    }
}
