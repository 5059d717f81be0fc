//! The drive session: one state container owning navigation, listing, and
//! the search overlay, consumed by whatever front end drives it.
//!
//! All mutation goes through the operations here; the view layer only reads
//! snapshots. Network work is returned as [`Task`]s for the caller to
//! dispatch, and completed work comes back through [`apply_result`], the
//! single commit point where stale responses are detected and dropped.
//!
//! Staleness rule: every listing refresh carries a monotonically increasing
//! generation, and only the response matching the latest issued generation
//! may commit. Without this, fast navigation lets a slow response for an
//! abandoned folder overwrite the listing of the current one.

use chrono::Utc;

use crate::backend::SearchHit;
use crate::config::Config;
use crate::entry::{FileEntry, FileFilters, FolderRef};
use crate::error::ErrorKind;
use crate::listing::{sorted_files, sorted_folders, ListingState, SortKey, SortOrder};
use crate::navigation::NavigationState;
use crate::search::{SearchOverlay, SkimEngine};
use crate::tasks::{Task, TaskResult};

/// What the view should render right now: overlay content when a search is
/// active, the sorted navigation-derived listing otherwise.
#[derive(Debug, Clone)]
pub struct ViewListing {
    pub files: Vec<FileEntry>,
    pub folders: Vec<FolderRef>,
    pub from_search: bool,
}

pub struct DriveSession {
    pub navigation: NavigationState,
    pub listing: ListingState,
    pub search: SearchOverlay,
    pub sort_key: SortKey,
    pub sort_order: SortOrder,
    pub status_message: String,
    pub should_quit: bool,
    refresh_generation: u64,
}

impl DriveSession {
    pub fn new() -> Self {
        Self::with_overlay(SearchOverlay::new())
    }

    pub fn with_overlay(search: SearchOverlay) -> Self {
        Self {
            navigation: NavigationState::new(),
            listing: ListingState::new(),
            search,
            sort_key: SortKey::default(),
            sort_order: SortOrder::default(),
            status_message: "Ready".to_string(),
            should_quit: false,
            refresh_generation: 0,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let mut session =
            Self::with_overlay(SearchOverlay::with_engine(Box::new(SkimEngine::from_config(
                &config.search,
            ))));
        session.sort_key = config.listing.sort_key;
        session.sort_order = config.listing.sort_order;
        session
    }

    pub fn current_folder_id(&self) -> Option<String> {
        self.navigation.current_folder.as_ref().map(|f| f.id.clone())
    }

    /// Open a folder (or return to root with `None`). The destination shows
    /// immediately; path resolution and the listing refresh run as
    /// background tasks. Navigation always cancels an active search.
    pub fn navigate_to(&mut self, target: Option<FolderRef>) -> Vec<Task> {
        self.search.clear();
        match target {
            Some(folder) => {
                log::info!("navigate: opening {} ({})", folder.name, folder.id);
                self.navigation.enter(folder.clone());
                self.status_message = format!("Opened {}", folder.name);
                vec![Task::ResolvePath { target: folder }, self.refresh()]
            }
            None => {
                log::info!("navigate: back to root");
                self.navigation.go_to_root();
                self.status_message = "My Drive".to_string();
                vec![self.refresh()]
            }
        }
    }

    /// Request fresh contents for the live navigation target. Also called
    /// after every content mutation.
    pub fn refresh(&mut self) -> Task {
        self.refresh_generation += 1;
        self.listing.loading = true;
        Task::LoadContents {
            folder: self.navigation.current_folder.clone(),
            generation: self.refresh_generation,
        }
    }

    /// Local search over the currently loaded listing.
    pub fn apply_query(&mut self, query: &str, filters: FileFilters) {
        self.search.apply(
            query,
            filters,
            &self.listing.files,
            &self.listing.folders,
            Utc::now(),
        );
        if self.search.active {
            self.search.note_recent(query);
            self.status_message = format!(
                "Search: {} files, {} folders",
                self.search.files.len(),
                self.search.folders.len()
            );
        } else {
            self.status_message = "Search cleared".to_string();
        }
    }

    /// Server-backed search: show local matches at once, then widen with the
    /// backend's candidates when they arrive (if still relevant).
    pub fn server_search(&mut self, query: &str, filters: FileFilters) -> Vec<Task> {
        self.apply_query(query, filters);
        if !self.search.active || query.trim().is_empty() {
            return Vec::new();
        }
        vec![Task::Search {
            query: query.to_string(),
        }]
    }

    /// Drop the overlay and reveal the navigation-derived listing unchanged.
    pub fn clear_query(&mut self) {
        self.search.clear();
        self.status_message = "Search cleared".to_string();
    }

    pub fn set_sort(&mut self, key: SortKey) {
        self.sort_key = key;
        self.status_message = format!("Sorting by {:?}", key).to_lowercase();
    }

    pub fn set_order(&mut self, order: SortOrder) {
        self.sort_order = order;
    }

    pub fn create_folder(&mut self, name: &str) -> Task {
        self.status_message = format!("Creating folder \"{}\"...", name);
        Task::CreateFolder {
            name: name.to_string(),
            parent_id: self.current_folder_id(),
        }
    }

    pub fn rename_item(&mut self, item_id: &str, name: &str) -> Task {
        self.status_message = format!("Renaming {}...", item_id);
        Task::Rename {
            item_id: item_id.to_string(),
            name: name.to_string(),
        }
    }

    pub fn delete_item(&mut self, item_id: &str) -> Task {
        self.status_message = format!("Deleting {}...", item_id);
        Task::Delete {
            item_id: item_id.to_string(),
        }
    }

    /// The single commit point for background results. Returns follow-up
    /// tasks for the caller to dispatch (a refresh after a mutation, or the
    /// root reset after a dead navigation target).
    pub fn apply_result(&mut self, result: TaskResult) -> Vec<Task> {
        match result {
            TaskResult::PathResolved { target, ancestors } => {
                let still_current = self
                    .navigation
                    .current_folder
                    .as_ref()
                    .map(|f| f.id == target.id)
                    .unwrap_or(false);
                if still_current {
                    self.navigation.adopt_ancestors(ancestors);
                } else {
                    log::debug!("dropping stale ancestor chain for {}", target.id);
                }
                Vec::new()
            }
            TaskResult::PathUnavailable { target } => {
                // Non-fatal: the local reconstruction from navigate time
                // stands, the folder stays open.
                log::debug!("keeping local breadcrumb for {} (resolution unavailable)", target.id);
                Vec::new()
            }
            TaskResult::ContentsLoaded {
                generation,
                folder_id,
                contents,
            } => {
                if generation != self.refresh_generation {
                    log::debug!(
                        "dropping stale listing for {:?} (generation {} != {})",
                        folder_id,
                        generation,
                        self.refresh_generation
                    );
                    return Vec::new();
                }
                let count = contents.files.len() + contents.folders.len();
                self.listing.commit(contents.files, contents.folders);
                if self.search.active {
                    // The overlay tracks the refreshed candidate set; the
                    // query and filters are untouched.
                    let query = self.search.query.clone();
                    let filters = self.search.filters.clone();
                    self.search.apply(
                        &query,
                        filters,
                        &self.listing.files,
                        &self.listing.folders,
                        Utc::now(),
                    );
                }
                self.status_message = format!("Loaded {} items", count);
                Vec::new()
            }
            TaskResult::ContentsFailed {
                generation,
                folder_id,
                kind,
            } => {
                if generation != self.refresh_generation {
                    log::debug!("dropping stale listing failure for {:?}", folder_id);
                    return Vec::new();
                }
                if kind == ErrorKind::NotFound
                    && folder_id.is_some()
                    && folder_id == self.current_folder_id()
                {
                    // Don't leave the UI pointed at a dead folder.
                    self.status_message =
                        "Folder no longer exists, returning to My Drive".to_string();
                    return self.navigate_to(None);
                }
                self.listing.fail(kind);
                self.status_message = "Failed to load folder contents".to_string();
                Vec::new()
            }
            TaskResult::SearchLoaded { query, hits } => {
                let mut files = Vec::new();
                let mut folders = Vec::new();
                for hit in hits {
                    match hit {
                        SearchHit::File(file) => files.push(file),
                        SearchHit::Folder(folder) => folders.push(folder),
                    }
                }
                if self.search.adopt_server_results(&query, files, folders, Utc::now()) {
                    self.status_message = format!(
                        "Search: {} files, {} folders",
                        self.search.files.len(),
                        self.search.folders.len()
                    );
                }
                Vec::new()
            }
            TaskResult::SearchFailed { query } => {
                log::warn!("server search failed for {:?}, local matches stand", query);
                self.status_message = "Search degraded to local matches".to_string();
                Vec::new()
            }
            TaskResult::MutationDone { description } => {
                self.status_message = format!("Done: {}", description);
                vec![self.refresh()]
            }
            TaskResult::MutationFailed {
                description,
                message,
            } => {
                self.status_message = format!("Failed to {}: {}", description, message);
                Vec::new()
            }
        }
    }

    /// One consistent snapshot per render pass.
    pub fn visible(&self) -> ViewListing {
        if self.search.active {
            ViewListing {
                files: self.search.files.clone(),
                folders: self.search.folders.clone(),
                from_search: true,
            }
        } else {
            ViewListing {
                files: sorted_files(&self.listing.files, self.sort_key, self.sort_order),
                folders: sorted_folders(&self.listing.folders, self.sort_order),
                from_search: false,
            }
        }
    }
}

impl Default for DriveSession {
    fn default() -> Self {
        Self::new()
    }
}
