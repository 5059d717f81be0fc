//! Serializable session snapshots for the `execute`/`save-state` commands
//! and for seeding headless test runs.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::entry::{FileEntry, FileFilters, FolderRef};
use crate::listing::{ListingState, SortKey, SortOrder};
use crate::navigation::NavigationState;
use crate::search::SearchOverlay;
use crate::session::DriveSession;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSnapshot {
    pub active: bool,
    pub query: String,
    pub filters: FileFilters,
    pub files: Vec<FileEntry>,
    pub folders: Vec<FolderRef>,
    pub recent_searches: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSnapshot {
    pub navigation: NavigationState,
    pub listing: ListingState,
    pub search: SearchSnapshot,
    pub sort_key: SortKey,
    pub sort_order: SortOrder,
    pub status_message: String,
}

impl SessionSnapshot {
    pub fn from_session(session: &DriveSession) -> Self {
        Self {
            navigation: session.navigation.clone(),
            listing: session.listing.clone(),
            search: SearchSnapshot {
                active: session.search.active,
                query: session.search.query.clone(),
                filters: session.search.filters.clone(),
                files: session.search.files.clone(),
                folders: session.search.folders.clone(),
                recent_searches: session.search.recent_searches.clone(),
            },
            sort_key: session.sort_key,
            sort_order: session.sort_order,
            status_message: session.status_message.clone(),
        }
    }

    /// Rebuild a live session. The fuzzy engine is reinstated fresh; it is a
    /// capability, not state, and is not serialized.
    pub fn into_session(self) -> DriveSession {
        let mut session = DriveSession::new();
        session.navigation = self.navigation;
        session.listing = self.listing;
        let mut search = SearchOverlay::new();
        search.active = self.search.active;
        search.query = self.search.query;
        search.filters = self.search.filters;
        search.files = self.search.files;
        search.folders = self.search.folders;
        search.recent_searches = self.search.recent_searches;
        session.search = search;
        session.sort_key = self.sort_key;
        session.sort_order = self.sort_order;
        session.status_message = self.status_message;
        session
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let snapshot = serde_json::from_str(&content)?;
        Ok(snapshot)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> crate::error::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
