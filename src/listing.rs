//! Listing state for the active folder, plus display-order sorting.
//!
//! The listing is derived state: it is replaced wholesale by the refresh
//! routine and written by nothing else. A failed refresh records a
//! classified error and keeps the previous contents visible.

use serde::{Deserialize, Serialize};

use crate::entry::{FileEntry, FolderRef};
use crate::error::ErrorKind;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListingState {
    pub files: Vec<FileEntry>,
    pub folders: Vec<FolderRef>,
    pub loading: bool,
    pub last_error: Option<ErrorKind>,
}

impl ListingState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A refresh response for the live navigation target: replace, never merge.
    pub fn commit(&mut self, files: Vec<FileEntry>, folders: Vec<FolderRef>) {
        self.files = files;
        self.folders = folders;
        self.loading = false;
        self.last_error = None;
    }

    /// A failed refresh keeps the last good listing on screen.
    pub fn fail(&mut self, kind: ErrorKind) {
        self.loading = false;
        self.last_error = Some(kind);
    }

    pub fn is_settled(&self) -> bool {
        !self.loading && self.last_error.is_none()
    }
}

/// Sort key for the displayed listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Name,
    Date,
    Size,
}

impl SortKey {
    pub fn from_label(label: &str) -> Option<SortKey> {
        match label {
            "name" => Some(SortKey::Name),
            "date" => Some(SortKey::Date),
            "size" => Some(SortKey::Size),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn from_label(label: &str) -> Option<SortOrder> {
        match label {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

/// Display order for files. Sorting is a view concern; the stored listing is
/// left untouched.
pub fn sorted_files(files: &[FileEntry], key: SortKey, order: SortOrder) -> Vec<FileEntry> {
    let mut sorted = files.to_vec();
    sorted.sort_by(|a, b| {
        let ordering = match key {
            SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            SortKey::Date => a.uploaded_at.cmp(&b.uploaded_at),
            SortKey::Size => a.size.cmp(&b.size),
        };
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
    sorted
}

/// Folders always sort by name; size and date do not apply to them.
pub fn sorted_folders(folders: &[FolderRef], order: SortOrder) -> Vec<FolderRef> {
    let mut sorted = folders.to_vec();
    sorted.sort_by(|a, b| {
        let ordering = a.name.to_lowercase().cmp(&b.name.to_lowercase());
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
    sorted
}
