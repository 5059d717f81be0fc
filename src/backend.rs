//! The drive backend contract and the in-memory implementation used by the
//! interactive shell's offline mode, the script harness, and tests.
//!
//! The three read operations mirror the collaborator contracts the session
//! core depends on: ancestor chains, folder contents, and search candidates.
//! Mutations exist so the refresh-after-mutation flow has something real to
//! call; their storage semantics are deliberately simple.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::entry::{FileEntry, FolderRef};
use crate::error::{DriveShellError, Result};

/// Contents of one folder (or of the root when no folder is given).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FolderContents {
    pub files: Vec<FileEntry>,
    pub folders: Vec<FolderRef>,
}

/// A server-side search result, tagged with what it is.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchHit {
    File(FileEntry),
    Folder(FolderRef),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DriveBackend: Send + Sync {
    /// Root-to-leaf ancestor chain including the folder itself. An error or
    /// an empty chain makes the caller fall back to local reconstruction.
    async fn folder_ancestors(&self, folder_id: &str) -> Result<Vec<FolderRef>>;

    /// Files and folders directly inside `folder_id`; `None` means root.
    async fn folder_contents<'a>(&self, folder_id: Option<&'a str>) -> Result<FolderContents>;

    /// Server-backed search over the whole drive.
    async fn search_candidates(&self, query: &str) -> Result<Vec<SearchHit>>;

    async fn create_folder<'a>(&self, name: &str, parent_id: Option<&'a str>) -> Result<FolderRef>;

    async fn rename(&self, item_id: &str, name: &str) -> Result<()>;

    async fn delete(&self, item_id: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
struct FolderNode {
    folder: FolderRef,
    parent: Option<String>,
}

#[derive(Debug, Clone)]
struct FileNode {
    file: FileEntry,
    parent: Option<String>,
}

#[derive(Debug, Default)]
struct DriveTree {
    folders: HashMap<String, FolderNode>,
    files: HashMap<String, FileNode>,
}

/// In-memory drive with parent pointers; ancestors are resolved by walking
/// up the tree the way the real service resolves its breadcrumb endpoint.
pub struct InMemoryDrive {
    tree: Mutex<DriveTree>,
    next_id: AtomicU64,
}

impl InMemoryDrive {
    pub fn new() -> Self {
        Self {
            tree: Mutex::new(DriveTree::default()),
            next_id: AtomicU64::new(1),
        }
    }

    /// A small drive used by the interactive shell's offline mode and the
    /// integration tests.
    pub fn with_sample_data() -> Self {
        let drive = Self::new();
        let docs = drive.insert_folder("Documents", None);
        let reports = drive.insert_folder("Reports", Some(&docs.id));
        let media = drive.insert_folder("Media", None);

        drive.insert_file("invoice_jan.pdf", 420_000, "application/pdf", Some(&reports.id), 2);
        drive.insert_file("invoice_feb.pdf", 380_000, "application/pdf", Some(&reports.id), 1);
        drive.insert_file("summary.txt", 2_400, "text/plain", Some(&docs.id), 12);
        drive.insert_file("holiday.jpg", 3_500_000, "image/jpeg", Some(&media.id), 40);
        drive.insert_file("podcast.mp3", 52_000_000, "audio/mpeg", Some(&media.id), 8);
        drive.insert_file("notes.md", 900, "text/markdown", None, 0);
        drive
    }

    fn allocate_id(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    pub fn insert_folder(&self, name: &str, parent_id: Option<&str>) -> FolderRef {
        let folder = FolderRef::new(self.allocate_id("folder"), name);
        let mut tree = self.tree.lock().expect("drive tree lock");
        tree.folders.insert(
            folder.id.clone(),
            FolderNode {
                folder: folder.clone(),
                parent: parent_id.map(str::to_string),
            },
        );
        folder
    }

    pub fn insert_file(
        &self,
        name: &str,
        size: u64,
        mime_type: &str,
        parent_id: Option<&str>,
        age_days: i64,
    ) -> FileEntry {
        let file = FileEntry {
            id: self.allocate_id("file"),
            name: name.to_string(),
            size,
            mime_type: mime_type.to_string(),
            tags: Vec::new(),
            uploaded_at: Utc::now() - Duration::days(age_days),
        };
        let mut tree = self.tree.lock().expect("drive tree lock");
        tree.files.insert(
            file.id.clone(),
            FileNode {
                file: file.clone(),
                parent: parent_id.map(str::to_string),
            },
        );
        file
    }

    /// Remove a folder so that later lookups report it missing; used to
    /// exercise the dead-target path.
    pub fn remove_folder(&self, folder_id: &str) {
        let mut tree = self.tree.lock().expect("drive tree lock");
        tree.folders.remove(folder_id);
    }
}

impl Default for InMemoryDrive {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DriveBackend for InMemoryDrive {
    async fn folder_ancestors(&self, folder_id: &str) -> Result<Vec<FolderRef>> {
        let tree = self.tree.lock().expect("drive tree lock");
        let mut chain = Vec::new();
        let mut cursor = Some(folder_id.to_string());
        while let Some(id) = cursor {
            let node = tree
                .folders
                .get(&id)
                .ok_or_else(|| DriveShellError::NotFound(format!("folder {}", id)))?;
            chain.push(node.folder.clone());
            cursor = node.parent.clone();
        }
        chain.reverse();
        Ok(chain)
    }

    async fn folder_contents<'a>(&self, folder_id: Option<&'a str>) -> Result<FolderContents> {
        let tree = self.tree.lock().expect("drive tree lock");
        if let Some(id) = folder_id {
            if !tree.folders.contains_key(id) {
                return Err(DriveShellError::NotFound(format!("folder {}", id)));
            }
        }

        let wanted = folder_id.map(str::to_string);
        let mut contents = FolderContents::default();
        for node in tree.folders.values() {
            if node.parent == wanted {
                contents.folders.push(node.folder.clone());
            }
        }
        for node in tree.files.values() {
            if node.parent == wanted {
                contents.files.push(node.file.clone());
            }
        }
        // Deterministic order regardless of map iteration.
        contents.folders.sort_by(|a, b| a.name.cmp(&b.name));
        contents.files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(contents)
    }

    async fn search_candidates(&self, query: &str) -> Result<Vec<SearchHit>> {
        let needle = query.trim().to_lowercase();
        let tree = self.tree.lock().expect("drive tree lock");
        let mut hits = Vec::new();
        if needle.is_empty() {
            return Ok(hits);
        }
        for node in tree.folders.values() {
            if node.folder.name.to_lowercase().contains(&needle) {
                hits.push(SearchHit::Folder(node.folder.clone()));
            }
        }
        for node in tree.files.values() {
            if node.file.name.to_lowercase().contains(&needle) {
                hits.push(SearchHit::File(node.file.clone()));
            }
        }
        Ok(hits)
    }

    async fn create_folder<'a>(&self, name: &str, parent_id: Option<&'a str>) -> Result<FolderRef> {
        if let Some(id) = parent_id {
            let tree = self.tree.lock().expect("drive tree lock");
            if !tree.folders.contains_key(id) {
                return Err(DriveShellError::NotFound(format!("folder {}", id)));
            }
        }
        Ok(self.insert_folder(name, parent_id))
    }

    async fn rename(&self, item_id: &str, name: &str) -> Result<()> {
        let mut tree = self.tree.lock().expect("drive tree lock");
        if let Some(node) = tree.folders.get_mut(item_id) {
            node.folder.name = name.to_string();
            return Ok(());
        }
        if let Some(node) = tree.files.get_mut(item_id) {
            node.file.name = name.to_string();
            return Ok(());
        }
        Err(DriveShellError::NotFound(format!("item {}", item_id)))
    }

    async fn delete(&self, item_id: &str) -> Result<()> {
        let mut tree = self.tree.lock().expect("drive tree lock");
        if tree.folders.remove(item_id).is_some() {
            // Children of a removed folder become unreachable; good enough
            // for an in-memory stand-in.
            return Ok(());
        }
        if tree.files.remove(item_id).is_some() {
            return Ok(());
        }
        Err(DriveShellError::NotFound(format!("item {}", item_id)))
    }
}
