//! Breadcrumb navigation state: the current folder plus its ancestor chain.
//!
//! `folder_path` is kept root-to-leaf, root-exclusive, target-inclusive. The
//! chain is adopted verbatim from the ancestor collaborator when available;
//! otherwise it is reconstructed locally from path segments already known to
//! be correct (breadcrumb click truncates, drill-down appends). The local
//! reconstruction never invents ancestors it cannot verify.

use serde::{Deserialize, Serialize};

use crate::entry::FolderRef;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavigationState {
    pub current_folder: Option<FolderRef>,
    pub folder_path: Vec<FolderRef>,
}

impl NavigationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at_root(&self) -> bool {
        self.current_folder.is_none()
    }

    /// Return to "My Drive". Root has no ancestors by definition, so this
    /// never needs a network round trip.
    pub fn go_to_root(&mut self) {
        self.current_folder = None;
        self.folder_path.clear();
    }

    /// Open a folder optimistically: the destination becomes current at once
    /// and the breadcrumb is reconstructed from locally known segments. A
    /// later authoritative chain (if the collaborator answers) replaces the
    /// reconstruction via [`adopt_ancestors`](Self::adopt_ancestors).
    pub fn enter(&mut self, folder: FolderRef) {
        self.rebuild_path_locally(&folder);
        self.current_folder = Some(folder);
    }

    /// Replace the breadcrumb with the collaborator's root-to-leaf chain.
    /// Callers must have already checked the chain still targets the current
    /// folder; empty chains are ignored (the local reconstruction stands).
    pub fn adopt_ancestors(&mut self, ancestors: Vec<FolderRef>) {
        if ancestors.is_empty() {
            log::debug!("ancestor chain empty, keeping local breadcrumb");
            return;
        }
        self.folder_path = ancestors;
    }

    /// Local fallback path builder. If the target already appears in the
    /// path, truncate to it (breadcrumb click); otherwise append it as a
    /// child of the current leaf (drill-down). Navigating to an unrelated
    /// folder during an ancestor-fetch outage therefore yields a temporarily
    /// wrong breadcrumb; the trade-off is deliberate.
    fn rebuild_path_locally(&mut self, target: &FolderRef) {
        if let Some(index) = self.folder_path.iter().position(|f| f.id == target.id) {
            self.folder_path.truncate(index + 1);
        } else {
            self.folder_path.push(target.clone());
        }
    }

    /// True when the breadcrumb ends at the current folder (or both are
    /// empty at root). Holds at every point between operations.
    pub fn path_is_consistent(&self) -> bool {
        match &self.current_folder {
            None => self.folder_path.is_empty(),
            Some(current) => self
                .folder_path
                .last()
                .map(|leaf| leaf.id == current.id)
                .unwrap_or(false),
        }
    }

    /// Breadcrumb labels, root first: `["My Drive", "Docs", "Sub"]`.
    pub fn breadcrumb_labels(&self) -> Vec<String> {
        let mut labels = vec!["My Drive".to_string()];
        labels.extend(self.folder_path.iter().map(|f| f.name.clone()));
        labels
    }
}
