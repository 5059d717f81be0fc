//! File and folder model shared by the listing, the search overlay, and the
//! backend contract: references, MIME classification, display tags, and the
//! structured filter predicates.

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

/// Identifies a folder. Re-fetched representations with the same id are
/// treated as the same folder for breadcrumb purposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderRef {
    pub id: String,
    pub name: String,
}

impl FolderRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A file as reported by the listing collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    pub id: String,
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub uploaded_at: DateTime<Utc>,
}

impl FileEntry {
    /// Final extension, lowercased. `None` when the name has no dot or ends
    /// with one.
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_lowercase())
    }

    pub fn kind(&self) -> FileKind {
        FileKind::from_mime(&self.mime_type)
    }
}

/// Broad file classification derived from the MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Image,
    Video,
    Audio,
    Document,
    Text,
    Archive,
}

impl FileKind {
    pub fn from_mime(mime_type: &str) -> FileKind {
        if mime_type.starts_with("image/") {
            return FileKind::Image;
        }
        if mime_type.starts_with("video/") {
            return FileKind::Video;
        }
        if mime_type.starts_with("audio/") {
            return FileKind::Audio;
        }
        if mime_type.contains("pdf") {
            return FileKind::Document;
        }
        if mime_type.contains("text") || mime_type.contains("json") || mime_type.contains("xml") {
            return FileKind::Text;
        }
        if mime_type.contains("zip") || mime_type.contains("rar") || mime_type.contains("tar") {
            return FileKind::Archive;
        }
        // Office formats and everything unrecognized count as documents.
        FileKind::Document
    }

    pub fn label(&self) -> &'static str {
        match self {
            FileKind::Image => "image",
            FileKind::Video => "video",
            FileKind::Audio => "audio",
            FileKind::Document => "document",
            FileKind::Text => "text",
            FileKind::Archive => "archive",
        }
    }

    pub fn from_label(label: &str) -> Option<FileKind> {
        match label {
            "image" => Some(FileKind::Image),
            "video" => Some(FileKind::Video),
            "audio" => Some(FileKind::Audio),
            "document" => Some(FileKind::Document),
            "text" => Some(FileKind::Text),
            "archive" => Some(FileKind::Archive),
            _ => None,
        }
    }

    /// The kinds offered as filter choices. `Text` is classified but not
    /// filterable, matching the original product's filter menu.
    pub const FILTERABLE: [FileKind; 5] = [
        FileKind::Image,
        FileKind::Document,
        FileKind::Video,
        FileKind::Audio,
        FileKind::Archive,
    ];
}

lazy_static! {
    static ref PHOTO_EXTENSIONS: Vec<&'static str> = vec!["jpg", "jpeg", "png", "gif", "webp"];
    static ref DOCUMENT_EXTENSIONS: Vec<&'static str> = vec!["pdf", "doc", "docx", "txt"];
    static ref VIDEO_EXTENSIONS: Vec<&'static str> = vec!["mp4", "avi", "mov", "mkv"];
    static ref AUDIO_EXTENSIONS: Vec<&'static str> = vec!["mp3", "wav", "flac", "aac"];
}

/// Human-readable size, two decimals: "1.5 MB".
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let exponent = ((bytes as f64).ln() / 1024f64.ln()).floor() as usize;
    let exponent = exponent.min(UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(exponent as i32);
    let rounded = (value * 100.0).round() / 100.0;
    // Trim trailing zeros the way "parseFloat" output reads: 1.5, not 1.50.
    let mut text = format!("{:.2}", rounded);
    while text.ends_with('0') {
        text.pop();
    }
    if text.ends_with('.') {
        text.pop();
    }
    format!("{} {}", text, UNITS[exponent])
}

/// Derived display tags: size bucket, kind, age bucket, extension family.
pub fn display_tags(file: &FileEntry, now: DateTime<Utc>) -> Vec<String> {
    let mut tags = Vec::new();

    if file.size > 50 * 1024 * 1024 {
        tags.push("large".to_string());
    } else if file.size < 1024 * 1024 {
        tags.push("small".to_string());
    } else {
        tags.push("medium".to_string());
    }

    tags.push(file.kind().label().to_string());

    let age_days = (now - file.uploaded_at).num_seconds() as f64 / 86_400.0;
    if age_days < 1.0 {
        tags.push("today".to_string());
    } else if age_days < 7.0 {
        tags.push("recent".to_string());
    } else if age_days > 30.0 {
        tags.push("old".to_string());
    }

    if let Some(ext) = file.extension() {
        if PHOTO_EXTENSIONS.contains(&ext.as_str()) {
            tags.push("photo".to_string());
        }
        if DOCUMENT_EXTENSIONS.contains(&ext.as_str()) {
            tags.push("document".to_string());
        }
        if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            tags.push("video".to_string());
        }
        if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
            tags.push("audio".to_string());
        }
    }

    let mut seen = std::collections::HashSet::new();
    tags.retain(|tag| seen.insert(tag.clone()));
    tags
}

/// Size bands for the structured filter, in decimal megabytes of 1024^2 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeBand {
    #[default]
    Any,
    /// < 10 MB
    Small,
    /// 10 MB to 100 MB
    Medium,
    /// > 100 MB
    Large,
}

impl SizeBand {
    pub fn from_label(label: &str) -> Option<SizeBand> {
        match label {
            "any" => Some(SizeBand::Any),
            "small" => Some(SizeBand::Small),
            "medium" => Some(SizeBand::Medium),
            "large" => Some(SizeBand::Large),
            _ => None,
        }
    }
}

/// Upload-date windows for the structured filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateRange {
    #[default]
    Any,
    Today,
    Week,
    Month,
}

impl DateRange {
    pub fn from_label(label: &str) -> Option<DateRange> {
        match label {
            "any" => Some(DateRange::Any),
            "today" => Some(DateRange::Today),
            "week" => Some(DateRange::Week),
            "month" => Some(DateRange::Month),
            _ => None,
        }
    }
}

/// The structured filter set. Every field defaults to "no constraint";
/// predicates are exact, never fuzzy.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileFilters {
    pub kind: Option<FileKind>,
    pub size: SizeBand,
    pub date: DateRange,
    pub extension: Option<String>,
}

impl FileFilters {
    pub fn is_default(&self) -> bool {
        self.kind.is_none()
            && self.size == SizeBand::Any
            && self.date == DateRange::Any
            && self.extension.is_none()
    }

    pub fn matches(&self, file: &FileEntry, now: DateTime<Utc>) -> bool {
        if let Some(kind) = self.kind {
            if file.kind() != kind {
                return false;
            }
        }

        if self.size != SizeBand::Any {
            let size_mb = file.size as f64 / (1024.0 * 1024.0);
            let ok = match self.size {
                SizeBand::Any => true,
                SizeBand::Small => size_mb <= 10.0,
                SizeBand::Medium => size_mb > 10.0 && size_mb <= 100.0,
                SizeBand::Large => size_mb > 100.0,
            };
            if !ok {
                return false;
            }
        }

        if self.date != DateRange::Any {
            let age_days = (now - file.uploaded_at).num_seconds() as f64 / 86_400.0;
            let ok = match self.date {
                DateRange::Any => true,
                DateRange::Today => age_days <= 1.0,
                DateRange::Week => age_days <= 7.0,
                DateRange::Month => age_days <= 30.0,
            };
            if !ok {
                return false;
            }
        }

        if let Some(ref wanted) = self.extension {
            match file.extension() {
                Some(ext) if ext == wanted.to_lowercase() => {}
                _ => return false,
            }
        }

        true
    }
}

/// Unique lowercased extensions present in the candidate set, sorted.
/// Extensions longer than 5 characters are treated as noise and skipped.
pub fn available_extensions(files: &[FileEntry]) -> Vec<String> {
    let mut extensions: Vec<String> = files
        .iter()
        .filter_map(|file| file.extension())
        .filter(|ext| ext.len() <= 5)
        .collect();
    extensions.sort();
    extensions.dedup();
    extensions
}
