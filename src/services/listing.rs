use std::cmp::Ordering;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Local};

use crate::error::{FsError, FsResult};

/// One entry of a directory listing.
#[derive(Debug, Clone)]
pub struct FileItem {
    pub name: String,
    pub is_directory: bool,
    pub size: u64,
    pub modified: DateTime<Local>,
}

impl FileItem {
    /// The synthetic ".." entry pointing at the parent directory.
    pub fn parent_entry() -> Self {
        Self {
            name: "..".to_string(),
            is_directory: true,
            size: 0,
            modified: Local::now(),
        }
    }

    pub fn is_parent(&self) -> bool {
        self.name == ".."
    }
}

/// Read one directory and return its sorted listing.
///
/// Ordering: ".." first (present iff `path` has a parent), then directories,
/// then files, each group case-insensitively by name. The listing is an
/// immutable snapshot; callers replace it wholesale, never patch it.
///
/// Entries whose metadata cannot be read (e.g. dangling symlinks racing a
/// concurrent delete) are skipped rather than failing the whole listing.
pub fn read(path: &Path) -> FsResult<Vec<FileItem>> {
    let entries = fs::read_dir(path).map_err(|e| FsError::classify(path, e))?;

    let mut items: Vec<FileItem> = entries
        .filter_map(|entry| {
            let entry = entry.ok()?;
            let name = entry.file_name().to_string_lossy().to_string();
            let metadata = entry.metadata().ok()?;
            let is_directory = metadata.is_dir();
            Some(FileItem {
                name,
                is_directory,
                size: if is_directory { 0 } else { metadata.len() },
                modified: metadata
                    .modified()
                    .ok()
                    .map(DateTime::<Local>::from)
                    .unwrap_or_else(Local::now),
            })
        })
        .collect();

    items.sort_by(compare);

    if path.parent().is_some() {
        items.insert(0, FileItem::parent_entry());
    }

    Ok(items)
}

fn compare(a: &FileItem, b: &FileItem) -> Ordering {
    match (a.is_directory, b.is_directory) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
    }
}
