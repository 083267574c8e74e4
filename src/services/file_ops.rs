use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{FsError, FsResult};

/// Maximum recursion depth for directory copy to prevent stack overflow
const MAX_COPY_DEPTH: usize = 256;

/// Copy a file or directory tree to `dest`.
///
/// When `replace` is false and `dest` exists the copy is refused with
/// `AlreadyExists`; the engine retries with `replace` set after the user
/// confirms the overwrite, which removes the old destination first.
pub fn copy_entry(src: &Path, dest: &Path, replace: bool) -> FsResult<()> {
    guard_same_entry(src, dest)?;
    clear_destination(dest, replace)?;

    if src.is_dir() {
        let mut visited = HashSet::new();
        copy_dir_recursive(src, dest, &mut visited, 0)
    } else {
        fs::copy(src, dest).map_err(|e| FsError::classify(src, e))?;
        Ok(())
    }
}

/// Move a file or directory tree to `dest`.
///
/// Rename first; on EXDEV (cross-device) fall back to copy-then-delete.
pub fn move_entry(src: &Path, dest: &Path, replace: bool) -> FsResult<()> {
    guard_same_entry(src, dest)?;
    clear_destination(dest, replace)?;

    match fs::rename(src, dest) {
        Ok(_) => Ok(()),
        Err(e) if e.raw_os_error() == Some(libc::EXDEV) => {
            copy_entry(src, dest, false)?;
            delete_entry(src)
        }
        Err(e) => Err(FsError::classify(src, e)),
    }
}

/// Delete a file, directory tree, or symlink (the link itself, never its
/// target).
pub fn delete_entry(path: &Path) -> FsResult<()> {
    let metadata = fs::symlink_metadata(path).map_err(|e| FsError::classify(path, e))?;

    let result = if metadata.is_symlink() {
        fs::remove_file(path)
    } else if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    result.map_err(|e| FsError::classify(path, e))
}

/// Create a new directory. Refuses to touch an existing entry of any kind.
pub fn create_directory(path: &Path) -> FsResult<()> {
    if path.symlink_metadata().is_ok() {
        return Err(FsError::AlreadyExists(path.display().to_string()));
    }
    fs::create_dir(path).map_err(|e| FsError::classify(path, e))
}

/// Rename an entry within its directory.
pub fn rename_entry(old_path: &Path, new_path: &Path) -> FsResult<()> {
    if new_path.symlink_metadata().is_ok() {
        return Err(FsError::AlreadyExists(new_path.display().to_string()));
    }
    fs::rename(old_path, new_path).map_err(|e| FsError::classify(old_path, e))
}

/// Validate a user-supplied file or directory name.
pub fn validate_name(name: &str) -> FsResult<()> {
    if name.trim().is_empty() {
        return Err(FsError::InvalidName("name is empty".to_string()));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(FsError::InvalidName(
            "name may not contain path separators".to_string(),
        ));
    }
    if name.contains('\0') {
        return Err(FsError::InvalidName("name may not contain NUL".to_string()));
    }
    if name == "." || name == ".." {
        return Err(FsError::InvalidName(format!("`{}` is reserved", name)));
    }
    Ok(())
}

/// Refuse operations where source and destination resolve to the same entry.
fn guard_same_entry(src: &Path, dest: &Path) -> FsResult<()> {
    if dest.symlink_metadata().is_err() {
        return Ok(());
    }
    let resolved_src = src.canonicalize().map_err(|e| FsError::classify(src, e))?;
    let resolved_dest = dest.canonicalize().map_err(|e| FsError::classify(dest, e))?;
    if resolved_src == resolved_dest {
        return Err(FsError::InvalidName(
            "source and destination are the same entry".to_string(),
        ));
    }
    Ok(())
}

fn clear_destination(dest: &Path, replace: bool) -> FsResult<()> {
    if dest.symlink_metadata().is_err() {
        return Ok(());
    }
    if !replace {
        return Err(FsError::AlreadyExists(dest.display().to_string()));
    }
    delete_entry(dest)
}

/// Recursive copy with symlink-loop detection via canonicalized paths.
fn copy_dir_recursive(
    src: &Path,
    dest: &Path,
    visited: &mut HashSet<PathBuf>,
    depth: usize,
) -> FsResult<()> {
    if depth > MAX_COPY_DEPTH {
        return Err(FsError::Io(format!(
            "maximum directory depth ({}) exceeded, possible circular symlink",
            MAX_COPY_DEPTH
        )));
    }

    let canonical_src = src.canonicalize().unwrap_or_else(|_| src.to_path_buf());
    if !visited.insert(canonical_src) {
        return Err(FsError::Io(format!(
            "circular symlink detected: {}",
            src.display()
        )));
    }

    fs::create_dir_all(dest).map_err(|e| FsError::classify(dest, e))?;

    let entries = fs::read_dir(src).map_err(|e| FsError::classify(src, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| FsError::classify(src, e))?;
        let src_path = entry.path();
        let dest_path = dest.join(entry.file_name());

        let metadata =
            fs::symlink_metadata(&src_path).map_err(|e| FsError::classify(&src_path, e))?;

        if metadata.is_symlink() {
            copy_symlink(&src_path, &dest_path)?;
        } else if metadata.is_dir() {
            copy_dir_recursive(&src_path, &dest_path, visited, depth + 1)?;
        } else {
            fs::copy(&src_path, &dest_path).map_err(|e| FsError::classify(&src_path, e))?;
        }
    }

    Ok(())
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dest: &Path) -> FsResult<()> {
    let target = fs::read_link(src).map_err(|e| FsError::classify(src, e))?;
    std::os::unix::fs::symlink(&target, dest).map_err(|e| FsError::classify(dest, e))
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dest: &Path) -> FsResult<()> {
    // Best effort where the platform cannot recreate the link.
    if src.is_file() {
        fs::copy(src, dest)
            .map(|_| ())
            .map_err(|e| FsError::classify(src, e))
    } else {
        Ok(())
    }
}
