use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Font extensions accepted by the collection tool
pub const SFNT_EXTENSIONS: [&str; 2] = ["ttf", "otf"];
/// Font extensions accepted by the glyph patcher
pub const PATCHABLE_EXTENSIONS: [&str; 3] = ["ttf", "otf", "ttc"];

/// Whether the path has one of the given extensions, ignoring case
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

fn collect_dir(dir: &Path, extensions: &[&str], found: &mut BTreeSet<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_dir(&path, extensions, found)?;
        } else if path.is_file() && has_extension(&path, extensions) {
            found.insert(fs::canonicalize(&path)?);
        }
    }
    Ok(())
}

/// Find font files among files and directories, recursing into directories.
///
/// Missing inputs are skipped with a warning. The result is deduplicated by
/// canonical path and sorted.
pub fn discover_fonts(inputs: &[PathBuf], extensions: &[&str]) -> Result<Vec<PathBuf>> {
    let mut found = BTreeSet::new();
    for input in inputs {
        if !input.exists() {
            log::warn!("Path not found: {}", input.display());
            continue;
        }
        if input.is_dir() {
            collect_dir(input, extensions, &mut found)?;
        } else if has_extension(input, extensions) {
            found.insert(fs::canonicalize(input)?);
        } else {
            log::debug!("Skipping {}", input.display());
        }
    }
    log::debug!("Discovered {} font files", found.len());
    Ok(found.into_iter().collect())
}

/// Create a directory if it doesn't exist
pub fn ensure_directory_exists(dir: &Path) -> Result<()> {
    if !dir.exists() {
        log::debug!("Directory {} does not exist. Creating it now.", dir.display());
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

/// Move a file, falling back to copy and delete across filesystems
pub fn safe_move_file(src: &Path, dest: &Path) -> Result<()> {
    match fs::rename(src, dest) {
        Ok(_) => Ok(()),
        Err(e) => {
            log::debug!("Rename failed for {}, trying copy+delete: {}", src.display(), e);
            fs::copy(src, dest)?;
            if let Err(e) = fs::remove_file(src) {
                // The copy landed, so the move still counts.
                log::warn!("Could not delete source file {} after copying: {}", src.display(), e);
            }
            Ok(())
        }
    }
}

/// Every regular file below `dir`
pub fn snapshot_files(dir: &Path) -> Result<BTreeSet<PathBuf>> {
    let mut files = BTreeSet::new();
    if !dir.is_dir() {
        return Ok(files);
    }
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            files.extend(snapshot_files(&path)?);
        } else if path.is_file() {
            files.insert(path);
        }
    }
    Ok(files)
}
