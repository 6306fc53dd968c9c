use std::path::Path;

pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(extension))
        .unwrap_or(false)
}

/// Recursively collects files under `folder` with the tracked extension.
///
/// Best effort: entries that cannot be read are skipped. The result is sorted
/// by full path and free of duplicates. A missing `folder` yields an empty list.
pub fn scan(folder: &Path, extension: &str) -> Vec<String> {
    let mut files: Vec<String> = walkdir::WalkDir::new(folder)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!(folder = %folder.display(), error = %e, "skipping unreadable entry");
                None
            }
        })
        .filter(|entry| {
            entry.file_type().is_file() || (entry.path_is_symlink() && entry.path().is_file())
        })
        .filter(|entry| has_extension(entry.path(), extension))
        .map(|entry| entry.path().to_string_lossy().to_string())
        .collect();

    files.sort();
    files.dedup();
    files
}
