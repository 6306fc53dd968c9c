use std::path::{Component, PathBuf};

pub fn normalize(path: &str) -> String {
    let mut normalized = path.trim().to_string();
    while (normalized.ends_with('/') || normalized.ends_with('\\')) && normalized.len() > 1 {
        if cfg!(windows) && normalized.len() == 3 && normalized.as_bytes()[1] == b':' {
            break;
        }
        normalized.pop();
    }
    normalized
}

/// Absolute form of `path`: relative input is joined onto the working
/// directory and `.`/`..` components are folded away. Symlinks are kept.
pub fn absolute(path: &str) -> std::io::Result<String> {
    let joined = std::path::absolute(normalize(path))?;
    let mut resolved = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            other => resolved.push(other),
        }
    }
    Ok(normalize(&resolved.to_string_lossy()))
}

/// Form used for prefix comparison: forward slashes, and case-folded on Windows.
fn comparable(path: &str) -> String {
    let unified = normalize(path).replace('\\', "/");
    if cfg!(windows) {
        unified.to_lowercase()
    } else {
        unified
    }
}

/// True when `path` is `root` itself or lives somewhere below it.
pub fn is_within_scope(path: &str, root: &str) -> bool {
    let path = comparable(path);
    let root = comparable(root);
    match path.strip_prefix(root.as_str()) {
        Some("") => true,
        Some(rest) => rest.starts_with('/') || root.ends_with('/'),
        None => false,
    }
}

/// Final path component, accepting either separator.
pub fn base_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}
