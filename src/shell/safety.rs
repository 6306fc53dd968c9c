use crate::error::AppError;

/// Which interpreter a generated helper script targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptStyle {
    Batch,
    Posix,
}

impl ScriptStyle {
    pub fn native() -> Self {
        if cfg!(windows) {
            Self::Batch
        } else {
            Self::Posix
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Batch => "bat",
            Self::Posix => "sh",
        }
    }
}

// `"` ends a batch quoted argument and `%` expands inside one.
const BATCH_FORBIDDEN: &[&str] = &["\"", "%", "\n", "\r", "\0"];
const POSIX_FORBIDDEN: &[&str] = &["\n", "\r", "\0"];

/// Rejects paths that cannot be embedded safely in a helper script.
pub fn validate_script_path(path: &str, style: ScriptStyle) -> Result<(), AppError> {
    if path.is_empty() {
        return Err(AppError::General("path is empty".to_string()));
    }

    let forbidden = match style {
        ScriptStyle::Batch => BATCH_FORBIDDEN,
        ScriptStyle::Posix => POSIX_FORBIDDEN,
    };
    for pattern in forbidden {
        if path.contains(pattern) {
            return Err(AppError::General(format!(
                "path contains a character that cannot be quoted in a {} script: {pattern:?}",
                style.extension()
            )));
        }
    }

    Ok(())
}

/// Quotes a validated path for the given script style.
pub fn quote(path: &str, style: ScriptStyle) -> String {
    match style {
        ScriptStyle::Batch => format!("\"{path}\""),
        ScriptStyle::Posix => format!("'{}'", path.replace('\'', r"'\''")),
    }
}
