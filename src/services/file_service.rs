use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::AppError;

fn opener_command(path: &Path) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.args(["/C", "start", ""]).arg(path);
        c
    } else if cfg!(target_os = "macos") {
        let mut c = Command::new("open");
        c.arg(path);
        c
    } else {
        let mut c = Command::new("xdg-open");
        c.arg(path);
        c
    }
}

pub fn open_file(path: &str) -> Result<(), AppError> {
    let p = Path::new(path);
    if !p.is_file() {
        return Err(AppError::General(format!("file does not exist: {path}")));
    }

    opener_command(p)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| AppError::General(format!("failed to open {path}: {e}")))?;
    tracing::debug!(path, "opened with default application");
    Ok(())
}
