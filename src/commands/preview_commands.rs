use std::path::{Path, PathBuf};

use crate::error::AppError;
use crate::services::{file_service, preview_service};
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewInfo {
    pub source: String,
    pub image_path: PathBuf,
    pub width: u32,
    pub height: u32,
}

fn ensure_indexed(state: &AppState, path: &str) -> Result<(), AppError> {
    if state.sync.folder_of(path).is_none() {
        return Err(AppError::General(format!("not an indexed file: {path}")));
    }
    Ok(())
}

/// Renders the first page of an indexed file and writes it as PNG to the
/// preview slot in the config directory. Failures are meant to be shown in
/// place of the preview; they never touch the index.
pub fn preview_file(state: &AppState, path: &str) -> Result<PreviewInfo, AppError> {
    ensure_indexed(state, path)?;

    let max = (state.config.preview_max_width, state.config.preview_max_height);
    let image = preview_service::render_preview(
        state.renderer.as_ref(),
        Path::new(path),
        state.config.preview_scale,
        max,
    )
    .map_err(|e| {
        tracing::warn!(path, error = %e, "preview failed");
        e
    })?;

    let image_path = state.paths.preview_file();
    image.save(&image_path)?;
    tracing::debug!(path, width = image.width(), height = image.height(), "preview rendered");

    Ok(PreviewInfo {
        source: path.to_string(),
        image_path,
        width: image.width(),
        height: image.height(),
    })
}

pub fn open_file(state: &AppState, path: &str) -> Result<(), AppError> {
    ensure_indexed(state, path)?;
    file_service::open_file(path)
}
