use std::fs;
use std::path::{Path, PathBuf};

use image::RgbImage;

use crate::config::{AppConfig, AppPaths};
use crate::error::AppError;
use crate::services::preview_service::PageRenderer;
use crate::state::AppState;

/// Empty directory under the system temp dir, wiped if it already existed.
pub fn fresh_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("pdfhub_test_{name}"));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

pub fn path_string(p: &Path) -> String {
    p.to_string_lossy().to_string()
}

/// Renderer that paints a blank page of a fixed size, or fails when `size` is `None`.
pub struct StubRenderer {
    pub size: Option<(u32, u32)>,
}

impl PageRenderer for StubRenderer {
    fn render_page(&self, path: &Path, _page: u32, _scale: f32) -> Result<RgbImage, AppError> {
        match self.size {
            Some((w, h)) => Ok(RgbImage::from_pixel(w, h, image::Rgb([250, 250, 250]))),
            None => Err(AppError::Preview(format!(
                "cannot render {}",
                path.display()
            ))),
        }
    }
}

/// State rooted at `<base>/config`, with a renderer that never succeeds.
pub fn test_state(base: &Path) -> AppState {
    test_state_with_renderer(base, StubRenderer { size: None })
}

pub fn test_state_with_renderer(base: &Path, renderer: StubRenderer) -> AppState {
    let paths = AppPaths::resolve(Some(&base.join("config"))).unwrap();
    AppState::new(AppConfig::default(), paths, Box::new(renderer)).unwrap()
}
