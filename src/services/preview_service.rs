use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use image::RgbImage;

use crate::error::AppError;

const POINTS_PER_INCH: f32 = 72.0;

/// Rasterizes a single page of a PDF.
pub trait PageRenderer {
    /// Renders zero-based `page` of `path`, with `scale` 1.0 meaning 72 dpi.
    fn render_page(&self, path: &Path, page: u32, scale: f32) -> Result<RgbImage, AppError>;
}

pub struct PdftoppmRenderer {
    program: PathBuf,
    work_dir: PathBuf,
}

impl PdftoppmRenderer {
    pub fn new(work_dir: PathBuf) -> Self {
        Self::with_program(PathBuf::from("pdftoppm"), work_dir)
    }

    pub fn with_program(program: PathBuf, work_dir: PathBuf) -> Self {
        Self { program, work_dir }
    }
}

impl PageRenderer for PdftoppmRenderer {
    fn render_page(&self, path: &Path, page: u32, scale: f32) -> Result<RgbImage, AppError> {
        if !path.is_file() {
            return Err(AppError::Preview(format!(
                "file not found: {}",
                path.display()
            )));
        }

        let dpi = (POINTS_PER_INCH * scale).round().max(1.0) as u32;
        let first = (page + 1).to_string();
        let prefix = self
            .work_dir
            .join(format!("pdfhub_render_{}", uuid::Uuid::new_v4()));
        let output = prefix.with_extension("png");

        let status = Command::new(&self.program)
            .args(["-f", &first, "-l", &first, "-r", &dpi.to_string()])
            .args(["-png", "-singlefile"])
            .arg(path)
            .arg(&prefix)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| {
                AppError::Preview(format!(
                    "cannot run {}: {e}",
                    self.program.display()
                ))
            })?;

        if !status.success() {
            let _ = std::fs::remove_file(&output);
            return Err(AppError::Preview(format!(
                "{} failed on {} ({status})",
                self.program.display(),
                path.display()
            )));
        }

        let decoded = image::open(&output);
        let _ = std::fs::remove_file(&output);
        Ok(decoded?.to_rgb8())
    }
}

/// Largest size that fits within `max` keeping the aspect ratio. Never enlarges.
pub fn fit_within(width: u32, height: u32, max: (u32, u32)) -> (u32, u32) {
    let (max_w, max_h) = max;
    if width <= max_w && height <= max_h {
        return (width, height);
    }
    let ratio = f64::min(
        max_w as f64 / width as f64,
        max_h as f64 / height as f64,
    );
    let w = ((width as f64 * ratio).round() as u32).clamp(1, max_w.max(1));
    let h = ((height as f64 * ratio).round() as u32).clamp(1, max_h.max(1));
    (w, h)
}

pub fn render_preview(
    renderer: &dyn PageRenderer,
    path: &Path,
    scale: f32,
    max: (u32, u32),
) -> Result<RgbImage, AppError> {
    let page = renderer.render_page(path, 0, scale)?;
    let (w, h) = fit_within(page.width(), page.height(), max);
    if (w, h) == page.dimensions() {
        return Ok(page);
    }
    Ok(image::imageops::thumbnail(&page, w, h))
}
