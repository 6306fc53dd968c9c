#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Update error: {0}")]
    Update(String),

    #[error("Preview error: {0}")]
    Preview(String),

    #[error("{0}")]
    General(String),
}

impl AppError {
    /// Records the error at `error` level and hands it back unchanged.
    pub fn logged(self) -> Self {
        tracing::error!(error = %self, "operation failed");
        self
    }
}

impl From<ureq::Error> for AppError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, _) => AppError::Http(format!("HTTP {code}")),
            ureq::Error::Transport(t) => AppError::Http(t.to_string()),
        }
    }
}
