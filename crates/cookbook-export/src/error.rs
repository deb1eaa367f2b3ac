/// Errors that can occur while writing output files.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to encode game data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to encode sprite sheet: {0}")]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
