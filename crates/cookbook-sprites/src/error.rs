use std::path::PathBuf;

/// Errors that can occur while building a sprite sheet.
#[derive(Debug, thiserror::Error)]
pub enum SpriteError {
    /// A sprite PNG exists but is not a readable image.
    #[error("error reading {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
