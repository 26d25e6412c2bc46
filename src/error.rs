use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading, transforming or writing assets
#[derive(Error, Debug)]
pub enum Error {
    #[error("Input image not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    #[error("Required imaging capability unavailable: {0}")]
    DependencyMissing(String),

    #[error("Dimension mismatch: expected {}x{}, found {}x{}", expected.0, expected.1, found.0, found.1)]
    DimensionMismatch {
        expected: (u32, u32),
        found: (u32, u32),
    },

    #[error("Transform failed: {0}")]
    TransformFailure(String),

    #[error("Invalid colour: {0}")]
    InvalidColor(String),

    #[error("Invalid config file {}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to decode {}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to encode {}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("IO error with {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
