//! Destination options and top-level error types.

use std::fmt;
use std::path::PathBuf;

use crate::conf::C_SUFFIX_SPLIT_DEFAULT;

////////////////////////////////////////////////////////////////////////////////
// #region StructsAndErrors

/// Input options for [`crate::path::SplitSuffixPathBuilder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecDestinationOptions {
    /// Text inserted between the source stem and the extension.
    pub suffix: String,
    /// Output directory; the source file's directory when `None`.
    pub dir_out: Option<PathBuf>,
    /// Output extension without the dot; derived from the source when `None`.
    pub extension: Option<String>,
}

impl Default for SpecDestinationOptions {
    fn default() -> Self {
        Self {
            suffix: C_SUFFIX_SPLIT_DEFAULT.to_string(),
            dir_out: None,
            extension: None,
        }
    }
}

/// "Publish failed" errors. When any of these is returned no destination
/// file was created and the staged temp file is gone.
#[derive(Debug)]
pub enum PublishError {
    /// Destination directory does not exist or is not a directory.
    DestinationDirMissing(PathBuf),
    /// Every candidate name up to the attempt limit already exists.
    AttemptsExhausted {
        /// First candidate tried.
        path_first: PathBuf,
        /// Number of candidates tried.
        n_attempts: usize,
    },
    /// Staging, syncing or renaming failed.
    Io {
        /// Path the failing operation targeted.
        path: PathBuf,
        /// Underlying IO error text.
        message: String,
    },
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DestinationDirMissing(path) => {
                write!(f, "Destination directory does not exist: {}", path.display())
            }
            Self::AttemptsExhausted {
                path_first,
                n_attempts,
            } => write!(
                f,
                "No free destination name after {n_attempts} attempts starting at {}",
                path_first.display()
            ),
            Self::Io { path, message } => {
                write!(f, "Failed to publish {}: {message}", path.display())
            }
        }
    }
}

impl std::error::Error for PublishError {}

// #endregion
////////////////////////////////////////////////////////////////////////////////
