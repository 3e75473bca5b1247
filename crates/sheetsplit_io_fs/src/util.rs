//! Shared path helpers.

use std::fs::File;
use std::io;
use std::path::Path;

////////////////////////////////////////////////////////////////////////////////
// #region PathUtilities

/// Parent directory of `path`; `.` for bare relative file names.
pub(crate) fn parent_dir_or_dot(path: &Path) -> &Path {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

/// Flush directory metadata after a rename. Not supported on every platform.
pub(crate) fn sync_parent_dir(path: &Path) -> io::Result<()> {
    File::open(parent_dir_or_dot(path))?.sync_all()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
