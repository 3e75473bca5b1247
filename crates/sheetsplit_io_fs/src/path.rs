//! Destination file naming.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::conf::{C_EXTENSION_OUTPUT_DEFAULT, N_ATTEMPTS_DESTINATION_MAX};
use crate::spec::{PublishError, SpecDestinationOptions};
use crate::util::parent_dir_or_dot;

/// Maps a source file and an attempt number to a candidate destination path.
///
/// Attempt `0` is the preferred name; later attempts are tried in order when
/// earlier candidates already exist. All candidates for one source must share
/// a directory.
pub trait DestinationPathBuilder {
    /// Candidate path for `n_attempt` (0-based).
    fn derive_candidate(&self, path_file_source: &Path, n_attempt: usize) -> PathBuf;
}

/// `dir/name_分頁.ext`, then `dir/name_分頁_1.ext`, `dir/name_分頁_2.ext`, ...
#[derive(Debug, Clone, Default)]
pub struct SplitSuffixPathBuilder {
    options: SpecDestinationOptions,
}

impl SplitSuffixPathBuilder {
    pub fn new(options: SpecDestinationOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SpecDestinationOptions {
        &self.options
    }

    fn derive_extension(&self, path_file_source: &Path) -> OsString {
        if let Some(ext) = &self.options.extension {
            return OsString::from(ext.trim_start_matches('.'));
        }
        match path_file_source.extension() {
            Some(ext) if ext.eq_ignore_ascii_case(C_EXTENSION_OUTPUT_DEFAULT) => ext.to_os_string(),
            _ => OsString::from(C_EXTENSION_OUTPUT_DEFAULT),
        }
    }
}

impl DestinationPathBuilder for SplitSuffixPathBuilder {
    fn derive_candidate(&self, path_file_source: &Path, n_attempt: usize) -> PathBuf {
        let path_dir_out = match &self.options.dir_out {
            Some(path_dir) => path_dir.as_path(),
            None => parent_dir_or_dot(path_file_source),
        };

        let mut c_name = path_file_source
            .file_stem()
            .map(|stem| stem.to_os_string())
            .unwrap_or_default();
        c_name.push(&self.options.suffix);
        if n_attempt > 0 {
            c_name.push(format!("_{n_attempt}"));
        }
        c_name.push(".");
        c_name.push(self.derive_extension(path_file_source));

        path_dir_out.join(c_name)
    }
}

/// First candidate of `builder`, from attempt `n_attempt_start` on, that does
/// not exist yet. Returns the attempt number with the path.
///
/// Only a snapshot: use [`crate::publish::publish_bytes`] to actually claim a
/// name without racing other writers.
pub fn derive_available_path<B>(
    builder: &B,
    path_file_source: &Path,
    n_attempt_start: usize,
) -> Result<(usize, PathBuf), PublishError>
where
    B: DestinationPathBuilder + ?Sized,
{
    for n_attempt in n_attempt_start..N_ATTEMPTS_DESTINATION_MAX {
        let path_candidate = builder.derive_candidate(path_file_source, n_attempt);
        let if_exists = path_candidate.try_exists().map_err(|err| PublishError::Io {
            path: path_candidate.clone(),
            message: err.to_string(),
        })?;
        if !if_exists {
            return Ok((n_attempt, path_candidate));
        }
        debug!(path = %path_candidate.display(), "destination candidate taken");
    }
    Err(PublishError::AttemptsExhausted {
        path_first: builder.derive_candidate(path_file_source, 0),
        n_attempts: N_ATTEMPTS_DESTINATION_MAX,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_follow_suffix_then_counter() {
        let builder = SplitSuffixPathBuilder::default();
        let path_src = Path::new("/data/report.xlsx");
        assert_eq!(
            builder.derive_candidate(path_src, 0),
            PathBuf::from("/data/report_分頁.xlsx")
        );
        assert_eq!(
            builder.derive_candidate(path_src, 1),
            PathBuf::from("/data/report_分頁_1.xlsx")
        );
        assert_eq!(
            builder.derive_candidate(path_src, 12),
            PathBuf::from("/data/report_分頁_12.xlsx")
        );
    }

    #[test]
    fn non_xlsx_sources_produce_xlsx() {
        let builder = SplitSuffixPathBuilder::default();
        assert_eq!(
            builder.derive_candidate(Path::new("old.xls"), 0),
            PathBuf::from("./old_分頁.xlsx")
        );
        assert_eq!(
            builder.derive_candidate(Path::new("/d/Book.XLSX"), 0),
            PathBuf::from("/d/Book_分頁.XLSX")
        );
        assert_eq!(
            builder.derive_candidate(Path::new("/d/a.b.ods"), 2),
            PathBuf::from("/d/a.b_分頁_2.xlsx")
        );
    }

    #[test]
    fn options_override_directory_suffix_and_extension() {
        let builder = SplitSuffixPathBuilder::new(SpecDestinationOptions {
            suffix: "_split".to_string(),
            dir_out: Some(PathBuf::from("/out")),
            extension: Some(".xlsm".to_string()),
        });
        assert_eq!(
            builder.derive_candidate(Path::new("/in/sales.xlsx"), 0),
            PathBuf::from("/out/sales_split.xlsm")
        );
    }

    #[test]
    fn available_path_skips_existing_candidates() {
        let tmp = tempfile::tempdir().expect("temp dir");
        let path_src = tmp.path().join("report.xlsx");
        std::fs::write(tmp.path().join("report_分頁.xlsx"), b"x").expect("write");
        std::fs::write(tmp.path().join("report_分頁_1.xlsx"), b"x").expect("write");

        let builder = SplitSuffixPathBuilder::default();
        let (n_attempt, path_free) = derive_available_path(&builder, &path_src, 0).expect("free");
        assert_eq!(n_attempt, 2);
        assert_eq!(path_free, tmp.path().join("report_分頁_2.xlsx"));

        let (n_attempt, path_free) = derive_available_path(&builder, &path_src, 3).expect("free");
        assert_eq!(n_attempt, 3);
        assert_eq!(path_free, tmp.path().join("report_分頁_3.xlsx"));
    }
}
