//! Atomic no-clobber publishing of a finished file.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::conf::{C_PREFIX_TEMP_FILE, C_SUFFIX_TEMP_FILE};
use crate::path::{DestinationPathBuilder, derive_available_path};
use crate::spec::PublishError;
use crate::util::{parent_dir_or_dot, sync_parent_dir};

/// Publish `v_bytes` under the first free candidate name of `builder`.
///
/// The bytes are staged in a hidden temp file inside the destination
/// directory, synced, then renamed without replacing anything. A candidate
/// that appears between the existence check and the rename is skipped. On
/// error the temp file is removed and no destination file exists.
///
/// Returns the published path.
pub fn publish_bytes<B>(
    builder: &B,
    path_file_source: &Path,
    v_bytes: &[u8],
) -> Result<PathBuf, PublishError>
where
    B: DestinationPathBuilder + ?Sized,
{
    let path_first = builder.derive_candidate(path_file_source, 0);
    let path_dir_out = parent_dir_or_dot(&path_first).to_path_buf();
    if !path_dir_out.is_dir() {
        return Err(PublishError::DestinationDirMissing(path_dir_out));
    }

    let mut file_tmp = stage_temp_file(&path_dir_out, v_bytes)?;
    debug!(path = %file_tmp.path().display(), n_bytes = v_bytes.len(), "staged temp file");

    let mut n_attempt_next = 0;
    loop {
        let (n_attempt, path_candidate) =
            derive_available_path(builder, path_file_source, n_attempt_next)?;

        match file_tmp.persist_noclobber(&path_candidate) {
            Ok(_) => {
                let _ = sync_parent_dir(&path_candidate);
                info!(path = %path_candidate.display(), n_attempt, "published file");
                return Ok(path_candidate);
            }
            Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => {
                debug!(
                    path = %path_candidate.display(),
                    "destination candidate claimed concurrently"
                );
                file_tmp = err.file;
                n_attempt_next = n_attempt + 1;
            }
            Err(err) => return Err(derive_io_error(&path_candidate, err.error)),
        }
    }
}

fn stage_temp_file(path_dir_out: &Path, v_bytes: &[u8]) -> Result<NamedTempFile, PublishError> {
    let mut file_tmp = tempfile::Builder::new()
        .prefix(C_PREFIX_TEMP_FILE)
        .suffix(C_SUFFIX_TEMP_FILE)
        .tempfile_in(path_dir_out)
        .map_err(|err| derive_io_error(path_dir_out, err))?;

    let path_tmp = file_tmp.path().to_path_buf();
    file_tmp
        .write_all(v_bytes)
        .map_err(|err| derive_io_error(&path_tmp, err))?;
    file_tmp
        .flush()
        .map_err(|err| derive_io_error(&path_tmp, err))?;
    file_tmp
        .as_file()
        .sync_all()
        .map_err(|err| derive_io_error(&path_tmp, err))?;
    Ok(file_tmp)
}

fn derive_io_error(path: &Path, err: io::Error) -> PublishError {
    PublishError::Io {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::path::SplitSuffixPathBuilder;
    use crate::spec::SpecDestinationOptions;

    fn list_file_names(path_dir: &Path) -> Vec<String> {
        let mut l_names: Vec<String> = fs::read_dir(path_dir)
            .expect("read dir")
            .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
            .collect();
        l_names.sort();
        l_names
    }

    #[test]
    fn publish_writes_first_candidate() {
        let tmp = tempfile::tempdir().expect("temp dir");
        let path_src = tmp.path().join("report.xlsx");

        let builder = SplitSuffixPathBuilder::default();
        let path_out = publish_bytes(&builder, &path_src, b"payload").expect("publish");
        assert_eq!(path_out, tmp.path().join("report_分頁.xlsx"));
        assert_eq!(fs::read(&path_out).expect("read"), b"payload");
        assert_eq!(list_file_names(tmp.path()), vec!["report_分頁.xlsx"]);
    }

    #[test]
    fn publish_never_overwrites_existing_outputs() {
        let tmp = tempfile::tempdir().expect("temp dir");
        let path_src = tmp.path().join("report.xlsx");
        fs::write(tmp.path().join("report_分頁.xlsx"), b"old").expect("write");

        let builder = SplitSuffixPathBuilder::default();
        let path_out_1 = publish_bytes(&builder, &path_src, b"one").expect("publish");
        let path_out_2 = publish_bytes(&builder, &path_src, b"two").expect("publish");

        assert_eq!(path_out_1, tmp.path().join("report_分頁_1.xlsx"));
        assert_eq!(path_out_2, tmp.path().join("report_分頁_2.xlsx"));
        assert_eq!(fs::read(tmp.path().join("report_分頁.xlsx")).expect("read"), b"old");
        assert_eq!(fs::read(&path_out_2).expect("read"), b"two");
    }

    #[test]
    fn publish_into_missing_directory_fails_cleanly() {
        let tmp = tempfile::tempdir().expect("temp dir");
        let builder = SplitSuffixPathBuilder::new(SpecDestinationOptions {
            dir_out: Some(tmp.path().join("missing")),
            ..Default::default()
        });

        let err = publish_bytes(&builder, &tmp.path().join("report.xlsx"), b"x").unwrap_err();
        assert!(matches!(err, PublishError::DestinationDirMissing(_)), "{err}");
        assert!(list_file_names(tmp.path()).is_empty());
    }

    struct FixedPathBuilder {
        path: PathBuf,
    }

    impl DestinationPathBuilder for FixedPathBuilder {
        fn derive_candidate(&self, _path_file_source: &Path, _n_attempt: usize) -> PathBuf {
            self.path.clone()
        }
    }

    #[test]
    fn publish_gives_up_and_removes_temp_file() {
        let tmp = tempfile::tempdir().expect("temp dir");
        let path_taken = tmp.path().join("taken.xlsx");
        fs::write(&path_taken, b"keep").expect("write");

        let builder = FixedPathBuilder {
            path: path_taken.clone(),
        };
        let err = publish_bytes(&builder, &tmp.path().join("src.xlsx"), b"new").unwrap_err();
        assert!(matches!(err, PublishError::AttemptsExhausted { .. }), "{err}");
        assert_eq!(fs::read(&path_taken).expect("read"), b"keep");
        assert_eq!(list_file_names(tmp.path()), vec!["taken.xlsx"]);
    }
}
