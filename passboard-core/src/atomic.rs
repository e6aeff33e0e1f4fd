//! Tmp-file-and-rename writes, shared by the record store and the publisher.
//!
//! A write is staged into `<path>.passboard.tmp` next to its target and only
//! becomes visible on [`StagedFile::commit`]. Dropping an uncommitted stage
//! removes the tmp file, so a target is either fully replaced or untouched.

use std::path::{Path, PathBuf};

use crate::error::WriteError;

/// Suffix of the sibling file a write is staged in.
pub const TMP_SUFFIX: &str = ".passboard.tmp";

/// `<path>.passboard.tmp`.
pub fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(TMP_SUFFIX);
    path.with_file_name(name)
}

/// Content written to a tmp file but not yet renamed over its target.
#[derive(Debug)]
#[must_use = "a staged write is discarded unless committed"]
pub struct StagedFile {
    target: PathBuf,
    tmp: PathBuf,
    committed: bool,
}

impl StagedFile {
    /// Limit the staged file to its owner (mode 0600 on unix).
    pub fn restrict_to_owner(&self) -> Result<(), WriteError> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.tmp, std::fs::Permissions::from_mode(0o600))
                .map_err(|source| WriteError::new(&self.tmp, source))?;
        }
        Ok(())
    }

    /// Rename the staged content over the target.
    pub fn commit(mut self) -> Result<(), WriteError> {
        std::fs::rename(&self.tmp, &self.target).map_err(|source| WriteError::new(&self.target, source))?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = std::fs::remove_file(&self.tmp);
        }
    }
}

/// Stage `contents` for `target` in the default tmp sibling.
pub fn stage(target: &Path, contents: &[u8]) -> Result<StagedFile, WriteError> {
    stage_at(target, &tmp_path_for(target), contents)
}

/// Stage `contents` for `target` in an explicit tmp location. Parent
/// directories of `target` are created.
pub fn stage_at(target: &Path, tmp: &Path, contents: &[u8]) -> Result<StagedFile, WriteError> {
    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|source| WriteError::new(parent, source))?;
        }
    }
    let staged = StagedFile {
        target: target.to_path_buf(),
        tmp: tmp.to_path_buf(),
        committed: false,
    };
    std::fs::write(tmp, contents).map_err(|source| WriteError::new(tmp, source))?;
    Ok(staged)
}

/// Stage and commit in one step.
pub fn replace(target: &Path, contents: &[u8]) -> Result<(), WriteError> {
    stage(target, contents)?.commit()
}
