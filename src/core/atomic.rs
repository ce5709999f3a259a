// Temp-file-then-rename writers so readers never observe a partially written document.
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use tempfile::{Builder, NamedTempFile};

use crate::core::error::{Error, ErrorKind, Result, map_io_error};
use crate::paths::temp_prefix;

pub(crate) const DEFAULT_TMP_SUFFIX: &str = ".tmp";

pub(crate) fn write_atomic(path: &Path, bytes: &[u8], tmp_suffix: &str) -> Result<()> {
    let mut tmp = sibling_temp(path, tmp_suffix)?;
    tmp.write_all(bytes)
        .map_err(|err| map_io_error(err, "failed to write temp file", tmp.path()))?;
    persist(tmp, path)?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "atomic write");
    Ok(())
}

pub(crate) fn copy_atomic(src: &Path, dest: &Path) -> Result<()> {
    let mut source =
        File::open(src).map_err(|err| map_io_error(err, "failed to open default file", src))?;
    let mut tmp = sibling_temp(dest, DEFAULT_TMP_SUFFIX)?;
    let copied = io::copy(&mut source, tmp.as_file_mut())
        .map_err(|err| map_io_error(err, "failed to copy default file", src))?;
    persist(tmp, dest)?;
    tracing::debug!(
        src = %src.display(),
        dest = %dest.display(),
        bytes = copied,
        "atomic copy"
    );
    Ok(())
}

fn sibling_temp(path: &Path, tmp_suffix: &str) -> Result<NamedTempFile> {
    let dir = path.parent().ok_or_else(|| {
        Error::new(ErrorKind::FileAccess)
            .with_message("path has no parent directory")
            .with_path(path)
    })?;
    fs::create_dir_all(dir)
        .map_err(|err| map_io_error(err, "failed to create parent directory", dir))?;
    let prefix = temp_prefix(path);
    Builder::new()
        .prefix(&prefix)
        .suffix(tmp_suffix)
        .tempfile_in(dir)
        .map_err(|err| map_io_error(err, "failed to create temp file", dir))
}

// The temp file is removed on drop if the rename fails.
fn persist(tmp: NamedTempFile, path: &Path) -> Result<()> {
    tmp.as_file()
        .sync_all()
        .map_err(|err| map_io_error(err, "failed to sync temp file", tmp.path()))?;
    tmp.persist(path)
        .map_err(|err| map_io_error(err.error, "failed to replace file", path))?;
    Ok(())
}
