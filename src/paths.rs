//! Purpose: Canonical path resolution used as the identity of a JSON file.
//! Exports: `canonical_path`.
//! Role: Keep handle and pool path semantics aligned from one source.
//! Invariants: Result is absolute, `~`-expanded, and free of `.`/`..` components.
//! Invariants: Existing prefixes are resolved through symlinks; missing tails are kept lexically.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::core::error::{Result, map_io_error};

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .filter(|home| !home.is_empty())
        .map(PathBuf::from)
}

fn expand_home(path: &Path) -> PathBuf {
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(first)) if first == OsStr::new("~") => match home_dir() {
            Some(home) => home.join(components.as_path()),
            None => path.to_path_buf(),
        },
        _ => path.to_path_buf(),
    }
}

/// Resolves `path` to the absolute form used as a pool key.
///
/// The file itself does not need to exist: each prefix that exists on disk is
/// canonicalized and missing components are appended as written.
pub fn canonical_path(path: impl AsRef<Path>) -> Result<PathBuf> {
    let expanded = expand_home(path.as_ref());
    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        let cwd = std::env::current_dir()
            .map_err(|err| map_io_error(err, "failed to read current directory", &expanded))?;
        cwd.join(expanded)
    };

    // Every prefix is retried on disk: a `..` after a missing component can
    // land back on an existing directory whose children may be symlinks.
    let mut resolved = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => resolved.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            Component::Normal(name) => {
                resolved.push(name);
                if let Ok(real) = fs::canonicalize(&resolved) {
                    resolved = real;
                }
            }
        }
    }
    Ok(resolved)
}

/// Builds the sibling temp-file prefix for `path` (`.<name>.`), used by atomic writes.
pub(crate) fn temp_prefix(path: &Path) -> OsString {
    let mut prefix = OsString::from(".");
    prefix.push(path.file_name().unwrap_or(OsStr::new("singlejson")));
    prefix.push(".");
    prefix
}
