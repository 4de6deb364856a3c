//! Directory listing with glob-style masks
//!
//! Used by asset loaders to find e.g. every `*.pal` file in a data directory.
//! Masks understand `*` (any run of characters) and `?` (one character);
//! everything else matches literally, ignoring case.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use regex::{Regex, RegexBuilder};
use thiserror::Error;

/// Status code reported for a missing directory (POSIX ENOENT)
pub const NOT_FOUND_CODE: i32 = 2;

#[derive(Debug, Error)]
pub enum ListFilesError {
    #[error("directory does not exist: {}", .0.display())]
    NotFound(PathBuf),
    #[error("error while listing {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("bad file mask {mask:?}: {source}")]
    Mask {
        mask: String,
        #[source]
        source: regex::Error,
    },
}

impl ListFilesError {
    /// Numeric status: ENOENT for a missing directory, otherwise the
    /// platform error code (or -1 when the platform gave none)
    pub fn code(&self) -> i32 {
        match self {
            ListFilesError::NotFound(_) => NOT_FOUND_CODE,
            ListFilesError::Io { source, .. } => source.raw_os_error().unwrap_or(-1),
            ListFilesError::Mask { .. } => -1,
        }
    }
}

/// Translate a glob mask into an anchored, case-insensitive regex
pub fn glob_to_regex(mask: &str) -> Result<Regex, regex::Error> {
    let mut pattern = String::with_capacity(mask.len() + 10);
    pattern.push('^');
    for c in mask.chars() {
        match c {
            '*' => pattern.push_str(".*"),
            '?' => pattern.push('.'),
            _ => pattern.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }
    pattern.push('$');
    RegexBuilder::new(&pattern).case_insensitive(true).build()
}

/// List regular files and symlinks in `directory` whose names match `mask`
///
/// Paths come back absolute (relative directories are resolved against the
/// current directory) and sorted.
pub fn list_files(directory: impl AsRef<Path>, mask: &str) -> Result<Vec<PathBuf>, ListFilesError> {
    let directory = directory.as_ref();
    if !directory.exists() {
        log::warn!("directory does not exist: {}", directory.display());
        return Err(ListFilesError::NotFound(directory.to_path_buf()));
    }
    let re = glob_to_regex(mask).map_err(|source| ListFilesError::Mask {
        mask: mask.to_string(),
        source,
    })?;
    let io_err = |source: io::Error| {
        log::warn!("error while listing {}: {}", directory.display(), source);
        ListFilesError::Io {
            path: directory.to_path_buf(),
            source,
        }
    };

    let base = if directory.is_absolute() {
        directory.to_path_buf()
    } else {
        std::env::current_dir().map_err(io_err)?.join(directory)
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(directory).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let file_type = entry.file_type().map_err(io_err)?;
        if !file_type.is_file() && !file_type.is_symlink() {
            continue;
        }
        let name = entry.file_name();
        if re.is_match(&name.to_string_lossy()) {
            files.push(base.join(name));
        }
    }
    files.sort();
    log::debug!(
        "{} file(s) matching {:?} in {}",
        files.len(),
        mask,
        directory.display()
    );
    Ok(files)
}
