//! Path translation between the local view, the master's staging area and
//! HDFS URIs.
//!
//! Everything except [`resolve_absolute`] is a pure string transform.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Result, SyncError};

/// Scheme and fixed host alias every HDFS path is addressed with.
pub const HDFS_URI_PREFIX: &str = "hdfs://hdfs";

/// Root of the intermediate directories on the master.
pub const STAGING_ROOT: &str = "/tmp/hdfs-xchange";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StagingDirection {
    ToHdfs,
    FromHdfs,
}

impl StagingDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            StagingDirection::ToHdfs => "to-hdfs",
            StagingDirection::FromHdfs => "from-hdfs",
        }
    }
}

impl fmt::Display for StagingDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// `hdfs://hdfs` followed by the absolute path, verbatim.
pub fn to_distributed_uri(path: &Path) -> String {
    format!("{}{}", HDFS_URI_PREFIX, path_str(path))
}

/// Staging directory on the master for a transfer touching `target`.
///
/// The absolute target is appended as a string, so `/x/y` under `to-hdfs`
/// becomes `/tmp/hdfs-xchange/to-hdfs/x/y`.
pub fn staging_path(direction: StagingDirection, target: &Path) -> PathBuf {
    PathBuf::from(format!("{}/{}{}", STAGING_ROOT, direction, path_str(target)))
}

/// Render a directory with exactly one trailing slash, as the sync scripts
/// expect for both source and destination.
pub fn dir_arg(path: &Path) -> String {
    let mut rendered = path_str(path);
    if !rendered.ends_with('/') {
        rendered.push('/');
    }
    rendered
}

/// Make `path` absolute against the current directory.
///
/// Repeated and trailing separators and `.` components are dropped; `..` is
/// kept as written and symlinks are not followed. Paths that are not valid
/// UTF-8 are rejected, since every path ends up in a command argument.
pub fn resolve_absolute(path: &Path) -> Result<PathBuf> {
    if path.to_str().is_none() {
        return Err(SyncError::io(
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidData, "path is not valid UTF-8"),
        ));
    }

    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| SyncError::io(path, e))?
            .join(path)
    };

    Ok(absolute.components().collect())
}
