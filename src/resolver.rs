use std::env;
use std::fs;
use std::io;
use std::path::Path;

use faccess::{AccessMode, PathExt};
use log::debug;

use crate::fileid::FileId;
use crate::filesystem::canon_path;

/// Outcome of locating the user's command on disk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResolveStatus {
    /// Resolved to an executable regular file.
    Found,
    /// Nothing suitable on the search path.
    #[default]
    NotFound,
    /// An executable exists, but only via the current directory, which
    /// is not searched implicitly.
    NotFoundDot,
    /// The lookup itself failed.
    NotFoundError,
}

/// A located command: the fields the matcher re-seeds its context with.
#[derive(Clone, Debug, Default)]
pub struct Resolution {
    pub status: ResolveStatus,
    /// Absolute path of the command.
    pub cmnd: Option<String>,
    /// Canonicalized parent directory.
    pub dir: Option<String>,
    /// Stat snapshot of the command.
    pub stat: Option<FileId>,
}

/// Locates a command inside the current root.
///
/// The matcher invokes this again after pivoting into a rule-specified
/// chroot, where the original resolution no longer applies. Paths are
/// interpreted relative to the process root at call time, so a pivoted
/// resolver naturally searches the new root.
pub trait CmndResolver {
    fn resolve(&mut self, cmnd: &str) -> Resolution;
}

/// [`CmndResolver`] that walks a `PATH`-style list of directories.
#[derive(Clone, Debug, Default)]
pub struct PathResolver {
    path: Option<String>,
}

impl PathResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Search `path` instead of the `PATH` environment variable.
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }
}

impl CmndResolver for PathResolver {
    fn resolve(&mut self, cmnd: &str) -> Resolution {
        // A command containing a slash names the file directly.
        if cmnd.contains('/') {
            return match resolve_file(cmnd) {
                Ok(resolution) => resolution.unwrap_or_default(),
                Err(_) => Resolution {
                    status: ResolveStatus::NotFoundError,
                    ..Resolution::default()
                },
            };
        }

        let path = self
            .path
            .clone()
            .or_else(|| env::var("PATH").ok())
            .unwrap_or_default();
        for dir in path.split(':') {
            let candidate = if dir.is_empty() || dir == "." {
                // Never resolve via the current directory, but report
                // that the command would have been found there.
                format!("./{cmnd}")
            } else {
                format!("{}/{cmnd}", dir.trim_end_matches('/'))
            };
            match resolve_file(&candidate) {
                Ok(Some(resolution)) => {
                    if dir.is_empty() || dir == "." {
                        debug!("ignoring {cmnd} found via the current directory");
                        return Resolution {
                            status: ResolveStatus::NotFoundDot,
                            ..Resolution::default()
                        };
                    }
                    return resolution;
                }
                Ok(None) | Err(_) => continue,
            }
        }
        Resolution::default()
    }
}

/// Build a [`Resolution`] for `path` if it is an executable regular
/// file. `Ok(None)` means the path does not name one.
fn resolve_file(path: &str) -> io::Result<Option<Resolution>> {
    let md = match fs::metadata(path) {
        Ok(md) => md,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err),
    };
    if !md.is_file() || Path::new(path).access(AccessMode::EXECUTE).is_err() {
        return Ok(None);
    }
    let dir = match path.rsplit_once('/') {
        Some(("", _)) => Some("/".to_string()),
        Some((dir, _)) => canon_path(dir),
        None => None,
    };
    Ok(Some(Resolution {
        status: ResolveStatus::Found,
        cmnd: Some(path.to_string()),
        dir,
        stat: Some(FileId::from_metadata(&md)),
    }))
}
