use std::fs::{self, File, Metadata};
use std::io;
use std::os::unix::fs::MetadataExt;

use log::debug;

/// The fields of a stat record the matcher consults: the `(device,
/// inode)` identity of a program plus its mode bits.
///
/// Matching by identity instead of by path string defeats symlink and
/// rename races between the policy decision and the exec.
#[derive(Clone, Copy, Debug)]
pub struct FileId {
    pub dev: u64,
    pub ino: u64,
    pub mode: u32,
}

impl FileId {
    pub fn from_metadata(md: &Metadata) -> Self {
        Self {
            dev: md.dev(),
            ino: md.ino(),
            mode: md.mode(),
        }
    }

    pub fn from_path(path: &str) -> io::Result<Self> {
        fs::metadata(path).map(|md| Self::from_metadata(&md))
    }

    /// Stat by descriptor when one is open, else by path. `None` if the
    /// file cannot be statted, which callers treat as a non-match.
    pub(crate) fn for_cmnd(fd: Option<&File>, path: &str) -> Option<Self> {
        let md = match fd {
            Some(file) => file.metadata(),
            None => fs::metadata(path),
        };
        match md {
            Ok(md) => Some(Self::from_metadata(&md)),
            Err(err) => {
                debug!("unable to stat {path}: {err}");
                None
            }
        }
    }

    /// Whether both records name the same filesystem object.
    pub fn same_file(&self, other: &FileId) -> bool {
        self.dev == other.dev && self.ino == other.ino
    }

    /// Whether the setuid or setgid bit is set.
    pub fn is_setid(&self) -> bool {
        self.mode & (libc::S_ISUID | libc::S_ISGID) as u32 != 0
    }
}
