use std::env;
use std::fs::File;
use std::io;

use log::warn;
use nix::unistd::{chroot, fchdir};

/// A scoped change of filesystem root, so one policy decision can be
/// evaluated inside a rule's chroot.
///
/// Construction captures descriptors for the current root and working
/// directory before changing root; dropping the guard restores both.
/// Binding the restore to `Drop` means every exit path of a pivoted
/// match, including panics in test code, unwinds the pivot.
#[derive(Debug)]
pub struct PivotGuard {
    root: File,
    cwd: File,
}

impl PivotGuard {
    /// Change root to `new_root` and the working directory to `/`.
    ///
    /// On error nothing is changed: a root already switched when the
    /// working-directory change fails is switched back before
    /// returning.
    pub fn enter(new_root: &str) -> io::Result<Self> {
        let root = File::open("/")?;
        let cwd = File::open(".")?;
        chroot(new_root).map_err(errno_to_io)?;
        if let Err(err) = env::set_current_dir("/") {
            restore(&root, &cwd);
            return Err(err);
        }
        Ok(Self { root, cwd })
    }

    /// Descriptor for the pre-pivot root, for `*at` lookups that must
    /// escape the new root.
    pub(crate) fn saved_root(&self) -> &File {
        &self.root
    }
}

impl Drop for PivotGuard {
    fn drop(&mut self) {
        restore(&self.root, &self.cwd);
    }
}

/// Restore the root first, then the working directory.
fn restore(root: &File, cwd: &File) {
    if let Err(err) = fchdir(root).and_then(|()| chroot(".")) {
        warn!("unable to restore root directory: {err}");
    }
    if let Err(err) = fchdir(cwd) {
        warn!("unable to restore working directory: {err}");
    }
}

fn errno_to_io(err: nix::Error) -> io::Error {
    io::Error::from_raw_os_error(err as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Entering a chroot needs CAP_SYS_CHROOT; the success path is
    // covered by the root-gated integration test.
    #[test]
    fn enter_missing_root_fails_cleanly() {
        let before = env::current_dir().unwrap();
        assert!(PivotGuard::enter("/no/such/root").is_err());
        assert_eq!(env::current_dir().unwrap(), before);
    }
}
