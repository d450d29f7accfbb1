use std::fs::{self, File, OpenOptions};
use std::io;
use std::os::fd::AsRawFd;
use std::os::unix::fs::{FileExt, OpenOptionsExt};

use log::debug;
use nix::fcntl::{fcntl, AtFlags, FcntlArg, FdFlag};
use nix::sys::stat::fstatat;

use crate::digest::Digest;
use crate::pivot::PivotGuard;
use crate::settings::{FdExec, Settings};

/// Open a candidate executable for digest verification and, when
/// enabled, descriptor-based execution.
///
/// Returns `Ok(None)` when no descriptor is needed: the caller will
/// exec by path. A permission error is retried execute-only, which is
/// enough for `fdexec`, but only when no digest has to be read.
/// Descriptors are opened close-on-exec.
pub(crate) fn open_cmnd(
    path: &str,
    digests: &[Digest],
    settings: &Settings,
) -> io::Result<Option<File>> {
    if settings.fdexec != FdExec::Always && digests.is_empty() {
        return Ok(None);
    }
    match OpenOptions::new()
        .read(true)
        .custom_flags(libc::O_NONBLOCK)
        .open(path)
    {
        Ok(file) => Ok(Some(file)),
        Err(err) if err.kind() == io::ErrorKind::PermissionDenied && digests.is_empty() => {
            OpenOptions::new()
                .read(true)
                .custom_flags(libc::O_PATH)
                .open(path)
                .map(Some)
                // Report the original error, not the fallback's.
                .map_err(|_| err)
        }
        Err(err) => Err(err),
    }
}

/// Whether the descriptor refers to a `#!` interpreter script.
pub(crate) fn is_script(file: &File) -> bool {
    let mut magic = [0u8; 2];
    matches!(file.read_at(&mut magic, 0), Ok(2) if magic == *b"#!")
}

/// Apply the descriptor-execution handoff rules to a descriptor that
/// passed all checks, returning what should be published as the
/// process-wide command descriptor.
///
/// Scripts need special care: the interpreter re-opens the program as
/// `/dev/fd/N`, so that path must exist (looked up under the pre-pivot
/// root when pivoted) and the descriptor must not be close-on-exec or
/// it is gone by the time the second name lookup happens.
pub(crate) fn exec_fd(
    fd: Option<File>,
    settings: &Settings,
    pivot: Option<&PivotGuard>,
) -> Option<File> {
    let file = fd?;
    if settings.fdexec == FdExec::Never {
        return None;
    }
    if is_script(&file) {
        if !dev_fd_exists(&file, pivot) {
            debug!(
                "no /dev/fd/{} entry, cannot exec a script by descriptor",
                file.as_raw_fd()
            );
            return None;
        }
        if let Err(err) = clear_cloexec(&file) {
            debug!("unable to clear close-on-exec: {err}");
        }
    }
    Some(file)
}

fn dev_fd_exists(file: &File, pivot: Option<&PivotGuard>) -> bool {
    match pivot {
        // Path relative to the saved pre-pivot root.
        Some(guard) => {
            let fdpath = format!("dev/fd/{}", file.as_raw_fd());
            fstatat(guard.saved_root(), fdpath.as_str(), AtFlags::empty()).is_ok()
        }
        None => fs::metadata(format!("/dev/fd/{}", file.as_raw_fd())).is_ok(),
    }
}

fn clear_cloexec(file: &File) -> nix::Result<()> {
    let flags = fcntl(file, FcntlArg::F_GETFD)?;
    let flags = FdFlag::from_bits_truncate(flags) & !FdFlag::FD_CLOEXEC;
    fcntl(file, FcntlArg::F_SETFD(flags))?;
    Ok(())
}
