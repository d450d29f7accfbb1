use std::fs::File;

use crate::fileid::FileId;
use crate::filesystem::basename;
use crate::opener;
use crate::pivot::PivotGuard;
use crate::resolver::{CmndResolver, ResolveStatus};
use crate::settings::Settings;

/// How strategies establish that a rule path and the user's command
/// name the same program.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchMode {
    /// Compare `(device, inode)` identity on the live filesystem.
    Inode,
    /// Compare path strings only. Used by offline policy verification
    /// and fuzzing, where results must not depend on the host
    /// filesystem.
    Name,
}

/// The user's invocation, as resolved by the front end.
#[derive(Clone, Debug, Default)]
pub struct UserCommand {
    /// The command, an absolute path once resolution succeeded.
    pub cmnd: String,
    /// Final component of `cmnd`.
    pub base: String,
    /// Canonicalized parent directory of `cmnd`, when known.
    pub dir: Option<String>,
    /// The command's arguments as a single string; `None` if the user
    /// supplied none.
    pub args: Option<String>,
    /// Stat record of the resolved command, when it exists.
    pub stat: Option<FileId>,
    /// Chroot requested by the user on the command line.
    pub runchroot: Option<String>,
}

impl UserCommand {
    pub fn new(cmnd: impl Into<String>) -> Self {
        let cmnd = cmnd.into();
        let base = basename(&cmnd).to_string();
        Self {
            cmnd,
            base,
            ..Self::default()
        }
    }
}

/// Per-match output for the caller: where the command was found and how
/// resolution went, plus the intercept flag the caller set on the way
/// in.
#[derive(Clone, Debug, Default)]
pub struct CommandInfo {
    /// The matched path inside a rule-specified chroot, if any.
    pub cmnd_path: Option<String>,
    /// Stat snapshot accompanying `cmnd_path`.
    pub cmnd_stat: Option<FileId>,
    /// The caller is evaluating an intercepted child exec rather than
    /// the top-level invocation.
    pub intercepted: bool,
    /// Outcome of command resolution, updated when a rule chroot forces
    /// a re-resolution.
    pub status: ResolveStatus,
}

impl CommandInfo {
    pub fn intercepted(flag: bool) -> Self {
        Self {
            intercepted: flag,
            ..Self::default()
        }
    }
}

/// All state a match reads and publishes: the user's command, the
/// policy defaults, the match mode, and the trusted outputs
/// (`safe_cmnd` and the command descriptor).
///
/// Threading this through every call keeps the core reentrant; two
/// contexts never share descriptors or published paths.
pub struct MatchContext {
    pub user: UserCommand,
    pub settings: Settings,
    pub mode: MatchMode,
    /// The path string the caller will pass to exec, set by a
    /// successful non-`ALL` match.
    pub safe_cmnd: Option<String>,
    /// Descriptor for descriptor-based execution, when one was
    /// published.
    pub cmnd_fd: Option<File>,
    /// Re-locates the user's command after a rule-chroot pivot.
    pub resolver: Option<Box<dyn CmndResolver>>,
}

impl MatchContext {
    pub fn new(user: UserCommand, settings: Settings, mode: MatchMode) -> Self {
        Self {
            user,
            settings,
            mode,
            safe_cmnd: None,
            cmnd_fd: None,
            resolver: None,
        }
    }

    pub fn with_resolver(mut self, resolver: Box<dyn CmndResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Publish `fd` as the descriptor the caller will exec through.
    ///
    /// Any previously held descriptor is closed first; the handoff
    /// rules for scripts and the `fdexec` setting are applied by the
    /// opener.
    pub(crate) fn set_cmnd_fd(&mut self, fd: Option<File>, pivot: Option<&PivotGuard>) {
        drop(self.cmnd_fd.take());
        self.cmnd_fd = opener::exec_fd(fd, &self.settings, pivot);
    }
}
