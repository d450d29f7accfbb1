/// When the matcher should hand the caller an open descriptor for
/// descriptor-based execution (`fexecve`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FdExec {
    /// Always open the command and publish the descriptor.
    Always,
    /// Only keep a descriptor when a digest check required opening the
    /// file anyway.
    #[default]
    DigestOnly,
    /// Never publish a descriptor; the caller execs by path.
    Never,
}

/// Policy defaults consumed by the matching core.
///
/// These mirror the defaults store of the enclosing policy engine; the
/// core only reads them.
#[derive(Clone, Debug)]
pub struct Settings {
    /// Descriptor-based execution policy.
    pub fdexec: FdExec,

    /// Match patterns with fnmatch instead of expanding them against
    /// the filesystem. Faster, but forgoes inode identity checks.
    pub fast_glob: bool,

    /// Allow intercepted child processes to exec setuid/setgid
    /// programs.
    pub intercept_allow_setid: bool,

    /// Global chroot applied when neither the user nor the rule
    /// specifies one. The value `"*"` means "any" and is ignored here.
    pub runchroot: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fdexec: FdExec::default(),
            fast_glob: false,
            intercept_allow_setid: false,
            runchroot: None,
        }
    }
}
