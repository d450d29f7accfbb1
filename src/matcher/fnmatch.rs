use globset::GlobBuilder;
use log::warn;

use crate::context::MatchContext;

use super::{absolute_user_cmnd, args::command_args_match, open_verify_publish};
use super::{CmndMatcher, MatchRequest};

/// POSIX `fnmatch(3)`-style matching. With `pathname` set, wildcards
/// and character classes never match a `/`, as with `FNM_PATHNAME`.
///
/// Bad patterns are reported and treated as a non-match.
pub(crate) fn fnmatch(pattern: &str, input: &str, pathname: bool) -> bool {
    match GlobBuilder::new(pattern)
        .literal_separator(pathname)
        .backslash_escape(true)
        .build()
    {
        Ok(glob) => glob.compile_matcher().is_match(input),
        Err(err) => {
            warn!("unable to compile pattern \"{pattern}\": {err}");
            false
        }
    }
}

/// Matches pattern rule commands without touching the filesystem for
/// expansion ("fast glob"). Cheaper than globbing, but a symlinked or
/// renamed path that still matches the pattern is accepted, so inode
/// identity is not enforced here.
pub(crate) struct FnmatchMatcher<'a> {
    pub pattern: &'a str,
}

impl CmndMatcher for FnmatchMatcher<'_> {
    fn matches(&self, req: &MatchRequest<'_>, ctx: &mut MatchContext) -> bool {
        let Some(cmnd) = absolute_user_cmnd(&ctx.user) else {
            return false;
        };
        if !fnmatch(self.pattern, &cmnd, true) {
            return false;
        }
        if !command_args_match(req.rule, req.args, &ctx.user) {
            return false;
        }
        // The user's path is the match; safe_cmnd stays untouched.
        open_verify_publish(&cmnd, req, ctx)
    }
}
