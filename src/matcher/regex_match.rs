use log::warn;
use regex::Regex;

use crate::context::MatchContext;

use super::{absolute_user_cmnd, args::command_args_match, open_verify_publish};
use super::{CmndMatcher, MatchRequest};

/// Compile and apply an anchored pattern. Compile failures are reported
/// and treated as a non-match; policy evaluation must not abort on a
/// bad pattern.
pub(crate) fn regex_matches(pattern: &str, input: &str) -> bool {
    match Regex::new(pattern) {
        Ok(re) => re.is_match(input),
        Err(err) => {
            warn!("unable to compile regular expression \"{pattern}\": {err}");
            false
        }
    }
}

/// Matches rule commands of the form `^…$` against the user's absolute
/// path.
pub(crate) struct RegexMatcher<'a> {
    pub pattern: &'a str,
}

impl CmndMatcher for RegexMatcher<'_> {
    fn matches(&self, req: &MatchRequest<'_>, ctx: &mut MatchContext) -> bool {
        let Some(cmnd) = absolute_user_cmnd(&ctx.user) else {
            return false;
        };
        if !regex_matches(self.pattern, &cmnd) {
            return false;
        }
        if !command_args_match(req.rule, req.args, &ctx.user) {
            return false;
        }
        // The user's path is the match; safe_cmnd stays untouched.
        open_verify_publish(&cmnd, req, ctx)
    }
}
