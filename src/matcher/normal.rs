use log::debug;

use crate::context::{MatchContext, MatchMode};
use crate::digest::digest_matches;
use crate::fileid::FileId;
use crate::filesystem::basename;
use crate::opener::open_cmnd;

use super::{args::command_args_match, intercept_ok, parent_dirs_match};
use super::{CmndMatcher, MatchRequest};

/// Matches a literal-path rule command.
///
/// In inode mode the rule's path and the user's command must name the
/// same filesystem object; the path string only decides when one of the
/// two does not exist. In name mode the comparison is the string alone.
pub(crate) struct NormalMatcher<'a> {
    pub path: &'a str,
}

impl CmndMatcher for NormalMatcher<'_> {
    fn matches(&self, req: &MatchRequest<'_>, ctx: &mut MatchContext) -> bool {
        match ctx.mode {
            MatchMode::Inode => self.matches_inode(req, ctx),
            MatchMode::Name => self.matches_name(req, ctx),
        }
    }
}

impl NormalMatcher<'_> {
    fn matches_inode(&self, req: &MatchRequest<'_>, ctx: &mut MatchContext) -> bool {
        // Cheap rejections first: basename, then canonical parent.
        if basename(self.path) != ctx.user.base {
            return false;
        }
        if !parent_dirs_match(self.path, &ctx.user) {
            return false;
        }

        let fd = match open_cmnd(self.path, req.digests, &ctx.settings) {
            Ok(fd) => fd,
            Err(err) => {
                debug!("unable to open {}: {err}", self.path);
                return false;
            }
        };

        let rule_stat = ctx
            .user
            .stat
            .and_then(|_| FileId::for_cmnd(fd.as_ref(), self.path));
        match (ctx.user.stat, rule_stat) {
            (Some(user_stat), Some(rule_stat)) => {
                if !intercept_ok(self.path, req, &ctx.settings, &rule_stat) {
                    return false;
                }
                if !user_stat.same_file(&rule_stat) {
                    return false;
                }
            }
            // Either side does not exist; fall back to the path string.
            _ => {
                if ctx.user.cmnd != self.path {
                    return false;
                }
            }
        }

        if !command_args_match(req.rule, req.args, &ctx.user) {
            return false;
        }
        if !digest_matches(fd.as_ref(), self.path, req.digests) {
            return false;
        }
        ctx.safe_cmnd = Some(self.path.to_string());
        ctx.set_cmnd_fd(fd, req.pivot);
        true
    }

    fn matches_name(&self, req: &MatchRequest<'_>, ctx: &mut MatchContext) -> bool {
        if ctx.user.cmnd != self.path {
            return false;
        }
        if !command_args_match(req.rule, req.args, &ctx.user) {
            return false;
        }
        let fd = match open_cmnd(self.path, req.digests, &ctx.settings) {
            Ok(fd) => fd,
            Err(err) => {
                debug!("unable to open {}: {err}", self.path);
                return false;
            }
        };
        if !digest_matches(fd.as_ref(), self.path, req.digests) {
            return false;
        }
        ctx.safe_cmnd = Some(self.path.to_string());
        ctx.set_cmnd_fd(fd, req.pivot);
        true
    }
}

#[cfg(test)]
mod tests {
    use crate::context::UserCommand;
    use crate::rule::{RuleArgs, RuleCommand};
    use crate::settings::Settings;

    use super::*;

    fn name_request<'a>(rule: &'a RuleCommand) -> MatchRequest<'a> {
        MatchRequest {
            rule,
            args: &RuleArgs::Any,
            digests: &[],
            intercepted: false,
            pivot: None,
        }
    }

    #[test]
    fn name_mode_is_string_equality() {
        let rule = RuleCommand::Literal("/bin/ls".into());
        let RuleCommand::Literal(path) = &rule else {
            unreachable!()
        };
        let matcher = NormalMatcher { path };

        let mut ctx = MatchContext::new(
            UserCommand::new("/bin/ls"),
            Settings::default(),
            MatchMode::Name,
        );
        assert!(matcher.matches(&name_request(&rule), &mut ctx));
        assert_eq!(ctx.safe_cmnd.as_deref(), Some("/bin/ls"));

        let mut ctx = MatchContext::new(
            UserCommand::new("/usr/bin/ls"),
            Settings::default(),
            MatchMode::Name,
        );
        assert!(!matcher.matches(&name_request(&rule), &mut ctx));
        assert!(ctx.safe_cmnd.is_none());
    }

    #[test]
    fn inode_mode_rejects_basename_mismatch() {
        let rule = RuleCommand::Literal("/bin/cat".into());
        let RuleCommand::Literal(path) = &rule else {
            unreachable!()
        };
        let mut ctx = MatchContext::new(
            UserCommand::new("/bin/ls"),
            Settings::default(),
            MatchMode::Inode,
        );
        assert!(!NormalMatcher { path }.matches(&name_request(&rule), &mut ctx));
    }
}
