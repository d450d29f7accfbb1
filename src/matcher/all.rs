use log::debug;

use crate::context::{MatchContext, MatchMode};
use crate::digest::digest_matches;
use crate::fileid::FileId;
use crate::opener::open_cmnd;

use super::{intercept_ok, CmndMatcher, MatchRequest};

/// The `ALL` rule: any command is admissible.
///
/// Even here the digest list and the intercept guard apply, and a
/// descriptor is published when `fdexec` wants one. A nonexistent user
/// command is tolerated, a relaxation unique to `ALL`, but a file that
/// exists yet cannot be opened is suspicious and fails.
pub(crate) struct AllMatcher;

impl CmndMatcher for AllMatcher {
    fn matches(&self, req: &MatchRequest<'_>, ctx: &mut MatchContext) -> bool {
        let user_cmnd = ctx.user.cmnd.clone();
        let mut fd = None;

        if user_cmnd.contains('/') {
            let opened = open_cmnd(&user_cmnd, req.digests, &ctx.settings);
            let open_error = opened.is_err();
            fd = opened.unwrap_or_default();

            if ctx.mode == MatchMode::Inode {
                if let Some(sb) = FileId::for_cmnd(fd.as_ref(), &user_cmnd) {
                    if open_error {
                        debug!("{user_cmnd} exists but could not be opened");
                        return false;
                    }
                    if !intercept_ok(&user_cmnd, req, &ctx.settings, &sb) {
                        return false;
                    }
                }
            }
        }

        // No rule path to compare against; the digest applies to the
        // user's own command.
        if !digest_matches(fd.as_ref(), &user_cmnd, req.digests) {
            return false;
        }
        ctx.set_cmnd_fd(fd, req.pivot);
        // safe_cmnd stays untouched for ALL.
        true
    }
}
