use log::debug;

use crate::context::{MatchContext, MatchMode};
use crate::digest::digest_matches;
use crate::fileid::FileId;
use crate::filesystem::canon_path;
use crate::opener::open_cmnd;

use super::{intercept_ok, CmndMatcher, MatchRequest};

/// Matches a directory rule command (`D/`): any program directly inside
/// `D`, never in a subdirectory. Directory rules place no constraint on
/// arguments.
pub(crate) struct DirMatcher<'a> {
    pub dir: &'a str,
}

impl CmndMatcher for DirMatcher<'_> {
    fn matches(&self, req: &MatchRequest<'_>, ctx: &mut MatchContext) -> bool {
        command_matches_dir(self.dir, req, ctx)
    }
}

/// Shared with the glob strategy, whose expansions can contain
/// directory entries.
pub(crate) fn command_matches_dir(
    dir: &str,
    req: &MatchRequest<'_>,
    ctx: &mut MatchContext,
) -> bool {
    match ctx.mode {
        MatchMode::Inode => matches_inode(dir, req, ctx),
        MatchMode::Name => matches_name(dir, req, ctx),
    }
}

/// The rule directory holds a program with the user's basename and the
/// user's inode identity.
fn matches_inode(dir: &str, req: &MatchRequest<'_>, ctx: &mut MatchContext) -> bool {
    // Compare the canonicalized directories, if possible.
    if let (Some(user_dir), Some(resolved)) = (ctx.user.dir.as_deref(), canon_path(dir)) {
        if resolved != user_dir {
            return false;
        }
    }

    let path = join_dir(dir, &ctx.user.base);
    let fd = match open_cmnd(&path, req.digests, &ctx.settings) {
        Ok(fd) => fd,
        Err(err) => {
            debug!("unable to open {path}: {err}");
            return false;
        }
    };
    let Some(sb) = FileId::for_cmnd(fd.as_ref(), &path) else {
        return false;
    };
    if !intercept_ok(&path, req, &ctx.settings, &sb) {
        return false;
    }
    if let Some(user_stat) = ctx.user.stat {
        if !user_stat.same_file(&sb) {
            return false;
        }
    }
    if !digest_matches(fd.as_ref(), &path, req.digests) {
        return false;
    }
    ctx.safe_cmnd = Some(path);
    ctx.set_cmnd_fd(fd, req.pivot);
    true
}

/// Name mode: the user's command is the directory prefix plus exactly
/// one more component.
fn matches_name(dir: &str, req: &MatchRequest<'_>, ctx: &mut MatchContext) -> bool {
    let prefix = dir.trim_end_matches('/');
    let rest = ctx
        .user
        .cmnd
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('/'));
    let Some(rest) = rest else {
        return false;
    };
    if rest.is_empty() || rest.contains('/') {
        return false;
    }

    let cmnd = ctx.user.cmnd.clone();
    let fd = match open_cmnd(&cmnd, req.digests, &ctx.settings) {
        Ok(fd) => fd,
        Err(err) => {
            debug!("unable to open {cmnd}: {err}");
            return false;
        }
    };
    if !digest_matches(fd.as_ref(), &cmnd, req.digests) {
        return false;
    }
    // The user's path is the match; safe_cmnd stays untouched.
    ctx.set_cmnd_fd(fd, req.pivot);
    true
}

fn join_dir(dir: &str, base: &str) -> String {
    if dir.ends_with('/') {
        format!("{dir}{base}")
    } else {
        format!("{dir}/{base}")
    }
}
