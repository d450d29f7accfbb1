//! Deciding whether a user-invoked command is permitted by one policy
//! rule.
//!
//! The dispatcher reconciles chroot constraints, pivots when needed,
//! and hands the decision to the strategy for the rule command's shape.
//! Strategies publish the trusted path (`safe_cmnd`) and the command
//! descriptor through the [`MatchContext`] only after every check has
//! passed.

mod all;
mod args;
mod dir;
mod fnmatch;
mod glob_match;
mod normal;
mod regex_match;

use std::mem;

use log::debug;

use crate::context::{CommandInfo, MatchContext, MatchMode, UserCommand};
use crate::digest::Digest;
use crate::fileid::FileId;
use crate::filesystem::canon_path;
use crate::opener::open_cmnd;
use crate::pivot::PivotGuard;
use crate::resolver::ResolveStatus;
use crate::rule::{PseudoCommand, RuleArgs, RuleCommand};
use crate::settings::Settings;

use self::all::AllMatcher;
use self::args::command_args_match;
use self::dir::DirMatcher;
use self::fnmatch::FnmatchMatcher;
use self::glob_match::GlobMatcher;
use self::normal::NormalMatcher;
use self::regex_match::RegexMatcher;

/// Everything a strategy needs besides the context: the rule's argument
/// pattern and digest list, the intercept flag, and the pivot frame.
pub(crate) struct MatchRequest<'a> {
    pub rule: &'a RuleCommand,
    pub args: &'a RuleArgs,
    pub digests: &'a [Digest],
    pub intercepted: bool,
    pub pivot: Option<&'a PivotGuard>,
}

/// One command-matching strategy.
trait CmndMatcher {
    fn matches(&self, req: &MatchRequest<'_>, ctx: &mut MatchContext) -> bool;
}

/// Decide whether the user's command is admissible under the rule.
///
/// On success the trusted path is published in `ctx.safe_cmnd` (except
/// for `ALL` and pattern rules, where the user's own path already is
/// the match) and, subject to the `fdexec` setting, an open descriptor
/// in `ctx.cmnd_fd`. On failure neither is touched. The process root
/// and working directory are restored on every path.
pub fn command_matches(
    ctx: &mut MatchContext,
    rule_cmnd: &RuleCommand,
    rule_args: &RuleArgs,
    runchroot: Option<&str>,
    mut info: Option<&mut CommandInfo>,
    digests: &[Digest],
) -> bool {
    let intercepted = info.as_deref().map_or(false, |info| info.intercepted);
    let mut reset_cmnd = false;

    // Reconcile the rule's chroot with the user's and the global
    // default.
    let runchroot = if let Some(user_chroot) = ctx.user.runchroot.clone() {
        match runchroot {
            Some(rule_chroot) if rule_chroot != "*" && rule_chroot != user_chroot => {
                debug!(
                    "rule chroot {rule_chroot} conflicts with user-requested chroot {user_chroot}"
                );
                return false;
            }
            _ => Some(user_chroot),
        }
    } else if runchroot.is_none() {
        ctx.settings.runchroot.clone().filter(|chroot| chroot != "*")
    } else {
        // Rule-specific chroot: the user's command must be re-resolved
        // inside it.
        reset_cmnd = true;
        runchroot.map(String::from)
    };

    let pivot = match &runchroot {
        Some(new_root) => match PivotGuard::enter(new_root) {
            Ok(guard) => Some(guard),
            Err(err) => {
                debug!("unable to change root to {new_root}: {err}");
                return false;
            }
        },
        None => None,
    };

    let mut saved_user = None;
    if reset_cmnd {
        saved_user = Some((ctx.user.cmnd.clone(), ctx.user.stat));
        let status = resolve_in_root(ctx);
        if status != ResolveStatus::Found {
            saved_user = None;
        }
        if let Some(info) = info.as_deref_mut() {
            info.status = status;
        }
    }

    let req = MatchRequest {
        rule: rule_cmnd,
        args: rule_args,
        digests,
        intercepted,
        pivot: pivot.as_ref(),
    };
    let verdict = match rule_cmnd {
        RuleCommand::All => AllMatcher.matches(&req, ctx),
        RuleCommand::Regex(pattern) => RegexMatcher { pattern }.matches(&req, ctx),
        RuleCommand::Pseudo(kind) => PseudoMatcher { kind: *kind }.matches(&req, ctx),
        RuleCommand::Pattern(pattern) => {
            if ctx.mode == MatchMode::Name || ctx.settings.fast_glob {
                FnmatchMatcher { pattern }.matches(&req, ctx)
            } else {
                GlobMatcher { pattern }.matches(&req, ctx)
            }
        }
        RuleCommand::Directory(dir) => DirMatcher { dir }.matches(&req, ctx),
        RuleCommand::Literal(path) => NormalMatcher { path }.matches(&req, ctx),
    };

    // Restore root and working directory before touching user state.
    drop(pivot);

    // Put back the pre-pivot command; the caller gets the pivoted one
    // through `info` for later execution.
    if let Some((saved_cmnd, saved_stat)) = saved_user {
        let pivoted_cmnd = mem::replace(&mut ctx.user.cmnd, saved_cmnd);
        let pivoted_stat = mem::replace(&mut ctx.user.stat, saved_stat);
        if let Some(info) = info {
            info.cmnd_path = Some(pivoted_cmnd);
            info.cmnd_stat = pivoted_stat;
        }
    }

    debug!(
        "user command \"{}{}{}\" {} rule command \"{}\"{}{}",
        ctx.user.cmnd,
        if ctx.user.args.is_some() { " " } else { "" },
        ctx.user.args.as_deref().unwrap_or(""),
        if verdict { "matches" } else { "does not match" },
        rule_cmnd,
        if runchroot.is_some() { ", chroot " } else { "" },
        runchroot.as_deref().unwrap_or(""),
    );
    verdict
}

/// Re-locate the user's command after a pivot. The context is updated
/// only on success; failures leave the pre-pivot state in place.
fn resolve_in_root(ctx: &mut MatchContext) -> ResolveStatus {
    let Some(mut resolver) = ctx.resolver.take() else {
        debug!(
            "no command resolver configured, cannot re-resolve {}",
            ctx.user.base
        );
        return ResolveStatus::NotFound;
    };
    let resolution = resolver.resolve(&ctx.user.base);
    ctx.resolver = Some(resolver);

    if resolution.status == ResolveStatus::Found {
        if let Some(cmnd) = resolution.cmnd {
            ctx.user.cmnd = cmnd;
        }
        ctx.user.dir = resolution.dir;
        ctx.user.stat = resolution.stat;
    }
    resolution.status
}

/// Pseudo-commands match by name alone; the filesystem is never
/// consulted and `safe_cmnd` stays untouched because the user's command
/// already equals the rule's.
struct PseudoMatcher {
    kind: PseudoCommand,
}

impl CmndMatcher for PseudoMatcher {
    fn matches(&self, req: &MatchRequest<'_>, ctx: &mut MatchContext) -> bool {
        ctx.user.cmnd == self.kind.name() && command_args_match(req.rule, req.args, &ctx.user)
    }
}

/// The user's command as an absolute path: as invoked, or joined from
/// the canonical parent directory when invoked relative. `None` when a
/// relative command was never resolved, which cannot match a pattern.
fn absolute_user_cmnd(user: &UserCommand) -> Option<String> {
    if user.cmnd.starts_with('/') {
        Some(user.cmnd.clone())
    } else {
        user.dir
            .as_deref()
            .map(|dir| format!("{dir}/{}", user.base))
    }
}

/// Intercepted child execs must not be able to launder privilege
/// through a setid binary.
fn intercept_ok(path: &str, req: &MatchRequest<'_>, settings: &Settings, sb: &FileId) -> bool {
    if req.intercepted && !settings.intercept_allow_setid && sb.is_setid() {
        debug!("rejecting setid command {path}");
        return false;
    }
    true
}

/// Canonicalized parent directories must agree when the user's is
/// known. An unresolvable rule parent is "no opinion", not a mismatch.
fn parent_dirs_match(path: &str, user: &UserCommand) -> bool {
    let Some(user_dir) = user.dir.as_deref() else {
        return true;
    };
    let Some(idx) = path.rfind('/') else {
        return true;
    };
    match canon_path(&path[..idx]) {
        Some(resolved) => resolved == user_dir,
        None => true,
    }
}

/// Common tail of the regex and fnmatch strategies: open the candidate,
/// apply the inode-mode guards, verify the digest, and publish the
/// descriptor. The pattern itself already matched, so `safe_cmnd` is
/// not written.
fn open_verify_publish(cmnd: &str, req: &MatchRequest<'_>, ctx: &mut MatchContext) -> bool {
    let fd = match open_cmnd(cmnd, req.digests, &ctx.settings) {
        Ok(fd) => fd,
        Err(err) => {
            debug!("unable to open {cmnd}: {err}");
            return false;
        }
    };
    if ctx.mode == MatchMode::Inode {
        let Some(sb) = FileId::for_cmnd(fd.as_ref(), cmnd) else {
            return false;
        };
        if !intercept_ok(cmnd, req, &ctx.settings, &sb) {
            return false;
        }
    }
    if !crate::digest::digest_matches(fd.as_ref(), cmnd, req.digests) {
        return false;
    }
    ctx.set_cmnd_fd(fd, req.pivot);
    true
}
