use log::debug;

use crate::context::MatchContext;
use crate::digest::digest_matches;
use crate::fileid::FileId;
use crate::filesystem::{basename, has_meta};
use crate::opener::open_cmnd;

use super::dir::command_matches_dir;
use super::{args::command_args_match, intercept_ok, parent_dirs_match};
use super::{CmndMatcher, MatchRequest};

/// Matches pattern rule commands by expanding them against the
/// filesystem, so every candidate is checked by inode identity.
///
/// Two passes over the expansion: an exact-path pass for entries equal
/// to the user's path, then a basename pass for everything else. A
/// digest mismatch in the exact-path pass fails the whole match and
/// suppresses the basename pass; a mismatch in the basename pass only
/// skips that entry.
pub(crate) struct GlobMatcher<'a> {
    pub pattern: &'a str,
}

impl CmndMatcher for GlobMatcher<'_> {
    fn matches(&self, req: &MatchRequest<'_>, ctx: &mut MatchContext) -> bool {
        // Avoid the expansion when the pattern's basename is literal
        // and cannot name the user's command.
        if !self.pattern.ends_with('/') {
            let base = basename(self.pattern);
            if !has_meta(base) && base != ctx.user.base {
                return false;
            }
        }
        let entries = match expand(self.pattern) {
            Some(entries) if !entries.is_empty() => entries,
            _ => return false,
        };

        let mut fd = None;
        let mut chosen = None;
        let mut bad_digest = false;

        'done: {
            // Exact-path pass: expansions equal to the user's path,
            // matched by inode identity.
            if ctx.user.cmnd.starts_with('/') {
                for entry in &entries {
                    fd = None; // close the previous iteration's descriptor
                    if *entry != ctx.user.cmnd {
                        continue;
                    }
                    fd = match open_cmnd(entry, req.digests, &ctx.settings) {
                        Ok(fd) => fd,
                        Err(err) => {
                            debug!("unable to open {entry}: {err}");
                            continue;
                        }
                    };
                    let Some(sb) = FileId::for_cmnd(fd.as_ref(), entry) else {
                        continue;
                    };
                    if !intercept_ok(entry, req, &ctx.settings, &sb) {
                        continue;
                    }
                    if let Some(user_stat) = ctx.user.stat {
                        if !user_stat.same_file(&sb) {
                            // The path strings agree but name different
                            // filesystem objects.
                            break 'done;
                        }
                    }
                    if !digest_matches(fd.as_ref(), entry, req.digests) {
                        // The expansion may repeat this path; remember
                        // the mismatch, it also poisons the basename
                        // pass.
                        bad_digest = true;
                        continue;
                    }
                    chosen = Some(entry.clone());
                    break 'done;
                }
            }

            if bad_digest {
                break 'done;
            }

            // Basename pass: entries whose basename, canonical parent
            // and inode all line up with the user's command.
            for entry in &entries {
                fd = None;
                // A trailing slash makes the entry a directory spec.
                if entry.ends_with('/') {
                    if command_matches_dir(entry, req, ctx) {
                        return true;
                    }
                    continue;
                }
                if basename(entry) != ctx.user.base {
                    continue;
                }
                if !parent_dirs_match(entry, &ctx.user) {
                    continue;
                }
                fd = match open_cmnd(entry, req.digests, &ctx.settings) {
                    Ok(fd) => fd,
                    Err(err) => {
                        debug!("unable to open {entry}: {err}");
                        continue;
                    }
                };
                let Some(sb) = FileId::for_cmnd(fd.as_ref(), entry) else {
                    continue;
                };
                if !intercept_ok(entry, req, &ctx.settings, &sb) {
                    continue;
                }
                if let Some(user_stat) = ctx.user.stat {
                    if !user_stat.same_file(&sb) {
                        continue;
                    }
                }
                if !digest_matches(fd.as_ref(), entry, req.digests) {
                    continue;
                }
                chosen = Some(entry.clone());
                break 'done;
            }
        }

        let Some(path) = chosen else {
            return false;
        };
        if !command_args_match(req.rule, req.args, &ctx.user) {
            return false;
        }
        ctx.safe_cmnd = Some(path);
        ctx.set_cmnd_fd(fd, req.pivot);
        true
    }
}

/// Expand the pattern against the filesystem. `None` when the pattern
/// itself does not parse. A pattern with a trailing slash selects
/// directories, reported with their trailing slash so the caller can
/// tell them apart.
fn expand(pattern: &str) -> Option<Vec<String>> {
    let dir_spec = pattern.ends_with('/') && pattern.len() > 1;
    let stripped = if dir_spec {
        pattern.trim_end_matches('/')
    } else {
        pattern
    };
    let paths = glob::glob(stripped).ok()?;
    let mut entries = Vec::new();
    for path in paths.filter_map(Result::ok) {
        if dir_spec && !path.is_dir() {
            continue;
        }
        let Ok(mut entry) = path.into_os_string().into_string() else {
            continue;
        };
        if dir_spec {
            entry.push('/');
        }
        entries.push(entry);
    }
    Some(entries)
}
