use std::fs;
use std::path::Path;

/// Return the final component of a path, the text after the last `/`.
///
/// Unlike [`Path::file_name`], a trailing slash yields the empty string
/// rather than the preceding component, which is what rule matching
/// needs to tell `/usr/bin/` apart from `/usr/bin`.
pub fn basename(path: &str) -> &str {
    path.rsplit_once('/').map_or(path, |(_, base)| base)
}

/// Whether the string contains pattern meta characters (`\ ? * [ ]`).
///
/// Rule commands with any of these are matched as glob patterns instead
/// of literal paths.
pub fn has_meta(s: &str) -> bool {
    s.bytes()
        .any(|b| matches!(b, b'\\' | b'?' | b'*' | b'[' | b']'))
}

/// Resolve a directory to its canonical absolute form, following
/// symlinks. Returns `None` if the path cannot be resolved; callers
/// treat that as "no opinion" and fall back to weaker checks.
pub fn canon_path(path: &str) -> Option<String> {
    fs::canonicalize(Path::new(path))
        .ok()
        .and_then(|resolved| resolved.into_os_string().into_string().ok())
}
