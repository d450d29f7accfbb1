use std::fs::{self, File};
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use tempfile::TempDir;

use privmatch::filesystem::canon_path;
use privmatch::{FileId, MatchContext, MatchMode, Settings, UserCommand};

/// Scratch tree of programs for matching tests.
pub struct TestEnv {
    temp_dir: TempDir,
}

impl TestEnv {
    /// Create the given directories and executable files (path,
    /// contents) under a fresh temporary root.
    pub fn new(directories: &[&str], programs: &[(&str, &[u8])]) -> Self {
        let temp_dir = TempDir::new().expect("test temp dir");
        for directory in directories {
            fs::create_dir_all(temp_dir.path().join(directory)).unwrap();
        }
        for (path, contents) in programs {
            let path = temp_dir.path().join(path);
            let mut file = File::create(&path).unwrap();
            file.write_all(contents).unwrap();
            let mut perms = file.metadata().unwrap().permissions();
            perms.set_mode(0o755);
            fs::set_permissions(&path, perms).unwrap();
        }
        Self { temp_dir }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute path of an entry in the scratch tree.
    pub fn path(&self, rel: &str) -> String {
        self.temp_dir
            .path()
            .join(rel)
            .to_str()
            .unwrap()
            .to_string()
    }

    /// A user command fully resolved to `rel`, as the front end would
    /// leave it: absolute path, canonical parent directory and stat.
    pub fn user(&self, rel: &str) -> UserCommand {
        let cmnd = self.path(rel);
        let mut user = UserCommand::new(cmnd.as_str());
        user.dir = cmnd.rsplit_once('/').and_then(|(dir, _)| canon_path(dir));
        user.stat = FileId::from_path(&cmnd).ok();
        user
    }

    /// Inode-mode context for a user command resolved to `rel`.
    pub fn context(&self, rel: &str) -> MatchContext {
        MatchContext::new(self.user(rel), Settings::default(), MatchMode::Inode)
    }
}
