use std::path::{Component, Path, PathBuf};

use crate::error::AppError;

/// Directory name under the user's config dir
const APP_DIR_NAME: &str = "git-profile-switcher";
/// Registry file name inside the config dir
const PROFILES_FILE: &str = "profiles.json";
/// SSH client config file name inside the ssh dir
const SSH_CONFIG_FILE: &str = "config";
/// Host used when none is given
pub const DEFAULT_HOST: &str = "github.com";

/// Locations of the files the core reads and writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    /// Directory owning the profile registry
    pub config_dir: PathBuf,
    /// Directory holding keys and the SSH client config
    pub ssh_dir: PathBuf,
}

impl Paths {
    pub fn new(config_dir: impl Into<PathBuf>, ssh_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            ssh_dir: ssh_dir.into(),
        }
    }

    /// Resolves the default locations, applying any overrides
    ///
    /// # Arguments
    /// * `config_dir` - Override for the registry directory
    /// * `ssh_dir` - Override for the ssh directory
    pub fn resolve(config_dir: Option<PathBuf>, ssh_dir: Option<PathBuf>) -> Result<Self, AppError> {
        let config_dir = match config_dir {
            Some(dir) => dir,
            None => dirs::config_dir()
                .ok_or_else(|| AppError::Config("failed to find the config directory".to_string()))?
                .join(APP_DIR_NAME),
        };
        let ssh_dir = match ssh_dir {
            Some(dir) => dir,
            None => dirs::home_dir()
                .ok_or_else(|| AppError::Config("failed to find the home directory".to_string()))?
                .join(".ssh"),
        };
        Ok(Self::new(config_dir, ssh_dir))
    }

    pub fn profiles_file(&self) -> PathBuf {
        self.config_dir.join(PROFILES_FILE)
    }

    pub fn ssh_config_file(&self) -> PathBuf {
        self.ssh_dir.join(SSH_CONFIG_FILE)
    }

    /// Default private key path for an alias: `<ssh_dir>/id_ed25519_<alias>`
    pub fn key_path_for(&self, alias: &str) -> PathBuf {
        self.ssh_dir.join(format!("id_ed25519_{alias}"))
    }
}

/// Expands a leading `~` to the user's home directory
pub fn expand_home(raw: &str) -> PathBuf {
    let home = dirs::home_dir();
    match (raw, home) {
        ("~", Some(home)) => home,
        (path, Some(home)) if path.starts_with("~/") => home.join(&path[2..]),
        (path, _) => PathBuf::from(path),
    }
}

/// Expands `~`, anchors relative paths at the current directory and
/// normalises `.` and `..` without touching the filesystem
pub fn resolve_path(raw: &str) -> PathBuf {
    let expanded = expand_home(raw);
    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(expanded),
            Err(_) => expanded,
        }
    };
    normalize(&absolute)
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_tilde_prefix() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand_home("~/.ssh/id_work"), home.join(".ssh/id_work"));
        assert_eq!(expand_home("~"), home);
        assert_eq!(expand_home("/etc/ssh"), PathBuf::from("/etc/ssh"));
        assert_eq!(expand_home("~other/x"), PathBuf::from("~other/x"));
    }

    #[test]
    fn resolve_normalises_dots() {
        assert_eq!(
            resolve_path("/home/u/.ssh/../.ssh/./id_a"),
            PathBuf::from("/home/u/.ssh/id_a")
        );
    }

    #[test]
    fn resolve_anchors_relative_paths() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(resolve_path("keys/id_a"), cwd.join("keys/id_a"));
    }

    #[test]
    fn derived_file_locations() {
        let paths = Paths::new("/cfg", "/home/u/.ssh");
        assert_eq!(paths.profiles_file(), PathBuf::from("/cfg/profiles.json"));
        assert_eq!(paths.ssh_config_file(), PathBuf::from("/home/u/.ssh/config"));
        assert_eq!(paths.key_path_for("work"), PathBuf::from("/home/u/.ssh/id_ed25519_work"));
    }
}
