use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use log::{debug, warn};

use crate::{error::AppError, profile::Registry};

/// Durable load/save of the profile registry file
#[derive(Debug, Clone)]
pub struct ProfileStore {
    path: PathBuf,
}

impl ProfileStore {
    /// # Arguments
    /// * `path` - Location of the registry JSON file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the registry. A missing, empty or unparsable file yields an empty registry.
    pub fn load(&self) -> Registry {
        if let Err(err) = self.ensure_dir() {
            warn!("could not create {}: {err}", self.path.display());
        }

        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) => {
                if err.kind() != std::io::ErrorKind::NotFound {
                    warn!("could not read {}: {err}", self.path.display());
                }
                return Registry::default();
            }
        };

        if contents.trim().is_empty() {
            return Registry::default();
        }

        match serde_json::from_str(&contents) {
            Ok(registry) => registry,
            Err(err) => {
                let backup = self.path.with_extension("json.bak");
                warn!(
                    "unparsable registry {} ({err}), moving it to {}",
                    self.path.display(),
                    backup.display()
                );
                if let Err(err) = fs::rename(&self.path, &backup) {
                    warn!("could not back up {}: {err}", self.path.display());
                }
                Registry::default()
            }
        }
    }

    /// Saves the registry by writing a sibling temp file and renaming it over the target
    ///
    /// # Arguments
    /// * `registry` - Profiles to persist
    pub fn save(&self, registry: &Registry) -> Result<(), AppError> {
        self.ensure_dir()?;
        let json: String = serde_json::to_string_pretty(registry)?;

        let temp_path = self.path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, &self.path)?;

        debug!("saved {} profile(s) to {}", registry.profiles.len(), self.path.display());
        Ok(())
    }

    fn ensure_dir(&self) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
                restrict_permissions(parent, 0o700);
            }
        }
        Ok(())
    }
}

/// Applies a unix mode to `path`. Failures are logged and otherwise ignored.
pub fn restrict_permissions(path: &Path, mode: u32) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(err) = fs::set_permissions(path, fs::Permissions::from_mode(mode)) {
            warn!("could not set mode {mode:o} on {}: {err}", path.display());
        }
    }
    #[cfg(not(unix))]
    let _ = (path, mode);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Profile;

    fn sample() -> Registry {
        Registry {
            profiles: vec![Profile {
                alias: "work".to_string(),
                email: "jane@x.com".to_string(),
                host: "github.com".to_string(),
                id: "abc".to_string(),
                name: "Jane".to_string(),
                public_key_path: "/k/id_ed25519_work.pub".to_string(),
                ssh_key_path: "/k/id_ed25519_work".to_string(),
            }],
        }
    }

    #[test]
    fn missing_file_loads_empty_and_creates_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path().join("cfg").join("profiles.json"));
        assert_eq!(store.load(), Registry::default());
        assert!(dir.path().join("cfg").is_dir());
    }

    #[test]
    fn garbage_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.json");
        fs::write(&path, "{not json").unwrap();
        let store = ProfileStore::new(&path);
        assert_eq!(store.load(), Registry::default());

        store.save(&sample()).unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("profiles.json.bak")).unwrap(), "{not json");
        assert_eq!(store.load(), sample());
    }

    #[test]
    fn save_then_load_preserves_order_and_leaves_no_temp() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path().join("profiles.json"));
        let mut registry = sample();
        let mut second = registry.profiles[0].clone();
        second.id = "def".to_string();
        second.alias = "alpha".to_string();
        registry.profiles.push(second);

        store.save(&registry).unwrap();
        assert_eq!(store.load(), registry);
        assert!(!dir.path().join("profiles.json.tmp").exists());
    }

    #[test]
    fn saved_json_has_sorted_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path().join("profiles.json"));
        store.save(&sample()).unwrap();
        let text = fs::read_to_string(store.path()).unwrap();
        let keys = ["\"alias\"", "\"email\"", "\"host\"", "\"id\"", "\"name\"", "\"public_key_path\"", "\"ssh_key_path\""];
        let positions: Vec<usize> = keys.iter().map(|key| text.find(key).unwrap()).collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(text.starts_with("{\n  \"profiles\": ["));
    }
}
