use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{info, warn};
use uuid::Uuid;

use crate::{
    alias::{FALLBACK_ALIAS, allocate, slugify},
    config::{DEFAULT_HOST, Paths},
    error::AppError,
    git::{self, IdentityBridge, SSH_COMMAND, USER_EMAIL, USER_NAME},
    import,
    keygen::KeyGenerator,
    profile::{Profile, Registry},
    ssh_config::SshConfigFile,
    storage::{ProfileStore, restrict_permissions},
};

/// Optional replacements applied by [`ProfileManager::update_profile`]
#[derive(Debug, Default, Clone)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub host: Option<String>,
    pub alias: Option<String>,
}

/// Orchestrates the registry, the SSH config and the identity slot
pub struct ProfileManager {
    paths: Paths,
    store: ProfileStore,
    ssh_config: SshConfigFile,
    registry: Registry,
    bridge: Box<dyn IdentityBridge>,
    keygen: Box<dyn KeyGenerator>,
}

impl ProfileManager {
    /// Loads the registry from `paths`
    ///
    /// # Arguments
    /// * `paths` - File locations
    /// * `bridge` - Global identity slot
    /// * `keygen` - Key-pair generator
    pub fn new(paths: Paths, bridge: Box<dyn IdentityBridge>, keygen: Box<dyn KeyGenerator>) -> Self {
        let store = ProfileStore::new(paths.profiles_file());
        let ssh_config = SshConfigFile::new(paths.ssh_config_file());
        let registry = store.load();
        Self { paths, store, ssh_config, registry, bridge, keygen }
    }

    /// Re-reads the registry file, dropping in-memory state
    pub fn reload(&mut self) {
        self.registry = self.store.load();
    }

    pub fn paths(&self) -> &Paths {
        &self.paths
    }

    pub fn bridge(&self) -> &dyn IdentityBridge {
        self.bridge.as_ref()
    }

    pub fn profiles(&self) -> &[Profile] {
        &self.registry.profiles
    }

    pub fn get_profile(&self, id: &str) -> Option<&Profile> {
        self.registry.get(id)
    }

    pub fn find_by_alias(&self, alias: &str) -> Option<&Profile> {
        self.registry.find_by_alias(alias)
    }

    fn profile_or_not_found(&self, id: &str) -> Result<Profile, AppError> {
        self.registry
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(id.to_string()))
    }

    fn profile_mut(&mut self, id: &str) -> Result<&mut Profile, AppError> {
        self.registry
            .profiles
            .iter_mut()
            .find(|profile| profile.id == id)
            .ok_or_else(|| AppError::NotFound(id.to_string()))
    }

    fn persist(&self) -> Result<(), AppError> {
        self.store.save(&self.registry)
    }

    fn unique_alias(&self, desired: &str, exclude_id: Option<&str>) -> String {
        let slug = slugify(desired);
        let candidate = if slug.is_empty() { FALLBACK_ALIAS.to_string() } else { slug };
        allocate(&candidate, &self.registry.aliases_except(exclude_id))
    }

    fn ensure_ssh_dir(&self) -> Result<(), AppError> {
        if !self.paths.ssh_dir.exists() {
            fs::create_dir_all(&self.paths.ssh_dir)?;
        }
        restrict_permissions(&self.paths.ssh_dir, 0o700);
        Ok(())
    }

    /// Creates a profile, deriving its alias from `alias` or else `name`
    ///
    /// # Arguments
    /// * `name` - Git name
    /// * `email` - Git email
    /// * `host` - Real host, defaults to github.com when blank
    /// * `alias` - Desired alias, slugified and made unique
    pub fn add_profile(
        &mut self,
        name: &str,
        email: &str,
        host: Option<&str>,
        alias: Option<&str>,
    ) -> Result<Profile, AppError> {
        let final_alias = self.unique_alias(alias.unwrap_or(name), None);
        let key_path = self.paths.key_path_for(&final_alias).to_string_lossy().into_owned();
        let host = host.map(str::trim).filter(|host| !host.is_empty()).unwrap_or(DEFAULT_HOST);

        let profile = Profile {
            alias: final_alias,
            email: email.trim().to_string(),
            host: host.to_string(),
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            public_key_path: format!("{key_path}.pub"),
            ssh_key_path: key_path,
        };
        self.registry.profiles.push(profile.clone());
        self.persist()?;
        info!("added profile '{}'", profile.alias);
        Ok(profile)
    }

    /// Applies `update`; an alias change drops the old SSH block
    pub fn update_profile(&mut self, id: &str, update: ProfileUpdate) -> Result<Profile, AppError> {
        let new_alias = update
            .alias
            .as_deref()
            .map(|alias| self.unique_alias(alias, Some(id)));
        let old_alias = self.profile_or_not_found(id)?.alias;

        let profile = self.profile_mut(id)?;
        if let Some(name) = update.name {
            profile.name = name.trim().to_string();
        }
        if let Some(email) = update.email {
            profile.email = email.trim().to_string();
        }
        if let Some(host) = update.host.as_deref().map(str::trim).filter(|host| !host.is_empty()) {
            profile.host = host.to_string();
        }
        if let Some(alias) = new_alias.filter(|alias| *alias != old_alias) {
            profile.alias = alias;
        }
        let profile = profile.clone();

        if profile.alias != old_alias {
            self.ssh_config.remove_block(&old_alias)?;
        }
        self.persist()?;
        if Path::new(&profile.ssh_key_path).exists() {
            self.ssh_config.upsert_profile(&profile)?;
        }
        info!("updated profile '{}'", profile.alias);
        Ok(profile)
    }

    /// Removes a profile, its SSH block and optionally its key files
    ///
    /// Clears the identity slot's SSH command if the profile was active.
    pub fn delete_profile(&mut self, id: &str, remove_keys: bool) -> Result<(), AppError> {
        let profile = self.profile_or_not_found(id)?;
        let was_active = self.active_profile_id().as_deref() == Some(id);

        self.ssh_config.remove_block(&profile.alias)?;
        if remove_keys {
            for path in [&profile.ssh_key_path, &profile.public_key_path] {
                match fs::remove_file(path) {
                    Ok(()) => info!("removed key file {path}"),
                    Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                    Err(err) => return Err(err.into()),
                }
            }
        }
        self.registry.profiles.retain(|other| other.id != id);
        self.persist()?;

        if was_active {
            self.bridge.unset(SSH_COMMAND)?;
            info!("cleared active identity");
        }
        info!("deleted profile '{}'", profile.alias);
        Ok(())
    }

    /// Generates the profile's key pair and writes its SSH block
    pub fn generate_key(&mut self, id: &str) -> Result<(), AppError> {
        let profile = self.profile_or_not_found(id)?;
        let key_path = PathBuf::from(&profile.ssh_key_path);
        if key_path.exists() {
            return Err(AppError::AlreadyExists(key_path));
        }
        self.ensure_ssh_dir()?;

        let comment = format!("{} <{}>", profile.name, profile.email);
        self.keygen.generate_keypair(&key_path, &comment)?;
        restrict_permissions(&key_path, 0o600);
        restrict_permissions(Path::new(&profile.public_key_path), 0o644);

        self.ssh_config.upsert_profile(&profile)?;
        info!("generated key for '{}'", profile.alias);
        Ok(())
    }

    /// Points the global identity slot at the profile
    pub fn set_active(&mut self, id: &str) -> Result<(), AppError> {
        let profile = self.profile_or_not_found(id)?;
        if !Path::new(&profile.ssh_key_path).exists() {
            return Err(AppError::KeyMissing(PathBuf::from(&profile.ssh_key_path)));
        }

        self.bridge.set(USER_NAME, &profile.name)?;
        self.bridge.set(USER_EMAIL, &profile.email)?;
        self.bridge.set(SSH_COMMAND, &git::ssh_command_for(&profile.ssh_key_path))?;

        self.ssh_config.upsert_profile(&profile)?;
        info!("active profile is now '{}'", profile.alias);
        Ok(())
    }

    /// Id of the profile the identity slot points at
    ///
    /// A slot that cannot be read counts as no active profile.
    pub fn active_profile_id(&self) -> Option<String> {
        git::active_profile_id(self.bridge.as_ref(), &self.registry).unwrap_or_else(|err| {
            warn!("could not read active identity: {err}");
            None
        })
    }

    /// Current `user.name` and `user.email` of the identity slot
    pub fn current_identity(&self) -> Result<(Option<String>, Option<String>), AppError> {
        Ok((self.bridge.get(USER_NAME)?, self.bridge.get(USER_EMAIL)?))
    }

    /// Full text of the SSH client config
    pub fn ssh_config_text(&self) -> Result<String, AppError> {
        self.ssh_config.read()
    }

    /// Creates profiles for hosts in the SSH config. Returns the number created.
    pub fn import_from_ssh_config(&mut self) -> Result<usize, AppError> {
        let text = self.ssh_config.read()?;
        let imported = import::import_ssh_hosts(&mut self.registry, &text);
        if imported > 0 {
            self.persist()?;
        }
        info!("imported {imported} host(s) from {}", self.ssh_config.path().display());
        Ok(imported)
    }

    /// Merges identities from global git aliases. Returns the number created or updated.
    pub fn import_from_git_aliases(&mut self) -> Result<usize, AppError> {
        let lines = self.bridge.alias_definitions()?;
        let touched = import::import_alias_credentials(&mut self.registry, lines.as_slice(), &self.paths);
        if touched > 0 {
            self.persist()?;
        }
        info!("mapped {touched} profile(s) from git aliases");
        Ok(touched)
    }

    /// Copies an existing private key into the ssh dir and creates a profile for it
    ///
    /// The public key is copied alongside when present, otherwise derived.
    pub fn import_key(
        &mut self,
        source: &Path,
        name: &str,
        email: &str,
        host: Option<&str>,
        alias: Option<&str>,
    ) -> Result<Profile, AppError> {
        if !source.is_file() {
            return Err(AppError::KeyMissing(source.to_path_buf()));
        }
        let final_alias = self.unique_alias(alias.unwrap_or(name), None);
        let target = self.paths.key_path_for(&final_alias);
        if target.exists() {
            return Err(AppError::AlreadyExists(target));
        }
        let target_pub = PathBuf::from(format!("{}.pub", target.to_string_lossy()));
        self.ensure_ssh_dir()?;

        if let Err(err) = self.copy_key_files(source, &target, &target_pub) {
            for path in [&target, &target_pub] {
                if let Err(remove_err) = fs::remove_file(path) {
                    if remove_err.kind() != std::io::ErrorKind::NotFound {
                        warn!("could not remove {}: {remove_err}", path.display());
                    }
                }
            }
            return Err(err);
        }

        let mut profile = self.add_profile(name, email, host, Some(final_alias.as_str()))?;
        profile.ssh_key_path = target.to_string_lossy().into_owned();
        profile.public_key_path = target_pub.to_string_lossy().into_owned();
        *self.profile_mut(&profile.id)? = profile.clone();
        self.persist()?;

        self.ssh_config.upsert_profile(&profile)?;
        info!("imported key {} as '{}'", source.display(), profile.alias);
        Ok(profile)
    }

    fn copy_key_files(&self, source: &Path, target: &Path, target_pub: &Path) -> Result<(), AppError> {
        fs::copy(source, target)?;
        restrict_permissions(target, 0o600);
        let source_pub = PathBuf::from(format!("{}.pub", source.to_string_lossy()));
        if source_pub.is_file() {
            fs::copy(&source_pub, target_pub)?;
        } else {
            let public_key = self.keygen.derive_public_key(target)?;
            fs::write(target_pub, public_key)?;
        }
        restrict_permissions(target_pub, 0o644);
        Ok(())
    }
}
