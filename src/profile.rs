use serde::{Deserialize, Serialize};

/// Represents one managed Git/SSH identity stored in the registry file
///
/// Fields are declared alphabetically so the serialized object has sorted keys.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    /// Unique SSH `Host` token, also the key filename suffix
    pub alias: String,
    /// Git email (user.email)
    pub email: String,
    /// Real host name the alias points at
    pub host: String,
    /// Opaque unique token, never reused
    pub id: String,
    /// Git name (user.name)
    pub name: String,
    /// Public key path, normally `ssh_key_path` + ".pub"
    pub public_key_path: String,
    /// Private key path
    pub ssh_key_path: String,
}

/// On-disk shape of the registry: `{"profiles": [...]}`
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    #[serde(default)]
    pub profiles: Vec<Profile>,
}

impl Registry {
    /// Looks up a profile by id
    pub fn get(&self, id: &str) -> Option<&Profile> {
        self.profiles.iter().find(|profile| profile.id == id)
    }

    /// Looks up a profile by alias
    pub fn find_by_alias(&self, alias: &str) -> Option<&Profile> {
        self.profiles.iter().find(|profile| profile.alias == alias)
    }

    /// Aliases of every profile except the one with `exclude_id`
    pub fn aliases_except(&self, exclude_id: Option<&str>) -> Vec<&str> {
        self.profiles
            .iter()
            .filter(|profile| Some(profile.id.as_str()) != exclude_id)
            .map(|profile| profile.alias.as_str())
            .collect()
    }
}
