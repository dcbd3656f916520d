use std::{
    collections::BTreeMap,
    process::{Command, Output},
};

use log::debug;

use crate::{config::resolve_path, error::AppError, profile::Registry};

/// Global git setting holding the display name
pub const USER_NAME: &str = "user.name";
/// Global git setting holding the display email
pub const USER_EMAIL: &str = "user.email";
/// Global git setting holding the SSH command
pub const SSH_COMMAND: &str = "core.sshCommand";

/// The single, process-wide active identity slot
pub trait IdentityBridge {
    /// Reads a setting, `None` when unset
    fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    /// Writes a setting
    fn set(&mut self, key: &str, value: &str) -> Result<(), AppError>;
    /// Removes a setting; unsetting an absent key succeeds
    fn unset(&mut self, key: &str) -> Result<(), AppError>;
    /// Lists `alias.<key> <value>` lines from the global config
    fn alias_definitions(&self) -> Result<Vec<String>, AppError>;
}

/// Identity slot backed by `git config --global`
#[derive(Debug, Default, Clone, Copy)]
pub struct GitGlobalConfig;

impl GitGlobalConfig {
    fn run(args: &[&str]) -> Result<Output, AppError> {
        debug!("git {}", args.join(" "));
        Command::new("git")
            .args(args)
            .output()
            .map_err(|err| AppError::ExternalTool(format!("failed to run git: {err}")))
    }

    fn failure(output: Output) -> Result<AppError, AppError> {
        Ok(AppError::ExternalTool(
            String::from_utf8(output.stderr)?.trim().to_string(),
        ))
    }
}

impl IdentityBridge for GitGlobalConfig {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let git_command_output: Output = Self::run(&["config", "--global", "--get", key])?;

        // git exits 1 when the key is absent
        match git_command_output.status.code() {
            Some(0) => {
                let value = String::from_utf8_lossy(&git_command_output.stdout).trim().to_string();
                Ok(Some(value))
            }
            Some(1) => Ok(None),
            _ => Err(Self::failure(git_command_output)?),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), AppError> {
        let git_command_output: Output = Self::run(&["config", "--global", key, value])?;

        if !git_command_output.status.success() {
            return Err(Self::failure(git_command_output)?);
        }
        Ok(())
    }

    fn unset(&mut self, key: &str) -> Result<(), AppError> {
        let git_command_output: Output = Self::run(&["config", "--global", "--unset", key])?;

        // git exits 5 when there is nothing to unset
        match git_command_output.status.code() {
            Some(0) | Some(5) => Ok(()),
            _ => Err(Self::failure(git_command_output)?),
        }
    }

    fn alias_definitions(&self) -> Result<Vec<String>, AppError> {
        let git_command_output: Output =
            Self::run(&["config", "--global", "--get-regexp", r"^alias\."])?;

        match git_command_output.status.code() {
            Some(0) => Ok(String::from_utf8_lossy(&git_command_output.stdout)
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(str::to_string)
                .collect()),
            Some(1) => Ok(Vec::new()),
            _ => Err(Self::failure(git_command_output)?),
        }
    }
}

/// In-memory identity slot with the same contract as [`GitGlobalConfig`]
#[derive(Debug, Default, Clone)]
pub struct MemoryBridge {
    values: BTreeMap<String, String>,
    aliases: Vec<String>,
}

impl MemoryBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an `alias.<key> <value>` definition line
    pub fn with_alias(mut self, key: &str, value: &str) -> Self {
        self.aliases.push(format!("alias.{key} {value}"));
        self
    }
}

impl IdentityBridge for MemoryBridge {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), AppError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn unset(&mut self, key: &str) -> Result<(), AppError> {
        self.values.remove(key);
        Ok(())
    }

    fn alias_definitions(&self) -> Result<Vec<String>, AppError> {
        Ok(self.aliases.clone())
    }
}

/// Builds `ssh -i <quoted-path> -o IdentitiesOnly=yes`
pub fn ssh_command_for(key_path: &str) -> String {
    format!("ssh -i {} -o IdentitiesOnly=yes", shell_words::quote(key_path))
}

/// Extracts the argument following `-i` from an SSH command
///
/// Commands that do not shell-tokenize fall back to whitespace splitting.
pub fn identity_file_from_command(command: &str) -> Option<String> {
    let parts: Vec<String> = match shell_words::split(command) {
        Ok(parts) => parts,
        Err(err) => {
            debug!("falling back to whitespace split for '{command}': {err}");
            command.split_whitespace().map(str::to_string).collect()
        }
    };
    parts
        .iter()
        .position(|part| part == "-i")
        .and_then(|index| parts.get(index + 1))
        .filter(|path| !path.is_empty())
        .cloned()
}

/// Id of the profile whose key path matches the slot's SSH command, if any
///
/// # Arguments
/// * `bridge` - Identity slot to read
/// * `registry` - Profiles to match against
pub fn active_profile_id(
    bridge: &dyn IdentityBridge,
    registry: &Registry,
) -> Result<Option<String>, AppError> {
    let command = match bridge.get(SSH_COMMAND)? {
        Some(command) if !command.trim().is_empty() => command,
        _ => return Ok(None),
    };
    let Some(key_path) = identity_file_from_command(command.trim()) else {
        return Ok(None);
    };
    let target = resolve_path(&key_path);
    Ok(registry
        .profiles
        .iter()
        .find(|profile| resolve_path(&profile.ssh_key_path) == target)
        .map(|profile| profile.id.clone()))
}
