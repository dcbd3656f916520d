use std::{
    path::Path,
    process::{Command, Output},
};

use log::debug;

use crate::error::AppError;

/// Creates key pairs; the algorithm lives in an external tool
pub trait KeyGenerator {
    /// Writes a private key at `path` and its public key at `path.pub`
    fn generate_keypair(&self, path: &Path, comment: &str) -> Result<(), AppError>;

    /// Returns the public key text derived from an existing private key
    fn derive_public_key(&self, private_key: &Path) -> Result<String, AppError>;
}

/// Key generation through `ssh-keygen`
#[derive(Debug, Default, Clone, Copy)]
pub struct SshKeygen;

impl SshKeygen {
    fn run(args: &[&str]) -> Result<Output, AppError> {
        debug!("ssh-keygen {}", args.join(" "));
        let output: Output = Command::new("ssh-keygen")
            .args(args)
            .output()
            .map_err(|err| AppError::ExternalTool(format!("failed to run ssh-keygen: {err}")))?;

        if !output.status.success() {
            return Err(AppError::ExternalTool(format!(
                "ssh-keygen failed: {}",
                String::from_utf8(output.stderr)?.trim()
            )));
        }
        Ok(output)
    }
}

impl KeyGenerator for SshKeygen {
    fn generate_keypair(&self, path: &Path, comment: &str) -> Result<(), AppError> {
        let path = path.to_string_lossy().into_owned();
        Self::run(&["-q", "-t", "ed25519", "-f", path.as_str(), "-C", comment, "-N", ""])?;
        Ok(())
    }

    fn derive_public_key(&self, private_key: &Path) -> Result<String, AppError> {
        let private_key = private_key.to_string_lossy().into_owned();
        let output = Self::run(&["-y", "-f", private_key.as_str()])?;
        Ok(String::from_utf8(output.stdout)?)
    }
}
