use std::{
    fs,
    path::{Path, PathBuf},
};

use log::debug;

use crate::{error::AppError, profile::Profile};

fn begin_marker(alias: &str) -> String {
    format!("# gps-begin: {alias}")
}

fn end_marker(alias: &str) -> String {
    format!("# gps-end: {alias}")
}

/// Finds `line` as a whole line at or after byte `from`
///
/// Returns the byte range of the line including its trailing newline, if any.
fn find_line(text: &str, line: &str, from: usize) -> Option<(usize, usize)> {
    text[from..]
        .match_indices(line)
        .map(|(offset, _)| from + offset)
        .find_map(|start| {
            let at_line_start = start == 0 || text.as_bytes()[start - 1] == b'\n';
            let end = start + line.len();
            let rest = &text[end..];
            if !at_line_start {
                None
            } else if rest.starts_with('\n') {
                Some((start, end + 1))
            } else if rest.starts_with("\r\n") {
                Some((start, end + 2))
            } else if rest.is_empty() {
                Some((start, end))
            } else {
                None
            }
        })
}

/// Byte range of the managed block for `alias`, markers inclusive
fn find_block(text: &str, alias: &str) -> Option<(usize, usize)> {
    let (start, after_begin) = find_line(text, &begin_marker(alias), 0)?;
    let (_, end) = find_line(text, &end_marker(alias), after_begin)?;
    Some((start, end))
}

/// Inserts or replaces the managed block for `alias`
///
/// Content outside the block is preserved byte-for-byte.
///
/// # Arguments
/// * `text` - Full SSH config text
/// * `alias` - Alias naming the block
/// * `body` - Stanza placed between the markers
pub fn upsert(text: &str, alias: &str, body: &str) -> String {
    let mut block = begin_marker(alias);
    block.push('\n');
    block.push_str(body);
    if !body.is_empty() && !body.ends_with('\n') {
        block.push('\n');
    }
    block.push_str(&end_marker(alias));
    block.push('\n');

    match find_block(text, alias) {
        Some((start, end)) => format!("{}{}{}", &text[..start], block, &text[end..]),
        None => {
            let mut out = text.to_string();
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&block);
            out
        }
    }
}

/// Deletes the managed block for `alias`, markers inclusive. No-op if absent.
pub fn remove(text: &str, alias: &str) -> String {
    match find_block(text, alias) {
        Some((start, end)) => format!("{}{}", &text[..start], &text[end..]),
        None => text.to_string(),
    }
}

/// Whether a managed block for `alias` is present
pub fn contains_block(text: &str, alias: &str) -> bool {
    find_block(text, alias).is_some()
}

/// Renders the `Host` stanza written for a profile
pub fn render_block(profile: &Profile) -> String {
    format!(
        "Host {alias}\n  HostName {host}\n  User git\n  IdentityFile {key}\n  IdentitiesOnly yes\n",
        alias = profile.alias,
        host = profile.host,
        key = profile.ssh_key_path,
    )
}

/// The shared SSH client config file. Read-modify-write, unlocked.
#[derive(Debug, Clone)]
pub struct SshConfigFile {
    path: PathBuf,
}

impl SshConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the file, an absent file reads as empty
    pub fn read(&self) -> Result<String, AppError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(text),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(err) => Err(err.into()),
        }
    }

    pub fn write(&self, text: &str) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, text)?;
        Ok(())
    }

    /// Writes the block for `profile`, rewriting the file only when content changes
    pub fn upsert_profile(&self, profile: &Profile) -> Result<(), AppError> {
        let current = self.read()?;
        let updated = upsert(&current, &profile.alias, &render_block(profile));
        if updated != current {
            debug!("writing ssh block '{}' to {}", profile.alias, self.path.display());
            self.write(&updated)?;
        }
        Ok(())
    }

    /// Removes the block for `alias` if present
    pub fn remove_block(&self, alias: &str) -> Result<(), AppError> {
        let current = self.read()?;
        let updated = remove(&current, alias);
        if updated != current {
            debug!("removing ssh block '{alias}' from {}", self.path.display());
            self.write(&updated)?;
        }
        Ok(())
    }
}
