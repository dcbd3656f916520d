use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// CLI arguments parser using `clap`
#[derive(Parser, Debug)]
#[command(name = "gps", version, about = "Switch between Git/SSH identities")]
pub struct Cli {
    /// Directory holding profiles.json
    #[arg(long, global = true, env = "GPS_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,
    /// Directory holding SSH keys and the SSH config
    #[arg(long, global = true, env = "GPS_SSH_DIR")]
    pub ssh_dir: Option<PathBuf>,
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
    /// Subcommand chosen to execute, the interactive menu when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Makes the profile the globally active Git identity
    Switch {
        /// Alias of profile to switch to
        user_alias: String,
    },
    /// Adds a new profile
    Add {
        /// Git name
        name: String,
        /// Git email
        email: String,
        /// Real host the alias points at
        #[arg(long)]
        host: Option<String>,
        /// Alias, derived from the name when omitted
        #[arg(long)]
        alias: Option<String>,
    },
    /// Edits an existing profile
    Edit {
        /// Alias of profile to edit
        user_alias: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        host: Option<String>,
        /// New alias
        #[arg(long)]
        alias: Option<String>,
    },
    /// Deletes a profile
    Delete {
        /// Alias of profile to delete
        user_alias: String,
        /// Leave the key files on disk
        #[arg(long)]
        keep_keys: bool,
    },
    /// Generates an ed25519 key pair for a profile
    Keygen {
        /// Alias of profile
        user_alias: String,
    },
    /// Creates a profile from an existing private key
    ImportKey {
        /// Path to the private key
        key_path: PathBuf,
        /// Git name
        name: String,
        /// Git email
        email: String,
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        alias: Option<String>,
    },
    /// Imports hosts from the SSH config
    ImportSsh,
    /// Imports identities from global git aliases
    ImportAliases,
    /// Displays current Git identity
    Current,
    /// Displays all profiles
    List,
    /// Prints the SSH config
    SshConfig,
}
