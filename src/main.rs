mod cli;
mod menu;

use std::path::Path;

use clap::Parser;
use colored::Colorize;
use gps::{
    AppError, Profile, ProfileManager, ProfileUpdate,
    config::Paths,
    git::GitGlobalConfig,
    keygen::SshKeygen,
    validation::{validate_input_alias, validate_input_email, validate_input_host, validate_input_name},
};
use log::LevelFilter;

use crate::cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!("{}", err.to_string().red());
        std::process::exit(1);
    }
}

/// Initialize logging using env_logger. `RUST_LOG` overrides the default level.
fn init_logging(verbose: bool) {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn run(cli: Cli) -> Result<(), AppError> {
    let paths = Paths::resolve(cli.config_dir, cli.ssh_dir)?;
    let mut manager = ProfileManager::new(paths, Box::new(GitGlobalConfig), Box::new(SshKeygen));

    match cli.command {
        Some(Commands::Switch { user_alias }) => switch_user(&mut manager, &user_alias),
        Some(Commands::Add { name, email, host, alias }) => {
            add_user(&mut manager, &name, &email, host.as_deref(), alias.as_deref())
        }
        Some(Commands::Edit { user_alias, name, email, host, alias }) => {
            edit_user(&mut manager, &user_alias, ProfileUpdate { name, email, host, alias })
        }
        Some(Commands::Delete { user_alias, keep_keys }) => delete_user(&mut manager, &user_alias, !keep_keys),
        Some(Commands::Keygen { user_alias }) => generate_key(&mut manager, &user_alias),
        Some(Commands::ImportKey { key_path, name, email, host, alias }) => {
            import_key(&mut manager, &key_path, &name, &email, host.as_deref(), alias.as_deref())
        }
        Some(Commands::ImportSsh) => import_ssh(&mut manager),
        Some(Commands::ImportAliases) => import_aliases(&mut manager),
        Some(Commands::Current) => show_current_user(&manager),
        Some(Commands::List) => list_all_users(&manager),
        Some(Commands::SshConfig) => show_ssh_config(&manager),
        None => menu::run_menu(&mut manager),
    }
}

/// Resolves a profile alias to its id
fn id_for_alias(manager: &ProfileManager, user_alias: &str) -> Result<String, AppError> {
    manager
        .find_by_alias(user_alias)
        .map(|profile| profile.id.clone())
        .ok_or_else(|| AppError::NotFound(user_alias.to_string()))
}

/// Checks if any profiles exist
pub fn check_if_users_exist(profiles: &[Profile]) -> Result<(), AppError> {
    if profiles.is_empty() {
        return Err(AppError::Validation("no profiles found".to_string()));
    }
    Ok(())
}

pub fn switch_user(manager: &mut ProfileManager, user_alias: &str) -> Result<(), AppError> {
    let id = id_for_alias(manager, user_alias)?;
    manager.set_active(&id)?;
    println!("{} {}", "switched to profile:".green(), user_alias);
    Ok(())
}

pub fn add_user(
    manager: &mut ProfileManager,
    name: &str,
    email: &str,
    host: Option<&str>,
    alias: Option<&str>,
) -> Result<(), AppError> {
    validate_input_name(name)?;
    validate_input_email(email)?;
    validate_input_host(host.unwrap_or_default())?;
    validate_input_alias(alias.unwrap_or_default())?;

    let alias = alias.filter(|alias| !alias.trim().is_empty());
    let profile = manager.add_profile(name, email, host, alias)?;
    println!("{} {}", "added profile:".green(), profile.alias);
    Ok(())
}

pub fn edit_user(manager: &mut ProfileManager, user_alias: &str, update: ProfileUpdate) -> Result<(), AppError> {
    if let Some(name) = update.name.as_deref() {
        validate_input_name(name)?;
    }
    if let Some(email) = update.email.as_deref() {
        validate_input_email(email)?;
    }
    if let Some(host) = update.host.as_deref() {
        validate_input_host(host)?;
    }
    if let Some(alias) = update.alias.as_deref() {
        validate_input_alias(alias)?;
    }

    let id = id_for_alias(manager, user_alias)?;
    let profile = manager.update_profile(&id, update)?;
    println!("{} {}", "updated profile:".green(), profile.alias);
    Ok(())
}

pub fn delete_user(manager: &mut ProfileManager, user_alias: &str, remove_keys: bool) -> Result<(), AppError> {
    let id = id_for_alias(manager, user_alias)?;
    manager.delete_profile(&id, remove_keys)?;
    println!("{} {}", "deleted profile:".green(), user_alias);
    Ok(())
}

pub fn generate_key(manager: &mut ProfileManager, user_alias: &str) -> Result<(), AppError> {
    let id = id_for_alias(manager, user_alias)?;
    manager.generate_key(&id)?;
    if let Some(profile) = manager.get_profile(&id) {
        println!("{} {}", "generated key:".green(), profile.public_key_path);
    }
    Ok(())
}

pub fn import_key(
    manager: &mut ProfileManager,
    key_path: &Path,
    name: &str,
    email: &str,
    host: Option<&str>,
    alias: Option<&str>,
) -> Result<(), AppError> {
    validate_input_name(name)?;
    validate_input_email(email)?;
    validate_input_host(host.unwrap_or_default())?;
    validate_input_alias(alias.unwrap_or_default())?;

    let alias = alias.filter(|alias| !alias.trim().is_empty());
    let profile = manager.import_key(key_path, name, email, host, alias)?;
    println!("{} {} ({})", "imported key as profile:".green(), profile.alias, profile.ssh_key_path);
    Ok(())
}

pub fn import_ssh(manager: &mut ProfileManager) -> Result<(), AppError> {
    match manager.import_from_ssh_config()? {
        0 => println!("{}", "no importable hosts found or all were already present".yellow()),
        count => println!("{} {count}", "imported host(s):".green()),
    }
    Ok(())
}

pub fn import_aliases(manager: &mut ProfileManager) -> Result<(), AppError> {
    match manager.import_from_git_aliases()? {
        0 => println!("{}", "no matching aliases found".yellow()),
        count => println!("{} {count}", "mapped profile(s):".green()),
    }
    Ok(())
}

/// Shows current Git identity
pub fn show_current_user(manager: &ProfileManager) -> Result<(), AppError> {
    let (name, email) = manager.current_identity()?;
    println!(
        "{} {} <{}>",
        "current user:".blue(),
        name.as_deref().unwrap_or("(unset)"),
        email.as_deref().unwrap_or("(unset)")
    );
    match manager.active_profile_id().and_then(|id| manager.get_profile(&id)) {
        Some(profile) => println!("{} {}", "active profile:".blue(), profile.alias),
        None => println!("{} none", "active profile:".blue()),
    }
    Ok(())
}

/// Lists all profiles, marking the active one
pub fn list_all_users(manager: &ProfileManager) -> Result<(), AppError> {
    check_if_users_exist(manager.profiles())?;

    let active = manager.active_profile_id();
    for profile in manager.profiles() {
        let marker = if active.as_deref() == Some(profile.id.as_str()) { "*" } else { " " };
        let key_state = if Path::new(&profile.ssh_key_path).exists() { "key" } else { "no key" };
        println!(
            "{} {} {} <{}> @ {} [{}]",
            marker.green(),
            profile.alias.bold(),
            profile.name,
            profile.email,
            profile.host,
            key_state
        );
    }
    Ok(())
}

pub fn show_ssh_config(manager: &ProfileManager) -> Result<(), AppError> {
    let text = manager.ssh_config_text()?;
    if text.is_empty() {
        println!("{}", "SSH config is empty".yellow());
    } else {
        print!("{text}");
    }
    Ok(())
}
