use colored::Colorize;
use inquire::{Confirm, Select, Text};

use gps::{
    AppError, Profile, ProfileManager, ProfileUpdate,
    config::expand_home,
    validation::{validate_input_alias, validate_input_email, validate_input_host, validate_input_name},
};

use crate::{
    add_user, check_if_users_exist, delete_user, edit_user, generate_key, import_aliases, import_key, import_ssh,
    list_all_users, show_current_user, show_ssh_config, switch_user,
};

/// Menu entry returning to the action list
const BACK_OPTION: &str = "<back>";

/// Actions offered by the main menu
const MENU_ACTIONS: [&str; 12] = [
    "switch profile",
    "add profile",
    "edit profile",
    "delete profile",
    "generate ssh key",
    "import from ssh config",
    "import from git aliases",
    "import ssh key",
    "show current user",
    "show all profiles",
    "show ssh config",
    "quit",
];

/// Runs interactive menu interface
pub fn run_menu(manager: &mut ProfileManager) -> Result<(), AppError> {
    loop {
        let actions: Vec<&'static str> = MENU_ACTIONS.to_vec();

        let action_selected: &'static str = Select::new(&format!("{}", "select action".blue()), actions)
            .prompt()?;

        let result = match action_selected {
            "switch profile" => menu_pick(manager, "select profile to switch:")
                .and_then(|alias| alias.map_or(Ok(()), |alias| switch_user(manager, &alias))),
            "add profile" => menu_add_user(manager),
            "edit profile" => menu_edit_user(manager),
            "delete profile" => menu_delete_user(manager),
            "generate ssh key" => menu_pick(manager, "select profile for new key:")
                .and_then(|alias| alias.map_or(Ok(()), |alias| generate_key(manager, &alias))),
            "import from ssh config" => import_ssh(manager),
            "import from git aliases" => import_aliases(manager),
            "import ssh key" => menu_import_key(manager),
            "show current user" => show_current_user(manager),
            "show all profiles" => list_all_users(manager),
            "show ssh config" => show_ssh_config(manager),
            "quit" => {
                println!("{}", "quitting".yellow());
                break Ok(());
            }
            _ => unreachable!("unexpected input"),
        };

        // Operation failures are shown and the menu keeps running
        match result {
            Ok(()) => {}
            Err(AppError::Inquire(err)) => return Err(AppError::Inquire(err)),
            Err(err) => println!("{}", err.to_string().red()),
        }
    }
}

/// Prompts user for input until valid input is provided
fn prompt_until_valid<F>(prompt_message: &str, default: &str, input_validation: F) -> Result<String, AppError>
where
    F: Fn(&str) -> Result<(), AppError>,
{
    loop {
        let input: String = Text::new(prompt_message).with_default(default).prompt()?;
        match input_validation(&input) {
            Ok(_) => break Ok(input.trim().to_string()),
            Err(AppError::Validation(msg)) => println!("{}", msg.red()),
            Err(e) => return Err(e),
        }
    }
}

/// Lets the user pick a profile alias, `None` when going back
fn menu_pick(manager: &ProfileManager, prompt: &str) -> Result<Option<String>, AppError> {
    check_if_users_exist(manager.profiles())?;

    let user_aliases: Vec<String> = build_alias_list(manager.profiles());
    let selected: String = Select::new(&format!("{}", prompt.blue()), user_aliases).prompt()?;

    Ok((selected != BACK_OPTION).then_some(selected))
}

/// Menu for adding a new profile
fn menu_add_user(manager: &mut ProfileManager) -> Result<(), AppError> {
    let name: String = prompt_until_valid(&format!("{}", "enter git name:".blue()), "", validate_input_name)?;
    let email: String = prompt_until_valid(&format!("{}", "enter git email:".blue()), "", validate_input_email)?;
    let host: String = prompt_until_valid(&format!("{}", "enter host:".blue()), "github.com", validate_input_host)?;
    let alias: String = prompt_until_valid(
        &format!("{}", "enter alias (blank to derive from name):".blue()),
        "",
        validate_input_alias,
    )?;

    add_user(manager, &name, &email, Some(host.as_str()), Some(alias.as_str()))
}

/// Menu for editing a profile, prefilled with current values
fn menu_edit_user(manager: &mut ProfileManager) -> Result<(), AppError> {
    let Some(alias) = menu_pick(manager, "select profile to edit:")? else {
        return Ok(());
    };
    let Some(current) = manager.find_by_alias(&alias).cloned() else {
        return Err(AppError::NotFound(alias));
    };

    let update = ProfileUpdate {
        name: Some(prompt_until_valid(&format!("{}", "git name:".blue()), &current.name, validate_input_name)?),
        email: Some(prompt_until_valid(&format!("{}", "git email:".blue()), &current.email, validate_input_email)?),
        host: Some(prompt_until_valid(&format!("{}", "host:".blue()), &current.host, validate_input_host)?),
        alias: Some(prompt_until_valid(&format!("{}", "alias:".blue()), &current.alias, validate_input_alias)?)
            .filter(|alias| !alias.is_empty()),
    };
    edit_user(manager, &current.alias, update)
}

/// Menu for creating a profile from an existing private key
fn menu_import_key(manager: &mut ProfileManager) -> Result<(), AppError> {
    let key_path: String = prompt_until_valid(&format!("{}", "path to ssh private key:".blue()), "", |input| {
        if expand_home(input.trim()).is_file() {
            Ok(())
        } else {
            Err(AppError::Validation("File does not exist".to_string()))
        }
    })?;
    let name: String = prompt_until_valid(&format!("{}", "enter git name:".blue()), "", validate_input_name)?;
    let email: String = prompt_until_valid(&format!("{}", "enter git email:".blue()), "", validate_input_email)?;
    let host: String = prompt_until_valid(&format!("{}", "enter host:".blue()), "github.com", validate_input_host)?;
    let alias: String = prompt_until_valid(
        &format!("{}", "enter alias (blank to derive from name):".blue()),
        "",
        validate_input_alias,
    )?;

    import_key(manager, &expand_home(&key_path), &name, &email, Some(host.as_str()), Some(alias.as_str()))
}

/// Menu for deleting a profile
fn menu_delete_user(manager: &mut ProfileManager) -> Result<(), AppError> {
    let Some(alias) = menu_pick(manager, "select profile to delete:")? else {
        return Ok(());
    };
    let remove_keys = Confirm::new("also delete its SSH key files?")
        .with_default(true)
        .prompt()?;

    delete_user(manager, &alias, remove_keys)
}

/// Builds list of profile aliases for menu to display
pub fn build_alias_list(profiles: &[Profile]) -> Vec<String> {
    let mut user_aliases: Vec<String> = profiles.iter()
        .map(|profile| profile.alias.clone())
        .collect();
    user_aliases.push(BACK_OPTION.to_string());
    user_aliases
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_offers_every_import() {
        for action in ["import from ssh config", "import from git aliases", "import ssh key"] {
            assert!(MENU_ACTIONS.contains(&action));
        }
        assert_eq!(MENU_ACTIONS.last(), Some(&"quit"));
    }

    #[test]
    fn alias_list_ends_with_back() {
        assert_eq!(build_alias_list(&[]), vec![BACK_OPTION.to_string()]);
    }
}
