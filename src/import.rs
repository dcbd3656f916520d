use std::sync::LazyLock;

use log::{debug, info};
use regex::Regex;
use uuid::Uuid;

use crate::{
    alias::{allocate, slugify},
    config::{DEFAULT_HOST, Paths, expand_home},
    profile::{Profile, Registry},
};

static ALIAS_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^alias\.(\S+)\s+(.+)$").expect("valid regex"));
static NAME_ARG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"user\.name\s+"([^"]+)""#).expect("valid regex"));
static EMAIL_ARG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"user\.email\s+"([^"]+)""#).expect("valid regex"));

const ALIAS_SUFFIXES: [&str; 2] = ["-global", "-local"];
const ALIAS_PREFIXES: [&str; 3] = ["github-", "gitlab-", "bitbucket-"];

/// One `Host` stanza of an SSH client config
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HostBlock {
    pub aliases: Vec<String>,
    pub host_name: Option<String>,
    pub identity_file: Option<String>,
}

/// Splits `Keyword value` or `Keyword=value`
fn split_keyword(line: &str) -> (&str, &str) {
    let end = line
        .find(|ch: char| ch.is_whitespace() || ch == '=')
        .unwrap_or(line.len());
    let value = line[end..].trim_start();
    let value = value.strip_prefix('=').unwrap_or(value).trim();
    (&line[..end], value)
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(value)
}

/// Groups SSH config lines into `Host` stanzas
///
/// A `Match` line closes the current stanza and opens one with no aliases.
pub fn parse_host_blocks(text: &str) -> Vec<HostBlock> {
    let mut blocks = Vec::new();
    let mut current: Option<HostBlock> = None;

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (keyword, value) = split_keyword(line);
        match keyword.to_ascii_lowercase().as_str() {
            "host" | "match" => {
                blocks.extend(current.take());
                let aliases = if keyword.eq_ignore_ascii_case("host") {
                    value.split_whitespace().map(str::to_string).collect()
                } else {
                    Vec::new()
                };
                current = Some(HostBlock { aliases, ..HostBlock::default() });
            }
            "hostname" => {
                if let Some(block) = current.as_mut() {
                    block.host_name = Some(value.to_string());
                }
            }
            "identityfile" => {
                if let Some(block) = current.as_mut() {
                    block.identity_file.get_or_insert_with(|| unquote(value).to_string());
                }
            }
            _ => {}
        }
    }
    blocks.extend(current);
    blocks
}

fn has_wildcard(value: &str) -> bool {
    value.contains(['*', '?'])
}

/// Adds a profile for every concrete `Host` alias not yet in the registry
///
/// Returns the number of profiles created.
pub fn import_ssh_hosts(registry: &mut Registry, text: &str) -> usize {
    let mut imported = 0;

    for block in parse_host_blocks(text) {
        let Some(identity_file) = block.identity_file.as_deref() else {
            continue;
        };
        let key_path = expand_home(identity_file).to_string_lossy().into_owned();
        if has_wildcard(&key_path) {
            continue;
        }

        for raw_alias in &block.aliases {
            if raw_alias.starts_with('!') || has_wildcard(raw_alias) || raw_alias.contains(char::is_whitespace) {
                continue;
            }
            let alias = slugify(raw_alias);
            if alias.is_empty() {
                continue;
            }
            if registry.find_by_alias(raw_alias).is_some() || registry.find_by_alias(&alias).is_some() {
                debug!("host '{raw_alias}' already managed, skipping");
                continue;
            }

            info!("importing host '{raw_alias}' as profile '{alias}'");
            registry.profiles.push(Profile {
                alias,
                email: String::new(),
                host: block.host_name.clone().unwrap_or_else(|| DEFAULT_HOST.to_string()),
                id: Uuid::new_v4().to_string(),
                name: raw_alias.clone(),
                public_key_path: format!("{key_path}.pub"),
                ssh_key_path: key_path.clone(),
            });
            imported += 1;
        }
    }
    imported
}

/// Identity carried by a shell-escape git alias
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasCredential {
    /// Alias key, e.g. `work-global`
    pub key: String,
    /// Slug the key maps to, e.g. `work`
    pub base: String,
    pub name: String,
    pub email: String,
}

/// Maps an alias key to its base slug by dropping known suffixes and prefixes
pub fn base_from_alias_key(key: &str) -> String {
    let mut base = key;
    for suffix in ALIAS_SUFFIXES {
        base = base.strip_suffix(suffix).unwrap_or(base);
    }
    for prefix in ALIAS_PREFIXES {
        base = base.strip_prefix(prefix).unwrap_or(base);
    }
    slugify(base)
}

/// Parses `alias.<key> <value>` lines, keeping those that set both name and email
pub fn parse_alias_credentials<S: AsRef<str>>(lines: &[S]) -> Vec<AliasCredential> {
    lines
        .iter()
        .filter_map(|line| {
            let captures = ALIAS_LINE.captures(line.as_ref().trim())?;
            let key = captures.get(1)?.as_str();
            let value = captures.get(2)?.as_str();
            if !value.starts_with('!') {
                return None;
            }
            let name = NAME_ARG.captures(value)?.get(1)?.as_str().trim().to_string();
            let email = EMAIL_ARG.captures(value)?.get(1)?.as_str().trim().to_string();
            let base = base_from_alias_key(key);
            if base.is_empty() {
                return None;
            }
            Some(AliasCredential { key: key.to_string(), base, name, email })
        })
        .collect()
}

/// Picks the profile a credential belongs to, by alias containment
fn match_profile(registry: &Registry, base: &str) -> Option<usize> {
    let candidates: Vec<usize> = registry
        .profiles
        .iter()
        .enumerate()
        .filter(|(_, profile)| profile.alias.contains(base))
        .map(|(index, _)| index)
        .collect();

    let suffix = format!("-{base}");
    match candidates.as_slice() {
        [] => None,
        [only] => Some(*only),
        [first, ..] => candidates
            .iter()
            .find(|&&index| registry.profiles[index].alias == base)
            .or_else(|| {
                candidates
                    .iter()
                    .find(|&&index| registry.profiles[index].alias.ends_with(&suffix))
            })
            .copied()
            .or(Some(*first)),
    }
}

/// Merges alias credentials into the registry
///
/// Returns the number of profiles created or changed.
///
/// # Arguments
/// * `registry` - Profiles to update in place
/// * `lines` - `alias.<key> <value>` definitions
/// * `paths` - Locations used to derive key paths for new profiles
pub fn import_alias_credentials<S: AsRef<str>>(
    registry: &mut Registry,
    lines: &[S],
    paths: &Paths,
) -> usize {
    let mut touched = 0;

    // Later definitions of the same base win
    let mut credentials: Vec<AliasCredential> = Vec::new();
    for credential in parse_alias_credentials(lines) {
        match credentials.iter_mut().find(|seen| seen.base == credential.base) {
            Some(seen) => *seen = credential,
            None => credentials.push(credential),
        }
    }

    for credential in credentials {
        match match_profile(registry, &credential.base) {
            Some(index) => {
                let profile = &mut registry.profiles[index];
                if profile.name != credential.name || profile.email != credential.email {
                    info!("updating profile '{}' from alias '{}'", profile.alias, credential.key);
                    profile.name = credential.name;
                    profile.email = credential.email;
                    touched += 1;
                }
            }
            None => {
                let alias = allocate(&credential.base, &registry.aliases_except(None));
                let key_path = paths.key_path_for(&alias).to_string_lossy().into_owned();
                info!("creating profile '{alias}' from alias '{}'", credential.key);
                registry.profiles.push(Profile {
                    alias,
                    email: credential.email,
                    host: DEFAULT_HOST.to_string(),
                    id: Uuid::new_v4().to_string(),
                    name: credential.name,
                    public_key_path: format!("{key_path}.pub"),
                    ssh_key_path: key_path,
                });
                touched += 1;
            }
        }
    }
    touched
}

#[cfg(test)]
mod tests {
    use super::*;

    const SSH_TEXT: &str = "\
Host *
  ServerAliveInterval 60

Host work
  HostName github.com
  IdentityFile ~/.ssh/id_work

Host personal home
  HostName gitlab.com
  IdentityFile /keys/id_personal

Host nokey
  HostName example.com

Host glob
  IdentityFile ~/.ssh/id_*
";

    #[test]
    fn parses_host_blocks() {
        let blocks = parse_host_blocks(SSH_TEXT);
        assert_eq!(blocks.len(), 5);
        assert_eq!(blocks[1].aliases, vec!["work"]);
        assert_eq!(blocks[1].host_name.as_deref(), Some("github.com"));
        assert_eq!(blocks[2].aliases, vec!["personal", "home"]);
        assert_eq!(blocks[3].identity_file, None);
    }

    #[test]
    fn parses_equals_syntax_and_quoted_paths() {
        let blocks = parse_host_blocks("Host=box\nIdentityFile=\"/k/my key\"\nHOSTNAME box.lan\n");
        assert_eq!(blocks[0].aliases, vec!["box"]);
        assert_eq!(blocks[0].identity_file.as_deref(), Some("/k/my key"));
        assert_eq!(blocks[0].host_name.as_deref(), Some("box.lan"));
    }

    #[test]
    fn imports_concrete_hosts_only() {
        let mut registry = Registry::default();
        assert_eq!(import_ssh_hosts(&mut registry, SSH_TEXT), 3);

        let work = registry.find_by_alias("work").unwrap();
        assert_eq!(work.host, "github.com");
        assert_eq!(work.name, "work");
        assert_eq!(work.email, "");
        assert_eq!(work.ssh_key_path, expand_home("~/.ssh/id_work").to_string_lossy());
        assert_eq!(work.public_key_path, format!("{}.pub", work.ssh_key_path));

        let home = registry.find_by_alias("home").unwrap();
        assert_eq!(home.ssh_key_path, "/keys/id_personal");
        assert_eq!(home.host, "gitlab.com");
    }

    #[test]
    fn ssh_import_is_idempotent() {
        let mut registry = Registry::default();
        import_ssh_hosts(&mut registry, SSH_TEXT);
        assert_eq!(import_ssh_hosts(&mut registry, SSH_TEXT), 0);
        assert_eq!(registry.profiles.len(), 3);
    }

    #[test]
    fn ssh_import_slugifies_host_tokens() {
        let mut registry = Registry::default();
        let text = "Host GitHub.com-Work\n  IdentityFile /k/id\n";
        assert_eq!(import_ssh_hosts(&mut registry, text), 1);
        assert_eq!(registry.profiles[0].alias, "github-com-work");
        assert_eq!(registry.profiles[0].name, "GitHub.com-Work");
        assert_eq!(import_ssh_hosts(&mut registry, text), 0);
    }

    #[test]
    fn base_strips_known_affixes() {
        assert_eq!(base_from_alias_key("work-global"), "work");
        assert_eq!(base_from_alias_key("github-personal-local"), "personal");
        assert_eq!(base_from_alias_key("Side_Project"), "side_project");
    }

    #[test]
    fn parses_only_credential_aliases() {
        let lines = [
            r#"alias.work-global !git config --global user.name "Jane Doe" && git config --global user.email "jane@corp.com""#,
            r#"alias.co checkout"#,
            r#"alias.half !git config user.name "Only Name""#,
            r#"alias.plain git config user.name "A" user.email "b@c.d""#,
        ];
        let parsed = parse_alias_credentials(&lines);
        assert_eq!(
            parsed,
            vec![AliasCredential {
                key: "work-global".to_string(),
                base: "work".to_string(),
                name: "Jane Doe".to_string(),
                email: "jane@corp.com".to_string(),
            }]
        );
    }

    fn profile(alias: &str) -> Profile {
        Profile {
            alias: alias.to_string(),
            email: String::new(),
            host: DEFAULT_HOST.to_string(),
            id: Uuid::new_v4().to_string(),
            name: alias.to_string(),
            public_key_path: String::new(),
            ssh_key_path: String::new(),
        }
    }

    #[test]
    fn prefers_exact_then_suffix_match() {
        let registry = Registry {
            profiles: vec![profile("workshop"), profile("acme-work"), profile("work")],
        };
        assert_eq!(match_profile(&registry, "work"), Some(2));

        let registry = Registry {
            profiles: vec![profile("workshop"), profile("acme-work")],
        };
        assert_eq!(match_profile(&registry, "work"), Some(1));

        let registry = Registry {
            profiles: vec![profile("workshop"), profile("workbench")],
        };
        assert_eq!(match_profile(&registry, "work"), Some(0));
    }

    #[test]
    fn alias_import_updates_creates_and_is_idempotent() {
        let paths = Paths::new("/cfg", "/home/u/.ssh");
        let mut registry = Registry { profiles: vec![profile("work")] };
        let lines = [
            r#"alias.work-global !git config --global user.name "Jane" && git config --global user.email "jane@corp.com""#,
            r#"alias.work-local !git config user.name "Jane" && git config user.email "jane@corp.com""#,
            r#"alias.github-oss !git config user.name "J D" && git config user.email "jd@oss.dev""#,
        ];

        assert_eq!(import_alias_credentials(&mut registry, &lines, &paths), 2);
        let work = registry.find_by_alias("work").unwrap();
        assert_eq!((work.name.as_str(), work.email.as_str()), ("Jane", "jane@corp.com"));
        let oss = registry.find_by_alias("oss").unwrap();
        assert_eq!(oss.email, "jd@oss.dev");
        assert_eq!(oss.ssh_key_path, "/home/u/.ssh/id_ed25519_oss");

        assert_eq!(import_alias_credentials(&mut registry, &lines, &paths), 0);
        assert_eq!(registry.profiles.len(), 2);
    }

    #[test]
    fn alias_import_with_conflicting_definitions_settles() {
        let paths = Paths::new("/cfg", "/home/u/.ssh");
        let mut registry = Registry { profiles: vec![profile("work")] };
        let lines = [
            r#"alias.work-global !git config --global user.name "Jane" && git config --global user.email "jane@corp.com""#,
            r#"alias.work-local !git config user.name "Jane" && git config user.email "jane@client.com""#,
        ];

        assert_eq!(import_alias_credentials(&mut registry, &lines, &paths), 1);
        assert_eq!(registry.find_by_alias("work").unwrap().email, "jane@client.com");
        assert_eq!(import_alias_credentials(&mut registry, &lines, &paths), 0);
        assert_eq!(registry.profiles.len(), 1);
    }
}
