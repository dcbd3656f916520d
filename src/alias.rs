/// Alias used when free text slugifies to nothing
pub const FALLBACK_ALIAS: &str = "profile";

/// Turns free text into an alias candidate made of `a-z`, `0-9`, `-` and `_`
///
/// Disallowed runs collapse to a single `-`, and edge dashes are trimmed.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for ch in text.trim().to_lowercase().chars() {
        let allowed = ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' || ch == '-';
        let next = if allowed { ch } else { '-' };
        if next == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(next);
    }
    slug.trim_matches('-').to_string()
}

/// Returns `candidate` if no other profile uses it, else the first free `candidate-N` (N >= 2)
///
/// # Arguments
/// * `candidate` - Desired alias
/// * `existing` - Aliases already taken, excluding the profile being edited
pub fn allocate<S: AsRef<str>>(candidate: &str, existing: &[S]) -> String {
    let taken = |alias: &str| existing.iter().any(|other| other.as_ref() == alias);
    if !taken(candidate) {
        return candidate.to_string();
    }
    (2..)
        .map(|index| format!("{candidate}-{index}"))
        .find(|alias| !taken(alias.as_str()))
        .unwrap_or_else(|| candidate.to_string())
}
