//! `${VAR}` expansion for clients that do not expand variables themselves.

use std::borrow::Cow;
use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::client::ClientAdapter;
use crate::config::ServerDefinition;

static VAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}").expect("variable pattern is valid")
});

pub fn should_expand_env_vars(client: &dyn ClientAdapter) -> bool {
    client.needs_env_var_expansion()
}

/// Substitute `${NAME}` and `${NAME:-default}` from `vars`.
///
/// A name with no value and no default is left in place.
pub fn expand_env_vars<'a>(value: &'a str, vars: &HashMap<String, String>) -> Cow<'a, str> {
    VAR_RE.replace_all(value, |caps: &Captures<'_>| {
        let name = &caps[1];
        match (vars.get(name), caps.get(2)) {
            (Some(found), _) => found.clone(),
            (None, Some(default)) => default.as_str().to_string(),
            (None, None) => caps[0].to_string(),
        }
    })
}

/// Names referenced in `value` that `vars` cannot resolve and that have no default.
pub fn unresolved_vars(value: &str, vars: &HashMap<String, String>) -> Vec<String> {
    VAR_RE
        .captures_iter(value)
        .filter(|caps| caps.get(2).is_none() && !vars.contains_key(&caps[1]))
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Expand every string field of `definition` when `client` needs it.
///
/// Clients with native support get the definition back borrowed, untouched.
pub fn expand_server_env<'a>(
    definition: &'a ServerDefinition,
    client: &dyn ClientAdapter,
    vars: &HashMap<String, String>,
) -> Cow<'a, ServerDefinition> {
    if !should_expand_env_vars(client) {
        return Cow::Borrowed(definition);
    }

    let expand = |value: &str| expand_env_vars(value, vars).into_owned();
    let mut expanded = definition.clone();
    expanded.command = expand(definition.command.as_str());
    expanded.args = definition.args.iter().map(|a| expand(a.as_str())).collect();
    expanded.env = definition
        .env
        .iter()
        .map(|(k, v)| (k.clone(), expand(v.as_str())))
        .collect();
    expanded.url = definition.url.as_deref().map(expand);
    Cow::Owned(expanded)
}

/// Unresolved names across all string fields of `definition`, sorted and deduplicated.
pub fn unresolved_server_vars(
    definition: &ServerDefinition,
    vars: &HashMap<String, String>,
) -> Vec<String> {
    let values = std::iter::once(definition.command.as_str())
        .chain(definition.args.iter().map(String::as_str))
        .chain(definition.env.values().map(String::as_str))
        .chain(definition.url.as_deref());

    values
        .flat_map(|value| unresolved_vars(value, vars))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
