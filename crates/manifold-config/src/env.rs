use std::sync::OnceLock;

use regex::{Captures, Regex};

/// Matches `{{ env.VAR }}` and `{{ env.VAR | default("fallback") }}`.
/// Group 1 is the scoped key, group 2 the optional fallback.
fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"\{\{\s*([A-Za-z0-9_.]+)\s*(?:\|\s*default\("([^"]*)"\))?\s*\}\}"#)
            .expect("must be valid regex")
    })
}

/// Expand `{{ env.VAR }}` placeholders in a raw TOML document
///
/// `{{ env.VAR | default("fallback") }}` substitutes the fallback when
/// the variable is unset. Expansion runs on the raw text before
/// deserialization, so config structs stay plain String/SecretString.
/// TOML comment lines keep their placeholders verbatim.
pub fn expand_env(input: &str) -> Result<String, String> {
    let mut output = String::with_capacity(input.len());

    for (index, line) in input.lines().enumerate() {
        if index > 0 {
            output.push('\n');
        }

        if line.trim_start().starts_with('#') {
            output.push_str(line);
            continue;
        }

        output.push_str(&expand_line(line)?);
    }

    if input.ends_with('\n') {
        output.push('\n');
    }

    Ok(output)
}

fn expand_line(line: &str) -> Result<String, String> {
    // replace_all cannot fail early, so the first failure is parked here
    let mut failure: Option<String> = None;

    let expanded = placeholder_re().replace_all(line, |captures: &Captures<'_>| {
        match resolve(captures) {
            Ok(value) => value,
            Err(e) => {
                failure.get_or_insert(e);
                String::new()
            }
        }
    });

    match failure {
        Some(e) => Err(e),
        None => Ok(expanded.into_owned()),
    }
}

/// Resolve one placeholder against the process environment
fn resolve(captures: &Captures<'_>) -> Result<String, String> {
    let key = &captures[1];
    let var = key
        .strip_prefix("env.")
        .filter(|name| !name.contains('.'))
        .ok_or_else(|| format!("unsupported placeholder `{key}`, only `env.NAME` variables are available"))?;

    match std::env::var(var) {
        Ok(value) => Ok(value),
        Err(_) => captures
            .get(2)
            .map(|fallback| fallback.as_str().to_owned())
            .ok_or_else(|| format!("environment variable not found: `{var}`")),
    }
}
