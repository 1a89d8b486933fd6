//! Command template rendering.

/// Replace every `{key}` in `template` with its value.
///
/// The template is scanned once, left to right; substituted values are never
/// expanded again. Unknown placeholders are left untouched so shell syntax
/// such as `${HOME}` survives rendering.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after
            .find('}')
            .and_then(|close| vars.iter().find(|(key, _)| *key == &after[..close]).map(|(_, v)| (close, v)));

        match value {
            Some((close, value)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Join an optional per-router wrapper and a command
pub fn with_prefix(prefix: Option<&str>, command: &str) -> String {
    match prefix {
        Some(p) if !p.trim().is_empty() => format!("{} {}", p.trim(), command),
        _ => command.to_string(),
    }
}
