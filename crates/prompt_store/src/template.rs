//! `{{name}}` placeholder substitution.

use std::collections::BTreeMap;

use thiserror::Error;

/// Placeholder reserved for the user input. Left untouched unless a variable of
/// the same name is supplied.
pub const INPUT_VARIABLE: &str = "input";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("missing required variable: {0}")]
    MissingVariable(String),
}

/// Replaces every `{{name}}` (inner whitespace allowed) with its value.
///
/// Substituted values are not scanned again. Text between braces that is not a
/// variable name is copied through.
pub fn apply(text: &str, variables: &BTreeMap<String, String>) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];
        let Some(end) = after_open.find("}}") else {
            out.push_str(&rest[start..]);
            return Ok(out);
        };

        let name = after_open[..end].trim();
        if !is_variable_name(name) {
            out.push_str("{{");
            rest = after_open;
            continue;
        }

        let after_close = &after_open[end + 2..];
        match variables.get(name) {
            Some(value) => out.push_str(value),
            None if name == INPUT_VARIABLE => out.push_str(&rest[start..start + 4 + end]),
            None => return Err(TemplateError::MissingVariable(name.to_owned())),
        }
        rest = after_close;
    }

    out.push_str(rest);
    Ok(out)
}

fn is_variable_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}
