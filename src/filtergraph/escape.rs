use crate::foundation::error::{ComposerError, ComposerResult};

/// Escape a value for the option parser (`key=value` inside one filter).
pub fn escape_option_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '\'' | ':') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escape an already option-escaped string for the graph parser.
pub fn escape_graph(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '\'' | '[' | ']' | ',' | ';') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Both levels, in the order ffmpeg undoes them.
pub fn escape_value(value: &str) -> String {
    escape_graph(&escape_option_value(value))
}

/// Reject strings that cannot be carried through a filter option at all.
pub fn validate_user_text(value: &str) -> ComposerResult<()> {
    if value.chars().any(|c| c.is_control()) {
        return Err(ComposerError::validation(
            "text must not contain control characters",
        ));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/filtergraph/escape.rs"]
mod tests;
