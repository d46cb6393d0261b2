//! Email shape check used by the waitlist capture form.

use crate::error::ValidationError;

/// Returns true when `input` looks like `local@domain.suffix`.
///
/// Every part must be non-empty and free of `@` and of the whitespace set
/// browsers use for `\s` in form patterns. This is a shape check only; nothing
/// is resolved or delivered.
pub fn is_valid_email(input: &str) -> bool {
    let Some((local, domain)) = input.split_once('@') else {
        return false;
    };

    if !is_atom(local) || !is_atom(domain) {
        return false;
    }

    // Any dot with at least one character on each side separates the suffix.
    domain
        .char_indices()
        .any(|(idx, ch)| ch == '.' && idx > 0 && idx + 1 < domain.len())
}

/// Same check, shaped as a `Result` for callers that propagate.
pub fn validate_email(input: &str) -> Result<(), ValidationError> {
    if is_valid_email(input) {
        Ok(())
    } else {
        Err(ValidationError::MalformedEmail {
            input: input.to_string(),
        })
    }
}

fn is_atom(part: &str) -> bool {
    !part.is_empty() && !part.chars().any(|ch| ch == '@' || is_pattern_space(ch))
}

/// `\s` as browser form patterns match it; unlike `char::is_whitespace` this
/// includes U+FEFF and excludes U+0085.
fn is_pattern_space(ch: char) -> bool {
    matches!(
        ch,
        '\t' | '\n' | '\u{0B}' | '\u{0C}' | '\r' | ' '
            | '\u{A0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
            | '\u{FEFF}'
    )
}
