//! core::quote
//!
//! Human-readable rendering of an argument list.
//!
//! The rendered line is only ever logged (verbose, dry-run, debug). It is
//! never handed to a shell: commands are executed from their argument vector.

/// Characters that force a token to be quoted.
const SPECIAL: &[char] = &[
    '\'', '"', '\\', '$', '`', '!', '&', '|', ';', '<', '>', '(', ')', '*', '?', '[', ']', '#',
    '~', '{', '}',
];

/// Whether `token` needs quoting to read back as a single shell word.
pub fn needs_quoting(token: &str) -> bool {
    token.is_empty() || token.chars().any(|c| c.is_whitespace() || SPECIAL.contains(&c))
}

/// Quote a single token in POSIX single-quote style.
///
/// Tokens that need no quoting are returned unchanged. Embedded single
/// quotes are written as `'\''`.
///
/// ```
/// use omnivc::core::quote::quote;
///
/// assert_eq!(quote("plain"), "plain");
/// assert_eq!(quote("two words"), "'two words'");
/// assert_eq!(quote(""), "''");
/// assert_eq!(quote("it's"), r"'it'\''s'");
/// ```
pub fn quote(token: &str) -> String {
    if !needs_quoting(token) {
        return token.to_string();
    }
    let mut out = String::with_capacity(token.len() + 2);
    out.push('\'');
    for c in token.chars() {
        if c == '\'' {
            out.push_str("'\\''");
        } else {
            out.push(c);
        }
    }
    out.push('\'');
    out
}

/// Render a whole argument list as one display line.
pub fn join<I, S>(tokens: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tokens
        .into_iter()
        .map(|t| quote(t.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}
