//! core::escape
//!
//! Backend-specific percent escaping of argument values.
//!
//! # Overview
//!
//! Some backends give special meaning to characters inside file arguments.
//! Perforce treats `@` and `#` as revision specifiers, `*` as a wildcard and
//! `%` as the escape introducer, so a literal file named `a@b` must be passed
//! as `a%40b`. Subversion only reserves `@` (peg revisions).
//!
//! Escaping is a pure `&str -> String` function: each reserved character is
//! replaced by `%` followed by two uppercase hexadecimal digits.
//!
//! # Example
//!
//! ```
//! use omnivc::core::escape::Backend;
//!
//! assert_eq!(Backend::Perforce.escape("50%@rev#1*"), "50%25%40rev%231%2A");
//! assert_eq!(Backend::Subversion.escape("50%@rev"), "50%%40rev");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Backends whose command syntax needs argument escaping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Perforce: escapes `@ # * %`.
    Perforce,
    /// Subversion: escapes `@` only.
    Subversion,
}

impl Backend {
    /// Characters this backend reserves.
    pub fn reserved(self) -> &'static [char] {
        match self {
            Backend::Perforce => &['@', '#', '*', '%'],
            Backend::Subversion => &['@'],
        }
    }

    /// Whether `c` must be escaped for this backend.
    pub fn is_reserved(self, c: char) -> bool {
        self.reserved().contains(&c)
    }

    /// Percent-encode every reserved character in `value`.
    pub fn escape(self, value: &str) -> String {
        let mut out = String::with_capacity(value.len());
        for c in value.chars() {
            if self.is_reserved(c) {
                // Reserved characters are all ASCII.
                out.push_str(&format!("%{:02X}", c as u32));
            } else {
                out.push(c);
            }
        }
        out
    }

    /// Reverse [`Backend::escape`].
    ///
    /// Only uppercase `%XX` sequences that decode to one of this backend's
    /// reserved characters are rewritten; everything else is copied through.
    /// For Perforce, which reserves `%` itself, `unescape(escape(s)) == s`
    /// for every `s`. Subversion leaves `%` alone, so the round trip holds
    /// only for inputs that do not already contain the text `%40`.
    pub fn unescape(self, value: &str) -> String {
        let mut out = String::with_capacity(value.len());
        let mut rest = value;
        while let Some(pos) = rest.find('%') {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];
            match decode_reserved(self, tail) {
                Some(c) => {
                    out.push(c);
                    rest = &tail[3..];
                }
                None => {
                    out.push('%');
                    rest = &tail[1..];
                }
            }
        }
        out.push_str(rest);
        out
    }

    /// All backends with an escape style.
    pub fn all() -> &'static [Backend] {
        &[Backend::Perforce, Backend::Subversion]
    }

    /// Lookup by name (`perforce`/`p4`, `subversion`/`svn`).
    pub fn from_name(name: &str) -> Option<Backend> {
        match name {
            "perforce" | "p4" => Some(Backend::Perforce),
            "subversion" | "svn" => Some(Backend::Subversion),
            _ => None,
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Perforce => write!(f, "perforce"),
            Backend::Subversion => write!(f, "subversion"),
        }
    }
}

/// Decode a leading `%XX` in `s` if it names a reserved character.
fn decode_reserved(backend: Backend, s: &str) -> Option<char> {
    let hex = s.get(1..3)?;
    let byte = u8::from_str_radix(hex, 16).ok()?;
    let c = char::from(byte);
    if backend.is_reserved(c) && hex.chars().all(|h| !h.is_ascii_lowercase()) {
        Some(c)
    } else {
        None
    }
}
