//! core::command
//!
//! Shell-free command assembly.
//!
//! # Overview
//!
//! A backend describes what goes on a command line as an ordered list of
//! [`ArgSpec`] descriptors. Each descriptor contributes zero or more tokens,
//! after applying its [`Transform`]. The result is a [`Command`]: an
//! immutable argument vector whose first element is the program name.
//!
//! # Dash guard
//!
//! Many tools read an argument starting with `-` as an option. The dash guard
//! rewrites such a value to `./-value`, but only for the first token a
//! descriptor contributes. Later tokens of a list are left alone, matching
//! the usual rule that once a real path has been seen, option parsing is
//! already past.
//!
//! # Invariants
//!
//! - Descriptors are consumed strictly left to right
//! - An absent optional contributes no tokens
//! - A [`Command`] is never joined into a string for execution; see
//!   [`Command::display_line`] for the logging form
//!
//! # Example
//!
//! ```
//! use omnivc::core::command::{Command, Transform};
//! use omnivc::core::escape::Backend;
//!
//! let files = vec!["-odd".to_string(), "a@b".to_string()];
//! let cmd = Command::builder("p4")
//!     .arg("add")
//!     .opt(None::<String>)
//!     .list_with(Transform::DashGuardEscape(Backend::Perforce), files)
//!     .build();
//!
//! assert_eq!(cmd.argv(), ["p4", "add", "./-odd", "a%40b"]);
//! ```

use std::collections::BTreeSet;
use std::fmt;

use super::escape::Backend;
use super::quote;

/// Per-argument text transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transform {
    /// Pass values through unchanged.
    #[default]
    Identity,
    /// Prefix `./` to a first value that starts with `-`.
    DashGuard,
    /// Percent-encode the backend's reserved characters.
    Escape(Backend),
    /// Dash guard on the first value, then backend escaping on every value.
    DashGuardEscape(Backend),
}

impl Transform {
    fn dash_guard(self) -> bool {
        matches!(self, Transform::DashGuard | Transform::DashGuardEscape(_))
    }

    fn backend(self) -> Option<Backend> {
        match self {
            Transform::Escape(b) | Transform::DashGuardEscape(b) => Some(b),
            _ => None,
        }
    }

    /// Apply the transform to one value. `first` marks the first token a
    /// descriptor contributes.
    pub fn apply(self, value: &str, first: bool) -> String {
        let escaped = match self.backend() {
            Some(backend) => backend.escape(value),
            None => value.to_string(),
        };
        if first && self.dash_guard() && escaped.starts_with('-') {
            format!("./{}", escaped)
        } else {
            escaped
        }
    }
}

/// The value half of an argument descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    /// Exactly one token.
    Literal(String),
    /// One token, or none when absent.
    Optional(Option<String>),
    /// A fixed-size list, in order.
    List(Vec<String>),
    /// An unordered set, enumerated in sorted order.
    Set(BTreeSet<String>),
    /// An ordered sequence of unknown length.
    Seq(Vec<String>),
}

/// One argument descriptor: a value plus its transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgSpec {
    pub value: ArgValue,
    pub transform: Transform,
}

impl ArgSpec {
    /// A literal token with no transform.
    pub fn literal(value: impl Into<String>) -> Self {
        Self {
            value: ArgValue::Literal(value.into()),
            transform: Transform::Identity,
        }
    }

    /// An optional token with no transform.
    pub fn optional(value: Option<impl Into<String>>) -> Self {
        Self {
            value: ArgValue::Optional(value.map(Into::into)),
            transform: Transform::Identity,
        }
    }

    /// A fixed list with no transform.
    pub fn list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            value: ArgValue::List(values.into_iter().map(Into::into).collect()),
            transform: Transform::Identity,
        }
    }

    /// A set, enumerated sorted, with no transform.
    pub fn set<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            value: ArgValue::Set(values.into_iter().map(Into::into).collect()),
            transform: Transform::Identity,
        }
    }

    /// An ordered sequence with no transform.
    pub fn seq<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            value: ArgValue::Seq(values.into_iter().map(Into::into).collect()),
            transform: Transform::Identity,
        }
    }

    /// Replace the transform.
    pub fn with(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Append this descriptor's tokens to `out`.
    fn append_to(&self, out: &mut Vec<String>) {
        let t = self.transform;
        match &self.value {
            ArgValue::Literal(v) => out.push(t.apply(v, true)),
            ArgValue::Optional(Some(v)) => out.push(t.apply(v, true)),
            ArgValue::Optional(None) => {}
            ArgValue::List(values) | ArgValue::Seq(values) => {
                out.extend(values.iter().enumerate().map(|(i, v)| t.apply(v, i == 0)));
            }
            ArgValue::Set(values) => {
                out.extend(values.iter().enumerate().map(|(i, v)| t.apply(v, i == 0)));
            }
        }
    }
}

/// A fully assembled command: program name followed by its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    argv: Vec<String>,
}

impl Command {
    /// Assemble `program` and `specs` into a command.
    pub fn assemble(program: impl Into<String>, specs: &[ArgSpec]) -> Self {
        let mut argv = vec![program.into()];
        for spec in specs {
            spec.append_to(&mut argv);
        }
        Self { argv }
    }

    /// Start a fluent builder for `program`.
    pub fn builder(program: impl Into<String>) -> CommandBuilder {
        CommandBuilder {
            argv: vec![program.into()],
        }
    }

    /// The program name (`argv[0]`).
    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    /// Arguments after the program name.
    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }

    /// The whole argument vector.
    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// Shell-quoted rendering for logs. Never executed.
    pub fn display_line(&self) -> String {
        quote::join(&self.argv)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_line())
    }
}

/// Fluent construction of a [`Command`].
///
/// Each method is shorthand for pushing one [`ArgSpec`].
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    argv: Vec<String>,
}

impl CommandBuilder {
    /// Append a descriptor.
    pub fn spec(mut self, spec: ArgSpec) -> Self {
        spec.append_to(&mut self.argv);
        self
    }

    /// Append a literal token.
    pub fn arg(self, value: impl Into<String>) -> Self {
        self.spec(ArgSpec::literal(value))
    }

    /// Append a literal token with a transform.
    pub fn arg_with(self, transform: Transform, value: impl Into<String>) -> Self {
        self.spec(ArgSpec::literal(value).with(transform))
    }

    /// Append an optional token.
    pub fn opt(self, value: Option<impl Into<String>>) -> Self {
        self.spec(ArgSpec::optional(value))
    }

    /// Append an optional token with a transform.
    pub fn opt_with(self, transform: Transform, value: Option<impl Into<String>>) -> Self {
        self.spec(ArgSpec::optional(value).with(transform))
    }

    /// Append a fixed list.
    pub fn list<I, S>(self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spec(ArgSpec::list(values))
    }

    /// Append a fixed list with a transform.
    pub fn list_with<I, S>(self, transform: Transform, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spec(ArgSpec::list(values).with(transform))
    }

    /// Append a set in sorted order, with a transform.
    pub fn set_with<I, S>(self, transform: Transform, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spec(ArgSpec::set(values).with(transform))
    }

    /// Append an ordered sequence, with a transform.
    pub fn seq_with<I, S>(self, transform: Transform, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spec(ArgSpec::seq(values).with(transform))
    }

    /// Finish assembly.
    pub fn build(self) -> Command {
        Command { argv: self.argv }
    }
}
