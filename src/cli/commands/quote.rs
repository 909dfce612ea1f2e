//! quote command - Assemble a command and print its display line

use anyhow::Result;

use crate::core::command::{Command, Transform};
use crate::core::escape::Backend;

/// The transform selected by the quote flags.
pub fn transform_for(escape: Option<Backend>, dash_guard: bool) -> Transform {
    match (escape, dash_guard) {
        (None, false) => Transform::Identity,
        (None, true) => Transform::DashGuard,
        (Some(backend), false) => Transform::Escape(backend),
        (Some(backend), true) => Transform::DashGuardEscape(backend),
    }
}

/// Print the display line of `program` followed by `args` as one list.
pub fn quote(program: &str, args: &[String], escape: Option<Backend>, dash_guard: bool) -> Result<i32> {
    let command = Command::builder(program)
        .list_with(transform_for(escape, dash_guard), args.iter().cloned())
        .build();
    println!("{}", command.display_line());
    Ok(0)
}
