//! Compiler-emitted dependency files.
//!
//! Compilers invoked with `-MMD -MF <file>` write a make-style rule listing
//! every file the translation unit read:
//!
//! ```text
//! build/debug/src/main.o: src/main.c include/util.h \
//!   include/config.h
//! ```
//!
//! Parsing contract: backslash-newline continuations are joined, then the
//! first line containing a `:` is taken as the rule. Everything after the
//! first colon on that line is split on whitespace into prerequisite paths,
//! except that a make-escaped space (`foo\ bar.h`) stays inside the path.
//! Later rules are ignored; single-object dependency generation only ever
//! emits one. Content without any colon yields no prerequisites.
//!
//! Other make escapes (`$$`, `\#`) are not decoded, and a colon inside the
//! target (a Windows drive letter) splits the rule at the wrong place.

use std::path::{Path, PathBuf};

/// Parsed dependency rule for one object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyRecord {
  /// Text before the colon, trimmed. `None` when no rule was found.
  pub target: Option<String>,
  /// Every file the object was built from, in the order listed.
  pub prerequisites: Vec<PathBuf>,
}

impl DependencyRecord {
  pub fn parse(content: &str) -> Self {
    let joined = content.replace("\\\r\n", " ").replace("\\\n", " ");

    let Some((target, deps)) = joined.lines().find_map(|line| line.split_once(':')) else {
      return Self::default();
    };

    Self {
      target: Some(target.trim().to_string()),
      prerequisites: split_prerequisites(deps),
    }
  }

  pub fn read(path: &Path) -> std::io::Result<Self> {
    Ok(Self::parse(&std::fs::read_to_string(path)?))
  }
}

/// Split on whitespace, keeping `\ ` as a literal space.
fn split_prerequisites(deps: &str) -> Vec<PathBuf> {
  let mut paths = Vec::new();
  let mut current = String::new();
  let mut chars = deps.chars().peekable();

  while let Some(c) = chars.next() {
    if c == '\\' && chars.peek() == Some(&' ') {
      chars.next();
      current.push(' ');
    } else if c.is_whitespace() {
      if !current.is_empty() {
        paths.push(PathBuf::from(std::mem::take(&mut current)));
      }
    } else {
      current.push(c);
    }
  }
  if !current.is_empty() {
    paths.push(PathBuf::from(current));
  }

  paths
}
