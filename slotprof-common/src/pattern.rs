//! Wildcard patterns for filtering frame names.
//!
//! A pattern is compiled once into one of five shapes. Only a single `*` acts
//! as a wildcard; any further `*` is matched literally.
//!
//! | shape        | example   | matches when the name...                 |
//! |--------------|-----------|------------------------------------------|
//! | `Exact`      | `foo`     | equals `foo`                             |
//! | `BodyExact`  | `*foo*`   | contains `foo`                           |
//! | `PreAny`     | `*foo`    | ends with `foo`                          |
//! | `PostAny`    | `foo*`    | starts with `foo`                        |
//! | `BodyAny`    | `foo*bar` | starts with `foo` and ends with `bar`    |

use alloc::string::{String, ToString};

/// A compiled wildcard pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    /// `foo`
    Exact(String),
    /// `*foo*`
    BodyExact(String),
    /// `*foo`
    PreAny(String),
    /// `foo*`
    PostAny(String),
    /// `foo*bar`
    BodyAny { head: String, tail: String },
}

impl Pattern {
    /// Compile `pattern` into its shape.
    ///
    /// ```
    /// use slotprof_common::pattern::Pattern;
    ///
    /// assert_eq!(Pattern::parse("*io*"), Pattern::BodyExact("io".into()));
    /// assert_eq!(
    ///     Pattern::parse("read*line"),
    ///     Pattern::BodyAny { head: "read".into(), tail: "line".into() }
    /// );
    /// ```
    #[must_use]
    pub fn parse(pattern: &str) -> Self {
        let starts = pattern.starts_with('*');
        let ends = pattern.ends_with('*');

        if pattern.len() > 1 && starts && ends {
            Self::BodyExact(pattern[1..pattern.len() - 1].to_string())
        } else if starts {
            Self::PreAny(pattern[1..].to_string())
        } else if ends {
            Self::PostAny(pattern[..pattern.len() - 1].to_string())
        } else if let Some((head, tail)) = pattern.split_once('*') {
            Self::BodyAny { head: head.to_string(), tail: tail.to_string() }
        } else {
            Self::Exact(pattern.to_string())
        }
    }

    /// Test `name` against this pattern.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::Exact(exact) => name == exact,
            Self::BodyExact(body) => name.contains(body.as_str()),
            Self::PreAny(suffix) => name.ends_with(suffix.as_str()),
            Self::PostAny(prefix) => name.starts_with(prefix.as_str()),
            // Head and tail may overlap only if the name is long enough for both
            Self::BodyAny { head, tail } => {
                name.len() >= head.len() + tail.len()
                    && name.starts_with(head.as_str())
                    && name.ends_with(tail.as_str())
            }
        }
    }
}

/// Compile `pattern` and test `name` against it in one go.
#[must_use]
pub fn matches(pattern: &str, name: &str) -> bool {
    Pattern::parse(pattern).matches(name)
}
