//! Minimal selector language for host elements.
//!
//! Supported forms:
//! - `#id`
//! - `.class` and compound `.a.b`
//! - `tag`
//! - `[attr^="prefix"]` and `[attr="value"]`

use std::fmt;
use std::str::FromStr;

use mine_analyzer_core::Error;

/// A parsed selector.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    /// Element with the given id
    Id(String),
    /// Element carrying every listed class
    Classes(Vec<String>),
    /// Element with the given tag name
    Tag(String),
    /// Element whose attribute starts with a prefix
    AttrPrefix {
        /// Attribute name
        name: String,
        /// Required prefix
        prefix: String,
    },
    /// Element whose attribute equals a value
    AttrEquals {
        /// Attribute name
        name: String,
        /// Required value
        value: String,
    },
}

impl Selector {
    /// Shorthand for [`Selector::Id`].
    pub fn id(id: impl Into<String>) -> Self {
        Selector::Id(id.into())
    }

    /// Shorthand for a single-class selector.
    pub fn class(class: impl Into<String>) -> Self {
        Selector::Classes(vec![class.into()])
    }

    /// Test a selector against an element's data.
    pub fn matches(
        &self,
        tag: &str,
        classes: &[String],
        attribute: impl Fn(&str) -> Option<String>,
    ) -> bool {
        match self {
            Selector::Id(id) => attribute("id").as_deref() == Some(id.as_str()),
            Selector::Classes(wanted) => wanted.iter().all(|c| classes.contains(c)),
            Selector::Tag(name) => tag.eq_ignore_ascii_case(name),
            Selector::AttrPrefix { name, prefix } => {
                attribute(name).is_some_and(|v| v.starts_with(prefix.as_str()))
            }
            Selector::AttrEquals { name, value } => {
                attribute(name).as_deref() == Some(value.as_str())
            }
        }
    }

    fn parse_attribute(body: &str) -> Option<Self> {
        let unquote = |v: &str| v.trim().trim_matches(|c: char| c == '"' || c == '\'').to_string();
        if let Some((name, prefix)) = body.split_once("^=") {
            return Some(Selector::AttrPrefix {
                name: name.trim().to_string(),
                prefix: unquote(prefix),
            });
        }
        let (name, value) = body.split_once('=')?;
        Some(Selector::AttrEquals {
            name: name.trim().to_string(),
            value: unquote(value),
        })
    }
}

impl FromStr for Selector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || Error::InvalidSelector(s.to_string());
        let is_name = |n: &str| {
            !n.is_empty()
                && n
                    .chars()
                    .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
        };

        if let Some(id) = s.strip_prefix('#') {
            return if is_name(id) {
                Ok(Selector::Id(id.to_string()))
            } else {
                Err(invalid())
            };
        }

        if let Some(rest) = s.strip_prefix('.') {
            let classes: Vec<String> = rest.split('.').map(str::to_string).collect();
            return if classes.iter().all(|c| is_name(c)) {
                Ok(Selector::Classes(classes))
            } else {
                Err(invalid())
            };
        }

        if let Some(body) = s.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
            return Self::parse_attribute(body)
                .filter(|sel| match sel {
                    Selector::AttrPrefix { name, .. } | Selector::AttrEquals { name, .. } => {
                        is_name(name)
                    }
                    _ => false,
                })
                .ok_or_else(invalid);
        }

        if is_name(s) && s.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Ok(Selector::Tag(s.to_string()));
        }

        Err(invalid())
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Id(id) => write!(f, "#{id}"),
            Selector::Classes(classes) => write!(f, ".{}", classes.join(".")),
            Selector::Tag(tag) => f.write_str(tag),
            Selector::AttrPrefix { name, prefix } => write!(f, "[{name}^=\"{prefix}\"]"),
            Selector::AttrEquals { name, value } => write!(f, "[{name}=\"{value}\"]"),
        }
    }
}
