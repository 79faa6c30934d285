//! Field attributes such as `@env(name=FOO,type=string)`.

use std::fmt;

/// One comma-separated argument of an attribute body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeArg {
    key: Option<String>,
    value: String,
}

impl AttributeArg {
    /// Key of a `key=value` argument, if present.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Value of the argument with surrounding quotes removed.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Annotation attached to a field declaration.
///
/// Attributes carry no meaning for unification. They survive evaluation so
/// later passes (environment injection, for one) can act on them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    name: String,
    contents: String,
    args: Vec<AttributeArg>,
}

impl Attribute {
    /// Builds an attribute from its name and the raw text between the parentheses.
    ///
    /// # Examples
    ///
    /// ```
    /// use forge_blueprint::constraint::Attribute;
    ///
    /// let attr = Attribute::new("env", "name=\"HOME\", type=string");
    /// assert_eq!(attr.lookup("name"), Some("HOME"));
    /// assert_eq!(attr.lookup("type"), Some("string"));
    /// assert_eq!(attr.lookup("missing"), None);
    /// ```
    #[must_use]
    pub fn new(name: &str, contents: &str) -> Self {
        let args = split_args(contents)
            .into_iter()
            .filter(|raw| !raw.is_empty())
            .map(|raw| match raw.split_once('=') {
                Some((key, value)) => AttributeArg {
                    key: Some(key.trim().to_owned()),
                    value: unquote(value.trim()),
                },
                None => AttributeArg {
                    key: None,
                    value: unquote(&raw),
                },
            })
            .collect();
        Self {
            name: name.to_owned(),
            contents: contents.to_owned(),
            args,
        }
    }

    /// Attribute name without the leading `@`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw body text.
    #[must_use]
    pub fn contents(&self) -> &str {
        &self.contents
    }

    /// Parsed arguments in declaration order.
    #[must_use]
    pub fn args(&self) -> &[AttributeArg] {
        &self.args
    }

    /// Value of the first `key=value` argument with the given key.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.args
            .iter()
            .find(|arg| arg.key() == Some(key))
            .map(AttributeArg::value)
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}({})", self.name, self.contents)
    }
}

fn split_args(contents: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut escaped = false;
    for c in contents.chars() {
        match c {
            _ if escaped => {
                escaped = false;
                current.push(c);
            }
            '\\' if quoted => {
                escaped = true;
                current.push(c);
            }
            '"' => {
                quoted = !quoted;
                current.push(c);
            }
            ',' if !quoted => args.push(std::mem::take(&mut current).trim().to_owned()),
            _ => current.push(c),
        }
    }
    args.push(current.trim().to_owned());
    args
}

fn unquote(raw: &str) -> String {
    raw.strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .map_or_else(
            || raw.to_owned(),
            |inner| inner.replace("\\\"", "\"").replace("\\\\", "\\"),
        )
}
