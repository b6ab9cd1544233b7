//! Qualified driver references.
//!
//! The merger writes `<namespace>::<DriverName>` into every root and the
//! registry strips the same prefix to find the implementation, so both sides
//! must share one [`DriverNamespace`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Namespace used when none is configured.
pub const DEFAULT_DRIVER_NAMESPACE: &str = "finderbridge::drivers";

/// Separator between the namespace and the driver name.
const SEPARATOR: &str = "::";

/// The prefix that turns a driver name into an instantiable reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DriverNamespace(String);

impl DriverNamespace {
    /// Create a namespace. Trailing separators are trimmed.
    pub fn new(namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        Self(namespace.trim_end_matches(SEPARATOR).to_string())
    }

    /// The namespace without separator.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Qualify `name`. Already qualified names are returned unchanged.
    pub fn qualify(&self, name: &str) -> String {
        if self.strip(name).is_some() {
            name.to_string()
        } else {
            format!("{}{}{}", self.0, SEPARATOR, name)
        }
    }

    /// The driver name inside a qualified reference, if it belongs to this
    /// namespace.
    pub fn strip<'a>(&self, qualified: &'a str) -> Option<&'a str> {
        qualified
            .strip_prefix(self.0.as_str())?
            .strip_prefix(SEPARATOR)
            .filter(|name| !name.is_empty() && !name.contains(SEPARATOR))
    }
}

impl Default for DriverNamespace {
    fn default() -> Self {
        Self::new(DEFAULT_DRIVER_NAMESPACE)
    }
}

impl fmt::Display for DriverNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
