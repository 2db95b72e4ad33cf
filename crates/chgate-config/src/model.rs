//! Module file schema and credential resolution.

use std::fmt;

use serde::Deserialize;

use crate::error::ResolveError;

/// Parsed module file: an ordered list of credential profiles.
///
/// Document order is preserved; it decides which entry wins when two
/// modules share a name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Configuration {
    #[serde(rename = "module", default)]
    pub modules: Vec<Module>,
}

/// A named credential profile.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Module {
    pub name: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Credentials bound to a single scrape.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Configuration {
    /// Resolve a module name to its credentials.
    ///
    /// Case-sensitive exact match. The first entry in document order wins
    /// when names repeat.
    pub fn resolve(&self, module_name: &str) -> Result<Credentials, ResolveError> {
        self.modules
            .iter()
            .find(|m| m.name == module_name)
            .map(|m| Credentials::new(m.user.as_str(), m.password.as_str()))
            .ok_or_else(|| ResolveError::ModuleNotFound(module_name.to_string()))
    }
}
