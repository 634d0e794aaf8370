//! Named runtime flags (workspace URL, credentials)

use crate::config::Config;
use crate::{Error, Result};
use std::collections::HashMap;
use std::env;

/// Flag values from the configuration, falling back to the environment
#[derive(Debug, Clone, Default)]
pub struct Flags {
    values: HashMap<String, String>,
    from_env: bool,
}

impl Flags {
    /// Only the given values, no environment fallback
    pub fn new(values: HashMap<String, String>) -> Self {
        Self {
            values,
            from_env: false,
        }
    }

    /// The `[flags]` table, then the upper-cased flag name as environment variable
    pub fn from_config(config: &Config) -> Self {
        Self {
            values: config.flags.clone(),
            from_env: true,
        }
    }

    pub fn set<K: Into<String>, V: Into<String>>(&mut self, name: K, value: V) {
        self.values.insert(name.into(), value.into());
    }

    /// Value of `name`; unset and empty values are both `MissingFlag`
    pub fn get(&self, name: &str) -> Result<String> {
        let value = match self.values.get(name) {
            Some(value) => Some(value.clone()),
            None if self.from_env => env::var(name.to_uppercase()).ok(),
            None => None,
        };

        match value {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(Error::missing_flag(name)),
        }
    }
}
