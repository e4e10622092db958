//! Plugin and hasher configuration.
//!
//! Options can be built in code, or read from TOML/JSON:
//!
//! ```toml
//! fields = ["password", "nested.pwd1"]
//! rounds = 8
//! ```
//!
//! `field = "password"` is accepted as well; when both keys are present `fields` wins.

use crate::errors::{FieldHashError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

const MEMORY_ENV: &str = "FIELDHASH_MEMORY_KIB";

/// Cost factor used when neither the field nor the plugin configures one.
pub const DEFAULT_ROUNDS: u32 = 10;

/// Field protected when no field is configured or discovered.
pub const DEFAULT_FIELD: &str = "password";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl From<OneOrMany> for Vec<String> {
    fn from(v: OneOrMany) -> Self {
        match v {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PluginOptionsSerde {
    #[serde(default)]
    fields: Option<OneOrMany>,
    #[serde(default)]
    field: Option<OneOrMany>,
    #[serde(default)]
    rounds: Option<u32>,
}

impl From<PluginOptionsSerde> for PluginOptions {
    fn from(raw: PluginOptionsSerde) -> Self {
        let fields = raw.fields.or(raw.field).map(Vec::from).unwrap_or_default();
        Self { fields, rounds: raw.rounds }
    }
}

/// Options recognised by [`crate::plugin::FieldHashPlugin::attach`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PluginOptionsSerde")]
pub struct PluginOptions {
    /// Explicitly protected paths, in order.
    pub fields: Vec<String>,
    /// Plugin-level cost factor. `Some(0)` is treated as unset.
    pub rounds: Option<u32>,
}

impl PluginOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn field(mut self, path: impl Into<String>) -> Self {
        self.fields.push(path.into());
        self
    }

    #[must_use]
    pub fn fields<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(paths.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub const fn rounds(mut self, rounds: u32) -> Self {
        self.rounds = Some(rounds);
        self
    }

    /// Plugin-level rounds with `0` folded into "unset".
    #[must_use]
    pub fn plugin_rounds(&self) -> Option<u32> {
        self.rounds.filter(|r| *r > 0)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| FieldHashError::Config(e.to_string()))
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path)
            .map_err(|e| FieldHashError::Io(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&s)
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

/// Argon2 resources that are not expressed through rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HasherConfig {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    pub lanes: u32,
}

impl Default for HasherConfig {
    fn default() -> Self {
        Self { memory_kib: argon2::Params::DEFAULT_M_COST, lanes: argon2::Params::DEFAULT_P_COST }
    }
}

impl HasherConfig {
    /// Defaults, with `FIELDHASH_MEMORY_KIB` overriding the memory cost when it parses.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_memory_override(std::env::var(MEMORY_ENV).ok().as_deref())
    }

    fn with_memory_override(mut self, raw: Option<&str>) -> Self {
        if let Some(s) = raw {
            match s.trim().parse::<u32>() {
                Ok(kib) => self.memory_kib = kib,
                Err(e) => log::warn!("ignoring {MEMORY_ENV}={s}: {e}"),
            }
        }
        self
    }
}
