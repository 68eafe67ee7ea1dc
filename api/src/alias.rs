//! Affiliation aliases: raw `belong` strings from the feed → canonical display names.

use crate::client::{ApiError, ApiResult};
use log::warn;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;

const BUNDLED_ALIASES_JSON: &str = include_str!("../assets/team-aliases.json");

#[derive(Debug, Deserialize, Default)]
struct AliasFile {
    #[serde(default)]
    aliases: HashMap<String, String>,
}

/// Immutable alias table. Names without an entry resolve to themselves.
#[derive(Debug, Clone, Default)]
pub struct AliasMap {
    aliases: HashMap<String, String>,
}

impl AliasMap {
    /// The identity mapping.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Parse a `{ "aliases": { raw: canonical } }` document.
    pub fn from_json(content: &str) -> ApiResult<Self> {
        let file: AliasFile =
            serde_json::from_str(content).map_err(|e| ApiError::AliasLoad(e.to_string()))?;
        Ok(Self::from_pairs(file.aliases))
    }

    /// The alias table compiled into the library.
    pub fn bundled() -> ApiResult<Self> {
        Self::from_json(BUNDLED_ALIASES_JSON)
    }

    pub fn from_file(path: impl AsRef<Path>) -> ApiResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ApiError::AliasLoad(format!("could not read {}: {e}", path.display())))?;
        Self::from_json(&content)
    }

    /// Load from `path` when given, else the bundled table. Any failure
    /// degrades to the identity mapping.
    pub fn load_or_identity(path: Option<&Path>) -> Self {
        let loaded = match path {
            Some(path) => Self::from_file(path),
            None => Self::bundled(),
        };
        loaded.unwrap_or_else(|e| {
            warn!("{e}; using names as-is");
            Self::identity()
        })
    }

    /// Build from raw pairs, collapsing chains (`a → b → c` becomes `a → c`)
    /// so that resolving a resolved name is a no-op. Keys caught in a cycle
    /// are dropped and resolve to themselves.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let raw: HashMap<String, String> = pairs.into_iter().collect();
        let mut aliases = HashMap::with_capacity(raw.len());

        for key in raw.keys() {
            let mut seen = HashSet::from([key.as_str()]);
            let mut target = key.as_str();
            let mut cyclic = false;
            while let Some(next) = raw.get(target) {
                if next.as_str() == target {
                    break;
                }
                if !seen.insert(next.as_str()) {
                    cyclic = true;
                    break;
                }
                target = next.as_str();
            }
            if !cyclic && target != key.as_str() {
                aliases.insert(key.clone(), target.to_owned());
            }
        }

        Self { aliases }
    }

    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map(String::as_str).unwrap_or(name)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

/// Full-width spaces become ASCII spaces, then trim.
pub fn normalize_name(name: &str) -> String {
    name.replace('\u{3000}', " ").trim().to_owned()
}
