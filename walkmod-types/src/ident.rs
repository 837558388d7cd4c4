//! Plugin and configuration-provider identifiers.
//!
//! Both accept either a bare short id (`imports-cleaner`) or a full
//! `groupId:artifactId:version` triple. Anything else is rejected before a
//! document is touched.

use crate::model::Params;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const WALKMOD_GROUP: &str = "org.walkmod";
const LATEST: &str = "latest";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("malformed plugin identifier '{0}': expected 'id' or 'groupId:artifactId:version'")]
    Plugin(String),

    #[error("malformed provider identifier '{0}': expected 'id' or 'groupId:artifactId:id'")]
    Provider(String),
}

fn segments(raw: &str) -> Option<Vec<&str>> {
    let parts: Vec<&str> = raw.trim().split(':').map(str::trim).collect();
    if parts.iter().any(|p| p.is_empty()) {
        return None;
    }
    match parts.len() {
        1 | 3 => Some(parts),
        _ => None,
    }
}

fn short_artifact(id: &str) -> String {
    format!("walkmod-{id}-plugin")
}

/// A plugin coordinate. Identity is `(group_id, artifact_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginConfig {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
}

impl PluginConfig {
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: version.into(),
        }
    }

    /// Parses `id` or `groupId:artifactId:version`.
    pub fn parse(raw: &str) -> Result<Self, IdentifierError> {
        let parts = segments(raw).ok_or_else(|| IdentifierError::Plugin(raw.to_string()))?;
        Ok(match parts.as_slice() {
            [id] => Self::new(WALKMOD_GROUP, short_artifact(id), LATEST),
            [group, artifact, version] => Self::new(*group, *artifact, *version),
            _ => return Err(IdentifierError::Plugin(raw.to_string())),
        })
    }

    pub fn same_identity(&self, other: &PluginConfig) -> bool {
        self.group_id == other.group_id && self.artifact_id == other.artifact_id
    }

    /// The `group:artifact:version` form stored in YAML documents.
    pub fn coordinates(&self) -> String {
        format!("{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }
}

impl std::str::FromStr for PluginConfig {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A configuration provider. Identity is the normalized `type_name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(rename = "type")]
    pub type_name: String,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub parameters: Params,
}

impl ProviderConfig {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            parameters: Params::new(),
        }
    }

    /// Builds a provider whose type is the normalized form of `raw`.
    pub fn parse(raw: &str) -> Result<Self, IdentifierError> {
        Ok(Self::new(Self::normalize_type(raw)?))
    }

    /// Expands a short id to `org.walkmod:walkmod-<id>-plugin:<id>`; keeps full triples.
    pub fn normalize_type(raw: &str) -> Result<String, IdentifierError> {
        let parts = segments(raw).ok_or_else(|| IdentifierError::Provider(raw.to_string()))?;
        Ok(match parts.as_slice() {
            [id] => format!("{WALKMOD_GROUP}:{}:{id}", short_artifact(id)),
            _ => parts.join(":"),
        })
    }

    /// Normalized identity; an unparsable stored type is compared verbatim.
    pub fn identity(&self) -> String {
        Self::normalize_type(&self.type_name).unwrap_or_else(|_| self.type_name.clone())
    }
}
