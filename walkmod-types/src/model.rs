use crate::ident::{PluginConfig, ProviderConfig};
use camino::Utf8Path;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ordered parameter map attached to readers, writers, walkers, transformations and providers.
pub type Params = IndexMap<String, serde_json::Value>;

/// Physical format of a configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    Xml,
    Yaml,
    Json,
}

impl DocumentFormat {
    /// Lookup order used when a project directory is given without a format.
    pub const DETECTION_ORDER: [DocumentFormat; 3] = [
        DocumentFormat::Xml,
        DocumentFormat::Yaml,
        DocumentFormat::Json,
    ];

    /// Canonical file name of a project's configuration in this format.
    pub fn file_name(self) -> &'static str {
        match self {
            DocumentFormat::Xml => "walkmod.xml",
            DocumentFormat::Yaml => "walkmod.yml",
            DocumentFormat::Json => "walkmod.json",
        }
    }

    pub fn from_path(path: &Utf8Path) -> Option<Self> {
        match path.extension()?.to_ascii_lowercase().as_str() {
            "xml" => Some(DocumentFormat::Xml),
            "yml" | "yaml" => Some(DocumentFormat::Yaml),
            "json" => Some(DocumentFormat::Json),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DocumentFormat::Xml => "xml",
            DocumentFormat::Yaml => "yaml",
            DocumentFormat::Json => "json",
        }
    }
}

impl std::str::FromStr for DocumentFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xml" => Ok(DocumentFormat::Xml),
            "yml" | "yaml" => Ok(DocumentFormat::Yaml),
            "json" => Ok(DocumentFormat::Json),
            other => Err(format!("unknown configuration format '{other}'")),
        }
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Assembled, read-only view of one configuration document.
///
/// A flat document (bare root transformation list) is presented as a single
/// [`DEFAULT_CHAIN`](crate::DEFAULT_CHAIN) chain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub plugins: Vec<PluginConfig>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub providers: Vec<ProviderConfig>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub merge_policies: Vec<MergePolicyConfig>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chains: Vec<ChainConfig>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modules: Vec<String>,
}

impl Configuration {
    pub fn chain(&self, name: &str) -> Option<&ChainConfig> {
        self.chains.iter().find(|c| c.name == name)
    }

    /// All transformations of all chains, in document order.
    pub fn transformations(&self) -> impl Iterator<Item = (&ChainConfig, &TransformationConfig)> {
        self.chains.iter().flat_map(|chain| {
            chain
                .walker
                .iter()
                .flat_map(|w| w.transformations.iter())
                .map(move |t| (chain, t))
        })
    }
}

/// A named reader -> walker -> writer pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reader: Option<ReaderConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub walker: Option<WalkerConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub writer: Option<WriterConfig>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub parameters: Params,
}

impl ChainConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reader: None,
            walker: None,
            writer: None,
            parameters: Params::new(),
        }
    }

    /// A chain whose reader and writer both point at `path`.
    pub fn with_path(name: impl Into<String>, path: &str) -> Self {
        let mut chain = Self::new(name);
        chain.reader = Some(ResourceConfig::at(path));
        chain.writer = Some(ResourceConfig::at(path));
        chain
    }

    pub fn with_transformations(mut self, transformations: Vec<TransformationConfig>) -> Self {
        self.walker
            .get_or_insert_with(WalkerConfig::default)
            .transformations = transformations;
        self
    }

    /// Path the writer falls back to: the reader's, or the default source folder.
    pub fn reader_path(&self) -> &str {
        self.reader
            .as_ref()
            .and_then(|r| r.path.as_deref())
            .unwrap_or(crate::DEFAULT_PATH)
    }

    pub fn transformations(&self) -> &[TransformationConfig] {
        self.walker
            .as_ref()
            .map(|w| w.transformations.as_slice())
            .unwrap_or_default()
    }
}

/// Source location and filters for the input or output side of a chain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub parameters: Params,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub includes: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excludes: Option<Vec<String>>,
}

impl ResourceConfig {
    pub fn at(path: &str) -> Self {
        Self {
            path: Some(path.to_string()),
            ..Self::default()
        }
    }
}

pub type ReaderConfig = ResourceConfig;
pub type WriterConfig = ResourceConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WalkerConfig {
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub parameters: Params,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_namespace: Option<String>,

    #[serde(default)]
    pub transformations: Vec<TransformationConfig>,
}

impl WalkerConfig {
    /// True when the walker carries nothing but its transformation list.
    pub fn is_plain(&self) -> bool {
        self.type_name.is_none() && self.parameters.is_empty() && self.root_namespace.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "type")]
    pub type_name: String,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub parameters: Params,

    #[serde(default)]
    pub is_mergeable: bool,

    /// Only meaningful when `is_mergeable` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_policy: Option<String>,
}

impl TransformationConfig {
    pub fn of_type(type_name: impl Into<String>) -> Self {
        Self {
            name: None,
            type_name: type_name.into(),
            parameters: Params::new(),
            is_mergeable: false,
            merge_policy: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Merge policy declarations. Modeled for completeness; no action mutates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergePolicyConfig {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_object_policy: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_type_policy: Option<String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub policy_entries: IndexMap<String, String>,
}

/// The kinds of parameterizable nodes inside a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeanCategory {
    Reader,
    Writer,
    Walker,
    Transformation,
}

impl BeanCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            BeanCategory::Reader => "reader",
            BeanCategory::Writer => "writer",
            BeanCategory::Walker => "walker",
            BeanCategory::Transformation => "transformation",
        }
    }
}

impl std::str::FromStr for BeanCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reader" => Ok(BeanCategory::Reader),
            "writer" => Ok(BeanCategory::Writer),
            "walker" => Ok(BeanCategory::Walker),
            "transformation" => Ok(BeanCategory::Transformation),
            other => Err(format!("unknown bean category '{other}'")),
        }
    }
}
