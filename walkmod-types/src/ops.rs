use crate::ident::{PluginConfig, ProviderConfig};
use crate::model::{BeanCategory, ChainConfig, Params, TransformationConfig};
use serde::{Deserialize, Serialize};

/// Which side of a chain a resource edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceSlot {
    Reader,
    Writer,
}

impl ResourceSlot {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceSlot::Reader => "reader",
            ResourceSlot::Writer => "writer",
        }
    }
}

/// Include or exclude wildcard list of a reader/writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    Includes,
    Excludes,
}

/// One semantic edit of a configuration document.
///
/// Exactly one request is executed per invocation; whether it fans out to
/// submodules is decided by the caller's `recursive` flag, not by the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum EditRequest {
    AddChain(AddChain),
    RemoveChains(RemoveChains),
    AddTransformation(AddTransformation),
    RemoveTransformations(RemoveTransformations),
    SetReader(SetReader),
    SetWriter(SetWriter),
    AddIncludesOrExcludes(AddIncludesOrExcludes),
    RemoveIncludesOrExcludes(RemoveIncludesOrExcludes),
    AddPlugin(AddPlugin),
    RemovePlugin(RemovePlugin),
    AddProvider(AddProvider),
    RemoveProviders(RemoveProviders),
    AddModules(AddModules),
    RemoveModules(RemoveModules),
    AddConfigurationParameter(AddConfigurationParameter),
}

impl EditRequest {
    /// Stable snake_case name, matching the serialized `action` tag.
    pub fn name(&self) -> &'static str {
        match self {
            EditRequest::AddChain(_) => "add_chain",
            EditRequest::RemoveChains(_) => "remove_chains",
            EditRequest::AddTransformation(_) => "add_transformation",
            EditRequest::RemoveTransformations(_) => "remove_transformations",
            EditRequest::SetReader(_) => "set_reader",
            EditRequest::SetWriter(_) => "set_writer",
            EditRequest::AddIncludesOrExcludes(_) => "add_includes_or_excludes",
            EditRequest::RemoveIncludesOrExcludes(_) => "remove_includes_or_excludes",
            EditRequest::AddPlugin(_) => "add_plugin",
            EditRequest::RemovePlugin(_) => "remove_plugin",
            EditRequest::AddProvider(_) => "add_provider",
            EditRequest::RemoveProviders(_) => "remove_providers",
            EditRequest::AddModules(_) => "add_modules",
            EditRequest::RemoveModules(_) => "remove_modules",
            EditRequest::AddConfigurationParameter(_) => "add_configuration_parameter",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddChain {
    pub chain: ChainConfig,

    /// Sibling the new chain is inserted ahead of; appended when absent or unknown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoveChains {
    pub names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddTransformation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain: Option<String>,

    /// Reader/writer path of a chain created by this request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    pub transformation: TransformationConfig,

    /// Insertion index; appended when absent or out of range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<usize>,

    /// Placement of a newly created chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoveTransformations {
    /// Restricts removal to one chain; every chain and the flat list otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain: Option<String>,

    pub types: Vec<String>,
}

/// Fields shared by reader and writer updates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain: Option<String>,

    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Replaces the existing parameter map when non-empty.
    #[serde(default, skip_serializing_if = "Params::is_empty")]
    pub params: Params,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SetReader {
    #[serde(flatten)]
    pub update: ResourceUpdate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SetWriter {
    #[serde(flatten)]
    pub update: ResourceUpdate,
}

/// Targeting shared by include/exclude edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterEdit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain: Option<String>,

    pub wildcards: Vec<String>,

    pub kind: FilterKind,

    /// Apply to the reader. When neither `reader` nor `writer` is set both are targeted.
    #[serde(default)]
    pub reader: bool,

    #[serde(default)]
    pub writer: bool,
}

impl FilterEdit {
    pub fn slots(&self) -> Vec<ResourceSlot> {
        match (self.reader, self.writer) {
            (true, false) => vec![ResourceSlot::Reader],
            (false, true) => vec![ResourceSlot::Writer],
            _ => vec![ResourceSlot::Reader, ResourceSlot::Writer],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddIncludesOrExcludes {
    #[serde(flatten)]
    pub filter: FilterEdit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoveIncludesOrExcludes {
    #[serde(flatten)]
    pub filter: FilterEdit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddPlugin {
    pub plugin: PluginConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemovePlugin {
    pub plugin: PluginConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddProvider {
    pub provider: ProviderConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoveProviders {
    /// Raw identifiers; validated before anything is removed.
    pub providers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddModules {
    pub modules: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoveModules {
    pub modules: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddConfigurationParameter {
    pub param: String,
    pub value: serde_json::Value,

    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<BeanCategory>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain: Option<String>,
}
