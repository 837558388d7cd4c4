use super::convert::{json_to_yaml, key_string, mapping_to_json, yaml_to_json};
use super::emit;
use crate::document::{BeanInfo, BeanRef, ChainHandle, ConfigDocument, Scope};
use crate::error::{EditError, EditResult};
use anyhow::{Context, anyhow};
use camino::{Utf8Path, Utf8PathBuf};
use serde_yaml::{Mapping, Sequence, Value};
use std::collections::BTreeSet;
use tracing::debug;
use walkmod_types::ops::ResourceUpdate;
use walkmod_types::{
    BeanCategory, ChainConfig, Configuration, DEFAULT_CHAIN, DEFAULT_PATH, DocumentFormat,
    FilterKind, MergePolicyConfig, Params, PluginConfig, ProviderConfig, ResourceConfig,
    ResourceSlot, TransformationConfig, WalkerConfig,
};

const ROOT_ORDER: &[&str] = &[
    "plugins",
    "conf-providers",
    "merge-policies",
    "chains",
    "transformations",
    "modules",
];
const CHAIN_ORDER: &[&str] = &[
    "name",
    "params",
    "reader",
    "walker",
    "transformations",
    "writer",
];
const RESOURCE_ORDER: &[&str] = &["path", "type", "params", "includes", "excludes"];
const WALKER_ORDER: &[&str] = &["type", "root-namespace", "params", "transformations"];
const TRANSFORMATION_ORDER: &[&str] = &["type", "name", "merge-policy", "isMergeable", "params"];

/// A `walkmod.yml` or `walkmod.json` document.
#[derive(Debug, Clone)]
pub struct YamlDocument {
    path: Utf8PathBuf,
    format: DocumentFormat,
    original: Option<String>,
    root: Mapping,
}

impl YamlDocument {
    /// Parses `original`; absent, empty or whitespace-only text yields an empty mapping.
    pub fn from_source(
        path: &Utf8Path,
        format: DocumentFormat,
        original: Option<String>,
    ) -> EditResult<Self> {
        let text = original.as_deref().unwrap_or_default();
        let root = if text.trim().is_empty() {
            Mapping::new()
        } else {
            let value = match format {
                DocumentFormat::Json => {
                    let json: serde_json::Value =
                        serde_json::from_str(text).map_err(|e| EditError::parse(path, e))?;
                    json_to_yaml(&json)
                }
                _ => serde_yaml::from_str(text).map_err(|e| EditError::parse(path, e))?,
            };
            match value {
                Value::Mapping(map) => map,
                Value::Null => Mapping::new(),
                other => {
                    return Err(EditError::schema(
                        path,
                        format!("document root must be a mapping, found {}", kind(&other)),
                    ));
                }
            }
        };
        validate(&root).map_err(|message| EditError::schema(path, message))?;
        debug!(%path, %format, "loaded configuration");

        Ok(Self {
            path: path.to_path_buf(),
            format,
            original,
            root,
        })
    }

    pub fn root(&self) -> &Mapping {
        &self.root
    }

    fn chain_map(&self, chain: ChainHandle) -> EditResult<&Mapping> {
        seq_at(&self.root, "chains")
            .get(chain.0)
            .and_then(Value::as_mapping)
            .ok_or_else(|| stale(&self.path, chain))
    }

    fn chain_map_mut(&mut self, chain: ChainHandle) -> EditResult<&mut Mapping> {
        self.root
            .get_mut("chains")
            .and_then(Value::as_sequence_mut)
            .and_then(|chains| chains.get_mut(chain.0))
            .and_then(Value::as_mapping_mut)
            .ok_or_else(|| stale(&self.path, chain))
    }

    pub fn ensure_plugins(&mut self) -> &mut Sequence {
        ensure_sequence(&mut self.root, "plugins", ROOT_ORDER)
    }

    pub fn ensure_providers(&mut self) -> &mut Sequence {
        ensure_sequence(&mut self.root, "conf-providers", ROOT_ORDER)
    }

    pub fn ensure_modules(&mut self) -> &mut Sequence {
        ensure_sequence(&mut self.root, "modules", ROOT_ORDER)
    }

    pub fn ensure_reader(&mut self, chain: ChainHandle) -> EditResult<&mut Mapping> {
        let chain_map = self.chain_map_mut(chain)?;
        Ok(ensure_resource_map(chain_map, ResourceSlot::Reader).1)
    }

    pub fn ensure_writer(&mut self, chain: ChainHandle) -> EditResult<&mut Mapping> {
        let chain_map = self.chain_map_mut(chain)?;
        Ok(ensure_resource_map(chain_map, ResourceSlot::Writer).1)
    }

    pub fn ensure_walker(&mut self, chain: ChainHandle) -> EditResult<&mut Mapping> {
        let chain_map = self.chain_map_mut(chain)?;
        Ok(ensure_mapping(chain_map, "walker", CHAIN_ORDER))
    }

    pub fn ensure_transformations(&mut self, chain: ChainHandle) -> EditResult<&mut Sequence> {
        Ok(chain_container_mut(self.chain_map_mut(chain)?))
    }

    fn remove_entry(&mut self, section: &str, index: usize) -> EditResult<()> {
        let path = &self.path;
        let list = self
            .root
            .get_mut(section)
            .and_then(Value::as_sequence_mut)
            .filter(|list| index < list.len())
            .ok_or_else(|| EditError::from(anyhow!("no {section} entry #{index} in {path}")))?;
        list.remove(index);
        if list.is_empty() {
            self.root.shift_remove(section);
        }
        Ok(())
    }
}

fn stale(path: &Utf8Path, chain: ChainHandle) -> EditError {
    EditError::from(anyhow!("chain #{} no longer exists in {path}", chain.0))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

fn key(name: &str) -> Value {
    Value::String(name.to_string())
}

fn str_at(map: &Mapping, name: &str) -> Option<String> {
    match map.get(name)? {
        Value::Null => None,
        value @ (Value::String(_) | Value::Bool(_) | Value::Number(_) | Value::Tagged(_)) => {
            Some(key_string(value))
        }
        _ => None,
    }
}

fn seq_at<'a>(map: &'a Mapping, name: &str) -> &'a [Value] {
    map.get(name)
        .and_then(Value::as_sequence)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn map_at<'a>(map: &'a Mapping, name: &str) -> Option<&'a Mapping> {
    map.get(name).and_then(Value::as_mapping)
}

fn rank(order: &[&str], name: &Value) -> usize {
    name.as_str()
        .and_then(|n| order.iter().position(|o| *o == n))
        .unwrap_or(order.len())
}

/// Sets `name`, keeping an existing entry in place and slotting a new one by `order`.
fn insert_ordered(map: &mut Mapping, name: &str, value: Value, order: &[&str]) {
    let name = key(name);
    if map.contains_key(&name) {
        map.insert(name, value);
        return;
    }

    let wanted = rank(order, &name);
    let mut pending = Some((name, value));
    let mut rebuilt = Mapping::with_capacity(map.len() + 1);
    for (k, v) in std::mem::take(map) {
        if rank(order, &k) > wanted {
            if let Some((name, value)) = pending.take() {
                rebuilt.insert(name, value);
            }
        }
        rebuilt.insert(k, v);
    }
    if let Some((name, value)) = pending {
        rebuilt.insert(name, value);
    }
    *map = rebuilt;
}

fn ensure_mapping<'a>(map: &'a mut Mapping, name: &str, order: &[&str]) -> &'a mut Mapping {
    if !matches!(map.get(name), Some(Value::Mapping(_))) {
        insert_ordered(map, name, Value::Mapping(Mapping::new()), order);
    }
    match map.get_mut(name) {
        Some(Value::Mapping(inner)) => inner,
        _ => unreachable!("`{name}` was just set to a mapping"),
    }
}

fn ensure_sequence<'a>(map: &'a mut Mapping, name: &str, order: &[&str]) -> &'a mut Sequence {
    if !matches!(map.get(name), Some(Value::Sequence(_))) {
        insert_ordered(map, name, Value::Sequence(Sequence::new()), order);
    }
    match map.get_mut(name) {
        Some(Value::Sequence(inner)) => inner,
        _ => unreachable!("`{name}` was just set to a sequence"),
    }
}

fn chain_name(chain: &Mapping) -> String {
    str_at(chain, "name").unwrap_or_else(|| DEFAULT_CHAIN.to_string())
}

fn has_walker(chain: &Mapping) -> bool {
    map_at(chain, "walker").is_some()
}

/// `walker.transformations` when the chain has a walker, `transformations` otherwise.
fn chain_container(chain: &Mapping) -> &[Value] {
    match map_at(chain, "walker") {
        Some(walker) => seq_at(walker, "transformations"),
        None => seq_at(chain, "transformations"),
    }
}

fn chain_container_mut(chain: &mut Mapping) -> &mut Sequence {
    if has_walker(chain) {
        let walker = ensure_mapping(chain, "walker", CHAIN_ORDER);
        return ensure_sequence(walker, "transformations", WALKER_ORDER);
    }
    ensure_sequence(chain, "transformations", CHAIN_ORDER)
}

fn existing_container_mut(chain: &mut Mapping) -> Option<&mut Sequence> {
    let holder = if has_walker(chain) {
        chain.get_mut("walker").and_then(Value::as_mapping_mut)?
    } else {
        chain
    };
    holder
        .get_mut("transformations")
        .and_then(Value::as_sequence_mut)
}

fn ensure_resource_map(chain: &mut Mapping, slot: ResourceSlot) -> (bool, &mut Mapping) {
    let default_path = match slot {
        ResourceSlot::Reader => DEFAULT_PATH.to_string(),
        ResourceSlot::Writer => map_at(chain, "reader")
            .and_then(|r| str_at(r, "path"))
            .unwrap_or_else(|| DEFAULT_PATH.to_string()),
    };
    let created = map_at(chain, slot.as_str()).is_none();
    let resource = ensure_mapping(chain, slot.as_str(), CHAIN_ORDER);
    if created {
        let path = Value::String(default_path);
        insert_ordered(resource, "path", path, RESOURCE_ORDER);
    }
    (created, resource)
}

fn type_in(item: &Value, types: &BTreeSet<String>) -> bool {
    item.as_mapping()
        .and_then(|t| t.get("type"))
        .and_then(Value::as_str)
        .is_some_and(|t| types.contains(t))
}

/// Drops matching entries of `map[name]`, and the key itself once emptied.
fn retain_types(map: &mut Mapping, name: &str, types: &BTreeSet<String>) -> usize {
    let (removed, emptied) = match map.get_mut(name).and_then(Value::as_sequence_mut) {
        Some(list) => {
            let before = list.len();
            list.retain(|item| !type_in(item, types));
            let removed = before - list.len();
            (removed, removed > 0 && list.is_empty())
        }
        None => (0, false),
    };
    if emptied {
        map.shift_remove(name);
    }
    removed
}

fn params_value(params: &Params) -> Value {
    Value::Mapping(
        params
            .iter()
            .map(|(k, v)| (key(k), json_to_yaml(v)))
            .collect(),
    )
}

fn params_from(map: &Mapping) -> Params {
    map_at(map, "params")
        .map(|params| {
            params
                .iter()
                .map(|(k, v)| (key_string(k), yaml_to_json(v)))
                .collect()
        })
        .unwrap_or_default()
}

fn strings(list: &[Value]) -> Vec<String> {
    list.iter().map(key_string).collect()
}

fn resource_from(map: &Mapping) -> ResourceConfig {
    ResourceConfig {
        path: str_at(map, "path"),
        type_name: str_at(map, "type"),
        parameters: params_from(map),
        includes: map
            .get("includes")
            .and_then(Value::as_sequence)
            .map(|l| strings(l)),
        excludes: map
            .get("excludes")
            .and_then(Value::as_sequence)
            .map(|l| strings(l)),
    }
}

fn resource_value(resource: &ResourceConfig, default_path: &str) -> Value {
    let mut map = Mapping::new();
    map.insert(
        key("path"),
        Value::String(resource.path.as_deref().unwrap_or(default_path).to_string()),
    );
    if let Some(type_name) = &resource.type_name {
        map.insert(key("type"), key(type_name));
    }
    if !resource.parameters.is_empty() {
        map.insert(key("params"), params_value(&resource.parameters));
    }
    for (name, list) in [
        ("includes", &resource.includes),
        ("excludes", &resource.excludes),
    ] {
        if let Some(list) = list {
            let items = list.iter().map(|w| key(w)).collect();
            map.insert(key(name), Value::Sequence(items));
        }
    }
    Value::Mapping(map)
}

fn transformation_from(item: &Value) -> TransformationConfig {
    let empty = Mapping::new();
    let map = item.as_mapping().unwrap_or(&empty);
    TransformationConfig {
        name: str_at(map, "name"),
        type_name: str_at(map, "type").unwrap_or_default(),
        parameters: params_from(map),
        is_mergeable: match map.get("isMergeable") {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
            _ => false,
        },
        merge_policy: str_at(map, "merge-policy"),
    }
}

fn transformation_value(t: &TransformationConfig) -> Value {
    let mut map = Mapping::new();
    map.insert(key("type"), key(&t.type_name));
    if let Some(name) = &t.name {
        map.insert(key("name"), key(name));
    }
    if let Some(policy) = &t.merge_policy {
        map.insert(key("merge-policy"), key(policy));
    }
    if t.is_mergeable {
        map.insert(key("isMergeable"), Value::Bool(true));
    }
    if !t.parameters.is_empty() {
        map.insert(key("params"), params_value(&t.parameters));
    }
    Value::Mapping(map)
}

fn walker_value(walker: &WalkerConfig) -> Value {
    let mut map = Mapping::new();
    if let Some(type_name) = &walker.type_name {
        map.insert(key("type"), key(type_name));
    }
    if let Some(ns) = &walker.root_namespace {
        map.insert(key("root-namespace"), key(ns));
    }
    if !walker.parameters.is_empty() {
        map.insert(key("params"), params_value(&walker.parameters));
    }
    if !walker.transformations.is_empty() {
        let items: Vec<Value> = walker
            .transformations
            .iter()
            .map(transformation_value)
            .collect();
        map.insert(key("transformations"), Value::Sequence(items));
    }
    Value::Mapping(map)
}

fn chain_value(chain: &ChainConfig) -> Value {
    let mut map = Mapping::new();
    map.insert(key("name"), key(&chain.name));
    if !chain.parameters.is_empty() {
        map.insert(key("params"), params_value(&chain.parameters));
    }
    if let Some(reader) = &chain.reader {
        map.insert(key("reader"), resource_value(reader, DEFAULT_PATH));
    }
    if let Some(walker) = &chain.walker {
        if !walker.is_plain() {
            map.insert(key("walker"), walker_value(walker));
        } else if !walker.transformations.is_empty() {
            let items: Vec<Value> = walker
                .transformations
                .iter()
                .map(transformation_value)
                .collect();
            map.insert(key("transformations"), Value::Sequence(items));
        }
    }
    if let Some(writer) = &chain.writer {
        map.insert(key("writer"), resource_value(writer, chain.reader_path()));
    }
    Value::Mapping(map)
}

fn chain_from(map: &Mapping) -> ChainConfig {
    let transformations: Vec<TransformationConfig> = chain_container(map)
        .iter()
        .map(transformation_from)
        .collect();
    let walker = match map_at(map, "walker") {
        Some(walker) => Some(WalkerConfig {
            type_name: str_at(walker, "type"),
            parameters: params_from(walker),
            root_namespace: str_at(walker, "root-namespace"),
            transformations,
        }),
        None if !transformations.is_empty() => Some(WalkerConfig {
            transformations,
            ..WalkerConfig::default()
        }),
        None => None,
    };
    ChainConfig {
        name: chain_name(map),
        reader: map_at(map, "reader").map(resource_from),
        walker,
        writer: map_at(map, "writer").map(resource_from),
        parameters: params_from(map),
    }
}

fn plugin_from(item: &Value) -> EditResult<PluginConfig> {
    match item {
        Value::Mapping(map) => Ok(PluginConfig::new(
            str_at(map, "groupId").unwrap_or_default(),
            str_at(map, "artifactId").unwrap_or_default(),
            str_at(map, "version").unwrap_or_default(),
        )),
        other => Ok(PluginConfig::parse(&key_string(other))?),
    }
}

fn policy_from(item: &Value) -> Option<MergePolicyConfig> {
    let map = item.as_mapping()?;
    Some(MergePolicyConfig {
        name: str_at(map, "name").unwrap_or_default(),
        default_object_policy: str_at(map, "default-object-policy"),
        default_type_policy: str_at(map, "default-type-policy"),
        policy_entries: seq_at(map, "policy-entries")
            .iter()
            .filter_map(Value::as_mapping)
            .map(|e| {
                (
                    str_at(e, "object-type").unwrap_or_default(),
                    str_at(e, "policy-type").unwrap_or_default(),
                )
            })
            .collect(),
    })
}

fn expect_sequence<'a>(map: &'a Mapping, name: &str, at: &str) -> Result<&'a [Value], String> {
    match map.get(name) {
        None | Some(Value::Null) => Ok(&[]),
        Some(Value::Sequence(list)) => Ok(list.as_slice()),
        Some(other) => Err(format!(
            "{at}{name} must be a sequence, found {}",
            kind(other)
        )),
    }
}

fn expect_mapping<'a>(
    map: &'a Mapping,
    name: &str,
    at: &str,
) -> Result<Option<&'a Mapping>, String> {
    match map.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Mapping(inner)) => Ok(Some(inner)),
        Some(other) => Err(format!(
            "{at}{name} must be a mapping, found {}",
            kind(other)
        )),
    }
}

fn validate_transformations(map: &Mapping, at: &str) -> Result<(), String> {
    let transformations = expect_sequence(map, "transformations", at)?;
    for (i, item) in transformations.iter().enumerate() {
        let t = item
            .as_mapping()
            .ok_or_else(|| format!("{at}transformations[{i}] must be a mapping"))?;
        if str_at(t, "type").is_none() {
            return Err(format!("{at}transformations[{i}] requires 'type'"));
        }
    }
    Ok(())
}

/// Shape checks for the keys the edit engine navigates.
fn validate(root: &Mapping) -> Result<(), String> {
    for (i, item) in expect_sequence(root, "plugins", "")?.iter().enumerate() {
        match item {
            Value::Mapping(_) => {}
            Value::String(raw) => {
                PluginConfig::parse(raw).map_err(|e| format!("plugins[{i}]: {e}"))?;
            }
            other => {
                let found = kind(other);
                return Err(format!("plugins[{i}] must be a string, found {found}"));
            }
        }
    }
    let providers = expect_sequence(root, "conf-providers", "")?;
    for (i, item) in providers.iter().enumerate() {
        let provider = item
            .as_mapping()
            .ok_or_else(|| format!("conf-providers[{i}] must be a mapping"))?;
        if str_at(provider, "type").is_none() {
            return Err(format!("conf-providers[{i}] requires 'type'"));
        }
    }
    for (i, item) in expect_sequence(root, "modules", "")?.iter().enumerate() {
        if !matches!(item, Value::String(_)) {
            let found = kind(item);
            return Err(format!("modules[{i}] must be a string, found {found}"));
        }
    }
    expect_sequence(root, "merge-policies", "")?;
    validate_transformations(root, "")?;

    for (i, item) in expect_sequence(root, "chains", "")?.iter().enumerate() {
        let at = format!("chains[{i}].");
        let chain = item
            .as_mapping()
            .ok_or_else(|| format!("chains[{i}] must be a mapping"))?;
        expect_mapping(chain, "params", &at)?;
        expect_mapping(chain, "reader", &at)?;
        expect_mapping(chain, "writer", &at)?;
        validate_transformations(chain, &at)?;
        if let Some(walker) = expect_mapping(chain, "walker", &at)? {
            validate_transformations(walker, &format!("{at}walker."))?;
        }
    }
    Ok(())
}

impl ConfigDocument for YamlDocument {
    fn format(&self) -> DocumentFormat {
        self.format
    }

    fn path(&self) -> &Utf8Path {
        &self.path
    }

    fn original(&self) -> Option<&str> {
        self.original.as_deref()
    }

    fn chain_names(&self) -> Vec<String> {
        seq_at(&self.root, "chains")
            .iter()
            .filter_map(Value::as_mapping)
            .map(chain_name)
            .collect()
    }

    fn find_chain(&self, name: &str) -> Option<ChainHandle> {
        seq_at(&self.root, "chains")
            .iter()
            .position(|c| c.as_mapping().is_some_and(|c| chain_name(c) == name))
            .map(ChainHandle)
    }

    fn insert_chain(
        &mut self,
        chain: &ChainConfig,
        before: Option<&str>,
    ) -> EditResult<ChainHandle> {
        let target = before.and_then(|b| self.find_chain(b));
        if let (Some(before), None) = (before, target) {
            debug!(before, chain = %chain.name, "placement target not found, appending");
        }
        let empty_root_list = match self.root.get("transformations") {
            Some(Value::Sequence(items)) => items.is_empty(),
            Some(Value::Null) => true,
            _ => false,
        };
        if empty_root_list {
            debug!(chain = %chain.name, "dropping empty root transformation list");
            self.root.shift_remove("transformations");
        }

        let chains = ensure_sequence(&mut self.root, "chains", ROOT_ORDER);
        let index = target.map(ChainHandle::index).unwrap_or(chains.len());
        chains.insert(index, chain_value(chain));
        Ok(ChainHandle(index))
    }

    fn remove_chain(&mut self, chain: ChainHandle) -> EditResult<()> {
        let path = &self.path;
        let chains = self
            .root
            .get_mut("chains")
            .and_then(Value::as_sequence_mut)
            .filter(|chains| chain.0 < chains.len())
            .ok_or_else(|| stale(path, chain))?;
        chains.remove(chain.0);
        if chains.is_empty() {
            self.root.shift_remove("chains");
        }
        Ok(())
    }

    fn has_root_transformations(&self) -> bool {
        !seq_at(&self.root, "transformations").is_empty()
    }

    fn take_root_transformations(&mut self) -> EditResult<Vec<TransformationConfig>> {
        Ok(match self.root.shift_remove("transformations") {
            Some(Value::Sequence(items)) => items.iter().map(transformation_from).collect(),
            _ => Vec::new(),
        })
    }

    fn transformations(&self, scope: Scope) -> EditResult<Vec<TransformationConfig>> {
        let items = match scope {
            Scope::Root => seq_at(&self.root, "transformations"),
            Scope::Chain(chain) => chain_container(self.chain_map(chain)?),
        };
        Ok(items.iter().map(transformation_from).collect())
    }

    fn insert_transformation(
        &mut self,
        scope: Scope,
        transformation: &TransformationConfig,
        order: Option<usize>,
    ) -> EditResult<()> {
        let list = match scope {
            Scope::Root => ensure_sequence(&mut self.root, "transformations", ROOT_ORDER),
            Scope::Chain(chain) => chain_container_mut(self.chain_map_mut(chain)?),
        };
        let item = transformation_value(transformation);
        match order {
            Some(at) if at < list.len() => list.insert(at, item),
            _ => list.push(item),
        }
        Ok(())
    }

    fn remove_transformations(
        &mut self,
        scope: Scope,
        types: &BTreeSet<String>,
    ) -> EditResult<usize> {
        let chain = match scope {
            Scope::Root => return Ok(retain_types(&mut self.root, "transformations", types)),
            Scope::Chain(chain) => self.chain_map_mut(chain)?,
        };

        let mut removed = retain_types(chain, "transformations", types);
        let mut drop_walker = false;
        if let Some(walker) = chain.get_mut("walker").and_then(Value::as_mapping_mut) {
            let n = retain_types(walker, "transformations", types);
            removed += n;
            drop_walker = n > 0 && walker.is_empty();
        }
        if drop_walker {
            chain.shift_remove("walker");
        }
        Ok(removed)
    }

    fn resource(
        &self,
        chain: ChainHandle,
        slot: ResourceSlot,
    ) -> EditResult<Option<ResourceConfig>> {
        let chain_map = self.chain_map(chain)?;
        Ok(map_at(chain_map, slot.as_str()).map(resource_from))
    }

    fn ensure_resource(&mut self, chain: ChainHandle, slot: ResourceSlot) -> EditResult<bool> {
        Ok(ensure_resource_map(self.chain_map_mut(chain)?, slot).0)
    }

    fn update_resource(
        &mut self,
        chain: ChainHandle,
        slot: ResourceSlot,
        update: &ResourceUpdate,
    ) -> EditResult<bool> {
        let chain = self.chain_map_mut(chain)?;
        let before = chain.clone();
        let (_, resource) = ensure_resource_map(chain, slot);
        if let Some(path) = &update.path {
            insert_ordered(resource, "path", key(path), RESOURCE_ORDER);
        }
        if let Some(type_name) = &update.type_name {
            insert_ordered(resource, "type", key(type_name), RESOURCE_ORDER);
        }
        if !update.params.is_empty() {
            let params = params_value(&update.params);
            insert_ordered(resource, "params", params, RESOURCE_ORDER);
        }
        Ok(*chain != before)
    }

    fn set_filters(
        &mut self,
        chain: ChainHandle,
        slot: ResourceSlot,
        kind: FilterKind,
        wildcards: &[String],
    ) -> EditResult<bool> {
        let name = match kind {
            FilterKind::Includes => "includes",
            FilterKind::Excludes => "excludes",
        };
        let chain = self.chain_map_mut(chain)?;
        let before = chain.clone();

        if wildcards.is_empty() {
            if let Some(resource) = chain.get_mut(slot.as_str()).and_then(Value::as_mapping_mut) {
                resource.shift_remove(name);
            }
        } else {
            let (_, resource) = ensure_resource_map(chain, slot);
            let list = Value::Sequence(wildcards.iter().map(|w| key(w)).collect());
            insert_ordered(resource, name, list, RESOURCE_ORDER);
        }
        Ok(*chain != before)
    }

    fn plugins(&self) -> EditResult<Vec<PluginConfig>> {
        seq_at(&self.root, "plugins")
            .iter()
            .map(plugin_from)
            .collect()
    }

    fn push_plugin(&mut self, plugin: &PluginConfig) -> EditResult<()> {
        let coordinates = Value::String(plugin.coordinates());
        self.ensure_plugins().push(coordinates);
        Ok(())
    }

    fn remove_plugin(&mut self, index: usize) -> EditResult<()> {
        self.remove_entry("plugins", index)
    }

    fn providers(&self) -> EditResult<Vec<ProviderConfig>> {
        Ok(seq_at(&self.root, "conf-providers")
            .iter()
            .filter_map(Value::as_mapping)
            .map(|p| ProviderConfig {
                type_name: str_at(p, "type").unwrap_or_default(),
                parameters: params_from(p),
            })
            .collect())
    }

    fn push_provider(&mut self, provider: &ProviderConfig) -> EditResult<()> {
        let mut map = Mapping::new();
        map.insert(key("type"), key(&provider.type_name));
        if !provider.parameters.is_empty() {
            map.insert(key("params"), params_value(&provider.parameters));
        }
        self.ensure_providers().push(Value::Mapping(map));
        Ok(())
    }

    fn remove_provider(&mut self, index: usize) -> EditResult<()> {
        self.remove_entry("conf-providers", index)
    }

    fn modules(&self) -> EditResult<Vec<String>> {
        Ok(strings(seq_at(&self.root, "modules")))
    }

    fn push_module(&mut self, module: &str) -> EditResult<()> {
        self.ensure_modules().push(key(module));
        Ok(())
    }

    fn remove_module(&mut self, index: usize) -> EditResult<()> {
        self.remove_entry("modules", index)
    }

    fn beans(&self) -> EditResult<Vec<BeanInfo>> {
        let mut beans = Vec::new();
        let info = |bean, category, chain: &str, map: &Mapping| BeanInfo {
            bean,
            category,
            chain: chain.to_string(),
            type_name: str_at(map, "type"),
            name: str_at(map, "name"),
        };
        let empty = Mapping::new();

        for (i, chain) in seq_at(&self.root, "chains").iter().enumerate() {
            let Some(chain) = chain.as_mapping() else {
                continue;
            };
            let handle = ChainHandle(i);
            let name = chain_name(chain);
            if let Some(reader) = map_at(chain, "reader") {
                beans.push(info(
                    BeanRef::Resource(handle, ResourceSlot::Reader),
                    BeanCategory::Reader,
                    &name,
                    reader,
                ));
            }
            if let Some(walker) = map_at(chain, "walker") {
                beans.push(info(
                    BeanRef::Walker(handle),
                    BeanCategory::Walker,
                    &name,
                    walker,
                ));
            }
            for (j, t) in chain_container(chain).iter().enumerate() {
                beans.push(info(
                    BeanRef::Transformation(Scope::Chain(handle), j),
                    BeanCategory::Transformation,
                    &name,
                    t.as_mapping().unwrap_or(&empty),
                ));
            }
            if let Some(writer) = map_at(chain, "writer") {
                beans.push(info(
                    BeanRef::Resource(handle, ResourceSlot::Writer),
                    BeanCategory::Writer,
                    &name,
                    writer,
                ));
            }
        }
        for (j, t) in seq_at(&self.root, "transformations").iter().enumerate() {
            beans.push(info(
                BeanRef::Transformation(Scope::Root, j),
                BeanCategory::Transformation,
                DEFAULT_CHAIN,
                t.as_mapping().unwrap_or(&empty),
            ));
        }
        Ok(beans)
    }

    fn set_param(
        &mut self,
        bean: BeanRef,
        name: &str,
        value: &serde_json::Value,
    ) -> EditResult<bool> {
        let path = self.path.clone();
        let (target, order) = match bean {
            BeanRef::Resource(chain, slot) => (
                self.chain_map_mut(chain)?
                    .get_mut(slot.as_str())
                    .and_then(Value::as_mapping_mut),
                RESOURCE_ORDER,
            ),
            BeanRef::Walker(chain) => (
                self.chain_map_mut(chain)?
                    .get_mut("walker")
                    .and_then(Value::as_mapping_mut),
                WALKER_ORDER,
            ),
            BeanRef::Transformation(Scope::Root, j) => (
                self.root
                    .get_mut("transformations")
                    .and_then(Value::as_sequence_mut)
                    .and_then(|list| list.get_mut(j))
                    .and_then(Value::as_mapping_mut),
                TRANSFORMATION_ORDER,
            ),
            BeanRef::Transformation(Scope::Chain(chain), j) => (
                existing_container_mut(self.chain_map_mut(chain)?)
                    .and_then(|list| list.get_mut(j))
                    .and_then(Value::as_mapping_mut),
                TRANSFORMATION_ORDER,
            ),
        };
        let target =
            target.ok_or_else(|| EditError::from(anyhow!("{bean:?} does not exist in {path}")))?;

        let value = json_to_yaml(value);
        let params = ensure_mapping(target, "params", order);
        if params.get(name) == Some(&value) {
            return Ok(false);
        }
        params.insert(key(name), value);
        Ok(true)
    }

    fn configuration(&self) -> EditResult<Configuration> {
        let mut chains: Vec<ChainConfig> = seq_at(&self.root, "chains")
            .iter()
            .filter_map(Value::as_mapping)
            .map(chain_from)
            .collect();
        if self.has_root_transformations() && !chains.iter().any(|c| c.name == DEFAULT_CHAIN) {
            let bare = self.transformations(Scope::Root)?;
            let default = ChainConfig::new(DEFAULT_CHAIN).with_transformations(bare);
            chains.insert(0, default);
        }

        Ok(Configuration {
            plugins: self.plugins()?,
            providers: self.providers()?,
            merge_policies: seq_at(&self.root, "merge-policies")
                .iter()
                .filter_map(policy_from)
                .collect(),
            chains,
            modules: self.modules()?,
        })
    }

    fn render(&self) -> EditResult<String> {
        match self.format {
            DocumentFormat::Json => {
                let mut out = serde_json::to_string_pretty(&mapping_to_json(&self.root))
                    .with_context(|| format!("render {}", self.path))?;
                out.push('\n');
                Ok(out)
            }
            _ => Ok(emit::to_yaml(&self.root)),
        }
    }
}
