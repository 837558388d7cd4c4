use super::dom::{self, Element};
use super::schema::SchemaVersion;
use crate::document::{BeanInfo, BeanRef, ChainHandle, ConfigDocument, Scope};
use crate::error::{EditError, EditResult};
use anyhow::anyhow;
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use std::collections::BTreeSet;
use tracing::debug;
use walkmod_types::ops::ResourceUpdate;
use walkmod_types::schema::ROOT_ELEMENT;
use walkmod_types::{
    BeanCategory, ChainConfig, Configuration, DEFAULT_CHAIN, DEFAULT_PATH, DocumentFormat,
    FilterKind, MergePolicyConfig, Params, PluginConfig, ProviderConfig, ResourceConfig,
    ResourceSlot, TransformationConfig, WalkerConfig,
};

/// Schema order of the root sections; chains and a bare list share a slot.
const ROOT_ORDER: &[&[&str]] = &[
    &["plugins"],
    &["conf-providers"],
    &["merge-policies"],
    &["chain", "transformation"],
    &["modules"],
];

/// A `walkmod.xml` document.
#[derive(Debug, Clone)]
pub struct XmlDocument {
    path: Utf8PathBuf,
    original: Option<String>,
    prolog: Vec<String>,
    root: Element,
}

impl XmlDocument {
    /// Parses and validates `original`; `None` or blank text yields a skeleton.
    pub fn from_source(path: &Utf8Path, original: Option<String>) -> EditResult<Self> {
        let Some(text) = original.as_deref().filter(|t| !t.trim().is_empty()) else {
            return Ok(Self {
                path: path.to_path_buf(),
                original,
                prolog: Vec::new(),
                root: Element::new(ROOT_ELEMENT),
            });
        };

        let tree = dom::parse(text).map_err(|e| EditError::parse(path, format!("{e:#}")))?;
        let version = SchemaVersion::resolve(tree.doctype.as_ref())
            .map_err(|message| EditError::schema(path, message))?;
        version
            .validate(&tree.root)
            .map_err(|message| EditError::schema(path, message))?;
        debug!(%path, ?version, "loaded XML configuration");

        Ok(Self {
            path: path.to_path_buf(),
            original,
            prolog: tree.prolog,
            root: tree.root,
        })
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    fn chain_el(&self, chain: ChainHandle) -> EditResult<&Element> {
        self.root
            .children_named("chain")
            .nth(chain.0)
            .ok_or_else(|| stale(&self.path, chain))
    }

    fn chain_el_mut(&mut self, chain: ChainHandle) -> EditResult<&mut Element> {
        self.root
            .children_named_mut("chain")
            .nth(chain.0)
            .ok_or_else(|| stale(&self.path, chain))
    }

    fn section(&mut self, name: &str) -> &mut Element {
        self.root
            .ensure_child_at(name, |root| ranked_index(root, name))
    }

    pub fn ensure_plugins(&mut self) -> &mut Element {
        self.section("plugins")
    }

    pub fn ensure_providers(&mut self) -> &mut Element {
        self.section("conf-providers")
    }

    pub fn ensure_modules(&mut self) -> &mut Element {
        self.section("modules")
    }

    pub fn ensure_reader(&mut self, chain: ChainHandle) -> EditResult<&mut Element> {
        let chain_el = self.chain_el_mut(chain)?;
        Ok(ensure_resource_el(chain_el, ResourceSlot::Reader).1)
    }

    pub fn ensure_writer(&mut self, chain: ChainHandle) -> EditResult<&mut Element> {
        let chain_el = self.chain_el_mut(chain)?;
        Ok(ensure_resource_el(chain_el, ResourceSlot::Writer).1)
    }

    pub fn ensure_walker(&mut self, chain: ChainHandle) -> EditResult<&mut Element> {
        Ok(ensure_walker_el(self.chain_el_mut(chain)?))
    }

    pub fn ensure_transformations(&mut self, chain: ChainHandle) -> EditResult<&mut Element> {
        let path = self.path.clone();
        let chain_el = self.chain_el_mut(chain)?;
        chain_container_mut(chain_el, true).ok_or_else(|| stale(&path, chain))
    }

    fn remove_entry(&mut self, section: &str, entry: &str, index: usize) -> EditResult<()> {
        let path = &self.path;
        let list = self
            .root
            .child_mut(section)
            .ok_or_else(|| EditError::from(anyhow!("no <{section}> in {path}")))?;
        let at = list
            .positions(entry)
            .get(index)
            .copied()
            .ok_or_else(|| EditError::from(anyhow!("no <{entry}> #{index} in {path}")))?;
        list.children.remove(at);
        if !list.has_elements() {
            self.root.remove_named(section);
        }
        Ok(())
    }
}

fn stale(path: &Utf8Path, chain: ChainHandle) -> EditError {
    EditError::from(anyhow!("chain #{} no longer exists in {path}", chain.0))
}

fn section_rank(name: &str) -> usize {
    ROOT_ORDER
        .iter()
        .position(|group| group.contains(&name))
        .unwrap_or(ROOT_ORDER.len())
}

/// Index just past the last root section that sorts at or before `name`.
fn ranked_index(root: &Element, name: &str) -> usize {
    let rank = section_rank(name);
    root.children
        .iter()
        .enumerate()
        .filter(|(_, node)| match node {
            dom::Node::Element(el) => section_rank(&el.name) <= rank,
            _ => false,
        })
        .map(|(i, _)| i + 1)
        .last()
        .unwrap_or(0)
}

fn chain_name(chain: &Element) -> &str {
    chain.attr("name").unwrap_or(DEFAULT_CHAIN)
}

fn is_transformation_of(el: &Element, types: &BTreeSet<String>) -> bool {
    el.name == "transformation" && el.attr("type").is_some_and(|t| types.contains(t))
}

fn ensure_resource_el(chain: &mut Element, slot: ResourceSlot) -> (bool, &mut Element) {
    let default_path = match slot {
        ResourceSlot::Reader => DEFAULT_PATH.to_string(),
        ResourceSlot::Writer => chain
            .child("reader")
            .and_then(|r| r.attr("path"))
            .unwrap_or(DEFAULT_PATH)
            .to_string(),
    };
    let name = slot.as_str();
    let created = chain.child(name).is_none();
    let el = chain.ensure_child_at(name, |c| match slot {
        ResourceSlot::Reader => 0,
        ResourceSlot::Writer => c.children.len(),
    });
    if created {
        el.set_attr("path", default_path);
    }
    (created, el)
}

fn ensure_walker_el(chain: &mut Element) -> &mut Element {
    let at = chain.position("writer").unwrap_or(chain.children.len());
    chain.ensure_child_at("walker", |_| at)
}

/// The element holding a chain's transformations: `walker/transformations`,
/// or the chain itself when it lists them directly.
fn chain_container(chain: &Element) -> Option<&Element> {
    match chain.child("walker") {
        Some(walker) => walker.child("transformations"),
        None => chain.child("transformation").map(|_| chain),
    }
}

fn chain_container_mut(chain: &mut Element, create: bool) -> Option<&mut Element> {
    if chain.child("walker").is_none() {
        if chain.child("transformation").is_some() {
            return Some(chain);
        }
        if !create {
            return None;
        }
    }
    let walker = ensure_walker_el(chain);
    if walker.child("transformations").is_none() && !create {
        return None;
    }
    let at = walker.children.len();
    Some(walker.ensure_child_at("transformations", |_| at))
}

fn insert_ordered(container: &mut Element, el: Element, order: Option<usize>) {
    let positions = container.positions("transformation");
    match order.and_then(|o| positions.get(o)) {
        Some(&at) => container.insert(at, el),
        None => match positions.last() {
            Some(&last) => container.insert(last + 1, el),
            None if container.name == ROOT_ELEMENT => {
                let at = ranked_index(container, "transformation");
                container.insert(at, el);
            }
            None => container.push(el),
        },
    }
}

fn param_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn params_from(el: &Element) -> Params {
    el.children_named("param")
        .map(|p| {
            (
                p.attr("name").unwrap_or_default().to_string(),
                serde_json::Value::String(p.text()),
            )
        })
        .collect()
}

fn push_params(el: &mut Element, params: &Params) {
    for (key, value) in params {
        el.push(
            Element::new("param")
                .with_attr("name", key)
                .with_text(param_text(value)),
        );
    }
}

fn replace_params(el: &mut Element, params: &Params) {
    el.remove_named("param");
    for (i, (key, value)) in params.iter().enumerate() {
        el.insert(
            i,
            Element::new("param")
                .with_attr("name", key)
                .with_text(param_text(value)),
        );
    }
}

/// Overwrites or appends `<param name="key">`. Returns true on change.
fn set_param_el(el: &mut Element, key: &str, text: &str) -> bool {
    if let Some(param) = el
        .children_named_mut("param")
        .find(|p| p.attr("name") == Some(key))
    {
        if param.text() == text {
            return false;
        }
        param.set_text(text);
        return true;
    }
    let at = el.positions("param").last().map(|i| i + 1).unwrap_or(0);
    let param = Element::new("param")
        .with_attr("name", key)
        .with_text(text);
    el.insert(at, param);
    true
}

fn wildcards(el: &Element, tag: &str) -> Option<Vec<String>> {
    let list: Vec<String> = el
        .children_named(tag)
        .filter_map(|w| w.attr("wildcard"))
        .map(str::to_string)
        .collect();
    (!list.is_empty()).then_some(list)
}

fn resource_from(el: &Element) -> ResourceConfig {
    ResourceConfig {
        path: el.attr("path").map(str::to_string),
        type_name: el.attr("type").map(str::to_string),
        parameters: params_from(el),
        includes: wildcards(el, "include"),
        excludes: wildcards(el, "exclude"),
    }
}

fn resource_element(name: &str, resource: &ResourceConfig, default_path: &str) -> Element {
    let mut el = Element::new(name).with_attr(
        "path",
        resource.path.as_deref().unwrap_or(default_path),
    );
    if let Some(type_name) = &resource.type_name {
        el.set_attr("type", type_name);
    }
    push_params(&mut el, &resource.parameters);
    for (tag, list) in [
        ("include", &resource.includes),
        ("exclude", &resource.excludes),
    ] {
        for wildcard in list.iter().flatten() {
            el.push(Element::new(tag).with_attr("wildcard", wildcard));
        }
    }
    el
}

fn transformation_from(el: &Element) -> TransformationConfig {
    TransformationConfig {
        name: el.attr("name").map(str::to_string),
        type_name: el.attr("type").unwrap_or_default().to_string(),
        parameters: params_from(el),
        is_mergeable: el
            .attr("isMergeable")
            .is_some_and(|v| v.eq_ignore_ascii_case("true")),
        merge_policy: el.attr("merge-policy").map(str::to_string),
    }
}

fn transformations_in(container: &Element) -> Vec<TransformationConfig> {
    container
        .children_named("transformation")
        .map(transformation_from)
        .collect()
}

fn transformation_element(t: &TransformationConfig) -> Element {
    let mut el = Element::new("transformation").with_attr("type", &t.type_name);
    if let Some(name) = &t.name {
        el.set_attr("name", name);
    }
    if let Some(policy) = &t.merge_policy {
        el.set_attr("merge-policy", policy);
    }
    if t.is_mergeable {
        el.set_attr("isMergeable", "true");
    }
    push_params(&mut el, &t.parameters);
    el
}

fn walker_from(chain: &Element) -> Option<WalkerConfig> {
    let transformations = chain_container(chain)
        .map(transformations_in)
        .unwrap_or_default();
    match chain.child("walker") {
        Some(walker) => Some(WalkerConfig {
            type_name: walker.attr("type").map(str::to_string),
            parameters: params_from(walker),
            root_namespace: walker.attr("root-namespace").map(str::to_string),
            transformations,
        }),
        None if !transformations.is_empty() => Some(WalkerConfig {
            transformations,
            ..WalkerConfig::default()
        }),
        None => None,
    }
}

fn walker_element(walker: &WalkerConfig) -> Element {
    let mut el = Element::new("walker");
    if let Some(type_name) = &walker.type_name {
        el.set_attr("type", type_name);
    }
    if let Some(ns) = &walker.root_namespace {
        el.set_attr("root-namespace", ns);
    }
    push_params(&mut el, &walker.parameters);
    if !walker.transformations.is_empty() {
        let mut list = Element::new("transformations");
        for t in &walker.transformations {
            list.push(transformation_element(t));
        }
        el.push(list);
    }
    el
}

fn chain_from(el: &Element) -> ChainConfig {
    ChainConfig {
        name: chain_name(el).to_string(),
        reader: el.child("reader").map(resource_from),
        walker: walker_from(el),
        writer: el.child("writer").map(resource_from),
        // The DTD has no chain-level params.
        parameters: Params::new(),
    }
}

fn chain_element(chain: &ChainConfig) -> Element {
    let mut el = Element::new("chain").with_attr("name", &chain.name);
    if let Some(reader) = &chain.reader {
        el.push(resource_element("reader", reader, DEFAULT_PATH));
    }
    if let Some(walker) = &chain.walker {
        if !(walker.is_plain() && walker.transformations.is_empty()) {
            el.push(walker_element(walker));
        }
    }
    if let Some(writer) = &chain.writer {
        el.push(resource_element("writer", writer, chain.reader_path()));
    }
    el
}

fn plugin_from(el: &Element) -> PluginConfig {
    PluginConfig::new(
        el.attr("groupId").unwrap_or_default(),
        el.attr("artifactId").unwrap_or_default(),
        el.attr("version").unwrap_or_default(),
    )
}

fn policy_from(el: &Element) -> MergePolicyConfig {
    MergePolicyConfig {
        name: el.attr("name").unwrap_or_default().to_string(),
        default_object_policy: el.attr("default-object-policy").map(str::to_string),
        default_type_policy: el.attr("default-type-policy").map(str::to_string),
        policy_entries: el
            .children_named("policy-entry")
            .map(|e| {
                (
                    e.attr("object-type").unwrap_or_default().to_string(),
                    e.attr("policy-type").unwrap_or_default().to_string(),
                )
            })
            .collect::<IndexMap<_, _>>(),
    }
}

impl ConfigDocument for XmlDocument {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Xml
    }

    fn path(&self) -> &Utf8Path {
        &self.path
    }

    fn original(&self) -> Option<&str> {
        self.original.as_deref()
    }

    fn chain_names(&self) -> Vec<String> {
        self.root
            .children_named("chain")
            .map(|c| chain_name(c).to_string())
            .collect()
    }

    fn find_chain(&self, name: &str) -> Option<ChainHandle> {
        self.root
            .children_named("chain")
            .position(|c| chain_name(c) == name)
            .map(ChainHandle)
    }

    fn insert_chain(
        &mut self,
        chain: &ChainConfig,
        before: Option<&str>,
    ) -> EditResult<ChainHandle> {
        if !chain.parameters.is_empty() {
            return Err(EditError::schema(
                &self.path,
                format!("<chain name=\"{}\"> does not allow params", chain.name),
            ));
        }
        let positions = self.root.positions("chain");
        let target = before.and_then(|b| self.find_chain(b));
        if let (Some(before), None) = (before, target) {
            debug!(before, chain = %chain.name, "placement target not found, appending");
        }

        let (at, index) = match target {
            Some(ChainHandle(i)) => (positions[i], i),
            None => match positions.last() {
                Some(&last) => (last + 1, positions.len()),
                None => (ranked_index(&self.root, "chain"), 0),
            },
        };
        self.root.insert(at, chain_element(chain));
        Ok(ChainHandle(index))
    }

    fn remove_chain(&mut self, chain: ChainHandle) -> EditResult<()> {
        let at = self
            .root
            .positions("chain")
            .get(chain.0)
            .copied()
            .ok_or_else(|| stale(&self.path, chain))?;
        self.root.children.remove(at);
        Ok(())
    }

    fn has_root_transformations(&self) -> bool {
        self.root.child("transformation").is_some()
    }

    fn take_root_transformations(&mut self) -> EditResult<Vec<TransformationConfig>> {
        let taken = self
            .root
            .children_named("transformation")
            .map(transformation_from)
            .collect();
        self.root.remove_named("transformation");
        Ok(taken)
    }

    fn transformations(&self, scope: Scope) -> EditResult<Vec<TransformationConfig>> {
        let container = match scope {
            Scope::Root => Some(&self.root),
            Scope::Chain(chain) => chain_container(self.chain_el(chain)?),
        };
        Ok(container.map(transformations_in).unwrap_or_default())
    }

    fn insert_transformation(
        &mut self,
        scope: Scope,
        transformation: &TransformationConfig,
        order: Option<usize>,
    ) -> EditResult<()> {
        let el = transformation_element(transformation);
        match scope {
            Scope::Root => insert_ordered(&mut self.root, el, order),
            Scope::Chain(chain) => {
                let container = self.ensure_transformations(chain)?;
                insert_ordered(container, el, order);
            }
        }
        Ok(())
    }

    fn remove_transformations(
        &mut self,
        scope: Scope,
        types: &BTreeSet<String>,
    ) -> EditResult<usize> {
        let matches = |el: &Element| is_transformation_of(el, types);
        let chain = match scope {
            Scope::Root => return Ok(self.root.remove_elements(matches)),
            Scope::Chain(chain) => self.chain_el_mut(chain)?,
        };

        let mut removed = chain.remove_elements(matches);
        let mut drop_walker = false;
        if let Some(walker) = chain.child_mut("walker") {
            let mut emptied = false;
            if let Some(list) = walker.child_mut("transformations") {
                let n = list.remove_elements(matches);
                removed += n;
                emptied = n > 0 && !list.has_elements();
            }
            if emptied {
                walker.remove_named("transformations");
                drop_walker = walker.children.is_empty() && walker.attributes.is_empty();
            }
        }
        if drop_walker {
            chain.remove_named("walker");
        }
        Ok(removed)
    }

    fn resource(
        &self,
        chain: ChainHandle,
        slot: ResourceSlot,
    ) -> EditResult<Option<ResourceConfig>> {
        let chain_el = self.chain_el(chain)?;
        Ok(chain_el.child(slot.as_str()).map(resource_from))
    }

    fn ensure_resource(&mut self, chain: ChainHandle, slot: ResourceSlot) -> EditResult<bool> {
        Ok(ensure_resource_el(self.chain_el_mut(chain)?, slot).0)
    }

    fn update_resource(
        &mut self,
        chain: ChainHandle,
        slot: ResourceSlot,
        update: &ResourceUpdate,
    ) -> EditResult<bool> {
        let chain = self.chain_el_mut(chain)?;
        let before = chain.clone();
        let (_, el) = ensure_resource_el(chain, slot);
        if let Some(path) = &update.path {
            el.set_attr("path", path);
        }
        if let Some(type_name) = &update.type_name {
            el.set_attr("type", type_name);
        }
        if !update.params.is_empty() {
            replace_params(el, &update.params);
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
        let tag = match kind {
            FilterKind::Includes => "include",
            FilterKind::Excludes => "exclude",
        };
        let chain = self.chain_el_mut(chain)?;
        let before = chain.clone();

        if wildcards.is_empty() {
            if let Some(el) = chain.child_mut(slot.as_str()) {
                el.remove_named(tag);
            }
        } else {
            let (_, el) = ensure_resource_el(chain, slot);
            el.remove_named(tag);
            let at = match kind {
                FilterKind::Includes => el.position("exclude").unwrap_or(el.children.len()),
                FilterKind::Excludes => el.children.len(),
            };
            for (i, wildcard) in wildcards.iter().enumerate() {
                el.insert(at + i, Element::new(tag).with_attr("wildcard", wildcard));
            }
        }
        Ok(*chain != before)
    }

    fn plugins(&self) -> EditResult<Vec<PluginConfig>> {
        Ok(self
            .root
            .child("plugins")
            .map(|s| s.children_named("plugin").map(plugin_from).collect())
            .unwrap_or_default())
    }

    fn push_plugin(&mut self, plugin: &PluginConfig) -> EditResult<()> {
        self.ensure_plugins().push(
            Element::new("plugin")
                .with_attr("groupId", &plugin.group_id)
                .with_attr("artifactId", &plugin.artifact_id)
                .with_attr("version", &plugin.version),
        );
        Ok(())
    }

    fn remove_plugin(&mut self, index: usize) -> EditResult<()> {
        self.remove_entry("plugins", "plugin", index)
    }

    fn providers(&self) -> EditResult<Vec<ProviderConfig>> {
        Ok(self
            .root
            .child("conf-providers")
            .map(|s| {
                s.children_named("conf-provider")
                    .map(|p| ProviderConfig {
                        type_name: p.attr("type").unwrap_or_default().to_string(),
                        parameters: params_from(p),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    fn push_provider(&mut self, provider: &ProviderConfig) -> EditResult<()> {
        let mut el = Element::new("conf-provider").with_attr("type", &provider.type_name);
        push_params(&mut el, &provider.parameters);
        self.ensure_providers().push(el);
        Ok(())
    }

    fn remove_provider(&mut self, index: usize) -> EditResult<()> {
        self.remove_entry("conf-providers", "conf-provider", index)
    }

    fn modules(&self) -> EditResult<Vec<String>> {
        Ok(self
            .root
            .child("modules")
            .map(|s| s.children_named("module").map(Element::text).collect())
            .unwrap_or_default())
    }

    fn push_module(&mut self, module: &str) -> EditResult<()> {
        self.ensure_modules()
            .push(Element::new("module").with_text(module));
        Ok(())
    }

    fn remove_module(&mut self, index: usize) -> EditResult<()> {
        self.remove_entry("modules", "module", index)
    }

    fn beans(&self) -> EditResult<Vec<BeanInfo>> {
        let mut beans = Vec::new();
        let info = |bean, category, chain: &str, el: &Element| BeanInfo {
            bean,
            category,
            chain: chain.to_string(),
            type_name: el.attr("type").map(str::to_string),
            name: el.attr("name").map(str::to_string),
        };

        for (i, chain) in self.root.children_named("chain").enumerate() {
            let handle = ChainHandle(i);
            let name = chain_name(chain);
            if let Some(reader) = chain.child("reader") {
                beans.push(info(
                    BeanRef::Resource(handle, ResourceSlot::Reader),
                    BeanCategory::Reader,
                    name,
                    reader,
                ));
            }
            if let Some(walker) = chain.child("walker") {
                beans.push(info(
                    BeanRef::Walker(handle),
                    BeanCategory::Walker,
                    name,
                    walker,
                ));
            }
            if let Some(container) = chain_container(chain) {
                for (j, t) in container.children_named("transformation").enumerate() {
                    beans.push(info(
                        BeanRef::Transformation(Scope::Chain(handle), j),
                        BeanCategory::Transformation,
                        name,
                        t,
                    ));
                }
            }
            if let Some(writer) = chain.child("writer") {
                beans.push(info(
                    BeanRef::Resource(handle, ResourceSlot::Writer),
                    BeanCategory::Writer,
                    name,
                    writer,
                ));
            }
        }
        for (j, t) in self.root.children_named("transformation").enumerate() {
            beans.push(info(
                BeanRef::Transformation(Scope::Root, j),
                BeanCategory::Transformation,
                DEFAULT_CHAIN,
                t,
            ));
        }
        Ok(beans)
    }

    fn set_param(
        &mut self,
        bean: BeanRef,
        key: &str,
        value: &serde_json::Value,
    ) -> EditResult<bool> {
        let path = self.path.clone();
        let target = match bean {
            BeanRef::Resource(chain, slot) => self.chain_el_mut(chain)?.child_mut(slot.as_str()),
            BeanRef::Walker(chain) => self.chain_el_mut(chain)?.child_mut("walker"),
            BeanRef::Transformation(Scope::Root, j) => {
                self.root.children_named_mut("transformation").nth(j)
            }
            BeanRef::Transformation(Scope::Chain(chain), j) => {
                chain_container_mut(self.chain_el_mut(chain)?, false)
                    .and_then(|c| c.children_named_mut("transformation").nth(j))
            }
        }
        .ok_or_else(|| EditError::from(anyhow!("{bean:?} does not exist in {path}")))?;
        Ok(set_param_el(target, key, &param_text(value)))
    }

    fn configuration(&self) -> EditResult<Configuration> {
        let mut chains: Vec<ChainConfig> =
            self.root.children_named("chain").map(chain_from).collect();
        if self.has_root_transformations() && !chains.iter().any(|c| c.name == DEFAULT_CHAIN) {
            let bare = self.transformations(Scope::Root)?;
            let default = ChainConfig::new(DEFAULT_CHAIN).with_transformations(bare);
            chains.insert(0, default);
        }

        Ok(Configuration {
            plugins: self.plugins()?,
            providers: self.providers()?,
            merge_policies: self
                .root
                .child("merge-policies")
                .map(|s| s.children_named("policy").map(policy_from).collect())
                .unwrap_or_default(),
            chains,
            modules: self.modules()?,
        })
    }

    fn render(&self) -> EditResult<String> {
        SchemaVersion::V1_1
            .validate(&self.root)
            .map_err(|message| EditError::schema(&self.path, message))?;
        Ok(dom::write(
            &SchemaVersion::current_doctype(),
            &self.prolog,
            &self.root,
        ))
    }
}
