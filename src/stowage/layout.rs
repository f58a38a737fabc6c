//! Field declarations and the per-model accessor table.
//!
//! A [`StoreLayout`] is the declarative heart of the crate: the full set of
//! containers and typed fields one model type exposes. It is built once —
//! typically in a `once_cell::sync::Lazy` next to the model — and never
//! mutated afterwards; records hold an `Arc` to it.
//!
//! Declaration errors (unknown type names) surface at [`LayoutBuilder::build`],
//! not at first access. Declaring two fields that derive the same accessor
//! name is legal and the later declaration wins, replacing the earlier
//! accessor set wholesale.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::cast::{Caster, CasterRegistry, TypeDescriptor};
use crate::codec::{ContainerCodec, JsonCodec};
use crate::default::DefaultSpec;
use crate::error::{Result, StowageError};

/// Accessor-name decoration, literal or derived from the container name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Affix {
    #[default]
    None,
    /// Use the owning container's name, joined with `_`.
    Container,
    /// Use the given string, joined with `_`.
    Literal(String),
}

impl Affix {
    fn text<'a>(&'a self, container: &'a str) -> Option<&'a str> {
        match self {
            Affix::None => None,
            Affix::Container => Some(container),
            Affix::Literal(s) => Some(s),
        }
    }
}

/// One typed field declaration, before it is bound into a layout.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: String,
    descriptor: TypeDescriptor,
    default: DefaultSpec,
    prefix: Affix,
    suffix: Affix,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, descriptor: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            descriptor,
            default: DefaultSpec::Absent,
            prefix: Affix::None,
            suffix: Affix::None,
        }
    }

    pub fn default_value(mut self, value: serde_json::Value) -> Self {
        self.default = DefaultSpec::Static(value);
        self
    }

    /// Computed default, evaluated fresh on every materialization.
    pub fn default_fn(
        mut self,
        producer: impl Fn() -> serde_json::Value + Send + Sync + 'static,
    ) -> Self {
        self.default = DefaultSpec::computed(producer);
        self
    }

    /// Prefix the accessor with the container name (`settings_color`).
    pub fn prefixed(mut self) -> Self {
        self.prefix = Affix::Container;
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Affix::Literal(prefix.into());
        self
    }

    /// Suffix the accessor with the container name (`color_settings`).
    pub fn suffixed(mut self) -> Self {
        self.suffix = Affix::Container;
        self
    }

    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Affix::Literal(suffix.into());
        self
    }

    fn accessor_name(&self, container: &str) -> String {
        let mut name = String::new();
        if let Some(prefix) = self.prefix.text(container) {
            name.push_str(prefix);
            name.push('_');
        }
        name.push_str(&self.name);
        if let Some(suffix) = self.suffix.text(container) {
            name.push('_');
            name.push_str(suffix);
        }
        name
    }
}

/// A field declaration resolved against a registry and bound to its
/// container: everything an accessor needs at runtime.
#[derive(Clone)]
pub struct FieldBinding {
    container: String,
    key: String,
    accessor: String,
    caster: Arc<dyn Caster>,
    default: DefaultSpec,
}

impl FieldBinding {
    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn accessor(&self) -> &str {
        &self.accessor
    }

    pub fn caster(&self) -> &Arc<dyn Caster> {
        &self.caster
    }

    pub fn default(&self) -> &DefaultSpec {
        &self.default
    }
}

/// A declared container and its codec.
#[derive(Clone)]
pub struct ContainerSpec {
    name: String,
    codec: Arc<dyn ContainerCodec>,
}

impl ContainerSpec {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn codec(&self) -> &Arc<dyn ContainerCodec> {
        &self.codec
    }
}

/// The immutable accessor table for one model type.
pub struct StoreLayout {
    containers: BTreeMap<String, ContainerSpec>,
    bindings: BTreeMap<String, FieldBinding>,
}

impl StoreLayout {
    pub fn builder() -> LayoutBuilder {
        LayoutBuilder::new()
    }

    pub fn binding(&self, accessor: &str) -> Result<&FieldBinding> {
        self.bindings
            .get(accessor)
            .ok_or_else(|| StowageError::UnknownAccessor(accessor.to_string()))
    }

    pub fn container(&self, name: &str) -> Result<&ContainerSpec> {
        self.containers
            .get(name)
            .ok_or_else(|| StowageError::UnknownContainer(name.to_string()))
    }

    pub fn containers(&self) -> impl Iterator<Item = &ContainerSpec> {
        self.containers.values()
    }

    pub fn accessors(&self) -> impl Iterator<Item = &FieldBinding> {
        self.bindings.values()
    }

    /// Bindings declared for one container, in accessor order.
    pub fn bindings_for<'a>(
        &'a self,
        container: &'a str,
    ) -> impl Iterator<Item = &'a FieldBinding> {
        self.bindings
            .values()
            .filter(move |b| b.container == container)
    }
}

/// Collects declarations and resolves them into a [`StoreLayout`].
pub struct LayoutBuilder {
    registry: CasterRegistry,
    containers: BTreeMap<String, ContainerSpec>,
    fields: Vec<(String, FieldSpec)>,
}

impl LayoutBuilder {
    pub fn new() -> Self {
        Self::with_registry(CasterRegistry::new())
    }

    /// Use a registry carrying application-defined casters.
    pub fn with_registry(registry: CasterRegistry) -> Self {
        Self {
            registry,
            containers: BTreeMap::new(),
            fields: Vec::new(),
        }
    }

    /// Declare a plain container: raw, untyped access only. Typed fields
    /// may still be declared on the same container; the two coexist.
    pub fn store(mut self, container: &str) -> Self {
        self.ensure_container(container);
        self
    }

    /// Declare a batch of typed fields on one container.
    pub fn typed_store(mut self, container: &str, fields: Vec<FieldSpec>) -> Self {
        self.ensure_container(container);
        for spec in fields {
            self.fields.push((container.to_string(), spec));
        }
        self
    }

    /// Like [`typed_store`](Self::typed_store), but every accessor in the
    /// batch carries the container-name prefix (`settings_color`, ...).
    pub fn prefixed_typed_store(mut self, container: &str, fields: Vec<FieldSpec>) -> Self {
        self.ensure_container(container);
        for spec in fields {
            self.fields.push((container.to_string(), spec.prefixed()));
        }
        self
    }

    /// Declare a single typed field.
    pub fn field(mut self, container: &str, spec: FieldSpec) -> Self {
        self.ensure_container(container);
        self.fields.push((container.to_string(), spec));
        self
    }

    /// Replace the codec for a container (declares it if needed).
    pub fn codec(mut self, container: &str, codec: Arc<dyn ContainerCodec>) -> Self {
        self.ensure_container(container);
        if let Some(spec) = self.containers.get_mut(container) {
            spec.codec = codec;
        }
        self
    }

    fn ensure_container(&mut self, name: &str) {
        self.containers
            .entry(name.to_string())
            .or_insert_with(|| ContainerSpec {
                name: name.to_string(),
                codec: Arc::new(JsonCodec),
            });
    }

    /// Resolve every declaration. Unknown type descriptors fail here.
    pub fn build(self) -> Result<Arc<StoreLayout>> {
        let mut bindings = BTreeMap::new();
        for (container, spec) in self.fields {
            let caster = self.registry.resolve(&spec.descriptor)?;
            let accessor = spec.accessor_name(&container);
            // Later declarations win; this is the documented overwrite rule.
            bindings.insert(
                accessor.clone(),
                FieldBinding {
                    container,
                    key: spec.name,
                    accessor,
                    caster,
                    default: spec.default,
                },
            );
        }
        tracing::debug!(
            containers = self.containers.len(),
            accessors = bindings.len(),
            "store layout built"
        );
        Ok(Arc::new(StoreLayout {
            containers: self.containers,
            bindings,
        }))
    }
}

impl Default for LayoutBuilder {
    fn default() -> Self {
        Self::new()
    }
}
