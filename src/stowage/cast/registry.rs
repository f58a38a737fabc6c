use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;

use super::caster::{
    BooleanCaster, Caster, DateCaster, DateTimeCaster, FloatCaster, IntegerCaster, JsonCaster,
    StringCaster,
};
use super::descriptor::TypeDescriptor;
use crate::error::{Result, StowageError};

// Option-less built-ins are shared process-wide; parameterized casters are
// cheap to build per declaration.
static BOOLEAN: Lazy<Arc<BooleanCaster>> = Lazy::new(|| Arc::new(BooleanCaster));
static STRING: Lazy<Arc<StringCaster>> = Lazy::new(|| Arc::new(StringCaster));
static DATE: Lazy<Arc<DateCaster>> = Lazy::new(|| Arc::new(DateCaster));
static DATETIME: Lazy<Arc<DateTimeCaster>> = Lazy::new(|| Arc::new(DateTimeCaster));
static JSON: Lazy<Arc<JsonCaster>> = Lazy::new(|| Arc::new(JsonCaster));

/// Resolves type descriptors into casters.
///
/// Built-in types are always available. Custom casters are registered by
/// name, once, before any layout referencing them is built; after that the
/// registry is read-only and `resolve` is a pure lookup.
#[derive(Default)]
pub struct CasterRegistry {
    custom: HashMap<String, Arc<dyn Caster>>,
}

impl CasterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, caster: Arc<dyn Caster>) {
        self.custom.insert(name.into(), caster);
    }

    pub fn resolve(&self, descriptor: &TypeDescriptor) -> Result<Arc<dyn Caster>> {
        match descriptor {
            TypeDescriptor::Boolean => Ok(BOOLEAN.clone()),
            TypeDescriptor::Integer { limit } => Ok(Arc::new(IntegerCaster::new(*limit))),
            TypeDescriptor::Float { precision, scale } => {
                Ok(Arc::new(FloatCaster::new(*precision, *scale)))
            }
            TypeDescriptor::String => Ok(STRING.clone()),
            TypeDescriptor::Date => Ok(DATE.clone()),
            TypeDescriptor::DateTime => Ok(DATETIME.clone()),
            TypeDescriptor::Json => Ok(JSON.clone()),
            TypeDescriptor::Custom(name) => self
                .custom
                .get(name)
                .cloned()
                .ok_or_else(|| StowageError::UnknownType(name.clone())),
        }
    }
}
