//! Field defaults.
//!
//! A field may have no default, a static default, or a computed default.
//! Computed defaults are invoked fresh on every materialization — nothing
//! is memoized, so a "now" default observed twice can differ. Static
//! defaults hand out an independent clone per access; a caller mutating
//! the materialized value never leaks back into the declaration.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

#[derive(Clone, Default)]
pub enum DefaultSpec {
    /// No default: the key stays unset until explicitly written.
    #[default]
    Absent,
    Static(Value),
    /// Zero-argument producer, evaluated per materialization.
    Computed(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl DefaultSpec {
    pub fn computed(producer: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        DefaultSpec::Computed(Arc::new(producer))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, DefaultSpec::Absent)
    }

    /// Produce the raw default value, or `None` when absent.
    pub fn resolve(&self) -> Option<Value> {
        match self {
            DefaultSpec::Absent => None,
            DefaultSpec::Static(v) => Some(v.clone()),
            DefaultSpec::Computed(producer) => Some(producer()),
        }
    }
}

impl fmt::Debug for DefaultSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultSpec::Absent => write!(f, "Absent"),
            DefaultSpec::Static(v) => write!(f, "Static({})", v),
            DefaultSpec::Computed(_) => write!(f, "Computed(..)"),
        }
    }
}
