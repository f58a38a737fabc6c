//! Container snapshots and diff derivation.
//!
//! Each record keeps, per container, the mapping it had at the last
//! load/save boundary (`original`) next to the mapping it has now
//! (`current`). Every dirty query — field-level or whole-container — is
//! derived from that one pair, so the two granularities cannot disagree.
//!
//! A third, optional pair (`saved`) freezes the before/after of the most
//! recent save for post-save introspection.

use serde_json::Value;

use crate::cast::Caster;
use crate::codec::ContainerMap;

#[derive(Debug, Clone, Default)]
pub struct ContainerSnapshot {
    original: ContainerMap,
    current: ContainerMap,
    saved: Option<(ContainerMap, ContainerMap)>,
}

/// Normalize a raw value through a caster for comparison. Values the
/// caster rejects stay as opaque raw values — diffing never errors.
fn normalize(raw: &Value, caster: &dyn Caster) -> Value {
    caster
        .cast(raw)
        .ok()
        .and_then(|typed| caster.serialize(&typed).ok())
        .unwrap_or_else(|| raw.clone())
}

impl ContainerSnapshot {
    /// A fresh, unpersisted container: the container-level default (an
    /// empty mapping) on both sides, so nothing registers as changed yet.
    pub fn fresh() -> Self {
        Self::default()
    }

    /// A container loaded from storage: `original` is the decoded raw
    /// value, `current` an independent copy.
    pub fn loaded(map: ContainerMap) -> Self {
        Self {
            original: map.clone(),
            current: map,
            saved: None,
        }
    }

    pub fn original(&self) -> &ContainerMap {
        &self.original
    }

    pub fn current(&self) -> &ContainerMap {
        &self.current
    }

    /// Mutable access for raw (untyped) writes.
    pub fn current_mut(&mut self) -> &mut ContainerMap {
        &mut self.current
    }

    /// A field write: mutates `current` only.
    pub fn write(&mut self, key: &str, value: Value) {
        self.current.insert(key.to_string(), value);
    }

    /// Lazily materialize a field default. Written to BOTH sides, so a
    /// default observed on read is never reported as a change; at most one
    /// mutation happens per key per lifetime segment.
    pub fn materialize_default(&mut self, key: &str, value: Value) {
        if !self.current.contains_key(key) {
            self.original.insert(key.to_string(), value.clone());
            self.current.insert(key.to_string(), value);
        }
    }

    pub fn changed(&self) -> bool {
        self.original != self.current
    }

    /// The whole-container before/after pair, or `None` when clean.
    pub fn change(&self) -> Option<(Value, Value)> {
        if self.changed() {
            Some((
                Value::Object(self.original.clone()),
                Value::Object(self.current.clone()),
            ))
        } else {
            None
        }
    }

    /// Per-field diff for a typed field: both sides are normalized through
    /// the field's caster before comparison (`5` vs `"5"` compare equal),
    /// and the returned pair carries the raw, un-normalized values with a
    /// missing key reported as null.
    pub fn field_change(&self, key: &str, caster: &dyn Caster) -> Option<(Value, Value)> {
        let old_raw = self.original.get(key).cloned().unwrap_or(Value::Null);
        let new_raw = self.current.get(key).cloned().unwrap_or(Value::Null);
        if normalize(&old_raw, caster) == normalize(&new_raw, caster) {
            None
        } else {
            Some((old_raw, new_raw))
        }
    }

    /// Per-field diff for raw access: literal comparison, missing and
    /// explicit-null kept distinct.
    pub fn field_change_raw(&self, key: &str) -> Option<(Option<Value>, Option<Value>)> {
        let old = self.original.get(key);
        let new = self.current.get(key);
        if old == new {
            None
        } else {
            Some((old.cloned(), new.cloned()))
        }
    }

    /// Save boundary: freeze the pre-save pair for introspection, then
    /// reset `original` so the record reads as clean.
    pub fn mark_saved(&mut self) {
        let before = std::mem::take(&mut self.original);
        self.saved = Some((before, self.current.clone()));
        self.original = self.current.clone();
    }

    /// Reload boundary: both sides reset from storage; uncommitted writes
    /// and the saved-change pair are discarded.
    pub fn reload(&mut self, map: ContainerMap) {
        *self = Self::loaded(map);
    }

    pub fn saved_pair(&self) -> Option<(&ContainerMap, &ContainerMap)> {
        self.saved.as_ref().map(|(b, a)| (b, a))
    }

    /// Like [`field_change`](Self::field_change) but against the frozen
    /// pre/post-save pair.
    pub fn saved_field_change(&self, key: &str, caster: &dyn Caster) -> Option<(Value, Value)> {
        let (before, after) = self.saved.as_ref()?;
        let old_raw = before.get(key).cloned().unwrap_or(Value::Null);
        let new_raw = after.get(key).cloned().unwrap_or(Value::Null);
        if normalize(&old_raw, caster) == normalize(&new_raw, caster) {
            None
        } else {
            Some((old_raw, new_raw))
        }
    }
}
