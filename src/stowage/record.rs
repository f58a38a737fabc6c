//! The runtime record: typed accessors, dirty queries, lifecycle hooks.
//!
//! A [`Record`] owns one [`ContainerSnapshot`] per container its layout
//! declares, plus an `Arc` to the layout itself. It is exclusively owned
//! by one host record instance — nothing here locks, and nothing is shared
//! across threads.
//!
//! The host object model drives the lifecycle: construct with [`Record::new`]
//! (or [`Record::with_attrs`]), call [`on_loaded`](Record::on_loaded) after a
//! find, [`on_saved`](Record::on_saved) after a successful persist, and
//! [`on_reloaded`](Record::on_reloaded) after a reload. [`encoded`](Record::encoded)
//! produces the raw column values the host writes back.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::codec::ContainerMap;
use crate::error::{Result, StowageError};
use crate::layout::StoreLayout;
use crate::snapshot::ContainerSnapshot;
use crate::value::TypedValue;

pub struct Record {
    layout: Arc<StoreLayout>,
    id: Uuid,
    containers: BTreeMap<String, ContainerSnapshot>,
    persisted: bool,
}

impl Record {
    /// A fresh, unpersisted record. Container-level defaults (empty
    /// mappings) are the baseline on both snapshot sides, so a new record
    /// starts clean.
    pub fn new(layout: Arc<StoreLayout>) -> Self {
        let containers = layout
            .containers()
            .map(|spec| (spec.name().to_string(), ContainerSnapshot::fresh()))
            .collect();
        Self {
            layout,
            id: Uuid::new_v4(),
            containers,
            persisted: false,
        }
    }

    /// A fresh record with explicit constructor input. Each pair goes
    /// through [`set`](Record::set): the input is cast (invalid input
    /// errors before anything is persisted) and non-default values are
    /// marked changed.
    pub fn with_attrs<I, K>(layout: Arc<StoreLayout>, attrs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        let mut record = Self::new(layout);
        for (accessor, raw) in attrs {
            record.set(accessor.as_ref(), raw)?;
        }
        Ok(record)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    pub fn layout(&self) -> &Arc<StoreLayout> {
        &self.layout
    }

    fn snapshot(&self, container: &str) -> Result<&ContainerSnapshot> {
        self.containers
            .get(container)
            .ok_or_else(|| StowageError::UnknownContainer(container.to_string()))
    }

    // ---- typed accessors -------------------------------------------------

    /// Read a field. Materializes the field default into the container on
    /// first access when the key is absent; a missing key without a
    /// default reads as [`TypedValue::Null`] and writes nothing.
    pub fn get(&mut self, accessor: &str) -> Result<TypedValue> {
        let binding = self.layout.binding(accessor)?;
        let snap = self
            .containers
            .get_mut(binding.container())
            .ok_or_else(|| StowageError::UnknownContainer(binding.container().to_string()))?;

        if let Some(raw) = snap.current().get(binding.key()) {
            return binding.caster().cast(raw);
        }

        match binding.default().resolve() {
            Some(raw) => {
                let typed = binding.caster().cast(&raw)?;
                let stored = binding.caster().serialize(&typed)?;
                trace!(accessor, container = binding.container(), "materializing field default");
                snap.materialize_default(binding.key(), stored);
                Ok(typed)
            }
            None => Ok(TypedValue::Null),
        }
    }

    /// Write a field. The raw input is cast and serialized *before* the
    /// container is touched, so invalid input (type or range) leaves the
    /// record untouched. Returns the cast value actually stored, not the
    /// input.
    pub fn set(&mut self, accessor: &str, raw: impl Into<Value>) -> Result<TypedValue> {
        let raw = raw.into();
        let binding = self.layout.binding(accessor)?;
        let typed = binding.caster().cast(&raw)?;
        let stored = binding.caster().serialize(&typed)?;
        let snap = self
            .containers
            .get_mut(binding.container())
            .ok_or_else(|| StowageError::UnknownContainer(binding.container().to_string()))?;
        snap.write(binding.key(), stored);
        Ok(typed)
    }

    /// Predicate: true unless the cast value is null or `false`.
    pub fn is_truthy(&mut self, accessor: &str) -> Result<bool> {
        Ok(self.get(accessor)?.is_truthy())
    }

    // ---- field-level dirty queries ---------------------------------------

    pub fn changed(&self, accessor: &str) -> Result<bool> {
        let binding = self.layout.binding(accessor)?;
        let snap = self.snapshot(binding.container())?;
        Ok(snap
            .field_change(binding.key(), binding.caster().as_ref())
            .is_some())
    }

    /// The value at the last load/save boundary, cast.
    pub fn was(&self, accessor: &str) -> Result<TypedValue> {
        let binding = self.layout.binding(accessor)?;
        let snap = self.snapshot(binding.container())?;
        let raw = snap
            .original()
            .get(binding.key())
            .cloned()
            .unwrap_or(Value::Null);
        binding.caster().cast(&raw)
    }

    /// The `(old, new)` pair for a dirty field, cast, or `None` when the
    /// field is clean under its serialized representation.
    pub fn change(&self, accessor: &str) -> Result<Option<(TypedValue, TypedValue)>> {
        let binding = self.layout.binding(accessor)?;
        let snap = self.snapshot(binding.container())?;
        match snap.field_change(binding.key(), binding.caster().as_ref()) {
            Some((old, new)) => {
                let old = binding.caster().cast(&old)?;
                let new = binding.caster().cast(&new)?;
                Ok(Some((old, new)))
            }
            None => Ok(None),
        }
    }

    // ---- saved-change introspection --------------------------------------

    pub fn saved_change_to(&self, accessor: &str) -> Result<bool> {
        let binding = self.layout.binding(accessor)?;
        let snap = self.snapshot(binding.container())?;
        Ok(snap
            .saved_field_change(binding.key(), binding.caster().as_ref())
            .is_some())
    }

    /// The `(before, after)` pair across the most recent save, cast, or
    /// `None` if the field did not change in that save.
    pub fn saved_change(&self, accessor: &str) -> Result<Option<(TypedValue, TypedValue)>> {
        let binding = self.layout.binding(accessor)?;
        let snap = self.snapshot(binding.container())?;
        match snap.saved_field_change(binding.key(), binding.caster().as_ref()) {
            Some((old, new)) => {
                let old = binding.caster().cast(&old)?;
                let new = binding.caster().cast(&new)?;
                Ok(Some((old, new)))
            }
            None => Ok(None),
        }
    }

    /// The field's value just before the most recent save. Null when the
    /// record has never been saved in this lifetime segment.
    pub fn before_last_save(&self, accessor: &str) -> Result<TypedValue> {
        let binding = self.layout.binding(accessor)?;
        let snap = self.snapshot(binding.container())?;
        let raw = snap
            .saved_pair()
            .and_then(|(before, _)| before.get(binding.key()).cloned())
            .unwrap_or(Value::Null);
        binding.caster().cast(&raw)
    }

    // ---- container-level surface -----------------------------------------

    pub fn container_changed(&self, container: &str) -> Result<bool> {
        Ok(self.snapshot(container)?.changed())
    }

    pub fn container_change(&self, container: &str) -> Result<Option<(Value, Value)>> {
        Ok(self.snapshot(container)?.change())
    }

    /// Every changed container with its whole-container before/after pair.
    /// This is the surface the host's generic change tracking consumes, so
    /// store changes report at container granularity exactly like ordinary
    /// column changes.
    pub fn changes(&self) -> BTreeMap<String, (Value, Value)> {
        self.containers
            .iter()
            .filter_map(|(name, snap)| snap.change().map(|pair| (name.clone(), pair)))
            .collect()
    }

    // ---- raw (untyped) access --------------------------------------------

    /// Read a key without casting. This is the plain-store path; it also
    /// reaches keys of typed containers not covered by any declaration.
    pub fn read_raw(&self, container: &str, key: &str) -> Result<Option<&Value>> {
        Ok(self.snapshot(container)?.current().get(key))
    }

    /// Write a key without casting. Raw values are compared literally by
    /// the diff layer and cast lazily if a typed accessor reads them.
    pub fn write_raw(&mut self, container: &str, key: &str, value: impl Into<Value>) -> Result<()> {
        let snap = self
            .containers
            .get_mut(container)
            .ok_or_else(|| StowageError::UnknownContainer(container.to_string()))?;
        snap.write(key, value.into());
        Ok(())
    }

    /// Literal `(old, new)` pair for an untyped key, missing and explicit
    /// null kept distinct.
    pub fn raw_change(
        &self,
        container: &str,
        key: &str,
    ) -> Result<Option<(Option<Value>, Option<Value>)>> {
        Ok(self.snapshot(container)?.field_change_raw(key))
    }

    pub fn keys(&self, container: &str) -> Result<Vec<&str>> {
        Ok(self
            .snapshot(container)?
            .current()
            .keys()
            .map(String::as_str)
            .collect())
    }

    pub fn contains(&self, container: &str, key: &str) -> Result<bool> {
        Ok(self.snapshot(container)?.current().contains_key(key))
    }

    // ---- lifecycle -------------------------------------------------------

    /// Install snapshots from freshly loaded storage. `rows` maps container
    /// name to the raw column value; absent or NULL columns fall back to
    /// the container-level default. Decode errors leave the record as it
    /// was.
    pub fn on_loaded(&mut self, rows: &HashMap<String, Option<String>>) -> Result<()> {
        self.install(rows)?;
        self.persisted = true;
        debug!(record = %self.id, "store containers loaded");
        Ok(())
    }

    /// Install one container from an already-decoded mapping, for hosts
    /// whose storage hands back native maps rather than column text.
    pub fn on_loaded_map(&mut self, container: &str, map: ContainerMap) -> Result<()> {
        let snap = self
            .containers
            .get_mut(container)
            .ok_or_else(|| StowageError::UnknownContainer(container.to_string()))?;
        snap.reload(map);
        self.persisted = true;
        Ok(())
    }

    /// Save boundary: every container freezes its before/after pair for
    /// `saved_change` queries and then reads as clean.
    pub fn on_saved(&mut self) {
        for snap in self.containers.values_mut() {
            snap.mark_saved();
        }
        self.persisted = true;
        debug!(record = %self.id, "store snapshots reset after save");
    }

    /// Reload boundary: snapshots reset from storage, uncommitted writes
    /// and saved-change pairs discarded.
    pub fn on_reloaded(&mut self, rows: &HashMap<String, Option<String>>) -> Result<()> {
        self.install(rows)?;
        self.persisted = true;
        debug!(record = %self.id, "store containers reloaded");
        Ok(())
    }

    fn install(&mut self, rows: &HashMap<String, Option<String>>) -> Result<()> {
        // Decode everything before touching any snapshot, so a bad column
        // cannot leave the record half-loaded.
        let mut decoded: Vec<(String, ContainerMap)> = Vec::new();
        for spec in self.layout.containers() {
            let raw = rows.get(spec.name()).and_then(|column| column.as_deref());
            let map = match raw {
                Some(text) => spec.codec().decode(text)?,
                None => ContainerMap::new(),
            };
            decoded.push((spec.name().to_string(), map));
        }
        for (name, map) in decoded {
            if let Some(snap) = self.containers.get_mut(&name) {
                snap.reload(map);
            }
        }
        Ok(())
    }

    /// Encode every container's current mapping for persistence.
    pub fn encoded(&self) -> Result<HashMap<String, String>> {
        let mut rows = HashMap::new();
        for spec in self.layout.containers() {
            let snap = self.snapshot(spec.name())?;
            rows.insert(spec.name().to_string(), spec.codec().encode(snap.current())?);
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cast::TypeDescriptor;
    use crate::layout::{FieldSpec, StoreLayout};
    use serde_json::json;

    fn settings_layout() -> Arc<StoreLayout> {
        StoreLayout::builder()
            .typed_store(
                "settings",
                vec![
                    FieldSpec::new("active", TypeDescriptor::Boolean),
                    FieldSpec::new("ratio", TypeDescriptor::integer_with_limit(1)),
                    FieldSpec::new("color", TypeDescriptor::String).default_value(json!("blue")),
                    FieldSpec::new("volume", TypeDescriptor::integer()),
                ],
            )
            .build()
            .unwrap()
    }

    #[test]
    fn set_returns_the_cast_value_not_the_input() {
        let mut record = Record::new(settings_layout());
        let stored = record.set("active", json!("1")).unwrap();
        assert_eq!(stored, TypedValue::Bool(true));
        assert_eq!(record.get("active").unwrap(), TypedValue::Bool(true));
    }

    #[test]
    fn boolean_write_reports_container_level_change() {
        let mut record = Record::new(settings_layout());
        record.set("active", json!("1")).unwrap();

        let changes = record.changes();
        let (old, new) = changes.get("settings").unwrap();
        assert_eq!(old, &json!({}));
        assert_eq!(new, &json!({"active": true}));
    }

    #[test]
    fn missing_field_without_default_reads_null_and_writes_nothing() {
        let mut record = Record::new(settings_layout());
        assert_eq!(record.get("volume").unwrap(), TypedValue::Null);
        assert!(!record.contains("settings", "volume").unwrap());
        assert!(record.changes().is_empty());
    }

    #[test]
    fn static_default_materializes_once_without_dirtying() {
        let mut record = Record::new(settings_layout());
        assert_eq!(record.get("color").unwrap(), TypedValue::Str("blue".into()));
        assert_eq!(record.get("color").unwrap(), TypedValue::Str("blue".into()));

        assert!(record.contains("settings", "color").unwrap());
        assert!(!record.changed("color").unwrap());
        assert!(record.changes().is_empty());
    }

    #[test]
    fn computed_default_runs_per_record() {
        use std::sync::atomic::{AtomicI64, Ordering};
        static TICKS: AtomicI64 = AtomicI64::new(0);

        let layout = StoreLayout::builder()
            .field(
                "settings",
                FieldSpec::new("seq", TypeDescriptor::integer())
                    .default_fn(|| json!(TICKS.fetch_add(1, Ordering::SeqCst))),
            )
            .build()
            .unwrap();

        let mut first = Record::new(layout.clone());
        let mut second = Record::new(layout);
        let a = first.get("seq").unwrap();
        let b = second.get("seq").unwrap();
        assert_ne!(a, b);
        // Within one record the materialized value is stable.
        assert_eq!(first.get("seq").unwrap(), a);
    }

    #[test]
    fn out_of_range_write_leaves_container_untouched() {
        let mut record = Record::new(settings_layout());
        let result = record.set("ratio", json!(1024));
        assert!(matches!(result, Err(StowageError::OutOfRange { .. })));
        assert!(!record.contains("settings", "ratio").unwrap());
        assert!(record.changes().is_empty());
    }

    #[test]
    fn constructor_input_is_cast_and_marked_changed() {
        let layout = settings_layout();
        let record =
            Record::with_attrs(layout, vec![("active", json!("1"))]).unwrap();
        assert!(record.changed("active").unwrap());
        assert!(record.container_changed("settings").unwrap());
    }

    #[test]
    fn constructor_rejects_out_of_range_input() {
        let layout = settings_layout();
        let result = Record::with_attrs(layout, vec![("ratio", json!(1024))]);
        assert!(matches!(result, Err(StowageError::OutOfRange { .. })));
    }

    #[test]
    fn dirty_isolation_between_sibling_fields() {
        let mut record = Record::new(settings_layout());
        record.set("active", json!(true)).unwrap();
        assert!(record.changed("active").unwrap());
        assert!(!record.changed("volume").unwrap());
        assert!(!record.changed("color").unwrap());
    }

    #[test]
    fn container_changed_iff_some_field_changed() {
        let mut record = Record::new(settings_layout());
        let rows = HashMap::from([(
            "settings".to_string(),
            Some(r#"{"volume": 3}"#.to_string()),
        )]);
        record.on_loaded(&rows).unwrap();
        assert!(!record.container_changed("settings").unwrap());

        record.set("volume", json!(5)).unwrap();
        assert!(record.container_changed("settings").unwrap());
        assert!(record.changed("volume").unwrap());

        // Writing the original value back (as a string, even) clears the
        // field diff and the container diff together.
        record.set("volume", json!("3")).unwrap();
        assert!(!record.changed("volume").unwrap());
        assert!(!record.container_changed("settings").unwrap());
    }

    #[test]
    fn change_and_was_report_cast_values() {
        let mut record = Record::new(settings_layout());
        record.set("volume", json!("5")).unwrap();

        assert_eq!(record.was("volume").unwrap(), TypedValue::Null);
        let (old, new) = record.change("volume").unwrap().unwrap();
        assert_eq!(old, TypedValue::Null);
        assert_eq!(new, TypedValue::Int(5));
    }

    #[test]
    fn predicate_follows_truthiness() {
        let mut record = Record::new(settings_layout());
        assert!(!record.is_truthy("active").unwrap());
        record.set("active", json!("0")).unwrap();
        assert!(!record.is_truthy("active").unwrap());
        record.set("active", json!("1")).unwrap();
        assert!(record.is_truthy("active").unwrap());
        // Zero is set, therefore truthy.
        record.set("volume", json!(0)).unwrap();
        assert!(record.is_truthy("volume").unwrap());
    }

    #[test]
    fn save_resets_dirty_state_and_retains_saved_change() {
        let mut record = Record::new(settings_layout());
        record.set("active", json!(true)).unwrap();
        record.on_saved();

        assert!(!record.changed("active").unwrap());
        assert!(record.changes().is_empty());
        assert!(record.saved_change_to("active").unwrap());

        let (before, after) = record.saved_change("active").unwrap().unwrap();
        assert_eq!(before, TypedValue::Null);
        assert_eq!(after, TypedValue::Bool(true));
        assert_eq!(record.before_last_save("active").unwrap(), TypedValue::Null);
    }

    #[test]
    fn saved_change_ignores_fields_untouched_by_the_save() {
        let mut record = Record::new(settings_layout());
        record.set("active", json!(true)).unwrap();
        record.on_saved();
        assert!(!record.saved_change_to("volume").unwrap());
        assert!(record.saved_change("volume").unwrap().is_none());
    }

    #[test]
    fn on_loaded_populates_and_reads_clean() {
        let mut record = Record::new(settings_layout());
        let rows = HashMap::from([(
            "settings".to_string(),
            Some(r#"{"active": true, "volume": 7}"#.to_string()),
        )]);
        record.on_loaded(&rows).unwrap();

        assert!(record.is_persisted());
        assert!(!record.container_changed("settings").unwrap());
        assert_eq!(record.get("volume").unwrap(), TypedValue::Int(7));
    }

    #[test]
    fn on_reloaded_discards_uncommitted_writes() {
        let mut record = Record::new(settings_layout());
        let rows = HashMap::from([(
            "settings".to_string(),
            Some(r#"{"volume": 7}"#.to_string()),
        )]);
        record.on_loaded(&rows).unwrap();
        record.set("volume", json!(9)).unwrap();
        assert!(record.changed("volume").unwrap());

        record.on_reloaded(&rows).unwrap();
        assert!(!record.changed("volume").unwrap());
        assert_eq!(record.get("volume").unwrap(), TypedValue::Int(7));
    }

    #[test]
    fn absent_column_falls_back_to_container_default() {
        let mut record = Record::new(settings_layout());
        let rows = HashMap::from([("settings".to_string(), None)]);
        record.on_loaded(&rows).unwrap();
        assert!(!record.container_changed("settings").unwrap());
        assert_eq!(record.get("volume").unwrap(), TypedValue::Null);
    }

    #[test]
    fn raw_writes_coexist_with_typed_accessors() {
        let layout = StoreLayout::builder()
            .store("settings")
            .field("settings", FieldSpec::new("active", TypeDescriptor::Boolean))
            .build()
            .unwrap();
        let mut record = Record::new(layout);

        record.write_raw("settings", "freeform", json!("anything")).unwrap();
        record.set("active", json!("1")).unwrap();

        assert_eq!(
            record.read_raw("settings", "freeform").unwrap(),
            Some(&json!("anything"))
        );
        let (_, new) = record.container_change("settings").unwrap().unwrap();
        assert_eq!(new, json!({"freeform": "anything", "active": true}));
    }

    #[test]
    fn uncastable_stored_value_errors_only_on_read() {
        let mut record = Record::new(settings_layout());
        record.write_raw("settings", "volume", json!("loud")).unwrap();
        // Diffing treats it as opaque; reading surfaces the cast error.
        assert!(record.container_changed("settings").unwrap());
        assert!(matches!(
            record.get("volume"),
            Err(StowageError::Cast { .. })
        ));
    }

    #[test]
    fn encoded_round_trips_through_on_loaded() {
        let mut record = Record::new(settings_layout());
        record.set("active", json!(true)).unwrap();
        record.set("volume", json!(4)).unwrap();

        let rows: HashMap<String, Option<String>> = record
            .encoded()
            .unwrap()
            .into_iter()
            .map(|(k, v)| (k, Some(v)))
            .collect();

        let mut reloaded = Record::new(settings_layout());
        reloaded.on_loaded(&rows).unwrap();
        assert_eq!(reloaded.get("active").unwrap(), TypedValue::Bool(true));
        assert_eq!(reloaded.get("volume").unwrap(), TypedValue::Int(4));
        assert!(reloaded.changes().is_empty());
    }
}
