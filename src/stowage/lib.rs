//! # Stowage Architecture
//!
//! Stowage is a **typecasting layer for store columns**: it lets a record
//! declare individually typed fields that live inside a single serialized
//! container column (a JSON blob, typically) instead of dedicated columns,
//! and keeps those fields honest — cast on the way in, cast on the way out,
//! dirty-tracked against the value loaded from storage.
//!
//! It is a library, not an ORM. The host object model owns persistence and
//! calls back into stowage at its lifecycle boundaries.
//!
//! ## The Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Declaration Layer (layout.rs, cast/, default.rs)           │
//! │  - Field specs: name, type, default, prefix/suffix          │
//! │  - Built once per model type, immutable afterwards          │
//! │  - Unknown types fail here, not at first use                │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Record Runtime (record.rs)                                 │
//! │  - get / set / is_truthy per accessor                       │
//! │  - changed / was / change, saved_change introspection       │
//! │  - lifecycle hooks: on_loaded, on_saved, on_reloaded        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Snapshot Layer (snapshot.rs)                               │
//! │  - (original, current) container pair per record            │
//! │  - whole-container diffs and per-field views from the same  │
//! │    pair, so both granularities always agree                 │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Boundary (codec.rs, store/)                                │
//! │  - ContainerCodec: raw column text ⇄ mapping                │
//! │  - RecordStore: reference hosts (memory, file) used to      │
//! │    drive the save/reload lifecycle in tests                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Principle: Casting Never Lies
//!
//! A write casts and serializes **before** touching the container; invalid
//! input (a non-parseable date, an integer past its limit) errors out and
//! leaves the container exactly as it was. Reads cast the stored raw value
//! at access time and surface incompatibilities then — values written
//! behind the accessor's back are kept as opaque raw values until someone
//! actually reads them. Cast errors are never swallowed and never
//! downgraded to defaults.
//!
//! ## Dirty Tracking
//!
//! Every container keeps the value it had at load time next to the value
//! it has now. Field-level queries (`changed`, `was`, `change`) and the
//! host-facing container-level diff (`changes`) are both derived from that
//! one snapshot pair. Comparison normalizes both sides through the field's
//! caster, so `5` and `"5"` written through an integer accessor compare
//! equal, while raw writes compare literally.
//!
//! Lazily materialized defaults are written to both sides of the snapshot
//! and therefore never show up as changes; only explicit writes do.
//!
//! ## Module Overview
//!
//! - [`layout`]: field declarations and the per-model accessor table
//! - [`cast`]: type descriptors, casters, and the caster registry
//! - [`default`]: static and computed field defaults
//! - [`record`]: the runtime record — accessors, dirty queries, lifecycle
//! - [`snapshot`]: container snapshots and diff derivation
//! - [`codec`]: container column codecs (JSON by default)
//! - [`store`]: reference persistence hosts for tests and examples
//! - [`value`]: the typed value enum returned by accessors
//! - [`error`]: error types

pub mod cast;
pub mod codec;
pub mod default;
pub mod error;
pub mod layout;
pub mod record;
pub mod snapshot;
pub mod store;
pub mod value;
