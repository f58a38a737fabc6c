//! Container column codecs.
//!
//! The host stores each container as a single raw column value; a codec
//! translates that raw text into the string-keyed mapping the snapshot
//! layer works on, and back. [`JsonCodec`] covers the common case of a
//! TEXT column holding a JSON object. Hosts with exotic column formats
//! implement [`ContainerCodec`] themselves and attach it per container at
//! declaration time.
//!
//! Absent/NULL columns never reach a codec — applying the container-level
//! default in that case is the materializer's job.

use serde_json::{Map, Value};

use crate::error::{Result, StowageError};

pub type ContainerMap = Map<String, Value>;

pub trait ContainerCodec: Send + Sync {
    fn decode(&self, raw: &str) -> Result<ContainerMap>;
    fn encode(&self, map: &ContainerMap) -> Result<String>;
}

/// The default codec: the column is JSON text holding an object (or
/// `null`, which decodes to an empty mapping).
pub struct JsonCodec;

impl ContainerCodec for JsonCodec {
    fn decode(&self, raw: &str) -> Result<ContainerMap> {
        if raw.trim().is_empty() {
            return Ok(ContainerMap::new());
        }
        let value: Value = serde_json::from_str(raw)?;
        match value {
            Value::Null => Ok(ContainerMap::new()),
            Value::Object(map) => Ok(map),
            other => Err(StowageError::Decode(format!(
                "expected a JSON object, got {}",
                other
            ))),
        }
    }

    fn encode(&self, map: &ContainerMap) -> Result<String> {
        Ok(serde_json::to_string(map)?)
    }
}
