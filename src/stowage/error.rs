use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StowageError {
    /// Raised at declaration time: the layout names a type the registry
    /// does not know.
    #[error("Unknown store type: {0}")]
    UnknownType(String),

    #[error("Unknown accessor: {0}")]
    UnknownAccessor(String),

    #[error("Unknown container: {0}")]
    UnknownContainer(String),

    /// Input is structurally incompatible with the declared type.
    #[error("Cannot cast {value} to {target}: {reason}")]
    Cast {
        target: &'static str,
        value: String,
        reason: String,
    },

    /// Input is the right shape but outside the configured limit.
    #[error("Value {value} out of range for {target} ({min}..={max})")]
    OutOfRange {
        target: &'static str,
        value: String,
        min: i64,
        max: i64,
    },

    /// A stored container column could not be decoded into a mapping.
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Serialization error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("Record not found: {0}")]
    RecordNotFound(Uuid),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StowageError>;
