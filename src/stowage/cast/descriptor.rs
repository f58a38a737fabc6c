/// The declared type of a store field: a type identity plus cast options.
///
/// Descriptors are data, not behavior — they are resolved into a
/// [`Caster`](super::Caster) when the layout is built, and an unknown
/// `Custom` name fails right there rather than at first access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDescriptor {
    Boolean,

    /// `limit` is the storage width in bytes; input outside the signed
    /// range of that width is rejected. `None` means the full i64 range.
    Integer { limit: Option<u32> },

    /// `scale` rounds to that many decimal places; absent that,
    /// `precision` rounds to that many significant digits.
    Float {
        precision: Option<u32>,
        scale: Option<u32>,
    },

    String,

    /// Calendar date, `YYYY-MM-DD` in storage.
    Date,

    /// Timezone-normalizing: any parseable instant is stored as UTC.
    DateTime,

    /// Arbitrary JSON-compatible value, passed through uncast.
    Json,

    /// A caster registered by name on the [`CasterRegistry`](super::CasterRegistry).
    Custom(String),
}

impl TypeDescriptor {
    pub fn integer() -> Self {
        TypeDescriptor::Integer { limit: None }
    }

    pub fn integer_with_limit(limit: u32) -> Self {
        TypeDescriptor::Integer { limit: Some(limit) }
    }

    pub fn float() -> Self {
        TypeDescriptor::Float {
            precision: None,
            scale: None,
        }
    }

    pub fn float_with_scale(scale: u32) -> Self {
        TypeDescriptor::Float {
            precision: None,
            scale: Some(scale),
        }
    }

    pub fn float_with_precision(precision: u32) -> Self {
        TypeDescriptor::Float {
            precision: Some(precision),
            scale: None,
        }
    }

    pub fn custom(name: impl Into<String>) -> Self {
        TypeDescriptor::Custom(name.into())
    }

    pub fn name(&self) -> &str {
        match self {
            TypeDescriptor::Boolean => "boolean",
            TypeDescriptor::Integer { .. } => "integer",
            TypeDescriptor::Float { .. } => "float",
            TypeDescriptor::String => "string",
            TypeDescriptor::Date => "date",
            TypeDescriptor::DateTime => "datetime",
            TypeDescriptor::Json => "json",
            TypeDescriptor::Custom(name) => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shorthand_constructors() {
        assert_eq!(
            TypeDescriptor::integer_with_limit(1),
            TypeDescriptor::Integer { limit: Some(1) }
        );
        assert_eq!(
            TypeDescriptor::float_with_scale(2),
            TypeDescriptor::Float {
                precision: None,
                scale: Some(2)
            }
        );
    }

    #[test]
    fn custom_name_is_reported() {
        assert_eq!(TypeDescriptor::custom("money").name(), "money");
        assert_eq!(TypeDescriptor::Boolean.name(), "boolean");
    }
}
