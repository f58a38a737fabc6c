//! # Type Casting
//!
//! Every declared field carries a [`TypeDescriptor`] naming its type plus
//! cast options (integer byte limit, float precision/scale). At declaration
//! time the descriptor is resolved — through a [`CasterRegistry`] — into a
//! [`Caster`], the stateless bidirectional converter the accessors use from
//! then on:
//!
//! - `cast(raw)` turns arbitrary JSON input into a [`TypedValue`] or fails
//!   with a cast/range error;
//! - `serialize(typed)` turns a typed value back into the JSON shape that
//!   goes into the container.
//!
//! Built-in casters cover boolean, integer, float, string, date, datetime
//! and raw JSON pass-through. Applications register additional casters by
//! name, once, at startup; lookups after that are pure.
//!
//! [`TypedValue`]: crate::value::TypedValue

mod caster;
mod descriptor;
mod registry;

pub use caster::{
    BooleanCaster, Caster, DateCaster, DateTimeCaster, FloatCaster, IntegerCaster, JsonCaster,
    StringCaster,
};
pub use descriptor::TypeDescriptor;
pub use registry::CasterRegistry;
