//! Shared core types for the voxide simulator: coordinates, directions,
//! field values and messages. Everything here is plain data; the storage
//! and engine crates build on top.

mod field;
mod location;
mod message;

pub use field::{FieldKind, FieldValue};
pub use location::{
    Coord, Direction, DirectionError, Location, Movement, Range, Region, LOCATION_HASH_PRIME,
};
pub use message::{
    Endpoint, Message, MessageStore, Messages, TickBucket, TypeId, SYSTEM_DATA, SYSTEM_FIELD,
    SYSTEM_KIND_COUNT, SYSTEM_MOVE, SYSTEM_REMOVE,
};
