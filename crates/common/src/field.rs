//! Typed field slots carried by nodes and messages.

use std::fmt;

use crate::location::Direction;

/// The declared type of a field slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Direction,
    Text,
}

impl FieldKind {
    /// The value a freshly created node carries in a slot of this kind.
    pub fn default_value(self) -> FieldValue {
        match self {
            FieldKind::Integer => FieldValue::Integer(0),
            FieldKind::Direction => FieldValue::Direction(Direction::North),
            FieldKind::Text => FieldValue::Text(String::new()),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FieldKind::Integer => "INTEGER",
            FieldKind::Direction => "DIRECTION",
            FieldKind::Text => "STRING",
        }
    }
}

/// A field value: a tagged sum instead of the raw unions of old.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Integer(i32),
    Direction(Direction),
    Text(String),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Integer(_) => FieldKind::Integer,
            FieldValue::Direction(_) => FieldKind::Direction,
            FieldValue::Text(_) => FieldKind::Text,
        }
    }

    pub fn as_integer(&self) -> Option<i32> {
        match self {
            FieldValue::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_direction(&self) -> Option<Direction> {
        match self {
            FieldValue::Direction(dir) => Some(*dir),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    /// Wire rendering: integers bare, directions uppercase, strings quoted.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(value) => write!(f, "{value}"),
            FieldValue::Direction(dir) => write!(f, "{dir}"),
            FieldValue::Text(text) => write!(f, "\"{text}\""),
        }
    }
}
