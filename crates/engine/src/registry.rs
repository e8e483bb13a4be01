//! The type registry: message kinds, behaviors and node types.
//!
//! Everything here is append-only and defined once at configuration load.
//! The registries are small, so finds are case-insensitive linear scans.

use voxide_common::{FieldKind, TypeId, SYSTEM_KIND_COUNT};

use crate::error::EngineError;

const KIND_BITS: u32 = 32;

/// A named bit in the message kind word.
#[derive(Debug, Clone)]
pub struct MessageKind {
    pub name: String,
    pub id: u32,
}

/// Opaque reference into the behavior host's function table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostRef(pub usize);

/// A named callable with the mask of message kinds it consumes.
#[derive(Debug, Clone)]
pub struct Behavior {
    pub name: String,
    pub mask: u32,
    pub host_ref: HostRef,
}

/// A field slot declared by a type.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
}

/// A node class: ordered fields, ordered behaviors, and the union of the
/// behaviors' kind masks.
#[derive(Debug, Clone)]
pub struct NodeType {
    pub name: String,
    pub fields: Vec<Field>,
    pub behaviors: Vec<usize>,
    pub behavior_mask: u32,
}

#[derive(Debug)]
pub struct TypeRegistry {
    kinds: Vec<MessageKind>,
    behaviors: Vec<Behavior>,
    types: Vec<NodeType>,
}

impl TypeRegistry {
    /// A registry with the four system kinds pre-registered.
    pub fn new() -> Self {
        let mut registry = Self {
            kinds: Vec::new(),
            behaviors: Vec::new(),
            types: Vec::new(),
        };
        for name in ["SYSTEM_MOVE", "SYSTEM_FIELD", "SYSTEM_REMOVE", "SYSTEM_DATA"] {
            // Cannot exhaust the kind space with four entries.
            let _ = registry.define_kind(name);
        }
        debug_assert_eq!(registry.kinds.len() as u32, SYSTEM_KIND_COUNT);
        registry
    }

    /// Register a message kind; its id is the next free bit.
    pub fn define_kind(&mut self, name: &str) -> Result<u32, EngineError> {
        if self.kinds.len() as u32 >= KIND_BITS {
            return Err(EngineError::KindSpaceExhausted);
        }
        let id = 1 << self.kinds.len();
        self.kinds.push(MessageKind {
            name: name.to_string(),
            id,
        });
        Ok(id)
    }

    pub fn define_behavior(&mut self, name: &str, mask: u32, host_ref: HostRef) {
        self.behaviors.push(Behavior {
            name: name.to_string(),
            mask,
            host_ref,
        });
    }

    /// Register a node type. The first type becomes the default and must
    /// declare no fields and no behaviors.
    pub fn define_type(
        &mut self,
        name: &str,
        fields: Vec<Field>,
        behavior_names: &[String],
    ) -> Result<TypeId, EngineError> {
        let mut behaviors = Vec::with_capacity(behavior_names.len());
        let mut behavior_mask = 0;
        for behavior_name in behavior_names {
            let index = self
                .behaviors
                .iter()
                .position(|behavior| behavior.name.eq_ignore_ascii_case(behavior_name))
                .ok_or_else(|| EngineError::UnknownBehavior(behavior_name.clone()))?;
            behavior_mask |= self.behaviors[index].mask;
            behaviors.push(index);
        }

        if self.types.is_empty() && (!fields.is_empty() || !behaviors.is_empty()) {
            return Err(EngineError::DefaultTypeNotEmpty);
        }

        self.types.push(NodeType {
            name: name.to_string(),
            fields,
            behaviors,
            behavior_mask,
        });
        Ok(TypeId(self.types.len() as u32 - 1))
    }

    /// The implicit cell type; the first type registered.
    pub fn default_type(&self) -> TypeId {
        TypeId(0)
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    pub fn node_type(&self, id: TypeId) -> &NodeType {
        &self.types[id.0 as usize]
    }

    pub fn behavior(&self, index: usize) -> &Behavior {
        &self.behaviors[index]
    }

    pub fn types(&self) -> impl Iterator<Item = &NodeType> {
        self.types.iter()
    }

    pub fn find_type(&self, name: &str) -> Option<TypeId> {
        self.types
            .iter()
            .position(|node_type| node_type.name.eq_ignore_ascii_case(name))
            .map(|index| TypeId(index as u32))
    }

    pub fn find_behavior(&self, name: &str) -> Option<&Behavior> {
        self.behaviors
            .iter()
            .find(|behavior| behavior.name.eq_ignore_ascii_case(name))
    }

    pub fn find_kind(&self, name: &str) -> Option<u32> {
        self.kinds
            .iter()
            .find(|kind| kind.name.eq_ignore_ascii_case(name))
            .map(|kind| kind.id)
    }

    pub fn kind_name(&self, id: u32) -> Option<&str> {
        self.kinds
            .iter()
            .find(|kind| kind.id == id)
            .map(|kind| kind.name.as_str())
    }

    /// Look a field up by name on a type: ordinal and declared kind.
    pub fn find_field(&self, type_id: TypeId, name: &str) -> Option<(usize, FieldKind)> {
        self.node_type(type_id)
            .fields
            .iter()
            .position(|field| field.name.eq_ignore_ascii_case(name))
            .map(|ordinal| (ordinal, self.node_type(type_id).fields[ordinal].kind))
    }

    /// Default field values for a type, in declaration order.
    pub fn field_defaults(&self, type_id: TypeId) -> Vec<voxide_common::FieldValue> {
        self.node_type(type_id)
            .fields
            .iter()
            .map(|field| field.kind.default_value())
            .collect()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
