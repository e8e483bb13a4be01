//! The behavior host seam.
//!
//! Behaviors are opaque callables living in an external host; the engine
//! refers to them by [`HostRef`](crate::registry::HostRef) and evaluates
//! them through [`BehaviorHost::run`]. The [`Context`] passed in is the
//! host's entire view of the engine: the current node, its filtered inbox,
//! adjacency, and the outbox and sets sinks.

use voxide_common::{
    Direction, DirectionError, Endpoint, FieldKind, FieldValue, Location, Messages, Movement,
    TypeId, SYSTEM_DATA, SYSTEM_FIELD, SYSTEM_MOVE, SYSTEM_REMOVE,
};

use crate::queue::{Queue, QueueItem};
use crate::registry::HostRef;
use crate::world::World;

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("no behavior bound to host ref {0}")]
    UnknownRef(usize),

    #[error("a node cannot send a message to itself")]
    SelfSend,

    #[error("node has no direction field to resolve a relative movement")]
    MissingDirectionField,

    #[error(transparent)]
    Direction(#[from] DirectionError),

    #[error("{0}")]
    Script(String),
}

/// Evaluates one behavior over `(node, inbox)`, writing into the context's
/// outbox and sets sinks.
pub trait BehaviorHost {
    fn run(&self, behavior: HostRef, ctx: &mut Context<'_>) -> Result<(), HostError>;
}

/// A lightweight handle to another node, as handed out by adjacency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Peer {
    pub location: Location,
    pub type_id: TypeId,
}

/// One behavior invocation's view of the engine.
pub struct Context<'a> {
    world: &'a mut World,
    node: Endpoint,
    inbox: &'a Messages,
    output: &'a mut Queue,
    sets: &'a mut Queue,
    tick: u64,
}

impl<'a> Context<'a> {
    pub(crate) fn new(
        world: &'a mut World,
        node: Endpoint,
        inbox: &'a Messages,
        output: &'a mut Queue,
        sets: &'a mut Queue,
        tick: u64,
    ) -> Self {
        Self {
            world,
            node,
            inbox,
            output,
            sets,
            tick,
        }
    }

    pub fn location(&self) -> Location {
        self.node.location
    }

    pub fn type_id(&self) -> TypeId {
        self.node.type_id
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// The messages this behavior subscribed to, already filtered by its
    /// kind mask.
    pub fn inbox(&self) -> &Messages {
        self.inbox
    }

    /// Current value of one of this node's fields.
    pub fn field(&self, ordinal: usize) -> Option<FieldValue> {
        self.world
            .get_node(self.node.location)
            .and_then(|data| data.field(ordinal).cloned())
    }

    /// The node's facing, read from its `direction` field.
    pub fn facing(&self) -> Result<Direction, HostError> {
        let (ordinal, kind) = self
            .world
            .registry()
            .find_field(self.node.type_id, "direction")
            .ok_or(HostError::MissingDirectionField)?;
        if kind != FieldKind::Direction {
            return Err(HostError::MissingDirectionField);
        }
        self.field(ordinal)
            .and_then(|value| value.as_direction())
            .ok_or(HostError::MissingDirectionField)
    }

    /// Resolve a registered message kind by name.
    pub fn find_kind(&self, name: &str) -> Option<u32> {
        self.world.registry().find_kind(name)
    }

    /// Whether a peer is an implicit cell of the default type.
    pub fn is_default(&self, peer: &Peer) -> bool {
        peer.type_id == self.world.registry().default_type()
    }

    /// Whether a peer is of the named type. False when the name is not
    /// registered at all.
    pub fn peer_is(&self, peer: &Peer, type_name: &str) -> bool {
        self.world.registry().find_type(type_name) == Some(peer.type_id)
    }

    /// The neighbour along `dir`, materialising a default-type cell when
    /// the slot is vacant.
    pub fn adjacent(&mut self, dir: Direction) -> Peer {
        self.world.get_adjacent(self.node.location, dir)
    }

    /// The neighbour of another node; lets a behavior look past its own
    /// six cells.
    pub fn adjacent_of(&mut self, peer: &Peer, dir: Direction) -> Peer {
        self.world.get_adjacent(peer.location, dir)
    }

    /// The neighbour along a movement resolved against this node's facing.
    pub fn adjacent_moved(&mut self, movement: Movement) -> Result<Peer, HostError> {
        let dir = movement.resolve(self.facing()?)?;
        Ok(self.adjacent(dir))
    }

    /// All six neighbours, in cardinal order.
    pub fn adjacent_all(&mut self) -> [Peer; 6] {
        Direction::ALL.map(|dir| self.adjacent(dir))
    }

    /// Emit a message to `target`, visible `delay` ticks from now.
    ///
    /// Silently dropped when the target's type listens for none of the
    /// kind's bits. Sending to self is rejected; self-mutations go through
    /// the sets sink instead.
    pub fn send(
        &mut self,
        target: &Peer,
        kind: u32,
        delay: u64,
        value: FieldValue,
    ) -> Result<(), HostError> {
        if target.location == self.node.location {
            return Err(HostError::SelfSend);
        }
        if self.world.registry().node_type(target.type_id).behavior_mask & kind == 0 {
            return Ok(());
        }
        self.output.push(QueueItem {
            kind,
            tick: self.tick + delay,
            source: self.node,
            target: Endpoint {
                location: target.location,
                type_id: target.type_id,
            },
            field: 0,
            value,
        });
        Ok(())
    }

    /// Request relocation of this node one step along `dir`.
    pub fn move_self(&mut self, dir: Direction) {
        self.push_set(SYSTEM_MOVE, 0, FieldValue::Direction(dir));
    }

    /// Request deletion of this node.
    pub fn remove_self(&mut self) {
        self.push_set(SYSTEM_REMOVE, 0, FieldValue::Integer(0));
    }

    /// Request a field update on this node.
    pub fn set_field(&mut self, ordinal: usize, value: FieldValue) {
        self.push_set(SYSTEM_FIELD, ordinal as u32, value);
    }

    /// Emit an observation on the data side channel; the state machine
    /// ignores it.
    pub fn emit_data(&mut self, text: impl Into<String>) {
        self.push_set(SYSTEM_DATA, 0, FieldValue::Text(text.into()));
    }

    fn push_set(&mut self, kind: u32, field: u32, value: FieldValue) {
        self.sets.push(QueueItem {
            kind,
            tick: self.tick,
            source: self.node,
            target: self.node,
            field,
            value,
        });
    }
}
