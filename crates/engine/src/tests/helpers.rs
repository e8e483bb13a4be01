//! Shared fixtures for engine scenario tests: a function-table host and a
//! small registry in the shape real configurations take.

use voxide_common::{FieldKind, FieldValue, Location, Movement, TypeId};

use crate::host::{BehaviorHost, Context, HostError};
use crate::registry::{Field, HostRef, TypeRegistry};
use crate::world::World;

/// First user kind bit after the four system kinds.
pub const POWER: u32 = 1 << 4;

pub type BehaviorFn = fn(&mut Context<'_>) -> Result<(), HostError>;

/// A host whose behaviors are plain function pointers; `HostRef` indexes
/// the table.
pub struct TestHost {
    funcs: Vec<BehaviorFn>,
}

impl TestHost {
    pub fn new(funcs: Vec<BehaviorFn>) -> Self {
        Self { funcs }
    }
}

impl BehaviorHost for TestHost {
    fn run(&self, behavior: HostRef, ctx: &mut Context<'_>) -> Result<(), HostError> {
        match self.funcs.get(behavior.0) {
            Some(func) => func(ctx),
            None => Err(HostError::UnknownRef(behavior.0)),
        }
    }
}

pub struct Fixture {
    pub world: World,
    pub host: TestHost,
}

/// Build a world whose registry binds the given `(name, mask, function)`
/// triples as behaviors and the given `(type, fields, behaviors)` rows as
/// types. The first type row is the default.
pub fn fixture(
    behaviors: Vec<(&str, u32, BehaviorFn)>,
    types: Vec<(&str, Vec<(&str, FieldKind)>, Vec<&str>)>,
) -> Fixture {
    let mut registry = TypeRegistry::new();
    registry.define_kind("POWER").expect("kind space");

    let mut funcs = Vec::new();
    for (name, mask, func) in behaviors {
        registry.define_behavior(name, mask, HostRef(funcs.len()));
        funcs.push(func);
    }

    for (name, fields, behavior_names) in types {
        let fields = fields
            .into_iter()
            .map(|(field_name, kind)| Field {
                name: field_name.to_string(),
                kind,
            })
            .collect();
        let behavior_names: Vec<String> =
            behavior_names.into_iter().map(str::to_string).collect();
        registry
            .define_type(name, fields, &behavior_names)
            .expect("type definition");
    }

    Fixture {
        world: World::new(registry, 64).expect("world"),
        host: TestHost::new(funcs),
    }
}

pub fn type_id(world: &World, name: &str) -> TypeId {
    world.registry().find_type(name).expect("known type")
}

/// Field 0 of the node at `location`, when it holds an integer.
pub fn power_field(world: &World, location: Location) -> Option<i32> {
    world
        .get_node(location)
        .and_then(|data| data.field(0))
        .and_then(FieldValue::as_integer)
}

impl Fixture {
    pub fn set(&mut self, x: i32, y: i32, z: i32, type_name: &str) {
        let id = type_id(&self.world, type_name);
        self.world.set_node(Location::new(x, y, z), id);
    }
}

/// Behavior bodies used across scenarios. All are free functions so they
/// coerce to `BehaviorFn`.
pub mod behaviors {
    use super::*;
    use voxide_common::Direction;

    /// Listens without reacting; a pure message sink.
    pub fn soak(_ctx: &mut Context<'_>) -> Result<(), HostError> {
        Ok(())
    }

    /// Emits POWER 15 at every neighbour once, on tick 0, with delay 1.
    pub fn pulse(ctx: &mut Context<'_>) -> Result<(), HostError> {
        if ctx.tick() != 0 {
            return Ok(());
        }
        for peer in ctx.adjacent_all() {
            ctx.send(&peer, POWER, 1, FieldValue::Integer(15))?;
        }
        Ok(())
    }

    /// Stores the strongest incoming power in field 0 and relays one less
    /// southward in the same tick.
    pub fn relay(ctx: &mut Context<'_>) -> Result<(), HostError> {
        let power = ctx
            .inbox()
            .max_value()
            .and_then(|message| message.value.as_integer())
            .unwrap_or(0);
        ctx.set_field(0, FieldValue::Integer(power));
        if power > 1 {
            let south = ctx.adjacent(Direction::South);
            ctx.send(&south, POWER, 0, FieldValue::Integer(power - 1))?;
        }
        Ok(())
    }

    /// Sends POWER 15 southward with delay 0 on tick 0 only.
    pub fn spark(ctx: &mut Context<'_>) -> Result<(), HostError> {
        if ctx.tick() != 0 {
            return Ok(());
        }
        let south = ctx.adjacent(Direction::South);
        ctx.send(&south, POWER, 0, FieldValue::Integer(15))?;
        Ok(())
    }

    /// Sends POWER 15 southward with delay 2 on tick 0 only.
    pub fn delayed_spark(ctx: &mut Context<'_>) -> Result<(), HostError> {
        if ctx.tick() != 0 {
            return Ok(());
        }
        let south = ctx.adjacent(Direction::South);
        ctx.send(&south, POWER, 2, FieldValue::Integer(15))?;
        Ok(())
    }

    /// Requests a northward move on tick 0.
    pub fn launch(ctx: &mut Context<'_>) -> Result<(), HostError> {
        if ctx.tick() == 0 {
            ctx.move_self(Direction::North);
        }
        Ok(())
    }

    /// Escalates forever: sends max-input-plus-one north and south at
    /// delay 0, so two of these facing each other never settle.
    pub fn escalate(ctx: &mut Context<'_>) -> Result<(), HostError> {
        let next = ctx
            .inbox()
            .max_value()
            .and_then(|message| message.value.as_integer())
            .unwrap_or(0)
            + 1;
        for dir in [Direction::North, Direction::South] {
            let peer = ctx.adjacent(dir);
            ctx.send(&peer, POWER, 0, FieldValue::Integer(next))?;
        }
        Ok(())
    }

    /// Fails once the tick counter reaches 2.
    pub fn fragile(ctx: &mut Context<'_>) -> Result<(), HostError> {
        if ctx.tick() >= 2 {
            return Err(HostError::Script("wore out".to_string()));
        }
        Ok(())
    }

    /// Resolves its forward neighbour through the direction field.
    pub fn probe_forward(ctx: &mut Context<'_>) -> Result<(), HostError> {
        if ctx.tick() != 0 {
            return Ok(());
        }
        let ahead = ctx.adjacent_moved(Movement::Forwards)?;
        ctx.send(&ahead, POWER, 1, FieldValue::Integer(1))?;
        Ok(())
    }
}
