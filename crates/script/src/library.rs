//! Built-in behaviors, written against the engine's host surface.
//!
//! These are the redstone-flavoured primitives the simulator ships with.
//! Node state lives in fields (field 0 is power by convention, field 1 the
//! facing, field 2 a mode or delay); messages carry influence between
//! nodes, and structural changes go through the sets sink. Configurations
//! reference the functions here by name. Terrain-aware routing (wire
//! climbing, the torch's upward charge) identifies neighbours through the
//! `WIRE` and `CONDUCTOR` type names; a configuration that renames them
//! opts out of those paths and keeps the flat propagation.

use voxide_common::{Direction, FieldValue, Location, Messages, SYSTEM_MOVE};
use voxide_engine::{BehaviorHost, Context, HostError, HostRef};

/// Power fades from this value down to zero as it travels.
pub const MAX_POWER: i32 = 15;

const POWER_FIELD: usize = 0;
const MODE_FIELD: usize = 2;

pub type BehaviorFn = fn(&mut Context<'_>) -> Result<(), HostError>;

/// The function table configurations can draw behaviors from.
#[derive(Debug)]
pub struct Library {
    entries: Vec<(&'static str, BehaviorFn)>,
}

impl Library {
    /// Every built-in behavior.
    pub fn standard() -> Self {
        Self {
            entries: vec![
                ("wire", wire as BehaviorFn),
                ("conductor", conductor),
                ("torch", torch),
                ("repeater", repeater),
                ("comparator", comparator),
                ("switch", switch),
                ("piston", piston),
                ("echo", echo),
            ],
        }
    }

    pub fn find(&self, name: &str) -> Option<HostRef> {
        self.entries
            .iter()
            .position(|(entry, _)| entry.eq_ignore_ascii_case(name))
            .map(HostRef)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(name, _)| *name)
    }

    fn func(&self, host_ref: HostRef) -> Option<BehaviorFn> {
        self.entries.get(host_ref.0).map(|(_, func)| *func)
    }
}

/// Host over the built-in library; `HostRef` indexes the function table.
#[derive(Debug)]
pub struct NativeHost {
    library: Library,
}

impl NativeHost {
    pub fn new(library: Library) -> Self {
        Self { library }
    }
}

impl BehaviorHost for NativeHost {
    fn run(&self, behavior: HostRef, ctx: &mut Context<'_>) -> Result<(), HostError> {
        match self.library.func(behavior) {
            Some(func) => func(ctx),
            None => Err(HostError::UnknownRef(behavior.0)),
        }
    }
}

fn power_kind(ctx: &Context<'_>) -> Result<u32, HostError> {
    ctx.find_kind("POWER")
        .ok_or_else(|| HostError::Script("no POWER message kind registered".to_string()))
}

fn input_power(inbox: &Messages) -> i32 {
    inbox
        .max_value()
        .and_then(|message| message.value.as_integer())
        .unwrap_or(0)
}

fn move_request(inbox: &Messages) -> Option<Direction> {
    inbox
        .find_kind(SYSTEM_MOVE)
        .and_then(|message| message.value.as_direction())
}

/// Re-send toward `source` only when its own report carries less power;
/// the loop breaker for wire meshes.
fn power_check(inbox: &Messages, source: Location, power: i32) -> bool {
    match inbox
        .from_source(source)
        .and_then(|message| message.value.as_integer())
    {
        Some(reported) => reported < power,
        None => true,
    }
}

/// Wire: soaks up the strongest signal and spreads it, one weaker, along
/// the horizontals. The charge follows the terrain: where a horizontal
/// neighbour is empty it drops one cell to reach a buried wire, and where
/// it is a conductor block the block is charged (unless a side wire
/// already feeds it) and the charge climbs to a wire on top, except when
/// this wire is covered by a block of its own. A conductor directly
/// underneath takes the full, undecayed charge. Crushed by a move.
fn wire(ctx: &mut Context<'_>) -> Result<(), HostError> {
    if move_request(ctx.inbox()).is_some() {
        ctx.remove_self();
        return Ok(());
    }

    let kind = power_kind(ctx)?;
    let power = input_power(ctx.inbox());
    ctx.set_field(POWER_FIELD, FieldValue::Integer(power));
    if power == 0 {
        return Ok(());
    }

    let above = ctx.adjacent(Direction::Up);
    let covered = !ctx.is_default(&above);

    let spread = power - 1;
    if spread > 0 {
        for dir in Direction::HORIZONTAL {
            let mut found = ctx.adjacent(dir);

            if ctx.is_default(&found) {
                // Over the edge: a wire one cell down picks up the charge.
                found = ctx.adjacent_of(&found, Direction::Down);
                if !ctx.peer_is(&found, "WIRE") {
                    continue;
                }
            } else if ctx.peer_is(&found, "CONDUCTOR") {
                // Charge the block itself, unless a wire to either side
                // already feeds it.
                let left = ctx.adjacent(dir.left()?);
                let right = ctx.adjacent(dir.right()?);
                if !ctx.peer_is(&left, "WIRE")
                    && !ctx.peer_is(&right, "WIRE")
                    && power_check(ctx.inbox(), found.location, spread)
                {
                    ctx.send(&found, kind, 0, FieldValue::Integer(spread))?;
                }

                if covered {
                    continue;
                }

                // Climb the block: a wire sitting on top carries on.
                found = ctx.adjacent_of(&found, Direction::Up);
                if !ctx.peer_is(&found, "WIRE") {
                    continue;
                }
            }

            if power_check(ctx.inbox(), found.location, spread) {
                ctx.send(&found, kind, 0, FieldValue::Integer(spread))?;
            }
        }
    }

    // A conductor directly underneath takes the full charge.
    let below = ctx.adjacent(Direction::Down);
    if ctx.peer_is(&below, "CONDUCTOR") && power_check(ctx.inbox(), below.location, power) {
        ctx.send(&below, kind, 0, FieldValue::Integer(power))?;
    }

    Ok(())
}

/// Conductor: a solid block that passes full-strength charge on to every
/// neighbour. Moves along when pushed.
fn conductor(ctx: &mut Context<'_>) -> Result<(), HostError> {
    if let Some(dir) = move_request(ctx.inbox()) {
        ctx.move_self(dir);
        return Ok(());
    }

    let kind = power_kind(ctx)?;
    let power = input_power(ctx.inbox());
    ctx.set_field(POWER_FIELD, FieldValue::Integer(power));
    if power < MAX_POWER {
        return Ok(());
    }

    for dir in Direction::ALL {
        let peer = ctx.adjacent(dir);
        if power_check(ctx.inbox(), peer.location, power) {
            ctx.send(&peer, kind, 0, FieldValue::Integer(power))?;
        }
    }

    Ok(())
}

/// Torch: emits at full strength unless powered from behind. Inverts with
/// a one-tick lag. The sideways and downward spill is unconditional;
/// upward it only charges into a conductor block, never plain air.
fn torch(ctx: &mut Context<'_>) -> Result<(), HostError> {
    if move_request(ctx.inbox()).is_some() {
        ctx.remove_self();
        return Ok(());
    }

    let kind = power_kind(ctx)?;
    let facing = ctx.facing()?;
    let behind = ctx.location().offset(facing.invert(), 1);
    let power = ctx
        .inbox()
        .from_source(behind)
        .and_then(|message| message.value.as_integer())
        .unwrap_or(0);
    ctx.set_field(POWER_FIELD, FieldValue::Integer(power));
    if power > 0 {
        return Ok(());
    }

    const SPILL: [Direction; 5] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
        Direction::Down,
    ];
    for dir in SPILL {
        if dir == facing.invert() {
            continue;
        }
        let peer = ctx.adjacent(dir);
        ctx.send(&peer, kind, 1, FieldValue::Integer(MAX_POWER))?;
    }

    let above = ctx.adjacent(Direction::Up);
    if ctx.peer_is(&above, "CONDUCTOR") {
        ctx.send(&above, kind, 1, FieldValue::Integer(MAX_POWER))?;
    }

    Ok(())
}

/// Repeater: regenerates the signal from behind after a configurable
/// delay; a powered repeater to the side locks it.
fn repeater(ctx: &mut Context<'_>) -> Result<(), HostError> {
    if move_request(ctx.inbox()).is_some() {
        ctx.remove_self();
        return Ok(());
    }

    let kind = power_kind(ctx)?;
    let facing = ctx.facing()?;
    let here = ctx.location();
    let behind = here.offset(facing.invert(), 1);
    let left = here.offset(facing.left()?, 1);
    let right = here.offset(facing.right()?, 1);

    let mut side_powered = false;
    let mut power = 0;
    for message in ctx.inbox().iter() {
        let value = message.value.as_integer().unwrap_or(0);
        let from = message.source.location;
        if (from == left || from == right) && value > 0 {
            side_powered = true;
        }
        if from == behind {
            power = value;
        }
    }

    ctx.set_field(POWER_FIELD, FieldValue::Integer(power));
    if power == 0 || side_powered {
        return Ok(());
    }

    let delay = ctx
        .field(MODE_FIELD)
        .and_then(|value| value.as_integer())
        .unwrap_or(0)
        .max(0) as u64;
    let ahead = ctx.adjacent(facing);
    ctx.send(&ahead, kind, delay + 1, FieldValue::Integer(MAX_POWER))?;

    Ok(())
}

/// Comparator: compares the rear signal with the strongest side signal;
/// in subtraction mode the side is deducted instead.
fn comparator(ctx: &mut Context<'_>) -> Result<(), HostError> {
    if move_request(ctx.inbox()).is_some() {
        ctx.remove_self();
        return Ok(());
    }

    let kind = power_kind(ctx)?;
    let facing = ctx.facing()?;
    let here = ctx.location();
    let behind = here.offset(facing.invert(), 1);
    let left = here.offset(facing.left()?, 1);
    let right = here.offset(facing.right()?, 1);

    let mut side_power = 0;
    let mut power = 0;
    for message in ctx.inbox().iter() {
        let value = message.value.as_integer().unwrap_or(0);
        let from = message.source.location;
        if (from == left || from == right) && value > side_power {
            side_power = value;
        }
        if from == behind {
            power = value;
        }
    }

    ctx.set_field(POWER_FIELD, FieldValue::Integer(power));
    if power == 0 {
        return Ok(());
    }

    let subtracting = ctx
        .field(MODE_FIELD)
        .and_then(|value| value.as_integer())
        .unwrap_or(0)
        > 0;
    let change = if subtracting { power - side_power } else { power };
    let output = if power > side_power { change } else { 0 };
    if output <= 0 {
        return Ok(());
    }

    let ahead = ctx.adjacent(facing);
    ctx.send(&ahead, kind, 1, FieldValue::Integer(output))?;

    Ok(())
}

/// Switch: a manual source; powers its neighbours while its mode field is
/// nonzero.
fn switch(ctx: &mut Context<'_>) -> Result<(), HostError> {
    if move_request(ctx.inbox()).is_some() {
        ctx.remove_self();
        return Ok(());
    }

    let armed = ctx
        .field(MODE_FIELD)
        .and_then(|value| value.as_integer())
        .unwrap_or(0)
        != 0;
    if !armed {
        return Ok(());
    }

    let kind = power_kind(ctx)?;
    let behind = ctx.facing()?.invert();
    for dir in Direction::ALL {
        if dir == behind {
            continue;
        }
        let peer = ctx.adjacent(dir);
        ctx.send(&peer, kind, 1, FieldValue::Integer(MAX_POWER))?;
    }

    Ok(())
}

const RETRACTED: u8 = 0;
const RETRACTING: u8 = 1;
const EXTENDED: u8 = 2;
const EXTENDING: u8 = 3;

/// Piston: powered, it pushes the cell in front one step onward; with the
/// power gone it pulls the far cell back.
fn piston(ctx: &mut Context<'_>) -> Result<(), HostError> {
    let facing = ctx.facing()?;
    let first = ctx.adjacent(facing);
    let second = ctx.adjacent_of(&first, facing);

    let power = input_power(ctx.inbox());
    let state = if power == 0 {
        if ctx.is_default(&first) {
            RETRACTING
        } else {
            RETRACTED
        }
    } else if ctx.is_default(&second) {
        EXTENDING
    } else {
        EXTENDED
    };

    if let Some(dir) = move_request(ctx.inbox()) {
        if state == RETRACTED {
            ctx.move_self(dir);
        }
        return Ok(());
    }

    ctx.set_field(POWER_FIELD, FieldValue::Integer(power));

    if state == EXTENDING {
        ctx.send(
            &first,
            SYSTEM_MOVE,
            1,
            FieldValue::Direction(facing),
        )?;
    } else if state == RETRACTING {
        ctx.send(
            &second,
            SYSTEM_MOVE,
            1,
            FieldValue::Direction(facing.invert()),
        )?;
    }

    Ok(())
}

/// Echo: mirrors every incoming message onto the data side channel.
fn echo(ctx: &mut Context<'_>) -> Result<(), HostError> {
    let lines: Vec<String> = ctx
        .inbox()
        .iter()
        .map(|message| format!("{} {}", message.source.location, message.value))
        .collect();
    for line in lines {
        ctx.emit_data(line);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn library_resolves_names_case_insensitively() {
        let library = Library::standard();
        assert!(library.find("wire").is_some());
        assert!(library.find("WIRE").is_some());
        assert!(library.find("Torch").is_some());
        assert!(library.find("warp_drive").is_none());
    }

    #[test]
    fn host_rejects_unknown_refs() {
        let library = Library::standard();
        let count = library.names().count();
        assert!(library.func(HostRef(count)).is_none());
    }

    #[test]
    fn power_check_blocks_echoes() {
        let inbox = Messages::new();
        assert!(power_check(&inbox, Location::new(0, 0, 0), 5));
    }
}
