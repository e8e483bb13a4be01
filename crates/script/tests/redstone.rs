//! The shipped redstone configuration driven through the engine: the
//! built-in behaviors working together over several ticks.

use voxide_common::{FieldValue, Location, TypeId};
use voxide_engine::{LogLevel, StdoutPrinter, World};
use voxide_script::{load_str, Library, NativeHost};

const REDSTONE: &str = include_str!("../../../configs/redstone.toml");

struct Sim {
    world: World,
    host: NativeHost,
}

impl Sim {
    fn new() -> Self {
        let (registry, host) = load_str(REDSTONE, Library::standard()).expect("shipped config");
        let world = World::new(registry, 64).expect("world");
        Self { world, host }
    }

    fn type_id(&self, name: &str) -> TypeId {
        self.world.registry().find_type(name).expect("known type")
    }

    fn place(&mut self, x: i32, y: i32, z: i32, type_name: &str, fields: &[(&str, FieldValue)]) {
        let type_id = self.type_id(type_name);
        let location = Location::new(x, y, z);
        self.world.set_node(location, type_id);
        for (name, value) in fields {
            let (ordinal, _) = self
                .world
                .registry()
                .find_field(type_id, name)
                .expect("known field");
            self.world.set_field(location, ordinal, value.clone());
        }
    }

    fn tick(&mut self, count: u32) {
        let mut printer = StdoutPrinter { muted: true };
        self.world
            .run_ticks(&self.host, count, LogLevel::Quiet, &mut printer)
            .expect("tick");
    }

    fn power(&self, x: i32, y: i32, z: i32) -> Option<i32> {
        self.world
            .get_node(Location::new(x, y, z))
            .and_then(|data| data.field(0))
            .and_then(FieldValue::as_integer)
    }
}

fn east() -> FieldValue {
    FieldValue::Direction(voxide_common::Direction::East)
}

fn up() -> FieldValue {
    FieldValue::Direction(voxide_common::Direction::Up)
}

/// A switch behind a torch shuts it down; the wire it fed decays back to
/// zero once the torch stops emitting.
#[test]
fn switch_quenches_a_torch() {
    let mut sim = Sim::new();
    sim.place(0, 0, 0, "TORCH", &[("direction", east())]);
    sim.place(1, 0, 0, "WIRE", &[]);
    sim.place(
        -1,
        0,
        0,
        "SWITCH",
        &[("direction", east()), ("state", FieldValue::Integer(1))],
    );

    // Tick 0: both sources emit for tick 1.
    sim.tick(1);
    // Tick 1: the wire lights up while the switch's signal lands behind
    // the torch.
    sim.tick(1);
    assert_eq!(sim.power(1, 0, 0), Some(15));
    assert_eq!(sim.power(0, 0, 0), Some(15), "torch sees rear power");

    // Tick 2: the torch is dark, so nothing refreshes the wire.
    sim.tick(1);
    assert_eq!(sim.power(1, 0, 0), Some(0), "wire decays without a source");
}

/// A powered piston pushes the block in front of it one cell onward.
#[test]
fn piston_pushes_a_conductor() {
    let mut sim = Sim::new();
    sim.place(0, 0, 0, "PISTON", &[("direction", east())]);
    sim.place(1, 0, 0, "CONDUCTOR", &[]);
    sim.place(
        0,
        -1,
        0,
        "SWITCH",
        &[("direction", up()), ("state", FieldValue::Integer(1))],
    );

    sim.tick(3);

    let conductor = sim.type_id("CONDUCTOR");
    assert!(sim.world.get_node(Location::new(1, 0, 0)).is_none());
    assert_eq!(
        sim.world
            .get_node(Location::new(2, 0, 0))
            .map(|data| data.type_id),
        Some(conductor)
    );
}

/// Wire power drops by one per cell away from the torch.
#[test]
fn wire_runs_decay_with_distance() {
    let mut sim = Sim::new();
    sim.place(0, 0, 0, "TORCH", &[("direction", up())]);
    for x in 1..=4 {
        sim.place(x, 0, 0, "WIRE", &[]);
    }

    sim.tick(2);

    assert_eq!(sim.power(1, 0, 0), Some(15));
    assert_eq!(sim.power(2, 0, 0), Some(14));
    assert_eq!(sim.power(3, 0, 0), Some(13));
    assert_eq!(sim.power(4, 0, 0), Some(12));
}

/// Wire charge crosses a block boundary: the conductor in its path takes
/// the charge and the wire sitting on top of it carries on.
#[test]
fn wire_climbs_over_a_conductor() {
    let mut sim = Sim::new();
    sim.place(0, 0, 0, "TORCH", &[("direction", up())]);
    sim.place(1, 0, 0, "WIRE", &[]);
    sim.place(2, 0, 0, "CONDUCTOR", &[]);
    sim.place(2, 1, 0, "WIRE", &[]);

    sim.tick(2);

    assert_eq!(sim.power(1, 0, 0), Some(15));
    assert_eq!(sim.power(2, 0, 0), Some(14), "the block takes the charge");
    assert_eq!(sim.power(2, 1, 0), Some(14), "the charge climbs on top");
}

/// A covered wire cannot climb: a block resting on it keeps the charge
/// from reaching the wire on top of the conductor.
#[test]
fn covered_wire_does_not_climb() {
    let mut sim = Sim::new();
    sim.place(0, 0, 0, "TORCH", &[("direction", up())]);
    sim.place(1, 0, 0, "WIRE", &[]);
    sim.place(1, 1, 0, "CONDUCTOR", &[]);
    sim.place(2, 0, 0, "CONDUCTOR", &[]);
    sim.place(2, 1, 0, "WIRE", &[]);

    sim.tick(2);

    assert_eq!(sim.power(1, 0, 0), Some(15));
    assert_eq!(sim.power(2, 0, 0), Some(14), "the block still charges");
    assert_eq!(sim.power(2, 1, 0), Some(0), "no climb from under a cover");
}

/// Wire charge drops over a ledge: an empty horizontal neighbour routes
/// the charge one cell down to a buried wire.
#[test]
fn wire_steps_down_a_ledge() {
    let mut sim = Sim::new();
    sim.place(0, 0, 0, "TORCH", &[("direction", up())]);
    sim.place(1, 0, 0, "WIRE", &[]);
    sim.place(2, -1, 0, "WIRE", &[]);

    sim.tick(2);

    assert_eq!(sim.power(1, 0, 0), Some(15));
    assert_eq!(
        sim.power(2, -1, 0),
        Some(14),
        "the charge falls over the edge"
    );
}

/// A wire directly on top of a conductor feeds it the full, undecayed
/// charge.
#[test]
fn wire_charges_the_conductor_underneath() {
    let mut sim = Sim::new();
    sim.place(0, 0, 0, "TORCH", &[("direction", up())]);
    sim.place(1, 0, 0, "WIRE", &[]);
    sim.place(1, -1, 0, "CONDUCTOR", &[]);

    sim.tick(2);

    assert_eq!(sim.power(1, 0, 0), Some(15));
    assert_eq!(sim.power(1, -1, 0), Some(15), "full charge, no decay");
}

/// The torch's upward charge only fires into a conductor block; anything
/// else above it (air, even a wire) stays dark.
#[test]
fn torch_only_charges_a_conductor_above() {
    let mut sim = Sim::new();
    sim.place(0, 0, 0, "TORCH", &[("direction", east())]);
    sim.place(0, 1, 0, "WIRE", &[]);

    sim.tick(2);
    assert_eq!(sim.power(0, 1, 0), Some(0), "no upward charge through air");

    let mut sim = Sim::new();
    sim.place(0, 0, 0, "TORCH", &[("direction", east())]);
    sim.place(0, 1, 0, "CONDUCTOR", &[]);

    sim.tick(2);
    assert_eq!(
        sim.power(0, 1, 0),
        Some(15),
        "a block above takes the charge"
    );
}

/// A repeater regenerates a decayed signal to full strength, one tick
/// late per configured delay step.
#[test]
fn repeater_regenerates_signal() {
    let mut sim = Sim::new();
    sim.place(0, 0, 0, "TORCH", &[("direction", up())]);
    sim.place(1, 0, 0, "WIRE", &[]);
    sim.place(2, 0, 0, "REPEATER", &[("direction", east())]);
    sim.place(3, 0, 0, "WIRE", &[]);

    // Torch fires at tick 0 (for tick 1), wire relays at tick 1, the
    // repeater sees it at tick 1 and fires for tick 2, the far wire
    // lights at tick 2.
    sim.tick(3);

    assert_eq!(sim.power(1, 0, 0), Some(15));
    assert_eq!(sim.power(3, 0, 0), Some(15), "regenerated to full power");
}
