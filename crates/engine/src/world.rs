//! The world facade: node storage, the registry and the tick loop behind
//! one handle. There are no process-wide singletons; callers own a `World`
//! and pass it around explicitly.

use voxide_common::{
    Direction, FieldValue, Location, SYSTEM_DATA, SYSTEM_FIELD, SYSTEM_MOVE, SYSTEM_REMOVE,
};
use voxide_storage::{NodeData, NodeStore};

use crate::error::EngineError;
use crate::format;
use crate::host::{BehaviorHost, Peer};
use crate::printer::Printer;
use crate::queue::QueueItem;
use crate::registry::TypeRegistry;
use crate::tick::{self, LogLevel};

/// The STATUS snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorldStats {
    pub ticks: u64,
    pub nodes: usize,
    pub tree_depth: u32,
    pub message_max_inputs: usize,
    pub message_max_outputs: usize,
    pub message_max_queued: usize,
}

pub struct World {
    store: NodeStore,
    registry: TypeRegistry,
    ticks: u64,
    size_hint: usize,
    pub(crate) max_inputs: usize,
    pub(crate) max_outputs: usize,
    pub(crate) max_queued: usize,
}

impl World {
    /// Build a world over a loaded registry. `size_hint` seeds the various
    /// location maps.
    pub fn new(registry: TypeRegistry, size_hint: usize) -> Result<Self, EngineError> {
        if registry.type_count() == 0 {
            return Err(EngineError::NoTypes);
        }
        Ok(Self {
            store: NodeStore::new(size_hint),
            registry,
            ticks: 0,
            size_hint,
            max_inputs: 0,
            max_outputs: 0,
            max_queued: 0,
        })
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub(crate) fn size_hint(&self) -> usize {
        self.size_hint
    }

    pub(crate) fn advance_tick(&mut self) {
        self.ticks += 1;
    }

    pub fn node_count(&self) -> usize {
        self.store.len()
    }

    pub fn get_node(&self, location: Location) -> Option<&NodeData> {
        self.store.get(location)
    }

    pub(crate) fn get_node_mut(&mut self, location: Location) -> Option<&mut NodeData> {
        self.store.get_mut(location)
    }

    /// Create or retype the node at `location`.
    pub fn set_node(
        &mut self,
        location: Location,
        type_id: voxide_common::TypeId,
    ) -> &mut NodeData {
        let defaults = self.registry.field_defaults(type_id);
        self.store.set(location, type_id, defaults)
    }

    pub fn remove_node(&mut self, location: Location) -> bool {
        self.store.remove(location)
    }

    /// The neighbour along `dir`, materialised with the default type when
    /// vacant. Always yields an occupied cell.
    pub fn get_adjacent(&mut self, location: Location, dir: Direction) -> Peer {
        let default_type = self.registry.default_type();
        let neighbour = self.store.ensure_adjacent(location, dir, default_type);
        let type_id = self
            .store
            .get(neighbour)
            .map(|data| data.type_id)
            .unwrap_or(default_type);
        Peer {
            location: neighbour,
            type_id,
        }
    }

    /// Assign one field by name on an existing node. `Ok(false)` reports a
    /// value-preserving no-op.
    pub fn set_field(
        &mut self,
        location: Location,
        ordinal: usize,
        value: FieldValue,
    ) -> Option<bool> {
        let data = self.store.get_mut(location)?;
        let slot = data.fields.get_mut(ordinal)?;
        if *slot == value {
            return Some(false);
        }
        *slot = value;
        Some(true)
    }

    pub fn live_locations(&self) -> Vec<Location> {
        self.store.live_locations()
    }

    pub fn stats(&self) -> WorldStats {
        WorldStats {
            ticks: self.ticks,
            nodes: self.store.len(),
            tree_depth: self.store.depth(),
            message_max_inputs: self.max_inputs,
            message_max_outputs: self.max_outputs,
            message_max_queued: self.max_queued,
        }
    }

    /// Advance the simulation `count` ticks.
    pub fn run_ticks(
        &mut self,
        host: &dyn BehaviorHost,
        count: u32,
        level: LogLevel,
        printer: &mut dyn Printer,
    ) -> Result<(), EngineError> {
        tick::run(self, host, count, level, printer)
    }

    /// Print every stored message still deliverable at or beyond the
    /// current tick.
    pub fn print_messages(&self, printer: &mut dyn Printer) {
        for location in self.store.live_locations() {
            let Some(data) = self.store.get(location) else {
                continue;
            };
            for bucket in data.store.buckets() {
                if bucket.tick < self.ticks {
                    continue;
                }
                for message in bucket.messages.iter() {
                    printer.out(format_args!(
                        "{}",
                        format::message_line(
                            &self.registry,
                            bucket.tick,
                            self.ticks,
                            message.source.location,
                            location,
                            message.kind,
                            &message.value,
                        )
                    ));
                }
            }
        }
    }

    /// Apply one structural mutation. Returns whether the world changed
    /// (or, for the data channel, whether the entry is observable); no-ops
    /// are suppressed from the log by the caller.
    pub(crate) fn apply_set(&mut self, item: &QueueItem) -> bool {
        match item.kind {
            SYSTEM_FIELD => {
                let target = item.target.location;
                match self.set_field(target, item.field as usize, item.value.clone()) {
                    Some(changed) => changed,
                    None => false,
                }
            }
            SYSTEM_MOVE => {
                let Some(dir) = item.value.as_direction() else {
                    return false;
                };
                let Some(data) = self.store.get(item.target.location) else {
                    return false;
                };
                let type_id = data.type_id;
                // Fields and stored messages stay behind: the moved node is
                // new matter.
                self.remove_node(item.target.location);
                let destination = item.target.location.offset(dir, 1);
                self.set_node(destination, type_id);
                true
            }
            SYSTEM_REMOVE => {
                self.remove_node(item.source.location);
                true
            }
            SYSTEM_DATA => true,
            kind => {
                tracing::warn!(kind, "unknown system message in sets queue");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Field, TypeRegistry};
    use voxide_common::{Endpoint, FieldKind, TypeId};

    fn world() -> World {
        let mut registry = TypeRegistry::new();
        registry.define_type("AIR", Vec::new(), &[]).expect("air");
        registry
            .define_type(
                "WIRE",
                vec![Field {
                    name: "power".into(),
                    kind: FieldKind::Integer,
                }],
                &[],
            )
            .expect("wire");
        World::new(registry, 8).expect("world")
    }

    fn set_item(kind: u32, location: Location, type_id: TypeId, value: FieldValue) -> QueueItem {
        let endpoint = Endpoint { location, type_id };
        QueueItem {
            kind,
            tick: 0,
            source: endpoint,
            target: endpoint,
            field: 0,
            value,
        }
    }

    #[test]
    fn empty_registry_is_rejected() {
        assert!(matches!(
            World::new(TypeRegistry::new(), 8),
            Err(EngineError::NoTypes)
        ));
    }

    #[test]
    fn field_set_reports_noops() {
        let mut world = world();
        let wire = world.registry().find_type("WIRE").expect("wire");
        let loc = Location::new(0, 0, 0);
        world.set_node(loc, wire);

        let item = set_item(SYSTEM_FIELD, loc, wire, FieldValue::Integer(5));
        assert!(world.apply_set(&item));
        assert!(!world.apply_set(&item), "second write is a no-op");

        // A vanished target is a no-op too.
        world.remove_node(loc);
        assert!(!world.apply_set(&item));
    }

    #[test]
    fn move_keeps_type_only() {
        let mut world = world();
        let wire = world.registry().find_type("WIRE").expect("wire");
        let loc = Location::new(0, 0, 0);
        world.set_node(loc, wire);
        world.set_field(loc, 0, FieldValue::Integer(9));

        let item = set_item(
            SYSTEM_MOVE,
            loc,
            wire,
            FieldValue::Direction(Direction::East),
        );
        assert!(world.apply_set(&item));

        assert!(world.get_node(loc).is_none());
        let moved = world.get_node(Location::new(1, 0, 0)).expect("moved");
        assert_eq!(moved.type_id, wire);
        assert_eq!(
            moved.field(0),
            Some(&FieldValue::Integer(0)),
            "fields reset on move"
        );
    }

    #[test]
    fn remove_and_data_dispatch() {
        let mut world = world();
        let wire = world.registry().find_type("WIRE").expect("wire");
        let loc = Location::new(0, 0, 0);
        world.set_node(loc, wire);

        let data = set_item(SYSTEM_DATA, loc, wire, FieldValue::Text("hello".into()));
        assert!(world.apply_set(&data));
        assert!(world.get_node(loc).is_some(), "data is state-neutral");

        let remove = set_item(SYSTEM_REMOVE, loc, wire, FieldValue::Integer(0));
        assert!(world.apply_set(&remove));
        assert!(world.get_node(loc).is_none());
    }

    #[test]
    fn stats_track_nodes_and_depth() {
        let mut world = world();
        let wire = world.registry().find_type("WIRE").expect("wire");
        world.set_node(Location::new(0, 0, 0), wire);
        world.set_node(Location::new(500, 0, 0), wire);

        let stats = world.stats();
        assert_eq!(stats.ticks, 0);
        assert_eq!(stats.nodes, 2);
        assert!(stats.tree_depth >= 7);
    }
}
