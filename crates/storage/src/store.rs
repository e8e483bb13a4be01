//! Node storage: the octree plus the live list, kept in lockstep.

use voxide_common::{Direction, FieldValue, Location, MessageStore, Messages, TypeId};

use crate::live::LiveList;
use crate::tree::Octree;

/// Everything the world knows about one occupied cell.
#[derive(Debug)]
pub struct NodeData {
    pub type_id: TypeId,
    pub fields: Vec<FieldValue>,
    /// Input snapshot from the last evaluation, with the tick it was seen.
    pub last_input: Option<(Messages, u64)>,
    pub store: MessageStore,
}

impl NodeData {
    fn new(type_id: TypeId, fields: Vec<FieldValue>) -> Self {
        Self {
            type_id,
            fields,
            last_input: None,
            store: MessageStore::new(),
        }
    }

    pub fn field(&self, ordinal: usize) -> Option<&FieldValue> {
        self.fields.get(ordinal)
    }
}

/// Sparse world storage.
///
/// Occupancy is the pair invariant: a cell holds `Some(NodeData)` exactly
/// when its location is on the live list.
#[derive(Debug)]
pub struct NodeStore {
    tree: Octree<NodeData>,
    live: LiveList,
}

impl NodeStore {
    pub fn new(size_hint: usize) -> Self {
        Self {
            tree: Octree::new(),
            live: LiveList::new(size_hint),
        }
    }

    /// Number of occupied nodes.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Current octree depth.
    pub fn depth(&self) -> u32 {
        self.tree.level()
    }

    pub fn get(&self, location: Location) -> Option<&NodeData> {
        self.tree.get(location)
    }

    pub fn get_mut(&mut self, location: Location) -> Option<&mut NodeData> {
        self.tree.get_mut(location)
    }

    /// Occupy `location` with a node of `type_id`.
    ///
    /// A vacant cell is prepended to the live list. An occupied cell keeps
    /// its data when the type matches and is reset to `field_defaults`
    /// when the type changes.
    pub fn set(
        &mut self,
        location: Location,
        type_id: TypeId,
        field_defaults: Vec<FieldValue>,
    ) -> &mut NodeData {
        let cell = self.tree.cell_mut(location);
        match cell {
            None => {
                *cell = Some(NodeData::new(type_id, field_defaults));
                self.live.push_front(location);
            }
            Some(data) if data.type_id != type_id => {
                *data = NodeData::new(type_id, field_defaults);
            }
            Some(_) => {}
        }

        match self.tree.get_mut(location) {
            Some(data) => data,
            None => unreachable!("cell occupied above"),
        }
    }

    /// Remove the node at `location`, if any. The tree path is retained so
    /// the cell can be reused cheaply.
    pub fn remove(&mut self, location: Location) -> bool {
        if self.tree.get(location).is_none() {
            return false;
        }
        *self.tree.cell_mut(location) = None;
        self.live.unlink(location);
        true
    }

    /// The neighbour of `location` along `dir`, materialised with the
    /// default type when vacant. Fresh cells are appended to the live list.
    pub fn ensure_adjacent(
        &mut self,
        location: Location,
        dir: Direction,
        default_type: TypeId,
    ) -> Location {
        let neighbour = location.offset(dir, 1);
        let cell = self.tree.cell_mut(neighbour);
        if cell.is_none() {
            *cell = Some(NodeData::new(default_type, Vec::new()));
            self.live.push_back(neighbour);
        }
        neighbour
    }

    pub fn contains(&self, location: Location) -> bool {
        self.live.contains(location)
    }

    /// Live-list snapshot, in scheduler order.
    pub fn live_locations(&self) -> Vec<Location> {
        self.live.locations()
    }
}
