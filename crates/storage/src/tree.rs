//! The sparse octree backing the world.
//!
//! The root covers eight sign octants; each level halves the cube until a
//! leaf of side `LEAF_WIDTH` holds the cells. Accessing a location outside
//! the current cube deepens the tree in place: every existing child is
//! wrapped as the mirror corner of a fresh block of eight siblings, so
//! stored data never moves.

use voxide_common::Location;

/// Side length of a leaf cube.
pub const LEAF_WIDTH: i32 = 4;

const LEAF_CELLS: usize = (LEAF_WIDTH * LEAF_WIDTH * LEAF_WIDTH) as usize;
const OCTANTS: usize = 8;

#[derive(Debug)]
struct Leaf<T> {
    cells: [Option<T>; LEAF_CELLS],
}

impl<T> Leaf<T> {
    fn new() -> Self {
        Self {
            cells: std::array::from_fn(|_| None),
        }
    }
}

#[derive(Debug)]
enum Kids<T> {
    Branches([Option<Box<Octree<T>>>; OCTANTS]),
    Leaves([Option<Box<Leaf<T>>>; OCTANTS]),
}

#[derive(Debug)]
pub struct Octree<T> {
    level: u32,
    kids: Kids<T>,
}

/// Which of the eight children a location falls into, by coordinate signs.
fn octant(location: Location) -> usize {
    (location.x < 0) as usize + ((location.y < 0) as usize) * 2 + ((location.z < 0) as usize) * 4
}

/// Fold a location one level down, toward the child octant's origin.
fn descend(location: Location, level: u32) -> Location {
    let shift = LEAF_WIDTH * (1 << (level - 1));
    let fold = |coord: i32| if coord >= 0 { coord - shift } else { coord + shift };
    Location::new(fold(location.x), fold(location.y), fold(location.z))
}

/// Index within a leaf: mirror negatives onto the positives, then pack.
fn cell_index(location: Location) -> usize {
    let mirror = |coord: i32| if coord >= 0 { coord } else { -(coord + 1) };
    let x = mirror(location.x);
    let y = mirror(location.y);
    let z = mirror(location.z);
    debug_assert!(x < LEAF_WIDTH && y < LEAF_WIDTH && z < LEAF_WIDTH);
    (x * LEAF_WIDTH * LEAF_WIDTH + y * LEAF_WIDTH + z) as usize
}

impl<T> Octree<T> {
    pub fn new() -> Self {
        Self::with_level(0)
    }

    fn with_level(level: u32) -> Self {
        Self {
            level,
            kids: if level == 0 {
                Kids::Leaves(std::array::from_fn(|_| None))
            } else {
                Kids::Branches(std::array::from_fn(|_| None))
            },
        }
    }

    /// Current depth. A location fits when
    /// `max(|x|,|y|,|z|) < LEAF_WIDTH << level`.
    pub fn level(&self) -> u32 {
        self.level
    }

    fn required_level(location: Location) -> u32 {
        let max = location
            .x
            .unsigned_abs()
            .max(location.y.unsigned_abs())
            .max(location.z.unsigned_abs());
        let blocks = max / LEAF_WIDTH as u32;
        32 - blocks.leading_zeros()
    }

    /// Deepen until `location` fits inside the cube.
    pub fn ensure_depth(&mut self, location: Location) {
        let needed = Self::required_level(location);
        while self.level < needed {
            let old = std::mem::replace(
                &mut self.kids,
                Kids::Branches(std::array::from_fn(|_| None)),
            );
            let mut wrapped: [Option<Box<Octree<T>>>; OCTANTS] = std::array::from_fn(|_| None);

            match old {
                Kids::Leaves(leaves) => {
                    for (i, leaf) in leaves.into_iter().enumerate() {
                        let mut child = Octree::with_level(0);
                        if let Kids::Leaves(slots) = &mut child.kids {
                            slots[OCTANTS - 1 - i] = leaf;
                        }
                        wrapped[i] = Some(Box::new(child));
                    }
                }
                Kids::Branches(branches) => {
                    for (i, branch) in branches.into_iter().enumerate() {
                        let mut child = Octree::with_level(self.level);
                        if let Kids::Branches(slots) = &mut child.kids {
                            slots[OCTANTS - 1 - i] = branch;
                        }
                        wrapped[i] = Some(Box::new(child));
                    }
                }
            }

            self.kids = Kids::Branches(wrapped);
            self.level += 1;
        }
    }

    pub fn get(&self, location: Location) -> Option<&T> {
        if Self::required_level(location) > self.level {
            return None;
        }
        self.lookup(location)
    }

    fn lookup(&self, location: Location) -> Option<&T> {
        match &self.kids {
            Kids::Branches(children) => {
                let child = children[octant(location)].as_deref()?;
                child.lookup(descend(location, self.level))
            }
            Kids::Leaves(leaves) => {
                let leaf = leaves[octant(location)].as_deref()?;
                leaf.cells[cell_index(location)].as_ref()
            }
        }
    }

    pub fn get_mut(&mut self, location: Location) -> Option<&mut T> {
        if Self::required_level(location) > self.level {
            return None;
        }
        self.lookup_mut(location)
    }

    fn lookup_mut(&mut self, location: Location) -> Option<&mut T> {
        let level = self.level;
        match &mut self.kids {
            Kids::Branches(children) => {
                let child = children[octant(location)].as_deref_mut()?;
                child.lookup_mut(descend(location, level))
            }
            Kids::Leaves(leaves) => {
                let leaf = leaves[octant(location)].as_deref_mut()?;
                leaf.cells[cell_index(location)].as_mut()
            }
        }
    }

    /// The cell slot for `location`, deepening and allocating the path.
    pub fn cell_mut(&mut self, location: Location) -> &mut Option<T> {
        self.ensure_depth(location);
        self.cell_mut_inner(location)
    }

    fn cell_mut_inner(&mut self, location: Location) -> &mut Option<T> {
        let level = self.level;
        match &mut self.kids {
            Kids::Branches(children) => {
                let child = children[octant(location)]
                    .get_or_insert_with(|| Box::new(Octree::with_level(level - 1)));
                child.cell_mut_inner(descend(location, level))
            }
            Kids::Leaves(leaves) => {
                let leaf = leaves[octant(location)].get_or_insert_with(|| Box::new(Leaf::new()));
                &mut leaf.cells[cell_index(location)]
            }
        }
    }
}

impl<T> Default for Octree<T> {
    fn default() -> Self {
        Self::new()
    }
}
