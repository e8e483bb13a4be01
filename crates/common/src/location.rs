//! Integer 3-D coordinates, cardinal directions and relative movements.

use std::fmt;
use std::str::FromStr;

/// Multiplier for the coordinate hash. Any odd prime works; this one has
/// been with the project since the beginning.
pub const LOCATION_HASH_PRIME: u32 = 101;

pub type Coord = i32;

/// A position on the unbounded 3-D grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Location {
    pub x: Coord,
    pub y: Coord,
    pub z: Coord,
}

impl Location {
    pub const fn new(x: Coord, y: Coord, z: Coord) -> Self {
        Self { x, y, z }
    }

    /// The location `distance` steps along `dir`.
    pub fn offset(self, dir: Direction, distance: Coord) -> Self {
        match dir {
            Direction::North => Self::new(self.x, self.y, self.z - distance),
            Direction::South => Self::new(self.x, self.y, self.z + distance),
            Direction::East => Self::new(self.x + distance, self.y, self.z),
            Direction::West => Self::new(self.x - distance, self.y, self.z),
            Direction::Up => Self::new(self.x, self.y + distance, self.z),
            Direction::Down => Self::new(self.x, self.y - distance, self.z),
        }
    }

    /// Hash into `[0, max)`. `max` must be a power of two so the modulus
    /// reduces to a bitmask.
    pub fn hash(self, max: usize) -> usize {
        debug_assert!(max.is_power_of_two());
        (self.hash_unbounded() as usize) & (max - 1)
    }

    pub fn hash_unbounded(self) -> u32 {
        let mut total = self.x as u32;
        total = total.wrapping_mul(LOCATION_HASH_PRIME);
        total = total.wrapping_add(self.y as u32);
        total = total.wrapping_mul(LOCATION_HASH_PRIME);
        total.wrapping_add(self.z as u32)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.x, self.y, self.z)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DirectionError {
    #[error("'{0}' is not a direction")]
    Unknown(String),

    #[error("{dir} has no horizontal turn")]
    VerticalTurn { dir: Direction },
}

/// The six cardinal directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    South,
    East,
    West,
    Up,
    Down,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
        Direction::Up,
        Direction::Down,
    ];

    /// The four horizontal directions, in the order wire propagation
    /// visits them.
    pub const HORIZONTAL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    pub fn invert(self) -> Self {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }

    /// Quarter turn clockwise when seen from above. Up and Down have no
    /// horizontal turn and are rejected.
    pub fn right(self) -> Result<Self, DirectionError> {
        match self {
            Direction::North => Ok(Direction::East),
            Direction::South => Ok(Direction::West),
            Direction::East => Ok(Direction::South),
            Direction::West => Ok(Direction::North),
            dir => Err(DirectionError::VerticalTurn { dir }),
        }
    }

    /// Quarter turn counter-clockwise when seen from above.
    pub fn left(self) -> Result<Self, DirectionError> {
        match self {
            Direction::North => Ok(Direction::West),
            Direction::South => Ok(Direction::East),
            Direction::East => Ok(Direction::North),
            Direction::West => Ok(Direction::South),
            dir => Err(DirectionError::VerticalTurn { dir }),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Direction::North => "NORTH",
            Direction::South => "SOUTH",
            Direction::East => "EAST",
            Direction::West => "WEST",
            Direction::Up => "UP",
            Direction::Down => "DOWN",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Direction {
    type Err = DirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Direction::ALL
            .into_iter()
            .find(|dir| dir.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| DirectionError::Unknown(s.to_string()))
    }
}

/// A movement relative to a reference direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    Forwards,
    Behind,
    Left,
    Right,
}

impl Movement {
    /// Reify the movement against a concrete facing.
    pub fn resolve(self, reference: Direction) -> Result<Direction, DirectionError> {
        match self {
            Movement::Forwards => Ok(reference),
            Movement::Behind => Ok(reference.invert()),
            Movement::Left => reference.left(),
            Movement::Right => reference.right(),
        }
    }
}

/// An inclusive coordinate range with a step, `a..b[..step]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub start: Coord,
    pub end: Coord,
    pub step: Coord,
}

impl Range {
    pub fn new(start: Coord, end: Coord, step: Coord) -> Self {
        Self { start, end, step }
    }

    pub fn scalar(value: Coord) -> Self {
        Self::new(value, value, 1)
    }

    fn values(self) -> impl Iterator<Item = Coord> {
        let lo = self.start.min(self.end);
        let hi = self.start.max(self.end);
        let step = self.step.abs().max(1);
        (lo..=hi).step_by(step as usize)
    }
}

/// The Cartesian product of three ranges; the target of a region command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: Range,
    pub y: Range,
    pub z: Range,
}

impl Region {
    pub fn new(x: Range, y: Range, z: Range) -> Self {
        Self { x, y, z }
    }

    pub fn point(location: Location) -> Self {
        Self::new(
            Range::scalar(location.x),
            Range::scalar(location.y),
            Range::scalar(location.z),
        )
    }

    /// Visit every location in the region, x-major.
    pub fn locations(self) -> impl Iterator<Item = Location> {
        self.x.values().flat_map(move |x| {
            self.y
                .values()
                .flat_map(move |y| self.z.values().map(move |z| Location::new(x, y, z)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn offset_moves_one_axis() {
        let origin = Location::new(0, 0, 0);
        assert_eq!(origin.offset(Direction::North, 1), Location::new(0, 0, -1));
        assert_eq!(origin.offset(Direction::South, 1), Location::new(0, 0, 1));
        assert_eq!(origin.offset(Direction::East, 1), Location::new(1, 0, 0));
        assert_eq!(origin.offset(Direction::West, 1), Location::new(-1, 0, 0));
        assert_eq!(origin.offset(Direction::Up, 1), Location::new(0, 1, 0));
        assert_eq!(origin.offset(Direction::Down, 1), Location::new(0, -1, 0));
    }

    #[test]
    fn offset_then_inverse_returns_home() {
        let start = Location::new(7, -3, 12);
        for dir in Direction::ALL {
            assert_eq!(start.offset(dir, 1).offset(dir.invert(), 1), start);
        }
    }

    #[test]
    fn vertical_turns_rejected() {
        assert!(Direction::Up.left().is_err());
        assert!(Direction::Down.right().is_err());
    }

    #[test]
    fn horizontal_turn_roundtrip() {
        for dir in Direction::HORIZONTAL {
            assert_eq!(dir.left().unwrap().right().unwrap(), dir);
            assert_eq!(dir.right().unwrap().left().unwrap(), dir);
        }
    }

    #[test]
    fn movement_resolution() {
        assert_eq!(
            Movement::Forwards.resolve(Direction::East).unwrap(),
            Direction::East
        );
        assert_eq!(
            Movement::Behind.resolve(Direction::East).unwrap(),
            Direction::West
        );
        assert_eq!(
            Movement::Left.resolve(Direction::North).unwrap(),
            Direction::West
        );
        assert_eq!(
            Movement::Right.resolve(Direction::North).unwrap(),
            Direction::East
        );
    }

    #[test]
    fn direction_parses_case_insensitively() {
        assert_eq!("north".parse::<Direction>().unwrap(), Direction::North);
        assert_eq!("Down".parse::<Direction>().unwrap(), Direction::Down);
        assert!("sideways".parse::<Direction>().is_err());
    }

    #[test]
    fn region_iterates_cartesian_product() {
        let region = Region::new(
            Range::new(0, 1, 1),
            Range::scalar(5),
            Range::new(0, 4, 2),
        );
        let locations: Vec<_> = region.locations().collect();
        assert_eq!(locations.len(), 6);
        assert_eq!(locations[0], Location::new(0, 5, 0));
        assert_eq!(locations[5], Location::new(1, 5, 4));
    }

    #[test]
    fn reversed_range_normalises() {
        let region = Region::new(Range::new(3, 1, 1), Range::scalar(0), Range::scalar(0));
        let xs: Vec<_> = region.locations().map(|l| l.x).collect();
        assert_eq!(xs, vec![1, 2, 3]);
    }

    proptest! {
        #[test]
        fn invert_is_an_involution(dir in prop::sample::select(Direction::ALL.to_vec())) {
            prop_assert_eq!(dir.invert().invert(), dir);
        }

        #[test]
        fn hash_stays_in_bounds(
            x in any::<i32>(),
            y in any::<i32>(),
            z in any::<i32>(),
            bits in 0u32..16,
        ) {
            let max = 1usize << bits;
            prop_assert!(Location::new(x, y, z).hash(max) < max);
        }

        #[test]
        fn adjacency_is_one_step(
            x in -1000i32..1000,
            y in -1000i32..1000,
            z in -1000i32..1000,
            dir in prop::sample::select(Direction::ALL.to_vec()),
        ) {
            let loc = Location::new(x, y, z);
            let next = loc.offset(dir, 1);
            let d = (next.x - loc.x).abs() + (next.y - loc.y).abs() + (next.z - loc.z).abs();
            prop_assert_eq!(d, 1);
        }
    }
}
