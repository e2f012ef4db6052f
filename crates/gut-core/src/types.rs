//! Core type definitions for the simulation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Subpopulation label held by a tissue cell. `0` is the empty cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(pub u8);

impl Label {
    pub const EMPTY: Label = Label(0);

    pub fn new(index: usize) -> Self {
        debug_assert!(index <= u8::MAX as usize);
        Self(index as u8)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }

    pub fn is_occupied(&self) -> bool {
        !self.is_empty()
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cell coordinate on the tissue patch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Offset this position, returning `None` if the result would fall
    /// outside a `size` x `size` patch. There is no wraparound.
    pub fn offset(&self, direction: Direction, size: usize) -> Option<Position> {
        let (dr, dc) = direction.to_delta();
        let row = self.row.checked_add_signed(dr)?;
        let col = self.col.checked_add_signed(dc)?;
        if row < size && col < size {
            Some(Position::new(row, col))
        } else {
            None
        }
    }

    /// Center of a `size` x `size` patch (integer division)
    pub fn center(size: usize) -> Self {
        Self::new(size / 2, size / 2)
    }
}

/// One of the eight Moore-neighborhood directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    NorthWest,
    North,
    NorthEast,
    West,
    East,
    SouthWest,
    South,
    SouthEast,
}

impl Direction {
    /// `(row, col)` delta for this direction
    pub fn to_delta(&self) -> (isize, isize) {
        match self {
            Direction::NorthWest => (-1, -1),
            Direction::North => (-1, 0),
            Direction::NorthEast => (-1, 1),
            Direction::West => (0, -1),
            Direction::East => (0, 1),
            Direction::SouthWest => (1, -1),
            Direction::South => (1, 0),
            Direction::SouthEast => (1, 1),
        }
    }

    /// All neighbor directions in trial order. Growth consumes one draw per
    /// entry, so this order is part of the reproducible draw sequence.
    pub fn all() -> [Direction; 8] {
        [
            Direction::NorthWest,
            Direction::North,
            Direction::NorthEast,
            Direction::West,
            Direction::East,
            Direction::SouthWest,
            Direction::South,
            Direction::SouthEast,
        ]
    }
}

/// Which efficacy an attack uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackKind {
    Antibiotic,
    Immune,
}

impl AttackKind {
    pub fn from_antibiotic_flag(antibiotic: bool) -> Self {
        if antibiotic {
            AttackKind::Antibiotic
        } else {
            AttackKind::Immune
        }
    }
}

impl fmt::Display for AttackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttackKind::Antibiotic => write!(f, "antibiotic"),
            AttackKind::Immune => write!(f, "immune"),
        }
    }
}

/// External perturbation applied to the patch between growth steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Perturbation {
    Attack { attack: AttackKind },
    Infect,
    Transplant,
}

impl fmt::Display for Perturbation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Perturbation::Attack { attack } => write!(f, "{} attack", attack),
            Perturbation::Infect => write!(f, "infection"),
            Perturbation::Transplant => write!(f, "fecal transplant"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_in_bounds() {
        let pos = Position::new(2, 2);
        assert_eq!(pos.offset(Direction::NorthWest, 5), Some(Position::new(1, 1)));
        assert_eq!(pos.offset(Direction::SouthEast, 5), Some(Position::new(3, 3)));
    }

    #[test]
    fn test_offset_no_wraparound() {
        let corner = Position::new(0, 0);
        assert_eq!(corner.offset(Direction::NorthWest, 5), None);
        assert_eq!(corner.offset(Direction::West, 5), None);
        assert_eq!(corner.offset(Direction::North, 5), None);
        assert_eq!(corner.offset(Direction::SouthEast, 5), Some(Position::new(1, 1)));

        let far = Position::new(4, 4);
        assert_eq!(far.offset(Direction::East, 5), None);
        assert_eq!(far.offset(Direction::South, 5), None);
    }

    #[test]
    fn test_directions_are_distinct() {
        let deltas: std::collections::HashSet<_> =
            Direction::all().iter().map(|d| d.to_delta()).collect();
        assert_eq!(deltas.len(), 8);
        assert!(!deltas.contains(&(0, 0)));
    }

    #[test]
    fn test_center() {
        assert_eq!(Position::center(5), Position::new(2, 2));
        assert_eq!(Position::center(4), Position::new(2, 2));
        assert_eq!(Position::center(1), Position::new(0, 0));
    }

    #[test]
    fn test_attack_kind_from_flag() {
        assert_eq!(AttackKind::from_antibiotic_flag(true), AttackKind::Antibiotic);
        assert_eq!(AttackKind::from_antibiotic_flag(false), AttackKind::Immune);
    }

    #[test]
    fn test_perturbation_serialization() {
        let p = Perturbation::Attack { attack: AttackKind::Immune };
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, r#"{"kind":"attack","attack":"immune"}"#);
        let back: Perturbation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }
}
