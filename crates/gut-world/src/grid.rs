//! 2D grid for the tissue patch.

use gut_core::{Census, Direction, Error, Label, Position, Result};
use serde::{Deserialize, Serialize};

/// A square, non-wrapping grid of subpopulation labels stored row-major
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TissueGrid {
    size: usize,
    cells: Vec<Label>,
}

impl TissueGrid {
    /// An all-empty `size` x `size` patch
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![Label::EMPTY; size * size],
        }
    }

    /// Build a grid from explicit rows, checking it is square and every
    /// label belongs to a table of `subpop_count` types.
    pub fn from_rows(rows: Vec<Vec<Label>>, subpop_count: usize) -> Result<Self> {
        let size = rows.len();
        let mut cells = Vec::with_capacity(size * size);

        for (row_num, row) in rows.into_iter().enumerate() {
            if row.len() != size {
                return Err(Error::InvalidGrid(format!(
                    "row {} has {} cells, expected {}",
                    row_num,
                    row.len(),
                    size
                )));
            }
            if let Some(label) = row.iter().find(|l| l.index() >= subpop_count) {
                return Err(Error::InvalidGrid(format!(
                    "row {} holds label {} outside 0..{}",
                    row_num, label, subpop_count
                )));
            }
            cells.extend(row);
        }

        Ok(Self { size, cells })
    }

    /// Side length
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, pos: Position) -> Option<Label> {
        self.pos_to_index(pos).map(|i| self.cells[i])
    }

    /// Set the cell at `pos`. Positions come from the grid's own iteration
    /// or from a bounds-checked offset; anything else is a caller bug.
    pub fn set(&mut self, pos: Position, label: Label) {
        let index = self
            .pos_to_index(pos)
            .unwrap_or_else(|| panic!("position {:?} outside {}x{} grid", pos, self.size, self.size));
        self.cells[index] = label;
    }

    /// Moore neighbors of `pos` in trial order. Out-of-bounds neighbors are
    /// reported as `None` rather than skipped so callers can still consume a
    /// draw for them.
    pub fn neighbors(&self, pos: Position) -> impl Iterator<Item = (Direction, Option<Position>)> + '_ {
        Direction::all()
            .into_iter()
            .map(move |dir| (dir, pos.offset(dir, self.size)))
    }

    fn pos_to_index(&self, pos: Position) -> Option<usize> {
        if pos.row < self.size && pos.col < self.size {
            Some(pos.row * self.size + pos.col)
        } else {
            None
        }
    }

    /// Get position from index
    pub fn index_to_pos(&self, index: usize) -> Position {
        Position::new(index / self.size, index % self.size)
    }

    /// Iterator over all positions in row-major order
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.cells.len()).map(move |i| self.index_to_pos(i))
    }

    /// Iterator over all cells with positions
    pub fn iter(&self) -> impl Iterator<Item = (Position, Label)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, label)| (self.index_to_pos(i), *label))
    }

    /// Row-major cell slice
    pub fn cells(&self) -> &[Label] {
        &self.cells
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Label]> + '_ {
        // chunks(0) panics, and a zero-sized grid has no rows anyway
        self.cells.chunks(self.size.max(1))
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|l| l.is_occupied()).count()
    }

    pub fn census(&self, subpop_count: usize) -> Census {
        Census::from_labels(subpop_count, &self.cells)
    }

    /// Every cell holds a label of a `subpop_count`-type table
    pub fn is_well_formed(&self, subpop_count: usize) -> bool {
        self.cells.len() == self.size * self.size
            && self.cells.iter().all(|l| l.index() < subpop_count)
    }

    /// Owned read-only copy for renderers
    pub fn snapshot(&self) -> GridSnapshot {
        GridSnapshot {
            size: self.size,
            rows: self.rows().map(|row| row.to_vec()).collect(),
        }
    }
}

/// Read-only view of the patch, as rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSnapshot {
    pub size: usize,
    pub rows: Vec<Vec<Label>>,
}
