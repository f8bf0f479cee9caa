//! Wall and floor occupancy over the fixed-size tile grid.

use mini_roguelike_core::CellCoord;
use rand::Rng;
use tracing::warn;

/// Random draws attempted before falling back to a deterministic scan.
const SAMPLE_ATTEMPTS: usize = 200;

/// Content of a single grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tile {
    /// Walkable cell.
    Floor,
    /// Impassable cell.
    Wall,
}

/// Dense tile grid whose outermost ring is always walled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridMap {
    columns: u32,
    rows: u32,
    tiles: Vec<Tile>,
}

impl GridMap {
    /// Creates a map whose only walls are the four border rings.
    #[must_use]
    pub fn bordered(columns: u32, rows: u32) -> Self {
        let capacity_u64 = u64::from(columns) * u64::from(rows);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        let mut map = Self {
            columns,
            rows,
            tiles: vec![Tile::Floor; capacity],
        };
        map.regenerate();
        map
    }

    /// Creates a bordered map with additional interior walls.
    ///
    /// Cells outside the grid are ignored.
    #[must_use]
    pub fn with_walls<I>(columns: u32, rows: u32, walls: I) -> Self
    where
        I: IntoIterator<Item = CellCoord>,
    {
        let mut map = Self::bordered(columns, rows);
        for cell in walls {
            if let Some(index) = map.index(cell) {
                map.tiles[index] = Tile::Wall;
            }
        }
        map
    }

    /// Resets the map to floor everywhere except the border rings.
    pub fn regenerate(&mut self) {
        let columns = self.columns;
        let rows = self.rows;
        for row in 0..rows {
            for column in 0..columns {
                let cell = CellCoord::new(column, row);
                let tile = if self.is_border(cell) {
                    Tile::Wall
                } else {
                    Tile::Floor
                };
                if let Some(index) = self.index(cell) {
                    self.tiles[index] = tile;
                }
            }
        }
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Returns the tile at the provided cell, or `None` outside the grid.
    #[must_use]
    pub fn tile(&self, cell: CellCoord) -> Option<Tile> {
        self.index(cell)
            .and_then(|index| self.tiles.get(index).copied())
    }

    /// Reports whether the cell is impassable. Cells outside the grid are blocked.
    #[must_use]
    pub fn is_blocked(&self, cell: CellCoord) -> bool {
        !matches!(self.tile(cell), Some(Tile::Floor))
    }

    /// Reports whether the cell lies on the outermost ring of the grid.
    #[must_use]
    pub fn is_border(&self, cell: CellCoord) -> bool {
        cell.column() == 0
            || cell.row() == 0
            || cell.column() + 1 >= self.columns
            || cell.row() + 1 >= self.rows
    }

    /// Iterator over every walled cell in row-major order.
    pub fn walls(&self) -> impl Iterator<Item = CellCoord> + '_ {
        let columns = self.columns.max(1);
        self.tiles
            .iter()
            .enumerate()
            .filter(|(_, tile)| **tile == Tile::Wall)
            .filter_map(move |(index, _)| {
                let index = u32::try_from(index).ok()?;
                Some(CellCoord::new(index % columns, index / columns))
            })
    }

    /// Samples a uniformly random free interior cell.
    ///
    /// Returns `None` only when the interior has no free cell.
    pub fn random_free_cell<R>(&self, rng: &mut R) -> Option<CellCoord>
    where
        R: Rng + ?Sized,
    {
        self.random_free_cell_where(rng, |_| true)
    }

    /// Samples a random free interior cell that also satisfies `accept`.
    pub fn random_free_cell_where<R, F>(&self, rng: &mut R, accept: F) -> Option<CellCoord>
    where
        R: Rng + ?Sized,
        F: Fn(CellCoord) -> bool,
    {
        self.sample_free_cell(rng, SAMPLE_ATTEMPTS, &accept)
    }

    fn sample_free_cell<R, F>(&self, rng: &mut R, attempts: usize, accept: &F) -> Option<CellCoord>
    where
        R: Rng + ?Sized,
        F: Fn(CellCoord) -> bool,
    {
        if self.columns < 3 || self.rows < 3 {
            return None;
        }

        for _ in 0..attempts {
            let column = rng.gen_range(1..=self.columns - 2);
            let row = rng.gen_range(1..=self.rows - 2);
            let cell = CellCoord::new(column, row);
            if !self.is_blocked(cell) && accept(cell) {
                return Some(cell);
            }
        }

        warn!(attempts, "random sampling exhausted, scanning interior");
        self.first_free_interior_cell(accept)
    }

    fn first_free_interior_cell<F>(&self, accept: &F) -> Option<CellCoord>
    where
        F: Fn(CellCoord) -> bool,
    {
        (1..self.rows.saturating_sub(1))
            .flat_map(|row| (1..self.columns.saturating_sub(1)).map(move |column| (column, row)))
            .map(|(column, row)| CellCoord::new(column, row))
            .find(|cell| !self.is_blocked(*cell) && accept(*cell))
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() < self.columns && cell.row() < self.rows {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}
