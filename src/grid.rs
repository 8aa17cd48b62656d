use crate::position::Position;

/// A rectangular arena of cells indexed by position, stored row-major.
///
/// Cells may be absent: a map drawn with ragged rows has a bounding box wider
/// than some of its rows, and the missing cells do not exist at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    cells: Vec<Option<T>>,
}

impl<T: Copy> Grid<T> {
    /// Creates a grid where every cell is absent.
    pub fn new(width: usize, height: usize) -> Self {
        Grid {
            width,
            height,
            cells: vec![None; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn index(&self, pos: Position) -> Option<usize> {
        if pos.x < 0 || pos.y < 0 {
            return None;
        }
        let (x, y) = (pos.x as usize, pos.y as usize);
        if x < self.width && y < self.height {
            Some(y * self.width + x)
        } else {
            None
        }
    }

    /// True if the position is inside the bounding box, whether or not the cell exists.
    pub fn in_bounds(&self, pos: Position) -> bool {
        self.index(pos).is_some()
    }

    /// Returns the cell content, or `None` if the position is out of bounds or
    /// the cell does not exist.
    pub fn get(&self, pos: Position) -> Option<T> {
        self.index(pos).and_then(|idx| self.cells[idx])
    }

    /// Stores a value at the position.
    /// Panics if the position is outside the bounding box.
    pub fn set(&mut self, pos: Position, value: T) {
        let idx = self
            .index(pos)
            .unwrap_or_else(|| panic!("Position {} outside {}x{} grid", pos, self.width, self.height));
        self.cells[idx] = Some(value);
    }

    /// Iterates over existing cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Position, T)> + '_ {
        let width = self.width;
        self.cells.iter().enumerate().filter_map(move |(idx, cell)| {
            cell.map(|value| (Position::new((idx % width) as i32, (idx / width) as i32), value))
        })
    }
}
