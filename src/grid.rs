use std::fmt;
use std::path::Path;

use crate::boundary::{BoundaryHooks, Edge};
use crate::error::{Error, Result};
use crate::vector::Vector2;

/// Default cap on `width * height` when a write grows the grid.
pub const DEFAULT_CELL_LIMIT: usize = 1 << 22;

/// The program: a rectangular table of characters.
///
/// The top-left corner is fixed at (0, 0). Writes past the right or bottom
/// edge grow the table, padding with spaces; nothing ever shrinks it.
/// Every row always has exactly `width` cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    cells: Vec<Vec<char>>,
    width: usize,
    height: usize,
    cell_limit: usize,
}

impl Grid {
    /// Build a grid from program text, one row per line, padded with spaces
    /// to the longest line.
    pub fn parse(text: &str) -> Self {
        let lines: Vec<Vec<char>> = text.lines().map(|l| l.chars().collect()).collect();
        let width = lines.iter().map(Vec::len).max().unwrap_or(0);
        let cells: Vec<Vec<char>> = lines
            .into_iter()
            .map(|mut row| {
                row.resize(width, ' ');
                row
            })
            .collect();
        let height = cells.len();
        Self {
            cells,
            width,
            height,
            cell_limit: DEFAULT_CELL_LIMIT,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(Self::parse(&text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::FileNotFound(path.to_path_buf()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the growth cap.
    pub fn with_cell_limit(mut self, limit: usize) -> Self {
        self.cell_limit = limit;
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// The cell at (x, y) if it lies inside the grid. Never calls hooks.
    pub fn get(&self, x: i64, y: i64) -> Option<char> {
        let (x, y) = (usize::try_from(x).ok()?, usize::try_from(y).ok()?);
        self.cells.get(y)?.get(x).copied()
    }

    /// Read through the boundary hooks.
    ///
    /// Past the right or bottom edge the result is `None` (no cell). Past the
    /// left or top edge it is a space.
    pub fn read<H: BoundaryHooks + ?Sized>(&self, x: i64, y: i64, hooks: &mut H) -> Result<Option<char>> {
        let at = Vector2::new(x, y);
        if x >= self.width as i64 {
            hooks.on_read(Edge::Right, at)?;
            return Ok(None);
        }
        if y >= self.height as i64 {
            hooks.on_read(Edge::Bottom, at)?;
            return Ok(None);
        }
        if x < 0 {
            hooks.on_read(Edge::Left, at)?;
            return Ok(Some(' '));
        }
        if y < 0 {
            hooks.on_read(Edge::Top, at)?;
            return Ok(Some(' '));
        }
        Ok(Some(self.cells[y as usize][x as usize]))
    }

    /// Write through the boundary hooks, returning the cell's previous
    /// content, or `None` if the write was skipped (negative coordinates).
    ///
    /// Nothing is mutated unless every hook and the growth cap allow it.
    pub fn write<H: BoundaryHooks + ?Sized>(
        &mut self,
        x: i64,
        y: i64,
        c: char,
        hooks: &mut H,
    ) -> Result<Option<char>> {
        let at = Vector2::new(x, y);
        if x < 0 {
            hooks.on_write(Edge::Left, at)?;
            return Ok(None);
        }
        if y < 0 {
            hooks.on_write(Edge::Top, at)?;
            return Ok(None);
        }
        let (ux, uy) = (x as u64, y as u64);
        if ux >= self.width as u64 {
            hooks.on_write(Edge::Right, at)?;
        }
        if uy >= self.height as u64 {
            hooks.on_write(Edge::Bottom, at)?;
        }
        let width = (self.width as u64).max(ux.saturating_add(1));
        let height = (self.height as u64).max(uy.saturating_add(1));
        let grows = width > self.width as u64 || height > self.height as u64;
        if grows && width.saturating_mul(height) > self.cell_limit as u64 {
            return Err(Error::GridTooLarge {
                width: usize::try_from(width).unwrap_or(usize::MAX),
                height: usize::try_from(height).unwrap_or(usize::MAX),
                limit: self.cell_limit,
            });
        }
        self.grow(width as usize, height as usize);
        let cell = &mut self.cells[uy as usize][ux as usize];
        Ok(Some(std::mem::replace(cell, c)))
    }

    /// Overwrite a cell already inside the grid. Used when undoing a write.
    pub(crate) fn set(&mut self, x: usize, y: usize, c: char) {
        if let Some(cell) = self.cells.get_mut(y).and_then(|row| row.get_mut(x)) {
            *cell = c;
        }
    }

    fn grow(&mut self, width: usize, height: usize) {
        if width > self.width {
            for row in &mut self.cells {
                row.resize(width, ' ');
            }
            self.width = width;
        }
        while self.cells.len() < height {
            self.cells.push(vec![' '; self.width]);
        }
        self.height = self.height.max(height);
    }

    /// Each row as a string, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = String> + '_ {
        self.cells.iter().map(|row| row.iter().collect())
    }

    /// Copy of the cells, for inspection.
    pub fn snapshot(&self) -> Vec<Vec<char>> {
        self.cells.clone()
    }

    /// Render the grid with `marker` drawn over the cell at `position`, if
    /// that cell exists.
    pub fn render_with_marker(&self, position: Vector2, marker: char) -> String {
        let mut out = String::new();
        for (y, row) in self.cells.iter().enumerate() {
            if y > 0 {
                out.push('\n');
            }
            for (x, &c) in row.iter().enumerate() {
                if position.x == x as i64 && position.y == y as i64 {
                    out.push(marker);
                } else {
                    out.push(c);
                }
            }
        }
        out
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.rows().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            f.write_str(&row)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::{Access, EdgePolicy, RecordingHooks, Violation};

    #[test]
    fn parse_pads_rows() {
        let g = Grid::parse("ab\ncde\n");
        assert_eq!(g.width(), 3);
        assert_eq!(g.height(), 2);
        assert_eq!(g.rows().collect::<Vec<_>>(), vec!["ab ", "cde"]);
    }

    #[test]
    fn parse_handles_crlf() {
        let g = Grid::parse("a\r\nbc\r\n");
        assert_eq!(g.rows().collect::<Vec<_>>(), vec!["a ", "bc"]);
    }

    #[test]
    fn parse_empty() {
        let g = Grid::parse("");
        assert_eq!((g.width(), g.height()), (0, 0));
    }

    #[test]
    fn read_inside() {
        let g = Grid::parse("ab\ncd");
        let mut hooks = RecordingHooks::new();
        assert_eq!(g.read(1, 1, &mut hooks).unwrap(), Some('d'));
        assert!(hooks.violations.is_empty());
    }

    #[test]
    fn read_past_right_or_bottom_is_no_cell() {
        let g = Grid::parse("ab\ncd");
        let mut hooks = RecordingHooks::new();
        assert_eq!(g.read(2, 0, &mut hooks).unwrap(), None);
        assert_eq!(g.read(0, 2, &mut hooks).unwrap(), None);
        let edges: Vec<Edge> = hooks.violations.iter().map(|v| v.edge).collect();
        assert_eq!(edges, vec![Edge::Right, Edge::Bottom]);
    }

    #[test]
    fn read_before_left_or_top_is_space() {
        let g = Grid::parse("ab\ncd");
        let mut hooks = RecordingHooks::new();
        assert_eq!(g.read(-1, 0, &mut hooks).unwrap(), Some(' '));
        assert_eq!(g.read(0, -1, &mut hooks).unwrap(), Some(' '));
        let edges: Vec<Edge> = hooks.violations.iter().map(|v| v.edge).collect();
        assert_eq!(edges, vec![Edge::Left, Edge::Top]);
    }

    #[test]
    fn default_policy_rejects_top_read() {
        let g = Grid::parse("ab");
        let mut policy = EdgePolicy::default();
        assert!(matches!(g.read(0, -1, &mut policy), Err(Error::Boundary { edge: Edge::Top, .. })));
    }

    #[test]
    fn write_past_right_grows_every_row() {
        let mut g = Grid::parse("ab\ncd");
        let mut hooks = RecordingHooks::new();
        assert_eq!(g.write(4, 0, 'x', &mut hooks).unwrap(), Some(' '));
        assert_eq!(g.rows().collect::<Vec<_>>(), vec!["ab  x", "cd   "]);
        assert_eq!(
            hooks.violations,
            vec![Violation {
                edge: Edge::Right,
                access: Access::Write,
                position: Vector2::new(4, 0),
            }]
        );
    }

    #[test]
    fn write_past_bottom_right_adds_padded_rows() {
        let mut g = Grid::parse("ab");
        let mut hooks = RecordingHooks::new();
        g.write(2, 2, 'z', &mut hooks).unwrap();
        assert_eq!((g.width(), g.height()), (3, 3));
        assert_eq!(g.rows().collect::<Vec<_>>(), vec!["ab ", "   ", "  z"]);
        assert_eq!(hooks.violations.len(), 2);
    }

    #[test]
    fn write_negative_is_skipped() {
        let mut g = Grid::parse("ab");
        let mut hooks = RecordingHooks::new();
        assert_eq!(g.write(-1, 0, 'x', &mut hooks).unwrap(), None);
        assert_eq!(g.write(0, -3, 'x', &mut hooks).unwrap(), None);
        assert_eq!(g, Grid::parse("ab"));
        assert_eq!(hooks.violations.len(), 2);
    }

    #[test]
    fn write_inside_returns_previous() {
        let mut g = Grid::parse("ab");
        let mut policy = EdgePolicy::default();
        assert_eq!(g.write(1, 0, 'q', &mut policy).unwrap(), Some('b'));
        assert_eq!(g.get(1, 0), Some('q'));
    }

    #[test]
    fn growth_never_shrinks() {
        let mut g = Grid::parse("a");
        let mut policy = EdgePolicy::default();
        g.write(3, 3, '#', &mut policy).unwrap();
        g.write(0, 0, 'b', &mut policy).unwrap();
        assert_eq!((g.width(), g.height()), (4, 4));
    }

    #[test]
    fn growth_beyond_limit_fails_without_mutation() {
        let mut g = Grid::parse("ab").with_cell_limit(16);
        let mut policy = EdgePolicy::default();
        let before = g.clone();
        assert!(matches!(
            g.write(100, 0, 'x', &mut policy),
            Err(Error::GridTooLarge { limit: 16, .. })
        ));
        assert_eq!(g, before);
        assert!(g.write(i64::MAX, i64::MAX, 'x', &mut policy).is_err());
    }

    #[test]
    fn in_bounds_write_ignores_limit() {
        let mut g = Grid::parse("p@\n  ").with_cell_limit(2);
        let mut policy = EdgePolicy::default();
        assert_eq!(g.write(1, 0, 'A', &mut policy).unwrap(), Some('@'));
        assert_eq!(g.get(1, 0), Some('A'));
        assert!(matches!(
            g.write(2, 0, 'x', &mut policy),
            Err(Error::GridTooLarge { width: 3, height: 2, limit: 2 })
        ));
    }

    #[test]
    fn render_marks_pointer() {
        let g = Grid::parse("abc\ndef");
        assert_eq!(g.render_with_marker(Vector2::new(1, 1), '*'), "abc\nd*f");
        assert_eq!(g.render_with_marker(Vector2::new(9, 9), '*'), g.to_string());
    }

    #[test]
    fn load_missing_file() {
        let err = Grid::load(Path::new("/definitely/not/here.grid")).unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::boundary::RecordingHooks;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn rows_stay_rectangular(
            text in "[a-z \n]{0,40}",
            writes in prop::collection::vec((-3i64..12, -3i64..12), 0..16)
        ) {
            let mut g = Grid::parse(&text);
            let mut hooks = RecordingHooks::new();
            for (x, y) in writes {
                g.write(x, y, '#', &mut hooks).unwrap();
                for row in g.snapshot() {
                    prop_assert_eq!(row.len(), g.width());
                }
                prop_assert_eq!(g.snapshot().len(), g.height());
            }
        }
    }
}
