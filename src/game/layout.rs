//! Parsed layouts: the grid plus ordered agent starts.

use std::str::FromStr;

use crate::error::LayoutError;
use crate::game::{Coord, Grid};

/// A layout ready to start a match.
///
/// Text layouts use `%` for walls, `.` for food, `o` for capsules, a digit
/// for an agent start and a space for empty floor. The first text row is the
/// northernmost. Agents are ordered by their digit.
///
/// Only the digits `0`-`9` mark agent starts, so a layout holds at most ten
/// agents. Letters, including the `P` and `G` markers of other layout
/// dialects, are rejected as unknown tiles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Walls, food and capsules.
    grid: Grid,
    /// Start coordinate for each agent, in agent order.
    agent_starts: Vec<Coord>,
}

impl Layout {
    /// Create a layout from an already-built grid and agent starts.
    #[must_use]
    pub fn new(grid: Grid, agent_starts: Vec<Coord>) -> Self {
        Self { grid, agent_starts }
    }

    /// Parse a layout from text rows, top row first.
    ///
    /// # Errors
    ///
    /// Returns an error for empty input, rows of different width, characters
    /// outside the layout alphabet or a repeated agent digit.
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self, LayoutError> {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.as_ref().chars().count());
        if height == 0 || width == 0 {
            return Err(LayoutError::Empty);
        }

        let size = width * height;
        let mut walls = vec![false; size];
        let mut food = vec![false; size];
        let mut capsules = Vec::new();
        let mut numbered: Vec<(u32, Coord)> = Vec::new();

        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let to_i32 = |v: usize| v as i32;

        for (row, text) in rows.iter().enumerate() {
            let text = text.as_ref();
            let found = text.chars().count();
            if found != width {
                return Err(LayoutError::Ragged {
                    row,
                    expected: width,
                    found,
                });
            }

            let y = height - 1 - row;
            for (x, ch) in text.chars().enumerate() {
                let idx = y * width + x;
                let coord = Coord::new(to_i32(x), to_i32(y));
                match ch {
                    '%' => walls[idx] = true,
                    '.' => food[idx] = true,
                    'o' => capsules.push(coord),
                    ' ' => {}
                    _ => {
                        let Some(digit) = ch.to_digit(10) else {
                            return Err(LayoutError::UnknownTile {
                                ch,
                                x: coord.x,
                                y: coord.y,
                            });
                        };
                        if numbered.iter().any(|(d, _)| *d == digit) {
                            return Err(LayoutError::DuplicateAgent(digit));
                        }
                        numbered.push((digit, coord));
                    }
                }
            }
        }

        numbered.sort_by_key(|(digit, _)| *digit);
        capsules.sort_by_key(|c| (c.y, c.x));
        let agent_starts = numbered.into_iter().map(|(_, coord)| coord).collect();

        let grid = Grid::new(to_i32(width), to_i32(height), walls, food, capsules)
            .ok_or(LayoutError::Empty)?;
        Ok(Self::new(grid, agent_starts))
    }

    /// Parse a multi-line layout. Blank lines around the grid are ignored.
    ///
    /// # Errors
    ///
    /// See [`Layout::from_rows`].
    pub fn parse(text: &str) -> Result<Self, LayoutError> {
        text.parse()
    }

    /// The grid at the start of a match.
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Agent starts, in agent order.
    #[must_use]
    pub fn agent_starts(&self) -> &[Coord] {
        &self.agent_starts
    }

    /// Number of food cells on the layout.
    #[must_use]
    pub fn total_food(&self) -> u32 {
        self.grid.food_count()
    }
}

impl FromStr for Layout {
    type Err = LayoutError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let lines: Vec<&str> = text.lines().collect();
        let first = lines.iter().position(|l| !l.trim().is_empty());
        let last = lines.iter().rposition(|l| !l.trim().is_empty());
        match (first, last) {
            (Some(first), Some(last)) => Self::from_rows(&lines[first..=last]),
            _ => Err(LayoutError::Empty),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: [&str; 5] = [
        "%%%%%%%",
        "%1 .o2%",
        "% %.% %",
        "%3.  4%",
        "%%%%%%%",
    ];

    #[test]
    fn test_parse_small_layout() {
        let layout = Layout::from_rows(&SMALL).unwrap();
        let grid = layout.grid();
        assert_eq!(grid.width(), 7);
        assert_eq!(grid.height(), 5);
        assert!(grid.is_wall(Coord::new(0, 0)));
        assert!(grid.is_wall(Coord::new(2, 2)));
        assert!(!grid.is_wall(Coord::new(1, 2)));
        assert!(grid.has_food(Coord::new(3, 3)));
        assert!(grid.has_food(Coord::new(2, 1)));
        assert_eq!(layout.total_food(), 3);
        assert_eq!(grid.capsules(), &[Coord::new(4, 3)]);
    }

    #[test]
    fn test_agents_ordered_by_digit() {
        let layout = Layout::from_rows(&SMALL).unwrap();
        assert_eq!(
            layout.agent_starts(),
            &[
                Coord::new(1, 3),
                Coord::new(5, 3),
                Coord::new(1, 1),
                Coord::new(5, 1)
            ]
        );
    }

    #[test]
    fn test_from_str_trims_blank_lines() {
        let text = "\n%%%%\n%12%\n%%%%\n\n";
        let layout = Layout::parse(text).unwrap();
        assert_eq!(layout.grid().height(), 3);
        assert_eq!(layout.agent_starts().len(), 2);
    }

    #[test]
    fn test_empty_rejected() {
        let rows: [&str; 0] = [];
        assert_eq!(Layout::from_rows(&rows), Err(LayoutError::Empty));
        assert_eq!("\n \n".parse::<Layout>(), Err(LayoutError::Empty));
    }

    #[test]
    fn test_ragged_rejected() {
        let err = Layout::from_rows(&["%%%%", "%1%", "%%%%"]).unwrap_err();
        assert_eq!(
            err,
            LayoutError::Ragged {
                row: 1,
                expected: 4,
                found: 3
            }
        );
    }

    #[test]
    fn test_unknown_tile_rejected() {
        let err = Layout::from_rows(&["%%%", "%X%", "%%%"]).unwrap_err();
        assert_eq!(err, LayoutError::UnknownTile { ch: 'X', x: 1, y: 1 });
    }

    #[test]
    fn test_letters_are_not_agent_starts() {
        for ch in ['a', 'P', 'G'] {
            let row = format!("%{ch}1 2%");
            let err = Layout::from_rows(&["%%%%%%", row.as_str(), "%%%%%%"]).unwrap_err();
            assert_eq!(err, LayoutError::UnknownTile { ch, x: 1, y: 1 });
        }
        let layout = Layout::from_rows(&["%%%%%%", "%01 9%", "%%%%%%"]).unwrap();
        assert_eq!(layout.agent_starts().len(), 3);
    }

    #[test]
    fn test_duplicate_agent_rejected() {
        let err = Layout::from_rows(&["%%%%", "%11%", "%%%%"]).unwrap_err();
        assert_eq!(err, LayoutError::DuplicateAgent(1));
    }
}
