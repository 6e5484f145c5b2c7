//! Grid model: walls, food and capsules.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::game::{Action, Team};

/// A coordinate on the grid. `y` grows northwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    /// X coordinate (column).
    pub x: i32,
    /// Y coordinate (row, 0 = bottom).
    pub y: i32,
}

impl Coord {
    /// Create a new coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to another coordinate.
    #[must_use]
    pub const fn manhattan(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// The coordinate reached by taking `action` from here.
    #[must_use]
    pub const fn step(self, action: Action) -> Self {
        let (dx, dy) = action.vector();
        Self::new(self.x + dx, self.y + dy)
    }

    /// The 3x3 block centred on this coordinate, in scatter order.
    ///
    /// `dx` is the outer loop and `dy` the inner one, both running -1..=1.
    /// The centre itself is included.
    #[must_use]
    pub fn block(self) -> [Coord; 9] {
        let mut result = [self; 9];
        let mut i = 0;
        for dx in -1..=1 {
            for dy in -1..=1 {
                result[i] = Coord::new(self.x + dx, self.y + dy);
                i += 1;
            }
        }
        result
    }
}

/// The game grid.
///
/// Walls never change after construction and are shared between all
/// snapshots of a match. Food and capsules are shared until the first write,
/// when the writing snapshot takes its own copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    /// Width in cells.
    width: i32,
    /// Height in cells.
    height: i32,
    /// Wall mask in row-major order.
    walls: Arc<[bool]>,
    /// Food mask in row-major order.
    #[allow(clippy::rc_buffer)]
    food: Arc<Vec<bool>>,
    /// Remaining capsule locations.
    #[allow(clippy::rc_buffer)]
    capsules: Arc<Vec<Coord>>,
}

impl Grid {
    /// Create a grid from row-major masks.
    ///
    /// Returns `None` if a dimension is not positive or a mask has the wrong length.
    #[must_use]
    pub fn new(
        width: i32,
        height: i32,
        walls: Vec<bool>,
        food: Vec<bool>,
        capsules: Vec<Coord>,
    ) -> Option<Self> {
        if width <= 0 || height <= 0 {
            return None;
        }
        let size = usize::try_from(width).ok()? * usize::try_from(height).ok()?;
        if walls.len() != size || food.len() != size {
            return None;
        }

        Some(Self {
            width,
            height,
            walls: walls.into(),
            food: Arc::new(food),
            capsules: Arc::new(capsules),
        })
    }

    /// Get the width of the grid.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Get the height of the grid.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// Check if a coordinate is within the grid bounds.
    #[must_use]
    pub const fn in_bounds(&self, coord: Coord) -> bool {
        coord.x >= 0 && coord.y >= 0 && coord.x < self.width && coord.y < self.height
    }

    /// Convert a coordinate to an index into the masks.
    #[allow(clippy::cast_sign_loss)]
    fn index(&self, coord: Coord) -> Option<usize> {
        if self.in_bounds(coord) {
            Some(coord.y as usize * self.width as usize + coord.x as usize)
        } else {
            None
        }
    }

    /// Check for a wall. Everything outside the grid is wall.
    #[must_use]
    pub fn is_wall(&self, coord: Coord) -> bool {
        self.index(coord).is_none_or(|idx| self.walls[idx])
    }

    /// Check for food.
    #[must_use]
    pub fn has_food(&self, coord: Coord) -> bool {
        self.index(coord).is_some_and(|idx| self.food[idx])
    }

    /// Set or clear food on a cell.
    ///
    /// Returns `false` if the coordinate is out of bounds.
    pub fn set_food(&mut self, coord: Coord, present: bool) -> bool {
        let Some(idx) = self.index(coord) else {
            return false;
        };
        if self.food[idx] != present {
            Arc::make_mut(&mut self.food)[idx] = present;
        }
        true
    }

    /// Number of food cells on the whole grid.
    #[must_use]
    pub fn food_count(&self) -> u32 {
        let count = self.food.iter().filter(|&&f| f).count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Iterate over all food cells in row-major order.
    pub fn food_cells(&self) -> impl Iterator<Item = Coord> + '_ {
        let width = self.width;
        self.food.iter().enumerate().filter(|(_, f)| **f).map(move |(idx, _)| {
            #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
            let idx = idx as i32;
            Coord::new(idx % width, idx / width)
        })
    }

    /// Food on the home side of `team`, i.e. the food that team defends.
    pub fn food_on_side(&self, team: Team) -> impl Iterator<Item = Coord> + '_ {
        self.food_cells()
            .filter(move |&coord| self.home_team(coord) == team)
    }

    /// Remaining capsules.
    #[must_use]
    pub fn capsules(&self) -> &[Coord] {
        &self.capsules
    }

    /// Capsules on the home side of `team`.
    pub fn capsules_on_side(&self, team: Team) -> impl Iterator<Item = Coord> + '_ {
        self.capsules
            .iter()
            .copied()
            .filter(move |&coord| self.home_team(coord) == team)
    }

    /// Check for a capsule.
    #[must_use]
    pub fn has_capsule(&self, coord: Coord) -> bool {
        self.capsules.contains(&coord)
    }

    /// Remove a capsule. Returns `false` if there was none.
    pub fn remove_capsule(&mut self, coord: Coord) -> bool {
        let Some(pos) = self.capsules.iter().position(|&c| c == coord) else {
            return false;
        };
        Arc::make_mut(&mut self.capsules).remove(pos);
        true
    }

    /// Check if a coordinate lies on Red's half (`x < width / 2`).
    #[must_use]
    pub const fn is_red_side(&self, coord: Coord) -> bool {
        coord.x < self.width / 2
    }

    /// The team whose home side contains `coord`.
    #[must_use]
    pub const fn home_team(&self, coord: Coord) -> Team {
        if self.is_red_side(coord) {
            Team::Red
        } else {
            Team::Blue
        }
    }

    /// Check whether two grids share the same wall allocation.
    #[must_use]
    pub fn shares_walls_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.walls, &other.walls)
    }

    /// Check whether two grids share the same food allocation.
    #[must_use]
    pub fn shares_food_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.food, &other.food)
    }
}
