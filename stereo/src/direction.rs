//! Sweep directions
//!
//! A direction `(di, dj)` points from a pixel's predecessor to the pixel
//! itself: the sweep visits `p` after `p - (di, dj)`.

use std::fmt;

use crate::{Error, Result};

/// One 8-connected sweep direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "(i32, i32)", into = "(i32, i32)")
)]
pub struct Direction {
    di: i32,
    dj: i32,
}

impl Direction {
    pub const RIGHT: Direction = Direction { di: 0, dj: 1 };
    pub const DOWN: Direction = Direction { di: 1, dj: 0 };
    pub const DOWN_RIGHT: Direction = Direction { di: 1, dj: 1 };
    pub const DOWN_LEFT: Direction = Direction { di: 1, dj: -1 };
    pub const LEFT: Direction = Direction { di: 0, dj: -1 };
    pub const UP: Direction = Direction { di: -1, dj: 0 };
    pub const UP_LEFT: Direction = Direction { di: -1, dj: -1 };
    pub const UP_RIGHT: Direction = Direction { di: -1, dj: 1 };

    /// The 8-connected set: forward directions first, then their reverses.
    pub const EIGHT_CONNECTED: [Direction; 8] = [
        Self::RIGHT,
        Self::DOWN,
        Self::DOWN_RIGHT,
        Self::DOWN_LEFT,
        Self::LEFT,
        Self::UP,
        Self::UP_LEFT,
        Self::UP_RIGHT,
    ];

    pub fn new(di: i32, dj: i32) -> Result<Self> {
        let valid = |v: i32| (-1..=1).contains(&v);
        if !valid(di) || !valid(dj) || (di == 0 && dj == 0) {
            return Err(Error::InvalidDirection { di, dj });
        }
        Ok(Self { di, dj })
    }

    /// Row step.
    pub fn di(&self) -> i32 {
        self.di
    }

    /// Column step.
    pub fn dj(&self) -> i32 {
        self.dj
    }

    pub fn reversed(&self) -> Self {
        Self {
            di: -self.di,
            dj: -self.dj,
        }
    }

    /// `(row, col)` moved one step along the direction, or `None` when it
    /// leaves the `rows x cols` grid.
    #[inline]
    pub fn step(
        &self,
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    ) -> Option<(usize, usize)> {
        let r = row.checked_add_signed(self.di as isize)?;
        let c = col.checked_add_signed(self.dj as isize)?;
        (r < rows && c < cols).then_some((r, c))
    }

    /// Predecessor of `(row, col)` along the direction, if it lies inside the grid.
    #[inline]
    pub fn predecessor(
        &self,
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    ) -> Option<(usize, usize)> {
        self.reversed().step(row, col, rows, cols)
    }

    /// Parse a list of `(di, dj)` pairs, rejecting the first invalid one.
    pub fn parse_all(pairs: &[(i32, i32)]) -> Result<Vec<Direction>> {
        pairs
            .iter()
            .map(|&(di, dj)| Direction::new(di, dj))
            .collect()
    }
}

impl TryFrom<(i32, i32)> for Direction {
    type Error = Error;

    fn try_from((di, dj): (i32, i32)) -> Result<Self> {
        Direction::new(di, dj)
    }
}

impl From<Direction> for (i32, i32) {
    fn from(dir: Direction) -> Self {
        (dir.di, dir.dj)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.di, self.dj)
    }
}
