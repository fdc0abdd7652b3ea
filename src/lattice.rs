//! Periodic cubic lattice topology.
//!
//! Sites are numbered `index = x + N*(y + N*z)` with 0-based coordinates.
//! Each site carries six nearest neighbours in the fixed order
//! `+x, -x, +y, -y, +z, -z`, wrapping around at the boundaries.

use nalgebra::Vector3;
use crate::error::{LangevinError, Result};

/// Number of nearest neighbours on a simple cubic lattice.
pub const N_NEIGHBORS: usize = 6;

/// Direction slots in a neighbour row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    PlusX = 0,
    MinusX = 1,
    PlusY = 2,
    MinusY = 3,
    PlusZ = 4,
    MinusZ = 5,
}

impl Direction {
    pub const ALL: [Direction; N_NEIGHBORS] = [
        Direction::PlusX,
        Direction::MinusX,
        Direction::PlusY,
        Direction::MinusY,
        Direction::PlusZ,
        Direction::MinusZ,
    ];

    pub fn opposite(self) -> Self {
        match self {
            Direction::PlusX => Direction::MinusX,
            Direction::MinusX => Direction::PlusX,
            Direction::PlusY => Direction::MinusY,
            Direction::MinusY => Direction::PlusY,
            Direction::PlusZ => Direction::MinusZ,
            Direction::MinusZ => Direction::PlusZ,
        }
    }
}

/// Immutable cubic lattice with `side^3` sites and a periodic neighbour table.
#[derive(Debug, Clone)]
pub struct Lattice {
    side: usize,
    neighbors: Vec<[usize; N_NEIGHBORS]>,
}

impl Lattice {
    /// Build the lattice and its neighbour table.
    ///
    /// Side lengths below 2 are rejected: the wraparound would map a site onto
    /// itself.
    pub fn new(side: usize) -> Result<Self> {
        if side < 2 {
            return Err(LangevinError::InvalidSideLength(side));
        }

        let n_sites = side * side * side;
        let mut neighbors = Vec::with_capacity(n_sites);
        for index in 0..n_sites {
            let r = Self::coords_of(side, index);
            let up = |c: usize| (c + 1) % side;
            let down = |c: usize| (c + side - 1) % side;
            neighbors.push([
                Self::index_of(side, Vector3::new(up(r.x), r.y, r.z)),
                Self::index_of(side, Vector3::new(down(r.x), r.y, r.z)),
                Self::index_of(side, Vector3::new(r.x, up(r.y), r.z)),
                Self::index_of(side, Vector3::new(r.x, down(r.y), r.z)),
                Self::index_of(side, Vector3::new(r.x, r.y, up(r.z))),
                Self::index_of(side, Vector3::new(r.x, r.y, down(r.z))),
            ]);
        }

        Ok(Self { side, neighbors })
    }

    #[inline]
    fn index_of(side: usize, r: Vector3<usize>) -> usize {
        r.x + side * (r.y + side * r.z)
    }

    #[inline]
    fn coords_of(side: usize, index: usize) -> Vector3<usize> {
        Vector3::new(index % side, (index / side) % side, index / (side * side))
    }

    pub fn side(&self) -> usize {
        self.side
    }

    /// Total number of sites, `side^3`.
    pub fn n_sites(&self) -> usize {
        self.neighbors.len()
    }

    /// Linear index of the site at `r`. Coordinates must lie in `0..side`.
    pub fn index(&self, r: Vector3<usize>) -> usize {
        debug_assert!(r.iter().all(|&c| c < self.side));
        Self::index_of(self.side, r)
    }

    pub fn coords(&self, index: usize) -> Vector3<usize> {
        Self::coords_of(self.side, index)
    }

    /// The six neighbours of `site`, ordered as [`Direction::ALL`].
    #[inline]
    pub fn neighbors(&self, site: usize) -> &[usize; N_NEIGHBORS] {
        &self.neighbors[site]
    }

    #[inline]
    pub fn neighbor(&self, site: usize, dir: Direction) -> usize {
        self.neighbors[site][dir as usize]
    }
}
