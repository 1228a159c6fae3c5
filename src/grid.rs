use crate::lattice::D2Q9;

/// Lattice dimensions and topology.
///
/// Periodic wrap on every axis is hard-wired here; solid walls are modeled
/// by `CellType::Solid` cells, never by clipping the index range. Neighbor
/// lookups are served from a table precomputed at construction.
pub struct Grid {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
    n: usize,
    /// Neighbor indices per cell, one entry per direction 1..Q-1.
    neighbors: Vec<[usize; D2Q9::Q - 1]>,
}

impl Grid {
    pub fn new(nx: usize, ny: usize, nz: usize) -> Self {
        assert!(nx > 0 && ny > 0 && nz > 0, "lattice dimensions must be positive");
        let n = nx * ny * nz;

        let wrap = |coord: i64, max: usize| -> usize {
            coord.rem_euclid(max as i64) as usize
        };

        let mut neighbors = Vec::with_capacity(n);
        for idx in 0..n {
            let x = idx / (ny * nz);
            let y = (idx / nz) % ny;
            let z = idx % nz;
            let mut row = [0usize; D2Q9::Q - 1];
            for (i, slot) in row.iter_mut().enumerate() {
                let c = D2Q9::VELOCITIES[i + 1];
                let px = wrap(x as i64 + c[0] as i64, nx);
                let py = wrap(y as i64 + c[1] as i64, ny);
                *slot = px * (ny * nz) + py * nz + z;
            }
            neighbors.push(row);
        }

        Self { nx, ny, nz, n, neighbors }
    }

    /// Total cell count.
    #[inline]
    pub fn len(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Flat index -> `(x, y, z)`. Total on valid input, no bounds checks.
    #[inline]
    pub fn index_to_position(&self, n: usize) -> (usize, usize, usize) {
        (n / (self.ny * self.nz), (n / self.nz) % self.ny, n % self.nz)
    }

    /// `(x, y, z)` -> flat index. Total on valid input, no bounds checks.
    #[inline]
    pub fn position_to_index(&self, x: usize, y: usize, z: usize) -> usize {
        x * (self.ny * self.nz) + y * self.nz + z
    }

    /// The Q-1 periodic neighbors of `n`, ordered to match directions 1..Q-1.
    #[inline]
    pub fn neighbors(&self, n: usize) -> &[usize; D2Q9::Q - 1] {
        &self.neighbors[n]
    }

    /// The direction `i` with `nn = n + c[i]` modulo the lattice.
    ///
    /// Panics if the two cells are not lattice-adjacent; that is a logic
    /// error in the caller, not a recoverable condition.
    pub fn direction_index(&self, n: usize, nn: usize) -> usize {
        for (i, &candidate) in self.neighbors[n].iter().enumerate() {
            if candidate == nn {
                return i + 1;
            }
        }
        panic!("cells {n} and {nn} are not lattice-adjacent");
    }
}
