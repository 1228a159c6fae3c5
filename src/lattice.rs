use crate::Float;

/// D2Q9 Lattice-Boltzmann model constants
pub struct D2Q9;

impl D2Q9 {
    /// Number of discrete velocities
    pub const Q: usize = 9;

    /// Spatial dimensions
    pub const D: usize = 2;

    /// Discrete velocities: rest, four axial, four diagonal
    pub const VELOCITIES: [[i32; 2]; 9] = [
        // Rest
        [0, 0],
        // Axial (1-4)
        [1, 0], [0, 1], [-1, 0], [0, -1],
        // Diagonal (5-8)
        [1, 1], [-1, 1], [-1, -1], [1, -1],
    ];

    /// Weights for each direction
    pub const WEIGHTS: [Float; 9] = [
        // Rest
        4.0 / 9.0,
        // Axial (1-4)
        1.0 / 9.0, 1.0 / 9.0, 1.0 / 9.0, 1.0 / 9.0,
        // Diagonal (5-8)
        1.0 / 36.0, 1.0 / 36.0, 1.0 / 36.0, 1.0 / 36.0,
    ];

    /// Opposite directions for bounce-back boundary conditions
    pub const OPPOSITE: [usize; 9] = [0, 3, 4, 1, 2, 7, 8, 5, 6];

    /// Speed of sound squared
    pub const CS2: Float = 1.0 / 3.0;

    /// Direction whose velocity vector is the negation of direction `i`
    #[inline]
    pub fn opposite(i: usize) -> usize {
        Self::OPPOSITE[i]
    }
}

/// Cell classification. Exactly one tag per cell during a step.
///
/// `Interface`, `Gas`, `Temperature` and `Plasma` are reserved for
/// simulation modes outside the fluid core; no phase rule matches them yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellType {
    #[default]
    Fluid,
    Solid,
    Inlet,
    Outlet,
    Interface,
    Gas,
    Temperature,
    Plasma,
}

/// Equilibrium distribution for a cell at density `rho` and velocity `u`:
///
/// `f_eq[i] = w[i] * rho * (1 + 3(u.c_i) + 4.5(u.c_i)^2 - 1.5(u.u))`
///
/// Returns the full Q-vector by value; the hot path stays allocation-free.
#[inline]
pub fn equilibrium(rho: Float, u: [Float; 2]) -> [Float; D2Q9::Q] {
    let u_sqr = u[0] * u[0] + u[1] * u[1];
    let mut f_eq = [0.0; D2Q9::Q];
    for i in 0..D2Q9::Q {
        let c = D2Q9::VELOCITIES[i];
        let cu = c[0] as Float * u[0] + c[1] as Float * u[1];
        f_eq[i] = D2Q9::WEIGHTS[i] * rho * (1.0 + 3.0 * cu + 4.5 * cu * cu - 1.5 * u_sqr);
    }
    f_eq
}
