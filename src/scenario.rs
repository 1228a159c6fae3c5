//! Scenario presets.
//!
//! Each routine writes `flags`, `rho` and `u` through the solver's public
//! fields between construction and `run`; the engine itself never decides
//! cell types.

use crate::{lattice::CellType, solver::LbmSolver, Float};
use std::f64::consts::PI;

/// Lid-driven cavity: solid bottom and side walls, the top row drives the
/// interior as a moving lid.
pub fn lid_driven_cavity(solver: &mut LbmSolver, u0: Float) {
    let nx = solver.nx();
    let ny = solver.ny();
    for n in 0..solver.num_cells() {
        let (x, y, _) = solver.grid().index_to_position(n);
        if y == 0 || ((x == 0 || x == nx - 1) && y < ny - 1) {
            solver.flags[n] = CellType::Solid;
            solver.u[n] = [0.0, 0.0];
        } else if y == ny - 1 {
            solver.flags[n] = CellType::Inlet;
            solver.u[n] = [u0, 0.0];
        } else {
            solver.flags[n] = CellType::Fluid;
            solver.u[n] = [0.0, 0.0];
        }
        solver.rho[n] = 1.0;
    }
}

/// Taylor-Green vortex sheet on a fully periodic fluid domain.
pub fn taylor_green(solver: &mut LbmSolver, u0: Float) {
    let nx = solver.nx() as Float;
    let ny = solver.ny() as Float;
    for n in 0..solver.num_cells() {
        let (x, y, _) = solver.grid().index_to_position(n);
        let (px, py) = (x as Float, y as Float);
        solver.flags[n] = CellType::Fluid;
        solver.rho[n] = 1.0;
        solver.u[n] = [
            -u0 * (2.0 * PI * px / nx).cos() * (2.0 * PI * py / ny).sin(),
            u0 * (2.0 * PI * px / nx).sin() * (2.0 * PI * py / ny).cos(),
        ];
    }
    solver.reinitialize();
}

/// Flow past a disc: inlet column at x = 1, outlet column at x = 0, a
/// solid disc in the stream.
pub fn von_karman(solver: &mut LbmSolver, radius: usize, u0: Float) {
    let cx = solver.nx() / 4;
    let cy = solver.ny() / 2;
    for n in 0..solver.num_cells() {
        let (x, y, _) = solver.grid().index_to_position(n);
        let dx = x as Float - cx as Float;
        let dy = y as Float - cy as Float;
        let r = (dx * dx + dy * dy).sqrt();
        if x == 1 {
            solver.flags[n] = CellType::Inlet;
            solver.u[n] = [u0, 0.0];
        } else if x == 0 {
            solver.flags[n] = CellType::Outlet;
            solver.u[n] = [0.0, 0.0];
        } else if r <= radius as Float {
            solver.flags[n] = CellType::Solid;
            solver.u[n] = [0.0, 0.0];
        } else {
            solver.flags[n] = CellType::Fluid;
            solver.u[n] = [0.0, 0.0];
        }
        solver.rho[n] = 1.0;
    }
}

/// Couette flow: stationary plates at the top and bottom, a driven row
/// just below the top plate.
pub fn couette(solver: &mut LbmSolver, u0: Float) {
    let ny = solver.ny();
    for n in 0..solver.num_cells() {
        let (_, y, _) = solver.grid().index_to_position(n);
        if y == 0 || y == ny - 1 {
            solver.flags[n] = CellType::Solid;
            solver.u[n] = [0.0, 0.0];
        } else if y == ny - 2 {
            solver.flags[n] = CellType::Inlet;
            solver.u[n] = [u0, 0.0];
        } else {
            solver.flags[n] = CellType::Fluid;
            solver.u[n] = [0.0, 0.0];
        }
        solver.rho[n] = 1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, lattice::D2Q9};

    fn solver(nx: usize, ny: usize) -> LbmSolver {
        LbmSolver::new(Config::new(nx, ny, 1, 0.1)).unwrap()
    }

    #[test]
    fn cavity_tags_walls_lid_and_interior() {
        let mut s = solver(8, 8);
        lid_driven_cavity(&mut s, 0.1);

        let inlets = s.flags.iter().filter(|&&t| t == CellType::Inlet).count();
        let solids = s.flags.iter().filter(|&&t| t == CellType::Solid).count();
        assert_eq!(inlets, 8, "the whole top row is the lid");
        assert_eq!(solids, 8 + 2 * 6, "bottom row plus both side columns");

        let lid = s.grid().position_to_index(3, 7, 0);
        assert_eq!(s.u[lid], [0.1, 0.0]);
        let interior = s.grid().position_to_index(4, 4, 0);
        assert_eq!(s.flags[interior], CellType::Fluid);
    }

    #[test]
    fn taylor_green_seeds_distributions_from_the_velocity_field() {
        let mut s = solver(16, 16);
        taylor_green(&mut s, 0.05);

        let mean: Float =
            s.u.iter().map(|u| u[0] + u[1]).sum::<Float>() / s.num_cells() as Float;
        assert!(mean.abs() < 1e-12, "vortex field has zero mean, got {mean}");
        let ke: Float = s.u.iter().map(|u| u[0] * u[0] + u[1] * u[1]).sum();
        assert!(ke > 0.0);

        let n = s.grid().position_to_index(3, 5, 0);
        let cell_mass: Float = s.f[n * D2Q9::Q..(n + 1) * D2Q9::Q].iter().sum();
        assert!((cell_mass - 1.0).abs() < 1e-12);
    }

    #[test]
    fn von_karman_places_inlet_outlet_and_disc() {
        let mut s = solver(32, 16);
        von_karman(&mut s, 3, 0.05);

        assert_eq!(s.flags[s.grid().position_to_index(0, 8, 0)], CellType::Outlet);
        assert_eq!(s.flags[s.grid().position_to_index(1, 8, 0)], CellType::Inlet);
        assert_eq!(s.flags[s.grid().position_to_index(8, 8, 0)], CellType::Solid);
        assert_eq!(s.flags[s.grid().position_to_index(20, 8, 0)], CellType::Fluid);
    }

    #[test]
    fn couette_drives_the_row_below_the_top_plate() {
        let mut s = solver(8, 8);
        couette(&mut s, 0.1);

        assert_eq!(s.flags[s.grid().position_to_index(4, 0, 0)], CellType::Solid);
        assert_eq!(s.flags[s.grid().position_to_index(4, 7, 0)], CellType::Solid);
        assert_eq!(s.flags[s.grid().position_to_index(4, 6, 0)], CellType::Inlet);
        assert_eq!(s.u[s.grid().position_to_index(4, 6, 0)], [0.1, 0.0]);
    }
}
