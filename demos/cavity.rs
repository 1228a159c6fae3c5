//! Lid-driven cavity at Re = 100 with periodic CSV snapshots.
//!
//! Run with: cargo run --release --example cavity

use anyhow::Result;
use lbm2d::config::nu_from_reynolds;
use lbm2d::{scenario, CellType, Config, Float, LbmSolver, ThreadPolicy};

fn main() -> Result<()> {
    env_logger::init();

    let u0 = 0.1;
    let nu = nu_from_reynolds(100.0, u0, 100.0);
    let config = Config::new(100, 100, 1, nu).with_threads(ThreadPolicy::Auto);

    let mut solver = LbmSolver::new(config)?;
    scenario::lid_driven_cavity(&mut solver, u0);
    solver.set_export_every(100);
    solver.run(1000)?;

    let mut max_speed: Float = 0.0;
    let mut min_rho = Float::INFINITY;
    let mut max_rho = Float::NEG_INFINITY;
    for n in 0..solver.num_cells() {
        if solver.flags[n] == CellType::Solid {
            continue;
        }
        let speed = (solver.u[n][0].powi(2) + solver.u[n][1].powi(2)).sqrt();
        max_speed = max_speed.max(speed);
        min_rho = min_rho.min(solver.rho[n]);
        max_rho = max_rho.max(solver.rho[n]);
    }

    println!("max |u| = {max_speed:.6}");
    println!("rho in [{min_rho:.6}, {max_rho:.6}]");
    println!("snapshots written to exports/");

    Ok(())
}
