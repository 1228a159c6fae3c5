//! Decaying Taylor-Green vortex on a periodic domain.
//!
//! Run with: cargo run --release --example taylor_green

use anyhow::Result;
use lbm2d::{scenario, Config, Float, LbmSolver, ThreadPolicy};

fn kinetic_energy(solver: &LbmSolver) -> Float {
    solver.u.iter().map(|u| u[0] * u[0] + u[1] * u[1]).sum()
}

fn main() -> Result<()> {
    env_logger::init();

    let config = Config::new(128, 128, 1, 0.0314).with_threads(ThreadPolicy::Auto);
    let mut solver = LbmSolver::new(config)?;
    scenario::taylor_green(&mut solver, 0.1);

    let initial = kinetic_energy(&solver);
    solver.set_export_every(50);
    solver.run(1000)?;
    let remaining = kinetic_energy(&solver);

    println!("kinetic energy: {initial:.6} -> {remaining:.6}");
    println!("decay factor: {:.4}", remaining / initial);
    println!("snapshots written to exports/");

    Ok(())
}
