use anyhow::Result;
use lbm2d::{scenario, Config, LbmSolver};
use log::info;
use std::env;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 3 {
        eprintln!("Usage: {} <config.json> <scenario>", args[0]);
        eprintln!("  config.json - JSON file with domain, physics, simulation and output sections");
        eprintln!("  scenario    - one of: cavity, taylor-green, von-karman, couette");
        std::process::exit(1);
    }

    let config = Config::from_file(&args[1])?;
    info!("loaded configuration from {}", args[1]);
    info!(
        "  domain: {}x{}x{}",
        config.domain.nx, config.domain.ny, config.domain.nz
    );
    info!("  viscosity: {}", config.resolve_viscosity()?);
    info!("  timesteps: {}", config.simulation.timesteps);

    let u0 = config.physics.reference_velocity.unwrap_or(0.1);
    let mut solver = LbmSolver::new(config.clone())?;

    match args[2].as_str() {
        "cavity" => scenario::lid_driven_cavity(&mut solver, u0),
        "taylor-green" => scenario::taylor_green(&mut solver, u0),
        "von-karman" => {
            let radius = (solver.ny() / 8).max(1);
            scenario::von_karman(&mut solver, radius, u0);
        }
        "couette" => scenario::couette(&mut solver, u0),
        other => {
            eprintln!("Unknown scenario: {other}");
            eprintln!("Expected one of: cavity, taylor-green, von-karman, couette");
            std::process::exit(1);
        }
    }

    if let Some(every) = config.output.export_every {
        solver.set_export_every(every);
    }

    solver.run(config.simulation.timesteps)?;
    info!(
        "simulation completed; snapshots in {}/",
        config.output.directory
    );

    Ok(())
}
