use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use rayon::prelude::*;
use std::mem;

use crate::{
    config::{Config, Stencil},
    grid::Grid,
    lattice::{equilibrium, CellType, D2Q9},
    output::CsvWriter,
    Float,
};

/// Per-cell boundary callback: `(engine, n, x, y, z)`.
pub type BoundaryHook = Box<dyn Fn(&mut LbmSolver, usize, usize, usize, usize)>;

/// D2Q9 lattice Boltzmann engine.
///
/// Owns the distribution field and advances it in unit time steps, each
/// step running collision, boundary conditions and streaming in that
/// order. Scenario code populates `flags`, `rho` and `u` between
/// construction and `run`; the distributions are derived state.
pub struct LbmSolver {
    config: Config,
    grid: Grid,
    nu: Float,
    tau: Float,

    /// Distribution functions, flat layout `[n * Q + i]`.
    pub f: Vec<Float>,
    /// Shadow distributions; the write target of boundary and streaming,
    /// committed by swapping handles with `f`.
    pub f_temp: Vec<Float>,
    /// Macroscopic density per cell.
    pub rho: Vec<Float>,
    /// Macroscopic velocity per cell.
    pub u: Vec<[Float; 2]>,
    /// Cell classification per cell.
    pub flags: Vec<CellType>,

    step: usize,
    timesteps: usize,
    export_every: Option<usize>,
    frame: usize,
    hook: Option<BoundaryHook>,
    pool: rayon::ThreadPool,
    writer: CsvWriter,
}

impl LbmSolver {
    pub fn new(config: Config) -> Result<Self> {
        let nu = config.resolve_viscosity()?;
        let tau = 3.0 * nu + 0.5;
        let grid = Grid::new(config.domain.nx, config.domain.ny, config.domain.nz);
        let cells = grid.len();

        info!(
            "initializing solver: domain {}x{}x{} ({} cells), nu = {}, tau = {:.4}",
            grid.nx, grid.ny, grid.nz, cells, nu, tau
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.simulation.threads.num_threads())
            .build()?;
        let writer = CsvWriter::new(config.output.directory.clone());

        let mut solver = Self {
            grid,
            nu,
            tau,
            f: vec![0.0; cells * D2Q9::Q],
            f_temp: vec![0.0; cells * D2Q9::Q],
            rho: vec![1.0; cells],
            u: vec![[0.0; 2]; cells],
            flags: vec![CellType::Fluid; cells],
            step: 0,
            timesteps: 0,
            export_every: None,
            frame: 0,
            hook: None,
            pool,
            writer,
            config,
        };
        solver.start();
        Ok(solver)
    }

    fn start(&mut self) {
        print_banner();
        info!(
            "starting simulation with {} worker thread(s)",
            self.pool.current_num_threads()
        );
        self.reinitialize();
        self.validate();
    }

    /// Seed every non-solid cell's distributions with the equilibrium of
    /// its current density and velocity. `start` runs this once; scenarios
    /// that prescribe an initial velocity field call it again before `run`.
    pub fn reinitialize(&mut self) {
        let Self {
            pool, f, rho, u, flags, ..
        } = self;
        pool.install(|| {
            f.par_chunks_mut(D2Q9::Q)
                .zip(flags.par_iter())
                .zip(rho.par_iter())
                .zip(u.par_iter())
                .for_each(|(((f_n, flag), rho_n), u_n)| {
                    if *flag == CellType::Solid {
                        return;
                    }
                    f_n.copy_from_slice(&equilibrium(*rho_n, *u_n));
                });
        });
    }

    fn validate(&self) {
        if self.config.simulation.stencil == Stencil::D2Q9 && self.grid.nz != 1 {
            error!(
                "D2Q9 requires nz = 1, got {}; results will be undefined",
                self.grid.nz
            );
        }
        if self.nu < 0.0 {
            error!("kinematic viscosity is negative: {}", self.nu);
        } else if self.nu >= 1.0 {
            warn!(
                "kinematic viscosity {} is >= 1.0; expect severe instability",
                self.nu
            );
        } else if self.nu >= 0.5 {
            warn!(
                "kinematic viscosity {} is >= 0.5; the simulation may be unstable",
                self.nu
            );
        }
    }

    /// Advance the lattice by `timesteps` unit time steps.
    ///
    /// Continues from the current state; the step counter and progress
    /// baseline reset per call.
    pub fn run(&mut self, timesteps: usize) -> Result<()> {
        std::fs::create_dir_all(self.writer.directory())?;
        self.timesteps = timesteps;
        self.step = 0;
        info!("running for {} timesteps", timesteps);

        let progress = ProgressBar::new(timesteps as u64);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})")
                .unwrap()
                .progress_chars("#>-"),
        );

        while self.step < self.timesteps {
            self.step += 1;
            self.evolve();
            progress.set_position(self.step as u64);
        }
        progress.finish();

        Ok(())
    }

    /// One time step: collision, boundary conditions, streaming, and the
    /// export check, in strict order.
    fn evolve(&mut self) {
        self.collision();
        self.boundary_conditions();
        self.streaming();
        self.export_if_due();
    }

    /// BGK collision: recompute moments and relax every direction toward
    /// the local equilibrium. Cell-local, in place.
    fn collision(&mut self) {
        let omega = 1.0 / self.tau;
        let Self {
            pool, f, rho, u, flags, ..
        } = self;
        pool.install(|| {
            f.par_chunks_mut(D2Q9::Q)
                .zip(rho.par_iter_mut())
                .zip(u.par_iter_mut())
                .zip(flags.par_iter())
                .enumerate()
                .for_each(|(n, (((f_n, rho_n), u_n), flag))| {
                    if matches!(flag, CellType::Solid | CellType::Inlet | CellType::Outlet) {
                        return;
                    }

                    let mut density = 0.0;
                    let mut momentum = [0.0; 2];
                    for i in 0..D2Q9::Q {
                        let c = D2Q9::VELOCITIES[i];
                        density += f_n[i];
                        momentum[0] += f_n[i] * c[0] as Float;
                        momentum[1] += f_n[i] * c[1] as Float;
                    }
                    assert!(
                        density > 0.0,
                        "non-positive density {density} at cell {n} during moment computation"
                    );
                    let velocity = [momentum[0] / density, momentum[1] / density];
                    *rho_n = density;
                    *u_n = velocity;

                    let f_eq = equilibrium(density, velocity);
                    for i in 0..D2Q9::Q {
                        f_n[i] = (1.0 - omega) * f_n[i] + omega * f_eq[i];
                    }
                });
        });
    }

    /// Apply the user hook, then the per-type phase rules into the shadow
    /// buffer, then commit.
    ///
    /// The sweep is destination-centric: each cell derives its own shadow
    /// value (own-flag rule first, else bounce-back reflection when a
    /// neighbor is solid, else an unchanged copy), so writes stay disjoint
    /// across the parallel sweep.
    fn boundary_conditions(&mut self) {
        self.apply_hook();

        let Self {
            pool,
            grid,
            f,
            f_temp,
            rho,
            u,
            flags,
            ..
        } = self;
        let f: &[Float] = f;
        let rho: &[Float] = rho;
        let u: &[[Float; 2]] = u;
        let flags: &[CellType] = flags;
        let grid: &Grid = grid;

        pool.install(|| {
            f_temp
                .par_chunks_mut(D2Q9::Q)
                .enumerate()
                .for_each(|(n, out)| {
                    let own = &f[n * D2Q9::Q..(n + 1) * D2Q9::Q];
                    match flags[n] {
                        CellType::Inlet => {
                            out.copy_from_slice(&equilibrium(rho[n], u[n]));
                        }
                        CellType::Outlet => {
                            let (x, y, z) = grid.index_to_position(n);
                            if x > 0 {
                                let upstream = grid.position_to_index(x - 1, y, z);
                                out.copy_from_slice(
                                    &f[upstream * D2Q9::Q..(upstream + 1) * D2Q9::Q],
                                );
                            } else {
                                out.copy_from_slice(own);
                            }
                        }
                        CellType::Solid => out.copy_from_slice(own),
                        _ => {
                            let wall_adjacent = grid
                                .neighbors(n)
                                .iter()
                                .any(|&nn| flags[nn] == CellType::Solid);
                            if wall_adjacent {
                                for i in 0..D2Q9::Q {
                                    out[i] = own[D2Q9::OPPOSITE[i]];
                                }
                            } else {
                                out.copy_from_slice(own);
                            }
                        }
                    }
                });
        });

        mem::swap(&mut self.f, &mut self.f_temp);
    }

    /// Streaming in pull form: each cell gathers direction `i` from its
    /// neighbor opposite to `i`, retaining the value when the source does
    /// not stream. Equivalent to pushing each population along its own
    /// direction, with writes disjoint per destination cell.
    fn streaming(&mut self) {
        let Self {
            pool,
            grid,
            f,
            f_temp,
            flags,
            ..
        } = self;
        let f: &[Float] = f;
        let flags: &[CellType] = flags;
        let grid: &Grid = grid;

        pool.install(|| {
            f_temp
                .par_chunks_mut(D2Q9::Q)
                .enumerate()
                .for_each(|(n, out)| {
                    // Rest population never streams.
                    out[0] = f[n * D2Q9::Q];
                    for i in 1..D2Q9::Q {
                        let src = grid.neighbors(n)[D2Q9::OPPOSITE[i] - 1];
                        out[i] = if matches!(flags[src], CellType::Solid | CellType::Outlet) {
                            f[n * D2Q9::Q + i]
                        } else {
                            f[src * D2Q9::Q + i]
                        };
                    }
                });
        });

        mem::swap(&mut self.f, &mut self.f_temp);
    }

    /// Register the per-step boundary hook, or re-apply it on demand.
    ///
    /// The first call stores the hook; the engine then invokes it for
    /// every cell at the start of each boundary phase. Later calls invoke
    /// the *stored* hook for every cell immediately, which re-applies
    /// time-independent conditions.
    pub fn apply<F>(&mut self, hook: F)
    where
        F: Fn(&mut LbmSolver, usize, usize, usize, usize) + 'static,
    {
        if self.hook.is_none() {
            self.hook = Some(Box::new(hook));
        } else {
            self.apply_hook();
        }
    }

    fn apply_hook(&mut self) {
        if let Some(hook) = self.hook.take() {
            for n in 0..self.grid.len() {
                let (x, y, z) = self.grid.index_to_position(n);
                hook(self, n, x, y, z);
            }
            self.hook = Some(hook);
        }
    }

    /// Arm snapshot export: one frame at step 1 and at every multiple of
    /// `interval` thereafter.
    pub fn set_export_every(&mut self, interval: usize) {
        if interval == 0 {
            warn!("export interval must be positive; export stays disabled");
            return;
        }
        self.export_every = Some(interval);
    }

    fn export_if_due(&mut self) {
        match self.export_every {
            Some(interval) => {
                if self.step == 1 || self.step % interval == 0 {
                    self.frame += 1;
                    let filename = format!("data_{}.csv", self.frame);
                    if let Err(err) = self.writer.write(&filename, &self.grid, &self.rho, &self.u)
                    {
                        error!("failed to write snapshot {filename}: {err:#}");
                    }
                }
            }
            None => {
                if self.timesteps > 0 && self.step == self.timesteps - 1 {
                    if let Err(err) = self.writer.write("data.csv", &self.grid, &self.rho, &self.u)
                    {
                        error!("failed to write snapshot data.csv: {err:#}");
                    }
                }
            }
        }
    }

    pub fn nx(&self) -> usize {
        self.grid.nx
    }

    pub fn ny(&self) -> usize {
        self.grid.ny
    }

    pub fn nz(&self) -> usize {
        self.grid.nz
    }

    pub fn num_cells(&self) -> usize {
        self.grid.len()
    }

    pub fn nu(&self) -> Float {
        self.nu
    }

    pub fn tau(&self) -> Float {
        self.tau
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

fn print_banner() {
    println!("------------------------------------------------");
    println!(" lbm2d v{} - D2Q9 lattice Boltzmann solver", env!("CARGO_PKG_VERSION"));
    println!("------------------------------------------------");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solver(nx: usize, ny: usize, nu: Float) -> LbmSolver {
        LbmSolver::new(Config::new(nx, ny, 1, nu)).unwrap()
    }

    #[test]
    fn collision_preserves_cell_mass() {
        let mut s = solver(8, 8, 0.1);
        for n in 0..s.num_cells() {
            s.f[n * D2Q9::Q + 1] += 0.01;
            s.f[n * D2Q9::Q + 3] += 0.02;
        }
        let mass_before: Float = s.f.iter().sum();

        s.collision();

        let mass_after: Float = s.f.iter().sum();
        assert!((mass_before - mass_after).abs() < 1e-12 * mass_before);
        for n in 0..s.num_cells() {
            let cell_mass: Float = s.f[n * D2Q9::Q..(n + 1) * D2Q9::Q].iter().sum();
            assert!(
                (cell_mass - s.rho[n]).abs() < 1e-12,
                "cell {n}: mass {cell_mass} vs rho {}",
                s.rho[n]
            );
        }
    }

    #[test]
    fn equilibrium_is_a_collision_fixed_point() {
        let mut s = solver(6, 6, 0.1);
        for n in 0..s.num_cells() {
            s.rho[n] = 1.1;
            s.u[n] = [0.04, -0.02];
        }
        s.reinitialize();
        let before = s.f.clone();

        s.collision();

        for (n, (a, b)) in before.iter().zip(s.f.iter()).enumerate() {
            assert!((a - b).abs() < 1e-12, "entry {n}: {a} vs {b}");
        }
    }

    #[test]
    fn streaming_round_trips_on_a_uniform_periodic_lattice() {
        let mut s = solver(8, 8, 0.1);
        let before = s.f.clone();

        for _ in 0..5 {
            s.streaming();
        }

        for (n, (a, b)) in before.iter().zip(s.f.iter()).enumerate() {
            assert!((a - b).abs() < 1e-15, "entry {n}: {a} vs {b}");
        }
    }

    #[test]
    fn streaming_sends_each_population_to_the_neighbor_in_its_direction() {
        let (nx, ny) = (4usize, 3usize);
        let mut s = solver(nx, ny, 0.1);
        for n in 0..s.num_cells() {
            for i in 0..D2Q9::Q {
                s.f[n * D2Q9::Q + i] = (n * 10 + i) as Float;
            }
        }

        s.streaming();

        for n in 0..s.num_cells() {
            let (x, y, _) = s.grid().index_to_position(n);
            assert_eq!(s.f[n * D2Q9::Q], (n * 10) as Float, "rest value left cell {n}");
            for i in 1..D2Q9::Q {
                let c = D2Q9::VELOCITIES[i];
                let dest_x = (x as i64 + c[0] as i64).rem_euclid(nx as i64) as usize;
                let dest_y = (y as i64 + c[1] as i64).rem_euclid(ny as i64) as usize;
                let dest = s.grid().position_to_index(dest_x, dest_y, 0);
                assert_eq!(
                    s.f[dest * D2Q9::Q + i],
                    (n * 10 + i) as Float,
                    "direction {i} from cell {n} must land at cell {dest}"
                );
            }
        }
    }

    #[test]
    fn rest_population_never_streams() {
        let mut s = solver(5, 4, 0.1);
        for n in 0..s.num_cells() {
            s.f[n * D2Q9::Q] = n as Float;
        }

        s.streaming();

        for n in 0..s.num_cells() {
            assert_eq!(s.f[n * D2Q9::Q], n as Float);
        }
    }

    #[test]
    fn inlet_cells_reset_to_their_prescribed_equilibrium() {
        let mut s = solver(4, 4, 0.1);
        let n = s.grid().position_to_index(2, 2, 0);
        s.flags[n] = CellType::Inlet;
        s.rho[n] = 1.05;
        s.u[n] = [0.1, 0.0];
        for i in 0..D2Q9::Q {
            s.f[n * D2Q9::Q + i] = 0.3;
        }

        s.boundary_conditions();

        let expected = equilibrium(1.05, [0.1, 0.0]);
        for i in 0..D2Q9::Q {
            assert!((s.f[n * D2Q9::Q + i] - expected[i]).abs() < 1e-15);
        }
    }

    #[test]
    fn outlet_copies_upstream_and_skips_the_domain_edge() {
        let mut s = solver(4, 3, 0.1);
        let edge = s.grid().position_to_index(0, 1, 0);
        let interior = s.grid().position_to_index(2, 1, 0);
        let upstream = s.grid().position_to_index(1, 1, 0);
        s.flags[edge] = CellType::Outlet;
        s.flags[interior] = CellType::Outlet;
        for i in 0..D2Q9::Q {
            s.f[upstream * D2Q9::Q + i] = 0.111 + i as Float;
            s.f[interior * D2Q9::Q + i] = 9.0;
            s.f[edge * D2Q9::Q + i] = 7.0;
        }

        s.boundary_conditions();

        for i in 0..D2Q9::Q {
            assert_eq!(s.f[interior * D2Q9::Q + i], 0.111 + i as Float);
            assert_eq!(s.f[edge * D2Q9::Q + i], 7.0);
        }
    }

    #[test]
    fn bounce_back_reflects_cells_next_to_a_wall() {
        let mut s = solver(6, 6, 0.1);
        let wall = s.grid().position_to_index(3, 3, 0);
        s.flags[wall] = CellType::Solid;
        let fluid = s.grid().position_to_index(3, 2, 0);
        for i in 0..D2Q9::Q {
            s.f[fluid * D2Q9::Q + i] = 0.1 + 0.01 * i as Float;
        }

        s.boundary_conditions();

        for i in 0..D2Q9::Q {
            let reflected = 0.1 + 0.01 * D2Q9::OPPOSITE[i] as Float;
            assert!((s.f[fluid * D2Q9::Q + i] - reflected).abs() < 1e-15);
        }
    }

    #[test]
    fn hook_registration_stores_then_reapplies() {
        let mut s = solver(4, 4, 0.1);
        s.apply(|solver, n, _x, _y, _z| {
            solver.rho[n] = 2.0;
        });
        assert!(
            s.rho.iter().all(|&r| (r - 1.0).abs() < 1e-15),
            "registration alone must not touch the fields"
        );

        s.apply(|_, _, _, _, _| unreachable!("the stored hook wins"));
        assert!(s.rho.iter().all(|&r| (r - 2.0).abs() < 1e-15));
    }
}
