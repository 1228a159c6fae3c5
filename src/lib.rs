pub mod config;
pub mod grid;
pub mod lattice;
pub mod output;
pub mod scenario;
pub mod solver;

pub use config::{Config, ThreadPolicy};
pub use grid::Grid;
pub use lattice::{equilibrium, CellType, D2Q9};
pub use output::CsvWriter;
pub use solver::LbmSolver;

pub type Float = f64;
