use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use crate::Float;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub domain: DomainConfig,
    pub physics: PhysicsConfig,
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainConfig {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
}

/// Either `viscosity` directly, or `reynolds_number` plus
/// `reference_velocity` with the domain height as reference length.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhysicsConfig {
    pub viscosity: Option<Float>,
    pub reynolds_number: Option<Float>,
    pub reference_velocity: Option<Float>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub timesteps: usize,
    #[serde(default)]
    pub stencil: Stencil,
    #[serde(default)]
    pub collision: CollisionOperator,
    #[serde(default)]
    pub kind: SimulationKind,
    #[serde(default)]
    pub threads: ThreadPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub directory: String,
    #[serde(default)]
    pub export_every: Option<usize>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            export_every: None,
        }
    }
}

fn default_output_dir() -> String {
    "exports".to_string()
}

/// Velocity stencil. Only the nine-velocity two-dimensional set is
/// implemented; the enum keeps the choice explicit at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stencil {
    #[default]
    D2Q9,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionOperator {
    #[default]
    Bgk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulationKind {
    #[default]
    Fluid,
}

/// Worker-thread count for the per-phase parallel sweeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreadPolicy {
    /// Single-threaded; the fallback when nothing is configured.
    #[default]
    Serial,
    /// The platform's maximum hardware parallelism.
    Auto,
    /// A fixed worker count.
    Fixed(usize),
}

impl ThreadPolicy {
    /// Thread count for `rayon::ThreadPoolBuilder` (0 selects the default).
    pub fn num_threads(&self) -> usize {
        match self {
            ThreadPolicy::Serial => 1,
            ThreadPolicy::Auto => 0,
            ThreadPolicy::Fixed(count) => *count,
        }
    }
}

impl Config {
    /// Minimal configuration for the given lattice and viscosity.
    pub fn new(nx: usize, ny: usize, nz: usize, viscosity: Float) -> Self {
        Self {
            domain: DomainConfig { nx, ny, nz },
            physics: PhysicsConfig {
                viscosity: Some(viscosity),
                ..PhysicsConfig::default()
            },
            simulation: SimulationConfig::default(),
            output: OutputConfig::default(),
        }
    }

    pub fn with_threads(mut self, threads: ThreadPolicy) -> Self {
        self.simulation.threads = threads;
        self
    }

    pub fn with_output_dir(mut self, directory: impl Into<String>) -> Self {
        self.output.directory = directory.into();
        self
    }

    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Kinematic viscosity, derived from the Reynolds number when not given
    /// directly (reference length is the domain height).
    pub fn resolve_viscosity(&self) -> Result<Float> {
        if let Some(nu) = self.physics.viscosity {
            return Ok(nu);
        }
        match (self.physics.reynolds_number, self.physics.reference_velocity) {
            (Some(re), Some(u)) => Ok(nu_from_reynolds(re, u, self.domain.ny as Float)),
            _ => bail!(
                "physics configuration needs either viscosity or \
                 reynolds_number together with reference_velocity"
            ),
        }
    }

    /// Relaxation time in lattice units (dt = dx = 1): `tau = 3 nu + 1/2`.
    pub fn tau(&self) -> Result<Float> {
        Ok(3.0 * self.resolve_viscosity()? + 0.5)
    }
}

/// `nu = u L / Re`
pub fn nu_from_reynolds(re: Float, u: Float, l: Float) -> Float {
    u * l / re
}
