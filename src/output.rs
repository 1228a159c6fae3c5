use anyhow::Result;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use crate::{grid::Grid, Float};

/// CSV snapshot writer.
///
/// One row per cell in flat-index order: position, density, velocity,
/// fixed 15-digit precision, comma-tab separated.
pub struct CsvWriter {
    directory: PathBuf,
}

impl CsvWriter {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &PathBuf {
        &self.directory
    }

    pub fn write(
        &self,
        filename: &str,
        grid: &Grid,
        rho: &[Float],
        u: &[[Float; 2]],
    ) -> Result<()> {
        let path = self.directory.join(filename);
        let file = File::create(&path)?;
        let mut writer = BufWriter::new(file);

        writeln!(writer, "x,\ty,\tz,\trho,\tu_x,\tu_y")?;
        for n in 0..grid.len() {
            let (x, y, z) = grid.index_to_position(n);
            writeln!(
                writer,
                "{},\t{},\t{},\t{:.15},\t{:.15},\t{:.15}",
                x, y, z, rho[n], u[n][0], u[n][1]
            )?;
        }
        writer.flush()?;

        Ok(())
    }
}
