//! Binary restart snapshots of the Davidson state

use color_eyre::eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Everything needed to resume a CI run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FciSnapshot {
    pub norb: usize,
    pub nelea: usize,
    pub neleb: usize,
    /// RAS partition and hole/particle limits when the vectors are RAS vectors
    pub ras: Option<([usize; 3], usize, usize)>,
    pub energies: Vec<f64>,
    /// One coefficient list per state in the storage order of the vector
    pub coefficients: Vec<Vec<f64>>,
    pub iteration: usize,
}

impl FciSnapshot {
    /// Whether the stored vectors live in the described space
    pub fn matches(
        &self,
        norb: usize,
        nelea: usize,
        neleb: usize,
        ras: Option<([usize; 3], usize, usize)>,
        ndet: usize,
    ) -> bool {
        self.norb == norb
            && self.nelea == nelea
            && self.neleb == neleb
            && self.ras == ras
            && self.coefficients.iter().all(|c| c.len() == ndet)
    }

    pub fn nstate(&self) -> usize {
        self.coefficients.len()
    }
}

pub fn write_snapshot<P: AsRef<Path>>(path: P, snapshot: &FciSnapshot) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .wrap_err_with(|| format!("Unable to create restart file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    bincode::serialize_into(&mut writer, snapshot)
        .wrap_err_with(|| format!("Failed to write restart file: {}", path.display()))?;
    Ok(())
}

pub fn read_snapshot<P: AsRef<Path>>(path: P) -> Result<FciSnapshot> {
    let path = path.as_ref();
    let file = File::open(path)
        .wrap_err_with(|| format!("Unable to open restart file: {}", path.display()))?;
    let mut reader = BufReader::new(file);
    let snapshot = bincode::deserialize_from(&mut reader)
        .wrap_err_with(|| format!("Failed to read restart file: {}", path.display()))?;
    Ok(snapshot)
}
