//! Reading calculation input from YAML

use crate::config::Config;
use crate::integrals::{DenseIntegrals, Reference};
use color_eyre::eyre::{Result, WrapErr};
use std::fs;
use tracing::info;

pub fn load_config(path: &str) -> Result<Config> {
    info!("Reading configuration from: {}", path);
    let content = fs::read_to_string(path)
        .wrap_err_with(|| format!("Unable to read configuration file: {}", path))?;
    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config = serde_yml::from_str::<Config>(content)
        .wrap_err("Failed to parse configuration file")?
        .with_defaults();
    Ok(config)
}

/// Reference data and dense integrals described by the input
pub fn load_system(config: &Config) -> Result<(Reference, DenseIntegrals)> {
    let input = &config.integrals;
    let reference = Reference::new(
        input.nele,
        input.nirrep.unwrap_or(1),
        input.nuclear_repulsion.unwrap_or(0.0),
    )?;
    let integrals =
        DenseIntegrals::from_input(input).wrap_err("Invalid integrals in configuration file")?;
    info!(
        "System: {} orbitals, {} electrons, nuclear repulsion {:.10} Eh",
        input.norb,
        input.nele,
        reference.nuclear_repulsion
    );
    Ok((reference, integrals))
}
