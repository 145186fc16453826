//! Integration tests driving the library from the YAML examples
//!
//! These tests read the files in `example/`, resolve the options the way the
//! binary does and compare against closed-form or cross-checked energies.

use std::path::PathBuf;

#[cfg(test)]
mod integration_tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use clap::Parser;
    use fci::app::{resolve_params, run_fci, run_ras};
    use fci::config::Args;
    use fci::io::{load_config, load_system};
    use fci::FciStatus;

    /// Helper function to get the path to example files
    fn example_path(filename: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("example")
            .join(filename)
    }

    fn args_for(path: &PathBuf, extra: &[&str]) -> Args {
        let mut argv = vec!["fci".to_string(), "--config-file".to_string()];
        argv.push(path.to_string_lossy().into_owned());
        argv.extend(extra.iter().map(|s| s.to_string()));
        Args::parse_from(argv)
    }

    #[test]
    fn test_hubbard_dimer_from_yaml() {
        let path = example_path("hubbard2.yaml");
        let config = load_config(path.to_str().unwrap()).unwrap();
        assert!(!config.is_ras_enabled());
        let (reference, integrals) = load_system(&config).unwrap();
        let params = resolve_params(&args_for(&path, &[]), &config);

        let fci = run_fci(&reference, &integrals, params).unwrap();
        assert_eq!(fci.status(), FciStatus::Converged);
        let exact = 2.0 - 8.0_f64.sqrt();
        assert_abs_diff_eq!(fci.energies()[0], exact, epsilon = 1e-9);

        let rdm1 = fci.rdm1(0);
        assert_abs_diff_eq!(rdm1.element(&[0, 0]), 1.0, epsilon = 1e-8);
        assert_abs_diff_eq!(rdm1.element(&[1, 1]), 1.0, epsilon = 1e-8);
    }

    #[test]
    fn test_command_line_overrides() {
        let path = example_path("hubbard2.yaml");
        let config = load_config(path.to_str().unwrap()).unwrap();
        let (reference, integrals) = load_system(&config).unwrap();
        let params = resolve_params(&args_for(&path, &["--nspin", "2", "--max-iter", "5"]), &config);
        assert_eq!(params.nspin(), 2);
        assert_eq!(params.max_iter(), 5);

        // the only Ms = 1 determinant has zero energy in the Hubbard dimer
        let fci = run_fci(&reference, &integrals, params).unwrap();
        assert_abs_diff_eq!(fci.energies()[0], 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_ras_ring_matches_fci() {
        let path = example_path("hubbard4_ras.yaml");
        let config = load_config(path.to_str().unwrap()).unwrap();
        assert!(config.is_ras_enabled());
        let (reference, integrals) = load_system(&config).unwrap();
        let params = resolve_params(&args_for(&path, &[]), &config);

        let ras = config.ras.clone().unwrap();
        let ci = run_ras(&reference, &integrals, params.clone(), ras).unwrap();
        let fci = run_fci(&reference, &integrals, params).unwrap();
        assert!(ci.status().is_converged());
        assert!(fci.status().is_converged());
        assert_abs_diff_eq!(ci.energies()[0], fci.energies()[0], epsilon = 1e-7);
        assert!(ci.rdm1(0).max_difference(&fci.rdm1(0)) < 1e-5);
    }

    #[test]
    fn test_invalid_configuration_is_reported() {
        let yaml = "integrals:\n  norb: 2\n  nele: 2\n  nirrep: 2\n  h1: [[0.0, 0.0], [0.0, 0.0]]\n  eri: []\n";
        let config = fci::io::parse_config(yaml).unwrap();
        assert!(load_system(&config).is_err());

        let yaml = "integrals:\n  norb: 2\n  nele: 2\n  h1: [[0.0, 0.0], [0.0, 0.0]]\n  eri: [[0, 0, 5, 0, 1.0]]\n";
        let config = fci::io::parse_config(yaml).unwrap();
        assert!(load_system(&config).is_err());
    }
}
