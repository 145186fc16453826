//! Tests for input parsing and restart snapshots

#[cfg(test)]
mod tests {
    use super::super::{load_system, parse_config, read_snapshot, write_snapshot, FciSnapshot};

    const DIMER: &str = r#"
integrals:
  norb: 2
  nele: 2
  nuclear_repulsion: 0.5
  h1:
    - [0.0, -1.0]
    - [-1.0, 0.0]
  eri:
    - [0, 0, 0, 0, 4.0]
    - [1, 1, 1, 1, 4.0]
fci:
  nstate: 2
"#;

    fn snapshot() -> FciSnapshot {
        FciSnapshot {
            norb: 2,
            nelea: 1,
            neleb: 1,
            ras: Some(([1, 0, 1], 1, 1)),
            energies: vec![-0.82, 0.0],
            coefficients: vec![vec![0.1, 0.7, 0.7, 0.1], vec![0.0, 0.5, -0.5, 0.0]],
            iteration: 7,
        }
    }

    #[test]
    fn test_snapshot_survives_disk() {
        let path = std::env::temp_dir().join(format!("fci_io_snapshot_{}.bin", std::process::id()));
        let written = snapshot();
        write_snapshot(&path, &written).unwrap();
        let read = read_snapshot(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(read, written);
        assert_eq!(read.nstate(), 2);
    }

    #[test]
    fn test_snapshot_matches_only_its_space() {
        let s = snapshot();
        let space = Some(([1, 0, 1], 1, 1));
        assert!(s.matches(2, 1, 1, space, 4));
        assert!(!s.matches(3, 1, 1, space, 4));
        assert!(!s.matches(2, 2, 0, space, 4));
        assert!(!s.matches(2, 1, 1, None, 4));
        assert!(!s.matches(2, 1, 1, Some(([1, 0, 1], 0, 0)), 4));
        assert!(!s.matches(2, 1, 1, space, 3));
    }

    #[test]
    fn test_missing_snapshot_is_an_error() {
        let path = std::env::temp_dir().join("fci_io_snapshot_that_does_not_exist.bin");
        assert!(read_snapshot(&path).is_err());
    }

    #[test]
    fn test_parse_config_fills_defaults() {
        let config = parse_config(DIMER).unwrap();
        let params = config.fci_params();
        assert_eq!(params.nstate(), 2);
        assert_eq!(params.nguess(), 2);
        assert_eq!(params.nspin(), 0);
        assert!(!config.is_ras_enabled());

        let (reference, _) = load_system(&config).unwrap();
        assert_eq!(reference.nele(), 2);
        assert_eq!(reference.nuclear_repulsion, 0.5);
    }

    #[test]
    fn test_malformed_yaml_is_rejected() {
        assert!(parse_config("integrals: [1, 2").is_err());
        assert!(parse_config("fci:\n  nstate: 1\n").is_err());
    }
}
