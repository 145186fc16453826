//! Tests for determinant and string spaces

#[cfg(test)]
mod tests {
    use super::super::{bits_from_orbitals, excite, sign, Determinants, Spin, StringSpace};

    fn binomial(n: usize, k: usize) -> usize {
        (0..k).fold(1, |acc, i| acc * (n - i) / (i + 1))
    }

    #[test]
    fn test_dimensions_are_binomial() {
        for norb in 1..=8 {
            for nelea in 1..=norb {
                for neleb in 0..=nelea {
                    let det = Determinants::new(norb, nelea as i64, neleb as i64).unwrap();
                    assert_eq!(det.lena(), binomial(norb, nelea));
                    assert_eq!(det.lenb(), binomial(norb, neleb));
                    assert_eq!(det.size(), det.lena() * det.lenb());
                }
            }
        }
    }

    #[test]
    fn test_invalid_counts_rejected() {
        assert!(Determinants::new(4, 0, 0).is_err());
        assert!(Determinants::new(4, 2, -1).is_err());
        assert!(Determinants::new(4, 5, 1).is_err());
        assert!(Determinants::new(4, 2, 5).is_err());
    }

    #[test]
    fn test_lexical_round_trip() {
        let det = Determinants::new(6, 3, 2).unwrap();
        for ia in 0..det.lena() {
            assert_eq!(det.lexical_a(det.string_bits_a(ia)), ia);
        }
        for ib in 0..det.lenb() {
            assert_eq!(det.lexical(Spin::Beta, det.string_bits_b(ib)), ib);
        }
    }

    #[test]
    fn test_sign_counts_bits_between() {
        let bits = bits_from_orbitals(&[0, 2, 3, 5]);
        assert_eq!(sign(bits, 0, 5), 1.0); // 2 and 3 in between
        assert_eq!(sign(bits, 1, 5), 1.0);
        assert_eq!(sign(bits, 4, 0), 1.0);
        assert_eq!(sign(bits, 2, 5), -1.0); // only 3
        assert_eq!(sign(bits, 3, 3), 1.0);
        assert_eq!(sign(bits, 5, 2), -1.0);
    }

    #[test]
    fn test_phi_tables_are_exhaustive() {
        let norb = 5;
        let nele = 2;
        let space = StringSpace::new(norb, nele);
        let total: usize = (0..norb * norb).map(|ij| space.phi(ij).len()).sum();
        // every string: nele diagonal terms + nele*(norb-nele) excitations
        assert_eq!(total, space.len() * (nele + nele * (norb - nele)));

        for ij in 0..norb * norb {
            let (i, j) = (ij / norb, ij % norb);
            for map in space.phi(ij) {
                let (target, s) = excite(space.string(map.source), i, j).unwrap();
                assert_eq!(space.lexical(target), map.target);
                assert_eq!(s, map.sign);
            }
        }
    }

    #[test]
    fn test_links_match_phi() {
        let space = StringSpace::new(4, 2);
        for source in 0..space.len() {
            for link in space.links(source) {
                assert!(space
                    .phi(link.ij)
                    .iter()
                    .any(|m| m.source == source && m.target == link.target && m.sign == link.sign));
            }
        }
    }

    #[test]
    fn test_adjoint_sign_consistency() {
        // <t|E_ij|s> == <s|E_ji|t>
        let norb = 6;
        let space = StringSpace::new(norb, 3);
        for i in 0..norb {
            for j in 0..norb {
                for map in space.phi(i * norb + j) {
                    let back = space
                        .phi(j * norb + i)
                        .iter()
                        .find(|m| m.source == map.target && m.target == map.source)
                        .unwrap();
                    assert_eq!(back.sign, map.sign);
                }
            }
        }
    }

    #[test]
    fn test_spin_adapt_singlet_pair() {
        let det = Determinants::new(2, 1, 1).unwrap();
        let (terms, norm) = det.spin_adapt(0, 0b01, 0b10);
        assert_eq!(terms.len(), 2);
        assert!((norm - 1.0 / 2f64.sqrt()).abs() < 1e-14);
        let coeffs: Vec<f64> = terms.iter().map(|t| t.2).collect();
        assert_eq!(coeffs, vec![1.0, 1.0]);
    }

    #[test]
    fn test_neighbour_spaces() {
        let det = Determinants::new(4, 2, 1).unwrap();
        let minus = det.neighbour(Spin::Beta, -1).unwrap();
        assert_eq!(minus.neleb(), 0);
        assert_eq!(minus.lenb(), 1);
        assert!(det.neighbour(Spin::Alpha, 3).is_none());
        assert_eq!(det.print_bit(0b0011, 0b0010), "a2..");
    }
}
