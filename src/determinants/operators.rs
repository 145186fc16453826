//! Creation and annihilation operators acting on a single determinant
//!
//! Beta operators pass over every alpha creator, so they pick up the parity of
//! the current alpha electron count.

use super::string_space::sign_below;
use super::Spin;

#[inline]
fn alpha_parity(alpha: u64) -> f64 {
    if alpha.count_ones() % 2 == 0 {
        1.0
    } else {
        -1.0
    }
}

/// a_{orbital,spin} |alpha beta>
#[inline]
pub fn annihilate(alpha: u64, beta: u64, orbital: usize, spin: Spin) -> Option<(u64, u64, f64)> {
    let bit = 1u64 << orbital;
    match spin {
        Spin::Alpha => {
            if alpha & bit == 0 {
                return None;
            }
            Some((alpha ^ bit, beta, sign_below(alpha, orbital)))
        }
        Spin::Beta => {
            if beta & bit == 0 {
                return None;
            }
            Some((alpha, beta ^ bit, alpha_parity(alpha) * sign_below(beta, orbital)))
        }
    }
}

/// a†_{orbital,spin} |alpha beta>
#[inline]
pub fn create(alpha: u64, beta: u64, orbital: usize, spin: Spin) -> Option<(u64, u64, f64)> {
    let bit = 1u64 << orbital;
    match spin {
        Spin::Alpha => {
            if alpha & bit != 0 {
                return None;
            }
            Some((alpha | bit, beta, sign_below(alpha, orbital)))
        }
        Spin::Beta => {
            if beta & bit != 0 {
                return None;
            }
            Some((alpha, beta | bit, alpha_parity(alpha) * sign_below(beta, orbital)))
        }
    }
}
