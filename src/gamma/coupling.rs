//! Operator strings needed to couple two fragment states

use super::apply::OperatorApplier;
use super::forest::GammaForest;
use super::gamma_tree::GammaSQ;
use std::sync::Arc;

use GammaSQ::{AnnihilateAlpha as AA, AnnihilateBeta as AB, CreateAlpha as CA, CreateBeta as CB};

/// Operator strings connecting a ket to a bra whose electron counts differ by `delta`
pub fn coupling_operators(delta: (i64, i64)) -> Vec<Vec<GammaSQ>> {
    match delta {
        (0, 0) => vec![vec![CA, AA], vec![CB, AB]],
        (1, 0) => vec![vec![CA], vec![CA, CA, AA], vec![CA, CB, AB]],
        (-1, 0) => vec![vec![AA], vec![CA, AA, AA], vec![CB, AB, AA]],
        (0, 1) => vec![vec![CB], vec![CB, CA, AA], vec![CB, CB, AB]],
        (0, -1) => vec![vec![AB], vec![CA, AA, AB], vec![CB, AB, AB]],
        (1, -1) => vec![vec![CA, AB]],
        (-1, 1) => vec![vec![CB, AA]],
        (1, 1) => vec![vec![CA, CB]],
        (-1, -1) => vec![vec![AB, AA]],
        (2, 0) => vec![vec![CA, CA]],
        (-2, 0) => vec![vec![AA, AA]],
        (0, 2) => vec![vec![CB, CB]],
        (0, -2) => vec![vec![AB, AB]],
        _ => Vec::new(),
    }
}

/// Insert every operator string coupling `ket` to `bra` in one unit
///
/// Returns the number of strings inserted; zero means the pair does not couple.
pub fn couple_blocks<A: OperatorApplier>(
    forest: &mut GammaForest<A>,
    unit: usize,
    (bra, bra_tag): (&Arc<A::Vector>, usize),
    (ket, ket_tag): (&Arc<A::Vector>, usize),
) -> usize {
    let (ba, bb) = forest.applier().electrons(bra);
    let (ka, kb) = forest.applier().electrons(ket);
    let delta = (ba as i64 - ka as i64, bb as i64 - kb as i64);
    let strings = coupling_operators(delta);
    for ops in &strings {
        forest.insert(unit, bra, bra_tag, ket, ket_tag, ops);
    }
    strings.len()
}
