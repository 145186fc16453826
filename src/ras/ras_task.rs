//! Block feasibility for second-quantized operators on RAS vectors
//!
//! Applying a creation or annihilation operator to a RAS block changes the
//! hole or particle count of one spin string. A target block beyond the
//! restrictions is kept only when operators still to act along the current
//! branch can bring it back.

use super::ras_determinants::RasBlockInfo;
use super::ras_string::RasKey;
use crate::determinants::Spin;
use crate::gamma::BranchView;

/// Hole and particle limits of the bra space
#[derive(Debug, Clone, Copy)]
pub struct RasTask {
    max_holes: usize,
    max_particles: usize,
}

impl RasTask {
    pub fn new(max_holes: usize, max_particles: usize) -> Self {
        RasTask {
            max_holes,
            max_particles,
        }
    }

    pub fn max_holes(&self) -> usize {
        self.max_holes
    }

    pub fn max_particles(&self) -> usize {
        self.max_particles
    }

    /// Target (alpha, beta) keys for an operator on `orbital` acting on `base`
    ///
    /// `branch` is the node of the operator being applied. Returns `None` when
    /// the counts go out of range or the target can never contribute.
    pub fn next_block<V>(
        &self,
        branch: BranchView<'_, V>,
        base: &RasBlockInfo,
        orbital: usize,
        is_creation: bool,
        spin: Spin,
    ) -> Option<(RasKey, RasKey)> {
        let (mut akey, mut bkey) = (base.alpha.key(), base.beta.key());
        let key = match spin {
            Spin::Alpha => &mut akey,
            Spin::Beta => &mut bkey,
        };
        *key = shift_key(*key, orbital, is_creation)?;

        let holes = akey.holes + bkey.holes;
        let particles = akey.particles + bkey.particles;
        if holes <= self.max_holes && particles <= self.max_particles {
            return Some((akey, bkey));
        }
        let needed_holes = holes.saturating_sub(self.max_holes);
        let needed_particles = particles.saturating_sub(self.max_particles);
        if_contributes(branch, needed_holes, needed_particles).then_some((akey, bkey))
    }
}

/// Key after one operator; `None` if a count leaves its valid range
fn shift_key(key: RasKey, orbital: usize, is_creation: bool) -> Option<RasKey> {
    let [n1, n2, _] = key.ras();
    let mut out = key;
    if orbital < n1 {
        // a creation in RAS1 fills a hole
        out.holes = if is_creation {
            key.holes.checked_sub(1)?
        } else {
            key.holes + 1
        };
        if out.holes > key.norb1 {
            return None;
        }
    } else if orbital < n1 + n2 {
        out.nele2 = if is_creation {
            key.nele2 + 1
        } else {
            key.nele2.checked_sub(1)?
        };
        if out.nele2 > key.norb2 {
            return None;
        }
    } else {
        out.particles = if is_creation {
            key.particles + 1
        } else {
            key.particles.checked_sub(1)?
        };
        if out.particles > key.norb3 {
            return None;
        }
    }
    Some(out)
}

/// Whether operators below `node` can remove the excess holes and particles
///
/// A creation may fill one RAS1 hole, an annihilation may empty one RAS3
/// orbital.
pub fn if_contributes<V>(node: BranchView<'_, V>, needed_holes: usize, needed_particles: usize) -> bool {
    if needed_holes == 0 && needed_particles == 0 {
        return true;
    }
    node.active_children().any(|(op, child)| {
        if op.is_creation() {
            if_contributes(child, needed_holes.saturating_sub(1), needed_particles)
        } else {
            if_contributes(child, needed_holes, needed_particles.saturating_sub(1))
        }
    })
}
