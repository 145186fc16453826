//! RAS determinant space as a list of (alpha space, beta space) blocks

use super::ras_string::{RasKey, RasSpaceCache, RasStringSpace};
use color_eyre::eyre::{bail, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// One rectangular block of determinants
#[derive(Debug, Clone)]
pub struct RasBlockInfo {
    pub alpha: Arc<RasStringSpace>,
    pub beta: Arc<RasStringSpace>,
    pub offset: usize,
}

impl RasBlockInfo {
    pub fn lena(&self) -> usize {
        self.alpha.len()
    }

    pub fn lenb(&self) -> usize {
        self.beta.len()
    }

    pub fn size(&self) -> usize {
        self.lena() * self.lenb()
    }

    pub fn holes(&self) -> usize {
        self.alpha.key().holes + self.beta.key().holes
    }

    pub fn particles(&self) -> usize {
        self.alpha.key().particles + self.beta.key().particles
    }
}

/// Determinants with at most `max_holes` holes in RAS1 and `max_particles`
/// particles in RAS3, summed over both spins
#[derive(Debug)]
pub struct RasDeterminants {
    ras: [usize; 3],
    nelea: usize,
    neleb: usize,
    max_holes: usize,
    max_particles: usize,
    cache: Arc<RasSpaceCache>,
    blocks: Vec<RasBlockInfo>,
    index: HashMap<(RasKey, RasKey), usize>,
    size: usize,
}

impl RasDeterminants {
    pub fn new(
        ras: [usize; 3],
        nelea: i64,
        neleb: i64,
        max_holes: usize,
        max_particles: usize,
    ) -> Result<Arc<Self>> {
        let norb: usize = ras.iter().sum();
        if nelea <= 0 || neleb < 0 {
            bail!(
                "Invalid electron count for a RAS space: nelea = {}, neleb = {}",
                nelea,
                neleb
            );
        }
        if nelea as usize > norb || neleb as usize > norb {
            bail!(
                "More electrons than orbitals: nelea = {}, neleb = {}, norb = {}",
                nelea,
                neleb,
                norb
            );
        }
        if norb > 64 {
            bail!("At most 64 active orbitals are supported (norb = {})", norb);
        }
        let det = Self::with_cache(
            ras,
            nelea as usize,
            neleb as usize,
            max_holes,
            max_particles,
            Arc::new(RasSpaceCache::new()),
        );
        if det.size() == 0 {
            bail!(
                "RAS space {:?} with {} holes and {} particles holds no determinants",
                ras,
                max_holes,
                max_particles
            );
        }
        Ok(det)
    }

    /// Space sharing an existing string cache; counts are not validated
    pub fn with_cache(
        ras: [usize; 3],
        nelea: usize,
        neleb: usize,
        max_holes: usize,
        max_particles: usize,
        cache: Arc<RasSpaceCache>,
    ) -> Arc<Self> {
        let keys = |nele: usize| -> Vec<RasKey> {
            let mut out = Vec::new();
            for holes in 0..=max_holes.min(ras[0]) {
                for particles in 0..=max_particles.min(ras[2]) {
                    if let Some(key) = RasKey::with_counts(ras, nele, holes, particles) {
                        out.push(key);
                    }
                }
            }
            out
        };

        let mut blocks = Vec::new();
        let mut index = HashMap::new();
        let mut offset = 0;
        for akey in keys(nelea) {
            for bkey in keys(neleb) {
                if akey.holes + bkey.holes > max_holes
                    || akey.particles + bkey.particles > max_particles
                {
                    continue;
                }
                let info = RasBlockInfo {
                    alpha: cache.get(akey),
                    beta: cache.get(bkey),
                    offset,
                };
                if info.size() == 0 {
                    continue;
                }
                offset += info.size();
                index.insert((akey, bkey), blocks.len());
                blocks.push(info);
            }
        }

        Arc::new(RasDeterminants {
            ras,
            nelea,
            neleb,
            max_holes,
            max_particles,
            cache,
            blocks,
            index,
            size: offset,
        })
    }

    pub fn ras(&self) -> [usize; 3] {
        self.ras
    }

    pub fn norb(&self) -> usize {
        self.ras.iter().sum()
    }

    pub fn nelea(&self) -> usize {
        self.nelea
    }

    pub fn neleb(&self) -> usize {
        self.neleb
    }

    pub fn nspin(&self) -> usize {
        self.nelea - self.neleb
    }

    pub fn max_holes(&self) -> usize {
        self.max_holes
    }

    pub fn max_particles(&self) -> usize {
        self.max_particles
    }

    pub fn cache(&self) -> &Arc<RasSpaceCache> {
        &self.cache
    }

    pub fn blocks(&self) -> &[RasBlockInfo] {
        &self.blocks
    }

    pub fn nblocks(&self) -> usize {
        self.blocks.len()
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn block_index(&self, akey: RasKey, bkey: RasKey) -> Option<usize> {
        self.index.get(&(akey, bkey)).copied()
    }

    /// (block, alpha index, beta index) of a determinant, if it is in the space
    pub fn locate(&self, alpha: u64, beta: u64) -> Option<(usize, usize, usize)> {
        let akey = RasKey::of(alpha, self.ras);
        let bkey = RasKey::of(beta, self.ras);
        let block = self.block_index(akey, bkey)?;
        let info = &self.blocks[block];
        Some((block, info.alpha.lexical(alpha), info.beta.lexical(beta)))
    }

    /// Position of a determinant in block-concatenated storage order
    pub fn global_index(&self, alpha: u64, beta: u64) -> Option<usize> {
        let (block, ia, ib) = self.locate(alpha, beta)?;
        let info = &self.blocks[block];
        Some(info.offset + ia * info.lenb() + ib)
    }

    /// Whether a determinant with these totals is allowed
    pub fn allows(&self, holes: usize, particles: usize) -> bool {
        holes <= self.max_holes && particles <= self.max_particles
    }

    /// Same electrons with looser restrictions, sharing the string cache
    pub fn expanded(&self, extra_holes: usize, extra_particles: usize) -> Arc<Self> {
        Self::with_cache(
            self.ras,
            self.nelea,
            self.neleb,
            self.max_holes + extra_holes,
            self.max_particles + extra_particles,
            self.cache.clone(),
        )
    }

    /// Space with other electron counts and restrictions, sharing the cache
    pub fn neighbour(
        &self,
        nelea: usize,
        neleb: usize,
        max_holes: usize,
        max_particles: usize,
    ) -> Arc<Self> {
        Self::with_cache(self.ras, nelea, neleb, max_holes, max_particles, self.cache.clone())
    }

    pub fn is_same(&self, other: &RasDeterminants) -> bool {
        self.ras == other.ras
            && self.nelea == other.nelea
            && self.neleb == other.neleb
            && self.max_holes == other.max_holes
            && self.max_particles == other.max_particles
    }

    /// Every determinant as (alpha, beta) bits, in storage order
    pub fn determinants(&self) -> Vec<(u64, u64)> {
        let mut out = Vec::with_capacity(self.size);
        for info in &self.blocks {
            for &alpha in info.alpha.strings() {
                for &beta in info.beta.strings() {
                    out.push((alpha, beta));
                }
            }
        }
        out
    }
}
