//! σ = H c over a distributed CI vector
//!
//! One task per alpha row of σ. A task requests every row of c within two
//! alpha excitations of its own row, and runs once all of them have arrived.
//! Its result is the finished σ row, so tasks never share output.

extern crate nalgebra as na;

use crate::civec::Civec;
use crate::determinants::Determinants;
use crate::sigma::SigmaEngine;
use crate::task_queue::{DistCivec, DistQueue, DistTask, Request};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;

/// σ builder that reads c through rank-owned rows
pub struct DistFci {
    engine: SigmaEngine,
    nranks: usize,
}

struct DistSigmaTask<'a> {
    engine: &'a SigmaEngine,
    det: Arc<Determinants>,
    row: usize,
    requests: Vec<Request>,
}

impl DistFci {
    pub fn new(engine: SigmaEngine, nranks: usize) -> Self {
        DistFci {
            engine,
            nranks: nranks.max(1),
        }
    }

    pub fn engine(&self) -> &SigmaEngine {
        &self.engine
    }

    pub fn nranks(&self) -> usize {
        self.nranks
    }

    /// σ without the core energy, equal to `SigmaEngine::sigma`
    pub fn sigma(&self, c: &Civec) -> Civec {
        assert_eq!(
            c.det().norb(),
            self.engine.norb(),
            "CI vector and integrals have different numbers of orbitals"
        );
        let det = c.det().clone();
        let dist = DistCivec::from_civec(c, self.nranks);

        let mut queue = DistQueue::new();
        for row in 0..det.lena() {
            let mut needed = BTreeSet::new();
            needed.insert(row);
            for link in det.links_a(row) {
                needed.insert(link.target);
                needed.extend(det.links_a(link.target).iter().map(|l| l.target));
            }
            let requests = needed.into_iter().map(|r| dist.get_row(r)).collect();
            queue.push(DistSigmaTask {
                engine: &self.engine,
                det: det.clone(),
                row,
                requests,
            });
        }
        debug!("Distributed sigma: {} row tasks over {} ranks", det.lena(), dist.nranks());

        let rows = queue.finish();
        Civec::from_data(det, rows.concat())
    }
}

impl DistTask for DistSigmaTask<'_> {
    type Output = Vec<f64>;

    fn test(&mut self) -> bool {
        let mut done = true;
        for request in &mut self.requests {
            done &= request.test();
        }
        done
    }

    fn compute(self) -> Vec<f64> {
        let rows: HashMap<usize, &[f64]> = self
            .requests
            .iter()
            .filter_map(|r| r.data().map(|d| (r.row(), d)))
            .collect();
        let det = &self.det;
        let n = self.engine.norb();
        let n2 = n * n;
        let lenb = det.lenb();
        let jop = self.engine.jop();
        let eri = self.engine.eri();
        let transpose = |ij: usize| (ij % n) * n + ij / n;

        // G(K, ib, ij) for K = this row and its alpha neighbours
        let mut intermediates: HashMap<usize, na::DMatrix<f64>> = HashMap::new();
        let mut first: Vec<usize> = vec![self.row];
        first.extend(det.links_a(self.row).iter().map(|l| l.target));
        for k in first {
            if intermediates.contains_key(&k) {
                continue;
            }
            let mut d = na::DMatrix::<f64>::zeros(lenb, n2);
            for link in det.links_a(k) {
                let kl = transpose(link.ij);
                for (ib, x) in rows[&link.target].iter().enumerate() {
                    d[(ib, kl)] += link.sign * x;
                }
            }
            let own = rows[&k];
            for ib in 0..lenb {
                for link in det.links_b(ib) {
                    d[(ib, transpose(link.ij))] += link.sign * own[link.target];
                }
            }
            let mut g = d * eri;
            g *= 0.5;
            intermediates.insert(k, g);
        }

        let mut out = vec![0.0; lenb];
        let own = rows[&self.row];
        for link in det.links_a(self.row) {
            let (p, q) = (link.ij / n, link.ij % n);
            let qp = transpose(link.ij);
            let source = rows[&link.target];
            let g = &intermediates[&link.target];
            for (ib, s) in out.iter_mut().enumerate() {
                *s += link.sign * (jop[(q, p)] * source[ib] + g[(ib, qp)]);
            }
        }
        let g = &intermediates[&self.row];
        for (ib, s) in out.iter_mut().enumerate() {
            for link in det.links_b(ib) {
                let (p, q) = (link.ij / n, link.ij % n);
                let qp = transpose(link.ij);
                *s += link.sign * (jop[(q, p)] * own[link.target] + g[(link.target, qp)]);
            }
        }
        out
    }
}
