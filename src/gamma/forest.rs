//! Transition densities <bra| o1 o2 o3 |ket> for many bra/ket pairs at once
//!
//! Each ket owns one operator trie. After every operator string is inserted
//! the gamma matrices are allocated, then one task per (first operator,
//! orbital) walks the trie depth first, reusing each intermediate vector for
//! every deeper branch and every bra registered at that depth.

extern crate nalgebra as na;

use super::apply::OperatorApplier;
use super::gamma_tree::{BranchView, GammaSQ, GammaTree, NodeId};
use crate::task_queue::{Task, TaskQueue};
use na::DMatrix;
use std::collections::BTreeMap;
use std::sync::Arc;

/// One filled gamma column
#[derive(Debug)]
pub struct GammaColumn {
    unit: usize,
    ket_tag: usize,
    node: NodeId,
    bra_tag: usize,
    column: usize,
    values: Vec<f64>,
}

/// The subtree below one first-level operator and orbital
pub struct GammaTask<'a, A: OperatorApplier> {
    applier: &'a A,
    tree: &'a GammaTree<A::Vector>,
    unit: usize,
    ket_tag: usize,
    node: NodeId,
    orbital: usize,
}

impl<A: OperatorApplier> GammaTask<'_, A> {
    fn walk(
        &self,
        vector: &A::Vector,
        view: BranchView<'_, A::Vector>,
        column: usize,
        out: &mut Vec<GammaColumn>,
    ) {
        for (&bra_tag, bra) in view.branch().bras() {
            out.push(GammaColumn {
                unit: self.unit,
                ket_tag: self.ket_tag,
                node: view.id(),
                bra_tag,
                column,
                values: self.applier.overlaps(bra, vector),
            });
        }
        let norb = self.applier.norb();
        let stride = norb.pow(view.branch().depth() as u32);
        for (op, child) in view.active_children() {
            for orbital in 0..norb {
                if let Some(next) = self.applier.apply(vector, orbital, op, child) {
                    self.walk(&next, child, column + orbital * stride, out);
                }
            }
        }
    }
}

impl<A: OperatorApplier> Task for GammaTask<'_, A> {
    type Output = Vec<GammaColumn>;

    fn compute(&self) -> Vec<GammaColumn> {
        let mut out = Vec::new();
        let view = self.tree.view(self.node);
        let Some(op) = view.op() else { return out };
        if let Some(first) = self.applier.apply(self.tree.ket(), self.orbital, op, view) {
            self.walk(&first, view, self.orbital, &mut out);
        }
        out
    }
}

/// Operator tries for `nunits` units, each keyed by ket tag
pub struct GammaForest<A: OperatorApplier> {
    applier: A,
    units: Vec<BTreeMap<usize, GammaTree<A::Vector>>>,
    allocated: bool,
}

impl<A: OperatorApplier> GammaForest<A> {
    pub fn new(applier: A, nunits: usize) -> Self {
        GammaForest {
            applier,
            units: (0..nunits).map(|_| BTreeMap::new()).collect(),
            allocated: false,
        }
    }

    pub fn applier(&self) -> &A {
        &self.applier
    }

    pub fn nunits(&self) -> usize {
        self.units.len()
    }

    /// Request <bra| ops |ket> for one unit
    pub fn insert(
        &mut self,
        unit: usize,
        bra: &Arc<A::Vector>,
        bra_tag: usize,
        ket: &Arc<A::Vector>,
        ket_tag: usize,
        ops: &[GammaSQ],
    ) {
        let (ka, kb) = self.applier.electrons(ket);
        let (ba, bb) = self.applier.electrons(bra);
        let (da, db) = ops.iter().fold((0, 0), |(a, b), op| {
            let (x, y) = op.electron_change();
            (a + x, b + y)
        });
        assert!(
            ka as i64 + da == ba as i64 && kb as i64 + db == bb as i64,
            "operator string {:?} does not connect the ket space to the bra space",
            ops
        );
        self.units[unit]
            .entry(ket_tag)
            .or_insert_with(|| GammaTree::new(ket.clone()))
            .insert(bra.clone(), bra_tag, ops);
        self.allocated = false;
    }

    /// Allocate every requested gamma; returns the number of first-level branches
    pub fn allocate_and_count(&mut self) -> usize {
        let GammaForest { applier, units, .. } = self;
        let mut count = 0;
        for tree in units.iter_mut().flat_map(|unit| unit.values_mut()) {
            let nket = applier.nstates(tree.ket());
            tree.allocate(applier.norb(), |bra| applier.nstates(bra) * nket);
            count += tree.roots().len();
        }
        self.allocated = true;
        count
    }

    /// Fill every gamma matrix
    pub fn compute(&mut self) {
        assert!(
            self.allocated,
            "gamma matrices must be allocated before compute"
        );
        let norb = self.applier.norb();
        let columns = {
            let mut queue = TaskQueue::new();
            for (unit, trees) in self.units.iter().enumerate() {
                for (&ket_tag, tree) in trees {
                    for node in tree.roots() {
                        for orbital in 0..norb {
                            queue.push(GammaTask {
                                applier: &self.applier,
                                tree,
                                unit,
                                ket_tag,
                                node,
                                orbital,
                            });
                        }
                    }
                }
            }
            tracing::debug!("Gamma forest: {} tasks", queue.len());
            queue.compute()
        };

        for column in columns.into_iter().flatten() {
            let GammaColumn {
                unit,
                ket_tag,
                node,
                bra_tag,
                column,
                values,
            } = column;
            if let Some(gamma) = self.units[unit]
                .get_mut(&ket_tag)
                .and_then(|tree| tree.gamma_mut(node, bra_tag))
            {
                gamma.column_mut(column).copy_from_slice(&values);
            }
        }
    }

    /// The gamma for (bra, ket, ops), if it was requested
    pub fn try_search(&self, unit: usize, bra_tag: usize, ket_tag: usize, ops: &[GammaSQ]) -> Option<&DMatrix<f64>> {
        let tree = self.units.get(unit)?.get(&ket_tag)?;
        let node = tree.search(ops)?;
        tree.branch(node).gammas().get(&bra_tag)
    }

    /// The gamma for (bra, ket, ops); panics if it was never requested
    pub fn search(&self, unit: usize, bra_tag: usize, ket_tag: usize, ops: &[GammaSQ]) -> &DMatrix<f64> {
        match self.try_search(unit, bra_tag, ket_tag, ops) {
            Some(gamma) => gamma,
            None => panic!(
                "gamma <{}|{:?}|{}> of unit {} was never inserted or allocated",
                bra_tag, ops, ket_tag, unit
            ),
        }
    }
}
