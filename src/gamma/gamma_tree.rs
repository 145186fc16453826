//! Operator trie for one ket
//!
//! Nodes live in an arena and are addressed by index. The path from the root
//! lists operators in the order they act on the ket, so the operator string
//! `o1 o2 o3` (acting as o1(a) o2(b) o3(c) |ket>) is stored under o3 → o2 → o1.

extern crate nalgebra as na;

use crate::determinants::Spin;
use na::DMatrix;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Second-quantized operator types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GammaSQ {
    CreateAlpha,
    CreateBeta,
    AnnihilateAlpha,
    AnnihilateBeta,
}

impl GammaSQ {
    pub const ALL: [GammaSQ; 4] = [
        GammaSQ::CreateAlpha,
        GammaSQ::CreateBeta,
        GammaSQ::AnnihilateAlpha,
        GammaSQ::AnnihilateBeta,
    ];

    pub fn index(self) -> usize {
        match self {
            GammaSQ::CreateAlpha => 0,
            GammaSQ::CreateBeta => 1,
            GammaSQ::AnnihilateAlpha => 2,
            GammaSQ::AnnihilateBeta => 3,
        }
    }

    pub fn is_creation(self) -> bool {
        matches!(self, GammaSQ::CreateAlpha | GammaSQ::CreateBeta)
    }

    pub fn spin(self) -> Spin {
        match self {
            GammaSQ::CreateAlpha | GammaSQ::AnnihilateAlpha => Spin::Alpha,
            GammaSQ::CreateBeta | GammaSQ::AnnihilateBeta => Spin::Beta,
        }
    }

    /// Change of (nelea, neleb) caused by the operator
    pub fn electron_change(self) -> (i64, i64) {
        match self {
            GammaSQ::CreateAlpha => (1, 0),
            GammaSQ::CreateBeta => (0, 1),
            GammaSQ::AnnihilateAlpha => (-1, 0),
            GammaSQ::AnnihilateBeta => (0, -1),
        }
    }
}

pub type NodeId = usize;

/// One node of the trie
#[derive(Debug)]
pub struct GammaBranch<V> {
    op: Option<GammaSQ>,
    depth: usize,
    children: [Option<NodeId>; 4],
    active: bool,
    bras: BTreeMap<usize, Arc<V>>,
    gammas: BTreeMap<usize, DMatrix<f64>>,
}

impl<V> GammaBranch<V> {
    fn new(op: Option<GammaSQ>, depth: usize) -> Self {
        GammaBranch {
            op,
            depth,
            children: [None; 4],
            active: false,
            bras: BTreeMap::new(),
            gammas: BTreeMap::new(),
        }
    }

    pub fn op(&self) -> Option<GammaSQ> {
        self.op
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn bras(&self) -> &BTreeMap<usize, Arc<V>> {
        &self.bras
    }

    pub fn gammas(&self) -> &BTreeMap<usize, DMatrix<f64>> {
        &self.gammas
    }
}

/// Read-only view of a branch and its subtree
pub struct BranchView<'a, V> {
    nodes: &'a [GammaBranch<V>],
    id: NodeId,
}

impl<V> Clone for BranchView<'_, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for BranchView<'_, V> {}

impl<'a, V> BranchView<'a, V> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn branch(&self) -> &'a GammaBranch<V> {
        &self.nodes[self.id]
    }

    pub fn op(&self) -> Option<GammaSQ> {
        self.branch().op
    }

    pub fn is_active(&self) -> bool {
        self.branch().active
    }

    /// Active children with their operators
    pub fn active_children(&self) -> impl Iterator<Item = (GammaSQ, BranchView<'a, V>)> + 'a {
        let nodes = self.nodes;
        self.branch()
            .children
            .iter()
            .flatten()
            .filter(move |&&child| nodes[child].active)
            .filter_map(move |&child| {
                nodes[child].op.map(|op| (op, BranchView { nodes, id: child }))
            })
    }

    /// Number of operator levels still active below this branch
    pub fn depth_below(&self) -> usize {
        self.active_children()
            .map(|(_, child)| 1 + child.depth_below())
            .max()
            .unwrap_or(0)
    }
}

/// Trie of operator strings applied to one ket
#[derive(Debug)]
pub struct GammaTree<V> {
    ket: Arc<V>,
    nodes: Vec<GammaBranch<V>>,
}

impl<V> GammaTree<V> {
    pub fn new(ket: Arc<V>) -> Self {
        GammaTree {
            ket,
            nodes: vec![GammaBranch::new(None, 0)],
        }
    }

    pub fn ket(&self) -> &Arc<V> {
        &self.ket
    }

    pub const ROOT: NodeId = 0;

    pub fn view(&self, id: NodeId) -> BranchView<'_, V> {
        BranchView {
            nodes: &self.nodes,
            id,
        }
    }

    pub fn branch(&self, id: NodeId) -> &GammaBranch<V> {
        &self.nodes[id]
    }

    pub fn nodes(&self) -> &[GammaBranch<V>] {
        &self.nodes
    }

    /// Mark the path of `ops` active and register `bra` at its end
    ///
    /// `ops` is given in operator-string order (leftmost acts last).
    pub fn insert(&mut self, bra: Arc<V>, bra_tag: usize, ops: &[GammaSQ]) -> NodeId {
        assert!(
            !ops.is_empty() && ops.len() <= 3,
            "operator strings hold between one and three operators"
        );
        let mut current = Self::ROOT;
        for &op in ops.iter().rev() {
            let slot = op.index();
            current = match self.nodes[current].children[slot] {
                Some(child) => child,
                None => {
                    let depth = self.nodes[current].depth + 1;
                    self.nodes.push(GammaBranch::new(Some(op), depth));
                    let child = self.nodes.len() - 1;
                    self.nodes[current].children[slot] = Some(child);
                    child
                }
            };
            self.nodes[current].active = true;
        }
        self.nodes[current].bras.insert(bra_tag, bra);
        current
    }

    /// Node reached by `ops`, if inserted
    pub fn search(&self, ops: &[GammaSQ]) -> Option<NodeId> {
        let mut current = Self::ROOT;
        for &op in ops.iter().rev() {
            current = self.nodes[current].children[op.index()]?;
        }
        Some(current)
    }

    /// Allocate every gamma matrix; `nrows` gives the row count per bra
    pub fn allocate(&mut self, norb: usize, nrows: impl Fn(&V) -> usize) {
        for node in &mut self.nodes {
            if !node.active {
                continue;
            }
            let ncols = norb.pow(node.depth as u32);
            let tags: Vec<(usize, usize)> = node
                .bras
                .iter()
                .map(|(&tag, bra)| (tag, nrows(bra)))
                .collect();
            for (tag, rows) in tags {
                node.gammas.insert(tag, DMatrix::zeros(rows, ncols));
            }
        }
    }

    /// First-level active branches
    pub fn roots(&self) -> Vec<NodeId> {
        self.view(Self::ROOT).active_children().map(|(_, v)| v.id).collect()
    }

    pub(crate) fn gamma_mut(&mut self, id: NodeId, bra_tag: usize) -> Option<&mut DMatrix<f64>> {
        self.nodes[id].gammas.get_mut(&bra_tag)
    }
}
