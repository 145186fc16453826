//! Gamma matrices: transition densities of short operator strings
//!
//! `GammaForest` collects the operator strings needed for every bra/ket
//! pair, then evaluates them through one trie per ket. How an operator acts
//! on a vector is delegated to an `OperatorApplier` (full or RAS spaces).

pub mod apply;
pub mod coupling;
pub mod forest;
pub mod gamma_tree;

pub use self::apply::{DenseApplier, OperatorApplier, RasApplier};
pub use self::coupling::{couple_blocks, coupling_operators};
pub use self::forest::{GammaColumn, GammaForest, GammaTask};
pub use self::gamma_tree::{BranchView, GammaBranch, GammaSQ, GammaTree, NodeId};
