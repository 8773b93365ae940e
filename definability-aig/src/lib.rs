//! A minimal And-Inverter-Graph manager.
//!
//! Implements the AIG library contract of the governing spec's external
//! interfaces section: a manager that creates primary inputs (CIs), builds
//! 2-input AND gates with complemented fanins, a derived OR/MUX convenience
//! layer on top of AND, a single primary output (CO), DFS ordering for
//! Tseitin conversion, and a structural `rewrite` pass.
//!
//! This stands in for a production AIG rewriting library (out of scope per
//! the spec): nodes are hash-consed on creation so trivial redundancy is
//! never built, and `rewrite` re-emits only the nodes reachable from the
//! primary output.

use rustc_hash::FxHashMap;
use std::ops::Not;

/// Reference to a node in an [`AigManager`]. Node `0` is always the
/// constant-1 node.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct AigRef(u32);

impl AigRef {
    const CONST: AigRef = AigRef(0);

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A node reference with a complement (negation) flag, the unit the AIG
/// works in everywhere except inside [`AigManager`]'s node table.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct AigLit {
    node: AigRef,
    negated: bool,
}

impl AigLit {
    fn new(node: AigRef, negated: bool) -> AigLit {
        AigLit { node, negated }
    }

    pub fn node(self) -> AigRef {
        self.node
    }

    pub fn is_negated(self) -> bool {
        self.negated
    }

    pub fn is_const1(self) -> bool {
        self.node == AigRef::CONST && !self.negated
    }
}

impl Not for AigLit {
    type Output = AigLit;

    fn not(self) -> AigLit {
        AigLit {
            node: self.node,
            negated: !self.negated,
        }
    }
}

enum AigNode {
    /// The single constant-1 node (node 0).
    Const,
    /// A primary input, `index`-th in creation order.
    Ci { index: usize },
    /// `fanin0 AND fanin1`.
    And { fanin0: AigLit, fanin1: AigLit },
}

/// An And-Inverter-Graph builder and container.
///
/// Created fresh per interpolation query (see §5's "per-query resource")
/// and dropped once its clauses have been produced.
pub struct AigManager {
    nodes: Vec<AigNode>,
    cis: Vec<AigRef>,
    cos: Vec<AigLit>,
    and_cache: FxHashMap<(AigLit, AigLit), AigRef>,
}

impl AigManager {
    /// Start a new manager, reserving room for `n_inputs` primary inputs.
    pub fn start_manager(n_inputs: usize) -> AigManager {
        AigManager {
            nodes: vec![AigNode::Const],
            cis: Vec::with_capacity(n_inputs),
            cos: Vec::new(),
            and_cache: FxHashMap::default(),
        }
    }

    /// The constant-1 literal.
    pub fn const1(&self) -> AigLit {
        AigLit::new(AigRef::CONST, false)
    }

    /// Create a new primary input.
    pub fn create_ci(&mut self) -> AigLit {
        let node = AigRef(self.nodes.len() as u32);
        self.nodes.push(AigNode::Ci {
            index: self.cis.len(),
        });
        self.cis.push(node);
        AigLit::new(node, false)
    }

    /// Build (or reuse, via hash-consing) the AND of `a` and `b`.
    pub fn and(&mut self, a: AigLit, b: AigLit) -> AigLit {
        if a.is_const1() {
            return b;
        }
        if b.is_const1() {
            return a;
        }
        if a.node == b.node {
            return if a.negated == b.negated {
                a
            } else {
                AigLit::new(AigRef::CONST, true) // x AND !x = const 0
            };
        }
        let key = if a <= b { (a, b) } else { (b, a) };
        if let Some(&node) = self.and_cache.get(&key) {
            return AigLit::new(node, false);
        }
        let node = AigRef(self.nodes.len() as u32);
        self.nodes.push(AigNode::And {
            fanin0: key.0,
            fanin1: key.1,
        });
        self.and_cache.insert(key, node);
        AigLit::new(node, false)
    }

    /// `a OR b`, built as `!(!a AND !b)`.
    pub fn or(&mut self, a: AigLit, b: AigLit) -> AigLit {
        !self.and(!a, !b)
    }

    /// `if sel { then_branch } else { else_branch }`.
    pub fn mux(&mut self, sel: AigLit, then_branch: AigLit, else_branch: AigLit) -> AigLit {
        let t = self.and(sel, then_branch);
        let e = self.and(!sel, else_branch);
        self.or(t, e)
    }

    /// Register `fanin` as a (the) primary output, returning its index.
    pub fn create_co(&mut self, fanin: AigLit) -> usize {
        self.cos.push(fanin);
        self.cos.len() - 1
    }

    /// Drop AND nodes unreachable from any primary output, returning how
    /// many were removed. Node indices of surviving nodes are unchanged.
    pub fn cleanup(&mut self) -> usize {
        let mut reachable = vec![false; self.nodes.len()];
        reachable[AigRef::CONST.index()] = true;
        let mut stack: Vec<AigRef> = self.cos.iter().map(|lit| lit.node).collect();
        while let Some(r) = stack.pop() {
            if reachable[r.index()] {
                continue;
            }
            reachable[r.index()] = true;
            if let AigNode::And { fanin0, fanin1 } = &self.nodes[r.index()] {
                stack.push(fanin0.node);
                stack.push(fanin1.node);
            }
        }
        let removed = reachable.iter().filter(|&&r| !r).count();
        self.and_cache
            .retain(|_, node| reachable[node.index()]);
        removed
    }

    /// Iterate primary inputs in creation order.
    pub fn for_each_ci(&self) -> impl Iterator<Item = AigRef> + '_ {
        self.cis.iter().copied()
    }

    /// Iterate primary outputs in creation order.
    pub fn for_each_co(&self) -> impl Iterator<Item = AigLit> + '_ {
        self.cos.iter().copied()
    }

    /// Number of interior AND nodes (excludes the constant and CIs).
    pub fn node_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, AigNode::And { .. }))
            .count()
    }

    pub fn is_const1_node(&self, r: AigRef) -> bool {
        r == AigRef::CONST
    }

    pub fn is_ci_node(&self, r: AigRef) -> bool {
        matches!(self.nodes[r.index()], AigNode::Ci { .. })
    }

    /// Fanins of an AND node, or `None` if `r` is not an AND node.
    pub fn and_fanins(&self, r: AigRef) -> Option<(AigLit, AigLit)> {
        match self.nodes[r.index()] {
            AigNode::And { fanin0, fanin1 } => Some((fanin0, fanin1)),
            _ => None,
        }
    }

    /// AND nodes reachable from the primary outputs, in post (DFS) order:
    /// every node appears after both of its fanins.
    pub fn dfs_order(&self) -> Vec<AigRef> {
        let mut order = Vec::new();
        let mut done = vec![false; self.nodes.len()];
        done[AigRef::CONST.index()] = true;
        for ci in &self.cis {
            done[ci.index()] = true;
        }

        let mut stack: Vec<(AigRef, bool)> =
            self.cos.iter().map(|lit| (lit.node, false)).collect();

        while let Some((r, children_pushed)) = stack.pop() {
            if done[r.index()] {
                continue;
            }
            if let AigNode::And { fanin0, fanin1 } = &self.nodes[r.index()] {
                if !children_pushed {
                    stack.push((r, true));
                    if !done[fanin1.node.index()] {
                        stack.push((fanin1.node, false));
                    }
                    if !done[fanin0.node.index()] {
                        stack.push((fanin0.node, false));
                    }
                } else {
                    done[r.index()] = true;
                    order.push(r);
                }
            } else {
                done[r.index()] = true;
            }
        }
        order
    }

    /// A structural optimization pass: rebuild the manager from only the
    /// nodes reachable from the primary outputs. Because construction
    /// already hash-conses every AND node, this mainly shrinks AIGs built by
    /// callers that created and then abandoned intermediate nodes; it is a
    /// stand-in for a full rewriting library (out of scope per the spec).
    pub fn rewrite(&self) -> AigManager {
        let mut fresh = AigManager::start_manager(self.cis.len());
        let mut translated: FxHashMap<AigRef, AigLit> = FxHashMap::default();
        translated.insert(AigRef::CONST, fresh.const1());
        for &ci in &self.cis {
            let new_ci = fresh.create_ci();
            translated.insert(ci, new_ci);
        }

        let translate_lit = |translated: &FxHashMap<AigRef, AigLit>, lit: AigLit| -> AigLit {
            let base = translated[&lit.node];
            if lit.negated {
                !base
            } else {
                base
            }
        };

        for node in self.dfs_order() {
            let (fanin0, fanin1) = self.and_fanins(node).expect("dfs_order only yields ANDs");
            let a = translate_lit(&translated, fanin0);
            let b = translate_lit(&translated, fanin1);
            let new_node = fresh.and(a, b);
            translated.insert(node, new_node);
        }

        for &co in &self.cos {
            let lit = translate_lit(&translated, co);
            fresh.create_co(lit);
        }

        fresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_is_commutative_and_hash_consed() {
        let mut aig = AigManager::start_manager(2);
        let a = aig.create_ci();
        let b = aig.create_ci();
        let ab1 = aig.and(a, b);
        let ab2 = aig.and(b, a);
        assert_eq!(ab1, ab2);
        assert_eq!(aig.node_count(), 1);
    }

    #[test]
    fn and_with_negation_simplifies() {
        let mut aig = AigManager::start_manager(1);
        let a = aig.create_ci();
        let contradiction = aig.and(a, !a);
        assert_eq!(contradiction, !aig.const1());
    }

    #[test]
    fn mux_selects_branch_by_dfs_order() {
        let mut aig = AigManager::start_manager(3);
        let sel = aig.create_ci();
        let then_branch = aig.create_ci();
        let else_branch = aig.create_ci();
        let out = aig.mux(sel, then_branch, else_branch);
        aig.create_co(out);
        assert!(aig.node_count() >= 2);
        assert_eq!(aig.dfs_order().len(), aig.node_count());
    }

    #[test]
    fn rewrite_preserves_output_count() {
        let mut aig = AigManager::start_manager(2);
        let a = aig.create_ci();
        let b = aig.create_ci();
        let out = aig.and(a, b);
        aig.create_co(out);
        let rewritten = aig.rewrite();
        assert_eq!(rewritten.for_each_co().count(), 1);
        assert_eq!(rewritten.node_count(), 1);
    }
}
