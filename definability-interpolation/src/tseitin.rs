//! Tseitin encoding of a synthesized AIG into CNF.
//!
//! Variable assignment order is fixed, not incidental: the primary output
//! gets `k0`, the constant-1 node gets `k0 + 1`, then every interior AND
//! node gets the next id in DFS order. Primary inputs are never assigned
//! fresh ids -- the caller supplies one per input, in creation order,
//! since each one already denotes a public variable the rest of the
//! extractor needs to recognize.

use std::collections::HashMap;

use definability_aig::{AigManager, AigRef};

/// `clauses` plus the id assigned to the AIG's single primary output.
pub(crate) fn encode_to_cnf(aig: &AigManager, k0: i64, input_variables: &[i64]) -> (Vec<Vec<i64>>, i64) {
    let po_var = k0;
    let const1_var = k0 + 1;
    let mut next_id = k0 + 2;

    let mut var_of: HashMap<AigRef, i64> = HashMap::new();
    for (i, ci) in aig.for_each_ci().enumerate() {
        var_of.insert(ci, input_variables[i]);
    }

    let order = aig.dfs_order();
    for &node in &order {
        var_of.insert(node, next_id);
        next_id += 1;
    }

    let lit_of = |lit: definability_aig::AigLit, var_of: &HashMap<AigRef, i64>| -> i64 {
        if aig.is_const1_node(lit.node()) {
            if lit.is_negated() {
                -const1_var
            } else {
                const1_var
            }
        } else {
            let v = var_of[&lit.node()];
            if lit.is_negated() {
                -v
            } else {
                v
            }
        }
    };

    let mut clauses = Vec::new();
    let mut const1_referenced = false;

    for &node in &order {
        let (fanin0, fanin1) = aig.and_fanins(node).expect("dfs_order yields only AND nodes");
        let o = var_of[&node];
        let la = lit_of(fanin0, &var_of);
        let lb = lit_of(fanin1, &var_of);
        clauses.push(vec![la, -o]);
        clauses.push(vec![lb, -o]);
        clauses.push(vec![-la, -lb, o]);
    }

    let po_fanin = aig
        .for_each_co()
        .next()
        .expect("the synthesized AIG always has exactly one primary output");
    if aig.is_const1_node(po_fanin.node()) {
        const1_referenced = true;
    }
    let l_in = lit_of(po_fanin, &var_of);
    clauses.push(vec![l_in, -po_var]);
    clauses.push(vec![-l_in, po_var]);

    if const1_referenced {
        clauses.push(vec![const1_var]);
    }

    (clauses, po_var)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_a_two_input_and_gate() {
        let mut aig = AigManager::start_manager(2);
        let a = aig.create_ci();
        let b = aig.create_ci();
        let out = aig.and(a, b);
        aig.create_co(out);

        let (clauses, po_var) = encode_to_cnf(&aig, 100, &[10, 20]);
        assert_eq!(po_var, 100);
        // One AND node (3 clauses) plus 2 biconditional PO clauses.
        assert_eq!(clauses.len(), 5);
    }

    #[test]
    fn constant_output_emits_a_unit_clause() {
        let mut aig = AigManager::start_manager(0);
        let out = aig.const1();
        aig.create_co(out);

        let (clauses, po_var) = encode_to_cnf(&aig, 50, &[]);
        let const1_var = 51;
        assert!(clauses.contains(&vec![const1_var]));
        assert!(clauses.contains(&vec![const1_var, -po_var]));
    }
}
