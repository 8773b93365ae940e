//! QDIMACS parser and writer.
//!
//! QDIMACS extends DIMACS CNF with quantifier block lines (`a ... 0` for a
//! universal block, `e ... 0` for an existential block) between the header
//! and the clauses. Variables never mentioned in a quantifier block are
//! existentially quantified, matching the convention of the reference
//! definability tool this format was taken from.
//!
//! Unlike a production DIMACS parser this one is not incremental: the whole
//! input is read up front, since the CLI this feeds always has the full
//! instance in memory before the first solve.

use std::io;

use definability_formula::{CnfFormula, Lit, Var};

use anyhow::Error;
use thiserror::Error;

/// Possible errors while parsing a QDIMACS formula.
#[derive(Debug, Error)]
pub enum ParserError {
    #[error("line {}: invalid header syntax: {}", line, header)]
    InvalidHeader { line: usize, header: String },
    #[error("line {}: invalid quantifier block: {}", line, text)]
    InvalidQuantifierBlock { line: usize, text: String },
    #[error("line {}: quantifier block after clauses have started", line)]
    QuantifierAfterClauses { line: usize },
    #[error("line {}: unterminated clause", line)]
    UnterminatedClause { line: usize },
    #[error("line {}: variable index is too large: {}", line, index)]
    VariableTooLarge { line: usize, index: usize },
    #[error("missing header line")]
    MissingHeader,
    #[error(
        "formula has {} variables while the header specifies {} variables",
        var_count,
        header_var_count
    )]
    VarCount {
        var_count: usize,
        header_var_count: usize,
    },
    #[error(
        "formula has {} clauses while the header specifies {} clauses",
        clause_count,
        header_clause_count
    )]
    ClauseCount {
        clause_count: usize,
        header_clause_count: usize,
    },
}

/// Variable and clause count present in a QDIMACS header.
#[derive(Copy, Clone, Debug)]
pub struct QdimacsHeader {
    pub var_count: usize,
    pub clause_count: usize,
}

/// A parsed quantified formula: a prefix of alternating quantifier blocks
/// plus a propositional matrix in CNF.
///
/// Variables not named by any quantifier block are existential, as QDIMACS
/// leaves them implicitly bound in the innermost (matrix-adjacent) scope.
#[derive(Clone, Debug, Default)]
pub struct QdimacsInstance {
    formula: CnfFormula,
    is_existential: Vec<bool>,
    quantifier_order: Vec<Var>,
}

impl QdimacsInstance {
    /// Number of variables, taken from the header (or the highest variable
    /// mentioned, if larger).
    pub fn var_count(&self) -> usize {
        self.formula.var_count()
    }

    /// The propositional matrix.
    pub fn formula(&self) -> &CnfFormula {
        &self.formula
    }

    /// Whether `var` is existentially quantified.
    pub fn is_existential(&self, var: Var) -> bool {
        let index = var.index();
        self.is_existential.get(index).copied().unwrap_or(true)
    }

    /// Every variable, in the order given by the quantifier prefix (innermost
    /// last). Variables named by no block are implicitly existential and
    /// innermost, so they are appended in increasing index order after every
    /// named variable.
    pub fn quantifier_order(&self) -> &[Var] {
        &self.quantifier_order
    }
}

/// Parse a QDIMACS instance from `input`.
pub fn parse_qdimacs(input: impl io::Read) -> Result<QdimacsInstance, Error> {
    use io::Read;

    let mut text = String::new();
    let mut input = input;
    input.read_to_string(&mut text)?;

    let mut header: Option<QdimacsHeader> = None;
    let mut is_existential: Vec<bool> = Vec::new();
    let mut quantifier_order: Vec<Var> = Vec::new();
    let mut named: Vec<bool> = Vec::new();
    let mut formula = CnfFormula::new();
    let mut partial_clause: Vec<Lit> = Vec::new();
    let mut clause_count = 0usize;
    let mut clauses_started = false;

    for (line_index, raw_line) in text.lines().enumerate() {
        let line = line_index + 1;
        let trimmed = raw_line.trim();

        if trimmed.is_empty() || trimmed.starts_with('c') {
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix("p ") {
            if header.is_some() {
                return Err(ParserError::InvalidHeader {
                    line,
                    header: trimmed.to_string(),
                }
                .into());
            }
            let mut parts = rest.split_whitespace();
            if parts.next() != Some("cnf") {
                return Err(ParserError::InvalidHeader {
                    line,
                    header: trimmed.to_string(),
                }
                .into());
            }
            let var_count: usize = parts
                .next()
                .and_then(|value| value.parse().ok())
                .ok_or_else(|| ParserError::InvalidHeader {
                    line,
                    header: trimmed.to_string(),
                })?;
            let clause_count_header: usize = parts
                .next()
                .and_then(|value| value.parse().ok())
                .ok_or_else(|| ParserError::InvalidHeader {
                    line,
                    header: trimmed.to_string(),
                })?;
            if parts.next().is_some() {
                return Err(ParserError::InvalidHeader {
                    line,
                    header: trimmed.to_string(),
                }
                .into());
            }
            if var_count > Var::max_count() {
                return Err(ParserError::VariableTooLarge {
                    line,
                    index: var_count,
                }
                .into());
            }
            formula.set_var_count(var_count);
            is_existential = vec![true; var_count];
            named = vec![false; var_count];
            header = Some(QdimacsHeader {
                var_count,
                clause_count: clause_count_header,
            });
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix('a').or_else(|| trimmed.strip_prefix('e')) {
            if clauses_started {
                return Err(ParserError::QuantifierAfterClauses { line }.into());
            }
            let existential = trimmed.starts_with('e');
            let rest = rest.trim();
            let mut values: Vec<usize> = Vec::new();
            for token in rest.split_whitespace() {
                let value: isize = token.parse().map_err(|_| ParserError::InvalidQuantifierBlock {
                    line,
                    text: trimmed.to_string(),
                })?;
                if value == 0 {
                    break;
                }
                if value < 0 {
                    return Err(ParserError::InvalidQuantifierBlock {
                        line,
                        text: trimmed.to_string(),
                    }
                    .into());
                }
                values.push(value as usize);
            }
            if !rest.trim_end().ends_with('0') {
                return Err(ParserError::InvalidQuantifierBlock {
                    line,
                    text: trimmed.to_string(),
                }
                .into());
            }
            for var_index in values {
                let zero_based = var_index - 1;
                if zero_based >= is_existential.len() {
                    return Err(ParserError::VariableTooLarge {
                        line,
                        index: var_index,
                    }
                    .into());
                }
                is_existential[zero_based] = existential;
                named[zero_based] = true;
                quantifier_order.push(Var::from_index(zero_based));
            }
            continue;
        }

        if header.is_none() {
            return Err(ParserError::MissingHeader.into());
        }
        clauses_started = true;

        for token in trimmed.split_whitespace() {
            let value: isize = token.parse().map_err(|_| ParserError::InvalidHeader {
                line,
                header: trimmed.to_string(),
            })?;
            if value == 0 {
                formula.add_clause(&partial_clause);
                partial_clause.clear();
                clause_count += 1;
            } else {
                let var_index = value.unsigned_abs();
                if var_index > Var::max_count() {
                    return Err(ParserError::VariableTooLarge {
                        line,
                        index: var_index,
                    }
                    .into());
                }
                partial_clause.push(Var::from_dimacs(value.abs()).lit(value > 0));
            }
        }
    }

    if !partial_clause.is_empty() {
        return Err(ParserError::UnterminatedClause {
            line: text.lines().count(),
        }
        .into());
    }

    let header = header.ok_or(ParserError::MissingHeader)?;

    if formula.var_count() < header.var_count {
        formula.set_var_count(header.var_count);
    }
    if formula.var_count() != header.var_count {
        return Err(ParserError::VarCount {
            var_count: formula.var_count(),
            header_var_count: header.var_count,
        }
        .into());
    }
    if clause_count != header.clause_count {
        return Err(ParserError::ClauseCount {
            clause_count,
            header_clause_count: header.clause_count,
        }
        .into());
    }

    is_existential.resize(formula.var_count(), true);
    named.resize(formula.var_count(), false);
    for (index, is_named) in named.iter().enumerate() {
        if !is_named {
            quantifier_order.push(Var::from_index(index));
        }
    }

    Ok(QdimacsInstance {
        formula,
        is_existential,
        quantifier_order,
    })
}

/// Write a QDIMACS header line.
pub fn write_qdimacs_header(target: &mut impl io::Write, header: QdimacsHeader) -> io::Result<()> {
    writeln!(
        target,
        "p cnf {var_count} {clause_count}",
        var_count = header.var_count,
        clause_count = header.clause_count
    )
}

/// Write the instance's quantifier prefix, one block per contiguous run of
/// same-kind variables in index order.
pub fn write_qdimacs_prefix(target: &mut impl io::Write, instance: &QdimacsInstance) -> io::Result<()> {
    let mut current: Option<bool> = None;
    let mut block: Vec<usize> = Vec::new();

    let flush = |target: &mut dyn io::Write, kind: bool, block: &[usize]| -> io::Result<()> {
        if block.is_empty() {
            return Ok(());
        }
        write!(target, "{} ", if kind { "e" } else { "a" })?;
        for var_index in block {
            write!(target, "{} ", var_index)?;
        }
        writeln!(target, "0")
    };

    for var_index in 1..=instance.var_count() {
        let kind = instance.is_existential[var_index - 1];
        match current {
            Some(existing) if existing == kind => block.push(var_index),
            Some(existing) => {
                flush(target, existing, &block)?;
                block.clear();
                block.push(var_index);
                current = Some(kind);
            }
            None => {
                block.push(var_index);
                current = Some(kind);
            }
        }
    }
    if let Some(kind) = current {
        flush(target, kind, &block)?;
    }
    Ok(())
}

/// Write a full QDIMACS instance (header, quantifier prefix, clauses).
pub fn write_qdimacs(target: &mut impl io::Write, instance: &QdimacsInstance) -> io::Result<()> {
    write_qdimacs_header(
        &mut *target,
        QdimacsHeader {
            var_count: instance.var_count(),
            clause_count: instance.formula.len(),
        },
    )?;
    write_qdimacs_prefix(&mut *target, instance)?;
    for clause in instance.formula.iter() {
        for lit in clause {
            itoa::write(&mut *target, lit.to_dimacs())?;
            target.write_all(b" ")?;
        }
        target.write_all(b"0\n")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use definability_formula::cnf::strategy::cnf_formula;
    use proptest::prelude::*;

    #[test]
    fn parses_header_prefix_and_clauses() {
        let input = b"c a comment\np cnf 3 2\na 1 0\ne 2 3 0\n1 2 0\n-2 3 0\n" as &[_];
        let instance = parse_qdimacs(input).unwrap();
        assert_eq!(instance.var_count(), 3);
        assert_eq!(instance.formula().len(), 2);
        assert!(!instance.is_existential(Var::from_dimacs(1)));
        assert!(instance.is_existential(Var::from_dimacs(2)));
        assert!(instance.is_existential(Var::from_dimacs(3)));
    }

    #[test]
    fn quantifier_order_follows_prefix_then_unnamed_variables() {
        let input = b"p cnf 4 1\na 1 0\ne 3 2 0\n1 2 3 4 0\n" as &[_];
        let instance = parse_qdimacs(input).unwrap();
        let order: Vec<isize> = instance.quantifier_order().iter().map(|v| v.to_dimacs()).collect();
        assert_eq!(order, vec![1, 3, 2, 4]);
    }

    #[test]
    fn variables_outside_any_block_default_to_existential() {
        let input = b"p cnf 2 1\n1 2 0\n" as &[_];
        let instance = parse_qdimacs(input).unwrap();
        assert!(instance.is_existential(Var::from_dimacs(1)));
        assert!(instance.is_existential(Var::from_dimacs(2)));
    }

    #[test]
    fn mismatched_clause_count_is_rejected() {
        let input = b"p cnf 2 2\n1 2 0\n" as &[_];
        assert!(parse_qdimacs(input).is_err());
    }

    #[test]
    fn quantifier_block_after_clauses_is_rejected() {
        let input = b"p cnf 2 1\n1 2 0\na 1 0\n" as &[_];
        assert!(parse_qdimacs(input).is_err());
    }

    #[test]
    fn roundtrip_through_writer() {
        let input = b"p cnf 3 2\na 1 0\ne 2 3 0\n1 2 0\n-2 3 0\n" as &[_];
        let instance = parse_qdimacs(input).unwrap();
        let mut buf = Vec::new();
        write_qdimacs(&mut buf, &instance).unwrap();
        let reparsed = parse_qdimacs(&buf[..]).unwrap();
        assert_eq!(reparsed.var_count(), instance.var_count());
        assert_eq!(reparsed.formula().len(), instance.formula().len());
        assert!(!reparsed.is_existential(Var::from_dimacs(1)));
    }

    proptest! {

        #[test]
        fn roundtrip(input in cnf_formula(1..50usize, 0..200, 0..6)) {
            let mut text = format!("p cnf {} {}\n", input.var_count(), input.len());
            for clause in input.iter() {
                for lit in clause {
                    text.push_str(&lit.to_dimacs().to_string());
                    text.push(' ');
                }
                text.push_str("0\n");
            }

            let instance = parse_qdimacs(text.as_bytes()).map_err(|e| TestCaseError::fail(e.to_string()))?;

            let mut buf = Vec::new();
            write_qdimacs(&mut buf, &instance).map_err(|e| TestCaseError::fail(e.to_string()))?;
            let reparsed = parse_qdimacs(&buf[..]).map_err(|e| TestCaseError::fail(e.to_string()))?;

            prop_assert_eq!(reparsed.formula(), instance.formula());
            prop_assert_eq!(reparsed.var_count(), instance.var_count());
        }
    }
}
