//! A small atom selection language.
//!
//! A selection is an optional context followed by a boolean expression:
//!
//! ```text
//! name O
//! pairs: name(#1) O and name(#2) H
//! ```
//!
//! The context (`atoms`/`one`, `pairs`/`two`, `three`, `four`) fixes the
//! arity, i.e. how many atoms each match contains. Single-atom selections are
//! evaluated with [`Selection::list`], multi-atom selections with
//! [`Selection::evaluate`], which returns every ordered tuple of distinct
//! atoms satisfying the expression.

mod expr;
mod lexer;
mod parser;

pub use expr::Expr;
pub use lexer::CmpOp;

use crate::core::models::frame::Frame;
use itertools::Itertools;
use thiserror::Error;

/// Largest supported arity.
pub const MAX_ARITY: usize = 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Selection string is empty")]
    Empty,
    #[error("Unknown selection context '{0}'")]
    UnknownContext(String),
    #[error("Unexpected character '{character}' at position {position}")]
    UnexpectedCharacter { character: char, position: usize },
    #[error("Unexpected '{found}', expected {expected}")]
    UnexpectedToken {
        found: String,
        expected: &'static str,
    },
    #[error("Unexpected end of selection, expected {expected}")]
    UnexpectedEnd { expected: &'static str },
    #[error("Invalid variable #{0}")]
    InvalidVariable(usize),
    #[error("Variable #{variable} is out of range for a selection of {arity} atom(s)")]
    VariableOutOfRange { variable: usize, arity: usize },
    #[error("Invalid number '{0}'")]
    InvalidNumber(String),
    #[error("Can not list atoms of a selection matching {0} atoms; use evaluate instead")]
    NotSingleAtom(usize),
}

/// One match of a selection: `size` atom indices in variable order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    atoms: [usize; MAX_ARITY],
    size: usize,
}

impl Match {
    pub fn new(atoms: &[usize]) -> Self {
        debug_assert!(!atoms.is_empty() && atoms.len() <= MAX_ARITY);
        let mut storage = [0; MAX_ARITY];
        storage[..atoms.len()].copy_from_slice(atoms);
        Self {
            atoms: storage,
            size: atoms.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.atoms[..self.size]
    }
}

impl std::ops::Index<usize> for Match {
    type Output = usize;

    fn index(&self, index: usize) -> &usize {
        &self.as_slice()[index]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    text: String,
    arity: usize,
    expr: Expr,
}

impl Selection {
    pub fn new(selection: &str) -> Result<Self, SelectionError> {
        let (arity, body) = split_context(selection)?;
        let expr = parser::Parser::new(lexer::tokenize(body)?).parse()?;

        if let Some(var) = expr.max_variable() {
            if var >= arity {
                return Err(SelectionError::VariableOutOfRange {
                    variable: var + 1,
                    arity,
                });
            }
        }

        Ok(Self {
            text: selection.to_string(),
            arity,
            expr,
        })
    }

    /// Number of atoms in each match.
    pub fn size(&self) -> usize {
        self.arity
    }

    /// The selection as it was written.
    pub fn string(&self) -> &str {
        &self.text
    }

    /// Indices of the atoms matching a single-atom selection, in ascending order.
    pub fn list(&self, frame: &Frame) -> Result<Vec<usize>, SelectionError> {
        if self.arity != 1 {
            return Err(SelectionError::NotSingleAtom(self.arity));
        }
        Ok((0..frame.size())
            .filter(|&i| self.expr.is_match(frame, &[i]))
            .collect())
    }

    /// Every ordered tuple of distinct atoms matching the selection.
    pub fn evaluate(&self, frame: &Frame) -> Vec<Match> {
        if self.arity == 1 {
            return (0..frame.size())
                .filter(|&i| self.expr.is_match(frame, &[i]))
                .map(|i| Match::new(&[i]))
                .collect();
        }

        (0..frame.size())
            .permutations(self.arity)
            .filter(|candidate| self.expr.is_match(frame, candidate))
            .map(|candidate| Match::new(&candidate))
            .collect()
    }
}

fn split_context(selection: &str) -> Result<(usize, &str), SelectionError> {
    let Some((context, body)) = selection.split_once(':') else {
        return Ok((1, selection));
    };

    let arity = match context.trim() {
        "atoms" | "one" => 1,
        "pairs" | "two" => 2,
        "three" => 3,
        "four" => 4,
        other => return Err(SelectionError::UnknownContext(other.to_string())),
    };
    Ok((arity, body))
}
