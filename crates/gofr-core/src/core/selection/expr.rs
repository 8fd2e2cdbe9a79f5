use super::lexer::CmpOp;
use crate::core::models::frame::Frame;

/// Boolean expression over a candidate tuple of atoms.
///
/// Variables are zero-based here (`#1` is stored as `0`).
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    All,
    None,
    Name { var: usize, value: String },
    Index { var: usize, op: CmpOp, value: usize },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
}

impl Expr {
    pub fn is_match(&self, frame: &Frame, candidate: &[usize]) -> bool {
        match self {
            Expr::All => true,
            Expr::None => false,
            Expr::Name { var, value } => frame
                .name(candidate[*var])
                .is_some_and(|name| name == value),
            Expr::Index { var, op, value } => op.apply(candidate[*var], *value),
            Expr::And(lhs, rhs) => lhs.is_match(frame, candidate) && rhs.is_match(frame, candidate),
            Expr::Or(lhs, rhs) => lhs.is_match(frame, candidate) || rhs.is_match(frame, candidate),
            Expr::Not(inner) => !inner.is_match(frame, candidate),
        }
    }

    /// Largest variable referenced by the expression, zero-based.
    pub fn max_variable(&self) -> Option<usize> {
        match self {
            Expr::All | Expr::None => None,
            Expr::Name { var, .. } | Expr::Index { var, .. } => Some(*var),
            Expr::And(lhs, rhs) | Expr::Or(lhs, rhs) => lhs.max_variable().max(rhs.max_variable()),
            Expr::Not(inner) => inner.max_variable(),
        }
    }
}
