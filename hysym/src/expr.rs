//! Node protocol and the canonical expression tree.
//!
//! Role
//! - [`Expr`] is the protocol every node implements: type tag, category, structural
//!   equivalence, checked rendering, and the tree operations (generalize, specialize, copy,
//!   simplify) in a sequential and a parallel form.
//! - [`Expression`] is the canonical, fully generalized tree: every binary operator stored in
//!   it uses `Expression` for both operand slots.
//! - [`ExprKind`] carries the per-kind metadata as associated constants.
//!
//! Example
//! ```
//! use hysym::prelude::*;
//!
//! let e = Expression::real(2.0) + Expression::variable("x");
//! assert_eq!(e.expr_type(), ExprType::Add);
//! assert!(e.category().contains(ExprCategory::COMMUTATIVE));
//! assert_eq!(e.to_string(), "(2 + x)");
//! ```
use std::{borrow::Cow, fmt};

use bitflags::bitflags;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use strum::{Display, EnumDiscriminants, EnumIs, EnumIter, EnumTryAs};

use crate::{
    error::ExprResult,
    flow::Subflow,
    leaf::{Real, Variable},
    ops::{Add, Divide, Exponent, Multiply, Subtract},
};

bitflags! {
    /// Algebraic properties advertised by an expression kind.
    ///
    /// These are consumed by higher-level rewriting passes. Generalization and specialization
    /// never reorder or flatten operands based on them.
    #[derive(Default, Clone, Copy, PartialEq, Eq, Hash, Debug)]
    pub struct ExprCategory: u32 {
        /// `(a op b) op c == a op (b op c)`
        const ASSOCIATIVE = 1 << 0;

        /// `a op b == b op a`
        const COMMUTATIVE = 1 << 1;

        /// The kind has two operand slots.
        const BINARY = 1 << 2;

        /// The kind has no children.
        const LEAF = 1 << 3;
    }
}

/// Protocol implemented by every expression node, constrained or canonical.
///
/// Every tree operation comes in two forms. The `_in` variants take a [`Subflow`] and fork
/// independent subtree work onto the worker pool; both forms always produce the same result.
///
/// `Display` never fails: absent operand slots show as
/// [`ABSENT_OPERAND`](crate::binary::ABSENT_OPERAND). [`Expr::render`] is the checked form.
pub trait Expr: Clone + fmt::Debug + fmt::Display + Send + Sync + 'static {
    /// Type tag of this node.
    fn expr_type(&self) -> ExprType;

    /// Category bitmask of this node's kind.
    fn category(&self) -> ExprCategory;

    /// Same kind, same slot presence, and structurally equivalent children. Leaf values are
    /// not compared.
    fn structurally_equivalent(&self, other: &Expression) -> bool;

    /// Render as an infix string. Fails on a node with an absent operand slot.
    fn render(&self) -> ExprResult<String>;

    /// Erase operand-type constraints, keeping structure and values.
    fn generalize(&self) -> Expression;

    /// Parallel form of [`Expr::generalize`].
    fn generalize_in(&self, flow: &Subflow<'_, '_>) -> Expression;

    /// Canonical view of this node, borrowed when the node already is canonical.
    fn to_canonical(&self) -> Cow<'_, Expression> {
        Cow::Owned(self.generalize())
    }

    /// Parallel form of [`Expr::to_canonical`].
    fn to_canonical_in(&self, flow: &Subflow<'_, '_>) -> Cow<'_, Expression> {
        Cow::Owned(self.generalize_in(flow))
    }

    /// Re-impose this type's operand constraints on `other`.
    ///
    /// Returns `None` when `other` is a different kind or when any of its children does not
    /// conform to the corresponding slot type.
    fn specialize<E: Expr>(other: &E) -> Option<Self>;

    /// Parallel form of [`Expr::specialize`].
    fn specialize_in<E: Expr>(other: &E, flow: &Subflow<'_, '_>) -> Option<Self>;

    /// Deep copy, forking one task per child. The sequential form is [`Clone`].
    fn copy_in(&self, flow: &Subflow<'_, '_>) -> Self;

    /// Rebuild the tree bottom-up, folding operators whose operands are both literals.
    fn simplify(&self) -> Expression;

    /// Parallel form of [`Expr::simplify`].
    fn simplify_in(&self, flow: &Subflow<'_, '_>) -> Expression;
}

/// Static metadata of a concrete node kind.
pub trait ExprKind: Expr {
    const TYPE: ExprType;
    const CATEGORY: ExprCategory;
}

/// Canonical expression tree.
///
/// The generated [`ExprType`] discriminant (via `strum`) is the type tag of every node kind.
#[derive(Debug, Clone, PartialEq, EnumIs, EnumTryAs, EnumDiscriminants)]
#[strum_discriminants(name(ExprType), derive(Hash, EnumIter, Display))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Expression {
    // Leaves
    Real(Real),
    Variable(Variable),

    // Binary operators
    Add(Add),
    Subtract(Subtract),
    Multiply(Multiply),
    Divide(Divide),
    Exponent(Exponent),
}

impl Expression {
    /// Numeric literal.
    pub fn real(value: f64) -> Self {
        Expression::Real(Real::new(value))
    }

    /// Named symbol.
    pub fn variable(name: impl Into<String>) -> Self {
        Expression::Variable(Variable::new(name))
    }

    /// Number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        match self.operands() {
            Some((most, least)) => {
                1 + most.map_or(0, Expression::node_count) + least.map_or(0, Expression::node_count)
            }
            None => 1,
        }
    }

    /// Both operand slots of a binary node, `None` for leaves.
    pub fn operands(&self) -> Option<(Option<&Expression>, Option<&Expression>)> {
        use crate::binary::BinaryExpr;

        let operands = match self {
            Expression::Real(_) | Expression::Variable(_) => return None,
            Expression::Add(node) => node.operands(),
            Expression::Subtract(node) => node.operands(),
            Expression::Multiply(node) => node.operands(),
            Expression::Divide(node) => node.operands(),
            Expression::Exponent(node) => node.operands(),
        };
        Some((operands.most_sig_op(), operands.least_sig_op()))
    }
}

macro_rules! define_expression_dispatch {
    (
        $($variant:ident),* $(,)?
    ) => {
        impl Expr for Expression {
            fn expr_type(&self) -> ExprType {
                self.into()
            }

            fn category(&self) -> ExprCategory {
                match self {
                    $(
                        Expression::$variant(node) => node.category(),
                    )*
                }
            }

            fn structurally_equivalent(&self, other: &Expression) -> bool {
                match self {
                    $(
                        Expression::$variant(node) => node.structurally_equivalent(other),
                    )*
                }
            }

            fn render(&self) -> ExprResult<String> {
                match self {
                    $(
                        Expression::$variant(node) => node.render(),
                    )*
                }
            }

            fn generalize(&self) -> Expression {
                match self {
                    $(
                        Expression::$variant(node) => node.generalize(),
                    )*
                }
            }

            fn generalize_in(&self, flow: &Subflow<'_, '_>) -> Expression {
                match self {
                    $(
                        Expression::$variant(node) => node.generalize_in(flow),
                    )*
                }
            }

            fn to_canonical(&self) -> Cow<'_, Expression> {
                Cow::Borrowed(self)
            }

            fn to_canonical_in(&self, _flow: &Subflow<'_, '_>) -> Cow<'_, Expression> {
                Cow::Borrowed(self)
            }

            // Every tree conforms to the unconstrained slot type.
            fn specialize<E: Expr>(other: &E) -> Option<Self> {
                Some(other.to_canonical().into_owned())
            }

            fn specialize_in<E: Expr>(other: &E, flow: &Subflow<'_, '_>) -> Option<Self> {
                Some(other.to_canonical_in(flow).into_owned())
            }

            fn copy_in(&self, flow: &Subflow<'_, '_>) -> Self {
                match self {
                    $(
                        Expression::$variant(node) => Expression::$variant(node.copy_in(flow)),
                    )*
                }
            }

            fn simplify(&self) -> Expression {
                match self {
                    $(
                        Expression::$variant(node) => node.simplify(),
                    )*
                }
            }

            fn simplify_in(&self, flow: &Subflow<'_, '_>) -> Expression {
                match self {
                    $(
                        Expression::$variant(node) => node.simplify_in(flow),
                    )*
                }
            }
        }
    };
}

define_expression_dispatch! {
    Real,
    Variable,
    Add,
    Subtract,
    Multiply,
    Divide,
    Exponent,
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Real(node) => fmt::Display::fmt(node, f),
            Expression::Variable(node) => fmt::Display::fmt(node, f),
            Expression::Add(node) => fmt::Display::fmt(node, f),
            Expression::Subtract(node) => fmt::Display::fmt(node, f),
            Expression::Multiply(node) => fmt::Display::fmt(node, f),
            Expression::Divide(node) => fmt::Display::fmt(node, f),
            Expression::Exponent(node) => fmt::Display::fmt(node, f),
        }
    }
}

// Operator sugar building canonical nodes.
macro_rules! define_ops_expression {
    ($($trait_:ident :: $method:ident => $variant:ident),* $(,)?) => {
        $(
            impl std::ops::$trait_ for Expression {
                type Output = Expression;

                fn $method(self, rhs: Expression) -> Expression {
                    Expression::$variant($variant::new(self, rhs))
                }
            }
        )*
    };
}

define_ops_expression! {
    Add::add => Add,
    Sub::sub => Subtract,
    Mul::mul => Multiply,
    Div::div => Divide,
    BitXor::bitxor => Exponent,
}
