//! The binary operator family.
//!
//! Every operator is generic over the required types of its two operands,
//! `Op<A = Expression, B = A>`. `Op<Expression, Expression>` is the canonical form stored in
//! [`Expression`]; any other instantiation is a constrained view obtained through
//! [`Expr::specialize`] or direct construction.
//!
//! Example
//! ```
//! use hysym::prelude::*;
//!
//! let product: Multiply<Real, Variable> = mul(Real::new(4.0), Variable::new("y"));
//! let canonical = product.generalize();
//! assert_eq!(canonical.to_string(), "(4 * y)");
//!
//! // Operand types are checked when re-imposing constraints.
//! assert!(Multiply::<Real, Variable>::specialize(&canonical).is_some());
//! assert!(Multiply::<Variable, Real>::specialize(&canonical).is_none());
//! ```
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    binary::{self, BinaryExpr, BinaryOperands},
    error::{ExprError, ExprResult},
    expr::{Expr, ExprCategory, ExprKind, ExprType, Expression},
    flow::Subflow,
};

macro_rules! define_binary_expr {
    (
        $(#[$meta:meta])*
        $name:ident {
            symbol: $symbol:literal,
            category: $category:expr,
            fold: $fold:expr,
            builder: $builder:ident $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        pub struct $name<A = Expression, B = A> {
            operands: BinaryOperands<A, B>,
        }

        impl<A, B> Default for $name<A, B> {
            fn default() -> Self {
                Self {
                    operands: BinaryOperands::empty(),
                }
            }
        }

        impl<A: Expr, B: Expr> $name<A, B> {
            pub fn new(most_sig_op: A, least_sig_op: B) -> Self {
                Self {
                    operands: BinaryOperands::new(most_sig_op, least_sig_op),
                }
            }
        }

        impl<A: Expr, B: Expr> ExprKind for $name<A, B> {
            const TYPE: ExprType = ExprType::$name;
            const CATEGORY: ExprCategory = $category.union(ExprCategory::BINARY);
        }

        impl<A: Expr, B: Expr> BinaryExpr for $name<A, B> {
            type MostSig = A;
            type LeastSig = B;

            const SYMBOL: &'static str = $symbol;

            fn operands(&self) -> &BinaryOperands<A, B> {
                &self.operands
            }

            fn operands_mut(&mut self) -> &mut BinaryOperands<A, B> {
                &mut self.operands
            }

            fn from_operands(operands: BinaryOperands<A, B>) -> Self {
                Self { operands }
            }

            fn canonical_operands(
                expr: &Expression,
            ) -> Option<&BinaryOperands<Expression, Expression>> {
                match expr {
                    Expression::$name(node) => Some(&node.operands),
                    _ => None,
                }
            }

            fn wrap_canonical(operands: BinaryOperands<Expression, Expression>) -> Expression {
                Expression::$name($name { operands })
            }

            fn fold_literals(lhs: f64, rhs: f64) -> Option<f64> {
                let fold: fn(f64, f64) -> Option<f64> = $fold;
                fold(lhs, rhs)
            }
        }

        impl<A: Expr, B: Expr> Expr for $name<A, B> {
            fn expr_type(&self) -> ExprType {
                Self::TYPE
            }

            fn category(&self) -> ExprCategory {
                Self::CATEGORY
            }

            fn structurally_equivalent(&self, other: &Expression) -> bool {
                binary::structurally_equivalent(self, other)
            }

            fn render(&self) -> ExprResult<String> {
                binary::render(self)
            }

            fn generalize(&self) -> Expression {
                binary::generalize(self)
            }

            fn generalize_in(&self, flow: &Subflow<'_, '_>) -> Expression {
                binary::generalize_in(self, flow)
            }

            fn specialize<E: Expr>(other: &E) -> Option<Self> {
                binary::specialize(other)
            }

            fn specialize_in<E: Expr>(other: &E, flow: &Subflow<'_, '_>) -> Option<Self> {
                binary::specialize_in(other, flow)
            }

            fn copy_in(&self, flow: &Subflow<'_, '_>) -> Self {
                binary::copy_in(self, flow)
            }

            fn simplify(&self) -> Expression {
                binary::simplify(self)
            }

            fn simplify_in(&self, flow: &Subflow<'_, '_>) -> Expression {
                binary::simplify_in(self, flow)
            }
        }

        impl<A: Expr, B: Expr> fmt::Display for $name<A, B> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                binary::display(self, f)
            }
        }

        impl<A: Expr, B: Expr> From<$name<A, B>> for Expression {
            fn from(node: $name<A, B>) -> Self {
                node.generalize()
            }
        }

        impl<A: Expr, B: Expr> TryFrom<&Expression> for $name<A, B> {
            type Error = ExprError;

            fn try_from(expr: &Expression) -> ExprResult<Self> {
                Self::specialize(expr).ok_or(ExprError::SpecializationFailed {
                    target: Self::TYPE,
                    found: expr.expr_type(),
                })
            }
        }

        #[doc = concat!("Build a [`", stringify!($name), "`] node from two operands.")]
        pub fn $builder<A: Expr, B: Expr>(most_sig_op: A, least_sig_op: B) -> $name<A, B> {
            $name::new(most_sig_op, least_sig_op)
        }
    };
}

define_binary_expr! {
    /// Addition, `a + b`.
    Add {
        symbol: "+",
        category: ExprCategory::ASSOCIATIVE.union(ExprCategory::COMMUTATIVE),
        fold: |lhs, rhs| Some(lhs + rhs),
        builder: add,
    }
}

define_binary_expr! {
    /// Subtraction, `a - b`.
    Subtract {
        symbol: "-",
        category: ExprCategory::empty(),
        fold: |lhs, rhs| Some(lhs - rhs),
        builder: sub,
    }
}

define_binary_expr! {
    /// Multiplication, `a * b`.
    Multiply {
        symbol: "*",
        category: ExprCategory::ASSOCIATIVE.union(ExprCategory::COMMUTATIVE),
        fold: |lhs, rhs| Some(lhs * rhs),
        builder: mul,
    }
}

define_binary_expr! {
    /// Division, `a / b`.
    Divide {
        symbol: "/",
        category: ExprCategory::empty(),
        fold: |lhs, rhs| Some(lhs / rhs),
        builder: div,
    }
}

define_binary_expr! {
    /// Exponentiation, `a ^ b`.
    Exponent {
        symbol: "^",
        category: ExprCategory::empty(),
        fold: |lhs: f64, rhs| Some(lhs.powf(rhs)),
        builder: pow,
    }
}
