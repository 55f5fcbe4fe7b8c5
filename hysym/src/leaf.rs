//! Leaf nodes: numeric literals and named variables.
//!
//! Leaves have no operand slots, so their generalized form is themselves and their
//! specialization is a plain kind check.
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    error::ExprResult,
    expr::{Expr, ExprCategory, ExprKind, ExprType, Expression},
    flow::Subflow,
};

/// Real-valued literal.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Real {
    value: f64,
}

impl Real {
    pub fn new(value: f64) -> Self {
        Self { value }
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

/// Named symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Variable {
    name: String,
}

impl Variable {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

macro_rules! define_leaf_expr {
    ($name:ident, $field:ident) => {
        impl ExprKind for $name {
            const TYPE: ExprType = ExprType::$name;
            const CATEGORY: ExprCategory = ExprCategory::LEAF;
        }

        impl Expr for $name {
            fn expr_type(&self) -> ExprType {
                Self::TYPE
            }

            fn category(&self) -> ExprCategory {
                Self::CATEGORY
            }

            fn structurally_equivalent(&self, other: &Expression) -> bool {
                other.expr_type() == Self::TYPE
            }

            fn render(&self) -> ExprResult<String> {
                Ok(format!("{}", self.$field))
            }

            fn generalize(&self) -> Expression {
                Expression::$name(self.clone())
            }

            fn generalize_in(&self, _flow: &Subflow<'_, '_>) -> Expression {
                self.generalize()
            }

            fn specialize<E: Expr>(other: &E) -> Option<Self> {
                if other.expr_type() != Self::TYPE {
                    return None;
                }
                match &*other.to_canonical() {
                    Expression::$name(leaf) => Some(leaf.clone()),
                    _ => None,
                }
            }

            fn specialize_in<E: Expr>(other: &E, _flow: &Subflow<'_, '_>) -> Option<Self> {
                Self::specialize(other)
            }

            fn copy_in(&self, _flow: &Subflow<'_, '_>) -> Self {
                self.clone()
            }

            fn simplify(&self) -> Expression {
                self.generalize()
            }

            fn simplify_in(&self, _flow: &Subflow<'_, '_>) -> Expression {
                self.generalize()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.$field)
            }
        }

        impl From<$name> for Expression {
            fn from(leaf: $name) -> Self {
                Expression::$name(leaf)
            }
        }
    };
}

define_leaf_expr!(Real, value);
define_leaf_expr!(Variable, name);

impl From<f64> for Real {
    fn from(value: f64) -> Self {
        Real::new(value)
    }
}

impl From<f64> for Expression {
    fn from(value: f64) -> Self {
        Expression::real(value)
    }
}

impl From<&str> for Variable {
    fn from(name: &str) -> Self {
        Variable::new(name)
    }
}
