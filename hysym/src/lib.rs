//! Hysym: symbolic expression trees with typed and type-erased operator nodes.
//!
//! Every binary operator exists in two flavors of the same node:
//!  - the canonical form, `Op<Expression, Expression>`, stored in [`expr::Expression`], whose
//!    operand slots accept any expression;
//!  - constrained forms, `Op<A, B>`, whose operand slots only accept the types `A` and `B`.
//!
//! Generalization projects a constrained tree onto its canonical form and never fails.
//! Specialization re-imposes operand constraints on a canonical tree and returns `None` when
//! the tree does not match. Both, together with deep copy and simplification, come in a
//! sequential form and a fork-join parallel form (see [`flow`]) that produce the same result.
//!
//! Ownership
//!  - Trees are strictly owned: every child is boxed inside its unique parent and copies are
//!    deep. Parallel tasks only ever write into disjoint operand slots.
//!
//! Example
//! ```
//! use hysym::prelude::*;
//!
//! // Constrained: both operands must be literals.
//! let sum: Add<Real, Real> = add(Real::new(2.0), Real::new(3.0));
//!
//! // Canonical: operand types erased, structure and values kept.
//! let canonical = sum.generalize();
//! assert_eq!(canonical.to_string(), "(2 + 3)");
//!
//! // Specialization succeeds on a matching tree ...
//! let back = Add::<Real, Real>::specialize(&canonical).unwrap();
//! assert_eq!(back, sum);
//!
//! // ... and misses on another operator kind.
//! let product = mul(Real::new(2.0), Real::new(3.0)).generalize();
//! assert!(Add::<Real, Real>::specialize(&product).is_none());
//! ```

/// Binary operator shape and the algorithms shared by the operator family.
pub mod binary;
/// Scheduler configuration.
pub mod conf;
/// Error types.
pub mod error;
/// Node protocol and canonical expression tree.
pub mod expr;
/// Fork-join scheduling over a worker pool.
pub mod flow;
/// Leaf nodes.
pub mod leaf;
/// Binary operator family.
pub mod ops;

pub mod prelude {
    //! Convenient re-exports for end users.
    //!
    //! - `Expr`/`ExprKind` protocol and the canonical `Expression`
    //! - Operator nodes and their builder functions
    //! - Fork-join executor and its configuration
    pub use crate::binary::{BinaryExpr, BinaryOperands, OperandSlot};
    pub use crate::conf::SchedulerConfig;
    pub use crate::error::{ExprError, ExprResult};
    pub use crate::expr::{Expr, ExprCategory, ExprKind, ExprType, Expression};
    pub use crate::flow::{Executor, FlowStats, Subflow};
    pub use crate::leaf::{Real, Variable};
    pub use crate::ops::{Add, Divide, Exponent, Multiply, Subtract, add, div, mul, pow, sub};
}
