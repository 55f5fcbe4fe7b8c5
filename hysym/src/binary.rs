//! Binary operator shape and the generalize/specialize algorithms shared by every operator.
//!
//! Role
//! - [`BinaryOperands`] holds the two ordered, independently optional, exclusively owned
//!   child slots of a binary node.
//! - [`BinaryExpr`] ties an operator kind to its slot types and to its canonical variant in
//!   [`Expression`]; the algorithms below are written once against it and every operator in
//!   [`crate::ops`] forwards to them.
//!
//! Parallel forms fork one task per present slot and join before assembling the node. A
//! task only ever writes into its own slot, so assembly needs no locking. Once the flow is
//! too deep to fork ([`Subflow::should_fork`]), they defer to the sequential form.
use std::fmt;

use log::trace;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::{
    error::{ExprError, ExprResult},
    expr::{Expr, ExprKind, Expression},
    flow::Subflow,
    leaf::Real,
};

/// Identifies one of the two operand slots of a binary node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum OperandSlot {
    #[strum(to_string = "most significant")]
    MostSignificant,
    #[strum(to_string = "least significant")]
    LeastSignificant,
}

/// Two ordered operand slots, each independently present or absent.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BinaryOperands<A, B> {
    most_sig_op: Option<Box<A>>,
    least_sig_op: Option<Box<B>>,
}

impl<A, B> Default for BinaryOperands<A, B> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<A, B> BinaryOperands<A, B> {
    /// Both slots present.
    pub fn new(most_sig_op: A, least_sig_op: B) -> Self {
        Self {
            most_sig_op: Some(Box::new(most_sig_op)),
            least_sig_op: Some(Box::new(least_sig_op)),
        }
    }

    /// Both slots absent.
    pub const fn empty() -> Self {
        Self {
            most_sig_op: None,
            least_sig_op: None,
        }
    }

    pub fn from_parts(most_sig_op: Option<A>, least_sig_op: Option<B>) -> Self {
        Self {
            most_sig_op: most_sig_op.map(Box::new),
            least_sig_op: least_sig_op.map(Box::new),
        }
    }

    pub fn into_parts(self) -> (Option<A>, Option<B>) {
        (
            self.most_sig_op.map(|op| *op),
            self.least_sig_op.map(|op| *op),
        )
    }

    #[inline]
    pub fn has_most_sig_op(&self) -> bool {
        self.most_sig_op.is_some()
    }

    #[inline]
    pub fn has_least_sig_op(&self) -> bool {
        self.least_sig_op.is_some()
    }

    #[inline]
    pub fn most_sig_op(&self) -> Option<&A> {
        self.most_sig_op.as_deref()
    }

    #[inline]
    pub fn least_sig_op(&self) -> Option<&B> {
        self.least_sig_op.as_deref()
    }

    pub fn most_sig_op_mut(&mut self) -> Option<&mut A> {
        self.most_sig_op.as_deref_mut()
    }

    pub fn least_sig_op_mut(&mut self) -> Option<&mut B> {
        self.least_sig_op.as_deref_mut()
    }

    /// Replace the most significant operand, returning the previous one.
    pub fn set_most_sig_op(&mut self, op: A) -> Option<A> {
        self.most_sig_op.replace(Box::new(op)).map(|op| *op)
    }

    /// Replace the least significant operand, returning the previous one.
    pub fn set_least_sig_op(&mut self, op: B) -> Option<B> {
        self.least_sig_op.replace(Box::new(op)).map(|op| *op)
    }

    pub fn take_most_sig_op(&mut self) -> Option<A> {
        self.most_sig_op.take().map(|op| *op)
    }

    pub fn take_least_sig_op(&mut self) -> Option<B> {
        self.least_sig_op.take().map(|op| *op)
    }
}

/// Common interface of every binary operator node.
///
/// `MostSig`/`LeastSig` are the operand type constraints; `Expression` for both is the
/// canonical form. Slot accessors are provided on top of [`BinaryExpr::operands`].
pub trait BinaryExpr: ExprKind + Default {
    type MostSig: Expr;
    type LeastSig: Expr;

    /// Infix symbol used when rendering.
    const SYMBOL: &'static str;

    fn operands(&self) -> &BinaryOperands<Self::MostSig, Self::LeastSig>;

    fn operands_mut(&mut self) -> &mut BinaryOperands<Self::MostSig, Self::LeastSig>;

    fn from_operands(operands: BinaryOperands<Self::MostSig, Self::LeastSig>) -> Self;

    /// Operand slots of `expr` if it is the canonical variant of this kind.
    fn canonical_operands(expr: &Expression) -> Option<&BinaryOperands<Expression, Expression>>;

    /// Wrap canonical operand slots into this kind's [`Expression`] variant.
    fn wrap_canonical(operands: BinaryOperands<Expression, Expression>) -> Expression;

    /// Value of `lhs op rhs` when both operands are literals, `None` if it must not be folded.
    fn fold_literals(lhs: f64, rhs: f64) -> Option<f64>;

    #[inline]
    fn has_most_sig_op(&self) -> bool {
        self.operands().has_most_sig_op()
    }

    #[inline]
    fn has_least_sig_op(&self) -> bool {
        self.operands().has_least_sig_op()
    }

    #[inline]
    fn most_sig_op(&self) -> Option<&Self::MostSig> {
        self.operands().most_sig_op()
    }

    #[inline]
    fn least_sig_op(&self) -> Option<&Self::LeastSig> {
        self.operands().least_sig_op()
    }

    fn set_most_sig_op(&mut self, op: Self::MostSig) -> Option<Self::MostSig> {
        self.operands_mut().set_most_sig_op(op)
    }

    fn set_least_sig_op(&mut self, op: Self::LeastSig) -> Option<Self::LeastSig> {
        self.operands_mut().set_least_sig_op(op)
    }

    fn take_most_sig_op(&mut self) -> Option<Self::MostSig> {
        self.operands_mut().take_most_sig_op()
    }

    fn take_least_sig_op(&mut self) -> Option<Self::LeastSig> {
        self.operands_mut().take_least_sig_op()
    }
}

fn slot_equivalent<T: Expr>(ours: Option<&T>, theirs: Option<&Expression>) -> bool {
    match (ours, theirs) {
        (Some(ours), Some(theirs)) => ours.structurally_equivalent(theirs),
        (None, None) => true,
        _ => false,
    }
}

pub(crate) fn structurally_equivalent<Op: BinaryExpr>(node: &Op, other: &Expression) -> bool {
    let Some(theirs) = Op::canonical_operands(other) else {
        return false;
    };

    slot_equivalent(node.most_sig_op(), theirs.most_sig_op())
        && slot_equivalent(node.least_sig_op(), theirs.least_sig_op())
}

pub(crate) fn render<Op: BinaryExpr>(node: &Op) -> ExprResult<String> {
    let most = node.most_sig_op().ok_or(ExprError::MissingOperand {
        kind: Op::TYPE,
        slot: OperandSlot::MostSignificant,
    })?;
    let least = node.least_sig_op().ok_or(ExprError::MissingOperand {
        kind: Op::TYPE,
        slot: OperandSlot::LeastSignificant,
    })?;

    Ok(format!(
        "({} {} {})",
        most.render()?,
        Op::SYMBOL,
        least.render()?
    ))
}

/// Stands in for an absent operand when displaying a node.
pub const ABSENT_OPERAND: &str = "_";

fn display_slot<T: Expr>(op: Option<&T>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match op {
        Some(op) => fmt::Display::fmt(op, f),
        None => f.write_str(ABSENT_OPERAND),
    }
}

/// Infix form like [`render`], with [`ABSENT_OPERAND`] in place of absent slots.
pub(crate) fn display<Op: BinaryExpr>(node: &Op, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("(")?;
    display_slot(node.most_sig_op(), f)?;
    write!(f, " {} ", Op::SYMBOL)?;
    display_slot(node.least_sig_op(), f)?;
    f.write_str(")")
}

pub(crate) fn generalize<Op: BinaryExpr>(node: &Op) -> Expression {
    let mut generalized = BinaryOperands::empty();

    if let Some(op) = node.most_sig_op() {
        generalized.set_most_sig_op(op.generalize());
    }

    if let Some(op) = node.least_sig_op() {
        generalized.set_least_sig_op(op.generalize());
    }

    Op::wrap_canonical(generalized)
}

pub(crate) fn generalize_in<Op: BinaryExpr>(node: &Op, flow: &Subflow<'_, '_>) -> Expression {
    if !flow.should_fork() {
        return generalize(node);
    }

    let operands = node.operands();
    let mut most = None;
    let mut least = None;

    let (most_slot, least_slot) = (&mut most, &mut least);
    flow.join(move |sub| {
        if let Some(op) = operands.most_sig_op() {
            sub.emplace(move |s| *most_slot = Some(op.generalize_in(s)));
        }

        if let Some(op) = operands.least_sig_op() {
            sub.emplace(move |s| *least_slot = Some(op.generalize_in(s)));
        }
    });

    Op::wrap_canonical(BinaryOperands::from_parts(most, least))
}

pub(crate) fn specialize<Op: BinaryExpr, E: Expr>(other: &E) -> Option<Op> {
    if other.expr_type() != Op::TYPE {
        trace!("`{}` does not match a `{}` expression", Op::TYPE, other.expr_type());
        return None;
    }

    let normalized = other.to_canonical();
    let operands = Op::canonical_operands(&normalized)?;
    let mut specialized = BinaryOperands::empty();

    if let Some(op) = operands.most_sig_op() {
        let Some(op) = <Op::MostSig as Expr>::specialize(op) else {
            trace!("`{}` rejected its most significant operand", Op::TYPE);
            return None;
        };
        specialized.set_most_sig_op(op);
    }

    if let Some(op) = operands.least_sig_op() {
        let Some(op) = <Op::LeastSig as Expr>::specialize(op) else {
            trace!("`{}` rejected its least significant operand", Op::TYPE);
            return None;
        };
        specialized.set_least_sig_op(op);
    }

    Some(Op::from_operands(specialized))
}

pub(crate) fn specialize_in<Op: BinaryExpr, E: Expr>(
    other: &E,
    flow: &Subflow<'_, '_>,
) -> Option<Op> {
    if other.expr_type() != Op::TYPE {
        trace!("`{}` does not match a `{}` expression", Op::TYPE, other.expr_type());
        return None;
    }

    if !flow.should_fork() {
        return specialize(other);
    }

    // Outer option: slot present in the candidate. Inner option: specialization outcome.
    let mut most: Option<Option<Op::MostSig>> = None;
    let mut least: Option<Option<Op::LeastSig>> = None;
    let mut mismatch = false;

    let (most_slot, least_slot, mismatch_slot) = (&mut most, &mut least, &mut mismatch);
    flow.join(move |sub| {
        // Both slot tasks read the normalized candidate, so they succeed its normalization.
        sub.emplace_then(
            move |s| other.to_canonical_in(s),
            move |s, normalized| {
                let Some(operands) = Op::canonical_operands(&normalized) else {
                    *mismatch_slot = true;
                    return;
                };

                s.join(move |slots| {
                    if let Some(op) = operands.most_sig_op() {
                        slots.emplace(move |s| {
                            *most_slot = Some(<Op::MostSig as Expr>::specialize_in(op, s));
                        });
                    }

                    if let Some(op) = operands.least_sig_op() {
                        slots.emplace(move |s| {
                            *least_slot = Some(<Op::LeastSig as Expr>::specialize_in(op, s));
                        });
                    }
                });
            },
        );
    });

    if mismatch {
        return None;
    }

    let most = match most {
        Some(Some(op)) => Some(op),
        Some(None) => {
            trace!("`{}` rejected its most significant operand", Op::TYPE);
            return None;
        }
        None => None,
    };

    let least = match least {
        Some(Some(op)) => Some(op),
        Some(None) => {
            trace!("`{}` rejected its least significant operand", Op::TYPE);
            return None;
        }
        None => None,
    };

    Some(Op::from_operands(BinaryOperands::from_parts(most, least)))
}

pub(crate) fn copy_in<Op: BinaryExpr>(node: &Op, flow: &Subflow<'_, '_>) -> Op {
    if !flow.should_fork() {
        return node.clone();
    }

    let operands = node.operands();
    let mut most = None;
    let mut least = None;

    let (most_slot, least_slot) = (&mut most, &mut least);
    flow.join(move |sub| {
        if let Some(op) = operands.most_sig_op() {
            sub.emplace(move |s| *most_slot = Some(op.copy_in(s)));
        }

        if let Some(op) = operands.least_sig_op() {
            sub.emplace(move |s| *least_slot = Some(op.copy_in(s)));
        }
    });

    Op::from_operands(BinaryOperands::from_parts(most, least))
}

/// Rebuild from simplified children, folding two literal operands into one when the result
/// is finite.
fn fold<Op: BinaryExpr>(most: Option<Expression>, least: Option<Expression>) -> Expression {
    if let (Some(Expression::Real(lhs)), Some(Expression::Real(rhs))) = (&most, &least) {
        let folded = Op::fold_literals(lhs.value(), rhs.value()).filter(|value| value.is_finite());
        if let Some(value) = folded {
            return Real::new(value).into();
        }
    }

    Op::wrap_canonical(BinaryOperands::from_parts(most, least))
}

pub(crate) fn simplify<Op: BinaryExpr>(node: &Op) -> Expression {
    let most = node.most_sig_op().map(Expr::simplify);
    let least = node.least_sig_op().map(Expr::simplify);

    fold::<Op>(most, least)
}

pub(crate) fn simplify_in<Op: BinaryExpr>(node: &Op, flow: &Subflow<'_, '_>) -> Expression {
    if !flow.should_fork() {
        return simplify(node);
    }

    let operands = node.operands();
    let mut most = None;
    let mut least = None;

    let (most_slot, least_slot) = (&mut most, &mut least);
    flow.join(move |sub| {
        if let Some(op) = operands.most_sig_op() {
            sub.emplace(move |s| *most_slot = Some(op.simplify_in(s)));
        }

        if let Some(op) = operands.least_sig_op() {
            sub.emplace(move |s| *least_slot = Some(op.simplify_in(s)));
        }
    });

    fold::<Op>(most, least)
}
