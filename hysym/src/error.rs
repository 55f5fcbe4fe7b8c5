use strum::EnumIs;
use thiserror::Error;

use crate::{binary::OperandSlot, expr::ExprType};

#[derive(Debug, Error, EnumIs)]
pub enum ExprError {
    /// A binary node is missing an operand required by the requested operation.
    #[error("Malformed `{kind}` expression: the {slot} operand is absent.")]
    MissingOperand { kind: ExprType, slot: OperandSlot },

    /// The expression does not match the requested operator kind or operand types.
    #[error(
        "Cannot specialize a `{found}` expression into `{target}`: operator kind or operand types do not match."
    )]
    SpecializationFailed { target: ExprType, found: ExprType },

    #[error("Failed to build the worker thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type ExprResult<T> = Result<T, ExprError>;
