//! Error kinds. Program-structural and FFI failures are fatal per §7 and are
//! modeled as panics (the spec allows mapping the arithmetic domain signal to
//! either a recoverable error or an abort; we choose recoverable for
//! arithmetic/string faults and abort for everything else, per §9's "Open
//! questions" note).

use thiserror::Error;

/// A recoverable domain fault raised while evaluating a value node. Callers
/// that can't sensibly continue (e.g. `Project` assembling a tuple) should
/// propagate it up to the statement boundary, where it is treated as the
/// "arithmetic signal" of §7.3.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("tonumber: {0:?} is not a valid integer")]
    NotANumber(String),
    #[error("division by zero")]
    DivisionByZero,
}

pub type EvalResult<T> = Result<T, DomainError>;

impl DomainError {
    /// Arithmetic/string domain faults raise a signal per §7.3; we choose to
    /// implement that as an immediate panic (an accepted choice per §9's
    /// open question on `TONUMBER` failure), rather than threading `Result`
    /// through every evaluator.
    pub fn raise(self) -> ! {
        panic!("{self}");
    }
}
