//! Error types for register and circuit operations.

use thiserror::Error;
use crate::gate::Reg;

/// Errors that can arise while building or stepping through a circuit.
///
/// All of these are raised synchronously and abort the current operation;
/// the simulator makes no attempt to recover from them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A gate was added to (or run on) a register with no qubits.
    #[error("register {reg} has no wires")]
    NoWires { reg: Reg },

    /// A circuit was stepped before being initialized.
    #[error("circuit has not been initialized")]
    NotInitialized,

    /// Attempted to undo a measurement.
    #[error("step {step} is a measurement and cannot be undone")]
    Irreversible { step: usize },

    /// A classical function produced a value outside the target register.
    #[error("function value {value} lies outside a register of dimension {dim}")]
    FunctionRange { value: i64, dim: usize },

    /// A Grover needle outside the register's basis.
    #[error("Grover needle {needle} lies outside a register of dimension {dim}")]
    NeedleRange { needle: usize, dim: usize },

    /// Amplitude data of the wrong length.
    #[error("size mismatch: expected {expected} amplitudes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// Basis conjugation requested on a non-Pauli local Clifford.
    #[error("{0} is not a Pauli operator")]
    NotPauli(String),
}

/// Result type for register and circuit operations.
pub type Result<T> = std::result::Result<T, Error>;
