#![allow(dead_code)]

//! Tools for simulating quantum circuits on a pair of qubit registers.
//!
//! Registers start out as stabilizer states in graph form, which support the
//! Clifford gates (Hadamard, Pauli, *S*, CNOT, CZ) and *Z*-basis measurements
//! efficiently, and are promoted irreversibly to a dense vector of
//! 2<sup>*n*</sup> amplitudes the first time anything else is asked of them.
//! A [`Circuit`][circuit::Circuit] drives a list of [`Gate`][gate::Gate]s
//! over an x-register and a y-register, stepping forward and backward.
//!
//! Nothing here is thread-safe: registers and circuits are mutated in place
//! and must not be shared between threads without external synchronization.

pub mod error;
pub mod clifford;
pub mod dense;
pub mod graph;
pub mod gate;
pub mod register;
pub mod circuit;

/// Tolerance for all numerical comparisons; amplitude components smaller
/// than this are zeroed after each gate.
pub const ACCURACY: f64 = 1e-12;
