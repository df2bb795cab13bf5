//! Descriptions of the gates a [`Circuit`][crate::circuit::Circuit] can hold.
//!
//! All qubit indices carried by a [`Gate`] are 1-based, matching the indexing
//! of the [`Register`][crate::register::Register] methods they dispatch to.

use std::{ fmt, sync::Arc };

/// Selects one of the two registers held by a circuit.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Reg {
    X,
    Y,
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::X => write!(f, "x"),
            Self::Y => write!(f, "y"),
        }
    }
}

/// Rotation axis on the Bloch sphere.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::X => write!(f, "x"),
            Self::Y => write!(f, "y"),
            Self::Z => write!(f, "z"),
        }
    }
}

/// A classical function `f(x, z)` evaluated on basis-state indices.
pub trait Evaluate {
    fn evaluate_int(&self, x: i64, z: i64) -> i64;
}

impl<F> Evaluate for F
where F: Fn(i64, i64) -> i64
{
    fn evaluate_int(&self, x: i64, z: i64) -> i64 { self(x, z) }
}

/// A classical function attached to a circuit, with an optional fixed value
/// for its second argument.
///
/// If `z` is `None`, a fresh value is drawn whenever the gate is executed.
#[derive(Clone)]
pub struct Function {
    pub f: Arc<dyn Evaluate + Send + Sync>,
    pub z: Option<i64>,
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("f", &"<fn>")
            .field("z", &self.z)
            .finish()
    }
}

impl Function {
    pub fn new<F>(f: F, z: Option<i64>) -> Self
    where F: Evaluate + Send + Sync + 'static
    {
        Self { f: Arc::new(f), z }
    }

    pub fn evaluate_int(&self, x: i64, z: i64) -> i64 {
        self.f.evaluate_int(x, z)
    }
}

/// Description of a single circuit step.
#[derive(Clone, Debug)]
pub enum Gate {
    /// Classical bit pattern used to initialize both registers; always the
    /// first step of a circuit.
    InitialState(u64),
    /// Hadamard
    H(Reg, usize),
    /// π rotation about X
    X(Reg, usize),
    /// π rotation about Y
    Y(Reg, usize),
    /// π rotation about Z
    Z(Reg, usize),
    /// π/2 rotation about Z
    S(Reg, usize),
    /// π/4 rotation about Z
    T(Reg, usize),
    /// π/2 rotation about X
    SqrtX(Reg, usize),
    /// -π/2 rotation about Z
    InvS(Reg, usize),
    /// -π/4 rotation about Z
    InvT(Reg, usize),
    /// Z-controlled π rotation about X.
    ///
    /// The first qubit index is the control.
    CX(Reg, usize, usize),
    /// Doubly Z-controlled π rotation about X.
    ///
    /// The first two qubit indices are the controls.
    Toffoli(Reg, usize, usize, usize),
    /// Quantum Fourier transform over the whole register.
    Qft(Reg),
    /// Inverse quantum Fourier transform over the whole register.
    InvQft(Reg),
    /// Write `f(x, z)` into the y-register, XOR-wise.
    Function(Function),
    /// Rotation of the last qubit by `angle` about `axis`, controlled on all
    /// the others.
    Rotation { reg: Reg, qubits: Vec<usize>, axis: Axis, angle: f64 },
    /// One Grover iteration searching for basis state `needle`.
    Grover(Reg, usize),
    /// Z-basis measurement of the listed qubits; the whole register if the
    /// list is empty.
    Measure(Reg, Vec<usize>),
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InitialState(bits) => write!(f, "{}({:#b})", self.name(), bits),
            Self::H(r, k)
            | Self::X(r, k)
            | Self::Y(r, k)
            | Self::Z(r, k)
            | Self::S(r, k)
            | Self::T(r, k)
            | Self::SqrtX(r, k)
            | Self::InvS(r, k)
            | Self::InvT(r, k)
                => write!(f, "{}({}{})", self.name(), r, k),
            Self::CX(r, c, t)
                => write!(f, "{}({}{}, {}{})", self.name(), r, c, r, t),
            Self::Toffoli(r, c1, c2, t)
                => write!(
                    f, "{}({}{}, {}{}, {}{})", self.name(), r, c1, r, c2, r, t),
            Self::Qft(r) | Self::InvQft(r)
                => write!(f, "{}({})", self.name(), r),
            Self::Function(func) => match func.z {
                Some(z) => write!(f, "{}(z = {})", self.name(), z),
                None => write!(f, "{}", self.name()),
            },
            Self::Rotation { reg, qubits, axis, angle }
                => write!(
                    f, "{}({}{:?}, {}, {})", self.name(), reg, qubits, axis, angle),
            Self::Grover(r, needle)
                => write!(f, "{}({}, {})", self.name(), r, needle),
            Self::Measure(r, qubits) if qubits.is_empty()
                => write!(f, "{}({})", self.name(), r),
            Self::Measure(r, qubits)
                => write!(f, "{}({}{:?})", self.name(), r, qubits),
        }
    }
}

impl Gate {
    /// Return the name of the gate's kind.
    pub fn name(&self) -> &'static str {
        match self {
            Self::InitialState(..) => "initialState",
            Self::H(..) => "Hadamard",
            Self::X(..) => "Pauli-X",
            Self::Y(..) => "Pauli-Y",
            Self::Z(..) => "Pauli-Z",
            Self::S(..) => "S",
            Self::T(..) => "T",
            Self::SqrtX(..) => "sqrt-X",
            Self::InvS(..) => "invS",
            Self::InvT(..) => "invT",
            Self::CX(..) => "cNOT",
            Self::Toffoli(..) => "Toffoli",
            Self::Qft(..) => "QFT",
            Self::InvQft(..) => "invQFT",
            Self::Function(..) => "Function",
            Self::Rotation { .. } => "Rotation",
            Self::Grover(..) => "Grover",
            Self::Measure(..) => "Measurement",
        }
    }

    /// Return `true` if `self` is `Measure`.
    pub fn is_measurement(&self) -> bool { matches!(self, Self::Measure(..)) }

    /// Return `true` if `self` is `Function`.
    pub fn is_function(&self) -> bool { matches!(self, Self::Function(..)) }

    /// Return `true` if `self` is `InitialState`.
    pub fn is_initial_state(&self) -> bool {
        matches!(self, Self::InitialState(..))
    }

    /// Return the register a gate acts on.
    ///
    /// `InitialState` touches both and returns `None`; `Function` reads the
    /// x-register and writes the y-register, and is reported as `Y`.
    pub fn register(&self) -> Option<Reg> {
        match self {
            Self::InitialState(..) => None,
            Self::H(r, _)
            | Self::X(r, _)
            | Self::Y(r, _)
            | Self::Z(r, _)
            | Self::S(r, _)
            | Self::T(r, _)
            | Self::SqrtX(r, _)
            | Self::InvS(r, _)
            | Self::InvT(r, _)
            | Self::CX(r, ..)
            | Self::Toffoli(r, ..)
            | Self::Qft(r)
            | Self::InvQft(r)
            | Self::Grover(r, _)
            | Self::Measure(r, _)
                => Some(*r),
            Self::Rotation { reg, .. } => Some(*reg),
            Self::Function(..) => Some(Reg::Y),
        }
    }
}
