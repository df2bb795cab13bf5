//! A register of qubits that starts out in the compact stabilizer (graph
//! state) representation and is promoted to a dense amplitude vector the first
//! time a non-Clifford operation is requested.
//!
//! Qubit indices on every method here are 1-based; qubit `j` is bit `j - 1`
//! of a basis-state index. Indices outside `1..=size` leave the state
//! untouched.

use std::{ borrow::Cow, f64::consts::PI, fmt };
use num_complex::Complex64 as C64;
use rand::Rng;
use rustc_hash::{ FxHashMap, FxHashSet };
use tracing::{ debug, trace };
use crate::{
    ACCURACY,
    clifford::Mat2,
    dense::DenseState,
    error::{ Error, Result },
    gate::{ Axis, Evaluate },
    graph::GraphState,
};

/// Map from basis-state index to the set of partner-register indices whose
/// amplitudes are classically correlated with it.
pub type Entanglement = FxHashMap<usize, FxHashSet<usize>>;

#[derive(Clone, Debug)]
enum Repr {
    Stabilizer(GraphState),
    Dense(DenseState),
}

/// A register of `size` qubits.
///
/// Equality is equality of amplitude vectors up to a global phase, within
/// [`ACCURACY`].
#[derive(Clone, Debug)]
pub struct Register {
    size: usize,
    repr: Repr,
    entanglement: Entanglement,
}

impl PartialEq for Register {
    fn eq(&self, other: &Self) -> bool {
        self.dense_view().eq_up_to_phase(&other.dense_view())
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.dense_view();
        let mut terms
            = state.amplitudes().iter().enumerate()
            .filter(|(_, a)| a.norm() > ACCURACY)
            .peekable();
        if terms.peek().is_none() { return write!(f, "0"); }
        let mut first = true;
        for (k, a) in terms {
            if !first { write!(f, " ")?; }
            first = false;
            if a.im.abs() < ACCURACY {
                write!(f, "{:+.4}", a.re)?;
            } else {
                write!(f, "({:+.4}{:+.4}i)", a.re, a.im)?;
            }
            write!(f, "∣{:0w$b}⟩", k, w = self.size)?;
        }
        Ok(())
    }
}

macro_rules! clifford_gate {
    ( $name:ident, $graph_fn:ident, $dense_fn:ident, $doc:literal ) => {
        #[doc = $doc]
        pub fn $name(&mut self, j: usize) -> &mut Self {
            let Some(q) = self.qubit(j) else { return self; };
            match &mut self.repr {
                Repr::Stabilizer(graph) => { graph.$graph_fn(q); },
                Repr::Dense(dense) => { dense.$dense_fn(q).chop(); },
            }
            self
        }
    }
}

macro_rules! dense_gate {
    ( $name:ident, $dense_fn:ident, $doc:literal ) => {
        #[doc = $doc]
        ///
        /// Promotes the register to the dense representation.
        pub fn $name(&mut self, j: usize) -> &mut Self {
            let Some(q) = self.qubit(j) else { return self; };
            self.dense_mut().$dense_fn(q).chop();
            self
        }
    }
}

impl Register {
    /// Create a new register of `size` qubits in ∣0...0⟩, held either as a
    /// stabilizer state or as a dense amplitude vector.
    pub fn new(size: usize, stabilizer: bool) -> Self {
        Self::basis(size, 0, stabilizer)
    }

    /// Create a new dense register in ∣0...0⟩.
    pub fn dense(size: usize) -> Self { Self::new(size, false) }

    /// Create a new stabilizer register in ∣0...0⟩.
    pub fn stabilizer(size: usize) -> Self { Self::new(size, true) }

    /// Create a new register in the basis state ∣`index`⟩, ignoring bits of
    /// `index` at or above `size`.
    ///
    /// Stabilizer registers may hold any number of qubits; only dense ones
    /// need 2<sup>`size`</sup> to fit in a `usize`.
    pub fn basis(size: usize, index: usize, stabilizer: bool) -> Self {
        let repr
            = if stabilizer {
                let mut graph = GraphState::new(size);
                (0..size.min(usize::BITS as usize))
                    .filter(|q| index >> q & 1 == 1)
                    .for_each(|q| { graph.apply_x(q); });
                Repr::Stabilizer(graph)
            } else {
                Repr::Dense(DenseState::basis(size, index % (1_usize << size)))
            };
        Self { size, repr, entanglement: Entanglement::default() }
    }

    /// Return the number of qubits.
    pub fn size(&self) -> usize { self.size }

    /// Return the number of basis states, 2<sup>`size`</sup>, saturating at
    /// `usize::MAX` for stabilizer registers too large to expand.
    pub fn dim(&self) -> usize {
        u32::try_from(self.size).ok()
            .and_then(|n| 1_usize.checked_shl(n))
            .unwrap_or(usize::MAX)
    }

    /// Return `true` if the register is still in the stabilizer
    /// representation.
    pub fn is_stabilizer(&self) -> bool {
        matches!(self.repr, Repr::Stabilizer(..))
    }

    fn qubit(&self, j: usize) -> Option<usize> {
        (1..=self.size).contains(&j).then(|| j - 1)
    }

    fn dense_view(&self) -> Cow<'_, DenseState> {
        match &self.repr {
            Repr::Stabilizer(graph) => Cow::Owned(graph.to_dense()),
            Repr::Dense(dense) => Cow::Borrowed(dense),
        }
    }

    // promotion never reverts
    fn dense_mut(&mut self) -> &mut DenseState {
        if let Repr::Stabilizer(graph) = &mut self.repr {
            let graph = std::mem::replace(graph, GraphState::new(0));
            self.repr = Repr::Dense(graph.into());
            debug!(size = self.size, "promoted register to dense form");
        }
        match &mut self.repr {
            Repr::Dense(dense) => dense,
            Repr::Stabilizer(..) => unreachable!(),
        }
    }

    /// Force the dense representation.
    pub fn promote(&mut self) -> &mut Self {
        self.dense_mut();
        self
    }

    /// Return all amplitudes, materializing them if the register is still a
    /// stabilizer state.
    pub fn amplitudes(&self) -> Vec<C64> {
        self.dense_view().amplitudes().to_vec()
    }

    /// Return the real parts of all amplitudes.
    pub fn real(&self) -> Vec<f64> {
        self.dense_view().amplitudes().iter().map(|a| a.re).collect()
    }

    /// Return the imaginary parts of all amplitudes.
    pub fn imaginary(&self) -> Vec<f64> {
        self.dense_view().amplitudes().iter().map(|a| a.im).collect()
    }

    /// Overwrite the real parts of all amplitudes.
    ///
    /// Fails if `re` does not hold exactly 2<sup>`size`</sup> values. The
    /// state is not renormalized.
    pub fn set_real(&mut self, re: &[f64]) -> Result<&mut Self> {
        self.check_len(re.len())?;
        self.dense_mut().amplitudes_mut().iter_mut().zip(re)
            .for_each(|(a, r)| { a.re = *r; });
        Ok(self)
    }

    /// Overwrite the imaginary parts of all amplitudes.
    ///
    /// Fails if `im` does not hold exactly 2<sup>`size`</sup> values. The
    /// state is not renormalized.
    pub fn set_imaginary(&mut self, im: &[f64]) -> Result<&mut Self> {
        self.check_len(im.len())?;
        self.dense_mut().amplitudes_mut().iter_mut().zip(im)
            .for_each(|(a, i)| { a.im = *i; });
        Ok(self)
    }

    fn check_len(&self, actual: usize) -> Result<()> {
        let expected = self.dim();
        if actual == expected {
            Ok(())
        } else {
            Err(Error::SizeMismatch { expected, actual })
        }
    }

    /// Return the probability of measuring every basis state.
    pub fn probabilities(&self) -> Vec<f64> {
        self.dense_view().probabilities()
    }

    /// Return the indices of all basis states with non-vanishing amplitude.
    pub fn support(&self) -> Vec<usize> {
        self.dense_view().amplitudes().iter().enumerate()
            .filter(|(_, a)| a.norm_sqr() > ACCURACY)
            .map(|(k, _)| k)
            .collect()
    }

    pub fn entanglement(&self) -> &Entanglement { &self.entanglement }

    pub fn entanglement_mut(&mut self) -> &mut Entanglement {
        &mut self.entanglement
    }

    /// Rescale to unit norm.
    pub fn normalize(&mut self) -> &mut Self {
        if let Repr::Dense(dense) = &mut self.repr { dense.normalize(); }
        self
    }

    /// Zero the amplitudes of the given basis states and renormalize.
    pub fn discard<I>(&mut self, indices: I) -> &mut Self
    where I: IntoIterator<Item = usize>
    {
        let dense = self.dense_mut();
        for k in indices {
            if let Some(a) = dense.amplitudes_mut().get_mut(k) {
                *a = C64::from(0.0);
            }
        }
        dense.normalize().chop();
        self
    }

    clifford_gate!(hadamard, apply_h, apply_h, "Apply a Hadamard gate.");
    clifford_gate!(x_pauli, apply_x, apply_x, "Apply a Pauli *X* gate.");
    clifford_gate!(y_pauli, apply_y, apply_y, "Apply a Pauli *Y* gate.");
    clifford_gate!(z_pauli, apply_z, apply_z, "Apply a Pauli *Z* gate.");
    clifford_gate!(s_gate, apply_s, apply_s, "Apply an *S* gate.");
    clifford_gate!(
        inverse_s_gate, apply_s_inv, apply_s_inv, "Apply an *S*† gate.");

    dense_gate!(t_gate, apply_t, "Apply a *T* gate.");
    dense_gate!(inverse_t_gate, apply_t_inv, "Apply a *T*† gate.");
    dense_gate!(sqrt_x, apply_sqrt_x, "Apply a √*X* gate.");
    dense_gate!(inverse_sqrt_x, apply_sqrt_x_inv, "Apply a √*X*† gate.");

    /// Apply a CNOT gate; the first qubit index is the control.
    pub fn cnot(&mut self, control: usize, target: usize) -> &mut Self {
        let (Some(c), Some(t)) = (self.qubit(control), self.qubit(target))
            else { return self; };
        match &mut self.repr {
            Repr::Stabilizer(graph) => { graph.apply_cx(c, t); },
            Repr::Dense(dense) => { dense.apply_cx(c, t); },
        }
        self
    }

    /// Apply a CZ gate.
    pub fn cz(&mut self, a: usize, b: usize) -> &mut Self {
        let (Some(a), Some(b)) = (self.qubit(a), self.qubit(b))
            else { return self; };
        match &mut self.repr {
            Repr::Stabilizer(graph) => { graph.apply_cz(a, b); },
            Repr::Dense(dense) => { dense.apply_cz(a, b); },
        }
        self
    }

    /// Apply a Toffoli gate; the first two qubit indices are the controls.
    ///
    /// Promotes the register to the dense representation.
    pub fn toffoli(&mut self, c1: usize, c2: usize, target: usize) -> &mut Self {
        let (Some(c1), Some(c2), Some(t))
            = (self.qubit(c1), self.qubit(c2), self.qubit(target))
            else { return self; };
        self.dense_mut().apply_toffoli(c1, c2, t);
        self
    }

    /// Quantum Fourier transform over the first `q` basis states.
    ///
    /// If `q` is the full dimension 2<sup>`size`</sup> this is the usual
    /// radix-2 transform; otherwise the first `q` amplitudes are transformed
    /// by direct summation and the result renormalized.
    ///
    /// Promotes the register to the dense representation.
    pub fn qft(&mut self, q: usize) -> &mut Self {
        self.fourier(q, 1.0)
    }

    /// Inverse of [`qft`][Self::qft].
    pub fn inverse_qft(&mut self, q: usize) -> &mut Self {
        self.fourier(q, -1.0)
    }

    fn fourier(&mut self, q: usize, sign: f64) -> &mut Self {
        let dim = self.dim();
        let dense = self.dense_mut();
        if q == dim {
            dense.fft(sign).chop();
        } else {
            dense.dft_prefix(q, sign);
        }
        self
    }

    /// Rotate the last qubit in `qubits` by `phi` about `axis`, controlled on
    /// all the others being ∣1⟩.
    ///
    /// Promotes the register to the dense representation.
    pub fn rotate(&mut self, qubits: &[usize], axis: Axis, phi: f64) -> &mut Self {
        let Some((target, controls)) = qubits.split_last() else { return self; };
        let Some(t) = self.qubit(*target) else { return self; };
        let Some(controls)
            = controls.iter()
            .map(|j| self.qubit(*j))
            .collect::<Option<Vec<usize>>>()
            else { return self; };
        let m = rotation_matrix(axis, phi);
        self.dense_mut().apply_controlled(&controls, t, &m).chop();
        self
    }

    /// Write `f(x, z)` into `y`, XOR-wise, for every basis state `x` of
    /// `self`.
    ///
    /// The target register holds the marginal of the resulting joint state:
    /// each basis state `k = j ⊕ f(x, z)` receives probability
    /// |a<sub>x</sub>|²|b<sub>j</sub>|², with the phase of the first
    /// contributing amplitude of `y`. Every `(x, k)` pairing is recorded in
    /// both registers' entanglement maps.
    ///
    /// Fails without touching either register if any `f(x, z)` lies outside
    /// `y`'s basis. Promotes both registers to the dense representation.
    pub fn evaluate_function<F>(&mut self, y: &mut Register, f: &F, z: i64)
        -> Result<&mut Self>
    where F: Evaluate + ?Sized
    {
        let x_probs: Vec<(usize, f64)>
            = self.probabilities().into_iter().enumerate()
            .filter(|(_, p)| *p > ACCURACY)
            .collect();
        let dim = y.dim();
        let values: Vec<usize>
            = x_probs.iter()
            .map(|(x, _)| {
                let value = f.evaluate_int(*x as i64, z);
                usize::try_from(value).ok()
                    .filter(|v| *v < dim)
                    .ok_or(Error::FunctionRange { value, dim })
            })
            .collect::<Result<_>>()?;

        self.promote();
        let y_amps = y.dense_mut().amplitudes().to_vec();
        let mut probs: Vec<f64> = vec![0.0; dim];
        let mut phases: Vec<Option<C64>> = vec![None; dim];
        for ((x, px), v) in x_probs.iter().zip(&values) {
            for (j, b) in y_amps.iter().enumerate() {
                let pj = b.norm_sqr();
                if pj <= ACCURACY { continue; }
                let k = j ^ v;
                probs[k] += px * pj;
                phases[k].get_or_insert(*b / b.norm());
                self.entanglement.entry(*x).or_default().insert(k);
                y.entanglement.entry(k).or_default().insert(*x);
            }
        }
        let y_dense = y.dense_mut();
        y_dense.amplitudes_mut().iter_mut()
            .zip(probs.into_iter().zip(phases))
            .for_each(|(a, (p, ph))| {
                *a = ph.map(|ph| ph * p.sqrt()).unwrap_or(C64::from(0.0));
            });
        y_dense.normalize().chop();
        trace!(z, touched = values.len(), "evaluated function");
        Ok(self)
    }

    /// Perform one Grover iteration searching for basis state `needle`: an
    /// oracle phase flip on `needle`, a Hadamard on every qubit, a phase flip
    /// of every non-zero basis state, and another Hadamard on every qubit.
    ///
    /// Promotes the register to the dense representation.
    pub fn grover(&mut self, needle: usize) -> Result<&mut Self> {
        self.check_needle(needle)?;
        self.dense_mut()
            .flip_phase(needle)
            .apply_h_all()
            .flip_nonzero()
            .apply_h_all()
            .chop();
        Ok(self)
    }

    /// Undo a single Grover iteration.
    pub fn inverse_grover(&mut self, needle: usize) -> Result<&mut Self> {
        self.check_needle(needle)?;
        self.dense_mut()
            .apply_h_all()
            .flip_nonzero()
            .apply_h_all()
            .flip_phase(needle)
            .chop();
        Ok(self)
    }

    fn check_needle(&self, needle: usize) -> Result<()> {
        let dim = self.dim();
        if needle < dim {
            Ok(())
        } else {
            Err(Error::NeedleRange { needle, dim })
        }
    }

    /// Return the optimal number of Grover iterations for a register of
    /// `size` qubits, ⌊(π/4)√(2<sup>`size`</sup>)⌋.
    pub fn grover_steps(size: usize) -> usize {
        (((1_usize << size) as f64).sqrt() * PI / 4.0).floor() as usize
    }

    /// Measure the whole register in the *Z*-basis, collapsing it onto the
    /// sampled basis state, which is returned.
    ///
    /// Promotes the register to the dense representation.
    pub fn measure<R>(&mut self, rng: &mut R) -> usize
    where R: Rng + ?Sized
    {
        let dense = self.dense_mut();
        let outcome = dense.sample_basis(rng);
        dense.collapse_basis(outcome);
        trace!(outcome, "measured register");
        outcome
    }

    /// Measure qubit `j` in the *Z*-basis, returning `true` for ∣1⟩.
    ///
    /// Returns `false` for nonexistent qubits.
    pub fn measure_qubit<R>(&mut self, j: usize, rng: &mut R) -> bool
    where R: Rng + ?Sized
    {
        let Some(q) = self.qubit(j) else { return false; };
        let outcome
            = match &mut self.repr {
                Repr::Stabilizer(graph) => graph.measure(q, rng),
                Repr::Dense(dense) => {
                    let p0 = dense.probability_zero(q);
                    let one = rng.gen::<f64>() >= p0;
                    dense.collapse_qubit(q, one).chop();
                    one
                },
            };
        trace!(qubit = j, outcome, "measured qubit");
        outcome
    }
}

fn rotation_matrix(axis: Axis, phi: f64) -> Mat2 {
    let (sin, cos) = (phi / 2.0).sin_cos();
    let c = C64::from(cos);
    let s = C64::from(sin);
    let o = C64::from(0.0);
    let i = C64::i();
    match axis {
        Axis::X => Mat2::new(c, -i * s, -i * s, c),
        Axis::Y => Mat2::new(c, -s, s, c),
        Axis::Z => Mat2::new(C64::cis(-phi / 2.0), o, o, C64::cis(phi / 2.0)),
    }
}
