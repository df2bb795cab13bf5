//! Driver for stepping a sequence of gates forward and backward over a pair of
//! registers.
//!
//! A circuit holds an ordered list of [`Gate`]s whose first entry is always
//! [`Gate::InitialState`], along with a cursor pointing at the next gate to
//! execute. Cursor value 0 means the registers have not yet been built;
//! cursor value 1 means they hold the initial state; cursor value `len()`
//! means every gate has been executed.

use rand::{ rngs::StdRng, Rng, SeedableRng };
use rustc_hash::FxHashSet;
use tracing::{ debug, trace };
use crate::{
    error::{ Error, Result },
    gate::{ Axis, Function, Gate, Reg },
    register::Register,
};

/// A recorded measurement result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Outcomes of individual qubits (1-based index, `true` for ∣1⟩).
    Qubits { step: usize, reg: Reg, results: Vec<(usize, bool)> },
    /// The basis state a whole register collapsed onto.
    Register { step: usize, reg: Reg, state: usize },
}

impl Outcome {
    pub fn step(&self) -> usize {
        match self {
            Self::Qubits { step, .. } | Self::Register { step, .. } => *step,
        }
    }
}

/// Main driver for building and stepping through a circuit.
///
/// Instances are not thread-safe: every step mutates the registers in place.
#[derive(Clone, Debug)]
pub struct Circuit {
    gates: Vec<Gate>,
    x_size: usize,
    y_size: usize,
    next: usize,
    x: Register,
    y: Register,
    stabilizer: bool,
    outcomes: Vec<Outcome>,
    rng: StdRng,
}

impl Circuit {
    /// Create a new, empty circuit with no wires, optionally seeding the
    /// internal random number generator.
    ///
    /// Registers are created in the stabilizer representation by default; see
    /// [`set_stabilizer_mode`][Self::set_stabilizer_mode].
    pub fn new(seed: Option<u64>) -> Self {
        let rng
            = seed.map(StdRng::seed_from_u64)
            .unwrap_or_else(StdRng::from_entropy);
        Self {
            gates: Vec::new(),
            x_size: 0,
            y_size: 0,
            next: 0,
            x: Register::new(0, true),
            y: Register::new(0, true),
            stabilizer: true,
            outcomes: Vec::new(),
            rng,
        }
    }

    /// Choose whether registers are (re)built as stabilizer states or as
    /// dense amplitude vectors. Takes effect on the next (re)initialization.
    pub fn set_stabilizer_mode(&mut self, stabilizer: bool) -> &mut Self {
        self.stabilizer = stabilizer;
        self
    }

    /// Return the number of gates, including the initial state.
    pub fn len(&self) -> usize { self.gates.len() }

    pub fn is_empty(&self) -> bool { self.gates.is_empty() }

    pub fn gates(&self) -> &[Gate] { &self.gates }

    /// Return the index of the next gate to execute.
    pub fn next_gate_number(&self) -> usize { self.next }

    /// Return all measurement outcomes recorded since the last
    /// (re)initialization, in order.
    pub fn outcomes(&self) -> &[Outcome] { &self.outcomes }

    pub fn x_register(&self) -> &Register { &self.x }

    pub fn y_register(&self) -> &Register { &self.y }

    /// Return the gate that will be executed by the next forward step.
    pub fn next_gate(&self) -> Option<&Gate> {
        (self.next >= 1).then(|| self.gates.get(self.next)).flatten()
    }

    /// Return the gate that will be undone by the next backward step.
    pub fn previous_gate(&self) -> Option<&Gate> {
        (self.next >= 2).then(|| self.gates.get(self.next - 1)).flatten()
    }

    fn wires(&self, reg: Reg) -> usize {
        match reg {
            Reg::X => self.x_size,
            Reg::Y => self.y_size,
        }
    }

    fn register_mut(&mut self, reg: Reg) -> &mut Register {
        match reg {
            Reg::X => &mut self.x,
            Reg::Y => &mut self.y,
        }
    }

    fn check_wires(&self, reg: Reg) -> Result<()> {
        if self.wires(reg) > 0 { Ok(()) } else { Err(Error::NoWires { reg }) }
    }

    /// Discard all gates and set up a circuit on registers of the given sizes,
    /// whose initial state is given by the bits of `initial`: the low
    /// `x_size` bits initialize the x-register and the next `y_size` bits the
    /// y-register.
    pub fn initialize(&mut self, x_size: usize, y_size: usize, initial: u64)
        -> &mut Self
    {
        self.x_size = x_size;
        self.y_size = y_size;
        self.gates = vec![Gate::InitialState(initial)];
        self.build_registers(initial);
        self
    }

    /// Discard all gates and replace them with `gates` on registers of sizes
    /// `[x, y]`.
    ///
    /// If `gates` does not begin with an initial state, ∣0...0⟩ is used.
    pub fn initialize_with<I>(&mut self, sizes: [usize; 2], gates: I)
        -> Result<&mut Self>
    where I: IntoIterator<Item = Gate>
    {
        let [x_size, y_size] = sizes;
        let mut gates: Vec<Gate> = gates.into_iter().collect();
        if !gates.first().is_some_and(Gate::is_initial_state) {
            gates.insert(0, Gate::InitialState(0));
        }
        let check_wires = |reg: Reg| -> Result<()> {
            let wires = match reg { Reg::X => x_size, Reg::Y => y_size };
            if wires > 0 { Ok(()) } else { Err(Error::NoWires { reg }) }
        };
        for gate in gates.iter().skip(1) {
            if gate.is_function() { check_wires(Reg::X)?; }
            if let Some(reg) = gate.register() { check_wires(reg)?; }
        }
        self.x_size = x_size;
        self.y_size = y_size;
        self.gates = gates;
        self.set_initial_state()
    }

    /// Replace the initial bit pattern and reinitialize.
    pub fn set_initial_qubits(&mut self, initial: u64) -> Result<&mut Self> {
        match self.gates.first_mut() {
            Some(gate) => { *gate = Gate::InitialState(initial); },
            None => { return Err(Error::NotInitialized); },
        }
        self.set_initial_state()
    }

    /// Rebuild both registers from the initial bit pattern and move the
    /// cursor to the first gate after it.
    pub fn set_initial_state(&mut self) -> Result<&mut Self> {
        let Some(Gate::InitialState(initial)) = self.gates.first() else {
            return Err(Error::NotInitialized);
        };
        let initial = *initial;
        self.build_registers(initial);
        Ok(self)
    }

    fn build_registers(&mut self, initial: u64) {
        let x_bits = low_bits(initial, self.x_size);
        let y_bits
            = initial.checked_shr(self.x_size as u32)
            .map(|bits| low_bits(bits, self.y_size))
            .unwrap_or(0);
        self.x = Register::basis(self.x_size, x_bits as usize, self.stabilizer);
        self.y = Register::basis(self.y_size, y_bits as usize, self.stabilizer);
        self.outcomes.clear();
        self.next = 1;
        debug!(
            x_size = self.x_size,
            y_size = self.y_size,
            initial,
            stabilizer = self.stabilizer,
            "initialized circuit"
        );
    }

    fn push(&mut self, reg: Reg, gate: Gate) -> Result<&mut Self> {
        self.check_wires(reg)?;
        self.gates.push(gate);
        Ok(self)
    }

    pub fn add_hadamard(&mut self, reg: Reg, j: usize) -> Result<&mut Self> {
        self.push(reg, Gate::H(reg, j))
    }

    /// Add a CNOT gate; the first qubit index is the control.
    pub fn add_cnot(&mut self, reg: Reg, control: usize, target: usize)
        -> Result<&mut Self>
    {
        self.push(reg, Gate::CX(reg, control, target))
    }

    pub fn add_pauli_x(&mut self, reg: Reg, j: usize) -> Result<&mut Self> {
        self.push(reg, Gate::X(reg, j))
    }

    pub fn add_pauli_y(&mut self, reg: Reg, j: usize) -> Result<&mut Self> {
        self.push(reg, Gate::Y(reg, j))
    }

    pub fn add_pauli_z(&mut self, reg: Reg, j: usize) -> Result<&mut Self> {
        self.push(reg, Gate::Z(reg, j))
    }

    pub fn add_s(&mut self, reg: Reg, j: usize) -> Result<&mut Self> {
        self.push(reg, Gate::S(reg, j))
    }

    pub fn add_inv_s(&mut self, reg: Reg, j: usize) -> Result<&mut Self> {
        self.push(reg, Gate::InvS(reg, j))
    }

    pub fn add_t(&mut self, reg: Reg, j: usize) -> Result<&mut Self> {
        self.push(reg, Gate::T(reg, j))
    }

    pub fn add_inv_t(&mut self, reg: Reg, j: usize) -> Result<&mut Self> {
        self.push(reg, Gate::InvT(reg, j))
    }

    pub fn add_sqrt_x(&mut self, reg: Reg, j: usize) -> Result<&mut Self> {
        self.push(reg, Gate::SqrtX(reg, j))
    }

    /// Add a Toffoli gate; the first two qubit indices are the controls.
    pub fn add_toffoli(&mut self, reg: Reg, c1: usize, c2: usize, target: usize)
        -> Result<&mut Self>
    {
        self.push(reg, Gate::Toffoli(reg, c1, c2, target))
    }

    pub fn add_qft(&mut self, reg: Reg) -> Result<&mut Self> {
        self.push(reg, Gate::Qft(reg))
    }

    pub fn add_inv_qft(&mut self, reg: Reg) -> Result<&mut Self> {
        self.push(reg, Gate::InvQft(reg))
    }

    /// Add a rotation of the last qubit in `qubits` about `axis`, controlled
    /// on all the others.
    pub fn add_rotation(
        &mut self,
        reg: Reg,
        qubits: Vec<usize>,
        axis: Axis,
        angle: f64,
    ) -> Result<&mut Self>
    {
        self.push(reg, Gate::Rotation { reg, qubits, axis, angle })
    }

    /// Add the evaluation of a classical function of the x-register into the
    /// y-register. Both registers must have wires.
    pub fn add_function(&mut self, function: Function) -> Result<&mut Self> {
        self.check_wires(Reg::X)?;
        self.push(Reg::Y, Gate::Function(function))
    }

    pub fn add_grover(&mut self, reg: Reg, needle: usize) -> Result<&mut Self> {
        self.push(reg, Gate::Grover(reg, needle))
    }

    /// Add a *Z*-basis measurement of the given qubits, or of the whole
    /// register if `qubits` is empty.
    ///
    /// Qubit indices outside the register are skipped when the measurement is
    /// executed and do not appear in [`outcomes`][Self::outcomes].
    pub fn add_measurement(&mut self, reg: Reg, qubits: Vec<usize>)
        -> Result<&mut Self>
    {
        self.push(reg, Gate::Measure(reg, qubits))
    }

    /// Execute the gate at the cursor and advance it; no-op if every gate has
    /// been executed. Builds the registers first if needed.
    ///
    /// If the gate fails, the cursor is not moved.
    pub fn set_next_step(&mut self) -> Result<&mut Self> {
        if self.next == 0 { self.set_initial_state()?; }
        let Some(gate) = self.gates.get(self.next).cloned() else {
            return Ok(self);
        };
        self.perform(&gate)?;
        trace!(step = self.next, gate = %gate, "performed step");
        self.next += 1;
        Ok(self)
    }

    /// Move the cursor back by one gate and undo it; no-op if no gates have
    /// been executed.
    ///
    /// Measurements cannot be undone and leave the cursor where it is. A
    /// function evaluation is undone by replaying every earlier gate from the
    /// initial state, which re-samples any earlier measurements.
    pub fn set_previous_step(&mut self) -> Result<&mut Self> {
        if self.gates.is_empty() { return Err(Error::NotInitialized); }
        if self.next <= 1 { return Ok(self); }
        let step = self.next - 1;
        let gate = self.gates[step].clone();
        match &gate {
            Gate::Measure(..) => {
                return Err(Error::Irreversible { step });
            },
            Gate::Function(..) => {
                self.set_initial_state()?;
                while self.next < step {
                    self.set_next_step()?;
                }
            },
            _ => {
                self.unperform(&gate)?;
                self.next = step;
            },
        }
        trace!(step, gate = %gate, "undid step");
        Ok(self)
    }

    /// Execute every remaining gate, building the registers first if needed.
    pub fn set_final_step(&mut self) -> Result<&mut Self> {
        if self.next == 0 { self.set_initial_state()?; }
        while self.next < self.gates.len() {
            self.set_next_step()?;
        }
        Ok(self)
    }

    /// Rebuild the registers from the initial state and execute every gate.
    pub fn execute_all(&mut self) -> Result<&mut Self> {
        self.set_initial_state()?;
        self.set_final_step()
    }

    fn perform(&mut self, gate: &Gate) -> Result<()> {
        match gate {
            Gate::InitialState(..) => { },
            Gate::H(r, j) => { self.register_mut(*r).hadamard(*j); },
            Gate::X(r, j) => { self.register_mut(*r).x_pauli(*j); },
            Gate::Y(r, j) => { self.register_mut(*r).y_pauli(*j); },
            Gate::Z(r, j) => { self.register_mut(*r).z_pauli(*j); },
            Gate::S(r, j) => { self.register_mut(*r).s_gate(*j); },
            Gate::T(r, j) => { self.register_mut(*r).t_gate(*j); },
            Gate::SqrtX(r, j) => { self.register_mut(*r).sqrt_x(*j); },
            Gate::InvS(r, j) => { self.register_mut(*r).inverse_s_gate(*j); },
            Gate::InvT(r, j) => { self.register_mut(*r).inverse_t_gate(*j); },
            Gate::CX(r, c, t) => { self.register_mut(*r).cnot(*c, *t); },
            Gate::Toffoli(r, c1, c2, t) => {
                self.register_mut(*r).toffoli(*c1, *c2, *t);
            },
            Gate::Qft(r) => {
                let reg = self.register_mut(*r);
                let dim = reg.dim();
                reg.qft(dim);
            },
            Gate::InvQft(r) => {
                let reg = self.register_mut(*r);
                let dim = reg.dim();
                reg.inverse_qft(dim);
            },
            Gate::Function(function) => {
                self.check_wires(Reg::Y)?;
                let z
                    = match function.z {
                        Some(z) => z,
                        None => self.rng.gen_range(0..1_i64 << self.y_size),
                    };
                self.x.evaluate_function(&mut self.y, &*function.f, z)?;
            },
            Gate::Rotation { reg, qubits, axis, angle } => {
                self.register_mut(*reg).rotate(qubits, *axis, *angle);
            },
            Gate::Grover(r, needle) => { self.register_mut(*r).grover(*needle)?; },
            Gate::Measure(r, qubits) => { self.measure(*r, qubits); },
        }
        Ok(())
    }

    fn unperform(&mut self, gate: &Gate) -> Result<()> {
        match gate {
            Gate::InitialState(..) => { },
            Gate::H(r, j) => { self.register_mut(*r).hadamard(*j); },
            Gate::X(r, j) => { self.register_mut(*r).x_pauli(*j); },
            Gate::Y(r, j) => { self.register_mut(*r).y_pauli(*j); },
            Gate::Z(r, j) => { self.register_mut(*r).z_pauli(*j); },
            Gate::S(r, j) => { self.register_mut(*r).inverse_s_gate(*j); },
            Gate::T(r, j) => { self.register_mut(*r).inverse_t_gate(*j); },
            Gate::SqrtX(r, j) => { self.register_mut(*r).inverse_sqrt_x(*j); },
            Gate::InvS(r, j) => { self.register_mut(*r).s_gate(*j); },
            Gate::InvT(r, j) => { self.register_mut(*r).t_gate(*j); },
            Gate::CX(r, c, t) => { self.register_mut(*r).cnot(*c, *t); },
            Gate::Toffoli(r, c1, c2, t) => {
                self.register_mut(*r).toffoli(*c1, *c2, *t);
            },
            Gate::Qft(r) => {
                let reg = self.register_mut(*r);
                let dim = reg.dim();
                reg.inverse_qft(dim);
            },
            Gate::InvQft(r) => {
                let reg = self.register_mut(*r);
                let dim = reg.dim();
                reg.qft(dim);
            },
            Gate::Rotation { reg, qubits, axis, angle } => {
                self.register_mut(*reg).rotate(qubits, *axis, -angle);
            },
            Gate::Grover(r, needle) => {
                self.register_mut(*r).inverse_grover(*needle)?;
            },
            Gate::Function(..) | Gate::Measure(..) => {
                return Err(Error::Irreversible { step: self.next - 1 });
            },
        }
        Ok(())
    }

    fn measure(&mut self, reg: Reg, qubits: &[usize]) {
        let step = self.next;
        let (target, partner)
            = match reg {
                Reg::X => (&mut self.x, &mut self.y),
                Reg::Y => (&mut self.y, &mut self.x),
            };
        let outcome
            = if qubits.is_empty() {
                Outcome::Register { step, reg, state: target.measure(&mut self.rng) }
            } else {
                // nonexistent qubits are never measured
                let size = target.size();
                let results
                    = qubits.iter()
                    .filter(|j| (1..=size).contains(*j))
                    .map(|j| (*j, target.measure_qubit(*j, &mut self.rng)))
                    .collect();
                Outcome::Qubits { step, reg, results }
            };
        prune_partner(target, partner);
        self.outcomes.push(outcome);
    }
}

fn low_bits(bits: u64, n: usize) -> u64 {
    if n >= 64 { bits } else { bits & ((1 << n) - 1) }
}

// after `measured` has collapsed, zero every basis state of `partner` whose
// correlated states in `measured` have all vanished
fn prune_partner(measured: &mut Register, partner: &mut Register) {
    if partner.entanglement().is_empty() { return; }
    let survivors: FxHashSet<usize> = measured.support().into_iter().collect();
    let dead: FxHashSet<usize>
        = partner.entanglement().iter()
        .filter(|(_, deps)| deps.is_disjoint(&survivors))
        .map(|(k, _)| *k)
        .collect();
    measured.entanglement_mut().retain(|k, _| survivors.contains(k));
    measured.entanglement_mut().values_mut()
        .for_each(|deps| { deps.retain(|k| !dead.contains(k)); });
    partner.entanglement_mut().retain(|k, _| !dead.contains(k));
    partner.entanglement_mut().values_mut()
        .for_each(|deps| { deps.retain(|k| survivors.contains(k)); });
    if !dead.is_empty() {
        debug!(pruned = dead.len(), "pruned uncorrelated partner states");
        partner.discard(dead);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    // equality up to a global phase, with a looser tolerance than
    // `Register`'s own
    fn assert_close(a: &Register, b: &Register) {
        let (a, b) = (a.amplitudes(), b.amplitudes());
        assert_eq!(a.len(), b.len());
        let (a0, b0)
            = a.iter().zip(&b)
            .find(|(ak, _)| ak.norm() > 1e-3)
            .expect("vanishing state");
        let phase = *a0 / *b0;
        let phase = phase / phase.norm();
        a.iter().zip(&b)
            .for_each(|(ak, bk)| {
                assert!((ak - phase * bk).norm() < 1e-9, "{} != {}", ak, bk);
            });
    }

    fn hadamard_then_measure() -> Circuit {
        let mut circuit = Circuit::new(Some(10546));
        circuit.initialize(1, 0, 0);
        circuit.add_hadamard(Reg::X, 1).unwrap()
            .add_measurement(Reg::X, vec![1]).unwrap();
        circuit
    }

    #[test]
    fn execute_all() {
        let mut circuit = hadamard_then_measure();
        assert_eq!(circuit.len(), 3);
        circuit.execute_all().unwrap();
        assert_eq!(circuit.next_gate_number(), 3);
        assert_eq!(circuit.outcomes().len(), 1);
        assert_eq!(circuit.outcomes()[0].step(), 2);
        assert!(circuit.next_gate().is_none());
        // running again starts over
        circuit.execute_all().unwrap();
        assert_eq!(circuit.next_gate_number(), 3);
        assert_eq!(circuit.outcomes().len(), 1);
    }

    #[test]
    fn step_forward_and_back() {
        let mut circuit = hadamard_then_measure();
        let zero = Register::stabilizer(1);
        let mut plus = Register::stabilizer(1);
        plus.hadamard(1);

        circuit.set_next_step().unwrap();
        assert_eq!(circuit.next_gate_number(), 2);
        assert_eq!(circuit.x_register(), &plus);
        circuit.set_previous_step().unwrap();
        assert_eq!(circuit.next_gate_number(), 1);
        assert_eq!(circuit.x_register(), &zero);
        // no-op at the start
        circuit.set_previous_step().unwrap();
        assert_eq!(circuit.next_gate_number(), 1);

        circuit.set_next_step().unwrap().set_next_step().unwrap();
        assert_eq!(circuit.next_gate_number(), 3);
        assert_eq!(
            circuit.set_previous_step().unwrap_err(),
            Error::Irreversible { step: 2 },
        );
        assert_eq!(circuit.next_gate_number(), 3);
        // no-op at the end
        circuit.set_next_step().unwrap();
        assert_eq!(circuit.next_gate_number(), 3);
    }

    #[test]
    fn no_wires() {
        let mut circuit = Circuit::new(None);
        assert_eq!(
            circuit.add_hadamard(Reg::X, 1).unwrap_err(),
            Error::NoWires { reg: Reg::X },
        );
        assert_eq!(circuit.set_next_step().unwrap_err(), Error::NotInitialized);
        circuit.initialize(2, 0, 0);
        assert!(circuit.add_hadamard(Reg::X, 1).is_ok());
        assert_eq!(
            circuit.add_function(Function::new(|x: i64, _: i64| x, None))
                .unwrap_err(),
            Error::NoWires { reg: Reg::Y },
        );
        assert_eq!(
            circuit.add_grover(Reg::Y, 0).unwrap_err(),
            Error::NoWires { reg: Reg::Y },
        );
        assert_eq!(circuit.len(), 2);
    }

    #[test]
    fn initial_bit_pattern() {
        let mut circuit = Circuit::new(None);
        circuit.initialize(2, 2, 0b1101);
        assert_eq!(circuit.x_register(), &Register::basis(2, 0b01, false));
        assert_eq!(circuit.y_register(), &Register::basis(2, 0b11, false));
        circuit.set_initial_qubits(0b0110).unwrap();
        assert_eq!(circuit.x_register(), &Register::basis(2, 0b10, false));
        assert_eq!(circuit.y_register(), &Register::basis(2, 0b01, false));
        assert_eq!(circuit.next_gate_number(), 1);
    }

    #[test]
    fn unitary_steps_undo() {
        for stabilizer in [true, false] {
            let mut circuit = Circuit::new(Some(10546));
            circuit.set_stabilizer_mode(stabilizer).initialize(3, 2, 0b10_101);
            let x0 = circuit.x_register().clone();
            let y0 = circuit.y_register().clone();
            circuit
                .add_hadamard(Reg::X, 1).unwrap()
                .add_cnot(Reg::X, 1, 2).unwrap()
                .add_s(Reg::X, 2).unwrap()
                .add_pauli_y(Reg::Y, 1).unwrap()
                .add_t(Reg::X, 3).unwrap()
                .add_sqrt_x(Reg::Y, 2).unwrap()
                .add_inv_t(Reg::X, 1).unwrap()
                .add_inv_s(Reg::X, 3).unwrap()
                .add_pauli_x(Reg::X, 2).unwrap()
                .add_pauli_z(Reg::X, 1).unwrap()
                .add_toffoli(Reg::X, 1, 2, 3).unwrap()
                .add_rotation(Reg::X, vec![3, 1], Axis::Y, 0.4).unwrap()
                .add_qft(Reg::X).unwrap()
                .add_grover(Reg::Y, 2).unwrap()
                .add_inv_qft(Reg::Y).unwrap();
            circuit.set_final_step().unwrap();
            assert_eq!(circuit.next_gate_number(), circuit.len());
            while circuit.next_gate_number() > 1 {
                circuit.set_previous_step().unwrap();
            }
            assert_close(circuit.x_register(), &x0);
            assert_close(circuit.y_register(), &y0);
        }
    }

    #[test]
    fn function_undo_replays() {
        let mut circuit = Circuit::new(Some(10546));
        circuit.initialize(2, 2, 0);
        circuit
            .add_hadamard(Reg::X, 1).unwrap()
            .add_hadamard(Reg::X, 2).unwrap()
            .add_function(Function::new(|x: i64, z: i64| x ^ z, Some(1))).unwrap();
        circuit.set_final_step().unwrap();
        assert_eq!(circuit.y_register().support(), vec![0, 1, 2, 3]);
        assert!(!circuit.y_register().entanglement().is_empty());
        assert_eq!(circuit.previous_gate().map(|g| g.name()), Some("Function"));

        circuit.set_previous_step().unwrap();
        assert_eq!(circuit.next_gate_number(), 3);
        assert_eq!(circuit.y_register(), &Register::basis(2, 0, false));
        assert!(circuit.y_register().entanglement().is_empty());
        assert_eq!(circuit.next_gate().map(|g| g.name()), Some("Function"));
    }

    #[test]
    fn measurement_prunes_partner() {
        for _ in 0..10 {
            let mut circuit = Circuit::new(None);
            circuit.initialize(2, 2, 0);
            circuit
                .add_hadamard(Reg::X, 1).unwrap()
                .add_hadamard(Reg::X, 2).unwrap()
                .add_function(Function::new(|x: i64, _: i64| x, None)).unwrap()
                .add_measurement(Reg::X, vec![]).unwrap();
            circuit.execute_all().unwrap();
            let Outcome::Register { state, .. } = circuit.outcomes()[0] else {
                panic!("expected a full-register outcome");
            };
            assert_eq!(circuit.y_register().support(), vec![state]);
            assert_eq!(circuit.x_register().support(), vec![state]);
            let norm: f64 = circuit.y_register().probabilities().iter().sum();
            assert!((norm - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn partial_measurement_prunes_partner() {
        let mut circuit = Circuit::new(Some(10546));
        circuit.initialize(2, 2, 0);
        circuit
            .add_hadamard(Reg::X, 1).unwrap()
            .add_hadamard(Reg::X, 2).unwrap()
            .add_function(Function::new(|x: i64, _: i64| x, Some(0))).unwrap()
            .add_measurement(Reg::X, vec![2]).unwrap();
        circuit.execute_all().unwrap();
        let Outcome::Qubits { ref results, .. } = circuit.outcomes()[0] else {
            panic!("expected single-qubit outcomes");
        };
        let high = usize::from(results[0].1) << 1;
        assert_eq!(circuit.y_register().support(), vec![high, high + 1]);
    }

    #[test]
    fn y_measurement_prunes_x() {
        for seed in 0..10 {
            let mut circuit = Circuit::new(Some(seed));
            circuit.initialize(2, 1, 0);
            circuit
                .add_hadamard(Reg::X, 1).unwrap()
                .add_hadamard(Reg::X, 2).unwrap()
                .add_function(Function::new(|x: i64, _: i64| x >> 1, None))
                .unwrap()
                .add_measurement(Reg::Y, vec![]).unwrap();
            circuit.execute_all().unwrap();
            let Outcome::Register { reg, state, .. } = circuit.outcomes()[0] else {
                panic!("expected a full-register outcome");
            };
            assert_eq!(reg, Reg::Y);
            assert_eq!(
                circuit.x_register().support(),
                vec![2 * state, 2 * state + 1],
            );
            let norm: f64 = circuit.x_register().probabilities().iter().sum();
            assert!((norm - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn nonexistent_qubits_are_not_recorded() {
        let mut circuit = Circuit::new(Some(10546));
        circuit.initialize(2, 0, 0b10);
        circuit.add_measurement(Reg::X, vec![0, 2, 5]).unwrap();
        circuit.execute_all().unwrap();
        assert_eq!(
            circuit.outcomes(),
            &[Outcome::Qubits { step: 1, reg: Reg::X, results: vec![(2, true)] }],
        );
    }

    #[test]
    fn grover_search() {
        let mut circuit = Circuit::new(Some(10546));
        circuit.initialize(3, 0, 0);
        for j in 1..=3 {
            circuit.add_hadamard(Reg::X, j).unwrap();
        }
        for _ in 0..Register::grover_steps(3) {
            circuit.add_grover(Reg::X, 5).unwrap();
        }
        circuit.set_final_step().unwrap();
        assert!(circuit.x_register().probabilities()[5] > 0.9);
    }

    #[test]
    fn grover_needle_out_of_range() {
        let mut circuit = Circuit::new(None);
        circuit.initialize(2, 0, 0);
        circuit.add_grover(Reg::X, 4).unwrap();
        assert_eq!(
            circuit.execute_all().unwrap_err(),
            Error::NeedleRange { needle: 4, dim: 4 },
        );
        assert_eq!(circuit.next_gate_number(), 1);
    }

    #[test]
    fn initialize_with_gates() {
        let mut circuit = Circuit::new(Some(10546));
        circuit.initialize_with(
            [2, 0],
            vec![Gate::H(Reg::X, 1), Gate::CX(Reg::X, 1, 2)],
        ).unwrap();
        assert_eq!(circuit.len(), 3);
        assert!(circuit.gates()[0].is_initial_state());
        circuit.set_final_step().unwrap();
        assert!(circuit.x_register().is_stabilizer());
        assert_eq!(circuit.x_register().support(), vec![0, 3]);
        assert_eq!(
            circuit.initialize_with([2, 0], vec![Gate::H(Reg::Y, 1)])
                .unwrap_err(),
            Error::NoWires { reg: Reg::Y },
        );
    }
}
