//! Stabilizer states as graph states dressed with local Clifford operators.
//!
//! Any stabilizer state of *n* qubits can be written as
//!
//! ∣ψ⟩ = (⊗<sub>*v*</sub> *C*<sub>*v*</sub>) ∏<sub>(*a*, *b*) ∈ *E*</sub>
//! CZ<sub>*ab*</sub> ∣+⟩<sup>⊗*n*</sup>
//!
//! where each *C*<sub>*v*</sub> is a [`LocalClifford`] (the vertex operator, or
//! "VOP") and *E* is the edge set of a simple graph. Single-qubit Clifford
//! gates only touch one VOP; CZ gates toggle an edge once the VOPs of both
//! vertices have been moved out of the way by local complementations; and a
//! *Z*-basis measurement cuts a vertex out of the graph. See Anders and Briegel
//! ([arXiv:quant-ph/0504117][graphsim]) for the general scheme.
//!
//! [graphsim]: https://arxiv.org/abs/quant-ph/0504117

use itertools::{ iproduct, Itertools };
use nalgebra as na;
use num_complex::Complex64 as C64;
use once_cell::sync::Lazy;
use rand::Rng;
use rustc_hash::FxHashSet;
use crate::{
    clifford::{ phase_between, LocalClifford },
    dense::DenseState,
};

/// A single vertex: its local Clifford operator and the indices of all
/// vertices it shares an edge with.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Vertex {
    vop: LocalClifford,
    adj: FxHashSet<usize>,
}

/// A stabilizer state of a finite register of qubits in graph form.
///
/// All qubit indices here are 0-based; out-of-range indices are ignored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphState {
    vertices: Vec<Vertex>,
}

impl GraphState {
    /// Create a new state of `n` qubits initialized to ∣0...0⟩.
    ///
    /// This is the empty graph with all VOPs equal to *H*.
    pub fn new(n: usize) -> Self {
        let vertices
            = (0..n)
            .map(|_| Vertex { vop: LocalClifford::H, adj: FxHashSet::default() })
            .collect();
        Self { vertices }
    }

    /// Return the number of qubits.
    pub fn num_qubits(&self) -> usize { self.vertices.len() }

    /// Return `true` if `a` and `b` share an edge.
    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        self.vertices.get(a).is_some_and(|v| v.adj.contains(&b))
    }

    /// Return the number of edges in the graph.
    pub fn num_edges(&self) -> usize {
        self.vertices.iter().map(|v| v.adj.len()).sum::<usize>() / 2
    }

    fn toggle_edge_unchecked(&mut self, a: usize, b: usize) {
        if self.vertices[a].adj.remove(&b) {
            self.vertices[b].adj.remove(&a);
        } else {
            self.vertices[a].adj.insert(b);
            self.vertices[b].adj.insert(a);
        }
    }

    fn set_edge_unchecked(&mut self, a: usize, b: usize, edge: bool) {
        if self.vertices[a].adj.contains(&b) != edge {
            self.toggle_edge_unchecked(a, b);
        }
    }

    fn local_op_unchecked(&mut self, node: usize, op: LocalClifford) {
        let vop = &mut self.vertices[node].vop;
        *vop = op * *vop;
    }

    /// Apply a single-qubit Clifford gate.
    pub fn apply_local(&mut self, node: usize, op: LocalClifford) -> &mut Self {
        if node < self.vertices.len() { self.local_op_unchecked(node, op); }
        self
    }

    pub fn apply_h(&mut self, node: usize) -> &mut Self {
        self.apply_local(node, LocalClifford::H)
    }

    pub fn apply_x(&mut self, node: usize) -> &mut Self {
        self.apply_local(node, LocalClifford::X)
    }

    pub fn apply_y(&mut self, node: usize) -> &mut Self {
        self.apply_local(node, LocalClifford::Y)
    }

    pub fn apply_z(&mut self, node: usize) -> &mut Self {
        self.apply_local(node, LocalClifford::Z)
    }

    pub fn apply_s(&mut self, node: usize) -> &mut Self {
        self.apply_local(node, LocalClifford::S)
    }

    pub fn apply_s_inv(&mut self, node: usize) -> &mut Self {
        self.apply_local(node, LocalClifford::S_DAG)
    }

    fn local_complement_unchecked(&mut self, node: usize) {
        let neighbors: Vec<usize>
            = self.vertices[node].adj.iter().copied().sorted().collect();
        neighbors.iter()
            .tuple_combinations()
            .for_each(|(a, b)| { self.toggle_edge_unchecked(*a, *b); });
        let vop = &mut self.vertices[node].vop;
        *vop = *vop * LocalClifford::SQRT_IX;
        for k in neighbors {
            let vop = &mut self.vertices[k].vop;
            *vop = *vop * LocalClifford::S;
        }
    }

    /// Perform a local complementation on `node`, toggling all edges in the
    /// subgraph induced by its neighborhood.
    ///
    /// The VOPs of `node` and its neighbors are updated so that the
    /// represented state is unchanged.
    pub fn local_complement(&mut self, node: usize) -> &mut Self {
        if node < self.vertices.len() { self.local_complement_unchecked(node); }
        self
    }

    // neighbor of `node` other than `avoid` with the fewest neighbors itself
    fn swap_partner(&self, node: usize, avoid: usize) -> Option<usize> {
        self.vertices[node].adj.iter()
            .copied()
            .filter(|k| *k != avoid)
            .min_by_key(|k| (self.vertices[*k].adj.len(), *k))
    }

    fn has_other_neighbors(&self, node: usize, avoid: usize) -> bool {
        self.vertices[node].adj.iter().any(|k| *k != avoid)
    }

    // reduce the VOP of `node` to the identity using local complementations
    // about `node` and one of its neighbors (other than `avoid`)
    fn remove_vop(&mut self, node: usize, avoid: usize) {
        let Some(swap) = self.swap_partner(node, avoid) else { return; };
        for step in REDUCTIONS[usize::from(self.vertices[node].vop.code())].iter() {
            match step {
                Reduce::Vertex => { self.local_complement_unchecked(node); },
                Reduce::Neighbor => { self.local_complement_unchecked(swap); },
            }
        }
    }

    /// Apply a CZ gate to `a` and `b`.
    pub fn apply_cz(&mut self, a: usize, b: usize) -> &mut Self {
        let n = self.vertices.len();
        if a >= n || b >= n || a == b { return self; }
        if self.has_other_neighbors(a, b) { self.remove_vop(a, b); }
        if self.has_other_neighbors(b, a) { self.remove_vop(b, a); }
        // removing b's VOP may have given a new neighbors
        if self.has_other_neighbors(a, b)
            && !self.vertices[a].vop.is_z_commuting()
        {
            self.remove_vop(a, b);
        }
        let edge = self.has_edge(a, b);
        let va = usize::from(self.vertices[a].vop.code());
        let vb = usize::from(self.vertices[b].vop.code());
        let (new_edge, new_va, new_vb) = CPHASE[usize::from(edge)][va][vb];
        self.set_edge_unchecked(a, b, new_edge);
        self.vertices[a].vop = new_va;
        self.vertices[b].vop = new_vb;
        self
    }

    /// Apply a CNOT gate; the first qubit index is the control.
    pub fn apply_cx(&mut self, c: usize, t: usize) -> &mut Self {
        let n = self.vertices.len();
        if c >= n || t >= n || c == t { return self; }
        self.apply_h(t).apply_cz(c, t).apply_h(t)
    }

    /// Perform a projective measurement of a single qubit in the *Z*-basis,
    /// returning `true` for outcome ∣1⟩.
    ///
    /// The measured vertex is left isolated in the graph with its VOP set to
    /// prepare the observed basis state. Returns `false` for nonexistent
    /// qubits.
    pub fn measure<R>(&mut self, node: usize, rng: &mut R) -> bool
    where R: Rng + ?Sized
    {
        if node >= self.vertices.len() { return false; }
        // the physical observable Z, seen through the VOP, is ±P for some
        // Pauli P acting on the bare graph state; rotate P onto Z with local
        // complementations, which leave the state untouched
        loop {
            let mut obs = LocalClifford::Z;
            let sign = match obs.conjugate(self.vertices[node].vop.adjoint()) {
                Ok(sign) => sign,
                Err(_) => unreachable!(),
            };
            match obs {
                LocalClifford::Z => { return self.measure_z(node, sign, rng); },
                LocalClifford::Y => { self.local_complement_unchecked(node); },
                _ => match self.swap_partner(node, node) {
                    Some(k) => { self.local_complement_unchecked(k); },
                    // isolated vertex in ∣+⟩: deterministic
                    None => { return sign < 0; },
                },
            }
        }
    }

    fn measure_z<R>(&mut self, node: usize, sign: i8, rng: &mut R) -> bool
    where R: Rng + ?Sized
    {
        let graph_outcome: bool = rng.gen();
        let neighbors = std::mem::take(&mut self.vertices[node].adj);
        for k in neighbors {
            self.vertices[k].adj.remove(&node);
            if graph_outcome {
                let vop = &mut self.vertices[k].vop;
                *vop = *vop * LocalClifford::Z;
            }
        }
        let prep
            = if graph_outcome {
                LocalClifford::X * LocalClifford::H
            } else {
                LocalClifford::H
            };
        let vop = &mut self.vertices[node].vop;
        *vop = *vop * prep;
        graph_outcome ^ (sign < 0)
    }

    /// Materialize the full amplitude vector of the state, defined up to a
    /// global phase.
    pub fn to_dense(&self) -> DenseState {
        let n = self.vertices.len();
        let mut dense = DenseState::uniform(n);
        for (a, vertex) in self.vertices.iter().enumerate() {
            vertex.adj.iter()
                .filter(|b| **b > a)
                .for_each(|b| { dense.apply_cz(a, *b); });
        }
        for (k, vertex) in self.vertices.iter().enumerate() {
            dense.apply_matrix(k, &vertex.vop.matrix());
        }
        dense
    }
}

impl From<GraphState> for DenseState {
    fn from(graph: GraphState) -> Self { graph.to_dense() }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Reduce {
    // local complementation about the vertex itself: VOP ← VOP·√(iX)
    Vertex,
    // local complementation about a neighbor: VOP ← VOP·S
    Neighbor,
}

// for each VOP, a shortest sequence of local complementations bringing it to
// the identity
static REDUCTIONS: Lazy<Vec<Vec<Reduce>>> = Lazy::new(|| {
    let mut paths: Vec<Option<Vec<Reduce>>> = vec![None; LocalClifford::COUNT];
    paths[0] = Some(Vec::new());
    // breadth-first search outward from the identity, walking steps backward
    let mut frontier: Vec<LocalClifford> = vec![LocalClifford::I];
    while !frontier.is_empty() {
        let mut next: Vec<LocalClifford> = Vec::new();
        for c in frontier {
            let path = paths[usize::from(c.code())].clone().unwrap_or_default();
            let steps = [
                (Reduce::Vertex, LocalClifford::SQRT_IX),
                (Reduce::Neighbor, LocalClifford::S),
            ];
            for (step, op) in steps {
                // prev · op = c  ⇒  prev = c · op†
                let prev = c * op.adjoint();
                let entry = &mut paths[usize::from(prev.code())];
                if entry.is_none() {
                    let mut p = vec![step];
                    p.extend(path.iter().copied());
                    *entry = Some(p);
                    next.push(prev);
                }
            }
        }
        frontier = next;
    }
    paths.into_iter()
        .map(|p| p.expect("√(iX) and S do not generate the local Clifford group"))
        .collect()
});

type CPhaseEntry = (bool, LocalClifford, LocalClifford);

// controlled-phase look-up table, indexed by [edge][vop a][vop b]
//
// Entry (e', A', B') satisfies CZ·(A⊗B)·CZ^e ∝ (A'⊗B')·CZ^e' on every input
// the two vertices can be in: a vertex with a Z-commuting VOP may be
// entangled with the rest of the graph and so must be matched on both basis
// states, while any other vertex only ever enters as ∣+⟩.
static CPHASE: Lazy<Vec<Vec<Vec<CPhaseEntry>>>> = Lazy::new(|| {
    type DMat = na::DMatrix<C64>;
    use std::f64::consts::FRAC_1_SQRT_2 as ORT2;

    let to_dmat = |c: LocalClifford| -> DMat {
        let m = c.matrix();
        DMat::from_fn(2, 2, |i, j| m[(i, j)])
    };
    let mut cz = DMat::identity(4, 4);
    cz[(3, 3)] = C64::from(-1.0);
    let cz_pow = |e: bool| if e { cz.clone() } else { DMat::identity(4, 4) };

    let zero = DMat::from_column_slice(2, 1, &[C64::from(1.0), C64::from(0.0)]);
    let one = DMat::from_column_slice(2, 1, &[C64::from(0.0), C64::from(1.0)]);
    let plus = DMat::from_column_slice(2, 1, &[C64::from(ORT2), C64::from(ORT2)]);
    // input subspaces: (full a, full b) as a pair of flags
    let inputs = |full_a: bool, full_b: bool| -> DMat {
        let basis_a = if full_a { vec![&zero, &one] } else { vec![&plus] };
        let basis_b = if full_b { vec![&zero, &one] } else { vec![&plus] };
        let cols: Vec<DMat>
            = iproduct!(basis_a, basis_b)
            .map(|(ua, ub)| ua.kronecker(ub))
            .collect();
        DMat::from_fn(4, cols.len(), |i, j| cols[j][(i, 0)])
    };
    let configs: Vec<DMat>
        = iproduct!([false, true], [false, true])
        .map(|(fa, fb)| inputs(fa, fb))
        .collect();
    let config_idx = |fa: bool, fb: bool| 2 * usize::from(fa) + usize::from(fb);

    let candidates: Vec<(CPhaseEntry, DMat)>
        = iproduct!([false, true], LocalClifford::all(), LocalClifford::all())
        .map(|(e, a, b)| ((e, a, b), to_dmat(a).kronecker(&to_dmat(b)) * cz_pow(e)))
        .collect();
    // candidates applied to each input subspace
    let applied: Vec<Vec<DMat>>
        = configs.iter()
        .map(|v| candidates.iter().map(|(_, k)| k * v).collect())
        .collect();

    [false, true].into_iter()
        .map(|e| {
            LocalClifford::all()
                .map(|a| {
                    LocalClifford::all()
                        .map(|b| {
                            let cfg = config_idx(a.is_z_commuting(), b.is_z_commuting());
                            let target
                                = &cz * to_dmat(a).kronecker(&to_dmat(b))
                                * cz_pow(e) * &configs[cfg];
                            candidates.iter().zip(&applied[cfg])
                                .find(|(_, kv)| {
                                    phase_between(target.as_slice(), kv.as_slice())
                                        .is_some()
                                })
                                .map(|((entry, _), _)| *entry)
                                .expect("missing controlled-phase table entry")
                        })
                        .collect::<Vec<_>>()
                })
                .collect::<Vec<_>>()
        })
        .collect()
});

#[cfg(test)]
mod test {
    use super::*;
    use rand::{ rngs::StdRng, SeedableRng };

    fn random_clifford_ops(
        graph: &mut GraphState,
        dense: &mut DenseState,
        rng: &mut StdRng,
        depth: usize,
    ) {
        let n = graph.num_qubits();
        for _ in 0..depth {
            let q = rng.gen_range(0..n);
            match rng.gen_range(0..7) {
                0 => { graph.apply_h(q); dense.apply_h(q); },
                1 => { graph.apply_x(q); dense.apply_x(q); },
                2 => { graph.apply_y(q); dense.apply_y(q); },
                3 => { graph.apply_z(q); dense.apply_z(q); },
                4 => { graph.apply_s(q); dense.apply_s(q); },
                5 => { graph.apply_s_inv(q); dense.apply_s_inv(q); },
                _ => {
                    let t = rng.gen_range(0..n);
                    if rng.gen() {
                        graph.apply_cx(q, t);
                        dense.apply_cx(q, t);
                    } else {
                        graph.apply_cz(q, t);
                        dense.apply_cz(q, t);
                    }
                },
            }
        }
    }

    #[test]
    fn new_is_all_zeros() {
        let graph = GraphState::new(3);
        assert!(graph.to_dense().eq_up_to_phase(&DenseState::zero(3)));
        assert_eq!(graph.num_edges(), 0);
    }

    #[test]
    fn reductions_reach_identity() {
        for c in LocalClifford::all() {
            let reduced
                = REDUCTIONS[usize::from(c.code())].iter()
                .fold(c, |acc, step| match step {
                    Reduce::Vertex => acc * LocalClifford::SQRT_IX,
                    Reduce::Neighbor => acc * LocalClifford::S,
                });
            assert_eq!(reduced, LocalClifford::I, "{}", c);
        }
    }

    #[test]
    fn local_complement_preserves_state() {
        let mut rng = StdRng::seed_from_u64(10546);
        let mut graph = GraphState::new(5);
        let mut dense = DenseState::zero(5);
        random_clifford_ops(&mut graph, &mut dense, &mut rng, 40);
        for k in 0..5 {
            let before = graph.to_dense();
            graph.local_complement(k);
            assert!(graph.to_dense().eq_up_to_phase(&before));
        }
    }

    #[test]
    fn bell_pair() {
        let mut graph = GraphState::new(2);
        graph.apply_h(0).apply_cx(0, 1);
        let mut dense = DenseState::zero(2);
        dense.apply_h(0).apply_cx(0, 1);
        assert!(graph.to_dense().eq_up_to_phase(&dense));
        assert!(graph.has_edge(0, 1));
    }

    #[test]
    fn cz_twice_is_identity() {
        let mut graph = GraphState::new(3);
        graph.apply_h(0).apply_h(1).apply_s(1).apply_cx(1, 2);
        let before = graph.to_dense();
        graph.apply_cz(0, 1).apply_cz(0, 1);
        assert!(graph.to_dense().eq_up_to_phase(&before));
    }

    #[test]
    fn random_circuits_match_dense() {
        let mut rng = StdRng::seed_from_u64(10546);
        for _ in 0..20 {
            let mut graph = GraphState::new(5);
            let mut dense = DenseState::zero(5);
            random_clifford_ops(&mut graph, &mut dense, &mut rng, 60);
            assert!(graph.to_dense().eq_up_to_phase(&dense));
        }
    }

    #[test]
    fn measurement_collapses() {
        let mut rng = StdRng::seed_from_u64(10546);
        for _ in 0..20 {
            let mut graph = GraphState::new(3);
            graph.apply_h(0).apply_cx(0, 1).apply_cx(1, 2);
            let m0 = graph.measure(0, &mut rng);
            let m2 = graph.measure(2, &mut rng);
            assert_eq!(m0, m2);
            let expected = if m0 { 0b111 } else { 0b000 };
            let collapsed = DenseState::basis(3, expected);
            assert!(graph.to_dense().eq_up_to_phase(&collapsed));
            assert_eq!(graph.num_edges(), 0);
        }
    }

    #[test]
    fn deterministic_measurement() {
        let mut rng = StdRng::seed_from_u64(10546);
        let mut graph = GraphState::new(2);
        graph.apply_x(1);
        for _ in 0..10 {
            assert!(!graph.measure(0, &mut rng));
            assert!(graph.measure(1, &mut rng));
        }
    }

    #[test]
    fn measurement_statistics() {
        let mut rng = StdRng::seed_from_u64(10546);
        let ones
            = (0..400)
            .filter(|_| {
                let mut graph = GraphState::new(2);
                graph.apply_h(0).apply_s(0).apply_cx(0, 1).apply_h(1);
                graph.measure(1, &mut rng)
            })
            .count();
        assert!((120..280).contains(&ones));
    }

    #[test]
    fn measurement_after_random_circuits() {
        let mut rng = StdRng::seed_from_u64(10546);
        for _ in 0..20 {
            let mut graph = GraphState::new(4);
            let mut dense = DenseState::zero(4);
            random_clifford_ops(&mut graph, &mut dense, &mut rng, 30);
            let q = rng.gen_range(0..4);
            let p0 = dense.probability_zero(q);
            let outcome = graph.measure(q, &mut rng);
            if outcome {
                assert!(p0 < 1.0 - 1e-9);
            } else {
                assert!(p0 > 1e-9);
            }
            dense.collapse_qubit(q, outcome);
            assert!(graph.to_dense().eq_up_to_phase(&dense));
        }
    }
}
