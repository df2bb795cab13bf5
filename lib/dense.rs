//! Dense state-vector representation of a register.
//!
//! A register of *n* qubits is held as its 2<sup>*n*</sup> complex amplitudes
//! in the *z*-basis. Qubit `q` (0-based) corresponds to bit `q` of the basis
//! index, so single-qubit gates act on amplitude pairs `(i, i + 2^q)` taken
//! from consecutive blocks of size 2<sup>*q* + 1</sup>.

use std::f64::consts::{ FRAC_1_SQRT_2 as ORT2, FRAC_PI_4, PI };
use num_complex::Complex64 as C64;
use rand::Rng;
use crate::{ ACCURACY, clifford::Mat2 };

const ZERO: C64 = C64 { re: 0.0, im: 0.0 };
const ONE: C64 = C64 { re: 1.0, im: 0.0 };

/// Pure state of a register as a full amplitude vector.
#[derive(Clone, Debug, PartialEq)]
pub struct DenseState {
    n: usize,
    amps: Vec<C64>,
}

/// Creates a zero-qubit state.
impl Default for DenseState {
    fn default() -> Self { Self::zero(0) }
}

impl DenseState {
    /// Create a new state initialized to ∣0...0⟩.
    pub fn zero(n: usize) -> Self { Self::basis(n, 0) }

    /// Create a new state initialized to the basis state ∣k⟩, with `k` taken
    /// modulo 2<sup>*n*</sup>.
    pub fn basis(n: usize, k: usize) -> Self {
        let dim = 1_usize << n;
        let mut amps = vec![ZERO; dim];
        amps[k % dim] = ONE;
        Self { n, amps }
    }

    /// Create the even superposition ∣+...+⟩.
    pub fn uniform(n: usize) -> Self {
        let dim = 1_usize << n;
        let a = C64::from((dim as f64).sqrt().recip());
        Self { n, amps: vec![a; dim] }
    }

    /// Wrap a vector of amplitudes, whose length must be a power of two.
    ///
    /// The amplitudes are used as given; call [`normalize`][Self::normalize]
    /// if needed.
    pub fn from_amplitudes(amps: Vec<C64>) -> Option<Self> {
        amps.len().is_power_of_two()
            .then(|| Self { n: amps.len().trailing_zeros() as usize, amps })
    }

    /// Return the number of qubits.
    pub fn num_qubits(&self) -> usize { self.n }

    /// Return the number of basis states, 2<sup>*n*</sup>.
    pub fn dim(&self) -> usize { self.amps.len() }

    pub fn amplitudes(&self) -> &[C64] { &self.amps }

    pub fn amplitudes_mut(&mut self) -> &mut [C64] { &mut self.amps }

    /// Return the squared L2 norm.
    pub fn norm_sqr(&self) -> f64 {
        self.amps.iter().map(|a| a.norm_sqr()).sum()
    }

    /// Rescale to unit norm. A vanishing state is left as is.
    pub fn normalize(&mut self) -> &mut Self {
        let norm = self.norm_sqr().sqrt();
        if norm > ACCURACY {
            self.amps.iter_mut().for_each(|a| { *a /= norm; });
        }
        self
    }

    /// Zero all real and imaginary parts smaller than [`ACCURACY`].
    pub fn chop(&mut self) -> &mut Self {
        for a in self.amps.iter_mut() {
            if a.re.abs() < ACCURACY { a.re = 0.0; }
            if a.im.abs() < ACCURACY { a.im = 0.0; }
        }
        self
    }

    // visit every amplitude pair (i, i + 2^q), block by block
    fn for_pairs<F>(&mut self, q: usize, mut f: F) -> &mut Self
    where F: FnMut(C64, C64) -> (C64, C64)
    {
        if q >= self.n { return self; }
        let half = 1_usize << q;
        for block in (0..self.amps.len()).step_by(2 * half) {
            for i0 in block..block + half {
                let i1 = i0 + half;
                let (b0, b1) = f(self.amps[i0], self.amps[i1]);
                self.amps[i0] = b0;
                self.amps[i1] = b1;
            }
        }
        self
    }

    /// Apply an arbitrary 2 × 2 matrix to qubit `q`.
    pub fn apply_matrix(&mut self, q: usize, m: &Mat2) -> &mut Self {
        let (m00, m01, m10, m11) = (m[(0, 0)], m[(0, 1)], m[(1, 0)], m[(1, 1)]);
        self.for_pairs(q, |a, b| (m00 * a + m01 * b, m10 * a + m11 * b))
    }

    pub fn apply_h(&mut self, q: usize) -> &mut Self {
        self.for_pairs(q, |a, b| ((a + b) * ORT2, (a - b) * ORT2))
    }

    pub fn apply_x(&mut self, q: usize) -> &mut Self {
        self.for_pairs(q, |a, b| (b, a))
    }

    pub fn apply_y(&mut self, q: usize) -> &mut Self {
        self.for_pairs(q, |a, b| (-C64::i() * b, C64::i() * a))
    }

    pub fn apply_z(&mut self, q: usize) -> &mut Self {
        self.for_pairs(q, |a, b| (a, -b))
    }

    /// Multiply the ∣1⟩ component of qubit `q` by a phase.
    pub fn apply_phase(&mut self, q: usize, phase: C64) -> &mut Self {
        self.for_pairs(q, |a, b| (a, phase * b))
    }

    pub fn apply_s(&mut self, q: usize) -> &mut Self {
        self.apply_phase(q, C64::i())
    }

    pub fn apply_s_inv(&mut self, q: usize) -> &mut Self {
        self.apply_phase(q, -C64::i())
    }

    pub fn apply_t(&mut self, q: usize) -> &mut Self {
        self.apply_phase(q, C64::cis(FRAC_PI_4))
    }

    pub fn apply_t_inv(&mut self, q: usize) -> &mut Self {
        self.apply_phase(q, C64::cis(-FRAC_PI_4))
    }

    /// Apply √*X* = ½ [[1 + i, 1 - i], [1 - i, 1 + i]].
    pub fn apply_sqrt_x(&mut self, q: usize) -> &mut Self {
        let p = C64::new(0.5, 0.5);
        let m = C64::new(0.5, -0.5);
        self.for_pairs(q, |a, b| (p * a + m * b, m * a + p * b))
    }

    /// Apply (√*X*)† = ½ [[1 - i, 1 + i], [1 + i, 1 - i]].
    pub fn apply_sqrt_x_inv(&mut self, q: usize) -> &mut Self {
        let p = C64::new(0.5, 0.5);
        let m = C64::new(0.5, -0.5);
        self.for_pairs(q, |a, b| (m * a + p * b, p * a + m * b))
    }

    // swap each pair (i, i ^ 2^t) exactly once over indices i whose bits in
    // `mask` are all set
    fn controlled_swap(&mut self, mask: usize, t: usize) -> &mut Self {
        let tbit = 1_usize << t;
        for i in 0..self.amps.len() {
            if i & mask == mask && i & tbit == 0 {
                self.amps.swap(i, i | tbit);
            }
        }
        self
    }

    /// Apply a CNOT; the first qubit index is the control.
    pub fn apply_cx(&mut self, c: usize, t: usize) -> &mut Self {
        if c >= self.n || t >= self.n || c == t { return self; }
        self.controlled_swap(1 << c, t)
    }

    /// Apply a Toffoli gate with controls `c1`, `c2`.
    pub fn apply_toffoli(&mut self, c1: usize, c2: usize, t: usize)
        -> &mut Self
    {
        if c1 >= self.n || c2 >= self.n || t >= self.n
            || c1 == t || c2 == t
        {
            return self;
        }
        self.controlled_swap((1 << c1) | (1 << c2), t)
    }

    /// Apply a CZ gate.
    pub fn apply_cz(&mut self, a: usize, b: usize) -> &mut Self {
        if a >= self.n || b >= self.n || a == b { return self; }
        let mask = (1_usize << a) | (1_usize << b);
        self.amps.iter_mut().enumerate()
            .filter(|(i, _)| i & mask == mask)
            .for_each(|(_, amp)| { *amp = -*amp; });
        self
    }

    /// Apply a 2 × 2 matrix to qubit `t`, restricted to basis states where
    /// all `controls` are set.
    pub fn apply_controlled(&mut self, controls: &[usize], t: usize, m: &Mat2)
        -> &mut Self
    {
        if t >= self.n || controls.iter().any(|c| *c >= self.n || *c == t) {
            return self;
        }
        let mask: usize = controls.iter().fold(0, |acc, c| acc | (1 << c));
        let tbit = 1_usize << t;
        let (m00, m01, m10, m11) = (m[(0, 0)], m[(0, 1)], m[(1, 0)], m[(1, 1)]);
        for i0 in 0..self.amps.len() {
            if i0 & mask == mask && i0 & tbit == 0 {
                let i1 = i0 | tbit;
                let (a, b) = (self.amps[i0], self.amps[i1]);
                self.amps[i0] = m00 * a + m01 * b;
                self.amps[i1] = m10 * a + m11 * b;
            }
        }
        self
    }

    /// In-place radix-2 discrete Fourier transform over the full vector,
    /// `a_k → Σ_j a_j exp(sign · 2πi jk / N) / √N`.
    ///
    /// Bit-reversal permutation followed by Danielson-Lanczos butterflies.
    pub fn fft(&mut self, sign: f64) -> &mut Self {
        let n = self.amps.len();
        if n < 2 { return self; }
        let mut j: usize = 0;
        for i in 0..n {
            if j > i { self.amps.swap(i, j); }
            let mut m = n >> 1;
            while m >= 1 && j & m != 0 {
                j ^= m;
                m >>= 1;
            }
            j |= m;
        }
        let mut len: usize = 2;
        while len <= n {
            let w_len = C64::cis(sign * 2.0 * PI / len as f64);
            for start in (0..n).step_by(len) {
                let mut w = ONE;
                for k in 0..len / 2 {
                    let u = self.amps[start + k];
                    let v = self.amps[start + k + len / 2] * w;
                    self.amps[start + k] = u + v;
                    self.amps[start + k + len / 2] = u - v;
                    w *= w_len;
                }
            }
            len <<= 1;
        }
        let scale = (n as f64).sqrt().recip();
        self.amps.iter_mut().for_each(|a| { *a *= scale; });
        self
    }

    /// Fourier transform over the first `q` amplitudes only, by direct
    /// summation; the rest are left alone. The result is renormalized and
    /// chopped.
    pub fn dft_prefix(&mut self, q: usize, sign: f64) -> &mut Self {
        let q = q.min(self.amps.len());
        if q == 0 { return self; }
        let scale = (q as f64).sqrt().recip();
        let tmp: Vec<C64>
            = (0..q)
            .map(|k| {
                self.amps[..q].iter().enumerate()
                    .map(|(j, a)| {
                        let theta = sign * 2.0 * PI * ((j * k) % q) as f64
                            / q as f64;
                        a * C64::cis(theta)
                    })
                    .sum::<C64>()
                    * scale
            })
            .collect();
        self.amps[..q].copy_from_slice(&tmp);
        self.normalize().chop()
    }

    /// Negate the amplitude of basis state `k`.
    pub fn flip_phase(&mut self, k: usize) -> &mut Self {
        if let Some(a) = self.amps.get_mut(k) { *a = -*a; }
        self
    }

    /// Negate every amplitude except that of ∣0...0⟩.
    pub fn flip_nonzero(&mut self) -> &mut Self {
        self.amps.iter_mut().skip(1).for_each(|a| { *a = -*a; });
        self
    }

    /// Apply a Hadamard to every qubit.
    pub fn apply_h_all(&mut self) -> &mut Self {
        (0..self.n).for_each(|q| { self.apply_h(q); });
        self
    }

    /// Return the probability of measuring every basis state.
    pub fn probabilities(&self) -> Vec<f64> {
        self.amps.iter().map(|a| a.norm_sqr()).collect()
    }

    /// Return the probability of finding qubit `q` in ∣0⟩.
    pub fn probability_zero(&self, q: usize) -> f64 {
        let bit = 1_usize << q;
        self.amps.iter().enumerate()
            .filter(|(i, _)| i & bit == 0)
            .map(|(_, a)| a.norm_sqr())
            .sum()
    }

    /// Zero every amplitude inconsistent with qubit `q` reading `one` and
    /// renormalize.
    pub fn collapse_qubit(&mut self, q: usize, one: bool) -> &mut Self {
        let bit = 1_usize << q;
        self.amps.iter_mut().enumerate()
            .filter(|(i, _)| (i & bit != 0) != one)
            .for_each(|(_, a)| { *a = ZERO; });
        self.normalize()
    }

    /// Collapse onto basis state `k`.
    pub fn collapse_basis(&mut self, k: usize) -> &mut Self {
        self.amps.iter_mut().for_each(|a| { *a = ZERO; });
        if let Some(a) = self.amps.get_mut(k) { *a = ONE; }
        self
    }

    /// Sample a basis index by subtracting cumulative probabilities from a
    /// uniform random number until the running total goes negative.
    pub fn sample_basis<R>(&self, rng: &mut R) -> usize
    where R: Rng + ?Sized
    {
        let mut r: f64 = rng.gen();
        let mut last_nonzero: usize = 0;
        for (k, a) in self.amps.iter().enumerate() {
            let p = a.norm_sqr();
            if p > 0.0 { last_nonzero = k; }
            r -= p;
            if r < 0.0 { return k; }
        }
        // only reachable through rounding when r lands within ~1e-16 of 1
        last_nonzero
    }

    /// Return `true` if `self` and `other` are equal up to a global phase,
    /// within [`ACCURACY`].
    ///
    /// The phase is fixed at the first index where both amplitudes are
    /// clearly non-vanishing.
    pub fn eq_up_to_phase(&self, other: &Self) -> bool {
        if self.amps.len() != other.amps.len() { return false; }
        let threshold = ACCURACY.sqrt();
        let Some((a, b))
            = self.amps.iter().zip(other.amps.iter())
            .find(|(a, b)| a.norm() > threshold && b.norm() > threshold)
            else {
                return self.amps.iter().chain(other.amps.iter())
                    .all(|a| a.norm() < threshold);
            };
        let lambda = a / b;
        let lambda = lambda / lambda.norm();
        self.amps.iter().zip(other.amps.iter())
            .all(|(a, b)| (a - lambda * b).norm() < ACCURACY)
    }
}
