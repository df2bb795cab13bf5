//! The 24-element group of single-qubit (local) Clifford operators.
//!
//! Every element is identified by an integer code `sign + 4 * perm`, where
//! `sign` picks one of the Pauli operators *I*, *X*, *Y*, *Z* and `perm` picks
//! one of six representatives *A*, ..., *F* of the ways a Clifford operator
//! can permute the three Bloch-sphere axes:
//!
//! | letter | representative | axis permutation |
//! |:------:|:--------------:|:----------------:|
//! | A      | *I*            | identity         |
//! | B      | *S*            | x ↔ y            |
//! | C      | *H*            | x ↔ z            |
//! | D      | *HSH*          | y ↔ z            |
//! | E      | *HS*           | x → y → z → x    |
//! | F      | *SH*           | x → z → y → x    |
//!
//! The operator with code `sign + 4 * perm` has matrix `σ_sign · P_perm`
//! (modulo a global phase). All group operations are table look-ups; the
//! tables are built once, on first use, from these matrices and never change
//! afterward.

use std::{ fmt, ops::Mul };
use itertools::iproduct;
use nalgebra as na;
use num_complex::Complex64 as C64;
use once_cell::sync::Lazy;
use crate::error::{ Error, Result };

/// A 2 × 2 complex matrix.
pub type Mat2 = na::Matrix2<C64>;

// tolerance for matching table entries; all entries are multiples of 1/2 or
// 1/√2, so this only has to absorb rounding
const TABLE_EPS: f64 = 1e-9;

const PERM_LETTERS: [char; 6] = ['A', 'B', 'C', 'D', 'E', 'F'];

/// A single-qubit Pauli operator.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Pauli {
    /// Identity
    I,
    /// σ<sub>*x*</sub>
    X,
    /// σ<sub>*y*</sub>
    Y,
    /// σ<sub>*z*</sub>
    Z,
}

impl fmt::Display for Pauli {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl Pauli {
    fn from_int(u: u8) -> Self {
        match u % 4 {
            0 => Self::I,
            1 => Self::X,
            2 => Self::Y,
            3 => Self::Z,
            _ => unreachable!(),
        }
    }

    /// Return the matrix representation of `self`.
    pub fn matrix(self) -> Mat2 {
        let o = C64::from(0.0);
        let l = C64::from(1.0);
        let i = C64::i();
        match self {
            Self::I => Mat2::new(l, o, o,  l),
            Self::X => Mat2::new(o, l, l,  o),
            Self::Y => Mat2::new(o, -i, i, o),
            Self::Z => Mat2::new(l, o, o, -l),
        }
    }
}

/// An element of the single-qubit Clifford group, identified by its code in
/// `0..24`.
///
/// Equality and hashing are by code alone.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocalClifford(u8);

impl Default for LocalClifford {
    fn default() -> Self { Self::I }
}

impl fmt::Display for LocalClifford {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Mul for LocalClifford {
    type Output = Self;

    /// Operator product; `a * b` applies `b` first.
    fn mul(self, rhs: Self) -> Self::Output {
        Self(TABLES.mul[self.idx()][rhs.idx()])
    }
}

impl LocalClifford {
    /// Identity.
    pub const I: Self = Self(0);
    /// Pauli *X*.
    pub const X: Self = Self(1);
    /// Pauli *Y*.
    pub const Y: Self = Self(2);
    /// Pauli *Z*.
    pub const Z: Self = Self(3);
    /// π/2 phase gate, `diag(1, i)`.
    pub const S: Self = Self(4);
    /// Inverse phase gate, `diag(1, -i)`.
    pub const S_DAG: Self = Self(7);
    /// Hadamard.
    pub const H: Self = Self(8);
    /// *S* followed by *H*.
    pub const HS: Self = Self(16);
    /// *H* followed by *S*.
    pub const SH: Self = Self(20);
    /// √(i*X*) = exp(iπ*X*/4), the vertex factor picked up under local
    /// complementation.
    pub const SQRT_IX: Self = Self(13);

    /// Number of elements in the group.
    pub const COUNT: usize = 24;

    /// Look up an element by code, returning `None` if `code >= 24`.
    pub fn from_code(code: u8) -> Option<Self> {
        (usize::from(code) < Self::COUNT).then_some(Self(code))
    }

    /// Iterate over all 24 elements in code order.
    pub fn all() -> impl Iterator<Item = Self> + Clone {
        (0..Self::COUNT as u8).map(Self)
    }

    pub fn code(self) -> u8 { self.0 }

    fn idx(self) -> usize { usize::from(self.0) }

    /// The Pauli factor of the element.
    pub fn sign(self) -> Pauli { Pauli::from_int(self.0 % 4) }

    /// The permutation index (`0..6` for *A*..*F*).
    pub fn perm(self) -> u8 { self.0 / 4 }

    /// Return `true` if `self` is one of *X*, *Y*, *Z*.
    pub fn is_pauli(self) -> bool { (1..=3).contains(&self.0) }

    /// Return `true` if `self` is diagonal in the computational basis, i.e.
    /// it commutes with *Z* and with controlled-phase gates.
    pub fn is_z_commuting(self) -> bool { TABLES.zcomm[self.idx()] }

    /// Hermitian adjoint.
    pub fn adjoint(self) -> Self { Self(TABLES.adj[self.idx()]) }

    /// Return the fixed matrix representative of `self`.
    pub fn matrix(self) -> Mat2 { TABLES.matrix[self.idx()] }

    /// Conjugate a Pauli operator, replacing `self` with `trans · self ·
    /// trans†` and returning the sign (±1) picked up along the way.
    ///
    /// Fails if `self` is not *X*, *Y*, or *Z*.
    pub fn conjugate(&mut self, trans: Self) -> Result<i8> {
        if !self.is_pauli() { return Err(Error::NotPauli(self.name())); }
        let (code, sign) = TABLES.conj[self.idx() - 1][trans.idx()];
        self.0 = code;
        Ok(sign)
    }

    /// Short name: I, X, Y, Z, S, H, HS, SH, or `<Pauli><letter>` otherwise.
    pub fn name(self) -> String {
        match self.0 {
            0 => "I".to_string(),
            1 => "X".to_string(),
            2 => "Y".to_string(),
            3 => "Z".to_string(),
            4 => "S".to_string(),
            8 => "H".to_string(),
            16 => "HS".to_string(),
            20 => "SH".to_string(),
            _ => format!(
                "{}{}", self.sign(), PERM_LETTERS[usize::from(self.perm())]),
        }
    }
}

/// Return `λ` with |λ| = 1 such that `a = λ b` elementwise, if one exists.
pub(crate) fn phase_between(a: &[C64], b: &[C64]) -> Option<C64> {
    if a.len() != b.len() { return None; }
    let (ak, bk)
        = a.iter().zip(b)
        .find(|(ak, bk)| ak.norm() > TABLE_EPS && bk.norm() > TABLE_EPS)?;
    let lambda = ak / bk;
    if (lambda.norm() - 1.0).abs() > TABLE_EPS { return None; }
    a.iter().zip(b)
        .all(|(aj, bj)| (aj - lambda * bj).norm() < TABLE_EPS)
        .then_some(lambda)
}

struct Tables {
    matrix: [Mat2; 24],
    mul: [[u8; 24]; 24],
    adj: [u8; 24],
    // indexed by [pauli - 1][trans]; holds (new code, sign)
    conj: [[(u8, i8); 24]; 3],
    zcomm: [bool; 24],
}

static TABLES: Lazy<Tables> = Lazy::new(Tables::build);

impl Tables {
    fn build() -> Self {
        use std::f64::consts::FRAC_1_SQRT_2 as ORT2;
        let o = C64::from(0.0);
        let l = C64::from(1.0);
        let i = C64::i();
        let h = Mat2::new(l, l, l, -l).map(|a| a * ORT2);
        let s = Mat2::new(l, o, o, i);
        let perms: [Mat2; 6] = [
            Mat2::identity(),
            s,
            h,
            h * s * h,
            h * s,
            s * h,
        ];
        let paulis = [Pauli::I, Pauli::X, Pauli::Y, Pauli::Z].map(Pauli::matrix);

        let mut matrix: [Mat2; 24] = [Mat2::identity(); 24];
        for (perm, sign) in iproduct!(0..6, 0..4) {
            matrix[sign + 4 * perm] = paulis[sign] * perms[perm];
        }

        let find = |m: &Mat2| -> u8 {
            matrix.iter()
                .position(|c| phase_between(c.as_slice(), m.as_slice()).is_some())
                .expect("local Clifford group is not closed") as u8
        };

        let mut mul = [[0_u8; 24]; 24];
        for (a, b) in iproduct!(0..24, 0..24) {
            mul[a][b] = find(&(matrix[a] * matrix[b]));
        }

        let mut adj = [0_u8; 24];
        for (a, adj_a) in adj.iter_mut().enumerate() {
            *adj_a = find(&matrix[a].adjoint());
        }

        let mut conj = [[(0_u8, 1_i8); 24]; 3];
        for (p, t) in iproduct!(1..4_usize, 0..24_usize) {
            let m = matrix[t] * paulis[p] * matrix[t].adjoint();
            conj[p - 1][t]
                = (1..4_usize)
                .find_map(|q| {
                    phase_between(m.as_slice(), paulis[q].as_slice())
                        .map(|lambda| (q as u8, lambda.re.signum() as i8))
                })
                .expect("Clifford conjugation left the Pauli group");
        }

        let mut zcomm = [false; 24];
        for (k, zk) in zcomm.iter_mut().enumerate() {
            *zk = matrix[k][(0, 1)].norm() < TABLE_EPS
                && matrix[k][(1, 0)].norm() < TABLE_EPS;
        }

        Self { matrix, mul, adj, conj, zcomm }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn proportional(a: &Mat2, b: &Mat2) -> bool {
        phase_between(a.as_slice(), b.as_slice()).is_some()
    }

    #[test]
    fn named_codes_match_matrices() {
        use std::f64::consts::FRAC_1_SQRT_2 as ORT2;
        let o = C64::from(0.0);
        let l = C64::from(1.0);
        let i = C64::i();
        let h = Mat2::new(l, l, l, -l).map(|a| a * ORT2);
        let s = Mat2::new(l, o, o, i);
        let sqrt_ix = Mat2::new(l, i, i, l).map(|a| a * ORT2);
        assert!(proportional(&LocalClifford::H.matrix(), &h));
        assert!(proportional(&LocalClifford::S.matrix(), &s));
        assert!(proportional(&LocalClifford::S_DAG.matrix(), &s.adjoint()));
        assert!(proportional(&LocalClifford::HS.matrix(), &(h * s)));
        assert!(proportional(&LocalClifford::SH.matrix(), &(s * h)));
        assert!(proportional(&LocalClifford::SQRT_IX.matrix(), &sqrt_ix));
    }

    #[test]
    fn all_elements_distinct() {
        for (a, b) in iproduct!(LocalClifford::all(), LocalClifford::all()) {
            if a != b {
                assert!(!proportional(&a.matrix(), &b.matrix()), "{} ~ {}", a, b);
            }
        }
    }

    #[test]
    fn group_identities() {
        use LocalClifford as C;
        assert_eq!(C::H * C::H, C::I);
        assert_eq!(C::S * C::S, C::Z);
        assert_eq!(C::X * C::Y, C::Z);
        assert_eq!(C::S * C::S_DAG, C::I);
        assert_eq!(C::SQRT_IX * C::SQRT_IX, C::X);
        for a in C::all() {
            assert_eq!(a * a.adjoint(), C::I);
            assert_eq!(a.adjoint() * a, C::I);
            assert_eq!(a * C::I, a);
            assert_eq!(C::I * a, a);
        }
    }

    #[test]
    fn mul_is_associative_and_not_commutative() {
        use LocalClifford as C;
        for (a, b, c) in iproduct!(C::all(), C::all(), [C::H, C::S, C::SH]) {
            assert_eq!((a * b) * c, a * (b * c));
        }
        assert_ne!(C::H * C::S, C::S * C::H);
        assert_eq!(C::H * C::S, C::HS);
        assert_eq!(C::S * C::H, C::SH);
    }

    #[test]
    fn mul_matches_matrix_product() {
        for (a, b) in iproduct!(LocalClifford::all(), LocalClifford::all()) {
            assert!(proportional(&(a * b).matrix(), &(a.matrix() * b.matrix())));
        }
    }

    #[test]
    fn conjugation() {
        use LocalClifford as C;
        let mut p = C::Z;
        assert_eq!(p.conjugate(C::H), Ok(1));
        assert_eq!(p, C::X);

        let mut p = C::Y;
        assert_eq!(p.conjugate(C::S), Ok(-1));
        assert_eq!(p, C::X);

        let mut p = C::X;
        assert_eq!(p.conjugate(C::S), Ok(1));
        assert_eq!(p, C::Y);

        let mut p = C::Z;
        assert_eq!(p.conjugate(C::X), Ok(-1));
        assert_eq!(p, C::Z);

        let mut h = C::H;
        assert!(h.conjugate(C::S).is_err());
        assert_eq!(h, C::H);
    }

    #[test]
    fn z_commuting_elements() {
        let diag: Vec<LocalClifford>
            = LocalClifford::all().filter(|c| c.is_z_commuting()).collect();
        assert_eq!(
            diag,
            vec![
                LocalClifford::I,
                LocalClifford::Z,
                LocalClifford::S,
                LocalClifford::S_DAG,
            ],
        );
    }

    #[test]
    fn names() {
        use LocalClifford as C;
        assert_eq!(C::I.to_string(), "I");
        assert_eq!(C::H.to_string(), "H");
        assert_eq!(C::HS.to_string(), "HS");
        assert_eq!(C::SH.name(), "SH");
        assert_eq!(C::S_DAG.name(), "ZB");
        assert_eq!(C::SQRT_IX.name(), "XD");
        assert_eq!(
            C::from_code(22).map(|c| (c.sign(), c.perm())),
            Some((Pauli::Y, 5)),
        );
        assert_eq!(C::from_code(24), None);
    }
}
