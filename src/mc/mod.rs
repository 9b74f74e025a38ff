//! Mathematical Routines - Polynomials (Chapter MC)
//!
//! Real univariate polynomials used as numerators and denominators of
//! transfer functions: coefficient algebra, evaluation, root finding and the
//! Routh stability test.
//!
//! Coefficients are stored **highest degree first**:
//! ```text
//! P(s) = c[0]*s^n + c[1]*s^(n-1) + ... + c[n]
//! ```

use std::ops::{Add, Mul, Neg, Sub};

use num_complex::Complex;

use crate::error::{LtiError, LtiResult};
use crate::mb;

/// A real polynomial with coefficients in decreasing powers.
///
/// Leading exact zeros are stripped at construction, so the leading
/// coefficient is nonzero unless the polynomial is the zero polynomial, which
/// is stored as `[0.0]` with degree 0. Instances are immutable; all
/// arithmetic returns new values.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "PolynomialRepr"))]
pub struct Polynomial {
    coeffs: Vec<f64>,
}

/// Wire form of [`Polynomial`], normalized through [`Polynomial::new`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct PolynomialRepr {
    coeffs: Vec<f64>,
}

#[cfg(feature = "serde")]
impl TryFrom<PolynomialRepr> for Polynomial {
    type Error = LtiError;

    fn try_from(repr: PolynomialRepr) -> LtiResult<Self> {
        if repr.coeffs.is_empty() {
            return Err(LtiError::DegenerateModel(
                "polynomial needs at least one coefficient".to_string(),
            ));
        }
        if repr.coeffs.iter().any(|c| !c.is_finite()) {
            return Err(LtiError::DegenerateModel(
                "polynomial coefficients must be finite".to_string(),
            ));
        }
        Ok(Polynomial::new(repr.coeffs))
    }
}

impl Polynomial {
    /// Builds a polynomial from coefficients in decreasing powers.
    ///
    /// # Examples
    ///
    /// ```
    /// use lti_rs::mc::Polynomial;
    ///
    /// let p = Polynomial::new(vec![0.0, 1.0, 5.0, 8.0, 4.0]);
    /// assert_eq!(p.degree(), 3);
    /// assert_eq!(p.coefficients(), &[1.0, 5.0, 8.0, 4.0]);
    /// ```
    pub fn new(coeffs: Vec<f64>) -> Self {
        let first = coeffs.iter().position(|&c| c != 0.0);
        match first {
            Some(i) => Polynomial {
                coeffs: coeffs[i..].to_vec(),
            },
            None => Polynomial::zero(),
        }
    }

    /// Builds a polynomial from a coefficient slice in decreasing powers.
    pub fn from_coefficients(coeffs: &[f64]) -> Self {
        Polynomial::new(coeffs.to_vec())
    }

    /// The zero polynomial.
    pub fn zero() -> Self {
        Polynomial { coeffs: vec![0.0] }
    }

    /// The constant polynomial 1.
    pub fn one() -> Self {
        Polynomial { coeffs: vec![1.0] }
    }

    /// A constant polynomial.
    pub fn constant(c: f64) -> Self {
        Polynomial::new(vec![c])
    }

    /// The monomial `c * s^k`.
    pub fn monomial(c: f64, k: usize) -> Self {
        let mut coeffs = vec![0.0; k + 1];
        coeffs[0] = c;
        Polynomial::new(coeffs)
    }

    /// Builds the real polynomial prod(s - r) from its roots.
    ///
    /// Complex roots are expected in conjugate pairs; the imaginary residue
    /// of the expanded product is discarded.
    pub fn from_roots(roots: &[Complex<f64>]) -> Self {
        let mut acc = vec![Complex::new(1.0, 0.0)];
        for &r in roots {
            let mut next = vec![Complex::new(0.0, 0.0); acc.len() + 1];
            for (i, &c) in acc.iter().enumerate() {
                next[i] += c;
                next[i + 1] -= c * r;
            }
            acc = next;
        }
        Polynomial::new(acc.iter().map(|c| c.re).collect())
    }

    /// Builds prod(s - r) from real roots.
    pub fn from_real_roots(roots: &[f64]) -> Self {
        let roots: Vec<Complex<f64>> = roots.iter().map(|&r| Complex::new(r, 0.0)).collect();
        Polynomial::from_roots(&roots)
    }

    /// Coefficients in decreasing powers.
    pub fn coefficients(&self) -> &[f64] {
        &self.coeffs
    }

    /// Degree (0 for constants and for the zero polynomial).
    pub fn degree(&self) -> usize {
        self.coeffs.len() - 1
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.len() == 1 && self.coeffs[0] == 0.0
    }

    pub fn leading_coefficient(&self) -> f64 {
        self.coeffs[0]
    }

    /// Multiplies every coefficient by `k`.
    pub fn scale(&self, k: f64) -> Self {
        Polynomial::new(self.coeffs.iter().map(|c| c * k).collect())
    }

    /// Divides by the leading coefficient. The zero polynomial is returned unchanged.
    pub fn monic(&self) -> Self {
        if self.is_zero() {
            return self.clone();
        }
        self.scale(1.0 / self.leading_coefficient())
    }

    /// Raises the polynomial to a non-negative integer power; `p^0 = 1`.
    pub fn pow(&self, k: u32) -> Self {
        (0..k).fold(Polynomial::one(), |acc, _| &acc * self)
    }

    /// Evaluates the polynomial at a real point (Horner).
    pub fn eval(&self, x: f64) -> f64 {
        self.coeffs.iter().fold(0.0, |acc, &c| acc * x + c)
    }

    /// Evaluates the polynomial at a complex point (Horner).
    pub fn eval_complex(&self, z: Complex<f64>) -> Complex<f64> {
        self.coeffs
            .iter()
            .fold(Complex::new(0.0, 0.0), |acc, &c| acc * z + c)
    }

    /// Roots of the polynomial.
    ///
    /// Zeros at the origin are split off exactly; a first-order remainder is
    /// solved in closed form and higher orders go through the eigenvalues of
    /// the companion matrix (LAPACK DGEEV).
    ///
    /// # Errors
    ///
    /// [`LtiError::DegenerateModel`] for the zero polynomial, whose roots are
    /// not defined.
    ///
    /// # Examples
    ///
    /// ```
    /// use lti_rs::mc::Polynomial;
    ///
    /// let p = Polynomial::from_coefficients(&[1.0, 3.0, 2.0]);
    /// let mut roots: Vec<f64> = p.roots().unwrap().iter().map(|r| r.re).collect();
    /// roots.sort_by(|a, b| a.partial_cmp(b).unwrap());
    /// assert!((roots[0] + 2.0).abs() < 1e-12);
    /// assert!((roots[1] + 1.0).abs() < 1e-12);
    /// ```
    pub fn roots(&self) -> LtiResult<Vec<Complex<f64>>> {
        if self.is_zero() {
            return Err(LtiError::DegenerateModel(
                "roots of the zero polynomial are undefined".to_string(),
            ));
        }

        let trailing = self.coeffs.iter().rev().take_while(|&&c| c == 0.0).count();
        let reduced = &self.coeffs[..self.coeffs.len() - trailing];
        let mut roots = vec![Complex::new(0.0, 0.0); trailing];

        match reduced.len() {
            0 | 1 => {}
            2 => roots.push(Complex::new(-reduced[1] / reduced[0], 0.0)),
            _ => roots.extend(mb::eigenvalues(&mb::companion(reduced))?),
        }
        Ok(roots)
    }

    /// Number of roots in the closed right half-plane by the Routh criterion.
    ///
    /// Builds the Routh array from the coefficients and counts sign changes
    /// in its first column.
    ///
    /// # Errors
    ///
    /// * [`LtiError::DegenerateModel`] for the zero polynomial
    /// * [`LtiError::InconclusiveStability`] if a first-column pivot is zero
    ///   (roots on or symmetric about the imaginary axis)
    pub fn routh_unstable_count(&self) -> LtiResult<usize> {
        if self.is_zero() {
            return Err(LtiError::DegenerateModel(
                "stability of the zero polynomial is undefined".to_string(),
            ));
        }
        let n = self.degree();
        if n == 0 {
            return Ok(0);
        }

        let width = n / 2 + 1;
        let mut prev: Vec<f64> = (0..width)
            .map(|j| self.coeffs.get(2 * j).copied().unwrap_or(0.0))
            .collect();
        let mut curr: Vec<f64> = (0..width)
            .map(|j| self.coeffs.get(2 * j + 1).copied().unwrap_or(0.0))
            .collect();

        let mut first_column = vec![prev[0]];
        for _ in 0..n {
            if curr[0] == 0.0 {
                return Err(LtiError::InconclusiveStability);
            }
            first_column.push(curr[0]);

            let next: Vec<f64> = (0..width)
                .map(|j| {
                    let a = prev.get(j + 1).copied().unwrap_or(0.0);
                    let b = curr.get(j + 1).copied().unwrap_or(0.0);
                    (curr[0] * a - prev[0] * b) / curr[0]
                })
                .collect();
            prev = curr;
            curr = next;
        }

        Ok(first_column
            .windows(2)
            .filter(|w| w[0].signum() != w[1].signum())
            .count())
    }

    /// True if every root lies in the open left half-plane.
    pub fn is_hurwitz(&self) -> LtiResult<bool> {
        Ok(self.routh_unstable_count()? == 0)
    }

    /// Coefficient-wise comparison after aligning degrees.
    ///
    /// Two polynomials are equal if every coefficient difference is at most
    /// `tol * max(1, largest coefficient magnitude)`.
    pub fn approx_eq(&self, other: &Polynomial, tol: f64) -> bool {
        let len = self.coeffs.len().max(other.coeffs.len());
        let a = self.padded(len);
        let b = other.padded(len);
        let scale = a
            .iter()
            .chain(b.iter())
            .fold(1.0_f64, |m, c| m.max(c.abs()));
        a.iter()
            .zip(b.iter())
            .all(|(x, y)| (x - y).abs() <= tol * scale)
    }

    /// Coefficients left-padded with zeros to length `len`.
    pub(crate) fn padded(&self, len: usize) -> Vec<f64> {
        let mut out = vec![0.0; len.saturating_sub(self.coeffs.len())];
        out.extend_from_slice(&self.coeffs);
        out
    }

    fn zip_with(&self, other: &Polynomial, f: impl Fn(f64, f64) -> f64) -> Polynomial {
        let len = self.coeffs.len().max(other.coeffs.len());
        let a = self.padded(len);
        let b = other.padded(len);
        Polynomial::new(a.iter().zip(b.iter()).map(|(&x, &y)| f(x, y)).collect())
    }
}

impl From<Vec<f64>> for Polynomial {
    fn from(coeffs: Vec<f64>) -> Self {
        Polynomial::new(coeffs)
    }
}

impl Add for &Polynomial {
    type Output = Polynomial;

    fn add(self, rhs: &Polynomial) -> Polynomial {
        self.zip_with(rhs, |x, y| x + y)
    }
}

impl Sub for &Polynomial {
    type Output = Polynomial;

    fn sub(self, rhs: &Polynomial) -> Polynomial {
        self.zip_with(rhs, |x, y| x - y)
    }
}

/// Polynomial product by convolution of the coefficient sequences.
impl Mul for &Polynomial {
    type Output = Polynomial;

    fn mul(self, rhs: &Polynomial) -> Polynomial {
        let mut out = vec![0.0; self.coeffs.len() + rhs.coeffs.len() - 1];
        for (i, &a) in self.coeffs.iter().enumerate() {
            for (j, &b) in rhs.coeffs.iter().enumerate() {
                out[i + j] += a * b;
            }
        }
        Polynomial::new(out)
    }
}

impl Neg for &Polynomial {
    type Output = Polynomial;

    fn neg(self) -> Polynomial {
        self.scale(-1.0)
    }
}

impl Add for Polynomial {
    type Output = Polynomial;

    fn add(self, rhs: Polynomial) -> Polynomial {
        &self + &rhs
    }
}

impl Sub for Polynomial {
    type Output = Polynomial;

    fn sub(self, rhs: Polynomial) -> Polynomial {
        &self - &rhs
    }
}

impl Mul for Polynomial {
    type Output = Polynomial;

    fn mul(self, rhs: Polynomial) -> Polynomial {
        &self * &rhs
    }
}

impl Neg for Polynomial {
    type Output = Polynomial;

    fn neg(self) -> Polynomial {
        -&self
    }
}
