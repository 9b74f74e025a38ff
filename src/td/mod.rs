//! Transfer-Function Models (Chapter TD)
//!
//! Single-input single-output rational models G(s) = num(s) / den(s) and the
//! block-diagram algebra over them: series, parallel, power and feedback.
//!
//! Composition never cancels common factors. The product of
//! `1/(s+1)` and `(s+1)/(s+2)` keeps the `(s+1)` factor in both numerator
//! and denominator, so pole sets compose as multiset unions.

use std::ops::{Add, Mul, Neg};

use num_complex::Complex;

use crate::error::{LtiError, LtiResult};
use crate::mc::Polynomial;

/// Sign of the loop closure in [`TransferFunction::feedback`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FeedbackSign {
    /// u = r - H y, closed loop G / (1 + G H)
    #[default]
    Negative,
    /// u = r + H y, closed loop G / (1 - G H)
    Positive,
}

impl FeedbackSign {
    /// Gain applied to the returned signal: -1 for negative feedback, +1 for positive.
    pub fn loop_gain(self) -> f64 {
        match self {
            FeedbackSign::Negative => -1.0,
            FeedbackSign::Positive => 1.0,
        }
    }
}

/// A SISO transfer function num(s)/den(s).
///
/// The denominator is never the zero polynomial. Improper models (numerator
/// degree above denominator degree) are representable; only realization as a
/// state-space model rejects them.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "TransferFunctionRepr"))]
pub struct TransferFunction {
    num: Polynomial,
    den: Polynomial,
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct TransferFunctionRepr {
    num: Polynomial,
    den: Polynomial,
}

#[cfg(feature = "serde")]
impl TryFrom<TransferFunctionRepr> for TransferFunction {
    type Error = LtiError;

    fn try_from(repr: TransferFunctionRepr) -> LtiResult<Self> {
        TransferFunction::new(repr.num, repr.den)
    }
}

impl TransferFunction {
    /// Builds a transfer function from numerator and denominator polynomials.
    ///
    /// # Errors
    ///
    /// [`LtiError::DegenerateModel`] if `den` is the zero polynomial.
    pub fn new(num: Polynomial, den: Polynomial) -> LtiResult<Self> {
        if den.is_zero() {
            return Err(LtiError::DegenerateModel(
                "transfer function denominator is the zero polynomial".to_string(),
            ));
        }
        Ok(TransferFunction { num, den })
    }

    /// Builds a transfer function from coefficient slices (decreasing powers).
    ///
    /// # Examples
    ///
    /// ```
    /// use lti_rs::td::TransferFunction;
    ///
    /// // (s + 3) / (s^3 + 5s^2 + 8s + 4)
    /// let p = TransferFunction::from_coefficients(&[1.0, 3.0], &[1.0, 5.0, 8.0, 4.0]).unwrap();
    /// assert_eq!(p.den().degree(), 3);
    /// assert!(TransferFunction::from_coefficients(&[1.0], &[0.0, 0.0]).is_err());
    /// ```
    pub fn from_coefficients(num: &[f64], den: &[f64]) -> LtiResult<Self> {
        TransferFunction::new(
            Polynomial::from_coefficients(num),
            Polynomial::from_coefficients(den),
        )
    }

    /// The identity system, num = den = 1.
    pub fn unity() -> Self {
        TransferFunction {
            num: Polynomial::one(),
            den: Polynomial::one(),
        }
    }

    /// A static gain k/1.
    pub fn gain(k: f64) -> Self {
        TransferFunction {
            num: Polynomial::constant(k),
            den: Polynomial::one(),
        }
    }

    pub fn num(&self) -> &Polynomial {
        &self.num
    }

    pub fn den(&self) -> &Polynomial {
        &self.den
    }

    /// Numerator and denominator coefficient vectors, as `tfdata` would return them.
    pub fn tfdata(&self) -> (Vec<f64>, Vec<f64>) {
        (
            self.num.coefficients().to_vec(),
            self.den.coefficients().to_vec(),
        )
    }

    /// Product of two transfer functions, num1*num2 / den1*den2.
    pub fn multiply(&self, other: &TransferFunction) -> TransferFunction {
        TransferFunction {
            num: &self.num * &other.num,
            den: &self.den * &other.den,
        }
    }

    /// Cascade `self` then `other`; identical to [`TransferFunction::multiply`].
    pub fn series(&self, other: &TransferFunction) -> TransferFunction {
        self.multiply(other)
    }

    /// Sum of two transfer functions (parallel connection).
    ///
    /// num = num1*den2 + num2*den1, den = den1*den2.
    pub fn parallel(&self, other: &TransferFunction) -> TransferFunction {
        TransferFunction {
            num: &(&self.num * &other.den) + &(&other.num * &self.den),
            den: &self.den * &other.den,
        }
    }

    /// Repeated product; `power(0)` is [`TransferFunction::unity`].
    pub fn power(&self, k: u32) -> TransferFunction {
        TransferFunction {
            num: self.num.pow(k),
            den: self.den.pow(k),
        }
    }

    /// Closes a loop around `self` with `sensor` in the return path.
    ///
    /// ```text
    ///     num = G.num * H.den
    ///     den = G.den * H.den + G.num * H.num     (negative feedback)
    ///     den = G.den * H.den - G.num * H.num     (positive feedback)
    /// ```
    ///
    /// # Errors
    ///
    /// [`LtiError::DegenerateModel`] if the closed-loop denominator cancels
    /// to the zero polynomial (e.g. positive unity feedback around a unit gain).
    ///
    /// # Examples
    ///
    /// ```
    /// use lti_rs::td::{FeedbackSign, TransferFunction};
    ///
    /// let s1 = TransferFunction::from_coefficients(&[1.0], &[1.0, 1.0]).unwrap();
    /// let s2 = TransferFunction::from_coefficients(&[1.0], &[1.0, 2.0]).unwrap();
    /// let closed = s1.feedback(&s2, FeedbackSign::Negative).unwrap();
    /// assert_eq!(closed.num().coefficients(), &[1.0, 2.0]);
    /// assert_eq!(closed.den().coefficients(), &[1.0, 3.0, 3.0]);
    /// ```
    pub fn feedback(
        &self,
        sensor: &TransferFunction,
        sign: FeedbackSign,
    ) -> LtiResult<TransferFunction> {
        let open_den = &self.den * &sensor.den;
        let loop_num = &self.num * &sensor.num;
        let den = match sign {
            FeedbackSign::Negative => &open_den + &loop_num,
            FeedbackSign::Positive => &open_den - &loop_num,
        };
        TransferFunction::new(&self.num * &sensor.den, den)
    }

    /// Unity negative feedback, G / (1 + G).
    pub fn unity_feedback(&self) -> LtiResult<TransferFunction> {
        self.feedback(&TransferFunction::unity(), FeedbackSign::Negative)
    }

    pub fn negate(&self) -> TransferFunction {
        TransferFunction {
            num: -&self.num,
            den: self.den.clone(),
        }
    }

    /// Roots of the denominator.
    pub fn poles(&self) -> LtiResult<Vec<Complex<f64>>> {
        self.den.roots()
    }

    /// Roots of the numerator. A zero numerator has no finite zeros to report.
    pub fn zeros(&self) -> LtiResult<Vec<Complex<f64>>> {
        if self.num.is_zero() {
            return Ok(Vec::new());
        }
        self.num.roots()
    }

    /// deg(den) - deg(num), negative for improper models.
    pub fn relative_degree(&self) -> isize {
        self.den.degree() as isize - self.num.degree() as isize
    }

    pub fn is_proper(&self) -> bool {
        self.num.degree() <= self.den.degree()
    }

    pub fn is_strictly_proper(&self) -> bool {
        self.num.is_zero() || self.num.degree() < self.den.degree()
    }

    /// Evaluates G at a complex frequency.
    pub fn eval(&self, s: Complex<f64>) -> Complex<f64> {
        self.num.eval_complex(s) / self.den.eval_complex(s)
    }

    /// G(0). Infinite or NaN when the model has a pole at the origin.
    pub fn dc_gain(&self) -> f64 {
        self.num.eval(0.0) / self.den.eval(0.0)
    }

    /// Same model with a monic denominator.
    pub fn normalized(&self) -> TransferFunction {
        let lead = self.den.leading_coefficient();
        TransferFunction {
            num: self.num.scale(1.0 / lead),
            den: self.den.scale(1.0 / lead),
        }
    }

    /// Equality as rational functions.
    ///
    /// Compares `num1 * den2` with `num2 * den1`, so models that differ by a
    /// common factor or by scaling are equivalent.
    pub fn is_equivalent(&self, other: &TransferFunction, tol: f64) -> bool {
        let a = self.normalized();
        let b = other.normalized();
        let lhs = &a.num * &b.den;
        let rhs = &b.num * &a.den;
        lhs.approx_eq(&rhs, tol)
    }
}

impl Mul for &TransferFunction {
    type Output = TransferFunction;

    fn mul(self, rhs: &TransferFunction) -> TransferFunction {
        self.multiply(rhs)
    }
}

impl Add for &TransferFunction {
    type Output = TransferFunction;

    fn add(self, rhs: &TransferFunction) -> TransferFunction {
        self.parallel(rhs)
    }
}

impl Neg for &TransferFunction {
    type Output = TransferFunction;

    fn neg(self) -> TransferFunction {
        self.negate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn tf(num: &[f64], den: &[f64]) -> TransferFunction {
        TransferFunction::from_coefficients(num, den).unwrap()
    }

    fn sorted_real(roots: &[Complex<f64>]) -> Vec<f64> {
        let mut re: Vec<f64> = roots.iter().map(|r| r.re).collect();
        re.sort_by(|a, b| a.partial_cmp(b).unwrap());
        re
    }

    #[test]
    fn test_zero_denominator_rejected() {
        let result = TransferFunction::from_coefficients(&[1.0], &[0.0]);
        assert!(matches!(result, Err(LtiError::DegenerateModel(_))));
    }

    #[test]
    fn test_improper_allowed() {
        let p = tf(&[1.0, 0.0, 1.0], &[1.0, 1.0]);
        assert!(!p.is_proper());
        assert_eq!(p.relative_degree(), -1);
    }

    #[test]
    fn test_product_matches_expanded_form() {
        // (s + 3) * 1/(s + 1) * (1/(s + 2))^2 = (s + 3)/(s^3 + 5s^2 + 8s + 4)
        let p1 = tf(&[1.0, 3.0], &[1.0]);
        let p2 = tf(&[1.0], &[1.0, 1.0]);
        let p3 = tf(&[1.0], &[1.0, 2.0]);
        let p = p1.multiply(&p2).multiply(&p3.power(2));

        assert_eq!(p.num().coefficients(), &[1.0, 3.0]);
        assert_eq!(p.den().coefficients(), &[1.0, 5.0, 8.0, 4.0]);
        assert_eq!(p, &(&p1 * &p2) * &p3.power(2));
    }

    #[test]
    fn test_power_zero_is_unity() {
        let p = tf(&[2.0, 1.0], &[1.0, 4.0, 3.0]);
        assert_eq!(p.power(0), TransferFunction::unity());
        assert_eq!(p.power(1), p);
    }

    #[test]
    fn test_no_cancellation() {
        let p = tf(&[1.0], &[1.0, 1.0]);
        let q = tf(&[1.0, 1.0], &[1.0, 2.0]);
        let pq = p.series(&q);
        assert_eq!(pq.num().coefficients(), &[1.0, 1.0]);
        assert_eq!(pq.den().coefficients(), &[1.0, 3.0, 2.0]);
    }

    #[test]
    fn test_parallel() {
        // 1/(s+1) + 1/(s+2) = (2s + 3)/(s^2 + 3s + 2)
        let p = tf(&[1.0], &[1.0, 1.0]);
        let q = tf(&[1.0], &[1.0, 2.0]);
        let sum = p.parallel(&q);
        assert_eq!(sum.num().coefficients(), &[2.0, 3.0]);
        assert_eq!(sum.den().coefficients(), &[1.0, 3.0, 2.0]);
        assert_eq!(sum, &p + &q);
    }

    #[test]
    fn test_feedback_negative_default() {
        let s1 = tf(&[1.0], &[1.0, 1.0]);
        let s2 = tf(&[1.0], &[1.0, 2.0]);
        let closed = s1.feedback(&s2, FeedbackSign::default()).unwrap();
        assert_eq!(closed.num().coefficients(), &[1.0, 2.0]);
        assert_eq!(closed.den().coefficients(), &[1.0, 3.0, 3.0]);
    }

    #[test]
    fn test_feedback_positive() {
        let s1 = tf(&[1.0], &[1.0, 1.0]);
        let s2 = tf(&[1.0], &[1.0, 2.0]);
        let closed = s1.feedback(&s2, FeedbackSign::Positive).unwrap();
        assert_eq!(closed.num().coefficients(), &[1.0, 2.0]);
        assert_eq!(closed.den().coefficients(), &[1.0, 3.0, 1.0]);
    }

    #[test]
    fn test_feedback_degenerate_loop() {
        let k = TransferFunction::gain(1.0);
        let result = k.feedback(&TransferFunction::unity(), FeedbackSign::Positive);
        assert!(matches!(result, Err(LtiError::DegenerateModel(_))));
    }

    #[test]
    fn test_block_diagram() {
        // feedback(series(feedback(S1, S2), S3), S4)
        let s1 = tf(&[1.0], &[1.0, 1.0]);
        let s2 = tf(&[1.0], &[1.0, 2.0]);
        let s3 = tf(&[3.0, 1.0], &[1.0, 0.0]);
        let s4 = tf(&[2.0, 0.0], &[1.0]);

        let s12 = s1.feedback(&s2, FeedbackSign::Negative).unwrap();
        let s123 = s12.series(&s3);
        let s = s123.feedback(&s4, FeedbackSign::Negative).unwrap();

        assert_eq!(s.num().coefficients(), &[3.0, 7.0, 2.0]);
        assert_eq!(s.den().coefficients(), &[7.0, 17.0, 7.0, 0.0]);
    }

    #[test]
    fn test_unity_feedback() {
        let g = tf(&[1.0], &[1.0, 0.0]);
        let closed = g.unity_feedback().unwrap();
        assert_eq!(closed.den().coefficients(), &[1.0, 1.0]);
    }

    #[test]
    fn test_poles_and_zeros() {
        let p = tf(&[1.0, 3.0], &[1.0, 5.0, 8.0, 4.0]);
        let zeros = p.zeros().unwrap();
        assert_eq!(zeros.len(), 1);
        assert_abs_diff_eq!(zeros[0].re, -3.0, epsilon = 1e-12);

        let poles = sorted_real(&p.poles().unwrap());
        assert_abs_diff_eq!(poles[0], -2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(poles[1], -2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(poles[2], -1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_numerator_has_no_zeros() {
        let p = tf(&[0.0], &[1.0, 1.0]);
        assert!(p.zeros().unwrap().is_empty());
        assert!(p.is_strictly_proper());
    }

    #[test]
    fn test_eval_and_dc_gain() {
        let p = tf(&[1.0, 3.0], &[1.0, 5.0, 8.0, 4.0]);
        assert_abs_diff_eq!(p.dc_gain(), 0.75, epsilon = 1e-15);
        let g = p.eval(Complex::new(0.0, 0.0));
        assert_abs_diff_eq!(g.re, 0.75, epsilon = 1e-15);

        let integrator = tf(&[1.0], &[1.0, 0.0]);
        assert!(integrator.dc_gain().is_infinite());
    }

    #[test]
    fn test_normalized() {
        let p = tf(&[2.0], &[2.0, 4.0]);
        let n = p.normalized();
        assert_eq!(n.num().coefficients(), &[1.0]);
        assert_eq!(n.den().coefficients(), &[1.0, 2.0]);
    }

    #[test]
    fn test_is_equivalent_with_common_factor() {
        let p = tf(&[1.0], &[1.0, 1.0]);
        let q = tf(&[2.0, 4.0], &[2.0, 6.0, 4.0]);
        assert!(p.is_equivalent(&q, 1e-12));
        assert!(!p.is_equivalent(&tf(&[1.0], &[1.0, 2.0]), 1e-12));
    }

    #[test]
    fn test_negate() {
        let p = tf(&[1.0], &[1.0, 1.0]);
        assert_eq!((-&p).num().coefficients(), &[-1.0]);
        assert_eq!(p.negate().den(), p.den());
    }

    #[test]
    fn test_tfdata() {
        let p = tf(&[1.0, 3.0], &[1.0, 2.0]);
        let (num, den) = p.tfdata();
        assert_eq!(num, vec![1.0, 3.0]);
        assert_eq!(den, vec![1.0, 2.0]);
    }
}
