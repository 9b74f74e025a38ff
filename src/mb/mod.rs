//! Mathematical Routines - Matrix Operations (Chapter MB)
//!
//! Dense matrix primitives consumed by the model chapters: rank, determinant,
//! inverse, eigenvalues, companion matrices and the Faddeev-LeVerrier
//! expansion of the resolvent (sI - A)^-1.
//!
//! Rank, determinant, inverse and eigenvalues are delegated to LAPACK through
//! `ndarray-linalg` (DGESDD, DGETRF/DGETRI, DGEEV). The routines here only add
//! shape validation, quick returns for empty matrices and error mapping.

use ndarray::{Array1, Array2};
use ndarray_linalg::{Determinant, EigVals, Inverse, SVD};
use num_complex::Complex;
use tracing::trace;

use crate::error::{LtiError, LtiResult};

/// Default rank tolerance for a matrix with the given singular values.
///
/// Uses `sigma_max * max(rows, cols) * eps`, the usual threshold for
/// numerical rank determination.
pub fn default_rank_tolerance(singular_values: &Array1<f64>, rows: usize, cols: usize) -> f64 {
    let sigma_max = singular_values.iter().copied().fold(0.0_f64, f64::max);
    sigma_max * (rows.max(cols) as f64) * f64::EPSILON
}

/// Computes the numerical rank of a matrix by SVD.
///
/// # Arguments
///
/// * `m` - Any R×C matrix
/// * `tol` - Singular values at or below this value count as zero. If `None`,
///   uses [`default_rank_tolerance`].
///
/// # Returns
///
/// Number of singular values strictly greater than the tolerance.
///
/// # Examples
///
/// ```
/// use ndarray::arr2;
/// use lti_rs::mb::rank;
///
/// let m = arr2(&[[1.0, 2.0], [2.0, 4.0]]);
/// assert_eq!(rank(&m, None).unwrap(), 1);
/// ```
pub fn rank(m: &Array2<f64>, tol: Option<f64>) -> LtiResult<usize> {
    let (rows, cols) = m.dim();
    if rows == 0 || cols == 0 {
        return Ok(0);
    }

    let (_, singular_values, _) = m.svd(false, false)?;
    let tol = tol.unwrap_or_else(|| default_rank_tolerance(&singular_values, rows, cols));
    let r = singular_values.iter().filter(|&&s| s > tol).count();
    trace!(rows, cols, tol, rank = r, "numerical rank");
    Ok(r)
}

/// Determinant of a square matrix (LU factorization).
///
/// Returns `1.0` for the empty 0×0 matrix and `0.0` for an exactly singular one.
pub fn determinant(m: &Array2<f64>) -> LtiResult<f64> {
    ensure_square(m, "determinant")?;
    if m.nrows() == 0 {
        return Ok(1.0);
    }
    Ok(m.det()?)
}

/// Inverse of a square matrix.
///
/// Callers are expected to check the rank first; a singular input surfaces as
/// [`LtiError::Linalg`].
pub fn inverse(m: &Array2<f64>) -> LtiResult<Array2<f64>> {
    ensure_square(m, "inverse")?;
    if m.nrows() == 0 {
        return Ok(Array2::zeros((0, 0)));
    }
    Ok(m.inv()?)
}

/// Eigenvalues of a square matrix (LAPACK DGEEV).
pub fn eigenvalues(m: &Array2<f64>) -> LtiResult<Vec<Complex<f64>>> {
    ensure_square(m, "eigenvalues")?;
    if m.nrows() == 0 {
        return Ok(Vec::new());
    }
    let eigs = m.eigvals()?;
    Ok(eigs.to_vec())
}

/// Companion matrix of a monic polynomial.
///
/// For `coeffs = [1, a1, ..., an]` (highest degree first) builds
/// ```text
///     [ -a1 -a2 ... -an ]
///     [  1   0  ...  0  ]
///     [  0   1  ...  0  ]
///     [  :       .   :  ]
///     [  0  ...  1   0  ]
/// ```
/// whose characteristic polynomial is `s^n + a1 s^(n-1) + ... + an`. A
/// non-monic input is normalized by its leading coefficient.
pub fn companion(coeffs: &[f64]) -> Array2<f64> {
    let n = coeffs.len().saturating_sub(1);
    let mut c = Array2::zeros((n, n));
    if n == 0 {
        return c;
    }
    let lead = coeffs[0];
    for j in 0..n {
        c[(0, j)] = -coeffs[j + 1] / lead;
    }
    for i in 1..n {
        c[(i, i - 1)] = 1.0;
    }
    c
}

/// Output of the Faddeev-LeVerrier recursion for a square matrix A.
#[derive(Debug, Clone)]
pub struct ResolventExpansion {
    /// Characteristic polynomial det(sI - A), highest degree first, monic (length n+1).
    pub characteristic: Vec<f64>,
    /// Coefficient matrices of adj(sI - A) = sum_k adjugate[k] * s^(n-1-k).
    pub adjugate: Vec<Array2<f64>>,
}

/// Faddeev-LeVerrier expansion of (sI - A)^-1.
///
/// Produces the characteristic polynomial coefficients and the polynomial
/// coefficients of the adjugate of (sI - A) without any numeric inversion:
/// ```text
///     M_1 = I,                a_1 = -tr(A M_1) / 1
///     M_k = A M_(k-1) + a_(k-1) I,  a_k = -tr(A M_k) / k
///     adj(sI - A) = M_1 s^(n-1) + M_2 s^(n-2) + ... + M_n
/// ```
/// For integer matrices every step is exact in floating point as long as the
/// intermediate values stay representable.
///
/// # Examples
///
/// ```
/// use ndarray::arr2;
/// use lti_rs::mb::faddeev_leverrier;
///
/// let a = arr2(&[[0.0, 1.0], [-4.0, 5.0]]);
/// let exp = faddeev_leverrier(&a).unwrap();
/// assert_eq!(exp.characteristic, vec![1.0, -5.0, 4.0]);
/// ```
pub fn faddeev_leverrier(a: &Array2<f64>) -> LtiResult<ResolventExpansion> {
    ensure_square(a, "characteristic polynomial")?;
    let n = a.nrows();

    let mut characteristic = Vec::with_capacity(n + 1);
    characteristic.push(1.0);
    let mut adjugate = Vec::with_capacity(n);

    let eye = Array2::<f64>::eye(n);
    let mut m = Array2::<f64>::zeros((n, n));
    for k in 1..=n {
        m = a.dot(&m) + &eye * characteristic[k - 1];
        let am = a.dot(&m);
        let coeff = -am.diag().sum() / k as f64;
        adjugate.push(m.clone());
        characteristic.push(coeff);
    }

    trace!(?characteristic, "Faddeev-LeVerrier characteristic polynomial");
    Ok(ResolventExpansion {
        characteristic,
        adjugate,
    })
}

/// Characteristic polynomial det(sI - A), highest degree first.
pub fn characteristic_polynomial(a: &Array2<f64>) -> LtiResult<Vec<f64>> {
    Ok(faddeev_leverrier(a)?.characteristic)
}

fn ensure_square(m: &Array2<f64>, what: &str) -> LtiResult<()> {
    if m.nrows() != m.ncols() {
        return Err(LtiError::DimensionMismatch(format!(
            "{} requires a square matrix, got {}×{}",
            what,
            m.nrows(),
            m.ncols()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::arr2;

    #[test]
    fn test_rank_full_and_deficient() {
        let full = arr2(&[[0.0, 1.0], [1.0, 5.0]]);
        assert_eq!(rank(&full, None).unwrap(), 2);

        let deficient = arr2(&[[1.0, 1.0], [0.0, 0.0]]);
        assert_eq!(rank(&deficient, None).unwrap(), 1);
    }

    #[test]
    fn test_rank_rectangular() {
        let m = arr2(&[[1.0, 0.0, 2.0], [0.0, 1.0, 3.0]]);
        assert_eq!(rank(&m, None).unwrap(), 2);
    }

    #[test]
    fn test_rank_empty() {
        let m = Array2::<f64>::zeros((0, 3));
        assert_eq!(rank(&m, None).unwrap(), 0);
    }

    #[test]
    fn test_rank_explicit_tolerance() {
        let m = arr2(&[[1.0, 0.0], [0.0, 1e-6]]);
        assert_eq!(rank(&m, None).unwrap(), 2);
        assert_eq!(rank(&m, Some(1e-3)).unwrap(), 1);
    }

    #[test]
    fn test_determinant() {
        let m = arr2(&[[0.0, 1.0], [1.0, 5.0]]);
        assert_abs_diff_eq!(determinant(&m).unwrap(), -1.0, epsilon = 1e-12);

        let singular = arr2(&[[1.0, 2.0], [2.0, 4.0]]);
        assert_abs_diff_eq!(determinant(&singular).unwrap(), 0.0, epsilon = 1e-12);

        assert_eq!(determinant(&Array2::zeros((0, 0))).unwrap(), 1.0);
    }

    #[test]
    fn test_determinant_not_square() {
        let m = Array2::<f64>::zeros((2, 3));
        let result = determinant(&m);
        assert!(matches!(result, Err(LtiError::DimensionMismatch(_))));
    }

    #[test]
    fn test_inverse() {
        let m = arr2(&[[4.0, 7.0], [2.0, 6.0]]);
        let inv = inverse(&m).unwrap();
        let prod = m.dot(&inv);
        for i in 0..2 {
            for j in 0..2 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_abs_diff_eq!(prod[(i, j)], expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_eigenvalues_real() {
        let m = arr2(&[[0.0, 1.0], [-4.0, 5.0]]);
        let mut eigs: Vec<f64> = eigenvalues(&m).unwrap().iter().map(|z| z.re).collect();
        eigs.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_abs_diff_eq!(eigs[0], 1.0, epsilon = 1e-10);
        assert_abs_diff_eq!(eigs[1], 4.0, epsilon = 1e-10);
    }

    #[test]
    fn test_companion_characteristic() {
        // s^3 + 2s^2 + 3s + 4
        let c = companion(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(c.row(0).to_vec(), vec![-2.0, -3.0, -4.0]);
        assert_eq!(c[(1, 0)], 1.0);
        assert_eq!(c[(2, 1)], 1.0);
        assert_eq!(
            characteristic_polynomial(&c).unwrap(),
            vec![1.0, 2.0, 3.0, 4.0]
        );
    }

    #[test]
    fn test_companion_normalizes_leading_coefficient() {
        let c = companion(&[2.0, 4.0, 6.0]);
        assert_eq!(c.row(0).to_vec(), vec![-2.0, -3.0]);
    }

    #[test]
    fn test_faddeev_leverrier_three_state() {
        let a = arr2(&[[1.0, 2.0, 3.0], [3.0, 2.0, 1.0], [4.0, 5.0, 0.0]]);
        let exp = faddeev_leverrier(&a).unwrap();
        assert_eq!(exp.characteristic, vec![1.0, -3.0, -21.0, -24.0]);
        assert_eq!(exp.adjugate.len(), 3);
        assert_eq!(exp.adjugate[0], Array2::<f64>::eye(3));
    }

    #[test]
    fn test_faddeev_leverrier_adjugate_identity() {
        // (sI - A) adj(sI - A) = det(sI - A) I, checked at s = 2
        let a = arr2(&[[1.0, 1.0, 2.0], [2.0, 1.0, 1.0], [3.0, 4.0, 5.0]]);
        let exp = faddeev_leverrier(&a).unwrap();
        let s = 2.0;
        let n = 3;

        let mut adj = Array2::<f64>::zeros((n, n));
        for m in &exp.adjugate {
            adj = adj * s + m;
        }
        let det = exp.characteristic.iter().fold(0.0, |acc, &c| acc * s + c);
        let lhs = (Array2::<f64>::eye(n) * s - &a).dot(&adj);
        for i in 0..n {
            for j in 0..n {
                let expected = if i == j { det } else { 0.0 };
                assert_abs_diff_eq!(lhs[(i, j)], expected, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_faddeev_leverrier_empty() {
        let exp = faddeev_leverrier(&Array2::zeros((0, 0))).unwrap();
        assert_eq!(exp.characteristic, vec![1.0]);
        assert!(exp.adjugate.is_empty());
    }
}
