//! Transformation Routines (Chapter TB)
//!
//! Conversions between transfer-function and state-space representations and
//! similarity transformations of state-space systems to canonical forms.
//!
//! The two conversion directions are deliberately asymmetric. A transfer
//! function has infinitely many state-space realizations; the one produced
//! by [`transfer_to_state_space`] is a convenient companion construction, not
//! a canonical one. A state-space model has exactly one transfer function,
//! obtained by [`state_space_to_transfer`]. Canonical realizations are only
//! produced on request, through [`to_reachable_canonical`] and
//! [`to_observable_canonical`].

use ndarray::{Array1, Array2};
use tracing::{debug, trace};

use crate::ab::{self, StateSpace};
use crate::error::{LtiError, LtiResult};
use crate::mb::{self, ResolventExpansion};
use crate::mc::Polynomial;
use crate::td::TransferFunction;

/// Target structure for [`canonical_form`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanonicalForm {
    /// Reachable (controller) canonical form, companion A with B = e1.
    Reachable,
    /// Observable canonical form, transposed companion A with C = e1'.
    Observable,
}

/// A canonical realization together with its state transformation.
///
/// With z the canonical state and x the original one, `z = T x` and
/// ```text
///     A' = T A T^-1,  B' = T B,  C' = C T^-1,  D' = D
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRealization {
    /// The system in canonical coordinates.
    pub system: StateSpace,
    /// The transformation T.
    pub transform: Array2<f64>,
}

impl CanonicalRealization {
    /// Maps a canonical state back to original coordinates, x = T^-1 z.
    pub fn original_state(&self, z: &Array1<f64>) -> LtiResult<Array1<f64>> {
        if z.len() != self.transform.nrows() {
            return Err(LtiError::DimensionMismatch(format!(
                "state vector length ({}) must match system order ({})",
                z.len(),
                self.transform.nrows()
            )));
        }
        Ok(mb::inverse(&self.transform)?.dot(z))
    }
}

/// Realizes a proper transfer function in state-space form.
///
/// With the denominator normalized to `s^n + a1 s^(n-1) + ... + an` and the
/// numerator padded to `b0 s^n + ... + bn`:
/// ```text
///     A = [ -a1 -a2 ... -an ]    B = [ 1 ]
///         [  1   0  ...  0  ]        [ 0 ]
///         [      ...        ]        [ : ]
///         [  0  ...  1   0  ]        [ 0 ]
///
///     C = [ b1 - b0 a1, ..., bn - b0 an ],  D = b0
/// ```
/// This is one valid realization among infinitely many; it is not required
/// to be controllable or observable for the given coefficients (a common
/// factor in num/den yields an unobservable realization).
///
/// # Errors
///
/// [`LtiError::ImproperModel`] if the numerator degree exceeds the
/// denominator degree.
///
/// # Examples
///
/// ```
/// use lti_rs::td::TransferFunction;
/// use lti_rs::tb::transfer_to_state_space;
///
/// let p = TransferFunction::from_coefficients(&[1.0], &[1.0, 1.0, 1.0]).unwrap();
/// let ss = transfer_to_state_space(&p).unwrap();
/// assert_eq!(ss.n_states(), 2);
/// assert_eq!(ss.a().row(0).to_vec(), vec![-1.0, -1.0]);
/// ```
pub fn transfer_to_state_space(tf: &TransferFunction) -> LtiResult<StateSpace> {
    let num = tf.num();
    let den = tf.den();
    let n = den.degree();

    if !num.is_zero() && num.degree() > n {
        return Err(LtiError::ImproperModel {
            numerator_degree: num.degree(),
            denominator_degree: n,
        });
    }

    let lead = den.leading_coefficient();
    let den_c: Vec<f64> = den.coefficients().iter().map(|c| c / lead).collect();
    let num_c: Vec<f64> = num.padded(n + 1).iter().map(|c| c / lead).collect();
    let feedthrough = num_c[0];

    debug!(order = n, feedthrough, "realizing transfer function");

    if n == 0 {
        return Ok(StateSpace::static_gain(Array2::from_elem(
            (1, 1),
            feedthrough,
        )));
    }

    let a = mb::companion(&den_c);
    let mut b = Array2::zeros((n, 1));
    b[(0, 0)] = 1.0;
    let mut c = Array2::zeros((1, n));
    for j in 0..n {
        c[(0, j)] = num_c[j + 1] - feedthrough * den_c[j + 1];
    }
    let d = Array2::from_elem((1, 1), feedthrough);

    StateSpace::new(a, b, c, d)
}

/// Transfer function G(s) = C (sI - A)^-1 B + D of a SISO state-space model.
///
/// The denominator is the characteristic polynomial det(sI - A) and the
/// numerator is `C adj(sI - A) B + D det(sI - A)`, both obtained from the
/// Faddeev-LeVerrier expansion; no numeric matrix inverse is formed. No
/// pole/zero cancellation is performed, so the denominator always has
/// degree n. Leading numerator coefficients that are rounding residue of
/// cancelling terms (C B = 0 in a transformed basis, say) are dropped, so the
/// relative degree survives similarity transformations.
///
/// # Errors
///
/// [`LtiError::DimensionMismatch`] if the system is not single-input
/// single-output. Use [`state_space_to_transfer_matrix`] for MIMO systems.
///
/// # Examples
///
/// ```
/// use ndarray::arr2;
/// use lti_rs::ab::StateSpace;
/// use lti_rs::tb::state_space_to_transfer;
///
/// let sys = StateSpace::new(
///     arr2(&[[0.0, 1.0], [-4.0, 5.0]]),
///     arr2(&[[0.0], [1.0]]),
///     arr2(&[[1.0, 0.0]]),
///     arr2(&[[0.0]]),
/// )
/// .unwrap();
/// let g = state_space_to_transfer(&sys).unwrap();
/// assert_eq!(g.num().coefficients(), &[1.0]);
/// assert_eq!(g.den().coefficients(), &[1.0, -5.0, 4.0]);
/// ```
pub fn state_space_to_transfer(sys: &StateSpace) -> LtiResult<TransferFunction> {
    if !sys.is_siso() {
        return Err(LtiError::DimensionMismatch(format!(
            "transfer function requires a SISO system, got {} inputs and {} outputs",
            sys.n_inputs(),
            sys.n_outputs()
        )));
    }
    let expansion = mb::faddeev_leverrier(sys.a())?;
    transfer_entry(sys, &expansion, 0, 0)
}

/// Transfer matrix of a MIMO state-space model.
///
/// Returns a p×m grid (indexed `[output][input]`) of SISO transfer
/// functions, all sharing the characteristic polynomial of A as denominator.
pub fn state_space_to_transfer_matrix(sys: &StateSpace) -> LtiResult<Vec<Vec<TransferFunction>>> {
    let expansion = mb::faddeev_leverrier(sys.a())?;
    (0..sys.n_outputs())
        .map(|i| {
            (0..sys.n_inputs())
                .map(|j| transfer_entry(sys, &expansion, i, j))
                .collect()
        })
        .collect()
}

/// Leading numerator coefficients within this many rounding units of the
/// magnitude of their summed terms are treated as exact zeros.
const NUMERATOR_RESIDUE: f64 = 100.0;

fn transfer_entry(
    sys: &StateSpace,
    expansion: &ResolventExpansion,
    output: usize,
    input: usize,
) -> LtiResult<TransferFunction> {
    let d = sys.d()[(output, input)];
    let c_row = sys.c().row(output);
    let b_col = sys.b().column(input);

    let c_abs = c_row.mapv(f64::abs);
    let b_abs = b_col.mapv(f64::abs);
    let order = expansion.adjugate.len().max(1) as f64;

    // Each coefficient is paired with the magnitude of the terms summed into
    // it, so cancellation residue can be told apart from a genuine value.
    let mut num = Vec::with_capacity(expansion.characteristic.len());
    num.push((d, d.abs()));
    for (m, &a_k) in expansion
        .adjugate
        .iter()
        .zip(expansion.characteristic.iter().skip(1))
    {
        let value = c_row.dot(&m.dot(&b_col)) + d * a_k;
        let bound = c_abs.dot(&m.mapv(f64::abs).dot(&b_abs)) + (d * a_k).abs();
        num.push((value, bound));
    }

    let leading = num
        .iter()
        .position(|&(value, bound)| value.abs() > NUMERATOR_RESIDUE * order * f64::EPSILON * bound)
        .unwrap_or(num.len());
    if leading > 0 {
        trace!(output, input, dropped = leading, "trimmed leading numerator residue");
    }
    let num: Vec<f64> = num[leading..].iter().map(|&(value, _)| value).collect();
    trace!(output, input, ?num, "transfer numerator");

    TransferFunction::new(
        Polynomial::new(num),
        Polynomial::new(expansion.characteristic.clone()),
    )
}

/// Similarity transformation to reachable (controller) canonical form.
///
/// For a single-input system with characteristic polynomial
/// `s^n + a1 s^(n-1) + ... + an` the target is
/// ```text
///     A' = [ -a1 -a2 ... -an ]    B' = [ 1 0 ... 0 ]'
///          [  1   0  ...  0  ]
///          [      ...        ]
///          [  0  ...  1   0  ]
/// ```
/// and `T = Wz Wx^-1`, where Wx and Wz are the controllability matrices of the
/// original and target pairs.
///
/// # Arguments
///
/// * `sys` - Single-input state-space model (any number of outputs)
/// * `tol` - Rank tolerance for the controllability test, `None` for the default
///
/// # Errors
///
/// * [`LtiError::DimensionMismatch`] if the system has more than one input
/// * [`LtiError::Uncontrollable`] if rank(Wx) < n; checked before any inversion
pub fn to_reachable_canonical(
    sys: &StateSpace,
    tol: Option<f64>,
) -> LtiResult<CanonicalRealization> {
    if sys.n_inputs() != 1 {
        return Err(LtiError::DimensionMismatch(format!(
            "reachable canonical form requires a single-input system, got {} inputs",
            sys.n_inputs()
        )));
    }
    let n = sys.n_states();

    let wx = sys.controllability_matrix();
    let rank = mb::rank(&wx, tol)?;
    debug!(rank, order = n, "reachable canonical form: controllability rank");
    if rank < n {
        return Err(LtiError::Uncontrollable { rank, order: n });
    }

    let characteristic = mb::characteristic_polynomial(sys.a())?;
    let az = mb::companion(&characteristic);
    let mut bz = Array2::zeros((n, 1));
    if n > 0 {
        bz[(0, 0)] = 1.0;
    }
    let wz = ab::controllability_matrix(&az, &bz)?;

    let transform = wz.dot(&mb::inverse(&wx)?);
    let transform_inv = wx.dot(&mb::inverse(&wz)?);
    let cz = sys.c().dot(&transform_inv);

    Ok(CanonicalRealization {
        system: StateSpace::new(az, bz, cz, sys.d().clone())?,
        transform,
    })
}

/// Similarity transformation to observable canonical form.
///
/// Dual of [`to_reachable_canonical`]: the target is
/// ```text
///     A' = [ -a1  1  0 ... 0 ]    C' = [ 1 0 ... 0 ]
///          [ -a2  0  1 ... 0 ]
///          [      ...        ]
///          [ -an  0  0 ... 0 ]
/// ```
/// and `T = Wz^-1 Wx`, where Wx and Wz are the observability matrices of the
/// original and target pairs.
///
/// # Errors
///
/// * [`LtiError::DimensionMismatch`] if the system has more than one output
/// * [`LtiError::Unobservable`] if rank(Wx) < n; checked before any inversion
pub fn to_observable_canonical(
    sys: &StateSpace,
    tol: Option<f64>,
) -> LtiResult<CanonicalRealization> {
    if sys.n_outputs() != 1 {
        return Err(LtiError::DimensionMismatch(format!(
            "observable canonical form requires a single-output system, got {} outputs",
            sys.n_outputs()
        )));
    }
    let n = sys.n_states();

    let wx = sys.observability_matrix();
    let rank = mb::rank(&wx, tol)?;
    debug!(rank, order = n, "observable canonical form: observability rank");
    if rank < n {
        return Err(LtiError::Unobservable { rank, order: n });
    }

    let characteristic = mb::characteristic_polynomial(sys.a())?;
    let az = mb::companion(&characteristic).reversed_axes();
    let mut cz = Array2::zeros((1, n));
    if n > 0 {
        cz[(0, 0)] = 1.0;
    }
    let wz = ab::observability_matrix(&az, &cz)?;

    let transform = mb::inverse(&wz)?.dot(&wx);
    let bz = transform.dot(sys.b());

    Ok(CanonicalRealization {
        system: StateSpace::new(az, bz, cz, sys.d().clone())?,
        transform,
    })
}

/// Dispatches to the requested canonical form.
pub fn canonical_form(
    sys: &StateSpace,
    form: CanonicalForm,
    tol: Option<f64>,
) -> LtiResult<CanonicalRealization> {
    match form {
        CanonicalForm::Reachable => to_reachable_canonical(sys, tol),
        CanonicalForm::Observable => to_observable_canonical(sys, tol),
    }
}

impl TransferFunction {
    /// See [`transfer_to_state_space`].
    pub fn to_state_space(&self) -> LtiResult<StateSpace> {
        transfer_to_state_space(self)
    }
}

impl StateSpace {
    /// See [`state_space_to_transfer`].
    pub fn to_transfer_function(&self) -> LtiResult<TransferFunction> {
        state_space_to_transfer(self)
    }

    /// See [`canonical_form`].
    pub fn canonical_form(
        &self,
        form: CanonicalForm,
        tol: Option<f64>,
    ) -> LtiResult<CanonicalRealization> {
        canonical_form(self, form, tol)
    }
}
