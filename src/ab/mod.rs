//! Analysis Routines - State-Space Models (Chapter AB)
//!
//! The state-space model (A, B, C, D), its controllability and observability
//! matrices with the associated rank tests, and block interconnections of
//! state-space systems (series, parallel, feedback, rowwise concatenation).
//!
//! ```text
//!     x' = A x + B u
//!     y  = C x + D u
//! ```

use ndarray::{s, Array2};
use num_complex::Complex;
use tracing::debug;

use crate::error::{LtiError, LtiResult};
use crate::mb;
use crate::td::FeedbackSign;

/// A continuous-time state-space model with n states, m inputs and p outputs.
///
/// Shapes are checked once at construction: A is n×n, B is n×m, C is p×n and
/// D is p×m. The quadruple is never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "StateSpaceRepr"))]
pub struct StateSpace {
    a: Array2<f64>,
    b: Array2<f64>,
    c: Array2<f64>,
    d: Array2<f64>,
}

/// Wire form of [`StateSpace`]; shapes are checked by [`StateSpace::new`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct StateSpaceRepr {
    a: Array2<f64>,
    b: Array2<f64>,
    c: Array2<f64>,
    d: Array2<f64>,
}

#[cfg(feature = "serde")]
impl TryFrom<StateSpaceRepr> for StateSpace {
    type Error = LtiError;

    fn try_from(repr: StateSpaceRepr) -> LtiResult<Self> {
        StateSpace::new(repr.a, repr.b, repr.c, repr.d)
    }
}

impl StateSpace {
    /// Builds a state-space model after validating matrix shapes.
    ///
    /// # Errors
    ///
    /// [`LtiError::DimensionMismatch`] if A is not square or B, C, D do not
    /// agree with A and with each other.
    ///
    /// # Examples
    ///
    /// ```
    /// use ndarray::arr2;
    /// use lti_rs::ab::StateSpace;
    ///
    /// let sys = StateSpace::new(
    ///     arr2(&[[1.0, 1.0, 2.0], [2.0, 1.0, 1.0], [3.0, 4.0, 5.0]]),
    ///     arr2(&[[2.0], [0.0], [1.0]]),
    ///     arr2(&[[1.0, 1.0, 0.0]]),
    ///     arr2(&[[0.0]]),
    /// )
    /// .unwrap();
    /// assert_eq!((sys.n_states(), sys.n_inputs(), sys.n_outputs()), (3, 1, 1));
    ///
    /// let bad = StateSpace::new(arr2(&[[1.0]]), arr2(&[[1.0], [2.0]]), arr2(&[[1.0]]), arr2(&[[0.0]]));
    /// assert!(bad.is_err());
    /// ```
    pub fn new(
        a: Array2<f64>,
        b: Array2<f64>,
        c: Array2<f64>,
        d: Array2<f64>,
    ) -> LtiResult<Self> {
        let n = a.nrows();
        let m = b.ncols();
        let p = c.nrows();

        if a.ncols() != n {
            return Err(LtiError::DimensionMismatch(format!(
                "A must be square, got {}×{}",
                n,
                a.ncols()
            )));
        }
        if b.nrows() != n {
            return Err(LtiError::DimensionMismatch(format!(
                "B rows ({}) must match A dimension ({})",
                b.nrows(),
                n
            )));
        }
        if c.ncols() != n {
            return Err(LtiError::DimensionMismatch(format!(
                "C columns ({}) must match A dimension ({})",
                c.ncols(),
                n
            )));
        }
        if d.nrows() != p {
            return Err(LtiError::DimensionMismatch(format!(
                "D rows ({}) must match C rows ({})",
                d.nrows(),
                p
            )));
        }
        if d.ncols() != m {
            return Err(LtiError::DimensionMismatch(format!(
                "D columns ({}) must match B columns ({})",
                d.ncols(),
                m
            )));
        }

        Ok(StateSpace { a, b, c, d })
    }

    /// A memoryless system y = D u with no states.
    pub fn static_gain(d: Array2<f64>) -> Self {
        let (p, m) = d.dim();
        StateSpace {
            a: Array2::zeros((0, 0)),
            b: Array2::zeros((0, m)),
            c: Array2::zeros((p, 0)),
            d,
        }
    }

    pub fn a(&self) -> &Array2<f64> {
        &self.a
    }

    pub fn b(&self) -> &Array2<f64> {
        &self.b
    }

    pub fn c(&self) -> &Array2<f64> {
        &self.c
    }

    pub fn d(&self) -> &Array2<f64> {
        &self.d
    }

    /// Copies of (A, B, C, D).
    pub fn ssdata(&self) -> (Array2<f64>, Array2<f64>, Array2<f64>, Array2<f64>) {
        (
            self.a.clone(),
            self.b.clone(),
            self.c.clone(),
            self.d.clone(),
        )
    }

    /// Consumes the model and returns (A, B, C, D).
    pub fn into_parts(self) -> (Array2<f64>, Array2<f64>, Array2<f64>, Array2<f64>) {
        (self.a, self.b, self.c, self.d)
    }

    pub fn n_states(&self) -> usize {
        self.a.nrows()
    }

    pub fn n_inputs(&self) -> usize {
        self.b.ncols()
    }

    pub fn n_outputs(&self) -> usize {
        self.c.nrows()
    }

    pub fn is_siso(&self) -> bool {
        self.n_inputs() == 1 && self.n_outputs() == 1
    }

    /// Eigenvalues of A.
    pub fn poles(&self) -> LtiResult<Vec<Complex<f64>>> {
        mb::eigenvalues(&self.a)
    }

    /// Controllability matrix [B, AB, ..., A^(n-1)B] of this model.
    pub fn controllability_matrix(&self) -> Array2<f64> {
        build_controllability(&self.a, &self.b)
    }

    /// Observability matrix [C; CA; ...; CA^(n-1)] of this model.
    pub fn observability_matrix(&self) -> Array2<f64> {
        build_observability(&self.a, &self.c)
    }

    pub fn is_controllable(&self, tol: Option<f64>) -> LtiResult<bool> {
        Ok(mb::rank(&self.controllability_matrix(), tol)? == self.n_states())
    }

    pub fn is_observable(&self, tol: Option<f64>) -> LtiResult<bool> {
        Ok(mb::rank(&self.observability_matrix(), tol)? == self.n_states())
    }

    /// Cascade: the output of `self` drives the input of `other`.
    ///
    /// ```text
    /// A = [ A1     0  ]   B = [ B1    ]
    ///     [ B2 C1  A2 ]       [ B2 D1 ]
    ///
    /// C = [ D2 C1  C2 ]   D = D2 D1
    /// ```
    ///
    /// # Errors
    ///
    /// [`LtiError::DimensionMismatch`] if `other` does not have as many
    /// inputs as `self` has outputs.
    pub fn series(&self, other: &StateSpace) -> LtiResult<StateSpace> {
        if other.n_inputs() != self.n_outputs() {
            return Err(LtiError::DimensionMismatch(format!(
                "series: second system inputs ({}) must match first system outputs ({})",
                other.n_inputs(),
                self.n_outputs()
            )));
        }
        let (n1, n2) = (self.n_states(), other.n_states());
        let n = n1 + n2;
        let (m, p) = (self.n_inputs(), other.n_outputs());

        let mut a = Array2::zeros((n, n));
        a.slice_mut(s![0..n1, 0..n1]).assign(&self.a);
        a.slice_mut(s![n1..n, 0..n1]).assign(&other.b.dot(&self.c));
        a.slice_mut(s![n1..n, n1..n]).assign(&other.a);

        let mut b = Array2::zeros((n, m));
        b.slice_mut(s![0..n1, ..]).assign(&self.b);
        b.slice_mut(s![n1..n, ..]).assign(&other.b.dot(&self.d));

        let mut c = Array2::zeros((p, n));
        c.slice_mut(s![.., 0..n1]).assign(&other.d.dot(&self.c));
        c.slice_mut(s![.., n1..n]).assign(&other.c);

        let d = other.d.dot(&self.d);
        StateSpace::new(a, b, c, d)
    }

    /// Parallel connection: shared input, summed outputs.
    ///
    /// ```text
    /// A = [ A1  0  ]   B = [ B1 ]   C = [ C1  C2 ]   D = D1 + D2
    ///     [ 0   A2 ]       [ B2 ]
    /// ```
    pub fn parallel(&self, other: &StateSpace) -> LtiResult<StateSpace> {
        if other.n_inputs() != self.n_inputs() || other.n_outputs() != self.n_outputs() {
            return Err(LtiError::DimensionMismatch(format!(
                "parallel: systems must have equal input/output counts, got {}×{} and {}×{}",
                self.n_outputs(),
                self.n_inputs(),
                other.n_outputs(),
                other.n_inputs()
            )));
        }
        let (n1, n2) = (self.n_states(), other.n_states());
        let n = n1 + n2;
        let (m, p) = (self.n_inputs(), self.n_outputs());

        let mut a = Array2::zeros((n, n));
        a.slice_mut(s![0..n1, 0..n1]).assign(&self.a);
        a.slice_mut(s![n1..n, n1..n]).assign(&other.a);

        let mut b = Array2::zeros((n, m));
        b.slice_mut(s![0..n1, ..]).assign(&self.b);
        b.slice_mut(s![n1..n, ..]).assign(&other.b);

        let mut c = Array2::zeros((p, n));
        c.slice_mut(s![.., 0..n1]).assign(&self.c);
        c.slice_mut(s![.., n1..n]).assign(&other.c);

        let d = &self.d + &other.d;
        StateSpace::new(a, b, c, d)
    }

    /// Closes a loop around `self` with `other` in the return path.
    ///
    /// With k = -1 for negative and +1 for positive feedback, u1 = u + k y2,
    /// u2 = y1, and F = (I - k D1 D2)^-1:
    ///
    /// ```text
    /// A = [ A1 + k B1 D2 F C1    k B1 (C2 + k D2 F D1 C2) ]
    ///     [ B2 F C1              A2 + k B2 F D1 C2        ]
    ///
    /// B = [ B1 + k B1 D2 F D1 ]   C = [ F C1   k F D1 C2 ]   D = F D1
    ///     [ B2 F D1           ]
    /// ```
    ///
    /// # Errors
    ///
    /// * [`LtiError::DimensionMismatch`] if `other` is not p1-input, m1-output
    /// * [`LtiError::IllPosedFeedback`] if I - k D1 D2 is singular
    pub fn feedback(&self, other: &StateSpace, sign: FeedbackSign) -> LtiResult<StateSpace> {
        let (n1, m1, p1) = (self.n_states(), self.n_inputs(), self.n_outputs());
        let n2 = other.n_states();
        if other.n_inputs() != p1 || other.n_outputs() != m1 {
            return Err(LtiError::DimensionMismatch(format!(
                "feedback: return system must be {}-input/{}-output, got {}-input/{}-output",
                p1,
                m1,
                other.n_inputs(),
                other.n_outputs()
            )));
        }

        let k = sign.loop_gain();
        let (a1, b1, c1, d1) = (&self.a, &self.b, &self.c, &self.d);
        let (a2, b2, c2, d2) = (&other.a, &other.b, &other.c, &other.d);

        let e = Array2::<f64>::eye(p1) - d1.dot(d2) * k;
        if mb::rank(&e, None)? < p1 {
            return Err(LtiError::IllPosedFeedback);
        }
        let f = mb::inverse(&e)?;
        debug!(n1, n2, m1, p1, loop_gain = k, "closing state-space feedback loop");

        let fc1 = f.dot(c1);
        let fd1 = f.dot(d1);
        let fd1c2 = fd1.dot(c2);
        let b1d2 = b1.dot(d2);

        let n = n1 + n2;
        let mut a = Array2::zeros((n, n));
        a.slice_mut(s![0..n1, 0..n1])
            .assign(&(a1 + &(b1d2.dot(&fc1) * k)));
        a.slice_mut(s![0..n1, n1..n])
            .assign(&(b1.dot(&(c2 + &(d2.dot(&fd1c2) * k))) * k));
        a.slice_mut(s![n1..n, 0..n1]).assign(&b2.dot(&fc1));
        a.slice_mut(s![n1..n, n1..n])
            .assign(&(a2 + &(b2.dot(&fd1c2) * k)));

        let mut b = Array2::zeros((n, m1));
        b.slice_mut(s![0..n1, ..])
            .assign(&(b1 + &(b1d2.dot(&fd1) * k)));
        b.slice_mut(s![n1..n, ..]).assign(&b2.dot(&fd1));

        let mut c = Array2::zeros((p1, n));
        c.slice_mut(s![.., 0..n1]).assign(&fc1);
        c.slice_mut(s![.., n1..n]).assign(&(fd1c2 * k));

        StateSpace::new(a, b, c, fd1)
    }

    /// Rowwise concatenation: separate inputs, outputs summed with the
    /// second system's output scaled by `alpha`.
    ///
    /// ```text
    /// A = [ A1  0  ]   B = [ B1  0  ]
    ///     [ 0   A2 ]       [ 0   B2 ]
    ///
    /// C = [ C1  alpha*C2 ]   D = [ D1  alpha*D2 ]
    /// ```
    ///
    /// # Errors
    ///
    /// [`LtiError::DimensionMismatch`] if the output counts differ.
    pub fn append(&self, other: &StateSpace, alpha: f64) -> LtiResult<StateSpace> {
        let (n1, m1, p1) = (self.n_states(), self.n_inputs(), self.n_outputs());
        let (n2, m2) = (other.n_states(), other.n_inputs());
        if other.n_outputs() != p1 {
            return Err(LtiError::DimensionMismatch(format!(
                "C2 rows ({}) must match C1 rows ({})",
                other.n_outputs(),
                p1
            )));
        }

        let n = n1 + n2;
        let m = m1 + m2;

        let mut a = Array2::zeros((n, n));
        a.slice_mut(s![0..n1, 0..n1]).assign(&self.a);
        a.slice_mut(s![n1..n, n1..n]).assign(&other.a);

        let mut b = Array2::zeros((n, m));
        b.slice_mut(s![0..n1, 0..m1]).assign(&self.b);
        b.slice_mut(s![n1..n, m1..m]).assign(&other.b);

        let mut c = Array2::zeros((p1, n));
        c.slice_mut(s![.., 0..n1]).assign(&self.c);
        c.slice_mut(s![.., n1..n]).assign(&(&other.c * alpha));

        let mut d = Array2::zeros((p1, m));
        d.slice_mut(s![.., 0..m1]).assign(&self.d);
        d.slice_mut(s![.., m1..m]).assign(&(&other.d * alpha));

        StateSpace::new(a, b, c, d)
    }
}

/// Controllability matrix [B, AB, A²B, ..., A^(n-1)B] (n × n·m).
///
/// # Errors
///
/// [`LtiError::DimensionMismatch`] if A is not square or B has the wrong row count.
///
/// # Examples
///
/// ```
/// use ndarray::arr2;
/// use lti_rs::ab::controllability_matrix;
///
/// let a = arr2(&[[0.0, 1.0], [-4.0, 5.0]]);
/// let b = arr2(&[[0.0], [1.0]]);
/// let wc = controllability_matrix(&a, &b).unwrap();
/// assert_eq!(wc, arr2(&[[0.0, 1.0], [1.0, 5.0]]));
/// ```
pub fn controllability_matrix(a: &Array2<f64>, b: &Array2<f64>) -> LtiResult<Array2<f64>> {
    check_square(a)?;
    if b.nrows() != a.nrows() {
        return Err(LtiError::DimensionMismatch(format!(
            "B rows ({}) must match A dimension ({})",
            b.nrows(),
            a.nrows()
        )));
    }
    Ok(build_controllability(a, b))
}

/// Observability matrix [C; CA; CA²; ...; CA^(n-1)] (n·p × n).
///
/// # Errors
///
/// [`LtiError::DimensionMismatch`] if A is not square or C has the wrong column count.
pub fn observability_matrix(a: &Array2<f64>, c: &Array2<f64>) -> LtiResult<Array2<f64>> {
    check_square(a)?;
    if c.ncols() != a.nrows() {
        return Err(LtiError::DimensionMismatch(format!(
            "C columns ({}) must match A dimension ({})",
            c.ncols(),
            a.nrows()
        )));
    }
    Ok(build_observability(a, c))
}

/// True iff rank([B, AB, ..., A^(n-1)B]) = n.
///
/// The rank is computed by SVD; `tol` overrides the default threshold
/// `sigma_max * max(rows, cols) * eps`. In the single-input case the test is
/// equivalent to a nonzero determinant of the controllability matrix.
pub fn is_controllable(a: &Array2<f64>, b: &Array2<f64>, tol: Option<f64>) -> LtiResult<bool> {
    let r = controllability_rank(a, b, tol)?;
    debug!(rank = r, order = a.nrows(), "controllability test");
    Ok(r == a.nrows())
}

/// True iff rank([C; CA; ...; CA^(n-1)]) = n.
pub fn is_observable(a: &Array2<f64>, c: &Array2<f64>, tol: Option<f64>) -> LtiResult<bool> {
    let r = observability_rank(a, c, tol)?;
    debug!(rank = r, order = a.nrows(), "observability test");
    Ok(r == a.nrows())
}

/// Numerical rank of the controllability matrix.
pub fn controllability_rank(a: &Array2<f64>, b: &Array2<f64>, tol: Option<f64>) -> LtiResult<usize> {
    mb::rank(&controllability_matrix(a, b)?, tol)
}

/// Numerical rank of the observability matrix.
pub fn observability_rank(a: &Array2<f64>, c: &Array2<f64>, tol: Option<f64>) -> LtiResult<usize> {
    mb::rank(&observability_matrix(a, c)?, tol)
}

fn build_controllability(a: &Array2<f64>, b: &Array2<f64>) -> Array2<f64> {
    let n = a.nrows();
    let m = b.ncols();
    let mut wc = Array2::zeros((n, n * m));

    // Block k holds A^k * B
    let mut a_power_b = b.to_owned();
    for k in 0..n {
        wc.slice_mut(s![.., k * m..(k + 1) * m]).assign(&a_power_b);
        a_power_b = a.dot(&a_power_b);
    }
    wc
}

fn build_observability(a: &Array2<f64>, c: &Array2<f64>) -> Array2<f64> {
    let n = a.nrows();
    let p = c.nrows();
    let mut wo = Array2::zeros((n * p, n));

    let mut c_a_power = c.to_owned();
    for k in 0..n {
        wo.slice_mut(s![k * p..(k + 1) * p, ..]).assign(&c_a_power);
        c_a_power = c_a_power.dot(a);
    }
    wo
}

fn check_square(a: &Array2<f64>) -> LtiResult<()> {
    if a.nrows() != a.ncols() {
        return Err(LtiError::DimensionMismatch(format!(
            "A must be square, got {}×{}",
            a.nrows(),
            a.ncols()
        )));
    }
    Ok(())
}
