//! lti-rs: linear time-invariant model algebra
//!
//! Transfer-function and state-space representations of LTI systems,
//! conversions between them, block-diagram composition and reduction to
//! reachable/observable canonical realizations. Dense linear algebra
//! (SVD rank, LU determinant and inverse, eigenvalues) is delegated to LAPACK
//! through `ndarray-linalg`.
//!
//! # Organization
//!
//! Modules follow the SLICOT chapter naming:
//! - `mc`: Polynomials (coefficient algebra, roots, Routh test)
//! - `mb`: Matrix operations (rank, determinant, inverse, eigenvalues,
//!   Faddeev-LeVerrier expansion)
//! - `td`: Transfer-function models and their composition
//! - `ab`: State-space models, controllability/observability, interconnections
//! - `tb`: Conversions and canonical-form transformations
//!
//! # Example
//!
//! ```
//! use lti_rs::td::{FeedbackSign, TransferFunction};
//!
//! let s1 = TransferFunction::from_coefficients(&[1.0], &[1.0, 1.0]).unwrap();
//! let s2 = TransferFunction::from_coefficients(&[1.0], &[1.0, 2.0]).unwrap();
//! let closed = s1.feedback(&s2, FeedbackSign::Negative).unwrap();
//!
//! let ss = closed.to_state_space().unwrap();
//! let back = ss.to_transfer_function().unwrap();
//! assert!(back.is_equivalent(&closed, 1e-12));
//! ```

pub mod ab;
pub mod error;
pub mod mb;
pub mod mc;
pub mod tb;
pub mod td;

pub use ab::StateSpace;
pub use error::{LtiError, LtiResult};
pub use mc::Polynomial;
pub use tb::{CanonicalForm, CanonicalRealization};
pub use td::{FeedbackSign, TransferFunction};
