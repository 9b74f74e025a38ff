//! Serialization of models (requires the `serde` feature)
#![cfg(feature = "serde")]

use ndarray::arr2;

use lti_rs::{FeedbackSign, Polynomial, StateSpace, TransferFunction};

#[test]
fn test_transfer_function_json() {
    let g = TransferFunction::from_coefficients(&[1.0, 2.0], &[1.0, 3.0, 3.0]).unwrap();
    let json = serde_json::to_string(&g).unwrap();
    let back: TransferFunction = serde_json::from_str(&json).unwrap();
    assert_eq!(back, g);
}

#[test]
fn test_state_space_json() {
    let sys = StateSpace::new(
        arr2(&[[0.0, 1.0], [-4.0, 5.0]]),
        arr2(&[[0.0], [1.0]]),
        arr2(&[[1.0, 0.0]]),
        arr2(&[[0.0]]),
    )
    .unwrap();
    let json = serde_json::to_string(&sys).unwrap();
    let back: StateSpace = serde_json::from_str(&json).unwrap();
    assert_eq!(back, sys);
}

#[test]
fn test_feedback_sign_json() {
    let json = serde_json::to_string(&FeedbackSign::Positive).unwrap();
    assert_eq!(json, "\"Positive\"");
}

#[test]
fn test_empty_polynomial_rejected() {
    let result = serde_json::from_str::<Polynomial>(r#"{"coeffs":[]}"#);
    assert!(result.is_err());
}

#[test]
fn test_polynomial_normalized_on_load() {
    let p: Polynomial = serde_json::from_str(r#"{"coeffs":[0.0,0.0,2.0,1.0]}"#).unwrap();
    assert_eq!(p.degree(), 1);
    assert_eq!(p.coefficients(), &[2.0, 1.0]);
}

#[test]
fn test_zero_denominator_rejected() {
    let result =
        serde_json::from_str::<TransferFunction>(r#"{"num":{"coeffs":[1.0]},"den":{"coeffs":[0.0]}}"#);
    let err = result.unwrap_err().to_string();
    assert!(err.contains("denominator"), "{}", err);
}

#[test]
fn test_inconsistent_state_space_rejected() {
    let a = arr2(&[[0.0, 1.0], [-4.0, 5.0]]);
    let b = arr2(&[[0.0], [1.0], [2.0]]);
    let c = arr2(&[[1.0, 0.0]]);
    let d = arr2(&[[0.0]]);
    let json = format!(
        r#"{{"a":{},"b":{},"c":{},"d":{}}}"#,
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap(),
        serde_json::to_string(&c).unwrap(),
        serde_json::to_string(&d).unwrap()
    );
    let err = serde_json::from_str::<StateSpace>(&json).unwrap_err().to_string();
    assert!(err.contains("B rows (3) must match A dimension (2)"), "{}", err);
}
