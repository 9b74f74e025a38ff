//! Tour of the model algebra
//!
//! Builds a plant from factors, wires a block diagram, converts between
//! transfer-function and state-space form, and reduces a third-order system
//! to its canonical realizations.
//!
//! Run with `RUST_LOG=lti_rs=debug cargo run --example model_tour` to see
//! the library's tracing output.

use lti_rs::ab::{controllability_matrix, observability_matrix};
use lti_rs::mb;
use lti_rs::{CanonicalForm, FeedbackSign, LtiResult, StateSpace, TransferFunction};
use ndarray::{arr2, Array2};
use tracing_subscriber::EnvFilter;

fn print_matrix(name: &str, m: &Array2<f64>) {
    println!("{} =", name);
    for row in m.rows() {
        print!("  [");
        for v in row.iter() {
            print!("{:10.4}", v);
        }
        println!(" ]");
    }
}

fn print_tf(name: &str, g: &TransferFunction) {
    let (num, den) = g.tfdata();
    println!("{}: num = {:?}, den = {:?}", name, num, den);
}

fn main() -> LtiResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Transfer functions ===\n");

    let p = TransferFunction::from_coefficients(&[1.0, 3.0], &[1.0, 5.0, 8.0, 4.0])?;
    let p1 = TransferFunction::from_coefficients(&[1.0, 3.0], &[1.0])?;
    let p2 = TransferFunction::from_coefficients(&[1.0], &[1.0, 1.0])?;
    let p3 = TransferFunction::from_coefficients(&[1.0], &[1.0, 2.0])?;
    let factored = &(&p1 * &p2) * &p3.power(2);

    print_tf("P", &p);
    print_tf("P1 P2 P3^2", &factored);
    println!("Poles: {:?}", p.poles()?);
    println!("Zeros: {:?}", p.zeros()?);

    println!("\n=== Block diagram ===\n");

    let s1 = p2.clone();
    let s2 = p3.clone();
    let s3 = TransferFunction::from_coefficients(&[3.0, 1.0], &[1.0, 0.0])?;
    let s4 = TransferFunction::from_coefficients(&[2.0, 0.0], &[1.0])?;

    let s12 = s1.feedback(&s2, FeedbackSign::Negative)?;
    let s123 = s12.series(&s3);
    let s = s123.feedback(&s4, FeedbackSign::Negative)?;
    print_tf("S1 fb S2", &s12);
    print_tf("S", &s);

    println!("\n=== Conversions ===\n");

    let g = TransferFunction::from_coefficients(&[1.0], &[1.0, 1.0, 1.0])?;
    let gss = g.to_state_space()?;
    print_matrix("A", gss.a());
    print_matrix("B", gss.b());
    print_matrix("C", gss.c());
    print_matrix("D", gss.d());
    print_tf("back to tf", &gss.to_transfer_function()?);

    println!("\n=== Controllability and observability ===\n");

    let a = arr2(&[[0.0, 1.0], [-4.0, 5.0]]);
    let b = arr2(&[[0.0], [1.0]]);
    let c = arr2(&[[1.0, 0.0]]);
    let uc = controllability_matrix(&a, &b)?;
    let uo = observability_matrix(&a, &c)?;
    print_matrix("Uc", &uc);
    println!("rank(Uc) = {}, det(Uc) = {:.4}", mb::rank(&uc, None)?, mb::determinant(&uc)?);
    print_matrix("Uo", &uo);
    println!("rank(Uo) = {}, det(Uo) = {:.4}", mb::rank(&uo, None)?, mb::determinant(&uo)?);

    println!("\n=== Canonical forms ===\n");

    let sys = StateSpace::new(
        arr2(&[[1.0, 2.0, 3.0], [3.0, 2.0, 1.0], [4.0, 5.0, 0.0]]),
        arr2(&[[1.0], [0.0], [1.0]]),
        arr2(&[[0.0, 2.0, 1.0]]),
        arr2(&[[0.0]]),
    )?;

    for form in [CanonicalForm::Reachable, CanonicalForm::Observable] {
        let canon = sys.canonical_form(form, None)?;
        println!("{:?} form:", form);
        print_matrix("A'", canon.system.a());
        print_matrix("B'", canon.system.b());
        print_matrix("C'", canon.system.c());
        print_matrix("T", &canon.transform);
        println!();
    }

    print_tf("G(s)", &sys.to_transfer_function()?);
    Ok(())
}
