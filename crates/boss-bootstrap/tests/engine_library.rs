//! End-to-end coverage that actually `dlopen`s the `boss-test-engine`
//! cdylib, exercising the real `LibraryCache` path rather than the
//! in-process fake the unit tests in `engine.rs` use.

use boss_bootstrap::{BootstrapConfig, BootstrapEngine};
use boss_core::{Expression, Symbol};
use pretty_assertions::assert_eq;

fn library_path() -> &'static str {
    env!(
        "BOSS_TEST_ENGINE_PATH",
        "boss-test-engine cdylib not found; is it built as a dev-dependency?"
    )
}

#[test]
fn basic_arithmetic_through_engine() {
    let mut engine = BootstrapEngine::new(BootstrapConfig::default());
    let expr = Expression::complex(
        "EvaluateInEngine",
        vec![
            Expression::String(library_path().to_owned()),
            Expression::complex("Plus", vec![Expression::I32(5), Expression::I32(4)]),
        ],
    );
    assert_eq!(engine.evaluate(expr).unwrap(), Expression::I32(9));
}

#[test]
fn engine_error_is_wrapped() {
    let mut engine = BootstrapEngine::new(BootstrapConfig::default());
    let expr = Expression::complex(
        "EvaluateInEngine",
        vec![Expression::String(library_path().to_owned()), Expression::I32(5)],
    );
    let result = engine.evaluate(expr).unwrap();
    let complex = result.as_complex().expect("wrapped error is a ComplexExpression");
    assert_eq!(complex.head().as_str(), "ErrorWhenEvaluatingExpression");
}

#[test]
fn set_default_engine_then_evaluate() {
    let mut engine = BootstrapEngine::new(BootstrapConfig::default());
    let set = engine
        .evaluate(Expression::complex(
            "SetDefaultEngine",
            vec![Expression::String(library_path().to_owned())],
        ))
        .unwrap();
    assert_eq!(set, Expression::Symbol(Symbol::new("okay")));

    let result = engine
        .evaluate(Expression::complex(
            "Plus",
            vec![Expression::I32(1), Expression::I32(2)],
        ))
        .unwrap();
    assert_eq!(result, Expression::I32(3));
}
